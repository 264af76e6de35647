// Integration test utilities: small decompiled programs with their
// generated text, usage maps, and declaration lines.

use xref_core::codegen::EmittedLine;
use xref_graph::{
    ClassOutput, ClassUsageMap, DeclarationLines, NodeId, NodeIdentity, ProgramGraph,
    SourcePosition,
};

pub const TEST_CLS_CODE: &str = "package demo;

import demo.Foo;

public class TestCls {
    private Foo foo;

    public int test(boolean z) {
        if (z) {
            System.out.println(\"z\");
            return 1;
        }
        return 3;
    }

    public void make() {
        this.foo = new Foo();
        test(true);
    }
}
";

pub const FOO_CODE: &str = "package demo;

public class Foo {
    public Foo() {
    }

    public int size() {
        return 0;
    }
}
";

pub const CALLER_CODE: &str = "package demo;

public class Caller {
    private static final Foo SHARED = new Foo();

    public int call() {
        return SHARED.size();
    }
}
";

/// Position of the first `needle` on 1-based `line` of `code`.
///
/// # Panics
/// If the line or the needle does not exist; fixtures are static text.
pub fn locate(code: &str, line: u32, needle: &str) -> SourcePosition {
    let mut offset = 0;
    for (idx, text) in code.split('\n').enumerate() {
        if idx + 1 == line as usize {
            let col = text
                .find(needle)
                .unwrap_or_else(|| panic!("`{needle}` not on line {line}: {text:?}"));
            return SourcePosition::new(offset + col, line);
        }
        offset += text.len() + 1;
    }
    panic!("line {line} not in fixture");
}

/// Raw offset of the first non-blank character of `line`.
pub fn line_start(code: &str, line: u32) -> SourcePosition {
    let text = code.split('\n').nth(line as usize - 1).expect("fixture line");
    let trimmed = text.trim_start();
    locate(code, line, trimmed)
}

/// Three classes: `TestCls` (field of type `Foo`, calls `new Foo()` and its
/// own `test`), `Foo` (constructor + `size`), and `Caller` (static `Foo`
/// field, calls `size`).
#[derive(Debug)]
pub struct SampleProgram {
    pub graph: ProgramGraph,
    pub test_cls: NodeId,
    pub foo_field: NodeId,
    pub test_method: NodeId,
    pub make_method: NodeId,
    pub foo: NodeId,
    pub foo_ctor: NodeId,
    pub foo_size: NodeId,
    pub caller: NodeId,
    pub shared_field: NodeId,
    pub call_method: NodeId,
}

impl SampleProgram {
    pub fn new() -> Self {
        let mut g = ProgramGraph::new();

        let test_cls = g.add_class("demo.TestCls");
        let foo_field = g.add_field(test_cls, "foo", "Ldemo/Foo;").expect("field");
        let test_method = g.add_method(test_cls, "test", "(Z)I").expect("method");
        let make_method = g.add_method(test_cls, "make", "()V").expect("method");

        let foo = g.add_class("demo.Foo");
        let foo_ctor = g.add_constructor(foo, "()V").expect("ctor");
        let foo_size = g.add_method(foo, "size", "()I").expect("method");

        let caller = g.add_class("demo.Caller");
        let shared_field = g.add_field(caller, "SHARED", "Ldemo/Foo;").expect("field");
        let call_method = g.add_method(caller, "call", "()I").expect("method");

        let decls = [
            (test_cls, locate(TEST_CLS_CODE, 5, "TestCls")),
            (foo_field, locate(TEST_CLS_CODE, 6, "foo")),
            (test_method, locate(TEST_CLS_CODE, 8, "test")),
            (make_method, locate(TEST_CLS_CODE, 16, "make")),
            (foo, locate(FOO_CODE, 3, "Foo")),
            (foo_ctor, locate(FOO_CODE, 4, "Foo")),
            (foo_size, locate(FOO_CODE, 7, "size")),
            (caller, locate(CALLER_CODE, 3, "Caller")),
            (shared_field, locate(CALLER_CODE, 4, "SHARED")),
            (call_method, locate(CALLER_CODE, 6, "call")),
        ];
        for (id, pos) in decls {
            g.set_declaration(id, pos).expect("declaration");
        }

        Self {
            graph: g,
            test_cls,
            foo_field,
            test_method,
            make_method,
            foo,
            foo_ctor,
            foo_size,
            caller,
            shared_field,
            call_method,
        }
    }

    pub fn identity(&self, node: NodeId) -> NodeIdentity {
        self.graph.identity(node).expect("fixture node")
    }

    pub fn test_cls_output(&self) -> ClassOutput {
        let usage: ClassUsageMap = [
            (locate(TEST_CLS_CODE, 3, "Foo"), self.foo),
            (locate(TEST_CLS_CODE, 5, "TestCls"), self.test_cls),
            (locate(TEST_CLS_CODE, 6, "Foo"), self.foo),
            (locate(TEST_CLS_CODE, 6, "foo"), self.foo_field),
            (locate(TEST_CLS_CODE, 8, "test"), self.test_method),
            (locate(TEST_CLS_CODE, 16, "make"), self.make_method),
            (locate(TEST_CLS_CODE, 17, "foo"), self.foo_field),
            (locate(TEST_CLS_CODE, 17, "Foo"), self.foo_ctor),
            (locate(TEST_CLS_CODE, 18, "test"), self.test_method),
        ]
        .into_iter()
        .collect();
        let declarations = DeclarationLines::for_class(&self.graph, self.test_cls)
            .expect("declarations")
            .with_instruction_offsets([
                (line_start(TEST_CLS_CODE, 9).raw_offset, 0),
                (line_start(TEST_CLS_CODE, 10).raw_offset, 3),
                (line_start(TEST_CLS_CODE, 11).raw_offset, 13),
                (line_start(TEST_CLS_CODE, 13).raw_offset, 10),
            ]);
        ClassOutput::from_code(self.test_cls, TEST_CLS_CODE, usage, declarations)
    }

    pub fn foo_output(&self) -> ClassOutput {
        let usage: ClassUsageMap = [
            (locate(FOO_CODE, 3, "Foo"), self.foo),
            (locate(FOO_CODE, 4, "Foo"), self.foo_ctor),
            (locate(FOO_CODE, 7, "size"), self.foo_size),
        ]
        .into_iter()
        .collect();
        let declarations =
            DeclarationLines::for_class(&self.graph, self.foo).expect("declarations");
        ClassOutput::from_code(self.foo, FOO_CODE, usage, declarations)
    }

    pub fn caller_output(&self) -> ClassOutput {
        let usage: ClassUsageMap = [
            (locate(CALLER_CODE, 3, "Caller"), self.caller),
            (locate(CALLER_CODE, 4, "Foo"), self.foo),
            (locate(CALLER_CODE, 4, "SHARED"), self.shared_field),
            (locate(CALLER_CODE, 4, "Foo()"), self.foo_ctor),
            (locate(CALLER_CODE, 7, "SHARED"), self.shared_field),
            (locate(CALLER_CODE, 7, "size"), self.foo_size),
        ]
        .into_iter()
        .collect();
        let declarations =
            DeclarationLines::for_class(&self.graph, self.caller).expect("declarations");
        ClassOutput::from_code(self.caller, CALLER_CODE, usage, declarations)
    }

    pub fn outputs(&self) -> Vec<ClassOutput> {
        vec![self.test_cls_output(), self.foo_output(), self.caller_output()]
    }

    /// Every node of the program, for whole-index comparisons.
    pub fn all_nodes(&self) -> Vec<NodeId> {
        vec![
            self.test_cls,
            self.foo_field,
            self.test_method,
            self.make_method,
            self.foo,
            self.foo_ctor,
            self.foo_size,
            self.caller,
            self.shared_field,
            self.call_method,
        ]
    }
}

impl Default for SampleProgram {
    fn default() -> Self {
        Self::new()
    }
}

/// `TestCls.test(Z)I` as emitted, each line with the instruction offsets
/// the generator placed on it.
pub fn test_method_body() -> Vec<EmittedLine> {
    vec![
        EmittedLine::plain("    public int test(boolean z) {"),
        EmittedLine::new("        if (z) {", [0, 1]),
        EmittedLine::new("            System.out.println(\"z\");", [3, 5, 8]),
        EmittedLine::new("            return 1;", [13]),
        EmittedLine::plain("        }"),
        EmittedLine::new("        return 3;", [10]),
        EmittedLine::plain("    }"),
    ]
}

/// `n` independent classes that all call `demo.Target.hit()V`.
pub fn fan_in_program(n: usize) -> (ProgramGraph, Vec<ClassOutput>, NodeId) {
    let mut g = ProgramGraph::new();
    let target = g.add_class("demo.Target");
    let hit = g.add_method(target, "hit", "()V").expect("method");

    let mut outputs = Vec::with_capacity(n);
    for i in 0..n {
        let code = format!(
            "package demo;\n\npublic class Caller{i} {{\n    void run() {{\n        Target.hit();\n    }}\n}}\n"
        );
        let cls = g.add_class(&format!("demo.Caller{i}"));
        let run = g.add_method(cls, "run", "()V").expect("method");
        g.set_declaration(cls, locate(&code, 3, "Caller")).expect("declaration");
        g.set_declaration(run, locate(&code, 4, "run")).expect("declaration");

        let usage: ClassUsageMap = [(locate(&code, 5, "hit"), hit)].into_iter().collect();
        let declarations = DeclarationLines::for_class(&g, cls).expect("declarations");
        outputs.push(ClassOutput::from_code(cls, &code, usage, declarations));
    }
    (g, outputs, hit)
}
