use xref_core::config::XrefConfig;
use xref_core::pipeline::IndexPipeline;
use xref_core::progress::NoopReporter;
use xref_core::usage::{IndexOutcome, UsageIndex, UsageRecord};
use xref_graph::NodeIdentity;
use xref_test::{SampleProgram, TEST_CLS_CODE, locate};

fn indexed_sample() -> (SampleProgram, UsageIndex) {
    let program = SampleProgram::new();
    let pipeline = IndexPipeline::default();
    let index = pipeline.new_index();
    let report = pipeline.run(&index, &program.graph, &program.outputs(), &NoopReporter);
    assert!(report.failures().is_empty());
    (program, index)
}

/// Sorted contents of every bucket the sample program could have.
fn snapshot(program: &SampleProgram, index: &UsageIndex) -> Vec<(NodeIdentity, Vec<UsageRecord>)> {
    program
        .all_nodes()
        .into_iter()
        .map(|n| {
            let id = program.identity(n);
            let mut records = index.query(&id);
            records.sort();
            (id, records)
        })
        .collect()
}

#[test]
fn sample_program_counts() {
    let (p, index) = indexed_sample();
    assert_eq!(index.record_count(), 10);
    assert_eq!(index.query(&p.identity(p.foo)).len(), 4);
    assert_eq!(index.query(&p.identity(p.foo_ctor)).len(), 2);
    assert_eq!(index.query(&p.identity(p.foo_size)).len(), 1);
    assert_eq!(index.query(&p.identity(p.foo_field)).len(), 1);
    assert_eq!(index.query(&p.identity(p.shared_field)).len(), 1);
    assert_eq!(
        index.indexed_classes(),
        vec![
            NodeIdentity::class("demo.Caller"),
            NodeIdentity::class("demo.Foo"),
            NodeIdentity::class("demo.TestCls"),
        ]
    );
}

#[test]
fn own_declaration_is_not_a_usage() {
    let (p, index) = indexed_sample();
    let decl = locate(TEST_CLS_CODE, 8, "test");

    let usages = index.query(&p.identity(p.test_method));
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].line_text.trim(), "test(true);");
    assert!(usages.iter().all(|r| r.raw_offset != decl.raw_offset));
    assert!(index.query(&p.identity(p.make_method)).is_empty());
    assert!(index.query(&p.identity(p.test_cls)).is_empty());
}

#[test]
fn import_lines_never_produce_records() {
    let (p, index) = indexed_sample();
    for node in p.all_nodes() {
        for record in index.query(&p.identity(node)) {
            assert!(!record.line_text.starts_with("import "), "{record:?}");
        }
    }
}

#[test]
fn constructor_call_fans_out_to_class() {
    let (p, index) = indexed_sample();
    let new_foo = locate(TEST_CLS_CODE, 17, "Foo");

    let ctor_hit = index
        .query(&p.identity(p.foo_ctor))
        .into_iter()
        .find(|r| r.raw_offset == new_foo.raw_offset)
        .expect("constructor usage");
    let class_hit = index
        .query(&p.identity(p.foo))
        .into_iter()
        .find(|r| r.raw_offset == new_foo.raw_offset)
        .expect("class usage");
    assert_eq!(ctor_hit, class_hit);
    assert_eq!(ctor_hit.referencing_node, p.identity(p.make_method));
    assert_eq!(ctor_hit.line_text, "        this.foo = new Foo();");
}

#[test]
fn field_type_is_attributed_to_field_declaration() {
    let (p, index) = indexed_sample();
    let decl_line = index
        .query(&p.identity(p.foo))
        .into_iter()
        .find(|r| r.line_number == 6)
        .expect("field type usage");
    assert_eq!(decl_line.referencing_node, p.identity(p.foo_field));
    assert_eq!(decl_line.unit, p.identity(p.test_cls));
}

#[test]
fn rebuild_after_invalidation_is_query_equivalent() {
    let (p, index) = indexed_sample();
    let before = snapshot(&p, &index);

    let unit = p.identity(p.test_cls);
    let stats = index.invalidate_class(&unit);
    assert_eq!(stats.removed_records, 5);
    assert!(index.query(&p.identity(p.test_method)).is_empty());
    assert_eq!(index.query(&p.identity(p.foo)).len(), 2);

    let outcome = index.index_output(&p.graph, &p.test_cls_output());
    assert_eq!(outcome, IndexOutcome::Indexed { records: 5 });
    assert_eq!(snapshot(&p, &index), before);
}

#[test]
fn removing_declaring_class_drops_its_buckets_only() {
    let (p, index) = indexed_sample();
    index.invalidate_class(&p.identity(p.foo));

    assert!(index.query(&p.identity(p.foo)).is_empty());
    assert!(index.query(&p.identity(p.foo_ctor)).is_empty());
    assert!(index.query(&p.identity(p.foo_size)).is_empty());
    // Usages of other classes' members survive.
    assert_eq!(index.query(&p.identity(p.test_method)).len(), 1);
    assert_eq!(index.query(&p.identity(p.shared_field)).len(), 1);
}

#[test]
fn never_indexed_node_queries_empty() {
    let (_, index) = indexed_sample();
    let ghost = NodeIdentity::method("demo.Ghost", "boo", "()V");
    assert!(index.query(&ghost).is_empty());
}

#[test]
fn config_controls_import_prefix() {
    let config = XrefConfig::from_toml_str("[usage]\nimport_prefix = \"package \"\n").unwrap();
    let pipeline = IndexPipeline::new(config);
    let index = pipeline.new_index();
    let p = SampleProgram::new();
    pipeline.run(&index, &p.graph, &p.outputs(), &NoopReporter);

    // The import line now counts as a usage of Foo, attributed to TestCls
    // itself since no declaration covers line 3.
    let import_hit = index
        .query(&p.identity(p.foo))
        .into_iter()
        .find(|r| r.line_number == 3)
        .expect("import line usage");
    assert_eq!(import_hit.referencing_node, p.identity(p.test_cls));
}
