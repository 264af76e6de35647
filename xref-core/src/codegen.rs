// Code generator hook: splice stored comments onto emitted lines.

use xref_graph::NodeIdentity;

use crate::annotations::{AnnotationStore, Comment};

/// A generated line together with the instruction offsets it was emitted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedLine {
    pub text: String,
    pub offsets: Vec<u32>,
}

impl EmittedLine {
    pub fn new(text: impl Into<String>, offsets: impl IntoIterator<Item = u32>) -> Self {
        Self {
            text: text.into(),
            offsets: offsets.into_iter().collect(),
        }
    }

    /// A line with no instructions behind it (braces, declarations).
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, [])
    }
}

/// Append each comment as its own trailing annotation.
pub fn append_comments(line: &mut String, comments: &[Comment], prefix: &str) {
    for comment in comments {
        line.push(' ');
        line.push_str(prefix);
        line.push_str(&comment.text);
    }
}

/// Render a method body, attaching every stored comment whose offset matches
/// one of the line's instructions. Offsets that the generator merged onto one
/// line keep their individual comments, in offset-list order then store order.
pub fn splice_comments(
    store: &AnnotationStore,
    method: &NodeIdentity,
    lines: &[EmittedLine],
    prefix: &str,
) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            let mut text = line.text.clone();
            for &offset in &line.offsets {
                append_comments(&mut text, &store.lookup(method, offset), prefix);
            }
            text
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method() -> NodeIdentity {
        NodeIdentity::method("demo.TestCls", "test", "(Z)I")
    }

    #[test]
    fn untouched_without_comments() {
        let store = AnnotationStore::new();
        let lines = [EmittedLine::new("return 1;", [13])];
        assert_eq!(splice_comments(&store, &method(), &lines, "// "), vec!["return 1;"]);
    }

    #[test]
    fn merged_offsets_emit_each_comment() {
        let store = AnnotationStore::new();
        store.set_all([
            Comment::new(method(), 3, "a"),
            Comment::new(method(), 5, "b"),
            Comment::new(method(), 5, "c"),
        ]);
        let lines = [EmittedLine::new("x = y + 1;", [3, 5]), EmittedLine::plain("}")];
        assert_eq!(
            splice_comments(&store, &method(), &lines, "// "),
            vec!["x = y + 1; // a // b // c", "}"]
        );
    }

    #[test]
    fn comments_for_other_methods_are_ignored() {
        let store = AnnotationStore::new();
        store.set_all([Comment::new(
            NodeIdentity::method("demo.TestCls", "other", "()V"),
            3,
            "nope",
        )]);
        let lines = [EmittedLine::new("call();", [3])];
        assert_eq!(splice_comments(&store, &method(), &lines, "// "), vec!["call();"]);
    }
}
