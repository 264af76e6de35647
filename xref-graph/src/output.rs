// Per-class output handed over by the decompilation pipeline.

use std::collections::BTreeMap;

use crate::positions::DeclarationLines;
use crate::{NodeId, SourcePosition};

/// Every reference occurrence found while generating one class's text,
/// keyed by where it was emitted. Iteration follows text order.
#[derive(Debug, Clone, Default)]
pub struct ClassUsageMap {
    entries: BTreeMap<SourcePosition, NodeId>,
}

impl ClassUsageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, position: SourcePosition, node: NodeId) {
        self.entries.insert(position, node);
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourcePosition, NodeId)> + '_ {
        self.entries.iter().map(|(&pos, &id)| (pos, id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(SourcePosition, NodeId)> for ClassUsageMap {
    fn from_iter<I: IntoIterator<Item = (SourcePosition, NodeId)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// One successfully decompiled top-level class.
#[derive(Debug, Clone)]
pub struct ClassOutput {
    pub class: NodeId,
    /// Generated text split by line; index 0 is line 1.
    pub lines: Vec<String>,
    pub usage: ClassUsageMap,
    pub declarations: DeclarationLines,
}

impl ClassOutput {
    /// Split `code` into lines and pair it with its usage map.
    pub fn from_code(
        class: NodeId,
        code: &str,
        usage: ClassUsageMap,
        declarations: DeclarationLines,
    ) -> Self {
        Self {
            class,
            lines: code.lines().map(str::to_string).collect(),
            usage,
            declarations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_map_iterates_in_text_order() {
        let map: ClassUsageMap = [
            (SourcePosition::new(90, 4), NodeId(2)),
            (SourcePosition::new(10, 1), NodeId(1)),
            (SourcePosition::new(40, 2), NodeId(3)),
        ]
        .into_iter()
        .collect();
        let order: Vec<_> = map.iter().map(|(_, id)| id).collect();
        assert_eq!(order, vec![NodeId(1), NodeId(3), NodeId(2)]);
    }

    #[test]
    fn from_code_splits_lines() {
        let out = ClassOutput::from_code(
            NodeId(0),
            "package demo;\n\npublic class A {\n}\n",
            ClassUsageMap::new(),
            DeclarationLines::new(),
        );
        assert_eq!(out.lines.len(), 4);
        assert_eq!(out.lines[2], "public class A {");
    }
}
