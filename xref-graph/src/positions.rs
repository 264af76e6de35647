// Translation between generated-text coordinates and the semantic model.

use std::collections::BTreeMap;

use tracing::debug;

use crate::program::ProgramGraph;
use crate::{NodeId, Result};

/// Maps generated-text coordinates back to semantic nodes and bytecode.
pub trait PositionTranslator {
    /// The node whose declaration covers `line` (1-based), if any.
    fn node_declaring_line(&self, line: u32) -> Option<NodeId>;

    /// Bytecode instruction offset for a raw text offset, if the code
    /// generator recorded one.
    fn instruction_offset_at(&self, _raw_offset: usize) -> Option<u32> {
        None
    }
}

/// Declaration lines of one top-level class and everything inside it.
///
/// A line belongs to the nearest declaration at or above it, so lines of a
/// method body resolve to the method and lines before the class header
/// (package, imports) resolve to nothing.
#[derive(Debug, Clone, Default)]
pub struct DeclarationLines {
    lines: BTreeMap<u32, NodeId>,
    instructions: BTreeMap<usize, u32>,
}

impl DeclarationLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect declaration lines for `class` and all of its descendants.
    /// Nodes the code generator did not place are left out.
    pub fn for_class(graph: &ProgramGraph, class: NodeId) -> Result<Self> {
        let mut lines = Self::new();
        for id in graph.descendants(class) {
            if let Some(decl) = graph.declaration(id)? {
                lines.insert(decl.line, id);
            }
        }
        debug!(class = %class, declarations = lines.len(), "Collected declaration lines");
        Ok(lines)
    }

    pub fn insert(&mut self, line: u32, node: NodeId) {
        self.lines.insert(line, node);
    }

    /// Register instruction offsets emitted at the given raw offsets.
    #[must_use]
    pub fn with_instruction_offsets(
        mut self,
        offsets: impl IntoIterator<Item = (usize, u32)>,
    ) -> Self {
        self.instructions.extend(offsets);
        self
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl PositionTranslator for DeclarationLines {
    fn node_declaring_line(&self, line: u32) -> Option<NodeId> {
        self.lines.range(..=line).next_back().map(|(_, &id)| id)
    }

    fn instruction_offset_at(&self, raw_offset: usize) -> Option<u32> {
        self.instructions
            .range(..=raw_offset)
            .next_back()
            .map(|(_, &offset)| offset)
    }
}
