pub mod identity;
pub mod output;
pub mod positions;
pub mod program;

use serde::{Deserialize, Serialize};

pub use identity::{NodeIdentity, RefKind};
pub use output::{ClassOutput, ClassUsageMap};
pub use positions::{DeclarationLines, PositionTranslator};
pub use program::{ProgramGraph, SemanticKind, SemanticNode};

/// Error type for the semantic program model.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown semantic node: {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} is not a class")]
    NotAClass(NodeId),

    #[error("Class {0} is nested, expected a top-level class")]
    NotTopLevelClass(NodeId),

    #[error("Member {0} has no owning class")]
    NoOwningClass(NodeId),
}

pub type Result<T> = std::result::Result<T, GraphError>;

// ── Node handle ────────────────────────────────────────────────────

/// Handle of a node inside one [`ProgramGraph`]. Only meaningful for the
/// graph that issued it; use [`NodeIdentity`] for anything that must
/// survive re-decompilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Source position ────────────────────────────────────────────────

/// A location in generated source text, as emitted by the code generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Character offset from the start of the generated text.
    pub raw_offset: usize,
    /// 1-based line number.
    pub line: u32,
}

impl SourcePosition {
    pub fn new(raw_offset: usize, line: u32) -> Self {
        Self { raw_offset, line }
    }
}

impl std::fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.line, self.raw_offset)
    }
}
