// User comments anchored to (node identity, instruction offset).
//
// The store is loaded in bulk and then read by the code generator once per
// emitted instruction. `set_all` builds the replacement generation off to
// the side and swaps it in under a short write lock, so readers see either
// the old set or the new one, never a mix.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xref_graph::{NodeIdentity, PositionTranslator, ProgramGraph};

/// A user-authored comment attached to one instruction of one method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comment {
    pub target: NodeIdentity,
    /// Bytecode instruction offset inside the target method.
    pub offset: u32,
    pub text: String,
}

impl Comment {
    pub fn new(target: NodeIdentity, offset: u32, text: impl Into<String>) -> Self {
        Self {
            target,
            offset,
            text: text.into(),
        }
    }
}

/// One immutable set of comments plus its lookup table.
#[derive(Debug, Default)]
struct Generation {
    number: u64,
    comments: Vec<Comment>,
    /// target → offset → indices into `comments`, in store order.
    anchors: HashMap<NodeIdentity, HashMap<u32, Vec<usize>>>,
}

impl Generation {
    fn build(number: u64, comments: Vec<Comment>) -> Self {
        let mut anchors: HashMap<NodeIdentity, HashMap<u32, Vec<usize>>> = HashMap::new();
        for (idx, comment) in comments.iter().enumerate() {
            anchors
                .entry(comment.target.clone())
                .or_default()
                .entry(comment.offset)
                .or_default()
                .push(idx);
        }
        Self {
            number,
            comments,
            anchors,
        }
    }
}

#[derive(Debug, Default)]
pub struct AnnotationStore {
    current: RwLock<Arc<Generation>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole store. Duplicates at one anchor are all kept.
    pub fn set_all(&self, comments: impl IntoIterator<Item = Comment>) {
        let comments: Vec<Comment> = comments.into_iter().collect();
        let count = comments.len();
        let mut next = Generation::build(0, comments);
        let mut current = self.current.write();
        next.number = current.number + 1;
        debug!(generation = next.number, comments = count, "Replaced annotation store");
        *current = Arc::new(next);
    }

    /// Every comment at `(target, offset)`, in store order. A miss is empty.
    pub fn lookup(&self, target: &NodeIdentity, offset: u32) -> Vec<Comment> {
        let generation = self.snapshot();
        generation
            .anchors
            .get(target)
            .and_then(|by_offset| by_offset.get(&offset))
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| generation.comments[i].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All comments attached to one node, in store order.
    pub fn comments_for(&self, target: &NodeIdentity) -> Vec<Comment> {
        self.snapshot()
            .comments
            .iter()
            .filter(|c| &c.target == target)
            .cloned()
            .collect()
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.snapshot().comments.clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Incremented on every `set_all`; lookups are deterministic within one.
    pub fn generation(&self) -> u64 {
        self.snapshot().number
    }

    fn snapshot(&self) -> Arc<Generation> {
        Arc::clone(&self.current.read())
    }
}

// ── Anchoring new comments ─────────────────────────────────────────

/// Where a new comment would attach.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommentAnchor {
    pub target: NodeIdentity,
    pub offset: u32,
}

impl CommentAnchor {
    pub fn comment(self, text: impl Into<String>) -> Comment {
        Comment::new(self.target, self.offset, text)
    }
}

/// Derive an anchor from a cursor position in generated text.
///
/// The line must fall inside a method and the raw offset must map to an
/// instruction; otherwise there is nothing stable to attach to.
pub fn anchor_at<T: PositionTranslator + ?Sized>(
    graph: &ProgramGraph,
    translator: &T,
    line: u32,
    raw_offset: usize,
) -> Option<CommentAnchor> {
    let node = translator.node_declaring_line(line)?;
    if !graph.get(node).ok()?.is_method() {
        return None;
    }
    let offset = translator.instruction_offset_at(raw_offset)?;
    let target = graph.identity(node).ok()?;
    Some(CommentAnchor { target, offset })
}
