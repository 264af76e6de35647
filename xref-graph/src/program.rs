// The decompiled program's semantic structure.
//
// Nodes live in an arena addressed by `NodeId`. Ownership is kept in a
// separate lookup table (member → directly enclosing class) instead of
// parent pointers, so "which top-level class contains this node" is a
// table walk and nodes never reference each other.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::identity::NodeIdentity;
use crate::{GraphError, NodeId, Result, SourcePosition};

/// Name of the JVM instance initializer.
pub const CONSTRUCTOR_NAME: &str = "<init>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticKind {
    Class,
    Field,
    Method { constructor: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticNode {
    pub id: NodeId,
    pub kind: SemanticKind,
    /// Binary name for classes, simple name for members.
    pub name: String,
    /// JVM descriptor for members, empty for classes.
    pub descriptor: String,
    /// Where the code generator emitted this node's declaration, if it did.
    pub declaration: Option<SourcePosition>,
}

impl SemanticNode {
    pub fn is_class(&self) -> bool {
        self.kind == SemanticKind::Class
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, SemanticKind::Method { .. })
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == SemanticKind::Method { constructor: true }
    }
}

/// Arena of semantic nodes plus the owning-class table.
#[derive(Debug, Default)]
pub struct ProgramGraph {
    nodes: Vec<SemanticNode>,
    /// Member or nested class → directly enclosing class.
    owners: HashMap<NodeId, NodeId>,
    /// Class → direct members and nested classes, in declaration order.
    members: HashMap<NodeId, Vec<NodeId>>,
    by_identity: HashMap<NodeIdentity, NodeId>,
    top_level: Vec<NodeId>,
}

impl ProgramGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Top-level classes in insertion order.
    pub fn classes(&self) -> &[NodeId] {
        &self.top_level
    }

    pub fn add_class(&mut self, binary_name: &str) -> NodeId {
        let id = self.push(SemanticKind::Class, binary_name, "", None);
        self.top_level.push(id);
        id
    }

    pub fn add_nested_class(&mut self, outer: NodeId, binary_name: &str) -> Result<NodeId> {
        self.expect_class(outer)?;
        Ok(self.push(SemanticKind::Class, binary_name, "", Some(outer)))
    }

    pub fn add_method(&mut self, class: NodeId, name: &str, descriptor: &str) -> Result<NodeId> {
        self.expect_class(class)?;
        let constructor = name == CONSTRUCTOR_NAME;
        Ok(self.push(
            SemanticKind::Method { constructor },
            name,
            descriptor,
            Some(class),
        ))
    }

    pub fn add_constructor(&mut self, class: NodeId, descriptor: &str) -> Result<NodeId> {
        self.add_method(class, CONSTRUCTOR_NAME, descriptor)
    }

    pub fn add_field(&mut self, class: NodeId, name: &str, descriptor: &str) -> Result<NodeId> {
        self.expect_class(class)?;
        Ok(self.push(SemanticKind::Field, name, descriptor, Some(class)))
    }

    /// Record where the code generator placed a node's declaration.
    /// Called again on every re-decompilation.
    pub fn set_declaration(&mut self, id: NodeId, position: SourcePosition) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id.0 as usize)
            .ok_or(GraphError::UnknownNode(id))?;
        node.declaration = Some(position);
        Ok(())
    }

    pub fn get(&self, id: NodeId) -> Result<&SemanticNode> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(GraphError::UnknownNode(id))
    }

    pub fn declaration(&self, id: NodeId) -> Result<Option<SourcePosition>> {
        Ok(self.get(id)?.declaration)
    }

    /// Directly enclosing class, `None` for top-level classes.
    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        self.owners.get(&id).copied()
    }

    pub fn members(&self, class: NodeId) -> &[NodeId] {
        self.members.get(&class).map_or(&[], Vec::as_slice)
    }

    /// Walk the owner table up to the outermost class.
    pub fn top_level_class(&self, id: NodeId) -> Result<NodeId> {
        self.get(id)?;
        let mut current = id;
        while let Some(parent) = self.owner(current) {
            current = parent;
        }
        Ok(current)
    }

    /// The class a node is declared in; a class is its own declaring class.
    pub fn declaring_class(&self, id: NodeId) -> Result<NodeId> {
        let node = self.get(id)?;
        if node.is_class() {
            return Ok(id);
        }
        self.owner(id).ok_or(GraphError::NoOwningClass(id))
    }

    /// Stable identity derived from the node's binary-level declaration.
    pub fn identity(&self, id: NodeId) -> Result<NodeIdentity> {
        let node = self.get(id)?;
        match node.kind {
            SemanticKind::Class => Ok(NodeIdentity::class(node.name.clone())),
            SemanticKind::Field | SemanticKind::Method { .. } => {
                let owner = self.owner(id).ok_or(GraphError::NoOwningClass(id))?;
                let class_name = self.get(owner)?.name.clone();
                if node.is_method() {
                    Ok(NodeIdentity::method(class_name, &node.name, &node.descriptor))
                } else {
                    Ok(NodeIdentity::field(class_name, &node.name, &node.descriptor))
                }
            }
        }
    }

    /// Reverse lookup from a persisted identity to this graph's node.
    pub fn find(&self, identity: &NodeIdentity) -> Option<NodeId> {
        self.by_identity.get(identity).copied()
    }

    /// The class and everything declared inside it, depth first.
    pub fn descendants(&self, class: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![class];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.members(id).iter().rev().copied());
        }
        out
    }

    fn expect_class(&self, id: NodeId) -> Result<()> {
        if self.get(id)?.is_class() {
            Ok(())
        } else {
            Err(GraphError::NotAClass(id))
        }
    }

    fn push(
        &mut self,
        kind: SemanticKind,
        name: &str,
        descriptor: &str,
        owner: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(SemanticNode {
            id,
            kind,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            declaration: None,
        });
        if let Some(owner) = owner {
            self.owners.insert(id, owner);
            self.members.entry(owner).or_default().push(id);
        }
        if let Ok(identity) = self.identity(id) {
            self.by_identity.insert(identity, id);
        }
        id
    }
}
