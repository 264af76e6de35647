// Stable node identities.
//
// A `NodeIdentity` names a class, field or method by its bytecode-level
// declaration only: binary class name plus member name and descriptor.
// Nothing produced by a decompilation run (line numbers, renamed locals,
// synthetic names) feeds into it, so the same binary yields the same
// identities on every run.

use serde::{Deserialize, Serialize};

/// Which kind of declaration an identity points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Class,
    Field,
    Method,
}

impl RefKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Field => "field",
            Self::Method => "method",
        }
    }
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decompilation-independent reference to a semantic node.
///
/// Equality is structural over all three fields. Method signatures are
/// `name + descriptor` (`test(Z)I`), field signatures are `name:descriptor`
/// (`count:I`), and classes carry an empty signature.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub kind: RefKind,
    /// Fully-qualified binary name of the declaring class (`pkg.Outer$Inner`).
    pub declaring_class: String,
    pub member_signature: String,
}

impl NodeIdentity {
    pub fn class(binary_name: impl Into<String>) -> Self {
        Self {
            kind: RefKind::Class,
            declaring_class: binary_name.into(),
            member_signature: String::new(),
        }
    }

    pub fn method(declaring_class: impl Into<String>, name: &str, descriptor: &str) -> Self {
        Self {
            kind: RefKind::Method,
            declaring_class: declaring_class.into(),
            member_signature: format!("{name}{descriptor}"),
        }
    }

    pub fn field(declaring_class: impl Into<String>, name: &str, descriptor: &str) -> Self {
        Self {
            kind: RefKind::Field,
            declaring_class: declaring_class.into(),
            member_signature: format!("{name}:{descriptor}"),
        }
    }

    pub fn is_class(&self) -> bool {
        self.kind == RefKind::Class
    }

    /// Identity of the class this node is declared in (itself for classes).
    pub fn declaring_class_identity(&self) -> Self {
        Self::class(self.declaring_class.clone())
    }
}

impl std::fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            RefKind::Class => f.write_str(&self.declaring_class),
            RefKind::Field | RefKind::Method => {
                write!(f, "{}.{}", self.declaring_class, self.member_signature)
            }
        }
    }
}
