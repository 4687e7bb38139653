//! Identifiers bound at declaration sites.
//!
//! An [`Identifier`] names exactly one declaration. Identifiers form a tree
//! through their parent back-reference: `Stdlib.List.map` is the `map` value
//! whose parent is the `List` module whose parent is the `Stdlib` unit root.
//! The parent link carries no ownership, it only records where the
//! declaration was bound.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The sort of declaration an [`Identifier`] is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentKind {
    /// The root of a compilation unit.
    Root,
    Module,
    /// A named functor parameter.
    Parameter,
    /// The anonymous result signature of a functor.
    Result,
    ModuleType,
    Type,
    /// A predefined type such as `int` or `list`.
    CoreType,
    Value,
    Class,
    ClassType,
    Exception,
    Extension,
    Constructor,
    Field,
    Method,
    InstanceVariable,
}

impl IdentKind {
    /// Whether identifiers of this kind denote something a module path can
    /// start from (a unit root, a module, or a functor parameter).
    pub fn is_module_like(self) -> bool {
        matches!(self, IdentKind::Root | IdentKind::Module | IdentKind::Parameter)
    }
}

/// A globally unique, immutable handle for a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    kind: IdentKind,
    name: String,
    parent: Option<Box<Identifier>>,
}

/// Names of the predefined types that resolve without any binding in scope.
pub const CORE_TYPES: &[&str] = &[
    "int", "char", "string", "bytes", "float", "bool", "unit", "exn", "array", "list",
    "option", "int32", "int64", "nativeint", "lazy_t", "format6", "extension_constructor",
];

impl Identifier {
    /// The identifier of a compilation unit named `name`.
    pub fn root(name: impl Into<String>) -> Self {
        Self { kind: IdentKind::Root, name: name.into(), parent: None }
    }

    /// The identifier of a predefined type.
    pub fn core_type(name: impl Into<String>) -> Self {
        Self { kind: IdentKind::CoreType, name: name.into(), parent: None }
    }

    /// Binds a new declaration of `kind` named `name` below `self`.
    pub fn child(&self, kind: IdentKind, name: impl Into<String>) -> Self {
        Self { kind, name: name.into(), parent: Some(Box::new(self.clone())) }
    }

    pub fn module(&self, name: impl Into<String>) -> Self {
        self.child(IdentKind::Module, name)
    }

    pub fn module_type(&self, name: impl Into<String>) -> Self {
        self.child(IdentKind::ModuleType, name)
    }

    pub fn type_(&self, name: impl Into<String>) -> Self {
        self.child(IdentKind::Type, name)
    }

    pub fn value(&self, name: impl Into<String>) -> Self {
        self.child(IdentKind::Value, name)
    }

    pub fn class(&self, name: impl Into<String>) -> Self {
        self.child(IdentKind::Class, name)
    }

    pub fn class_type(&self, name: impl Into<String>) -> Self {
        self.child(IdentKind::ClassType, name)
    }

    pub fn parameter(&self, name: impl Into<String>) -> Self {
        self.child(IdentKind::Parameter, name)
    }

    /// The result signature of the functor identified by `self`.
    pub fn result(&self) -> Self {
        self.child(IdentKind::Result, "")
    }

    pub fn kind(&self) -> IdentKind {
        self.kind
    }

    /// The declared name. Empty for functor results.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Identifier> {
        self.parent.as_deref()
    }

    /// Iterates from `self` up to its root, `self` included.
    pub fn ancestors(&self) -> impl Iterator<Item = &Identifier> {
        std::iter::successors(Some(self), |id| id.parent())
    }

    /// The nearest name in the ancestor chain, skipping anonymous functor
    /// results.
    pub fn display_name(&self) -> &str {
        self.ancestors()
            .find(|id| !id.name.is_empty())
            .map(|id| id.name.as_str())
            .unwrap_or("")
    }

    /// Whether `self` is `other` or is bound somewhere below it.
    pub fn is_within(&self, other: &Identifier) -> bool {
        self.ancestors().any(|id| id == other)
    }

    /// Rebuilds `self` with the ancestor `from` replaced by `to`.
    ///
    /// Returns `None` when `from` is not in the ancestor chain.
    pub fn rebase(&self, from: &Identifier, to: &Identifier) -> Option<Identifier> {
        if self == from {
            return Some(to.clone());
        }
        let parent = self.parent()?.rebase(from, to)?;
        Some(parent.child(self.kind, self.name.clone()))
    }

    /// Names written with braces cannot be referred to from source and mark
    /// members renamed away by shadowing.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('{')
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = self.parent() {
            write!(f, "{}", parent)?;
            if !self.name.is_empty() {
                write!(f, ".")?;
            }
        }
        write!(f, "{}", self.name)
    }
}
