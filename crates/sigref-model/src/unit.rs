//! Compilation units.

use serde::{Deserialize, Serialize};

use crate::ident::Identifier;
use crate::path::Path;
use crate::signature::{Docs, Signature};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: Identifier,
    pub doc: Docs,
    pub imports: Vec<Import>,
    pub content: UnitContent,
    /// Units that exist for linking only and are not documented.
    pub hidden: bool,
}

impl Unit {
    pub fn new(id: Identifier, content: UnitContent) -> Self {
        Self { id, doc: Docs::new(), imports: Vec::new(), content, hidden: false }
    }

    /// The unit's name as other units refer to it.
    pub fn name(&self) -> &str {
        self.id.name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Import {
    Unresolved(String),
    Resolved { root: Identifier, name: String },
}

impl Import {
    pub fn name(&self) -> &str {
        match self {
            Import::Unresolved(name) | Import::Resolved { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitContent {
    Module(Signature),
    /// A pack of other units, each exposed as a module alias.
    Pack(Vec<Packed>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packed {
    pub id: Identifier,
    pub path: Path,
}
