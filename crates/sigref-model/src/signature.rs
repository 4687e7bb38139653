//! Signatures and the items they contain.

use serde::{Deserialize, Serialize};

use crate::class::{Class, ClassType};
use crate::ident::{IdentKind, Identifier};
use crate::module::{Module, ModuleSubstitution, ModuleType, UModuleTypeExpr};
use crate::path::Path;
use crate::type_expr::TypeExpr;

/// Documentation paragraphs attached to a declaration.
pub type Docs = Vec<String>;

/// An ordered sequence of declarations.
///
/// Once `compiled` is set the items are in their final, resolved form and
/// compiling the signature again must give back the same value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signature {
    pub items: Vec<Item>,
    pub compiled: bool,
    pub doc: Docs,
}

impl Signature {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items, compiled: false, doc: Docs::new() }
    }

    /// The identifier shared as parent by the signature's declarations.
    pub fn parent(&self) -> Option<Identifier> {
        self.items.iter().find_map(|item| match item {
            Item::Include(i) => Some(i.parent.clone()),
            _ => item.identifier().and_then(|id| id.parent().cloned()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Item {
    Module(Module),
    ModuleSubstitution(ModuleSubstitution),
    ModuleType(ModuleType),
    Type(TypeDecl),
    TypeSubstitution(TypeDecl),
    Value(Value),
    External(External),
    Class(Class),
    ClassType(ClassType),
    TypeExtension(Extension),
    Exception(Exception),
    Include(Include),
    Open(Open),
    Comment(String),
}

impl Item {
    /// The identifier the item binds, if it binds one.
    pub fn identifier(&self) -> Option<&Identifier> {
        match self {
            Item::Module(m) => Some(&m.id),
            Item::ModuleSubstitution(m) => Some(&m.id),
            Item::ModuleType(m) => Some(&m.id),
            Item::Type(t) | Item::TypeSubstitution(t) => Some(&t.id),
            Item::Value(v) => Some(&v.id),
            Item::External(e) => Some(&e.id),
            Item::Class(c) => Some(&c.id),
            Item::ClassType(c) => Some(&c.id),
            Item::Exception(e) => Some(&e.id),
            Item::TypeExtension(_) | Item::Include(_) | Item::Open(_) | Item::Comment(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub id: Identifier,
    pub doc: Docs,
    pub equation: TypeEquation,
    pub representation: Option<TypeRepr>,
}

impl TypeDecl {
    /// `type t`.
    pub fn abstract_(id: Identifier) -> Self {
        Self { id, doc: Docs::new(), equation: TypeEquation::default(), representation: None }
    }

    /// `type t = manifest`.
    pub fn manifest(id: Identifier, manifest: TypeExpr) -> Self {
        Self {
            id,
            doc: Docs::new(),
            equation: TypeEquation { manifest: Some(manifest), ..TypeEquation::default() },
            representation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeEquation {
    pub params: Vec<String>,
    pub private: bool,
    pub manifest: Option<TypeExpr>,
    pub constraints: Vec<(TypeExpr, TypeExpr)>,
}

impl TypeEquation {
    pub fn manifest(manifest: TypeExpr) -> Self {
        Self { manifest: Some(manifest), ..Self::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRepr {
    Variant(Vec<Constructor>),
    Record(Vec<Field>),
    Extensible,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constructor {
    pub id: Identifier,
    pub doc: Docs,
    pub args: ConstructorArgs,
    pub res: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstructorArgs {
    Tuple(Vec<TypeExpr>),
    Record(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: Identifier,
    pub doc: Docs,
    pub mutable: bool,
    pub type_: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub id: Identifier,
    pub doc: Docs,
    pub type_: TypeExpr,
}

impl Value {
    pub fn new(id: Identifier, type_: TypeExpr) -> Self {
        Self { id, doc: Docs::new(), type_ }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct External {
    pub id: Identifier,
    pub doc: Docs,
    pub type_: TypeExpr,
    pub primitives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
    pub id: Identifier,
    pub doc: Docs,
    pub args: ConstructorArgs,
    pub res: Option<TypeExpr>,
}

/// `type t += A | B`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub type_path: Path,
    pub doc: Docs,
    pub type_params: Vec<String>,
    pub private: bool,
    pub constructors: Vec<ExtensionConstructor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionConstructor {
    pub id: Identifier,
    pub doc: Docs,
    pub args: ConstructorArgs,
    pub res: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    /// The signature the expansion is spliced into.
    pub parent: Identifier,
    pub doc: Docs,
    pub decl: IncludeDecl,
    /// Set when the included module is known to be equal to this path.
    pub strengthened: Option<Path>,
    pub expansion: IncludeExpansion,
}

impl Include {
    pub fn new(parent: Identifier, decl: IncludeDecl) -> Self {
        Self {
            parent,
            doc: Docs::new(),
            decl,
            strengthened: None,
            expansion: IncludeExpansion::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncludeDecl {
    /// `include M` of a module.
    Alias(Path),
    /// `include S` of a module type.
    ModuleType(UModuleTypeExpr),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IncludeExpansion {
    pub shadowed: Shadowed,
    pub content: Signature,
}

/// Members of an include that later items of the enclosing signature
/// redefine, per namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Shadowed {
    pub modules: Vec<String>,
    pub module_types: Vec<String>,
    pub types: Vec<String>,
    pub values: Vec<String>,
    pub classes: Vec<String>,
    pub class_types: Vec<String>,
}

impl Shadowed {
    /// The hidden replacement name for `id` if it is shadowed.
    pub fn hidden_name(&self, id: &Identifier) -> Option<String> {
        let names = match id.kind() {
            IdentKind::Module => &self.modules,
            IdentKind::ModuleType => &self.module_types,
            IdentKind::Type => &self.types,
            IdentKind::Value => &self.values,
            IdentKind::Class => &self.classes,
            IdentKind::ClassType => &self.class_types,
            _ => return None,
        };
        names.iter().any(|n| n == id.name()).then(|| format!("{{{}}}", id.name()))
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
            && self.module_types.is_empty()
            && self.types.is_empty()
            && self.values.is_empty()
            && self.classes.is_empty()
            && self.class_types.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Open {
    pub doc: Docs,
    pub expansion: Signature,
}
