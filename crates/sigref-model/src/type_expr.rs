//! Type expressions.

use serde::{Deserialize, Serialize};

use crate::path::{Fragment, Path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Labelled(String),
    Optional(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// A type variable `'a`.
    Var(String),
    /// The anonymous variable `_`.
    Any,
    Arrow { label: Option<Label>, arg: Box<TypeExpr>, ret: Box<TypeExpr> },
    Tuple(Vec<TypeExpr>),
    /// Application of a type constructor to arguments, e.g. `int list`.
    Constr(Path, Vec<TypeExpr>),
    Variant(PolyVariant),
    Object(Object),
    /// `#c` class type abbreviation.
    Class(Path, Vec<TypeExpr>),
    /// Explicitly polymorphic type `'a 'b. t`.
    Poly(Vec<String>, Box<TypeExpr>),
    /// First-class module type `(module S with type t = u)`.
    Package(Package),
}

impl TypeExpr {
    /// A nullary constructor application.
    pub fn constr(path: Path) -> TypeExpr {
        TypeExpr::Constr(path, Vec::new())
    }

    pub fn arrow(arg: TypeExpr, ret: TypeExpr) -> TypeExpr {
        TypeExpr::Arrow { label: None, arg: Box::new(arg), ret: Box::new(ret) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolyVariantKind {
    Fixed,
    /// Closed with the listed tags required.
    Closed(Vec<String>),
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolyVariant {
    pub kind: PolyVariantKind,
    pub elements: Vec<PolyVariantElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolyVariantElement {
    /// An inherited variant type.
    Type(TypeExpr),
    Constructor { name: String, constant: bool, arguments: Vec<TypeExpr> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub fields: Vec<ObjectField>,
    /// Whether the row ends in `..`.
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectField {
    Method { name: String, type_: TypeExpr },
    Inherit(TypeExpr),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Module type path of the package.
    pub path: Path,
    /// `with type` constraints; fragments are relative to `path`'s signature.
    pub substitutions: Vec<(Fragment, TypeExpr)>,
}
