//! Classes and class types.

use serde::{Deserialize, Serialize};

use crate::ident::Identifier;
use crate::path::Path;
use crate::signature::Docs;
use crate::type_expr::{Label, TypeExpr};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: Identifier,
    pub doc: Docs,
    pub virtual_: bool,
    pub params: Vec<String>,
    pub decl: ClassDecl,
    pub expansion: Option<ClassSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassDecl {
    ClassType(ClassTypeExpr),
    /// A class function `arg -> decl`.
    Arrow(Option<Label>, TypeExpr, Box<ClassDecl>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassType {
    pub id: Identifier,
    pub doc: Docs,
    pub virtual_: bool,
    pub params: Vec<String>,
    pub expr: ClassTypeExpr,
    pub expansion: Option<ClassSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassTypeExpr {
    /// A reference to another class type, possibly applied to parameters.
    Constr(Path, Vec<TypeExpr>),
    Signature(ClassSignature),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassSignature {
    pub self_: Option<TypeExpr>,
    pub items: Vec<ClassSignatureItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassSignatureItem {
    Method(Method),
    InstanceVariable(InstanceVariable),
    Constraint(TypeExpr, TypeExpr),
    Inherit(ClassTypeExpr),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub id: Identifier,
    pub doc: Docs,
    pub private: bool,
    pub virtual_: bool,
    pub type_: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceVariable {
    pub id: Identifier,
    pub doc: Docs,
    pub mutable: bool,
    pub virtual_: bool,
    pub type_: TypeExpr,
}
