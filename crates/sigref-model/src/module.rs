//! Modules, module types and module-type expressions.

use serde::{Deserialize, Serialize};

use crate::ident::Identifier;
use crate::path::{Fragment, Path};
use crate::signature::{Docs, Signature, TypeEquation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: Identifier,
    pub doc: Docs,
    pub decl: ModuleDecl,
    /// File-local modules that are not part of the exported interface.
    pub hidden: bool,
}

impl Module {
    pub fn new(id: Identifier, decl: ModuleDecl) -> Self {
        Self { id, doc: Docs::new(), decl, hidden: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleDecl {
    /// `module M = P`, with the expansion of `P` once materialized.
    Alias(Path, Option<SimpleExpansion>),
    /// `module M : S`.
    ModuleType(ModuleTypeExpr),
}

/// `module M := P`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSubstitution {
    pub id: Identifier,
    pub doc: Docs,
    pub manifest: Path,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleType {
    pub id: Identifier,
    pub doc: Docs,
    /// `None` for an abstract module type.
    pub expr: Option<ModuleTypeExpr>,
}

impl ModuleType {
    pub fn new(id: Identifier, expr: Option<ModuleTypeExpr>) -> Self {
        Self { id, doc: Docs::new(), expr }
    }
}

/// A flattened signature, or a chain of functor parameters ending in one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimpleExpansion {
    Signature(Signature),
    Functor(FunctorParameter, Box<SimpleExpansion>),
}

impl From<SimpleExpansion> for ModuleTypeExpr {
    fn from(expansion: SimpleExpansion) -> Self {
        match expansion {
            SimpleExpansion::Signature(sg) => ModuleTypeExpr::Signature(sg),
            SimpleExpansion::Functor(param, body) => {
                ModuleTypeExpr::Functor(param, Box::new(ModuleTypeExpr::from(*body)))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctorParameter {
    /// The generative `()` parameter.
    Unit,
    Named(Box<FunctorArgument>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctorArgument {
    pub id: Identifier,
    pub expr: ModuleTypeExpr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleTypeExpr {
    Path { path: Path, expansion: Option<SimpleExpansion> },
    Signature(Signature),
    Functor(FunctorParameter, Box<ModuleTypeExpr>),
    With { substitutions: Vec<Substitution>, base: Box<UModuleTypeExpr>, expansion: Option<SimpleExpansion> },
    TypeOf { origin: TypeOfOrigin, expansion: Option<SimpleExpansion> },
}

impl ModuleTypeExpr {
    pub fn path(path: Path) -> Self {
        ModuleTypeExpr::Path { path, expansion: None }
    }
}

/// A module-type expression that cannot be a functor: what `include` and the
/// left-hand side of `with` accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UModuleTypeExpr {
    Path(Path),
    Signature(Signature),
    With(Vec<Substitution>, Box<UModuleTypeExpr>),
    TypeOf(TypeOfOrigin),
}

/// The module named by `module type of`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeOfOrigin {
    ModuleType(Path),
    StructInclude(Path),
}

impl TypeOfOrigin {
    pub fn path(&self) -> &Path {
        match self {
            TypeOfOrigin::ModuleType(p) | TypeOfOrigin::StructInclude(p) => p,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Substitution {
    /// `with module M = P` / `with module M : S`.
    ModuleEq(Fragment, ModuleDecl),
    /// `with module M := P`.
    ModuleSubst(Fragment, Path),
    /// `with type t = u`.
    TypeEq(Fragment, TypeEquation),
    /// `with type t := u`.
    TypeSubst(Fragment, TypeEquation),
}

impl Substitution {
    pub fn fragment(&self) -> &Fragment {
        match self {
            Substitution::ModuleEq(f, _)
            | Substitution::ModuleSubst(f, _)
            | Substitution::TypeEq(f, _)
            | Substitution::TypeSubst(f, _) => f,
        }
    }

    /// Whether the fragment targets a module rather than a type.
    pub fn targets_module(&self) -> bool {
        matches!(self, Substitution::ModuleEq(..) | Substitution::ModuleSubst(..))
    }
}
