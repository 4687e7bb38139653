//! The document model shared by the cross-reference passes.
//!
//! A compilation [`Unit`] holds a [`Signature`]: an ordered list of
//! [`Item`]s describing modules, module types, types, values and classes.
//! References between declarations are [`Path`]s and [`Fragment`]s which
//! start out unresolved and are turned into [`Identifier`]-based resolved
//! forms by `sigref-resolve`.
//!
//! Every node is a plain value. Passes never mutate a tree in place, they
//! build a new one.

pub mod class;
pub mod ident;
pub mod module;
pub mod path;
pub mod signature;
pub mod type_expr;
pub mod unit;

pub use class::{
    Class, ClassDecl, ClassSignature, ClassSignatureItem, ClassType, ClassTypeExpr,
    InstanceVariable, Method,
};
pub use ident::{IdentKind, Identifier, CORE_TYPES};
pub use module::{
    FunctorArgument, FunctorParameter, Module, ModuleDecl, ModuleSubstitution, ModuleType,
    ModuleTypeExpr, SimpleExpansion, Substitution, TypeOfOrigin, UModuleTypeExpr,
};
pub use path::{
    Fragment, Path, PathKind, ResolvedFragment, ResolvedPath, UnresolvedFragment, UnresolvedPath,
};
pub use signature::{
    Constructor, ConstructorArgs, Docs, Exception, Extension, ExtensionConstructor, External,
    Field, Include, IncludeDecl, IncludeExpansion, Item, Open, Shadowed, Signature, TypeDecl,
    TypeEquation, TypeRepr, Value,
};
pub use type_expr::{
    Label, Object, ObjectField, Package, PolyVariant, PolyVariantElement, PolyVariantKind,
    TypeExpr,
};
pub use unit::{Import, Packed, Unit, UnitContent};
