use std::sync::Arc;

use sigref_model::{
    Class, ClassDecl, ClassSignature, ClassSignatureItem, ClassType, ClassTypeExpr, Constructor,
    ConstructorArgs, Exception, Extension, ExtensionConstructor, Field, Fragment, Identifier,
    InstanceVariable, Method, Object, ObjectField, Package, Path, PathKind, PolyVariant,
    PolyVariantElement, TypeDecl, TypeEquation, TypeExpr, TypeRepr,
};

use crate::component::Component;
use crate::diagnostics::{Construct, Phase, Report};
use crate::env::Env;
use crate::error::{CompileResult, Recoverable, ResolveError};
use crate::expand;
use crate::lookup;

use super::path::resolve_silently;
use super::Compiler;

impl Compiler {
    pub(super) fn type_decl(&mut self, env: &Env, decl: &TypeDecl) -> CompileResult<TypeDecl> {
        let equation = self.type_equation(env, &decl.id, &decl.equation)?;
        let representation = match &decl.representation {
            Some(repr) => Some(self.type_repr(env, &decl.id, repr)?),
            None => None,
        };
        Ok(TypeDecl { equation, representation, ..decl.clone() })
    }

    pub(super) fn type_equation(
        &mut self,
        env: &Env,
        parent: &Identifier,
        eq: &TypeEquation,
    ) -> CompileResult<TypeEquation> {
        let manifest = match &eq.manifest {
            Some(ty) => Some(self.type_expr(env, parent, ty)?),
            None => None,
        };
        let constraints = eq
            .constraints
            .iter()
            .map(|(lhs, rhs)| Ok((self.type_expr(env, parent, lhs)?, self.type_expr(env, parent, rhs)?)))
            .collect::<CompileResult<_>>()?;
        Ok(TypeEquation { manifest, constraints, ..eq.clone() })
    }

    fn type_repr(&mut self, env: &Env, parent: &Identifier, repr: &TypeRepr) -> CompileResult<TypeRepr> {
        Ok(match repr {
            TypeRepr::Variant(constructors) => TypeRepr::Variant(
                constructors.iter().map(|c| self.constructor(env, parent, c)).collect::<CompileResult<_>>()?,
            ),
            TypeRepr::Record(fields) => TypeRepr::Record(self.fields(env, parent, fields)?),
            TypeRepr::Extensible => TypeRepr::Extensible,
        })
    }

    fn constructor(&mut self, env: &Env, parent: &Identifier, c: &Constructor) -> CompileResult<Constructor> {
        Ok(Constructor {
            args: self.constructor_args(env, parent, &c.args)?,
            res: self.optional_type(env, parent, c.res.as_ref())?,
            ..c.clone()
        })
    }

    fn constructor_args(
        &mut self,
        env: &Env,
        parent: &Identifier,
        args: &ConstructorArgs,
    ) -> CompileResult<ConstructorArgs> {
        Ok(match args {
            ConstructorArgs::Tuple(types) => ConstructorArgs::Tuple(self.type_exprs(env, parent, types)?),
            ConstructorArgs::Record(fields) => ConstructorArgs::Record(self.fields(env, parent, fields)?),
        })
    }

    fn fields(&mut self, env: &Env, parent: &Identifier, fields: &[Field]) -> CompileResult<Vec<Field>> {
        fields
            .iter()
            .map(|f| Ok(Field { type_: self.type_expr(env, parent, &f.type_)?, ..f.clone() }))
            .collect()
    }

    fn optional_type(
        &mut self,
        env: &Env,
        parent: &Identifier,
        ty: Option<&TypeExpr>,
    ) -> CompileResult<Option<TypeExpr>> {
        ty.map(|ty| self.type_expr(env, parent, ty)).transpose()
    }

    fn type_exprs(&mut self, env: &Env, parent: &Identifier, types: &[TypeExpr]) -> CompileResult<Vec<TypeExpr>> {
        types.iter().map(|ty| self.type_expr(env, parent, ty)).collect()
    }

    /// Compiles a type expression found under the declaration `parent`.
    ///
    /// Constructor and class paths that do not resolve are kept as written
    /// and not reported. Only package types report.
    pub(super) fn type_expr(&mut self, env: &Env, parent: &Identifier, ty: &TypeExpr) -> CompileResult<TypeExpr> {
        Ok(match ty {
            TypeExpr::Var(_) | TypeExpr::Any => ty.clone(),
            TypeExpr::Arrow { label, arg, ret } => TypeExpr::Arrow {
                label: label.clone(),
                arg: Box::new(self.type_expr(env, parent, arg)?),
                ret: Box::new(self.type_expr(env, parent, ret)?),
            },
            TypeExpr::Tuple(types) => TypeExpr::Tuple(self.type_exprs(env, parent, types)?),
            TypeExpr::Constr(path, args) => TypeExpr::Constr(
                resolve_silently(env, PathKind::Type, path)?,
                self.type_exprs(env, parent, args)?,
            ),
            TypeExpr::Variant(variant) => TypeExpr::Variant(PolyVariant {
                kind: variant.kind.clone(),
                elements: variant
                    .elements
                    .iter()
                    .map(|element| {
                        Ok(match element {
                            PolyVariantElement::Type(ty) => PolyVariantElement::Type(self.type_expr(env, parent, ty)?),
                            PolyVariantElement::Constructor { name, constant, arguments } => {
                                PolyVariantElement::Constructor {
                                    name: name.clone(),
                                    constant: *constant,
                                    arguments: self.type_exprs(env, parent, arguments)?,
                                }
                            }
                        })
                    })
                    .collect::<CompileResult<_>>()?,
            }),
            TypeExpr::Object(object) => TypeExpr::Object(Object {
                fields: object
                    .fields
                    .iter()
                    .map(|field| {
                        Ok(match field {
                            ObjectField::Method { name, type_ } => {
                                ObjectField::Method { name: name.clone(), type_: self.type_expr(env, parent, type_)? }
                            }
                            ObjectField::Inherit(ty) => ObjectField::Inherit(self.type_expr(env, parent, ty)?),
                        })
                    })
                    .collect::<CompileResult<_>>()?,
                open: object.open,
            }),
            TypeExpr::Class(path, args) => TypeExpr::Class(
                resolve_silently(env, PathKind::ClassType, path)?,
                self.type_exprs(env, parent, args)?,
            ),
            TypeExpr::Poly(vars, body) => TypeExpr::Poly(vars.clone(), Box::new(self.type_expr(env, parent, body)?)),
            TypeExpr::Package(package) => TypeExpr::Package(self.package(env, parent, package)?),
        })
    }

    /// `(module S with type t = u)`.
    fn package(&mut self, env: &Env, parent: &Identifier, package: &Package) -> CompileResult<Package> {
        let path = resolve_silently(env, PathKind::ModuleType, &package.path)?;
        let expansion = match &path {
            Path::Resolved(target) => {
                lookup::module_type_expansion(env, target).and_then(expand::assert_not_functor)
            }
            Path::Unresolved(_) => Err(ResolveError::UnresolvedPath { path: path.to_string() }),
        };
        let sig = match expansion.recoverable()? {
            Ok(sig) => Some(sig),
            Err(err) => {
                self.report(
                    Report::new(Construct::Package, &path, Phase::Lookup).in_declaration(parent).with_error(err),
                );
                None
            }
        };

        let mut substitutions = Vec::with_capacity(package.substitutions.len());
        for (fragment, ty) in &package.substitutions {
            let fragment = match &sig {
                Some(sig) => {
                    let scope = env.add_fragment_root(sig.clone());
                    match lookup::resolve_type_fragment(&scope, fragment)? {
                        Some(resolved) => Fragment::Resolved(resolved),
                        None => {
                            self.report(
                                Report::new(Construct::TypeFragment, fragment, Phase::Resolve).in_declaration(parent),
                            );
                            fragment.clone()
                        }
                    }
                }
                None => fragment.clone(),
            };
            substitutions.push((fragment, self.type_expr(env, parent, ty)?));
        }
        Ok(Package { path, substitutions })
    }

    pub(super) fn extension(&mut self, env: &Env, extension: &Extension) -> CompileResult<Extension> {
        let type_path = resolve_silently(env, PathKind::Type, &extension.type_path)?;
        let constructors = extension
            .constructors
            .iter()
            .map(|c| {
                Ok(ExtensionConstructor {
                    args: self.constructor_args(env, &c.id, &c.args)?,
                    res: self.optional_type(env, &c.id, c.res.as_ref())?,
                    ..c.clone()
                })
            })
            .collect::<CompileResult<_>>()?;
        Ok(Extension { type_path, constructors, ..extension.clone() })
    }

    pub(super) fn exception(&mut self, env: &Env, exception: &Exception) -> CompileResult<Exception> {
        Ok(Exception {
            args: self.constructor_args(env, &exception.id, &exception.args)?,
            res: self.optional_type(env, &exception.id, exception.res.as_ref())?,
            ..exception.clone()
        })
    }

    pub(super) fn class(&mut self, env: &Env, class: &Class) -> CompileResult<Class> {
        let decl = self.class_decl(env, &class.id, &class.decl)?;
        let compiled = Class { decl, ..class.clone() };
        let expansion = self.class_expansion(
            env,
            &class.id,
            &Component::Class(Arc::new(compiled.clone())),
            class.expansion.as_ref(),
        )?;
        Ok(Class { expansion, ..compiled })
    }

    pub(super) fn class_type(&mut self, env: &Env, class_type: &ClassType) -> CompileResult<ClassType> {
        let expr = self.class_type_expr(env, &class_type.id, &class_type.expr)?;
        let compiled = ClassType { expr, ..class_type.clone() };
        let expansion = self.class_expansion(
            env,
            &class_type.id,
            &Component::ClassType(Arc::new(compiled.clone())),
            class_type.expansion.as_ref(),
        )?;
        Ok(ClassType { expansion, ..compiled })
    }

    /// Recomputes the class signature; keeps `previous` when it cannot be
    /// computed.
    ///
    /// A literal signature in the declaration was compiled with it and is
    /// taken as is. Signatures reached through a class path are compiled
    /// without reporting: their failures belong to the class they come from,
    /// and a failure to reach them was already reported by the path.
    fn class_expansion(
        &mut self,
        env: &Env,
        id: &Identifier,
        component: &Component,
        previous: Option<&ClassSignature>,
    ) -> CompileResult<Option<ClassSignature>> {
        if let Some(sig) = literal_class_signature(component) {
            return Ok(Some(sig.clone()));
        }
        let sig = match lookup::class_signature_of(env, component)? {
            Some(sig) => sig,
            None => match previous {
                Some(sig) => sig.clone(),
                None => return Ok(None),
            },
        };
        Compiler::new().class_signature(env, id, &sig).map(Some)
    }

    fn class_decl(&mut self, env: &Env, id: &Identifier, decl: &ClassDecl) -> CompileResult<ClassDecl> {
        Ok(match decl {
            ClassDecl::ClassType(expr) => ClassDecl::ClassType(self.class_type_expr(env, id, expr)?),
            ClassDecl::Arrow(label, arg, body) => ClassDecl::Arrow(
                label.clone(),
                self.type_expr(env, id, arg)?,
                Box::new(self.class_decl(env, id, body)?),
            ),
        })
    }

    fn class_type_expr(&mut self, env: &Env, id: &Identifier, expr: &ClassTypeExpr) -> CompileResult<ClassTypeExpr> {
        Ok(match expr {
            ClassTypeExpr::Constr(path, args) => ClassTypeExpr::Constr(
                self.resolve_reporting(env, PathKind::ClassType, path, Construct::Class, id)?,
                self.type_exprs(env, id, args)?,
            ),
            ClassTypeExpr::Signature(sig) => ClassTypeExpr::Signature(self.class_signature(env, id, sig)?),
        })
    }

    fn class_signature(&mut self, env: &Env, id: &Identifier, sig: &ClassSignature) -> CompileResult<ClassSignature> {
        let self_ = self.optional_type(env, id, sig.self_.as_ref())?;
        let items = sig
            .items
            .iter()
            .map(|item| {
                Ok(match item {
                    ClassSignatureItem::Method(m) => {
                        ClassSignatureItem::Method(Method { type_: self.type_expr(env, id, &m.type_)?, ..m.clone() })
                    }
                    ClassSignatureItem::InstanceVariable(v) => ClassSignatureItem::InstanceVariable(InstanceVariable {
                        type_: self.type_expr(env, id, &v.type_)?,
                        ..v.clone()
                    }),
                    ClassSignatureItem::Constraint(lhs, rhs) => {
                        ClassSignatureItem::Constraint(self.type_expr(env, id, lhs)?, self.type_expr(env, id, rhs)?)
                    }
                    ClassSignatureItem::Inherit(expr) => ClassSignatureItem::Inherit(self.class_type_expr(env, id, expr)?),
                    ClassSignatureItem::Comment(_) => item.clone(),
                })
            })
            .collect::<CompileResult<_>>()?;
        Ok(ClassSignature { self_, items })
    }
}

/// The signature written directly in a class declaration, under any
/// arrows.
fn literal_class_signature(component: &Component) -> Option<&ClassSignature> {
    let expr = match component {
        Component::Class(c) => {
            let mut decl = &c.decl;
            while let ClassDecl::Arrow(_, _, body) = decl {
                decl = &**body;
            }
            match decl {
                ClassDecl::ClassType(expr) => expr,
                ClassDecl::Arrow(..) => return None,
            }
        }
        Component::ClassType(ct) => &ct.expr,
        _ => return None,
    };
    match expr {
        ClassTypeExpr::Signature(sig) => Some(sig),
        ClassTypeExpr::Constr(..) => None,
    }
}
