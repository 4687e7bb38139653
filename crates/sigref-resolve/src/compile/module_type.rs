use sigref_model::{
    Fragment, FunctorArgument, FunctorParameter, Identifier, ModuleDecl, ModuleType,
    ModuleTypeExpr, PathKind, Signature, SimpleExpansion, Substitution, TypeOfOrigin,
    UModuleTypeExpr,
};

use crate::convert;
use crate::diagnostics::{Construct, Phase, Report};
use crate::env::Env;
use crate::error::{CompileResult, Recoverable};
use crate::expand;
use crate::lookup;

use super::path::resolve_silently;
use super::Compiler;

impl Compiler {
    pub(super) fn module_type(&mut self, env: &Env, module_type: &ModuleType) -> CompileResult<ModuleType> {
        let expr = match &module_type.expr {
            Some(expr) => Some(self.module_type_expr(env, &module_type.id, expr)?),
            None => None,
        };
        Ok(ModuleType { expr, ..module_type.clone() })
    }

    pub(super) fn module_decl(&mut self, env: &Env, id: &Identifier, decl: &ModuleDecl) -> CompileResult<ModuleDecl> {
        Ok(match decl {
            ModuleDecl::Alias(path, expansion) => {
                let path = self.resolve_reporting(env, PathKind::Module, path, Construct::ModulePath, id)?;
                let expansion = match expansion {
                    Some(e) => Some(self.simple_expansion(env, id, e)?),
                    None => None,
                };
                ModuleDecl::Alias(path, expansion)
            }
            ModuleDecl::ModuleType(expr) => ModuleDecl::ModuleType(self.module_type_expr(env, id, expr)?),
        })
    }

    /// Compiles a module-type expression found under the declaration `id`.
    pub(super) fn module_type_expr(
        &mut self,
        env: &Env,
        id: &Identifier,
        expr: &ModuleTypeExpr,
    ) -> CompileResult<ModuleTypeExpr> {
        Ok(match expr {
            ModuleTypeExpr::Path { path, expansion } => ModuleTypeExpr::Path {
                path: self.resolve_reporting(env, PathKind::ModuleType, path, Construct::ModuleTypePath, id)?,
                expansion: self.cached_expansion(env, id, expansion.as_ref())?,
            },
            ModuleTypeExpr::Signature(sig) => ModuleTypeExpr::Signature(self.signature(env, sig)?),
            ModuleTypeExpr::Functor(param, body) => {
                let (param, body_env) = self.functor_parameter(env, param)?;
                let body = self.module_type_expr(&body_env, &id.result(), body)?;
                ModuleTypeExpr::Functor(param, Box::new(body))
            }
            ModuleTypeExpr::With { substitutions, base, expansion } => {
                self.with(env, id, substitutions, base, expansion.as_ref())?
            }
            ModuleTypeExpr::TypeOf { origin, expansion } => {
                let path = self.resolve_reporting(env, PathKind::Module, origin.path(), Construct::ModulePath, id)?;
                let origin = match origin {
                    TypeOfOrigin::ModuleType(_) => TypeOfOrigin::ModuleType(path),
                    TypeOfOrigin::StructInclude(_) => TypeOfOrigin::StructInclude(path),
                };
                ModuleTypeExpr::TypeOf { origin, expansion: self.cached_expansion(env, id, expansion.as_ref())? }
            }
        })
    }

    /// Compiles the parameter and returns the environment the functor body
    /// is compiled in.
    pub(super) fn functor_parameter(
        &mut self,
        env: &Env,
        param: &FunctorParameter,
    ) -> CompileResult<(FunctorParameter, Env)> {
        match param {
            FunctorParameter::Unit => Ok((FunctorParameter::Unit, env.clone())),
            FunctorParameter::Named(arg) => {
                let arg = FunctorArgument { id: arg.id.clone(), expr: self.module_type_expr(env, &arg.id, &arg.expr)? };
                let body_env = env.add_functor_parameter(&arg);
                Ok((FunctorParameter::Named(Box::new(arg)), body_env))
            }
        }
    }

    pub(super) fn simple_expansion(
        &mut self,
        env: &Env,
        id: &Identifier,
        expansion: &SimpleExpansion,
    ) -> CompileResult<SimpleExpansion> {
        Ok(match expansion {
            SimpleExpansion::Signature(sig) => SimpleExpansion::Signature(self.signature(env, sig)?),
            SimpleExpansion::Functor(param, body) => {
                let (param, body_env) = self.functor_parameter(env, param)?;
                SimpleExpansion::Functor(param, Box::new(self.simple_expansion(&body_env, &id.result(), body)?))
            }
        })
    }

    fn cached_expansion(
        &mut self,
        env: &Env,
        id: &Identifier,
        expansion: Option<&SimpleExpansion>,
    ) -> CompileResult<Option<SimpleExpansion>> {
        expansion.map(|e| self.simple_expansion(env, id, e)).transpose()
    }

    /// `S with ...`.
    ///
    /// Substitutions are applied left to right, each one to the signature
    /// left by the previous ones. When the base cannot be expanded the node
    /// is returned as it was, with a single report.
    fn with(
        &mut self,
        env: &Env,
        id: &Identifier,
        substitutions: &[Substitution],
        base: &UModuleTypeExpr,
        expansion: Option<&SimpleExpansion>,
    ) -> CompileResult<ModuleTypeExpr> {
        let compiled_base = self.u_module_type_expr(env, id, base)?;
        let mut sig = match expand::expand_u_module_type_expr(env, &compiled_base).recoverable()? {
            Ok(sig) => sig,
            Err(err) => {
                self.report(
                    Report::new(Construct::ModuleType, describe_u(base), Phase::Resolve)
                        .in_declaration(id)
                        .with_error(err),
                );
                return Ok(ModuleTypeExpr::With {
                    substitutions: substitutions.to_vec(),
                    base: Box::new(base.clone()),
                    expansion: expansion.cloned(),
                });
            }
        };

        let mut all_applied = true;
        let mut compiled = Vec::with_capacity(substitutions.len());
        for substitution in substitutions {
            let substitution = self.substitution(env, id, substitution, Some(&sig))?;
            let fragment = substitution.fragment();
            if !fragment.is_resolved() {
                let construct =
                    if substitution.targets_module() { Construct::ModuleFragment } else { Construct::TypeFragment };
                self.report(Report::new(construct, fragment, Phase::Resolve).in_declaration(id));
                all_applied = false;
            } else {
                match expand::apply_substitution(env, &substitution, &sig).recoverable()? {
                    Ok(next) => sig = next,
                    Err(err) => {
                        self.report(
                            Report::new(Construct::Substitution, fragment, Phase::Compile)
                                .in_declaration(id)
                                .with_error(err),
                        );
                        all_applied = false;
                    }
                }
            }
            compiled.push(substitution);
        }

        // A literal signature with every constraint applied and nothing left
        // unresolved is replaced by its result. Inner constraints of a nested
        // base were all applied, or the base would not have expanded.
        if all_applied
            && has_literal_root(&compiled_base)
            && convert::count_unresolved(&sig) == 0
        {
            log::trace!("Normalising `with` under {} to a signature", id);
            return Ok(ModuleTypeExpr::Signature(Signature { compiled: true, ..sig }));
        }

        Ok(ModuleTypeExpr::With {
            substitutions: compiled,
            base: Box::new(compiled_base),
            expansion: self.cached_expansion(env, id, expansion)?,
        })
    }

    /// Compiles an expression that cannot be a functor. Nothing is reported
    /// from here; the caller decides whether a failure is worth a report.
    pub(super) fn u_module_type_expr(
        &mut self,
        env: &Env,
        id: &Identifier,
        expr: &UModuleTypeExpr,
    ) -> CompileResult<UModuleTypeExpr> {
        Ok(match expr {
            UModuleTypeExpr::Path(path) => UModuleTypeExpr::Path(resolve_silently(env, PathKind::ModuleType, path)?),
            UModuleTypeExpr::Signature(sig) => UModuleTypeExpr::Signature(self.signature(env, sig)?),
            UModuleTypeExpr::With(substitutions, base) => {
                let base = self.u_module_type_expr(env, id, base)?;
                let mut root = expand::expand_u_module_type_expr(env, &base).recoverable()?.ok();
                let mut compiled = Vec::with_capacity(substitutions.len());
                for substitution in substitutions {
                    let substitution = self.substitution(env, id, substitution, root.as_ref())?;
                    root = match root {
                        Some(sig) => expand::apply_substitution(env, &substitution, &sig).recoverable()?.ok(),
                        None => None,
                    };
                    compiled.push(substitution);
                }
                UModuleTypeExpr::With(compiled, Box::new(base))
            }
            UModuleTypeExpr::TypeOf(origin) => {
                let path = resolve_silently(env, PathKind::Module, origin.path())?;
                UModuleTypeExpr::TypeOf(match origin {
                    TypeOfOrigin::ModuleType(_) => TypeOfOrigin::ModuleType(path),
                    TypeOfOrigin::StructInclude(_) => TypeOfOrigin::StructInclude(path),
                })
            }
        })
    }

    /// Resolves the fragment against `root`, when there is one, and compiles
    /// the right-hand side.
    fn substitution(
        &mut self,
        env: &Env,
        id: &Identifier,
        substitution: &Substitution,
        root: Option<&Signature>,
    ) -> CompileResult<Substitution> {
        let fragment = substitution.fragment();
        let fragment = match root {
            Some(sig) => {
                let scope = env.add_fragment_root(sig.clone());
                let resolved = if substitution.targets_module() {
                    lookup::resolve_module_fragment(&scope, fragment)?
                } else {
                    lookup::resolve_type_fragment(&scope, fragment)?
                };
                resolved.map(Fragment::Resolved).unwrap_or_else(|| fragment.clone())
            }
            None => fragment.clone(),
        };
        Ok(match substitution {
            Substitution::ModuleEq(_, decl) => Substitution::ModuleEq(fragment, self.module_decl(env, id, decl)?),
            Substitution::ModuleSubst(_, path) => {
                Substitution::ModuleSubst(fragment, resolve_silently(env, PathKind::Module, path)?)
            }
            Substitution::TypeEq(_, eq) => Substitution::TypeEq(fragment, self.type_equation(env, id, eq)?),
            Substitution::TypeSubst(_, eq) => Substitution::TypeSubst(fragment, self.type_equation(env, id, eq)?),
        })
    }
}

/// How a non-functor expression reads in a report.
pub(super) fn describe_u(expr: &UModuleTypeExpr) -> String {
    match expr {
        UModuleTypeExpr::Path(path) => path.to_string(),
        UModuleTypeExpr::Signature(_) => "sig ... end".to_string(),
        UModuleTypeExpr::With(_, base) => format!("{} with ...", describe_u(base)),
        UModuleTypeExpr::TypeOf(origin) => format!("module type of {}", origin.path()),
    }
}

/// Whether the innermost base under a chain of `with` is a literal
/// signature.
fn has_literal_root(expr: &UModuleTypeExpr) -> bool {
    match expr {
        UModuleTypeExpr::Signature(_) => true,
        UModuleTypeExpr::With(_, base) => has_literal_root(base),
        UModuleTypeExpr::Path(_) | UModuleTypeExpr::TypeOf(_) => false,
    }
}
