use sigref_model::{Include, IncludeDecl, Path, PathKind, ResolvedPath};

use crate::convert;
use crate::diagnostics::{Construct, Phase, Report};
use crate::env::Env;
use crate::error::{CompileResult, Recoverable};
use crate::expand;
use crate::strengthen::strengthen;

use super::module_type::describe_u;
use super::path::resolve_silently;
use super::Compiler;

impl Compiler {
    /// Compiles an include and returns the environment later items see.
    ///
    /// Preconditions: `include.parent` is the declaration owning the
    /// enclosing signature.
    ///
    /// Postconditions: on success the expansion is compiled and spliced into
    /// the returned environment. If the expansion cannot be computed, one
    /// report is filed, the previous expansion is kept and the environment is
    /// returned unchanged.
    pub(super) fn include(&mut self, env: &Env, include: &Include) -> CompileResult<(Include, Env)> {
        let decl = match &include.decl {
            IncludeDecl::Alias(path) => IncludeDecl::Alias(resolve_silently(env, PathKind::Module, path)?),
            IncludeDecl::ModuleType(expr) => {
                IncludeDecl::ModuleType(self.u_module_type_expr(env, &include.parent, expr)?)
            }
        };
        let strengthened = match &include.strengthened {
            Some(path) => Some(resolve_silently(env, PathKind::Module, path)?),
            None => None,
        };
        let mut out = Include { decl, strengthened, ..include.clone() };

        if out.expansion.content.compiled {
            let env = env.open_signature(&out.expansion.content);
            return Ok((out, env));
        }

        log::debug!("Expanding include `{}` into {}", describe(&include.decl), include.parent);
        let expanded = match &out.decl {
            IncludeDecl::Alias(path) => {
                expand::expand_module_alias(env, path, false).and_then(expand::assert_not_functor)
            }
            IncludeDecl::ModuleType(expr) => expand::expand_u_module_type_expr(env, expr),
        };
        let sig = match expanded.recoverable()? {
            Ok(sig) => sig,
            Err(err) => {
                self.report(
                    Report::new(Construct::Include, describe(&include.decl), Phase::Expand)
                        .in_declaration(&include.parent)
                        .with_error(err),
                );
                return Ok((out, env.clone()));
            }
        };

        // Strengthen after moving the members under the new parent, so that
        // the manifests added point at the included module and not at the
        // reparented copies.
        let content = convert::reparent_signature(&sig, &include.parent, &include.expansion.shadowed);
        let content = match strengthen_by(env, &out) {
            Some(path) => strengthen(&path, &content),
            None => content,
        };
        let content = self.signature(env, &content)?;
        let env = env.open_signature(&content);
        out.expansion.content = content;
        Ok((out, env))
    }
}

/// The module an include is known to be equal to, if any.
fn strengthen_by(env: &Env, include: &Include) -> Option<ResolvedPath> {
    match (&include.strengthened, &include.decl) {
        (Some(Path::Resolved(path)), _) => Some(path.clone()),
        (_, IncludeDecl::Alias(Path::Resolved(path))) if env.options().strengthen_includes => Some(path.clone()),
        _ => None,
    }
}

fn describe(decl: &IncludeDecl) -> String {
    match decl {
        IncludeDecl::Alias(path) => path.to_string(),
        IncludeDecl::ModuleType(expr) => describe_u(expr),
    }
}
