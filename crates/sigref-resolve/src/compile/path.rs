use sigref_model::{Identifier, Path, PathKind};

use crate::diagnostics::{Construct, Phase, Report};
use crate::env::Env;
use crate::error::{CompileResult, Recoverable, ResolveError};
use crate::lookup;

use super::Compiler;

/// Resolves `path` in the namespace `kind`. Already resolved paths are
/// returned as they are.
pub(crate) fn resolve(env: &Env, kind: PathKind, path: &Path) -> CompileResult<Result<Path, ResolveError>> {
    if path.is_resolved() {
        return Ok(Ok(path.clone()));
    }
    let resolved = match kind {
        PathKind::Module => lookup::resolve_module_path(env, path),
        PathKind::ModuleType => lookup::resolve_module_type_path(env, path),
        PathKind::Type => lookup::resolve_type_path(env, path),
        PathKind::ClassType => lookup::resolve_class_type_path(env, path),
    };
    Ok(resolved.recoverable()?.map(Path::Resolved))
}

/// Like [`resolve`], but keeps the original path on failure without
/// reporting anything.
pub(crate) fn resolve_silently(env: &Env, kind: PathKind, path: &Path) -> CompileResult<Path> {
    Ok(resolve(env, kind, path)?.unwrap_or_else(|_| path.clone()))
}

impl Compiler {
    /// Like [`resolve_silently`], but files a report against `parent` when
    /// the path stays unresolved.
    pub(super) fn resolve_reporting(
        &mut self,
        env: &Env,
        kind: PathKind,
        path: &Path,
        construct: Construct,
        parent: &Identifier,
    ) -> CompileResult<Path> {
        match resolve(env, kind, path)? {
            Ok(resolved) => Ok(resolved),
            Err(err) => {
                self.report(Report::new(construct, path, Phase::Resolve).in_declaration(parent).with_error(err));
                Ok(path.clone())
            }
        }
    }
}
