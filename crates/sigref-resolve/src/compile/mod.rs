//! The compile pass.
//!
//! [`Compiler`] rewrites a unit bottom-up, one method per syntactic
//! category, with the environment passed down explicitly. Nodes are never
//! changed in place: each method returns a new node built from its input.
//!
//! Failures come in two tiers. A path, fragment or expansion that cannot be
//! computed is recorded in the [`Diagnostics`] sink by the nearest construct
//! able to blame a declaration, and the original node is kept. A unit that
//! cannot be fetched is a [`FetchError`](crate::FetchError) and unwinds the
//! whole compile through `?`.

mod include;
mod module_type;
mod path;
mod signature;
mod types;

use sigref_model::{Import, Packed, PathKind, Unit, UnitContent};

use crate::diagnostics::{Diagnostics, Report};
use crate::env::{Env, UnitLookup};
use crate::error::CompileResult;

use path::resolve_silently;

#[derive(Debug, Default)]
pub struct Compiler {
    diagnostics: Diagnostics,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    fn report(&mut self, report: Report) {
        self.diagnostics.report(report);
    }

    /// Compiles a whole unit: resolves its imports, opens the configured
    /// modules and compiles its content.
    pub fn unit(&mut self, env: &Env, unit: &Unit) -> CompileResult<Unit> {
        log::debug!("Compiling unit {}", unit.id);
        let imports = unit.imports.iter().map(|import| resolve_import(env, import)).collect();

        let mut env = env.clone();
        for name in env.options().open_modules.clone() {
            if name == unit.name() {
                continue;
            }
            match env.lookup_root_module(&name)? {
                Some(opened) => env = env.open_unit(opened),
                None => log::debug!("Not opening unknown unit {}", name),
            }
        }
        let env = env.add_docs(&unit.doc);

        let content = match &unit.content {
            UnitContent::Module(sig) => UnitContent::Module(self.signature(&env, sig)?),
            UnitContent::Pack(packed) => UnitContent::Pack(
                packed
                    .iter()
                    .map(|p| {
                        Ok(Packed { id: p.id.clone(), path: resolve_silently(&env, PathKind::Module, &p.path)? })
                    })
                    .collect::<CompileResult<_>>()?,
            ),
        };
        Ok(Unit { imports, content, ..unit.clone() })
    }
}

fn resolve_import(env: &Env, import: &Import) -> Import {
    match import {
        Import::Unresolved(name) => match env.lookup_unit(name) {
            UnitLookup::Found(root) => Import::Resolved { root, name: name.clone() },
            UnitLookup::NotFound | UnitLookup::ForwardReference => import.clone(),
        },
        Import::Resolved { .. } => import.clone(),
    }
}
