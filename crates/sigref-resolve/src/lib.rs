#![doc = include_str!("../README.md")]

pub mod compile;
pub mod component;
pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod expand;
pub mod lookup;
pub mod strengthen;

use std::sync::Arc;

use sigref_model::Unit;

pub use compile::Compiler;
pub use component::{Component, Namespace};
pub use config::ResolverOptions;
pub use diagnostics::{Construct, Diagnostics, Phase, Report};
pub use env::{Env, UnitLookup, UnitResolver};
pub use error::{CompileError, CompileResult, ConfigError, FetchError, Recoverable, ResolveError};
pub use expand::Expansion;

/// A compiled unit together with the reports filed while compiling it.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub unit: Unit,
    pub diagnostics: Diagnostics,
}

/// Compiles `unit` with default options.
pub fn compile(resolver: Arc<dyn UnitResolver>, unit: &Unit) -> Result<Compiled, CompileError> {
    compile_with_options(resolver, ResolverOptions::default(), unit)
}

/// Compiles `unit`, resolving every path it can against the units the
/// resolver provides.
///
/// Unresolvable references are kept as written and reported in
/// [`Compiled::diagnostics`]. The compile only fails when a unit the
/// resolver announced cannot be loaded; no partially compiled unit is
/// returned in that case.
pub fn compile_with_options(
    resolver: Arc<dyn UnitResolver>,
    options: ResolverOptions,
    unit: &Unit,
) -> Result<Compiled, CompileError> {
    log::debug!("Starting compile of {}", unit.id);
    let env = Env::create(resolver, options);
    let mut compiler = Compiler::new();
    let compiled = compiler
        .unit(&env, unit)
        .map_err(|source| CompileError::Fetch { unit: unit.name().to_string(), source })?;
    let diagnostics = compiler.into_diagnostics();
    log::debug!("Compiled {} with {} reports", unit.id, diagnostics.len());
    Ok(Compiled { unit: compiled, diagnostics })
}
