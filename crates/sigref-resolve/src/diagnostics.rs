//! Non-fatal resolution failures.
//!
//! Leaf resolvers never report. A [`Report`] is recorded by the construct
//! that wraps a failing lookup, since that construct knows which
//! declaration to blame.

use std::fmt;

use miette::Diagnostic;
use sigref_model::Identifier;
use thiserror::Error;

use crate::error::ResolveError;

/// Which step of the pass gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Resolve,
    Compile,
    Expand,
    Lookup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Resolve => "resolve",
            Phase::Compile => "compile",
            Phase::Expand => "expand",
            Phase::Lookup => "lookup",
        })
    }
}

/// The kind of construct a report is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Construct {
    ModulePath,
    ModuleTypePath,
    /// The base of a `with` expression.
    ModuleType,
    ModuleFragment,
    TypeFragment,
    Include,
    Package,
    Substitution,
    Class,
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Construct::ModulePath => "module path",
            Construct::ModuleTypePath => "module type path",
            Construct::ModuleType => "module type",
            Construct::ModuleFragment => "module fragment",
            Construct::TypeFragment => "type fragment",
            Construct::Include => "include",
            Construct::Package => "package",
            Construct::Substitution => "substitution",
            Construct::Class => "class",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{phase}: {construct} `{subject}`{}{}", tag_suffix(.parent), cause_suffix(.error))]
#[diagnostic(code(sigref_resolve::unresolved), severity(Warning))]
pub struct Report {
    pub construct: Construct,
    /// The offending construct as written.
    pub subject: String,
    pub phase: Phase,
    /// The nearest enclosing declaration.
    pub parent: Option<Identifier>,
    #[source]
    pub error: Option<ResolveError>,
}

impl Report {
    pub fn new(construct: Construct, subject: impl fmt::Display, phase: Phase) -> Self {
        Self { construct, subject: subject.to_string(), phase, parent: None, error: None }
    }

    pub fn in_declaration(mut self, parent: &Identifier) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn with_error(mut self, error: ResolveError) -> Self {
        self.error = Some(error);
        self
    }

    /// Name of the declaration the report is filed under.
    pub fn tag(&self) -> &str {
        self.parent.as_ref().map(Identifier::display_name).unwrap_or("")
    }
}

fn tag_suffix(parent: &Option<Identifier>) -> String {
    parent.as_ref().map(|p| format!(" in {}", p.display_name())).unwrap_or_default()
}

fn cause_suffix(error: &Option<ResolveError>) -> String {
    error.as_ref().map(|e| format!(": {}", e)).unwrap_or_default()
}

/// Accumulates reports for one compile.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    reports: Vec<Report>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, report: Report) {
        log::warn!("{}", report);
        self.reports.push(report);
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Report> {
        self.reports.iter()
    }

    pub fn into_reports(self) -> Vec<Report> {
        self.reports
    }

    pub fn count_phase(&self, phase: Phase) -> usize {
        self.reports.iter().filter(|r| r.phase == phase).count()
    }
}
