//! Paths and fragments.
//!
//! A [`Path`] refers to a declaration from the scope it is written in. It is
//! either already [`Path::Resolved`] to a [`ResolvedPath`], or still an
//! [`UnresolvedPath`] that only records what was written: a root name
//! followed by projections and functor applications.
//!
//! A [`Fragment`] is the same idea relative to an implicit base signature.
//! Fragments appear on the left-hand side of `with` constraints.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ident::{IdentKind, Identifier};

/// Which namespace a path is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathKind {
    Module,
    ModuleType,
    Type,
    ClassType,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathKind::Module => "module",
            PathKind::ModuleType => "module type",
            PathKind::Type => "type",
            PathKind::ClassType => "class type",
        })
    }
}

/// A path whose target is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolvedPath {
    /// Points straight at a declaration.
    Identifier(Identifier),
    /// The module obtained by applying `functor` to `argument`.
    Apply { functor: Box<ResolvedPath>, argument: Box<ResolvedPath> },
    /// A member of a module that has no identifier of its own, i.e. the
    /// result of a functor application.
    Dot { parent: Box<ResolvedPath>, kind: IdentKind, name: String },
}

impl ResolvedPath {
    /// The path of member `name` of the module denoted by `self`.
    ///
    /// Members of identified modules get identifiers of their own, so the
    /// result's parent chain mirrors the accessor chain that produced it.
    pub fn child(&self, kind: IdentKind, name: impl Into<String>) -> ResolvedPath {
        match self {
            ResolvedPath::Identifier(id) => ResolvedPath::Identifier(id.child(kind, name)),
            _ => ResolvedPath::Dot { parent: Box::new(self.clone()), kind, name: name.into() },
        }
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        match self {
            ResolvedPath::Identifier(id) => Some(id),
            _ => None,
        }
    }

    /// Applies `f` to every identifier in the path, replacing those for which
    /// it returns a new one.
    pub fn map_identifiers(&mut self, f: &mut dyn FnMut(&Identifier) -> Option<Identifier>) {
        match self {
            ResolvedPath::Identifier(id) => {
                if let Some(new) = f(id) {
                    *id = new;
                }
            }
            ResolvedPath::Apply { functor, argument } => {
                functor.map_identifiers(f);
                argument.map_identifiers(f);
            }
            ResolvedPath::Dot { parent, .. } => parent.map_identifiers(f),
        }
    }

    /// Rebuilds the path so that whatever went through `from` now goes
    /// through `to`. Returns `None` when the path never mentions `from`.
    pub fn reroot(&self, from: &Identifier, to: &ResolvedPath) -> Option<ResolvedPath> {
        match self {
            ResolvedPath::Identifier(id) => reroot_identifier(id, from, to),
            ResolvedPath::Apply { functor, argument } => {
                let f = functor.reroot(from, to);
                let a = argument.reroot(from, to);
                if f.is_none() && a.is_none() {
                    return None;
                }
                Some(ResolvedPath::Apply {
                    functor: Box::new(f.unwrap_or_else(|| (**functor).clone())),
                    argument: Box::new(a.unwrap_or_else(|| (**argument).clone())),
                })
            }
            ResolvedPath::Dot { parent, kind, name } => {
                parent.reroot(from, to).map(|p| p.child(*kind, name.clone()))
            }
        }
    }
}

fn reroot_identifier(id: &Identifier, from: &Identifier, to: &ResolvedPath) -> Option<ResolvedPath> {
    if id == from {
        return Some(to.clone());
    }
    let parent = reroot_identifier(id.parent()?, from, to)?;
    Some(parent.child(id.kind(), id.name()))
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedPath::Identifier(id) => write!(f, "{}", id),
            ResolvedPath::Apply { functor, argument } => write!(f, "{}({})", functor, argument),
            ResolvedPath::Dot { parent, name, .. } => write!(f, "{}.{}", parent, name),
        }
    }
}

/// What was written for a path that has not been resolved yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnresolvedPath {
    /// A bare name looked up in the enclosing scope.
    Root(String),
    /// Projection of `name` out of a module path.
    Dot(Box<Path>, String),
    /// Application of a functor path to an argument path.
    Apply(Box<Path>, Box<Path>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Path {
    Resolved(ResolvedPath),
    Unresolved(UnresolvedPath),
}

impl Path {
    pub fn root(name: impl Into<String>) -> Path {
        Path::Unresolved(UnresolvedPath::Root(name.into()))
    }

    pub fn resolved(id: Identifier) -> Path {
        Path::Resolved(ResolvedPath::Identifier(id))
    }

    /// Parses a dotted path such as `Stdlib.List.t` into unresolved form.
    pub fn dotted(text: &str) -> Path {
        let mut segments = text.split('.');
        let first = segments.next().unwrap_or_default();
        segments.fold(Path::root(first), |parent, seg| parent.dot(seg))
    }

    pub fn dot(self, name: impl Into<String>) -> Path {
        Path::Unresolved(UnresolvedPath::Dot(Box::new(self), name.into()))
    }

    pub fn apply(self, argument: Path) -> Path {
        Path::Unresolved(UnresolvedPath::Apply(Box::new(self), Box::new(argument)))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Path::Resolved(_))
    }

    pub fn as_resolved(&self) -> Option<&ResolvedPath> {
        match self {
            Path::Resolved(p) => Some(p),
            Path::Unresolved(_) => None,
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Resolved(p) => write!(f, "{}", p),
            Path::Unresolved(UnresolvedPath::Root(name)) => f.write_str(name),
            Path::Unresolved(UnresolvedPath::Dot(parent, name)) => write!(f, "{}.{}", parent, name),
            Path::Unresolved(UnresolvedPath::Apply(func, arg)) => write!(f, "{}({})", func, arg),
        }
    }
}

/// A fragment whose target inside the base signature is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolvedFragment {
    /// The base signature itself.
    Root,
    Module(Box<ResolvedFragment>, String),
    Type(Box<ResolvedFragment>, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnresolvedFragment {
    Root,
    Dot(Box<Fragment>, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fragment {
    Resolved(ResolvedFragment),
    Unresolved(UnresolvedFragment),
}

impl Fragment {
    /// Parses `A.B.t` into an unresolved fragment.
    pub fn dotted(text: &str) -> Fragment {
        text.split('.').fold(Fragment::Unresolved(UnresolvedFragment::Root), |parent, seg| {
            Fragment::Unresolved(UnresolvedFragment::Dot(Box::new(parent), seg.to_string()))
        })
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Fragment::Resolved(_))
    }

    /// The names traversed from the base signature, outermost first.
    pub fn segments(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_segments(&mut out);
        out
    }

    fn collect_segments(&self, out: &mut Vec<String>) {
        match self {
            Fragment::Resolved(r) => r.collect_segments(out),
            Fragment::Unresolved(UnresolvedFragment::Root) => {}
            Fragment::Unresolved(UnresolvedFragment::Dot(parent, name)) => {
                parent.collect_segments(out);
                out.push(name.clone());
            }
        }
    }
}

impl ResolvedFragment {
    pub fn segments(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_segments(&mut out);
        out
    }

    fn collect_segments(&self, out: &mut Vec<String>) {
        match self {
            ResolvedFragment::Root => {}
            ResolvedFragment::Module(parent, name) | ResolvedFragment::Type(parent, name) => {
                parent.collect_segments(out);
                out.push(name.clone());
            }
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments().join("."))
    }
}

impl fmt::Display for ResolvedFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments().join("."))
    }
}
