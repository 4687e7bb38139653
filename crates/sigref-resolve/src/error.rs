use miette::Diagnostic;
use sigref_model::PathKind;
use thiserror::Error;

/// A required external unit could not be loaded.
///
/// This is the only failure that aborts a compile. It travels up through
/// every recursive call with `?` and is turned into a [`CompileError`] at
/// the entry point.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The resolver announced the unit but could not produce it.
    #[error("Unit `{unit}` could not be found")]
    #[diagnostic(
        code(sigref_resolve::unit_not_found),
        help("Was `{unit}` compiled before the units that depend on it?")
    )]
    UnitNotFound {
        /// Name of the missing unit.
        unit: String,
    },

    /// The unit exists but reading it failed.
    #[error("Unit `{unit}` failed to load: {reason}")]
    #[diagnostic(code(sigref_resolve::load_failed))]
    LoadFailed {
        /// Name of the unit being loaded.
        unit: String,
        /// What the resolver said went wrong.
        reason: String,
    },
}

/// Why a path, fragment or expansion could not be computed.
///
/// Apart from [`ResolveError::Fetch`] these are soft failures: they end up
/// attached to a diagnostic and the compile carries on.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No binding of the right sort is visible under this name.
    #[error("{kind} `{name}` not found")]
    #[diagnostic(code(sigref_resolve::not_found))]
    NotFound {
        /// The sort of declaration that was looked for.
        kind: PathKind,
        /// The name or path as written.
        name: String,
    },

    /// A module was required but the path denotes another sort of
    /// declaration.
    #[error("`{path}` is not a module")]
    #[diagnostic(code(sigref_resolve::not_a_module))]
    NotAModule {
        /// The offending path.
        path: String,
    },

    /// A functor showed up where a structure was required, e.g. in an
    /// `include`.
    #[error("Expected a signature but found a functor")]
    #[diagnostic(
        code(sigref_resolve::unexpected_functor),
        help("Only structures can be included; apply the functor first")
    )]
    UnexpectedFunctor,

    /// A functor application `F(X)` where `F` expands to a signature.
    #[error("`{path}` is applied but is not a functor")]
    #[diagnostic(code(sigref_resolve::application_of_non_functor))]
    ApplicationOfNonFunctor {
        /// The applied path.
        path: String,
    },

    /// A module type declared without a body, which has no members to
    /// expand into.
    #[error("Module type `{path}` is abstract and has no signature")]
    #[diagnostic(code(sigref_resolve::opaque_module_type))]
    OpaqueModuleType {
        /// The abstract module type.
        path: String,
    },

    /// An expansion needed a path that stayed unresolved.
    #[error("Path `{path}` is unresolved")]
    #[diagnostic(code(sigref_resolve::unresolved_path))]
    UnresolvedPath {
        /// The path as written.
        path: String,
    },

    /// The left-hand side of a `with` constraint or of a package type
    /// substitution names nothing in the constrained signature.
    #[error("Fragment `{fragment}` does not name a member of the signature")]
    #[diagnostic(code(sigref_resolve::unresolved_fragment))]
    UnresolvedFragment {
        /// The fragment as written.
        fragment: String,
    },

    /// `with type t := ...` where the right-hand side is abstract.
    #[error("Destructive substitution of `{fragment}` has no right-hand side")]
    #[diagnostic(code(sigref_resolve::missing_manifest))]
    MissingManifest {
        /// The substituted type.
        fragment: String,
    },

    /// Alias or module-type chains went deeper than
    /// [`ResolverOptions::max_alias_depth`](crate::ResolverOptions).
    #[error("Gave up after following {limit} aliases")]
    #[diagnostic(
        code(sigref_resolve::alias_depth_exceeded),
        help("The aliases are probably cyclic; `max_alias_depth` raises the limit")
    )]
    AliasDepthExceeded {
        /// The configured depth bound.
        limit: usize,
    },

    /// A unit could not be loaded. Unlike the other variants this one
    /// aborts the compile.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),
}

/// Separates the fatal case out of a soft result.
pub trait Recoverable<T> {
    /// `Err` only for [`ResolveError::Fetch`], so callers can `?` it while
    /// handling every other failure locally.
    fn recoverable(self) -> Result<Result<T, ResolveError>, FetchError>;
}

impl<T> Recoverable<T> for Result<T, ResolveError> {
    fn recoverable(self) -> Result<Result<T, ResolveError>, FetchError> {
        match self {
            Err(ResolveError::Fetch(err)) => Err(err),
            other => Ok(other),
        }
    }
}

/// Result of the internal recursion: only fetch failures propagate.
pub type CompileResult<T> = Result<T, FetchError>;

/// Unit-level failure returned by [`crate::compile`].
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Failed to compile unit `{unit}`")]
    #[diagnostic(code(sigref_resolve::compile_failed))]
    Fetch {
        unit: String,
        #[source]
        #[diagnostic_source]
        source: FetchError,
    },
}

/// Errors raised while loading [`crate::ResolverOptions`].
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Error reading resolver options: {0}")]
    #[diagnostic(
        code(sigref_resolve::config_read),
        help("Check that the options file exists and is readable")
    )]
    Read(String),

    #[error("Invalid resolver options: {0}")]
    #[diagnostic(
        code(sigref_resolve::config_parse),
        help("Known keys are `open_modules`, `max_alias_depth` and `strengthen_includes`")
    )]
    Parse(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Read(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
