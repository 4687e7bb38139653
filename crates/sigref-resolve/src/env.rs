//! The scoped symbol table threaded through the compile pass.
//!
//! An [`Env`] is an immutable value. Every `add_*`/`open_*` call returns a
//! new environment whose innermost scope holds the new bindings and points
//! at the previous scope as its parent, so extending an environment never
//! affects the one it was derived from.

use std::fmt;
use std::sync::Arc;

use fxhash::FxHashMap;
use parking_lot::RwLock;
use sigref_model::{
    Docs, FunctorArgument, Identifier, Item, Module, ModuleDecl, ModuleType, Signature, Unit,
    UnitContent,
};

use crate::component::{Component, Namespace};
use crate::config::ResolverOptions;
use crate::error::FetchError;

/// Answer of a [`UnitResolver`] asked about a unit name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitLookup {
    Found(Identifier),
    NotFound,
    /// The unit exists but is compiled after the one asking for it.
    ForwardReference,
}

/// Gives the pass access to other compilation units.
///
/// Implementations must be callable from several compiles at once; the
/// pass only ever reads through them.
pub trait UnitResolver: Send + Sync {
    fn lookup_unit(&self, name: &str) -> UnitLookup;

    /// Loads a unit previously announced by [`UnitResolver::lookup_unit`].
    fn resolve_unit(&self, root: &Identifier) -> Result<Unit, FetchError>;
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<Arc<Scope>>,
    names: FxHashMap<(Namespace, String), Identifier>,
    elements: FxHashMap<Identifier, Component>,
    fragment_root: Option<Arc<Signature>>,
    docs: Docs,
}

impl Scope {
    fn bind(&mut self, id: &Identifier, component: Component) {
        // Braced names only exist to keep identifiers unique.
        if !id.is_hidden() {
            for ns in component.namespaces() {
                self.names.insert((*ns, id.name().to_string()), id.clone());
            }
        }
        self.elements.insert(id.clone(), component);
    }

    fn bind_items(&mut self, items: &[Item]) {
        for item in items {
            match item {
                Item::Include(i) => self.bind_items(&i.expansion.content.items),
                _ => {
                    if let (Some(id), Some(component)) = (item.identifier(), Component::of_item(item)) {
                        self.bind(id, component);
                    }
                }
            }
        }
    }
}

/// Units loaded during one compile, shared by every environment derived
/// from the same initial one.
type LoadedUnits = Arc<RwLock<FxHashMap<Identifier, Arc<Unit>>>>;

#[derive(Clone)]
pub struct Env {
    resolver: Option<Arc<dyn UnitResolver>>,
    options: Arc<ResolverOptions>,
    scope: Option<Arc<Scope>>,
    loaded: LoadedUnits,
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("has_resolver", &self.resolver.is_some())
            .field("options", &self.options)
            .field("depth", &self.depth())
            .field("loaded_units", &self.loaded.read().len())
            .finish()
    }
}

impl Env {
    /// An environment with no bindings and no access to other units.
    pub fn empty() -> Self {
        Self {
            resolver: None,
            options: Arc::new(ResolverOptions::default()),
            scope: None,
            loaded: LoadedUnits::default(),
        }
    }

    /// The initial environment of a unit compile.
    pub fn create(resolver: Arc<dyn UnitResolver>, options: ResolverOptions) -> Self {
        Self { resolver: Some(resolver), options: Arc::new(options), scope: None, loaded: LoadedUnits::default() }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Number of scopes, for logging.
    fn depth(&self) -> usize {
        self.scopes().count()
    }

    fn scopes(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(self.scope.as_deref(), |s| s.parent.as_deref())
    }

    fn extend(&self, fill: impl FnOnce(&mut Scope)) -> Env {
        let mut scope = Scope { parent: self.scope.clone(), ..Scope::default() };
        fill(&mut scope);
        Env {
            resolver: self.resolver.clone(),
            options: self.options.clone(),
            scope: Some(Arc::new(scope)),
            loaded: self.loaded.clone(),
        }
    }

    /// Binds whatever `item` declares.
    ///
    /// Postconditions: items that bind nothing (comments, opens, includes,
    /// substitutions) return an equivalent environment.
    pub fn add_item(&self, item: &Item) -> Env {
        match (item.identifier(), Component::of_item(item)) {
            (Some(id), Some(component)) => self.extend(|s| s.bind(id, component)),
            _ => self.clone(),
        }
    }

    pub fn add_module(&self, module: &Module) -> Env {
        self.extend(|s| s.bind(&module.id, Component::Module(Arc::new(module.clone()))))
    }

    pub fn add_module_type(&self, module_type: &ModuleType) -> Env {
        self.extend(|s| s.bind(&module_type.id, Component::ModuleType(Arc::new(module_type.clone()))))
    }

    /// Makes a functor parameter visible to the functor body.
    pub fn add_functor_parameter(&self, arg: &FunctorArgument) -> Env {
        log::trace!("Adding functor parameter {}", arg.id);
        self.extend(|s| s.bind(&arg.id, Component::Parameter(Arc::new(arg.clone()))))
    }

    /// Sets the signature `with` fragments are resolved against.
    pub fn add_fragment_root(&self, sig: Signature) -> Env {
        self.extend(|s| s.fragment_root = Some(Arc::new(sig)))
    }

    pub fn fragment_root(&self) -> Option<Arc<Signature>> {
        self.scopes().find_map(|s| s.fragment_root.clone())
    }

    pub fn add_docs(&self, docs: &Docs) -> Env {
        if docs.is_empty() {
            return self.clone();
        }
        self.extend(|s| s.docs = docs.clone())
    }

    /// Documentation in scope, innermost first.
    pub fn docs(&self) -> impl Iterator<Item = &String> {
        self.scopes().flat_map(|s| s.docs.iter())
    }

    /// Binds every declaration of `sig`, looking through include expansions.
    pub fn open_signature(&self, sig: &Signature) -> Env {
        log::trace!("Opening signature with {} items", sig.items.len());
        self.extend(|s| s.bind_items(&sig.items))
    }

    /// Binds the unit's root module, and opens its content.
    pub fn open_unit(&self, unit: Arc<Unit>) -> Env {
        log::trace!("Opening unit {}", unit.id);
        self.extend(|s| {
            match &unit.content {
                UnitContent::Module(sig) => s.bind_items(&sig.items),
                UnitContent::Pack(packed) => {
                    for p in packed {
                        let alias = Module::new(p.id.clone(), ModuleDecl::Alias(p.path.clone(), None));
                        s.bind(&p.id, Component::Module(Arc::new(alias)));
                    }
                }
            }
            s.bind(&unit.id, Component::Unit(unit.clone()));
        })
    }

    pub fn lookup_by_name(&self, ns: Namespace, name: &str) -> Option<(Identifier, Component)> {
        let key = (ns, name.to_string());
        let id = self.scopes().find_map(|s| s.names.get(&key))?;
        let component = self.lookup_by_id(id)?;
        Some((id.clone(), component))
    }

    pub fn lookup_by_id(&self, id: &Identifier) -> Option<Component> {
        self.scopes().find_map(|s| s.elements.get(id)).cloned()
    }

    /// Asks the resolver for the root of the unit called `name`.
    pub fn lookup_unit(&self, name: &str) -> UnitLookup {
        match &self.resolver {
            Some(resolver) => resolver.lookup_unit(name),
            None => UnitLookup::NotFound,
        }
    }

    /// The unit whose root is `root`, loading it through the resolver when it
    /// is not already in scope.
    ///
    /// A unit is loaded at most once per compile. Failures are not
    /// remembered.
    pub fn unit(&self, root: &Identifier) -> Result<Arc<Unit>, FetchError> {
        if let Some(Component::Unit(unit)) = self.lookup_by_id(root) {
            return Ok(unit);
        }
        if let Some(unit) = self.loaded.read().get(root) {
            return Ok(unit.clone());
        }
        let resolver = self
            .resolver
            .as_ref()
            .ok_or_else(|| FetchError::UnitNotFound { unit: root.name().to_string() })?;
        log::debug!("Loading unit {}", root);
        let unit = Arc::new(resolver.resolve_unit(root)?);
        self.loaded.write().insert(root.clone(), unit.clone());
        Ok(unit)
    }

    /// Looks a unit up by name and loads it.
    ///
    /// Postconditions: `Ok(None)` when the resolver does not know the name;
    /// `Err` when it knows it but cannot load it.
    pub fn lookup_root_module(&self, name: &str) -> Result<Option<Arc<Unit>>, FetchError> {
        match self.lookup_unit(name) {
            UnitLookup::Found(root) => self.unit(&root).map(Some),
            UnitLookup::NotFound | UnitLookup::ForwardReference => Ok(None),
        }
    }
}
