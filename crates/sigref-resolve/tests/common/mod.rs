//! Tree builders and an in-memory unit resolver shared by the tests.

#![allow(dead_code)]

use std::sync::Arc;

use fxhash::{FxHashMap, FxHashSet};
use sigref_model::{
    Identifier, Item, Module, ModuleDecl, ModuleType, ModuleTypeExpr, Path, Signature, TypeDecl,
    TypeExpr, Unit, UnitContent, Value,
};
use sigref_resolve::{Compiler, Diagnostics, Env, FetchError, UnitLookup, UnitResolver};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Units kept in memory, keyed by name.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    units: FxHashMap<String, Unit>,
    broken: FxHashSet<String>,
    forward: FxHashSet<String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.units.insert(unit.name().to_string(), unit);
        self
    }

    /// A unit that is announced but fails to load.
    pub fn with_broken(mut self, name: &str) -> Self {
        self.broken.insert(name.to_string());
        self
    }

    /// A unit that exists but is compiled later.
    pub fn with_forward(mut self, name: &str) -> Self {
        self.forward.insert(name.to_string());
        self
    }

    pub fn into_arc(self) -> Arc<dyn UnitResolver> {
        Arc::new(self)
    }
}

impl UnitResolver for MemoryResolver {
    fn lookup_unit(&self, name: &str) -> UnitLookup {
        if self.forward.contains(name) {
            UnitLookup::ForwardReference
        } else if self.units.contains_key(name) || self.broken.contains(name) {
            UnitLookup::Found(Identifier::root(name))
        } else {
            UnitLookup::NotFound
        }
    }

    fn resolve_unit(&self, root: &Identifier) -> Result<Unit, FetchError> {
        let name = root.name();
        if self.broken.contains(name) {
            return Err(FetchError::LoadFailed { unit: name.to_string(), reason: "truncated file".to_string() });
        }
        self.units.get(name).cloned().ok_or_else(|| FetchError::UnitNotFound { unit: name.to_string() })
    }
}

/// The root of the unit under test.
pub fn root() -> Identifier {
    Identifier::root("A")
}

/// `int`, as written.
pub fn int() -> TypeExpr {
    TypeExpr::constr(Path::root("int"))
}

/// A predefined type, resolved.
pub fn core(name: &str) -> TypeExpr {
    TypeExpr::constr(Path::resolved(Identifier::core_type(name)))
}

pub fn named(name: &str) -> TypeExpr {
    TypeExpr::constr(Path::dotted(name))
}

pub fn value(parent: &Identifier, name: &str, type_: TypeExpr) -> Item {
    Item::Value(Value::new(parent.value(name), type_))
}

pub fn abstract_type(parent: &Identifier, name: &str) -> Item {
    Item::Type(TypeDecl::abstract_(parent.type_(name)))
}

pub fn manifest_type(parent: &Identifier, name: &str, manifest: TypeExpr) -> Item {
    Item::Type(TypeDecl::manifest(parent.type_(name), manifest))
}

/// `module type name = sig items end`, with `items` built under the new
/// module type.
pub fn module_type_sig(parent: &Identifier, name: &str, items: impl FnOnce(&Identifier) -> Vec<Item>) -> Item {
    let id = parent.module_type(name);
    let sig = Signature::new(items(&id));
    Item::ModuleType(ModuleType::new(id, Some(ModuleTypeExpr::Signature(sig))))
}

pub fn module_type_expr(parent: &Identifier, name: &str, expr: ModuleTypeExpr) -> Item {
    Item::ModuleType(ModuleType::new(parent.module_type(name), Some(expr)))
}

/// `module name : sig items end`.
pub fn module_sig(parent: &Identifier, name: &str, items: impl FnOnce(&Identifier) -> Vec<Item>) -> Item {
    let id = parent.module(name);
    let sig = Signature::new(items(&id));
    Item::Module(Module::new(id, ModuleDecl::ModuleType(ModuleTypeExpr::Signature(sig))))
}

pub fn module_of_type(parent: &Identifier, name: &str, expr: ModuleTypeExpr) -> Item {
    Item::Module(Module::new(parent.module(name), ModuleDecl::ModuleType(expr)))
}

pub fn alias(parent: &Identifier, name: &str, path: Path) -> Item {
    Item::Module(Module::new(parent.module(name), ModuleDecl::Alias(path, None)))
}

pub fn unit(name: &str, items: impl FnOnce(&Identifier) -> Vec<Item>) -> Unit {
    let id = Identifier::root(name);
    let sig = Signature::new(items(&id));
    Unit::new(id, UnitContent::Module(sig))
}

/// Compiles `items` as a signature in an empty environment.
pub fn compile_items(items: Vec<Item>) -> (Signature, Diagnostics) {
    compile_in(&Env::empty(), items)
}

pub fn compile_in(env: &Env, items: Vec<Item>) -> (Signature, Diagnostics) {
    init_logger();
    let mut compiler = Compiler::new();
    let sig = compiler.signature(env, &Signature::new(items)).expect("no unit is fetched");
    (sig, compiler.into_diagnostics())
}

/// The content signature of a compiled unit.
pub fn content(unit: &Unit) -> &Signature {
    match &unit.content {
        UnitContent::Module(sig) => sig,
        UnitContent::Pack(_) => panic!("expected a module unit"),
    }
}
