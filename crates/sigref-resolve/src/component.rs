//! What the environment stores for each bound identifier.

use std::sync::Arc;

use sigref_model::{
    Class, ClassType, External, FunctorArgument, IdentKind, Item, Module, ModuleType, Signature,
    TypeDecl, Unit, Value,
};

/// Lookup namespaces. A name may be bound once in each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Module,
    ModuleType,
    Type,
    ClassType,
    Value,
}

#[derive(Debug, Clone)]
pub enum Component {
    Module(Arc<Module>),
    ModuleType(Arc<ModuleType>),
    /// A functor parameter, visible inside the functor body.
    Parameter(Arc<FunctorArgument>),
    Unit(Arc<Unit>),
    Type(Arc<TypeDecl>),
    Value(Arc<Value>),
    External(Arc<External>),
    Class(Arc<Class>),
    ClassType(Arc<ClassType>),
}

impl Component {
    /// The namespaces the component is visible in by name.
    pub fn namespaces(&self) -> &'static [Namespace] {
        match self {
            Component::Module(_) | Component::Parameter(_) | Component::Unit(_) => {
                &[Namespace::Module]
            }
            Component::ModuleType(_) => &[Namespace::ModuleType],
            Component::Type(_) => &[Namespace::Type],
            Component::Value(_) | Component::External(_) => &[Namespace::Value],
            // A class also defines an object type and a class type of the same name.
            Component::Class(_) | Component::ClassType(_) => &[Namespace::Type, Namespace::ClassType],
        }
    }

    /// The component an item binds, if any.
    pub fn of_item(item: &Item) -> Option<Component> {
        Some(match item {
            Item::Module(m) => Component::Module(Arc::new(m.clone())),
            Item::ModuleType(m) => Component::ModuleType(Arc::new(m.clone())),
            Item::Type(t) => Component::Type(Arc::new(t.clone())),
            Item::Value(v) => Component::Value(Arc::new(v.clone())),
            Item::External(e) => Component::External(Arc::new(e.clone())),
            Item::Class(c) => Component::Class(Arc::new(c.clone())),
            Item::ClassType(c) => Component::ClassType(Arc::new(c.clone())),
            _ => return None,
        })
    }
}

fn item_in_namespace(item: &Item, ns: Namespace) -> bool {
    matches!(
        (item, ns),
        (Item::Module(_), Namespace::Module)
            | (Item::ModuleType(_), Namespace::ModuleType)
            | (Item::Type(_) | Item::Class(_) | Item::ClassType(_), Namespace::Type)
            | (Item::Class(_) | Item::ClassType(_), Namespace::ClassType)
            | (Item::Value(_) | Item::External(_), Namespace::Value)
    )
}

/// Finds the last binding of `name` in `ns`, looking through include
/// expansions. Later bindings shadow earlier ones.
pub fn find_in_signature<'a>(sig: &'a Signature, ns: Namespace, name: &str) -> Option<&'a Item> {
    sig.items.iter().rev().find_map(|item| match item {
        Item::Include(i) => find_in_signature(&i.expansion.content, ns, name),
        _ if item_in_namespace(item, ns) => {
            item.identifier().filter(|id| id.name() == name).map(|_| item)
        }
        _ => None,
    })
}

/// The `IdentKind` a member found in `ns` is bound with.
pub fn member_kind(item: &Item) -> IdentKind {
    item.identifier().map(|id| id.kind()).unwrap_or(IdentKind::Type)
}
