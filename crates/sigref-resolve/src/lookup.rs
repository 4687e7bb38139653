//! The resolution service: turns unresolved paths and fragments into
//! resolved ones, and finds the signature a resolved module path denotes.
//!
//! Every function that may chase an alias or a module-type path takes the
//! current chase depth and bumps it through [`deeper`], so cyclic aliases end
//! in [`ResolveError::AliasDepthExceeded`] instead of overflowing the stack.

use std::sync::Arc;

use sigref_model::{
    ClassDecl, ClassSignature, ClassTypeExpr, Fragment, FunctorParameter, IdentKind, Identifier,
    Item, Module, ModuleDecl, ModuleType, Path, PathKind, ResolvedFragment, ResolvedPath,
    Signature, Unit, UnitContent, UnresolvedPath, CORE_TYPES,
};

use crate::component::{find_in_signature, member_kind, Component, Namespace};
use crate::env::{Env, UnitLookup};
use crate::error::{FetchError, Recoverable, ResolveError};
use crate::expand::{self, Expansion};

pub(crate) fn deeper(env: &Env, depth: usize) -> Result<usize, ResolveError> {
    let limit = env.options().max_alias_depth;
    if depth >= limit {
        log::debug!("Lookup gave up at depth {}", limit);
        return Err(ResolveError::AliasDepthExceeded { limit });
    }
    Ok(depth + 1)
}

fn not_found(kind: PathKind, name: impl ToString) -> ResolveError {
    ResolveError::NotFound { kind, name: name.to_string() }
}

pub fn resolve_module_path(env: &Env, path: &Path) -> Result<ResolvedPath, ResolveError> {
    module_path(env, path, 0)
}

pub fn resolve_module_type_path(env: &Env, path: &Path) -> Result<ResolvedPath, ResolveError> {
    module_type_path(env, path, 0)
}

pub fn resolve_type_path(env: &Env, path: &Path) -> Result<ResolvedPath, ResolveError> {
    type_path(env, path, 0)
}

pub fn resolve_class_type_path(env: &Env, path: &Path) -> Result<ResolvedPath, ResolveError> {
    class_type_path(env, path, 0)
}

pub(crate) fn module_path(env: &Env, path: &Path, depth: usize) -> Result<ResolvedPath, ResolveError> {
    let unresolved = match path {
        Path::Resolved(resolved) => return Ok(resolved.clone()),
        Path::Unresolved(u) => u,
    };
    match unresolved {
        UnresolvedPath::Root(name) => {
            if let Some((id, _)) = env.lookup_by_name(Namespace::Module, name) {
                return Ok(ResolvedPath::Identifier(id));
            }
            match env.lookup_unit(name) {
                UnitLookup::Found(root) => Ok(ResolvedPath::Identifier(root)),
                UnitLookup::NotFound | UnitLookup::ForwardReference => Err(not_found(PathKind::Module, name)),
            }
        }
        UnresolvedPath::Dot(parent, name) => {
            let parent = module_path(env, parent, depth)?;
            let sig = signature_of_module(env, &parent, depth)?;
            match find_in_signature(&sig, Namespace::Module, name) {
                Some(_) => Ok(parent.child(IdentKind::Module, name.clone())),
                None => Err(not_found(PathKind::Module, path)),
            }
        }
        UnresolvedPath::Apply(func, arg) => {
            let functor = module_path(env, func, depth)?;
            let argument = module_path(env, arg, depth)?;
            match module_expansion(env, &functor, depth)? {
                Expansion::Functor(..) => {
                    Ok(ResolvedPath::Apply { functor: Box::new(functor), argument: Box::new(argument) })
                }
                Expansion::Signature(_) => {
                    Err(ResolveError::ApplicationOfNonFunctor { path: functor.to_string() })
                }
            }
        }
    }
}

/// Resolves the `Dot` projection of a non-module path: the parent must be a
/// module whose signature binds `name` in `ns`.
fn member_path(
    env: &Env,
    path: &Path,
    kind: PathKind,
    ns: Namespace,
    depth: usize,
) -> Result<ResolvedPath, ResolveError> {
    match path {
        Path::Resolved(resolved) => Ok(resolved.clone()),
        Path::Unresolved(UnresolvedPath::Dot(parent, name)) => {
            let parent = module_path(env, parent, depth)?;
            let sig = signature_of_module(env, &parent, depth)?;
            let item = find_in_signature(&sig, ns, name).ok_or_else(|| not_found(kind, path))?;
            Ok(parent.child(member_kind(item), name.clone()))
        }
        Path::Unresolved(_) => Err(not_found(kind, path)),
    }
}

pub(crate) fn module_type_path(env: &Env, path: &Path, depth: usize) -> Result<ResolvedPath, ResolveError> {
    if let Path::Unresolved(UnresolvedPath::Root(name)) = path {
        return env
            .lookup_by_name(Namespace::ModuleType, name)
            .map(|(id, _)| ResolvedPath::Identifier(id))
            .ok_or_else(|| not_found(PathKind::ModuleType, name));
    }
    member_path(env, path, PathKind::ModuleType, Namespace::ModuleType, depth)
}

pub(crate) fn type_path(env: &Env, path: &Path, depth: usize) -> Result<ResolvedPath, ResolveError> {
    if let Path::Unresolved(UnresolvedPath::Root(name)) = path {
        if let Some((id, _)) = env.lookup_by_name(Namespace::Type, name) {
            return Ok(ResolvedPath::Identifier(id));
        }
        if CORE_TYPES.contains(&name.as_str()) {
            return Ok(ResolvedPath::Identifier(Identifier::core_type(name.clone())));
        }
        return Err(not_found(PathKind::Type, name));
    }
    member_path(env, path, PathKind::Type, Namespace::Type, depth)
}

pub(crate) fn class_type_path(env: &Env, path: &Path, depth: usize) -> Result<ResolvedPath, ResolveError> {
    if let Path::Unresolved(UnresolvedPath::Root(name)) = path {
        return env
            .lookup_by_name(Namespace::ClassType, name)
            .map(|(id, _)| ResolvedPath::Identifier(id))
            .ok_or_else(|| not_found(PathKind::ClassType, name));
    }
    member_path(env, path, PathKind::ClassType, Namespace::ClassType, depth)
}

/// The expansion of the module denoted by `path`.
pub fn expansion_of_module_path(env: &Env, path: &ResolvedPath) -> Result<Expansion, ResolveError> {
    module_expansion(env, path, 0)
}

pub(crate) fn module_expansion(env: &Env, path: &ResolvedPath, depth: usize) -> Result<Expansion, ResolveError> {
    let depth = deeper(env, depth)?;
    match path {
        ResolvedPath::Identifier(id) => identifier_expansion(env, id, depth),
        ResolvedPath::Apply { functor, argument } => match module_expansion(env, functor, depth)? {
            Expansion::Functor(param, body) => {
                let (env, from) = match &param {
                    FunctorParameter::Named(arg) => (env.add_functor_parameter(arg), Some(arg.id.clone())),
                    FunctorParameter::Unit => (env.clone(), None),
                };
                let result = expand::module_type_expr(&env, &body, depth)?;
                Ok(match from {
                    Some(from) => result.reroot(&from, argument),
                    None => result,
                })
            }
            Expansion::Signature(_) => Err(ResolveError::ApplicationOfNonFunctor { path: functor.to_string() }),
        },
        ResolvedPath::Dot { parent, name, .. } => {
            let sig = signature_of_module(env, parent, depth)?;
            member_module_expansion(env, &sig, name, depth)
        }
    }
}

/// The signature of the module denoted by `path`, which must not be a
/// functor.
pub(crate) fn signature_of_module(env: &Env, path: &ResolvedPath, depth: usize) -> Result<Signature, ResolveError> {
    expand::assert_not_functor(module_expansion(env, path, depth)?)
}

/// The signature of a component, for the components that have one.
pub fn signature_of(env: &Env, component: &Component) -> Result<Signature, ResolveError> {
    let expansion = match component {
        Component::Module(m) => module_decl_expansion(env, &m.decl, 0)?,
        Component::ModuleType(mt) => module_type_decl_expansion(env, mt, 0)?,
        Component::Parameter(arg) => expand::module_type_expr(env, &arg.expr, 0)?,
        Component::Unit(unit) => unit_expansion(unit),
        _ => return Err(ResolveError::NotAModule { path: String::new() }),
    };
    expand::assert_not_functor(expansion)
}

fn identifier_expansion(env: &Env, id: &Identifier, depth: usize) -> Result<Expansion, ResolveError> {
    match env.lookup_by_id(id) {
        Some(Component::Module(m)) => return module_decl_expansion(env, &m.decl, depth),
        Some(Component::Parameter(arg)) => return expand::module_type_expr(env, &arg.expr, depth),
        Some(Component::Unit(unit)) => return Ok(unit_expansion(&unit)),
        _ => {}
    }
    match id.kind() {
        IdentKind::Root => {
            let unit = env.unit(id)?;
            Ok(unit_expansion(&unit))
        }
        IdentKind::Module => {
            let parent = id.parent().ok_or_else(|| not_found(PathKind::Module, id))?;
            let sig = expand::assert_not_functor(container_expansion(env, parent, depth)?)?;
            member_module_expansion(env, &sig, id.name(), depth)
        }
        IdentKind::Parameter => {
            let functor = id.parent().ok_or_else(|| not_found(PathKind::Module, id))?;
            match container_expansion(env, functor, depth)? {
                Expansion::Functor(FunctorParameter::Named(arg), _) if &arg.id == id => {
                    expand::module_type_expr(env, &arg.expr, depth)
                }
                _ => Err(not_found(PathKind::Module, id)),
            }
        }
        _ => Err(ResolveError::NotAModule { path: id.to_string() }),
    }
}

/// The expansion of whatever declares the children of `id`: a unit, a
/// module, a parameter, a module type, or a functor result.
fn container_expansion(env: &Env, id: &Identifier, depth: usize) -> Result<Expansion, ResolveError> {
    let depth = deeper(env, depth)?;
    match id.kind() {
        IdentKind::Root | IdentKind::Module | IdentKind::Parameter => {
            module_expansion(env, &ResolvedPath::Identifier(id.clone()), depth)
        }
        IdentKind::ModuleType => module_type_expansion_at(env, &ResolvedPath::Identifier(id.clone()), depth),
        IdentKind::Result => {
            let functor = id.parent().ok_or_else(|| ResolveError::NotAModule { path: id.to_string() })?;
            match container_expansion(env, functor, depth)? {
                Expansion::Functor(param, body) => {
                    let env = match &param {
                        FunctorParameter::Named(arg) => env.add_functor_parameter(arg),
                        FunctorParameter::Unit => env.clone(),
                    };
                    expand::module_type_expr(&env, &body, depth)
                }
                Expansion::Signature(_) => Err(ResolveError::NotAModule { path: id.to_string() }),
            }
        }
        _ => Err(ResolveError::NotAModule { path: id.to_string() }),
    }
}

fn member_module_expansion(env: &Env, sig: &Signature, name: &str, depth: usize) -> Result<Expansion, ResolveError> {
    match find_in_signature(sig, Namespace::Module, name) {
        Some(Item::Module(m)) => module_decl_expansion(&env.open_signature(sig), &m.decl, depth),
        _ => Err(not_found(PathKind::Module, name)),
    }
}

pub(crate) fn module_decl_expansion(env: &Env, decl: &ModuleDecl, depth: usize) -> Result<Expansion, ResolveError> {
    match decl {
        ModuleDecl::Alias(_, Some(expansion)) => Ok(expansion.clone().into()),
        ModuleDecl::Alias(path, None) => {
            let depth = deeper(env, depth)?;
            let target = module_path(env, path, depth)?;
            module_expansion(env, &target, depth)
        }
        ModuleDecl::ModuleType(expr) => expand::module_type_expr(env, expr, depth),
    }
}

fn unit_expansion(unit: &Unit) -> Expansion {
    match &unit.content {
        UnitContent::Module(sig) => Expansion::Signature(sig.clone()),
        UnitContent::Pack(packed) => Expansion::Signature(Signature::new(
            packed
                .iter()
                .map(|p| Item::Module(Module::new(p.id.clone(), ModuleDecl::Alias(p.path.clone(), None))))
                .collect(),
        )),
    }
}

/// The expansion of the module type denoted by `path`.
pub fn module_type_expansion(env: &Env, path: &ResolvedPath) -> Result<Expansion, ResolveError> {
    module_type_expansion_at(env, path, 0)
}

pub(crate) fn module_type_expansion_at(env: &Env, path: &ResolvedPath, depth: usize) -> Result<Expansion, ResolveError> {
    let depth = deeper(env, depth)?;
    let (module_type, scope) = lookup_module_type(env, path, depth)?;
    module_type_decl_expansion(&scope, &module_type, depth)
}

fn module_type_decl_expansion(env: &Env, module_type: &ModuleType, depth: usize) -> Result<Expansion, ResolveError> {
    match &module_type.expr {
        Some(expr) => expand::module_type_expr(env, expr, depth),
        None => Err(ResolveError::OpaqueModuleType { path: module_type.id.to_string() }),
    }
}

/// Finds the declaration of a module type, together with the environment
/// its expression is to be read in.
pub(crate) fn lookup_module_type(
    env: &Env,
    path: &ResolvedPath,
    depth: usize,
) -> Result<(Arc<ModuleType>, Env), ResolveError> {
    let (sig, name) = match path {
        ResolvedPath::Identifier(id) => {
            if let Some(Component::ModuleType(mt)) = env.lookup_by_id(id) {
                return Ok((mt, env.clone()));
            }
            let parent = id.parent().ok_or_else(|| not_found(PathKind::ModuleType, id))?;
            (expand::assert_not_functor(container_expansion(env, parent, depth)?)?, id.name())
        }
        ResolvedPath::Dot { parent, name, .. } => (signature_of_module(env, parent, depth)?, name.as_str()),
        ResolvedPath::Apply { .. } => return Err(not_found(PathKind::ModuleType, path)),
    };
    match find_in_signature(&sig, Namespace::ModuleType, name) {
        Some(Item::ModuleType(mt)) => Ok((Arc::new(mt.clone()), env.open_signature(&sig))),
        _ => Err(not_found(PathKind::ModuleType, path)),
    }
}

pub fn resolve_module_fragment(env: &Env, fragment: &Fragment) -> Result<Option<ResolvedFragment>, FetchError> {
    Ok(resolve_fragment(env, fragment, Namespace::Module).recoverable()?.ok())
}

pub fn resolve_type_fragment(env: &Env, fragment: &Fragment) -> Result<Option<ResolvedFragment>, FetchError> {
    Ok(resolve_fragment(env, fragment, Namespace::Type).recoverable()?.ok())
}

/// Walks `fragment` down from the environment's fragment root.
fn resolve_fragment(env: &Env, fragment: &Fragment, ns: Namespace) -> Result<ResolvedFragment, ResolveError> {
    if let Fragment::Resolved(resolved) = fragment {
        return Ok(resolved.clone());
    }
    let unresolved = || ResolveError::UnresolvedFragment { fragment: fragment.to_string() };
    let root = env.fragment_root().ok_or_else(unresolved)?;
    let segments = fragment.segments();
    let (last, prefix) = segments.split_last().ok_or_else(unresolved)?;

    let mut sig: Signature = (*root).clone();
    let mut scope = env.clone();
    let mut resolved = ResolvedFragment::Root;
    for name in prefix {
        let decl = match find_in_signature(&sig, Namespace::Module, name) {
            Some(Item::Module(m)) => m.decl.clone(),
            _ => return Err(unresolved()),
        };
        scope = scope.open_signature(&sig);
        sig = expand::assert_not_functor(module_decl_expansion(&scope, &decl, 0)?)?;
        resolved = ResolvedFragment::Module(Box::new(resolved), name.clone());
    }
    match (ns, find_in_signature(&sig, ns, last)) {
        (Namespace::Module, Some(Item::Module(_))) => Ok(ResolvedFragment::Module(Box::new(resolved), last.clone())),
        (Namespace::Type, Some(Item::Type(_))) => Ok(ResolvedFragment::Type(Box::new(resolved), last.clone())),
        _ => Err(unresolved()),
    }
}

/// The class signature of a class or class type, following class type
/// abbreviations. `None` when it cannot be computed.
pub fn class_signature_of(env: &Env, component: &Component) -> Result<Option<ClassSignature>, FetchError> {
    let signature = match component {
        Component::Class(c) => class_decl_signature(env, &c.decl, 0),
        Component::ClassType(ct) => class_type_expr_signature(env, &ct.expr, 0),
        _ => return Ok(None),
    };
    Ok(signature.recoverable()?.ok())
}

fn class_decl_signature(env: &Env, decl: &ClassDecl, depth: usize) -> Result<ClassSignature, ResolveError> {
    match decl {
        ClassDecl::ClassType(expr) => class_type_expr_signature(env, expr, depth),
        ClassDecl::Arrow(_, _, body) => class_decl_signature(env, body, depth),
    }
}

fn class_type_expr_signature(env: &Env, expr: &ClassTypeExpr, depth: usize) -> Result<ClassSignature, ResolveError> {
    match expr {
        ClassTypeExpr::Signature(sig) => Ok(sig.clone()),
        ClassTypeExpr::Constr(path, _) => {
            let depth = deeper(env, depth)?;
            let target = class_type_path(env, path, depth)?;
            match lookup_class_type(env, &target, depth)? {
                Component::Class(c) => match &c.expansion {
                    Some(sig) => Ok(sig.clone()),
                    None => class_decl_signature(env, &c.decl, depth),
                },
                Component::ClassType(ct) => match &ct.expansion {
                    Some(sig) => Ok(sig.clone()),
                    None => class_type_expr_signature(env, &ct.expr, depth),
                },
                _ => Err(not_found(PathKind::ClassType, &target)),
            }
        }
    }
}

fn lookup_class_type(env: &Env, path: &ResolvedPath, depth: usize) -> Result<Component, ResolveError> {
    let (sig, name) = match path {
        ResolvedPath::Identifier(id) => {
            if let Some(component @ (Component::Class(_) | Component::ClassType(_))) = env.lookup_by_id(id) {
                return Ok(component);
            }
            let parent = id.parent().ok_or_else(|| not_found(PathKind::ClassType, id))?;
            (expand::assert_not_functor(container_expansion(env, parent, depth)?)?, id.name())
        }
        ResolvedPath::Dot { parent, name, .. } => (signature_of_module(env, parent, depth)?, name.as_str()),
        ResolvedPath::Apply { .. } => return Err(not_found(PathKind::ClassType, path)),
    };
    find_in_signature(&sig, Namespace::ClassType, name)
        .and_then(Component::of_item)
        .ok_or_else(|| not_found(PathKind::ClassType, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigref_model::{ModuleTypeExpr, TypeDecl};

    fn sig_with_t(parent: &Identifier) -> Signature {
        Signature::new(vec![Item::Type(TypeDecl::abstract_(parent.type_("t")))])
    }

    #[test]
    fn core_types_resolve_without_bindings() {
        let path = resolve_type_path(&Env::empty(), &Path::root("int")).unwrap();
        assert_eq!(path, ResolvedPath::Identifier(Identifier::core_type("int")));
        assert!(resolve_type_path(&Env::empty(), &Path::root("nope")).is_err());
    }

    #[test]
    fn dotted_paths_follow_the_accessor_chain() {
        let a = Identifier::root("A");
        let m = Module::new(
            a.module("M"),
            ModuleDecl::ModuleType(ModuleTypeExpr::Signature(sig_with_t(&a.module("M")))),
        );
        let env = Env::empty().add_module(&m);
        let resolved = resolve_type_path(&env, &Path::dotted("M.t")).unwrap();
        assert_eq!(resolved, ResolvedPath::Identifier(a.module("M").type_("t")));
        let err = resolve_type_path(&env, &Path::dotted("M.u")).unwrap_err();
        assert_eq!(err, ResolveError::NotFound { kind: PathKind::Type, name: "M.u".into() });
    }

    #[test]
    fn cyclic_aliases_hit_the_depth_limit() {
        let a = Identifier::root("A");
        let x = Module::new(a.module("X"), ModuleDecl::Alias(Path::resolved(a.module("Y")), None));
        let y = Module::new(a.module("Y"), ModuleDecl::Alias(Path::resolved(a.module("X")), None));
        let env = Env::empty().add_module(&x).add_module(&y);
        let err = expansion_of_module_path(&env, &ResolvedPath::Identifier(a.module("X"))).unwrap_err();
        assert!(matches!(err, ResolveError::AliasDepthExceeded { limit: 64 }));
    }

    #[test]
    fn fragments_walk_into_submodules() {
        let s = Identifier::root("A").module_type("S");
        let root = Signature::new(vec![Item::Module(Module::new(
            s.module("M"),
            ModuleDecl::ModuleType(ModuleTypeExpr::Signature(sig_with_t(&s.module("M")))),
        ))]);
        let env = Env::empty().add_fragment_root(root);
        let frag = resolve_type_fragment(&env, &Fragment::dotted("M.t")).unwrap();
        assert_eq!(frag.map(|f| f.to_string()), Some("M.t".to_string()));
        assert_eq!(resolve_type_fragment(&env, &Fragment::dotted("M.u")).unwrap(), None);
        assert_eq!(resolve_module_fragment(&env, &Fragment::dotted("M.t")).unwrap(), None);
    }
}
