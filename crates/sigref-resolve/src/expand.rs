//! The expansion service: computes the flat signature implied by a
//! module-type expression, an alias, or a `with` constraint.

use sigref_model::{
    Fragment, FunctorParameter, Identifier, Item, Module, ModuleDecl, ModuleTypeExpr, Path,
    ResolvedPath, Signature, SimpleExpansion, Substitution, TypeDecl, TypeOfOrigin,
    UModuleTypeExpr,
};

use crate::convert;
use crate::env::Env;
use crate::error::ResolveError;
use crate::lookup;
use crate::strengthen::strengthen;

/// What a module or module type flattens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    Signature(Signature),
    /// A functor, with its body left unexpanded until it is applied.
    Functor(FunctorParameter, Box<ModuleTypeExpr>),
}

impl From<SimpleExpansion> for Expansion {
    fn from(expansion: SimpleExpansion) -> Self {
        match expansion {
            SimpleExpansion::Signature(sig) => Expansion::Signature(sig),
            SimpleExpansion::Functor(param, body) => {
                Expansion::Functor(param, Box::new(ModuleTypeExpr::from(*body)))
            }
        }
    }
}

impl Expansion {
    /// Rewrites paths through the functor parameter `from` to go through
    /// `to`.
    pub(crate) fn reroot(self, from: &Identifier, to: &ResolvedPath) -> Expansion {
        match self {
            Expansion::Signature(sig) => Expansion::Signature(convert::reroot_signature(&sig, from, to)),
            Expansion::Functor(param, body) => {
                let (param, body) = convert::reroot_functor(&param, &body, from, to);
                Expansion::Functor(param, Box::new(body))
            }
        }
    }
}

pub fn assert_not_functor(expansion: Expansion) -> Result<Signature, ResolveError> {
    match expansion {
        Expansion::Signature(sig) => Ok(sig),
        Expansion::Functor(..) => Err(ResolveError::UnexpectedFunctor),
    }
}

pub fn expand_module_type_expr(env: &Env, expr: &ModuleTypeExpr) -> Result<Expansion, ResolveError> {
    module_type_expr(env, expr, 0)
}

pub(crate) fn module_type_expr(env: &Env, expr: &ModuleTypeExpr, depth: usize) -> Result<Expansion, ResolveError> {
    match expr {
        ModuleTypeExpr::Path { expansion: Some(e), .. }
        | ModuleTypeExpr::With { expansion: Some(e), .. }
        | ModuleTypeExpr::TypeOf { expansion: Some(e), .. } => Ok(e.clone().into()),
        ModuleTypeExpr::Path { path, .. } => {
            let target = lookup::module_type_path(env, path, depth)?;
            lookup::module_type_expansion_at(env, &target, depth)
        }
        ModuleTypeExpr::Signature(sig) => Ok(Expansion::Signature(sig.clone())),
        ModuleTypeExpr::Functor(param, body) => Ok(Expansion::Functor(param.clone(), body.clone())),
        ModuleTypeExpr::With { substitutions, base, .. } => {
            with_signature(env, substitutions, base, depth).map(Expansion::Signature)
        }
        ModuleTypeExpr::TypeOf { origin, .. } => type_of(env, origin, depth).map(Expansion::Signature),
    }
}

/// The signature of a module-type expression that cannot be a functor.
pub fn expand_u_module_type_expr(env: &Env, expr: &UModuleTypeExpr) -> Result<Signature, ResolveError> {
    u_module_type_expr(env, expr, 0)
}

fn u_module_type_expr(env: &Env, expr: &UModuleTypeExpr, depth: usize) -> Result<Signature, ResolveError> {
    match expr {
        UModuleTypeExpr::Path(path) => {
            let target = lookup::module_type_path(env, path, depth)?;
            assert_not_functor(lookup::module_type_expansion_at(env, &target, depth)?)
        }
        UModuleTypeExpr::Signature(sig) => Ok(sig.clone()),
        UModuleTypeExpr::With(substitutions, base) => with_signature(env, substitutions, base, depth),
        UModuleTypeExpr::TypeOf(origin) => type_of(env, origin, depth),
    }
}

fn with_signature(
    env: &Env,
    substitutions: &[Substitution],
    base: &UModuleTypeExpr,
    depth: usize,
) -> Result<Signature, ResolveError> {
    let mut sig = u_module_type_expr(env, base, depth)?;
    for substitution in substitutions {
        let resolved = resolve_fragment_of(&env.add_fragment_root(sig.clone()), substitution)?;
        sig = apply_at(env, &resolved, &sig, depth)?;
    }
    Ok(sig)
}

fn resolve_fragment_of(env: &Env, substitution: &Substitution) -> Result<Substitution, ResolveError> {
    let fragment = substitution.fragment();
    let resolved = if substitution.targets_module() {
        lookup::resolve_module_fragment(env, fragment)?
    } else {
        lookup::resolve_type_fragment(env, fragment)?
    };
    let fragment = Fragment::Resolved(
        resolved.ok_or_else(|| ResolveError::UnresolvedFragment { fragment: fragment.to_string() })?,
    );
    Ok(match substitution {
        Substitution::ModuleEq(_, decl) => Substitution::ModuleEq(fragment, decl.clone()),
        Substitution::ModuleSubst(_, path) => Substitution::ModuleSubst(fragment, path.clone()),
        Substitution::TypeEq(_, eq) => Substitution::TypeEq(fragment, eq.clone()),
        Substitution::TypeSubst(_, eq) => Substitution::TypeSubst(fragment, eq.clone()),
    })
}

fn type_of(env: &Env, origin: &TypeOfOrigin, depth: usize) -> Result<Signature, ResolveError> {
    let target = lookup::module_path(env, origin.path(), depth)?;
    lookup::signature_of_module(env, &target, depth)
}

/// The expansion of the module `path` is an alias of. With `strengthen_result`,
/// abstract types of the result are made equal to their counterparts
/// through `path`.
pub fn expand_module_alias(env: &Env, path: &Path, strengthen_result: bool) -> Result<Expansion, ResolveError> {
    let target = lookup::module_path(env, path, 0)?;
    Ok(match lookup::module_expansion(env, &target, 0)? {
        Expansion::Signature(sig) if strengthen_result => Expansion::Signature(strengthen(&target, &sig)),
        other => other,
    })
}

/// Applies one `with` constraint, whose fragment must be resolved, to `sig`.
pub fn apply_substitution(env: &Env, substitution: &Substitution, sig: &Signature) -> Result<Signature, ResolveError> {
    apply_at(env, substitution, sig, 0)
}

fn apply_at(env: &Env, substitution: &Substitution, sig: &Signature, depth: usize) -> Result<Signature, ResolveError> {
    let Fragment::Resolved(fragment) = substitution.fragment() else {
        return Err(ResolveError::UnresolvedFragment { fragment: substitution.fragment().to_string() });
    };
    substitute_in(env, substitution, &fragment.segments(), sig, depth)
}

fn substitute_in(
    env: &Env,
    substitution: &Substitution,
    segments: &[String],
    sig: &Signature,
    depth: usize,
) -> Result<Signature, ResolveError> {
    let missing = || ResolveError::UnresolvedFragment { fragment: substitution.fragment().to_string() };
    let (first, rest) = segments.split_first().ok_or_else(missing)?;
    if rest.is_empty() {
        return substitute_member(env, substitution, first, sig, depth);
    }

    // `with M.N.t = ...`: rewrite the member inside `M` and turn `M` into
    // the explicit signature that results.
    let scope = env.open_signature(sig);
    let mut out = sig.clone();
    let module = find_module_mut(&mut out.items, first).ok_or_else(missing)?;
    let inner = assert_not_functor(lookup::module_decl_expansion(&scope, &module.decl, depth)?)?;
    let inner = substitute_in(&scope, substitution, rest, &inner, depth)?;
    module.decl = ModuleDecl::ModuleType(ModuleTypeExpr::Signature(inner));
    Ok(out)
}

fn substitute_member(
    env: &Env,
    substitution: &Substitution,
    name: &str,
    sig: &Signature,
    depth: usize,
) -> Result<Signature, ResolveError> {
    let missing = || ResolveError::UnresolvedFragment { fragment: substitution.fragment().to_string() };
    let mut out = sig.clone();
    match substitution {
        Substitution::ModuleEq(_, decl) => {
            find_module_mut(&mut out.items, name).ok_or_else(missing)?.decl = decl.clone();
            Ok(out)
        }
        Substitution::ModuleSubst(_, path) => {
            let target = lookup::module_path(env, path, depth)?;
            let removed = remove_item(&mut out.items, &|item: &Item| {
                matches!(item, Item::Module(m) if m.id.name() == name)
            })
            .ok_or_else(missing)?;
            match removed.identifier() {
                Some(id) => Ok(convert::reroot_signature(&out, id, &target)),
                None => Err(missing()),
            }
        }
        Substitution::TypeEq(_, eq) => {
            let decl = find_type_mut(&mut out.items, name).ok_or_else(missing)?;
            decl.equation.params = eq.params.clone();
            decl.equation.private = eq.private;
            decl.equation.manifest = eq.manifest.clone();
            decl.equation.constraints = eq.constraints.clone();
            Ok(out)
        }
        Substitution::TypeSubst(_, eq) => {
            let manifest = eq
                .manifest
                .as_ref()
                .ok_or_else(|| ResolveError::MissingManifest { fragment: substitution.fragment().to_string() })?;
            let removed = remove_item(&mut out.items, &|item: &Item| {
                matches!(item, Item::Type(t) if t.id.name() == name)
            })
            .ok_or_else(missing)?;
            match removed.identifier() {
                Some(id) => Ok(convert::substitute_type(&out, id, &eq.params, manifest)),
                None => Err(missing()),
            }
        }
    }
}

/// The last item matching `pick`, looking through include expansions.
fn find_mut<'a>(items: &'a mut [Item], pick: &dyn Fn(&Item) -> bool) -> Option<&'a mut Item> {
    for item in items.iter_mut().rev() {
        if pick(item) {
            return Some(item);
        }
        if let Item::Include(include) = item {
            if let Some(found) = find_mut(&mut include.expansion.content.items, pick) {
                return Some(found);
            }
        }
    }
    None
}

fn find_module_mut<'a>(items: &'a mut [Item], name: &str) -> Option<&'a mut Module> {
    match find_mut(items, &|item: &Item| matches!(item, Item::Module(m) if m.id.name() == name))? {
        Item::Module(m) => Some(m),
        _ => None,
    }
}

fn find_type_mut<'a>(items: &'a mut [Item], name: &str) -> Option<&'a mut TypeDecl> {
    match find_mut(items, &|item: &Item| matches!(item, Item::Type(t) if t.id.name() == name))? {
        Item::Type(t) => Some(t),
        _ => None,
    }
}

fn remove_item(items: &mut Vec<Item>, pick: &dyn Fn(&Item) -> bool) -> Option<Item> {
    if let Some(pos) = items.iter().rposition(|item| pick(item)) {
        return Some(items.remove(pos));
    }
    for item in items.iter_mut().rev() {
        if let Item::Include(include) = item {
            if let Some(removed) = remove_item(&mut include.expansion.content.items, pick) {
                return Some(removed);
            }
        }
    }
    None
}
