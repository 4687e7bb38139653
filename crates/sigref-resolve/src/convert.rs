//! Whole-tree rewrites used when a signature is moved to another place.
//!
//! The expansion service builds signatures whose identifiers and paths are
//! relative to where they were declared: a module type body, a functor
//! parameter, a module being substituted away. Before such a signature can
//! be spliced somewhere else it is rewritten with one of the [`Rewriter`]s
//! below. The traversal itself lives in [`walk`] and visits every
//! identifier, path and type expression of every node of the model.

use fxhash::FxHashMap;
use sigref_model::{
    FunctorParameter, Identifier, ModuleTypeExpr, Path, ResolvedPath, Shadowed, Signature,
    TypeExpr, UnresolvedPath,
};

/// Hooks called by [`walk`] on the leaves of the tree.
///
/// Every hook returns `None` to keep the node (and, for `type_expr`, to
/// keep descending into it).
pub trait Rewriter {
    /// Called on every identifier: declaration sites and path components.
    fn identifier(&mut self, _id: &Identifier) -> Option<Identifier> {
        None
    }

    /// Replaces a whole resolved path. When it returns `Some`, the
    /// identifiers inside the old path are not visited.
    fn resolved_path(&mut self, _path: &ResolvedPath) -> Option<ResolvedPath> {
        None
    }

    /// Replaces a type expression without descending into it.
    fn type_expr(&mut self, _ty: &TypeExpr) -> Option<TypeExpr> {
        None
    }

    fn unresolved_path(&mut self, _path: &UnresolvedPath) {}
}

pub mod walk {
    use sigref_model::*;

    use super::Rewriter;

    pub fn identifier(rw: &mut dyn Rewriter, id: &mut Identifier) {
        if let Some(new) = rw.identifier(id) {
            *id = new;
        }
    }

    pub fn resolved_path(rw: &mut dyn Rewriter, p: &mut ResolvedPath) {
        if let Some(new) = rw.resolved_path(p) {
            *p = new;
            return;
        }
        p.map_identifiers(&mut |id| rw.identifier(id));
    }

    pub fn path(rw: &mut dyn Rewriter, p: &mut Path) {
        match p {
            Path::Resolved(r) => resolved_path(rw, r),
            Path::Unresolved(u) => {
                rw.unresolved_path(u);
                match u {
                    UnresolvedPath::Root(_) => {}
                    UnresolvedPath::Dot(parent, _) => path(rw, parent),
                    UnresolvedPath::Apply(func, arg) => {
                        path(rw, func);
                        path(rw, arg);
                    }
                }
            }
        }
    }

    pub fn signature(rw: &mut dyn Rewriter, sig: &mut Signature) {
        for it in &mut sig.items {
            item(rw, it);
        }
    }

    pub fn item(rw: &mut dyn Rewriter, item: &mut Item) {
        match item {
            Item::Module(m) => {
                identifier(rw, &mut m.id);
                module_decl(rw, &mut m.decl);
            }
            Item::ModuleSubstitution(m) => {
                identifier(rw, &mut m.id);
                path(rw, &mut m.manifest);
            }
            Item::ModuleType(mt) => {
                identifier(rw, &mut mt.id);
                if let Some(expr) = &mut mt.expr {
                    module_type_expr(rw, expr);
                }
            }
            Item::Type(t) | Item::TypeSubstitution(t) => type_decl(rw, t),
            Item::Value(v) => {
                identifier(rw, &mut v.id);
                type_expr(rw, &mut v.type_);
            }
            Item::External(e) => {
                identifier(rw, &mut e.id);
                type_expr(rw, &mut e.type_);
            }
            Item::Class(c) => class(rw, c),
            Item::ClassType(c) => class_type(rw, c),
            Item::TypeExtension(ext) => {
                path(rw, &mut ext.type_path);
                for c in &mut ext.constructors {
                    identifier(rw, &mut c.id);
                    constructor_args(rw, &mut c.args);
                    if let Some(res) = &mut c.res {
                        type_expr(rw, res);
                    }
                }
            }
            Item::Exception(e) => {
                identifier(rw, &mut e.id);
                constructor_args(rw, &mut e.args);
                if let Some(res) = &mut e.res {
                    type_expr(rw, res);
                }
            }
            Item::Include(i) => {
                identifier(rw, &mut i.parent);
                match &mut i.decl {
                    IncludeDecl::Alias(p) => path(rw, p),
                    IncludeDecl::ModuleType(u) => u_module_type_expr(rw, u),
                }
                if let Some(p) = &mut i.strengthened {
                    path(rw, p);
                }
                signature(rw, &mut i.expansion.content);
            }
            Item::Open(o) => signature(rw, &mut o.expansion),
            Item::Comment(_) => {}
        }
    }

    pub fn module_decl(rw: &mut dyn Rewriter, decl: &mut ModuleDecl) {
        match decl {
            ModuleDecl::Alias(p, expansion) => {
                path(rw, p);
                if let Some(e) = expansion {
                    simple_expansion(rw, e);
                }
            }
            ModuleDecl::ModuleType(expr) => module_type_expr(rw, expr),
        }
    }

    pub fn simple_expansion(rw: &mut dyn Rewriter, e: &mut SimpleExpansion) {
        match e {
            SimpleExpansion::Signature(sig) => signature(rw, sig),
            SimpleExpansion::Functor(param, body) => {
                functor_parameter(rw, param);
                simple_expansion(rw, body);
            }
        }
    }

    pub fn functor_parameter(rw: &mut dyn Rewriter, param: &mut FunctorParameter) {
        if let FunctorParameter::Named(arg) = param {
            identifier(rw, &mut arg.id);
            module_type_expr(rw, &mut arg.expr);
        }
    }

    pub fn module_type_expr(rw: &mut dyn Rewriter, expr: &mut ModuleTypeExpr) {
        let expansion = match expr {
            ModuleTypeExpr::Path { path: p, expansion } => {
                path(rw, p);
                expansion
            }
            ModuleTypeExpr::Signature(sig) => return signature(rw, sig),
            ModuleTypeExpr::Functor(param, body) => {
                functor_parameter(rw, param);
                return module_type_expr(rw, body);
            }
            ModuleTypeExpr::With { substitutions, base, expansion } => {
                for s in substitutions {
                    substitution(rw, s);
                }
                u_module_type_expr(rw, base);
                expansion
            }
            ModuleTypeExpr::TypeOf { origin, expansion } => {
                type_of_origin(rw, origin);
                expansion
            }
        };
        if let Some(e) = expansion {
            simple_expansion(rw, e);
        }
    }

    pub fn u_module_type_expr(rw: &mut dyn Rewriter, expr: &mut UModuleTypeExpr) {
        match expr {
            UModuleTypeExpr::Path(p) => path(rw, p),
            UModuleTypeExpr::Signature(sig) => signature(rw, sig),
            UModuleTypeExpr::With(subs, base) => {
                for s in subs {
                    substitution(rw, s);
                }
                u_module_type_expr(rw, base);
            }
            UModuleTypeExpr::TypeOf(origin) => type_of_origin(rw, origin),
        }
    }

    fn type_of_origin(rw: &mut dyn Rewriter, origin: &mut TypeOfOrigin) {
        match origin {
            TypeOfOrigin::ModuleType(p) | TypeOfOrigin::StructInclude(p) => path(rw, p),
        }
    }

    pub fn substitution(rw: &mut dyn Rewriter, s: &mut Substitution) {
        match s {
            Substitution::ModuleEq(_, decl) => module_decl(rw, decl),
            Substitution::ModuleSubst(_, p) => path(rw, p),
            Substitution::TypeEq(_, eq) | Substitution::TypeSubst(_, eq) => type_equation(rw, eq),
        }
    }

    pub fn type_decl(rw: &mut dyn Rewriter, t: &mut TypeDecl) {
        identifier(rw, &mut t.id);
        type_equation(rw, &mut t.equation);
        match &mut t.representation {
            Some(TypeRepr::Variant(constructors)) => {
                for c in constructors {
                    identifier(rw, &mut c.id);
                    constructor_args(rw, &mut c.args);
                    if let Some(res) = &mut c.res {
                        type_expr(rw, res);
                    }
                }
            }
            Some(TypeRepr::Record(fields)) => {
                for f in fields {
                    field(rw, f);
                }
            }
            Some(TypeRepr::Extensible) | None => {}
        }
    }

    pub fn type_equation(rw: &mut dyn Rewriter, eq: &mut TypeEquation) {
        if let Some(manifest) = &mut eq.manifest {
            type_expr(rw, manifest);
        }
        for (lhs, rhs) in &mut eq.constraints {
            type_expr(rw, lhs);
            type_expr(rw, rhs);
        }
    }

    fn constructor_args(rw: &mut dyn Rewriter, args: &mut ConstructorArgs) {
        match args {
            ConstructorArgs::Tuple(types) => {
                for t in types {
                    type_expr(rw, t);
                }
            }
            ConstructorArgs::Record(fields) => {
                for f in fields {
                    field(rw, f);
                }
            }
        }
    }

    fn field(rw: &mut dyn Rewriter, f: &mut Field) {
        identifier(rw, &mut f.id);
        type_expr(rw, &mut f.type_);
    }

    pub fn type_expr(rw: &mut dyn Rewriter, ty: &mut TypeExpr) {
        if let Some(new) = rw.type_expr(ty) {
            *ty = new;
            return;
        }
        match ty {
            TypeExpr::Var(_) | TypeExpr::Any => {}
            TypeExpr::Arrow { arg, ret, .. } => {
                type_expr(rw, arg);
                type_expr(rw, ret);
            }
            TypeExpr::Tuple(types) => {
                for t in types {
                    type_expr(rw, t);
                }
            }
            TypeExpr::Constr(p, args) | TypeExpr::Class(p, args) => {
                path(rw, p);
                for t in args {
                    type_expr(rw, t);
                }
            }
            TypeExpr::Variant(v) => {
                for element in &mut v.elements {
                    match element {
                        PolyVariantElement::Type(t) => type_expr(rw, t),
                        PolyVariantElement::Constructor { arguments, .. } => {
                            for t in arguments {
                                type_expr(rw, t);
                            }
                        }
                    }
                }
            }
            TypeExpr::Object(o) => {
                for f in &mut o.fields {
                    match f {
                        ObjectField::Method { type_, .. } => type_expr(rw, type_),
                        ObjectField::Inherit(t) => type_expr(rw, t),
                    }
                }
            }
            TypeExpr::Poly(_, body) => type_expr(rw, body),
            TypeExpr::Package(pkg) => {
                path(rw, &mut pkg.path);
                for (_, t) in &mut pkg.substitutions {
                    type_expr(rw, t);
                }
            }
        }
    }

    pub fn class(rw: &mut dyn Rewriter, c: &mut Class) {
        identifier(rw, &mut c.id);
        class_decl(rw, &mut c.decl);
        if let Some(sig) = &mut c.expansion {
            class_signature(rw, sig);
        }
    }

    fn class_decl(rw: &mut dyn Rewriter, decl: &mut ClassDecl) {
        match decl {
            ClassDecl::ClassType(expr) => class_type_expr(rw, expr),
            ClassDecl::Arrow(_, arg, body) => {
                type_expr(rw, arg);
                class_decl(rw, body);
            }
        }
    }

    pub fn class_type(rw: &mut dyn Rewriter, c: &mut ClassType) {
        identifier(rw, &mut c.id);
        class_type_expr(rw, &mut c.expr);
        if let Some(sig) = &mut c.expansion {
            class_signature(rw, sig);
        }
    }

    fn class_type_expr(rw: &mut dyn Rewriter, expr: &mut ClassTypeExpr) {
        match expr {
            ClassTypeExpr::Constr(p, args) => {
                path(rw, p);
                for t in args {
                    type_expr(rw, t);
                }
            }
            ClassTypeExpr::Signature(sig) => class_signature(rw, sig),
        }
    }

    pub fn class_signature(rw: &mut dyn Rewriter, sig: &mut ClassSignature) {
        if let Some(t) = &mut sig.self_ {
            type_expr(rw, t);
        }
        for it in &mut sig.items {
            match it {
                ClassSignatureItem::Method(m) => {
                    identifier(rw, &mut m.id);
                    type_expr(rw, &mut m.type_);
                }
                ClassSignatureItem::InstanceVariable(v) => {
                    identifier(rw, &mut v.id);
                    type_expr(rw, &mut v.type_);
                }
                ClassSignatureItem::Constraint(lhs, rhs) => {
                    type_expr(rw, lhs);
                    type_expr(rw, rhs);
                }
                ClassSignatureItem::Inherit(expr) => class_type_expr(rw, expr),
                ClassSignatureItem::Comment(_) => {}
            }
        }
    }
}

/// Moves declarations bound below `old` to below `new`, renaming the
/// shadowed ones to hidden names on the way.
struct Reparent<'a> {
    old: &'a Identifier,
    new: &'a Identifier,
    shadowed: &'a Shadowed,
}

impl Reparent<'_> {
    fn map(&self, id: &Identifier) -> Option<Identifier> {
        if id == self.old {
            return Some(self.new.clone());
        }
        let parent = id.parent()?;
        if parent == self.old {
            let name = self.shadowed.hidden_name(id).unwrap_or_else(|| id.name().to_string());
            return Some(self.new.child(id.kind(), name));
        }
        Some(self.map(parent)?.child(id.kind(), id.name()))
    }
}

impl Rewriter for Reparent<'_> {
    fn identifier(&mut self, id: &Identifier) -> Option<Identifier> {
        self.map(id)
    }
}

/// Rebinds the declarations of `sig` as members of `new_parent`.
///
/// The old parent is the one shared by the signature's declarations.
/// References into the signature follow the move; references elsewhere are
/// left alone.
pub fn reparent_signature(sig: &Signature, new_parent: &Identifier, shadowed: &Shadowed) -> Signature {
    let Some(old) = sig.parent() else {
        return sig.clone();
    };
    if &old == new_parent && shadowed.is_empty() {
        return sig.clone();
    }
    let mut out = sig.clone();
    walk::signature(&mut Reparent { old: &old, new: new_parent, shadowed }, &mut out);
    out
}

struct Reroot<'a> {
    from: &'a Identifier,
    to: &'a ResolvedPath,
}

impl Rewriter for Reroot<'_> {
    fn resolved_path(&mut self, path: &ResolvedPath) -> Option<ResolvedPath> {
        path.reroot(self.from, self.to)
    }
}

/// Makes every resolved path that goes through `from` go through `to`.
///
/// Used for functor application (`from` is the parameter) and for `module M
/// := P` (`from` is `M`).
pub fn reroot_signature(sig: &Signature, from: &Identifier, to: &ResolvedPath) -> Signature {
    let mut out = sig.clone();
    walk::signature(&mut Reroot { from, to }, &mut out);
    out
}

/// [`reroot_signature`] for a functor that is not expanded yet.
pub fn reroot_functor(
    param: &FunctorParameter,
    body: &ModuleTypeExpr,
    from: &Identifier,
    to: &ResolvedPath,
) -> (FunctorParameter, ModuleTypeExpr) {
    let mut rw = Reroot { from, to };
    let (mut param, mut body) = (param.clone(), body.clone());
    walk::functor_parameter(&mut rw, &mut param);
    walk::module_type_expr(&mut rw, &mut body);
    (param, body)
}

struct TypeSubst<'a> {
    target: &'a Identifier,
    params: &'a [String],
    manifest: &'a TypeExpr,
}

impl Rewriter for TypeSubst<'_> {
    fn type_expr(&mut self, ty: &TypeExpr) -> Option<TypeExpr> {
        let TypeExpr::Constr(Path::Resolved(ResolvedPath::Identifier(id)), args) = ty else {
            return None;
        };
        if id != self.target {
            return None;
        }
        let mut args = args.clone();
        for arg in &mut args {
            walk::type_expr(self, arg);
        }
        Some(instantiate(self.manifest, self.params, &args))
    }
}

/// Replaces every application of the type `target` by `manifest`, with
/// `params` instantiated to the arguments of each application.
pub fn substitute_type(sig: &Signature, target: &Identifier, params: &[String], manifest: &TypeExpr) -> Signature {
    let mut out = sig.clone();
    walk::signature(&mut TypeSubst { target, params, manifest }, &mut out);
    out
}

struct Instantiate {
    vars: FxHashMap<String, TypeExpr>,
}

impl Rewriter for Instantiate {
    fn type_expr(&mut self, ty: &TypeExpr) -> Option<TypeExpr> {
        match ty {
            TypeExpr::Var(name) => self.vars.get(name).cloned(),
            _ => None,
        }
    }
}

/// `manifest` with each of `params` replaced by the matching argument.
/// Missing arguments leave their variable in place.
pub fn instantiate(manifest: &TypeExpr, params: &[String], args: &[TypeExpr]) -> TypeExpr {
    let vars = params.iter().cloned().zip(args.iter().cloned()).collect();
    let mut out = manifest.clone();
    walk::type_expr(&mut Instantiate { vars }, &mut out);
    out
}

#[derive(Default)]
struct CountUnresolved(usize);

impl Rewriter for CountUnresolved {
    fn unresolved_path(&mut self, _path: &UnresolvedPath) {
        self.0 += 1;
    }
}

/// Number of unresolved paths left anywhere in `sig`. Nested unresolved
/// prefixes of one path are counted separately.
pub fn count_unresolved(sig: &Signature) -> usize {
    let mut counter = CountUnresolved::default();
    // The walk only mutates through hooks, and this one never replaces.
    let mut copy = sig.clone();
    walk::signature(&mut counter, &mut copy);
    counter.0
}
