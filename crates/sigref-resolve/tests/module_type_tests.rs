use expect_test::expect;
use sigref_model::{
    Fragment, Item, ModuleDecl, ModuleTypeExpr, Path, ResolvedFragment, Signature, Substitution,
    TypeDecl, TypeEquation, TypeExpr, TypeOfOrigin, UModuleTypeExpr, Value,
};
use sigref_resolve::expand::{expand_module_type_expr, Expansion};
use sigref_resolve::{Compiler, Construct, Env};

use crate::common::{
    abstract_type, compile_items, core, init_logger, int, module_of_type, module_sig, module_type_expr,
    module_type_sig, named, root, value,
};

fn with(substitutions: Vec<Substitution>, base: UModuleTypeExpr) -> ModuleTypeExpr {
    ModuleTypeExpr::With { substitutions, base: Box::new(base), expansion: None }
}

fn type_eq(fragment: &str, manifest: TypeExpr) -> Substitution {
    Substitution::TypeEq(Fragment::dotted(fragment), TypeEquation::manifest(manifest))
}

fn type_subst(fragment: &str, manifest: TypeExpr) -> Substitution {
    Substitution::TypeSubst(Fragment::dotted(fragment), TypeEquation::manifest(manifest))
}

fn expr_of(item: &Item) -> &ModuleTypeExpr {
    match item {
        Item::ModuleType(mt) => mt.expr.as_ref().expect("module type has an expression"),
        _ => panic!("expected a module type"),
    }
}

/// `module type M = sig type t val x : t end with ...`
fn literal_with(substitutions: Vec<Substitution>) -> Item {
    let m = root().module_type("M");
    let base = Signature::new(vec![abstract_type(&m, "t"), value(&m, "x", named("t"))]);
    module_type_expr(&root(), "M", with(substitutions, UModuleTypeExpr::Signature(base)))
}

#[test]
fn test_fully_applied_literal_signature_is_normalised() {
    let m = root().module_type("M");
    let (out, diagnostics) =
        compile_items(vec![literal_with(vec![type_eq("t", int()), type_subst("t", named("string"))])]);
    assert!(diagnostics.is_empty());
    assert_eq!(
        expr_of(&out.items[0]),
        &ModuleTypeExpr::Signature(Signature {
            items: vec![Item::Value(Value::new(m.value("x"), core("string")))],
            compiled: true,
            doc: Vec::new(),
        })
    );
}

#[test]
fn test_substitutions_apply_left_to_right() {
    // Erasing `t` first leaves nothing for the equation to constrain.
    let (out, diagnostics) =
        compile_items(vec![literal_with(vec![type_subst("t", named("string")), type_eq("t", int())])]);

    let ModuleTypeExpr::With { substitutions, .. } = expr_of(&out.items[0]) else {
        panic!("expected the constraint to stay")
    };
    assert!(substitutions[0].fragment().is_resolved());
    assert!(!substitutions[1].fragment().is_resolved());
    let reports: Vec<_> = diagnostics.iter().map(ToString::to_string).collect();
    expect![[r#"
        [
            "resolve: type fragment `t` in M",
        ]
    "#]]
    .assert_debug_eq(&reports);
}

#[test]
fn test_unresolved_paths_prevent_normalisation() {
    let m = root().module_type("M");
    let base = Signature::new(vec![abstract_type(&m, "t"), value(&m, "x", named("Missing.t"))]);
    let item = module_type_expr(&root(), "M", with(vec![type_eq("t", int())], UModuleTypeExpr::Signature(base)));
    let (out, diagnostics) = compile_items(vec![item]);

    assert!(diagnostics.is_empty());
    assert!(matches!(expr_of(&out.items[0]), ModuleTypeExpr::With { .. }));
}

#[test]
fn test_unknown_base_is_reported_once_and_kept() {
    let item = module_type_expr(
        &root(),
        "M",
        with(vec![type_eq("t", int())], UModuleTypeExpr::Path(Path::root("Nope"))),
    );
    let (out, diagnostics) = compile_items(vec![item.clone()]);

    assert_eq!(out.items, vec![item]);
    let reports: Vec<_> = diagnostics.iter().map(ToString::to_string).collect();
    expect![[r#"
        [
            "resolve: module type `Nope` in M: module type `Nope` not found",
        ]
    "#]]
    .assert_debug_eq(&reports);
}

#[test]
fn test_unknown_fragment_is_reported_and_left_unresolved() {
    let a = root();
    let (out, diagnostics) = compile_items(vec![
        module_type_sig(&a, "S", |s| vec![abstract_type(s, "t")]),
        module_type_expr(&a, "M", with(vec![type_eq("u", int())], UModuleTypeExpr::Path(Path::root("S")))),
    ]);

    let ModuleTypeExpr::With { substitutions, base, .. } = expr_of(&out.items[1]) else {
        panic!("expected a constraint")
    };
    assert_eq!(substitutions[0], Substitution::TypeEq(Fragment::dotted("u"), TypeEquation::manifest(core("int"))));
    assert_eq!(**base, UModuleTypeExpr::Path(Path::resolved(a.module_type("S"))));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.iter().next().unwrap().construct, Construct::TypeFragment);
}

#[test]
fn test_nested_fragments_rewrite_the_inner_module() {
    init_logger();
    let a = root();
    let items = vec![
        module_type_sig(&a, "S", |s| vec![module_sig(s, "N", |n| vec![abstract_type(n, "t")])]),
        module_type_expr(&a, "M", with(vec![type_eq("N.t", int())], UModuleTypeExpr::Path(Path::root("S")))),
    ];
    let mut compiler = Compiler::new();
    let (out, env) = compiler.items(&Env::empty(), &items).unwrap();
    assert!(compiler.diagnostics().is_empty());

    let expr = expr_of(&out[1]);
    let ModuleTypeExpr::With { substitutions, .. } = expr else { panic!("expected a constraint") };
    let expected = ResolvedFragment::Type(
        Box::new(ResolvedFragment::Module(Box::new(ResolvedFragment::Root), "N".to_string())),
        "t".to_string(),
    );
    assert_eq!(substitutions[0].fragment(), &Fragment::Resolved(expected));

    let Ok(Expansion::Signature(sig)) = expand_module_type_expr(&env, expr) else {
        panic!("expected a signature")
    };
    let n = a.module_type("S").module("N");
    let Item::Module(module) = &sig.items[0] else { panic!("expected a module") };
    let ModuleDecl::ModuleType(ModuleTypeExpr::Signature(inner)) = &module.decl else {
        panic!("expected an explicit signature")
    };
    assert_eq!(inner.items, vec![Item::Type(TypeDecl::manifest(n.type_("t"), core("int")))]);
}

#[test]
fn test_destructive_module_substitution_reroots_references() {
    init_logger();
    let a = root();
    let s = a.module_type("S");
    let items = vec![
        module_sig(&a, "B", |b| vec![abstract_type(b, "t")]),
        module_type_sig(&a, "S", |s| {
            vec![module_sig(s, "N", |n| vec![abstract_type(n, "t")]), value(s, "x", named("N.t"))]
        }),
        module_type_expr(
            &a,
            "M",
            with(
                vec![Substitution::ModuleSubst(Fragment::dotted("N"), Path::root("B"))],
                UModuleTypeExpr::Path(Path::root("S")),
            ),
        ),
    ];
    let mut compiler = Compiler::new();
    let (out, env) = compiler.items(&Env::empty(), &items).unwrap();
    assert!(compiler.diagnostics().is_empty());

    let Ok(Expansion::Signature(sig)) = expand_module_type_expr(&env, expr_of(&out[2])) else {
        panic!("expected a signature")
    };
    let b_t = TypeExpr::constr(Path::resolved(a.module("B").type_("t")));
    assert_eq!(sig.items, vec![Item::Value(Value::new(s.value("x"), b_t))]);
}

#[test]
fn test_module_type_of_a_module() {
    let a = root();
    let origin = TypeOfOrigin::ModuleType(Path::root("M"));
    let (out, diagnostics) = compile_items(vec![
        module_sig(&a, "M", |m| vec![abstract_type(m, "t")]),
        module_type_expr(&a, "T", ModuleTypeExpr::TypeOf { origin, expansion: None }),
        module_of_type(&a, "K", ModuleTypeExpr::path(Path::root("T"))),
        value(&a, "w", named("K.t")),
    ]);
    assert!(diagnostics.is_empty());

    let ModuleTypeExpr::TypeOf { origin, .. } = expr_of(&out.items[1]) else { panic!("expected module type of") };
    assert_eq!(origin.path(), &Path::resolved(a.module("M")));
    let Item::Value(w) = &out.items[3] else { panic!("expected a value") };
    assert_eq!(w.type_, TypeExpr::constr(Path::resolved(a.module("K").type_("t"))));
}
