use expect_test::expect;
use sigref_model::{
    Constructor, ConstructorArgs, FunctorArgument, FunctorParameter, IdentKind, Identifier, Item,
    ModuleDecl, ModuleTypeExpr, Path, Signature, TypeDecl, TypeExpr, TypeRepr,
};
use sigref_resolve::{compile, Construct, Phase};

use crate::common::{
    abstract_type, alias, compile_items, content, core, int, manifest_type, module_of_type, module_sig,
    module_type_sig, named, root, unit, value, MemoryResolver,
};

fn value_type(item: &Item) -> &TypeExpr {
    match item {
        Item::Value(v) => &v.type_,
        _ => panic!("expected a value"),
    }
}

fn resolved_path(ty: &TypeExpr) -> &Path {
    match ty {
        TypeExpr::Constr(path, _) => path,
        _ => panic!("expected a type constructor"),
    }
}

#[test]
fn test_resolved_identifiers_follow_the_accessor_chain() {
    let stdlib = unit("Stdlib", |s| vec![module_sig(s, "List", |l| vec![abstract_type(l, "t")])]);
    let input = unit("A", |a| vec![value(a, "x", named("Stdlib.List.t")), alias(a, "L", Path::dotted("Stdlib.List"))]);
    let compiled = compile(MemoryResolver::new().with_unit(stdlib).into_arc(), &input).unwrap();
    assert!(compiled.diagnostics.is_empty());

    let items = &content(&compiled.unit).items;
    let Path::Resolved(path) = resolved_path(value_type(&items[0])) else { panic!("expected a resolved path") };
    let id = path.identifier().unwrap();
    assert_eq!(id.ancestors().map(Identifier::name).collect::<Vec<_>>(), vec!["t", "List", "Stdlib"]);
    assert_eq!(id.ancestors().map(Identifier::kind).collect::<Vec<_>>(), vec![
        IdentKind::Type,
        IdentKind::Module,
        IdentKind::Root
    ]);

    let Item::Module(l) = &items[1] else { panic!("expected a module") };
    assert!(matches!(&l.decl, ModuleDecl::Alias(p, None) if *p == Path::resolved(Identifier::root("Stdlib").module("List"))));
}

#[test]
fn test_projection_out_of_a_functor_application() {
    let a = root();
    let f = a.module("F");
    let param = FunctorParameter::Named(Box::new(FunctorArgument {
        id: f.parameter("X"),
        expr: ModuleTypeExpr::path(Path::root("S")),
    }));
    let body = ModuleTypeExpr::Signature(Signature::new(vec![manifest_type(&f.result(), "u", named("X.t"))]));
    let (out, diagnostics) = compile_items(vec![
        module_type_sig(&a, "S", |s| vec![abstract_type(s, "t")]),
        module_of_type(&a, "F", ModuleTypeExpr::Functor(param, Box::new(body))),
        module_of_type(&a, "B", ModuleTypeExpr::path(Path::root("S"))),
        value(&a, "v", TypeExpr::constr(Path::root("F").apply(Path::root("B")).dot("u"))),
    ]);
    assert!(diagnostics.is_empty());

    let Item::Module(functor) = &out.items[1] else { panic!("expected a module") };
    let ModuleDecl::ModuleType(ModuleTypeExpr::Functor(_, body)) = &functor.decl else { panic!("expected a functor") };
    let ModuleTypeExpr::Signature(body) = body.as_ref() else { panic!("expected a signature") };
    let Item::Type(u) = &body.items[0] else { panic!("expected a type") };
    assert_eq!(u.equation.manifest, Some(TypeExpr::constr(Path::resolved(f.parameter("X").type_("t")))));

    let path = resolved_path(value_type(&out.items[3]));
    assert!(path.is_resolved());
    expect!["A.F(A.B).u"].assert_eq(&path.to_string());
}

#[test]
fn test_failed_alias_is_kept_with_one_report() {
    let a = root();
    let item = alias(&a, "M", Path::dotted("Nope.Inner"));
    let (out, diagnostics) = compile_items(vec![item.clone()]);

    assert_eq!(out.items, vec![item]);
    assert_eq!(diagnostics.len(), 1);
    let report = diagnostics.iter().next().unwrap();
    assert_eq!((report.construct, report.phase), (Construct::ModulePath, Phase::Resolve));
    expect!["resolve: module path `Nope.Inner` in M: module `Nope` not found"].assert_eq(&report.to_string());
}

#[test]
fn test_leaf_failures_are_silent() {
    let a = root();
    let items = vec![
        value(&a, "x", named("Missing.t")),
        manifest_type(&a, "t", TypeExpr::Tuple(vec![named("u"), int()])),
        value(&a, "o", TypeExpr::Class(Path::root("nope"), Vec::new())),
    ];
    let (out, diagnostics) = compile_items(items.clone());

    assert!(diagnostics.is_empty());
    assert_eq!(out.items[0], items[0]);
    assert_eq!(out.items[2], items[2]);
    let Item::Type(t) = &out.items[1] else { panic!("expected a type") };
    assert_eq!(t.equation.manifest, Some(TypeExpr::Tuple(vec![named("u"), core("int")])));
}

#[test]
fn test_items_only_see_earlier_declarations() {
    let a = root();
    let (out, _) = compile_items(vec![value(&a, "x", named("u")), abstract_type(&a, "u"), value(&a, "y", named("u"))]);
    assert_eq!(value_type(&out.items[0]), &named("u"));
    assert_eq!(value_type(&out.items[2]), &TypeExpr::constr(Path::resolved(a.type_("u"))));
}

#[test]
fn test_types_see_themselves() {
    let a = root();
    let t = a.type_("t");
    let node = Constructor {
        id: t.child(IdentKind::Constructor, "Node"),
        doc: Vec::new(),
        args: ConstructorArgs::Tuple(vec![TypeExpr::Constr(Path::root("list"), vec![named("t")])]),
        res: None,
    };
    let decl = TypeDecl { representation: Some(TypeRepr::Variant(vec![node])), ..TypeDecl::abstract_(t.clone()) };
    let (out, _) = compile_items(vec![Item::Type(decl)]);

    let Item::Type(decl) = &out.items[0] else { panic!("expected a type") };
    let Some(TypeRepr::Variant(constructors)) = &decl.representation else { panic!("expected a variant") };
    let ConstructorArgs::Tuple(args) = &constructors[0].args else { panic!("expected tuple arguments") };
    assert_eq!(
        args[0],
        TypeExpr::Constr(
            Path::resolved(Identifier::core_type("list")),
            vec![TypeExpr::constr(Path::resolved(t))]
        )
    );
}

#[test]
fn test_user_types_shadow_predefined_ones() {
    let a = root();
    let (out, _) = compile_items(vec![abstract_type(&a, "int"), value(&a, "x", int()), value(&a, "y", named("string"))]);
    assert_eq!(value_type(&out.items[1]), &TypeExpr::constr(Path::resolved(a.type_("int"))));
    assert_eq!(value_type(&out.items[2]), &core("string"));
}
