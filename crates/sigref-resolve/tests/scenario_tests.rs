use expect_test::expect;
use sigref_model::{
    Include, IncludeDecl, Item, ModuleTypeExpr, Path, Signature, TypeExpr, UModuleTypeExpr, Value,
};
use sigref_resolve::{compile, Compiler, Component, Construct, Env, Namespace, Phase};

use crate::common::{
    abstract_type, content, core, init_logger, int, module_type_expr, module_type_sig, named, root,
    unit, value, MemoryResolver,
};

#[test]
fn test_unknown_module_type_is_kept_and_reported_once() {
    init_logger();
    let input = unit("A", |a| vec![module_type_expr(a, "M", ModuleTypeExpr::path(Path::root("Foo")))]);
    let compiled = compile(MemoryResolver::new().into_arc(), &input).unwrap();

    assert_eq!(content(&compiled.unit).items, content(&input).items);
    assert_eq!(compiled.diagnostics.len(), 1);
    let report = compiled.diagnostics.iter().next().unwrap();
    assert_eq!(report.phase, Phase::Resolve);
    assert_eq!(report.construct, Construct::ModuleTypePath);
    assert_eq!(report.tag(), "M");
    expect!["resolve: module type path `Foo` in M: module type `Foo` not found"].assert_eq(&report.to_string());
}

fn include_of_module_type(name: &str) -> Item {
    let a = root();
    Item::Include(Include::new(
        a.clone(),
        IncludeDecl::ModuleType(UModuleTypeExpr::Path(Path::resolved(a.module_type(name)))),
    ))
}

#[test]
fn test_included_module_type_members_are_spliced_in() {
    init_logger();
    let a = root();
    let items = vec![
        module_type_sig(&a, "T", |t| vec![value(t, "x", int()), value(t, "y", int())]),
        include_of_module_type("T"),
    ];

    let mut compiler = Compiler::new();
    let (out, env) = compiler.items(&Env::empty(), &items).unwrap();
    assert!(compiler.diagnostics().is_empty());

    let Item::Include(include) = &out[1] else { panic!("expected an include") };
    assert_eq!(
        include.expansion.content,
        Signature {
            items: vec![
                Item::Value(Value::new(a.value("x"), core("int"))),
                Item::Value(Value::new(a.value("y"), core("int"))),
            ],
            compiled: true,
            doc: Vec::new(),
        }
    );

    for name in ["x", "y"] {
        let (id, component) = env.lookup_by_name(Namespace::Value, name).unwrap();
        assert_eq!(id, a.value(name));
        assert!(matches!(component, Component::Value(_)));
    }
}

#[test]
fn test_later_items_see_included_types() {
    init_logger();
    let a = root();
    let items = vec![
        module_type_sig(&a, "T", |t| vec![abstract_type(t, "t"), value(t, "x", named("t"))]),
        include_of_module_type("T"),
        value(&a, "z", named("t")),
    ];

    let mut compiler = Compiler::new();
    let (out, _) = compiler.items(&Env::empty(), &items).unwrap();
    assert!(compiler.diagnostics().is_empty());

    let Item::Value(z) = &out[2] else { panic!("expected a value") };
    let Item::Include(include) = &out[1] else { panic!("expected an include") };
    let Item::Value(x) = &include.expansion.content.items[1] else { panic!("expected a value") };
    let expected = TypeExpr::constr(Path::resolved(a.type_("t")));
    assert_eq!(z.type_, expected);
    assert_eq!(x.type_, expected);
}
