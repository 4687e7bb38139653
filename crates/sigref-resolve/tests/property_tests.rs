use sigref_model::{
    Class, ClassDecl, ClassSignature, ClassSignatureItem, ClassType, ClassTypeExpr, Fragment, IdentKind,
    Method, Include, IncludeDecl, Item, ModuleTypeExpr, Path,
    Signature, Substitution, TypeEquation, TypeExpr, UModuleTypeExpr,
};
use sigref_resolve::expand::{expand_module_type_expr, Expansion};
use sigref_resolve::{compile, CompileError, Compiler, Construct, Env, FetchError};

use crate::common::{
    abstract_type, alias, compile_items, core, int, manifest_type, module_of_type, module_type_expr,
    module_type_sig, named, root, unit, value, MemoryResolver,
};

fn type_eq(fragment: &str, manifest: TypeExpr) -> Substitution {
    Substitution::TypeEq(Fragment::dotted(fragment), TypeEquation::manifest(manifest))
}

#[test]
fn test_compiling_twice_changes_nothing() {
    let a = root();
    let constrained = ModuleTypeExpr::With {
        substitutions: vec![type_eq("t", int())],
        base: Box::new(UModuleTypeExpr::Path(Path::root("S"))),
        expansion: None,
    };
    let items = vec![
        module_type_sig(&a, "S", |s| vec![abstract_type(s, "t"), value(s, "x", named("t"))]),
        module_of_type(&a, "M", constrained),
        Item::Include(Include::new(a.clone(), IncludeDecl::ModuleType(UModuleTypeExpr::Path(Path::root("S"))))),
        value(&a, "v", named("t")),
        value(&a, "w", named("M.t")),
        alias(&a, "N", Path::root("M")),
    ];
    let (once, diagnostics) = compile_items(items);
    assert!(diagnostics.is_empty());

    let (twice, diagnostics) = compile_items(once.items.clone());
    assert!(diagnostics.is_empty());
    assert_eq!(twice.items, once.items);
}

#[test]
fn test_each_failing_construct_reports_once() {
    let a = root();
    let class = Class {
        id: a.class("c"),
        doc: Vec::new(),
        virtual_: false,
        params: Vec::new(),
        decl: ClassDecl::ClassType(ClassTypeExpr::Constr(Path::root("nope"), Vec::new())),
        expansion: None,
    };
    let (out, diagnostics) = compile_items(vec![
        alias(&a, "N", Path::root("Nope")),
        module_of_type(&a, "K", ModuleTypeExpr::path(Path::root("Foo"))),
        Item::Include(Include::new(a.clone(), IncludeDecl::Alias(Path::root("Gone")))),
        Item::Class(class),
        value(&a, "quiet", named("Missing.t")),
    ]);

    let constructs: Vec<_> = diagnostics.iter().map(|r| r.construct).collect();
    assert_eq!(constructs, vec![Construct::ModulePath, Construct::ModuleTypePath, Construct::Include, Construct::Class]);
    let Item::Class(class) = &out.items[3] else { panic!("expected a class") };
    assert_eq!(class.expansion, None);
}

#[test]
fn test_class_signature_failures_report_once() {
    let a = root();
    let ct = a.class_type("ct");
    let class_type = ClassType {
        id: ct.clone(),
        doc: Vec::new(),
        virtual_: false,
        params: Vec::new(),
        expr: ClassTypeExpr::Signature(ClassSignature {
            self_: None,
            items: vec![
                ClassSignatureItem::Inherit(ClassTypeExpr::Constr(Path::root("nope"), Vec::new())),
                ClassSignatureItem::Method(Method {
                    id: ct.child(IdentKind::Method, "m"),
                    doc: Vec::new(),
                    private: false,
                    virtual_: false,
                    type_: int(),
                }),
            ],
        }),
        expansion: None,
    };
    let class = Class {
        id: a.class("c"),
        doc: Vec::new(),
        virtual_: false,
        params: Vec::new(),
        decl: ClassDecl::ClassType(ClassTypeExpr::Constr(Path::root("ct"), Vec::new())),
        expansion: None,
    };
    let (out, diagnostics) = compile_items(vec![Item::ClassType(class_type), Item::Class(class)]);

    let constructs: Vec<_> = diagnostics.iter().map(|r| r.construct).collect();
    assert_eq!(constructs, vec![Construct::Class]);

    let Item::ClassType(ct) = &out.items[0] else { panic!("expected a class type") };
    let ClassTypeExpr::Signature(compiled) = &ct.expr else { panic!("expected a signature") };
    assert_eq!(ct.expansion.as_ref(), Some(compiled));

    let Item::Class(c) = &out.items[1] else { panic!("expected a class") };
    let expansion = c.expansion.as_ref().expect("inherited from ct");
    let ClassSignatureItem::Method(m) = &expansion.items[1] else { panic!("expected a method") };
    assert_eq!(m.type_, core("int"));
}

#[test]
fn test_unloadable_unit_aborts_the_compile() {
    let input = unit("A", |a| {
        vec![module_type_sig(a, "S", |s| vec![alias(s, "N", Path::dotted("Broken.X"))])]
    });
    let resolver = MemoryResolver::new().with_broken("Broken").into_arc();

    let err = compile(resolver, &input).unwrap_err();
    assert_eq!(
        err,
        CompileError::Fetch {
            unit: "A".to_string(),
            source: FetchError::LoadFailed { unit: "Broken".to_string(), reason: "truncated file".to_string() },
        }
    );
}

#[test]
fn test_nested_constraints_compose_like_a_single_list() {
    let a = root();
    let s = module_type_sig(&a, "S", |s| vec![abstract_type(s, "t"), abstract_type(s, "u")]);
    let flat = ModuleTypeExpr::With {
        substitutions: vec![type_eq("t", int()), type_eq("u", named("string"))],
        base: Box::new(UModuleTypeExpr::Path(Path::root("S"))),
        expansion: None,
    };
    let nested = ModuleTypeExpr::With {
        substitutions: vec![type_eq("u", named("string"))],
        base: Box::new(UModuleTypeExpr::With(
            vec![type_eq("t", int())],
            Box::new(UModuleTypeExpr::Path(Path::root("S"))),
        )),
        expansion: None,
    };
    let items = vec![s, module_type_expr(&a, "Flat", flat), module_type_expr(&a, "Nested", nested)];

    let mut compiler = Compiler::new();
    let (out, env) = compiler.items(&Env::empty(), &items).unwrap();
    assert!(compiler.diagnostics().is_empty());

    let expand = |item: &Item| -> Signature {
        let Item::ModuleType(mt) = item else { panic!("expected a module type") };
        match expand_module_type_expr(&env, mt.expr.as_ref().unwrap()) {
            Ok(Expansion::Signature(sig)) => sig,
            other => panic!("expected a signature, got {:?}", other),
        }
    };
    let flat = expand(&out[1]);
    assert_eq!(flat, expand(&out[2]));

    let s = a.module_type("S");
    assert_eq!(
        flat.items,
        vec![manifest_type(&s, "t", core("int")), manifest_type(&s, "u", core("string"))]
    );
}

#[test]
fn test_nested_constraints_on_a_literal_signature_normalise_like_a_flat_list() {
    let a = root();
    let s = a.module_type("S");
    let literal = || UModuleTypeExpr::Signature(Signature::new(vec![abstract_type(&s, "t"), abstract_type(&s, "u")]));
    let flat = ModuleTypeExpr::With {
        substitutions: vec![type_eq("t", int()), type_eq("u", named("string"))],
        base: Box::new(literal()),
        expansion: None,
    };
    let nested = ModuleTypeExpr::With {
        substitutions: vec![type_eq("u", named("string"))],
        base: Box::new(UModuleTypeExpr::With(vec![type_eq("t", int())], Box::new(literal()))),
        expansion: None,
    };
    let (out, diagnostics) =
        compile_items(vec![module_type_expr(&a, "Flat", flat), module_type_expr(&a, "Nested", nested)]);
    assert!(diagnostics.is_empty());

    let expr = |item: &Item| -> ModuleTypeExpr {
        let Item::ModuleType(mt) = item else { panic!("expected a module type") };
        mt.expr.clone().expect("module type has a body")
    };
    let flat = expr(&out.items[0]);
    assert_eq!(flat, expr(&out.items[1]));

    let ModuleTypeExpr::Signature(sig) = flat else { panic!("expected a normalised signature") };
    assert!(sig.compiled);
    assert_eq!(sig.items, vec![manifest_type(&s, "t", core("int")), manifest_type(&s, "u", core("string"))]);
}
