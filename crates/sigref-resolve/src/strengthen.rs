//! Strengthening: recording that a signature is the signature of a known
//! module, so that its abstract types are equal to that module's types.

use sigref_model::{
    IdentKind, Item, ModuleDecl, ModuleTypeExpr, Path, ResolvedPath, Signature, TypeExpr,
};

/// Gives every abstract type `t` of `sig` the manifest `path.t`, and does
/// the same inside nested explicit signatures.
pub fn strengthen(path: &ResolvedPath, sig: &Signature) -> Signature {
    Signature {
        items: sig.items.iter().map(|item| strengthen_item(path, item)).collect(),
        compiled: sig.compiled,
        doc: sig.doc.clone(),
    }
}

fn strengthen_item(path: &ResolvedPath, item: &Item) -> Item {
    match item {
        Item::Type(t) if t.equation.manifest.is_none() && !t.id.is_hidden() => {
            let mut t = t.clone();
            let args = t
                .equation
                .params
                .iter()
                .map(|p| if p == "_" { TypeExpr::Any } else { TypeExpr::Var(p.clone()) })
                .collect();
            let target = path.child(IdentKind::Type, t.id.name());
            t.equation.manifest = Some(TypeExpr::Constr(Path::Resolved(target), args));
            Item::Type(t)
        }
        Item::Module(m) if !m.id.is_hidden() => match &m.decl {
            ModuleDecl::ModuleType(ModuleTypeExpr::Signature(inner)) => {
                let mut m = m.clone();
                let inner = strengthen(&path.child(IdentKind::Module, m.id.name()), inner);
                m.decl = ModuleDecl::ModuleType(ModuleTypeExpr::Signature(inner));
                Item::Module(m)
            }
            _ => item.clone(),
        },
        Item::Include(i) => {
            let mut i = i.clone();
            i.expansion.content = strengthen(path, &i.expansion.content);
            Item::Include(i)
        }
        _ => item.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigref_model::{Identifier, TypeDecl, TypeEquation};

    #[test]
    fn abstract_types_point_at_the_path() {
        let s = Identifier::root("A").module_type("S");
        let mut poly = TypeDecl::abstract_(s.type_("u"));
        poly.equation = TypeEquation { params: vec!["a".into(), "_".into()], ..TypeEquation::default() };
        let int = TypeExpr::constr(Path::resolved(Identifier::core_type("int")));
        let sig = Signature::new(vec![
            Item::Type(TypeDecl::abstract_(s.type_("t"))),
            Item::Type(poly),
            Item::Type(TypeDecl::manifest(s.type_("v"), int.clone())),
        ]);
        let m = ResolvedPath::Identifier(Identifier::root("M"));
        let out = strengthen(&m, &sig);

        let manifests: Vec<_> = out
            .items
            .iter()
            .map(|item| match item {
                Item::Type(t) => t.equation.manifest.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(
            manifests,
            vec![
                Some(TypeExpr::constr(Path::resolved(Identifier::root("M").type_("t")))),
                Some(TypeExpr::Constr(
                    Path::resolved(Identifier::root("M").type_("u")),
                    vec![TypeExpr::Var("a".into()), TypeExpr::Any],
                )),
                Some(int),
            ]
        );
    }
}
