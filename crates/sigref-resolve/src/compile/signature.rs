use sigref_model::{
    External, Item, Module, ModuleSubstitution, Open, PathKind, Signature, Value,
};

use crate::env::Env;
use crate::error::CompileResult;

use super::path::resolve_silently;
use super::Compiler;

impl Compiler {
    /// Compiles a signature. Signatures already marked compiled come back
    /// as they are.
    pub fn signature(&mut self, env: &Env, sig: &Signature) -> CompileResult<Signature> {
        if sig.compiled {
            return Ok(sig.clone());
        }
        let env = env.add_docs(&sig.doc);
        let (items, _) = self.items(&env, &sig.items)?;
        Ok(Signature { items, compiled: true, doc: sig.doc.clone() })
    }

    /// Compiles `items` in order, threading the environment through them.
    ///
    /// Each item sees the declarations before it. Types also see themselves,
    /// so that recursive definitions resolve. Returns the compiled items and
    /// the environment after the last one.
    pub fn items(&mut self, env: &Env, items: &[Item]) -> CompileResult<(Vec<Item>, Env)> {
        let mut env = env.clone();
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if let Some(id) = item.identifier() {
                log::trace!("Compiling {}", id);
            }
            let (compiled, next) = self.item(&env, item)?;
            out.push(compiled);
            env = next;
        }
        Ok((out, env))
    }

    fn item(&mut self, env: &Env, item: &Item) -> CompileResult<(Item, Env)> {
        let compiled = match item {
            Item::Module(m) => {
                let m = self.module(env, m)?;
                let next = env.add_module(&m);
                return Ok((Item::Module(m), next));
            }
            Item::ModuleSubstitution(m) => Item::ModuleSubstitution(ModuleSubstitution {
                manifest: resolve_silently(env, PathKind::Module, &m.manifest)?,
                ..m.clone()
            }),
            Item::ModuleType(mt) => {
                let mt = self.module_type(env, mt)?;
                let next = env.add_module_type(&mt);
                return Ok((Item::ModuleType(mt), next));
            }
            Item::Type(t) => {
                let scope = env.add_item(item);
                let compiled = Item::Type(self.type_decl(&scope, t)?);
                let next = env.add_item(&compiled);
                return Ok((compiled, next));
            }
            Item::TypeSubstitution(t) => Item::TypeSubstitution(self.type_decl(env, t)?),
            Item::Value(v) => {
                Item::Value(Value { type_: self.type_expr(env, &v.id, &v.type_)?, ..v.clone() })
            }
            Item::External(e) => {
                Item::External(External { type_: self.type_expr(env, &e.id, &e.type_)?, ..e.clone() })
            }
            Item::Class(c) => Item::Class(self.class(env, c)?),
            Item::ClassType(c) => Item::ClassType(self.class_type(env, c)?),
            Item::TypeExtension(e) => Item::TypeExtension(self.extension(env, e)?),
            Item::Exception(e) => Item::Exception(self.exception(env, e)?),
            Item::Include(i) => {
                let (i, next) = self.include(env, i)?;
                return Ok((Item::Include(i), next));
            }
            Item::Open(o) => {
                let expansion = self.signature(env, &o.expansion)?;
                let next = env.open_signature(&expansion);
                return Ok((Item::Open(Open { doc: o.doc.clone(), expansion }), next));
            }
            Item::Comment(_) => return Ok((item.clone(), env.clone())),
        };
        let next = env.add_item(&compiled);
        Ok((compiled, next))
    }

    fn module(&mut self, env: &Env, module: &Module) -> CompileResult<Module> {
        // File-local modules are bound but not documented.
        if module.hidden {
            return Ok(module.clone());
        }
        let env = env.add_docs(&module.doc);
        let decl = self.module_decl(&env, &module.id, &module.decl)?;
        Ok(Module { decl, ..module.clone() })
    }
}
