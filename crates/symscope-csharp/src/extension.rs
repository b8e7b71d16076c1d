//! Extension method discovery and receiver reduction.
//!
//! An extension method is a static method of a non-generic static class
//! whose first parameter carries `this`. It is in scope when its class is
//! declared in a namespace on the scope chain or in a namespace imported by
//! one of those scopes.
//!
//! Reducing an extension onto a receiver infers the method's type arguments
//! from the `this` parameter and then checks every constraint with the
//! inferred arguments substituted, so a self-bounded `where T : List<T>`
//! accepts `ListExtension<X> : List<ListExtension<X>>` and rejects a type
//! that only derives from `HashSet<...>`.

use std::collections::HashSet;

use symscope_core::cancel::CancellationToken;
use symscope_core::error::SemanticResult;
use symscope_core::facts::{
    FactsStore, Modifier, ScopeId, ScopeKind, Substitution, Symbol, SymbolId, SymbolKind, TypeRef,
};
use symscope_core::hierarchy;

/// Check whether `symbol` is callable as an extension method.
pub fn is_extension_method(store: &FactsStore, symbol: &Symbol) -> bool {
    symbol.kind == SymbolKind::Method
        && symbol.has_modifier(Modifier::Static)
        && (symbol.has_modifier(Modifier::Extension)
            || store
                .signature(symbol.symbol_id)
                .is_some_and(|s| s.this_param().is_some()))
}

/// Extension methods in scope at `scope`, in discovery order.
pub fn extension_methods_in_scope(
    store: &FactsStore,
    scope: ScopeId,
    cancel: &CancellationToken,
) -> SemanticResult<Vec<SymbolId>> {
    let mut namespaces: Vec<ScopeId> = Vec::new();
    let mut seen = HashSet::new();

    for id in store.ancestors(scope)? {
        cancel.check()?;
        let Some(info) = store.scope(id) else {
            continue;
        };
        if info.kind == ScopeKind::Namespace && seen.insert(id) {
            namespaces.push(id);
        }
        for import in &info.imports {
            if let Some(imported) = store.scope_owned_by(*import) {
                if seen.insert(imported.scope_id) {
                    namespaces.push(imported.scope_id);
                }
            }
        }
    }

    let mut methods = Vec::new();
    for ns in namespaces {
        for class in store.symbols_in_scope(ns) {
            if !hierarchy::is_static_type(store, class.symbol_id) || class.arity > 0 {
                continue;
            }
            methods.extend(
                store
                    .members_of(class.symbol_id)
                    .into_iter()
                    .filter(|m| is_extension_method(store, m))
                    .map(|m| m.symbol_id),
            );
        }
    }
    Ok(methods)
}

/// Bind `method`'s `this` parameter to `receiver`.
///
/// Returns the inferred method type arguments, or `None` when the receiver
/// does not convert to the `this` parameter or an inferred argument fails
/// its constraints.
pub fn reduce_extension(
    store: &FactsStore,
    method: SymbolId,
    receiver: &TypeRef,
    cancel: &CancellationToken,
) -> SemanticResult<Option<Substitution>> {
    let Some(this) = store.signature(method).and_then(|s| s.this_param()) else {
        return Ok(None);
    };
    let receiver = hierarchy::normalize(store, receiver);
    if receiver.is_unresolved() {
        return Ok(None);
    }

    let params = store.type_params_of(method);
    let mut subst = Substitution::new();
    if !bind(store, &this.type_ref, &receiver, params, &mut subst, cancel)? {
        tracing::trace!(method = %method, "receiver does not bind this parameter");
        return Ok(None);
    }

    for param in params {
        let Some(arg) = subst.get(*param).cloned() else {
            continue;
        };
        if !hierarchy::satisfies_constraints(store, &arg, *param, &subst, cancel)? {
            return Ok(None);
        }
    }
    Ok(Some(subst))
}

/// Bind `pattern` (the `this` parameter type) against `receiver`, allowing
/// an implicit reference conversion at the top level.
fn bind(
    store: &FactsStore,
    pattern: &TypeRef,
    receiver: &TypeRef,
    params: &[SymbolId],
    subst: &mut Substitution,
    cancel: &CancellationToken,
) -> SemanticResult<bool> {
    if !pattern.mentions_any(params) {
        return hierarchy::is_same_or_derived(store, receiver, pattern, cancel);
    }
    match pattern {
        TypeRef::Param { .. } => Ok(bind_exact(pattern, receiver, params, subst)),
        TypeRef::Named { symbol_id, args } => {
            let Some(found) = hierarchy::find_supertype(store, receiver, *symbol_id, cancel)? else {
                return Ok(false);
            };
            Ok(args.len() == found.type_args().len()
                && args
                    .iter()
                    .zip(found.type_args())
                    .all(|(p, a)| bind_exact(p, a, params, subst)))
        }
        TypeRef::Nullable { inner } => match hierarchy::nullable_underlying(store, receiver) {
            Some(underlying) => Ok(bind_exact(inner, &underlying, params, subst)),
            None => Ok(false),
        },
        TypeRef::Array { .. } => Ok(bind_exact(pattern, receiver, params, subst)),
        TypeRef::Unresolved => Ok(false),
    }
}

/// Structural binding with identical type arguments.
fn bind_exact(
    pattern: &TypeRef,
    arg: &TypeRef,
    params: &[SymbolId],
    subst: &mut Substitution,
) -> bool {
    match (pattern, arg) {
        (TypeRef::Param { symbol_id }, _) if params.contains(symbol_id) => {
            match subst.get(*symbol_id) {
                Some(bound) => bound == arg,
                None => {
                    subst.insert(*symbol_id, arg.clone());
                    true
                }
            }
        }
        (
            TypeRef::Named { symbol_id: p, args: pa },
            TypeRef::Named { symbol_id: a, args: aa },
        ) => {
            p == a
                && pa.len() == aa.len()
                && pa
                    .iter()
                    .zip(aa)
                    .all(|(p, a)| bind_exact(p, a, params, subst))
        }
        (
            TypeRef::Array { element: pe, rank: pr },
            TypeRef::Array { element: ae, rank: ar },
        ) => pr == ar && bind_exact(pe, ae, params, subst),
        (TypeRef::Nullable { inner: pi }, TypeRef::Nullable { inner: ai }) => {
            bind_exact(pi, ai, params, subst)
        }
        _ => pattern == arg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SnapshotBuilder;
    use symscope_core::facts::TypeKind;

    #[test]
    fn test_self_bounded_extension() {
        let mut b = SnapshotBuilder::new(
            "static class Ext { public static void Shrink<T>(this T self) where T : List<T> { } } \
             class ListExtension<X> : List<ListExtension<X>> { } \
             class SetExtension<X> : HashSet<SetExtension<X>> { }",
        );
        let corlib = b.corlib();
        let global = b.global();
        let ext = b.type_decl(global, "static class Ext", TypeKind::Class);
        let shrink = b.method(&ext, "public static void Shrink<T>");
        let t = shrink.type_params[0];
        b.this_parameter(&shrink, "self", TypeRef::param(t));
        b.constrain(t, TypeRef::generic(corlib.list, vec![TypeRef::param(t)]));

        let list_ext = b.type_decl(global, "class ListExtension<X>", TypeKind::Class);
        let x = list_ext.type_params[0];
        b.set_base(
            &list_ext,
            TypeRef::generic(
                corlib.list,
                vec![TypeRef::generic(list_ext.symbol, vec![TypeRef::param(x)])],
            ),
        );
        let set_ext = b.type_decl(global, "class SetExtension<X>", TypeKind::Class);
        let y = set_ext.type_params[0];
        b.set_base(
            &set_ext,
            TypeRef::generic(
                corlib.hash_set,
                vec![TypeRef::generic(set_ext.symbol, vec![TypeRef::param(y)])],
            ),
        );
        let snapshot = b.build();
        let store = snapshot.store();
        let cancel = CancellationToken::none();

        let receiver = TypeRef::generic(list_ext.symbol, vec![TypeRef::named(corlib.int32)]);
        let subst = reduce_extension(store, shrink.symbol, &receiver, &cancel)
            .unwrap()
            .expect("list-based receiver reduces");
        assert_eq!(subst.get(t), Some(&receiver));

        let other = TypeRef::generic(set_ext.symbol, vec![TypeRef::named(corlib.int32)]);
        assert_eq!(reduce_extension(store, shrink.symbol, &other, &cancel).unwrap(), None);
    }

    #[test]
    fn test_generic_this_parameter_binds_through_base() {
        let mut b = SnapshotBuilder::new(
            "static class Ext { public static void First<E>(this List<E> items) { } } \
             class Names : List<String> { }",
        );
        let corlib = b.corlib();
        let global = b.global();
        let ext = b.type_decl(global, "static class Ext", TypeKind::Class);
        let first = b.method(&ext, "public static void First<E>");
        let e = first.type_params[0];
        b.this_parameter(
            &first,
            "items",
            TypeRef::generic(corlib.list, vec![TypeRef::param(e)]),
        );
        let names = b.type_decl(global, "class Names", TypeKind::Class);
        b.set_base(
            &names,
            TypeRef::generic(corlib.list, vec![TypeRef::named(corlib.string)]),
        );
        let snapshot = b.build();
        let cancel = CancellationToken::none();

        let subst = reduce_extension(snapshot.store(), first.symbol, &TypeRef::named(names.symbol), &cancel)
            .unwrap()
            .unwrap();
        assert_eq!(subst.get(e), Some(&TypeRef::named(corlib.string)));
    }

    #[test]
    fn test_closed_this_parameter_requires_conversion() {
        let mut b = SnapshotBuilder::new(
            "static class Ext { public static void Shout(this String s) { } }",
        );
        let corlib = b.corlib();
        let global = b.global();
        let ext = b.type_decl(global, "static class Ext", TypeKind::Class);
        let shout = b.method(&ext, "public static void Shout");
        b.this_parameter(&shout, "s", TypeRef::named(corlib.string));
        let snapshot = b.build();
        let store = snapshot.store();
        let cancel = CancellationToken::none();

        let on_string = reduce_extension(store, shout.symbol, &TypeRef::named(corlib.string), &cancel);
        assert_eq!(on_string.unwrap(), Some(Substitution::new()));
        let on_int = reduce_extension(store, shout.symbol, &TypeRef::named(corlib.int32), &cancel);
        assert_eq!(on_int.unwrap(), None);
    }

    #[test]
    fn test_discovery_follows_imports() {
        let mut b = SnapshotBuilder::new(
            "namespace Tools { static class Ext { public static void Shout(this String s) { } } } \
             class C { void M() { } }",
        );
        let corlib = b.corlib();
        let global = b.global();
        let tools = b.namespace(global, "namespace Tools");
        let ext = b.type_decl(tools.scope, "static class Ext", TypeKind::Class);
        let shout = b.method(&ext, "public static void Shout");
        b.this_parameter(&shout, "s", TypeRef::named(corlib.string));
        let c = b.type_decl(global, "class C", TypeKind::Class);
        let m = b.method(&c, "void M");
        let snapshot_without = b.clone().build();
        b.import(global, tools.symbol);
        let snapshot_with = b.build();
        let cancel = CancellationToken::none();

        let without = extension_methods_in_scope(snapshot_without.store(), m.scope, &cancel).unwrap();
        assert!(!without.contains(&shout.symbol));
        let with = extension_methods_in_scope(snapshot_with.store(), m.scope, &cancel).unwrap();
        assert!(with.contains(&shout.symbol));
    }
}
