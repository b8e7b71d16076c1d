//! Member lookup on types and receiver resolution.
//!
//! [`type_members`] lists the members reachable on a (possibly constructed)
//! type: its own members first, then inherited ones, with derived members
//! hiding base members of the same name (methods hide by name and parameter
//! count). Interface members only count when the queried type is itself an
//! interface or a type parameter; a class reaches them through its own
//! implementations.
//!
//! [`resolve_receiver`] binds the dotted name chain before a member-access
//! operator (`a.b.|`) to a [`Receiver`]. Anything it cannot bind becomes
//! [`Receiver::Unbound`], which offers no members.

use std::collections::HashSet;

use symscope_core::adapter::BinderHost;
use symscope_core::cancel::CancellationToken;
use symscope_core::error::SemanticResult;
use symscope_core::facts::{
    FactsStore, Symbol, SymbolId, SymbolKind, TypeKind, TypeRef, WellKnownType,
};
use symscope_core::hierarchy;
use symscope_core::snapshot::Snapshot;

use crate::access::AccessSite;
use crate::lookup;
use crate::options::AnalysisOptions;

// ============================================================================
// Member Lookup
// ============================================================================

/// A member found on a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    pub symbol_id: SymbolId,
    /// Constructed type the member was found on (`List<Int32>` for `Add`
    /// reached through `class Ints : List<Int32>`).
    pub declaring_type: TypeRef,
    /// Found on a supertype of the queried type.
    pub inherited: bool,
}

impl MemberEntry {
    /// Type of the member with the declaring type's arguments substituted.
    pub fn member_type(&self, store: &FactsStore) -> Option<TypeRef> {
        let symbol = store.symbol(self.symbol_id)?;
        if symbol.kind == SymbolKind::Type {
            return store.symbol_type(symbol.symbol_id);
        }
        let subst = hierarchy::substitution_for(store, &self.declaring_type);
        symbol.type_ref.as_ref().map(|t| t.substitute(&subst))
    }
}

/// Members reachable on `ty`, derived-most first.
pub fn type_members(
    store: &FactsStore,
    ty: &TypeRef,
    cancel: &CancellationToken,
) -> SemanticResult<Vec<MemberEntry>> {
    let ty = hierarchy::normalize(store, ty);
    if ty.is_unresolved() {
        return Ok(Vec::new());
    }

    let starts_at_interface = is_interface(store, &ty);
    let include_interfaces = starts_at_interface || matches!(ty, TypeRef::Param { .. });

    let mut types = hierarchy::supertypes(store, &ty, cancel)?;
    if starts_at_interface {
        // Interface-typed values still expose the members of object.
        types.extend(store.well_known(WellKnownType::Object).map(TypeRef::named));
    }

    let mut hidden_names: HashSet<&str> = HashSet::new();
    let mut hidden_methods: HashSet<(&str, usize)> = HashSet::new();
    let mut result = Vec::new();

    for (index, declaring_type) in types.iter().enumerate() {
        cancel.check()?;
        let TypeRef::Named { symbol_id, .. } = declaring_type else {
            continue;
        };
        if !include_interfaces && is_interface(store, declaring_type) {
            continue;
        }

        let members = store.members_of(*symbol_id);
        let mut level_names = Vec::new();
        let mut level_methods = Vec::new();
        for member in members {
            if member.explicit_impl_of.is_some() || hidden_names.contains(member.name.as_str()) {
                continue;
            }
            if member.kind == SymbolKind::Method {
                let key = (member.name.as_str(), param_count(store, member));
                if hidden_methods.contains(&key) {
                    continue;
                }
                level_methods.push(key);
            } else {
                level_names.push(member.name.as_str());
            }
            result.push(MemberEntry {
                symbol_id: member.symbol_id,
                declaring_type: declaring_type.clone(),
                inherited: index > 0,
            });
        }
        hidden_names.extend(level_names);
        hidden_methods.extend(level_methods);
    }

    Ok(result)
}

fn is_interface(store: &FactsStore, ty: &TypeRef) -> bool {
    ty.definition()
        .and_then(|d| store.type_decl(d))
        .is_some_and(|d| d.kind == TypeKind::Interface)
}

fn param_count(store: &FactsStore, method: &Symbol) -> usize {
    store
        .signature(method.symbol_id)
        .map(|s| s.params.len())
        .unwrap_or(0)
}

// ============================================================================
// Receivers
// ============================================================================

/// What a member-access operator is applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// An expression of the given static type (`x.`).
    Value(TypeRef),
    /// A type name (`Console.`, `T.`).
    Type(TypeRef),
    /// A namespace name (`System.`).
    Namespace(SymbolId),
    /// The receiver could not be bound; nothing is offered.
    Unbound,
}

impl Receiver {
    /// Receiver denoted by naming `symbol`, found on `via` when it is a member.
    pub fn from_symbol(store: &FactsStore, symbol: &Symbol, via: Option<&TypeRef>) -> Receiver {
        match symbol.kind {
            SymbolKind::Type | SymbolKind::TypeParameter => {
                match store.symbol_type(symbol.symbol_id) {
                    Some(ty) => Receiver::Type(ty),
                    None => Receiver::Unbound,
                }
            }
            SymbolKind::Namespace => Receiver::Namespace(symbol.symbol_id),
            SymbolKind::Alias => match &symbol.type_ref {
                Some(TypeRef::Named { symbol_id, .. })
                    if store
                        .symbol(*symbol_id)
                        .is_some_and(|s| s.kind == SymbolKind::Namespace) =>
                {
                    Receiver::Namespace(*symbol_id)
                }
                Some(target) if !target.is_unresolved() => Receiver::Type(target.clone()),
                _ => Receiver::Unbound,
            },
            SymbolKind::Local
            | SymbolKind::Parameter
            | SymbolKind::RangeVariable
            | SymbolKind::PatternVariable
            | SymbolKind::Field
            | SymbolKind::Property
            | SymbolKind::Event
            | SymbolKind::EnumMember => {
                let subst = via
                    .map(|v| hierarchy::substitution_for(store, v))
                    .unwrap_or_default();
                match symbol.type_ref.as_ref().map(|t| t.substitute(&subst)) {
                    Some(ty) if !ty.is_unresolved() => Receiver::Value(ty),
                    _ => Receiver::Unbound,
                }
            }
            SymbolKind::Method | SymbolKind::LocalFunction | SymbolKind::Label => {
                Receiver::Unbound
            }
        }
    }

    /// Check if the receiver is bound.
    pub fn is_bound(&self) -> bool {
        !matches!(self, Receiver::Unbound)
    }
}

/// Bind a dotted receiver chain at `position`.
///
/// The first segment is looked up lexically (`this` and `base` name the
/// enclosing type); later segments are members of the previous receiver.
pub fn resolve_receiver(
    snapshot: &Snapshot,
    position: usize,
    path: &[String],
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<Receiver> {
    let store = snapshot.store();
    let Some((first, rest)) = path.split_first() else {
        return Ok(Receiver::Unbound);
    };

    let mut receiver = match first.as_str() {
        "this" | "base" => {
            if !lookup::lookup(store, position, options, cancel)?.has_instance {
                tracing::debug!(position, receiver = %first, "no instance in static context");
                return Ok(Receiver::Unbound);
            }
            let site = AccessSite::at(store, store.enclosing_scope(position))?;
            let self_type = site.innermost_type().and_then(|t| store.symbol_type(t));
            match self_type {
                Some(ty) if first == "this" => Receiver::Value(ty),
                Some(ty) => hierarchy::direct_supertypes(store, &ty)
                    .into_iter()
                    .find(|t| !is_interface(store, t))
                    .map(Receiver::Value)
                    .unwrap_or(Receiver::Unbound),
                None => Receiver::Unbound,
            }
        }
        name => {
            let outcome = lookup::lookup(store, position, options, cancel)?;
            match outcome.find_visible(store, name, options) {
                Some(entry) => match store.symbol(entry.symbol_id) {
                    Some(symbol) => Receiver::from_symbol(store, symbol, entry.via.as_ref()),
                    None => Receiver::Unbound,
                },
                None => Receiver::Unbound,
            }
        }
    };

    for segment in rest {
        cancel.check()?;
        receiver = member_receiver(store, &receiver, segment, options, cancel)?;
    }

    tracing::trace!(?path, ?receiver, "resolved receiver");
    Ok(receiver)
}

fn member_receiver(
    store: &FactsStore,
    receiver: &Receiver,
    name: &str,
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<Receiver> {
    let wanted = options.fold_name(name);
    match receiver {
        Receiver::Unbound => Ok(Receiver::Unbound),
        Receiver::Namespace(ns) => {
            let Some(scope) = store.scope_owned_by(*ns) else {
                return Ok(Receiver::Unbound);
            };
            let found = store.symbols_in_scope(scope.scope_id).into_iter().find(|s| {
                matches!(s.kind, SymbolKind::Namespace | SymbolKind::Type)
                    && options.fold_name(&s.name) == wanted
            });
            Ok(found
                .map(|s| Receiver::from_symbol(store, s, None))
                .unwrap_or(Receiver::Unbound))
        }
        Receiver::Type(ty) | Receiver::Value(ty) => {
            for entry in type_members(store, ty, cancel)? {
                let Some(member) = store.symbol(entry.symbol_id) else {
                    continue;
                };
                if member.kind != SymbolKind::Method && options.fold_name(&member.name) == wanted {
                    return Ok(Receiver::from_symbol(
                        store,
                        member,
                        Some(&entry.declaring_type),
                    ));
                }
            }
            Ok(Receiver::Unbound)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SnapshotBuilder;

    fn names(store: &FactsStore, entries: &[MemberEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| store.symbol(e.symbol_id).unwrap().name.clone())
            .collect()
    }

    mod type_member_tests {
        use super::*;

        #[test]
        fn test_inherited_members_substituted() {
            let mut b = SnapshotBuilder::new("class Ints : List<int> { }");
            let corlib = b.corlib();
            let global = b.global();
            let ints = b.type_decl(global, "class Ints", TypeKind::Class);
            b.set_base(&ints, TypeRef::generic(corlib.list, vec![TypeRef::named(corlib.int32)]));
            let snapshot = b.build();
            let store = snapshot.store();
            let cancel = CancellationToken::none();

            let members = type_members(store, &TypeRef::named(ints.symbol), &cancel).unwrap();
            let count = members
                .iter()
                .find(|e| e.symbol_id == corlib.list_count)
                .unwrap();
            assert!(count.inherited);
            assert_eq!(count.member_type(store), Some(TypeRef::named(corlib.int32)));
            assert!(names(store, &members).contains(&"ToString".to_string()));
        }

        #[test]
        fn test_override_hides_base_method() {
            let mut b = SnapshotBuilder::new("class C { public override string ToString() { } }");
            let corlib = b.corlib();
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            let to_string = b.method(&c, "public override string ToString");
            let snapshot = b.build();
            let store = snapshot.store();
            let cancel = CancellationToken::none();

            let members = type_members(store, &TypeRef::named(c.symbol), &cancel).unwrap();
            let ids: Vec<SymbolId> = members.iter().map(|e| e.symbol_id).collect();
            assert!(ids.contains(&to_string.symbol));
            assert!(!ids.contains(&corlib.object_to_string));
            assert!(ids.contains(&corlib.object_equals));
        }

        #[test]
        fn test_interface_members_only_through_interface() {
            let mut b = SnapshotBuilder::new("class R : IDisposable { public void Dispose() { } }");
            let corlib = b.corlib();
            let global = b.global();
            let r = b.type_decl(global, "class R", TypeKind::Class);
            b.add_interface(&r, TypeRef::named(corlib.idisposable));
            let cancel = CancellationToken::none();
            let snapshot = b.build();
            let store = snapshot.store();

            let on_class = type_members(store, &TypeRef::named(r.symbol), &cancel).unwrap();
            assert!(!on_class.iter().any(|e| e.symbol_id == corlib.idisposable_dispose));

            let on_iface =
                type_members(store, &TypeRef::named(corlib.idisposable), &cancel).unwrap();
            let ids: Vec<SymbolId> = on_iface.iter().map(|e| e.symbol_id).collect();
            assert!(ids.contains(&corlib.idisposable_dispose));
            assert!(ids.contains(&corlib.object_to_string));
        }

        #[test]
        fn test_unresolved_type_has_no_members() {
            let store = FactsStore::new();
            let cancel = CancellationToken::none();
            assert!(type_members(&store, &TypeRef::Unresolved, &cancel)
                .unwrap()
                .is_empty());
        }
    }

    mod receiver_tests {
        use super::*;

        #[test]
        fn test_resolves_local_then_member_chain() {
            let mut b = SnapshotBuilder::new(
                "class C { void M() { var s = \"\"; s.Length.$$ } }",
            );
            let corlib = b.corlib();
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            let m = b.method(&c, "void M");
            b.local(m.scope, "var s", "s", TypeRef::named(corlib.string));
            let cursor = b.cursor();
            let snapshot = b.build();
            let options = AnalysisOptions::default();
            let cancel = CancellationToken::none();

            let path = vec!["s".to_string(), "Length".to_string()];
            let receiver = resolve_receiver(&snapshot, cursor, &path, &options, &cancel).unwrap();
            assert_eq!(receiver, Receiver::Value(TypeRef::named(corlib.int32)));
        }

        #[test]
        fn test_namespace_then_type() {
            let mut b = SnapshotBuilder::new("class C { void M() { System.Console.$$ } }");
            let corlib = b.corlib();
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            b.method(&c, "void M");
            let cursor = b.cursor();
            let snapshot = b.build();
            let options = AnalysisOptions::default();
            let cancel = CancellationToken::none();

            let path = vec!["System".to_string(), "Console".to_string()];
            let receiver = resolve_receiver(&snapshot, cursor, &path, &options, &cancel).unwrap();
            assert_eq!(receiver, Receiver::Type(TypeRef::named(corlib.console)));
        }

        #[test]
        fn test_this_is_enclosing_type() {
            let mut b = SnapshotBuilder::new("class C { void M() { this.$$ } }");
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            b.method(&c, "void M");
            let cursor = b.cursor();
            let snapshot = b.build();
            let options = AnalysisOptions::default();
            let cancel = CancellationToken::none();

            let path = vec!["this".to_string()];
            let receiver = resolve_receiver(&snapshot, cursor, &path, &options, &cancel).unwrap();
            assert_eq!(receiver, Receiver::Value(TypeRef::named(c.symbol)));
        }

        #[test]
        fn test_this_and_base_unbound_in_static_context() {
            let mut b = SnapshotBuilder::new("class C { int f; static void M() { this.$$ } }");
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            b.field(&c, "int f", "f", TypeRef::Unresolved);
            b.method(&c, "static void M");
            let cursor = b.cursor();
            let snapshot = b.build();
            let options = AnalysisOptions::default();
            let cancel = CancellationToken::none();

            for first in ["this", "base"] {
                let path = vec![first.to_string()];
                let receiver =
                    resolve_receiver(&snapshot, cursor, &path, &options, &cancel).unwrap();
                assert_eq!(receiver, Receiver::Unbound, "{first}");
            }
        }

        #[test]
        fn test_this_unbound_in_static_lambda() {
            let mut b = SnapshotBuilder::new(
                "class C { void M() { Action a = static () => { this.$$ }; } }",
            );
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            let m = b.method(&c, "void M");
            b.lambda(m.scope, "static () => { this. }", true);
            let cursor = b.cursor();
            let snapshot = b.build();
            let options = AnalysisOptions::default();
            let cancel = CancellationToken::none();

            let path = vec!["this".to_string()];
            let receiver = resolve_receiver(&snapshot, cursor, &path, &options, &cancel).unwrap();
            assert_eq!(receiver, Receiver::Unbound);
        }

        #[test]
        fn test_unknown_name_is_unbound() {
            let mut b = SnapshotBuilder::new("class C { void M() { nope.$$ } }");
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            b.method(&c, "void M");
            let cursor = b.cursor();
            let snapshot = b.build();
            let options = AnalysisOptions::default();
            let cancel = CancellationToken::none();

            let path = vec!["nope".to_string()];
            let receiver = resolve_receiver(&snapshot, cursor, &path, &options, &cancel).unwrap();
            assert_eq!(receiver, Receiver::Unbound);
            assert!(!receiver.is_bound());
        }

        #[test]
        fn test_alias_to_type() {
            let mut b = SnapshotBuilder::new("using Con = System.Console; class C { }");
            let corlib = b.corlib();
            let global = b.global();
            let alias = b.alias(global, "Con", TypeRef::named(corlib.console));
            let snapshot = b.build();
            let store = snapshot.store();
            let symbol = store.symbol(alias).unwrap();
            assert_eq!(
                Receiver::from_symbol(store, symbol, None),
                Receiver::Type(TypeRef::named(corlib.console))
            );
        }
    }
}
