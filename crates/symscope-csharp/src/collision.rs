//! Collision candidates for new identifiers.
//!
//! Before minting a name for a new local, the caller needs every symbol whose
//! name the new local could clash with. That is the lookup result at the
//! insertion point (shadowed and not-yet-declared symbols included) plus every
//! symbol declared inside the target declaration space, since a local may not
//! reuse a name declared in a nested block either.

use std::collections::HashSet;

use symscope_core::cancel::CancellationToken;
use symscope_core::error::SemanticResult;
use symscope_core::facts::{Modifier, ScopeId, Symbol, SymbolKind};
use symscope_core::snapshot::Snapshot;

use crate::applicability::Exclusion;
use crate::lookup;
use crate::options::AnalysisOptions;

/// Default predicate for local-variable names.
///
/// Admits locals, parameters, range and pattern variables, fields,
/// properties, and static types. Methods and events never collide with a
/// local.
pub fn is_local_collision_candidate(symbol: &Symbol) -> bool {
    match symbol.kind {
        SymbolKind::Local
        | SymbolKind::Parameter
        | SymbolKind::RangeVariable
        | SymbolKind::PatternVariable
        | SymbolKind::Field
        | SymbolKind::Property => true,
        SymbolKind::Type => symbol.has_modifier(Modifier::Static),
        _ => false,
    }
}

/// Keep the symbols `predicate` admits.
pub fn filter_for_collision_check<'s, I, P>(symbols: I, predicate: P) -> Vec<&'s Symbol>
where
    I: IntoIterator<Item = &'s Symbol>,
    P: Fn(&Symbol) -> bool,
{
    symbols.into_iter().filter(|s| predicate(s)).collect()
}

/// Symbols a new identifier at `position` could collide with.
///
/// `container` names the declaration space the identifier goes into; without
/// one the nearest local declaration space at `position` is used. Symbols the
/// position cannot access do not collide.
pub fn collidable_symbols<'s>(
    snapshot: &'s Snapshot,
    position: usize,
    container: Option<ScopeId>,
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<Vec<&'s Symbol>> {
    let store = snapshot.store();
    let space = lookup::enclosing_scope(store, position, container, cancel)?;
    if space.is_synthetic_root() {
        return Ok(Vec::new());
    }

    let mut seen = HashSet::new();
    let mut result = Vec::new();

    let outcome = lookup::lookup(store, position, options, cancel)?;
    for entry in &outcome.entries {
        if entry.verdict.exclusion() == Some(Exclusion::Inaccessible) {
            continue;
        }
        if let Some(symbol) = store.symbol(entry.symbol_id) {
            if seen.insert(symbol.symbol_id) {
                result.push(symbol);
            }
        }
    }

    let mut spaces = vec![space];
    spaces.extend(store.descendants(space));
    for scope in spaces {
        cancel.check()?;
        for symbol in store.symbols_in_scope(scope) {
            if seen.insert(symbol.symbol_id) {
                result.push(symbol);
            }
        }
    }

    tracing::trace!(position, space = %space, candidates = result.len(), "collision candidates");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SnapshotBuilder;
    use symscope_core::facts::{TypeKind, TypeRef};

    #[test]
    fn test_default_predicate() {
        let mut b = SnapshotBuilder::new(
            "static class Util { } class Plain { } class C { int f; void Run() { } void M(int p) { int x = 0; } }",
        );
        let global = b.global();
        let util = b.type_decl(global, "static class Util", TypeKind::Class);
        let plain = b.type_decl(global, "class Plain", TypeKind::Class);
        let c = b.type_decl(global, "class C", TypeKind::Class);
        let f = b.field(&c, "int f", "f", TypeRef::Unresolved);
        let run = b.method(&c, "void Run");
        let m = b.method(&c, "void M");
        let p = b.parameter(&m, "p", TypeRef::Unresolved);
        let x = b.local(m.scope, "int x", "x", TypeRef::Unresolved);
        let snapshot = b.build();
        let store = snapshot.store();

        let admitted = |id| is_local_collision_candidate(store.symbol(id).unwrap());
        assert!(admitted(util.symbol));
        assert!(!admitted(plain.symbol));
        assert!(admitted(f));
        assert!(!admitted(run.symbol));
        assert!(admitted(p));
        assert!(admitted(x));
    }

    #[test]
    fn test_nested_and_later_locals_collide() {
        let mut b = SnapshotBuilder::new(
            "class C { void M() { $$ { int inner = 0; } int later = 1; } }",
        );
        let global = b.global();
        let c = b.type_decl(global, "class C", TypeKind::Class);
        let m = b.method(&c, "void M");
        let block = b.block(m.scope, "{ int inner");
        let inner = b.local(block, "int inner", "inner", TypeRef::Unresolved);
        let later = b.local(m.scope, "int later", "later", TypeRef::Unresolved);
        let cursor = b.cursor();
        let snapshot = b.build();
        let cancel = CancellationToken::none();

        let symbols =
            collidable_symbols(&snapshot, cursor, None, &AnalysisOptions::default(), &cancel)
                .unwrap();
        let ids: Vec<_> = symbols.iter().map(|s| s.symbol_id).collect();
        assert!(ids.contains(&inner));
        assert!(ids.contains(&later));
        assert!(ids.contains(&m.symbol));
    }

    #[test]
    fn test_custom_predicate() {
        let mut b = SnapshotBuilder::new("class C { void Run() { } void M() { $$ } }");
        let global = b.global();
        let c = b.type_decl(global, "class C", TypeKind::Class);
        let run = b.method(&c, "void Run");
        b.method(&c, "void M");
        let cursor = b.cursor();
        let snapshot = b.build();
        let cancel = CancellationToken::none();

        let all =
            collidable_symbols(&snapshot, cursor, None, &AnalysisOptions::default(), &cancel)
                .unwrap();
        let methods = filter_for_collision_check(all.iter().copied(), |s| {
            s.kind == SymbolKind::Method
        });
        assert!(methods.iter().any(|s| s.symbol_id == run.symbol));
        let locals = filter_for_collision_check(all, is_local_collision_candidate);
        assert!(locals.iter().all(|s| s.symbol_id != run.symbol));
    }
}
