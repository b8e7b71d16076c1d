//! Declared-accessibility checks.
//!
//! An [`AccessSite`] captures the types lexically enclosing a position. A
//! symbol is accessible from the site when its declared accessibility allows
//! code in those types to name it:
//!
//! | Accessibility | Accessible when |
//! |---------------|-----------------|
//! | `public` | always |
//! | `internal` | declared in source (same assembly) |
//! | `private` | the container encloses the site |
//! | `protected` | the container encloses the site, or an enclosing type derives from it |
//! | `protected internal` | `internal` or `protected` |
//! | `private protected` | `internal` and `protected` |

use symscope_core::adapter::BinderHost;
use symscope_core::cancel::CancellationToken;
use symscope_core::error::SemanticResult;
use symscope_core::facts::{Accessibility, FactsStore, ScopeId, ScopeKind, Symbol, SymbolId};
use symscope_core::hierarchy;

/// The types enclosing a lookup position, innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessSite {
    enclosing_types: Vec<SymbolId>,
}

impl AccessSite {
    /// Access site for code inside `scope`.
    pub fn at(store: &FactsStore, scope: ScopeId) -> SemanticResult<Self> {
        let mut enclosing_types = Vec::new();
        for id in store.ancestors(scope)? {
            if let Some(info) = store.scope(id) {
                if info.kind == ScopeKind::Type {
                    enclosing_types.extend(info.owner);
                }
            }
        }
        Ok(AccessSite { enclosing_types })
    }

    /// Access site outside every type (only public and internal symbols).
    pub fn outside() -> Self {
        AccessSite::default()
    }

    /// Enclosing type symbols, innermost first.
    pub fn enclosing_types(&self) -> &[SymbolId] {
        &self.enclosing_types
    }

    /// Innermost enclosing type.
    pub fn innermost_type(&self) -> Option<SymbolId> {
        self.enclosing_types.first().copied()
    }

    /// Check whether `symbol` may be named from this site.
    pub fn can_access(
        &self,
        store: &FactsStore,
        symbol: &Symbol,
        cancel: &CancellationToken,
    ) -> SemanticResult<bool> {
        let Some(container) = symbol.container_symbol_id else {
            return Ok(self.internal_ok(symbol) || symbol.accessibility == Accessibility::Public);
        };

        Ok(match symbol.accessibility {
            Accessibility::Public => true,
            Accessibility::Internal => self.internal_ok(symbol),
            Accessibility::Private => self.encloses(container),
            Accessibility::Protected => self.protected_ok(store, container, cancel)?,
            Accessibility::ProtectedInternal => {
                self.internal_ok(symbol) || self.protected_ok(store, container, cancel)?
            }
            Accessibility::PrivateProtected => {
                self.internal_ok(symbol) && self.protected_ok(store, container, cancel)?
            }
        })
    }

    fn internal_ok(&self, symbol: &Symbol) -> bool {
        !symbol.from_metadata
    }

    fn encloses(&self, container: SymbolId) -> bool {
        self.enclosing_types.contains(&container)
    }

    fn protected_ok(
        &self,
        store: &FactsStore,
        container: SymbolId,
        cancel: &CancellationToken,
    ) -> SemanticResult<bool> {
        if self.encloses(container) {
            return Ok(true);
        }
        for enclosing in &self.enclosing_types {
            let Some(self_type) = store.symbol_type(*enclosing) else {
                continue;
            };
            if hierarchy::find_supertype(store, &self_type, container, cancel)?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SnapshotBuilder;
    use symscope_core::facts::{TypeKind, TypeRef};

    #[test]
    fn test_private_visible_from_nested_type() {
        let mut b = SnapshotBuilder::new("class Outer { private int secret; class Inner { void M() { } } }");
        let global = b.global();
        let outer = b.type_decl(global, "class Outer", TypeKind::Class);
        let secret = b.field(&outer, "private int secret", "secret", TypeRef::Unresolved);
        let inner = b.type_decl(outer.scope, "class Inner", TypeKind::Class);
        let snapshot = b.build();
        let store = snapshot.store();
        let cancel = CancellationToken::none();

        let site = AccessSite::at(store, inner.scope).unwrap();
        assert_eq!(site.enclosing_types(), &[inner.symbol, outer.symbol]);
        let symbol = store.symbol(secret).unwrap();
        assert!(site.can_access(store, symbol, &cancel).unwrap());
        assert!(!AccessSite::outside().can_access(store, symbol, &cancel).unwrap());
    }

    #[test]
    fn test_protected_through_derivation() {
        let mut b = SnapshotBuilder::new(
            "class Base { protected int p; } class Derived : Base { } class Other { }",
        );
        let global = b.global();
        let base = b.type_decl(global, "class Base", TypeKind::Class);
        let p = b.field(&base, "protected int p", "p", TypeRef::Unresolved);
        let derived = b.type_decl(global, "class Derived", TypeKind::Class);
        b.set_base(&derived, TypeRef::named(base.symbol));
        let other = b.type_decl(global, "class Other", TypeKind::Class);
        let snapshot = b.build();
        let store = snapshot.store();
        let cancel = CancellationToken::none();
        let symbol = store.symbol(p).unwrap();

        let from_derived = AccessSite::at(store, derived.scope).unwrap();
        let from_other = AccessSite::at(store, other.scope).unwrap();
        assert!(from_derived.can_access(store, symbol, &cancel).unwrap());
        assert!(!from_other.can_access(store, symbol, &cancel).unwrap());
    }

    #[test]
    fn test_internal_metadata_is_inaccessible() {
        let mut b = SnapshotBuilder::new("class C { }");
        let corlib = b.corlib();
        let global = b.global();
        let c = b.type_decl(global, "class C", TypeKind::Class);
        let snapshot = b.build();
        let store = snapshot.store();
        let cancel = CancellationToken::none();
        let site = AccessSite::at(store, c.scope).unwrap();

        let mut hidden = store.symbol(corlib.console).unwrap().clone();
        hidden.accessibility = Accessibility::Internal;
        assert!(!site.can_access(store, &hidden, &cancel).unwrap());
        let console = store.symbol(corlib.console).unwrap();
        assert!(site.can_access(store, console, &cancel).unwrap());
    }
}
