//! Binder-host seam traits.
//!
//! This module defines the interfaces the query layer needs from the compiler
//! host that produced a snapshot:
//!
//! - [`BinderHost`]: scope and symbol questions (enclosing scope, declared
//!   symbols, symbol types, interface implementation)
//! - [`TypeLattice`]: type-hierarchy questions (base types, constraint
//!   satisfaction)
//!
//! Both are implemented for [`FactsStore`], which is the form hosts hand over
//! today. A host with its own semantic model can implement the traits
//! directly and reuse the language rules built on top of them.
//!
//! # Contract
//!
//! - Implementations are read-only: `&self` everywhere, no interior
//!   mutability required.
//! - Missing information is reported as `None`/empty, never as an error.
//!   Errors are reserved for cancellation and structural invariant violations.

use crate::cancel::CancellationToken;
use crate::error::SemanticResult;
use crate::facts::{
    Accessibility, FactsStore, ScopeId, Substitution, Symbol, SymbolId, SymbolKind, TypeRef,
};
use crate::hierarchy;

// ============================================================================
// Traits
// ============================================================================

/// Scope and symbol queries answered by the binder host.
pub trait BinderHost {
    /// Innermost bound scope containing `position`.
    ///
    /// Returns [`ScopeId::SYNTHETIC_ROOT`] when no scope contains it.
    fn enclosing_scope(&self, position: usize) -> ScopeId;

    /// Symbols declared directly in `scope`.
    fn declared_symbols(&self, scope: ScopeId) -> Vec<&Symbol>;

    /// Static type of a symbol (the type itself for type symbols, the
    /// target for aliases).
    fn symbol_type(&self, symbol: SymbolId) -> Option<TypeRef>;

    /// Check whether `ty` implements the interface definition `interface`.
    fn implements(
        &self,
        ty: &TypeRef,
        interface: SymbolId,
        cancel: &CancellationToken,
    ) -> SemanticResult<bool>;

    /// Member of `ty` (or its base chain) implementing `interface_member`.
    fn find_implementation_for_interface_member(
        &self,
        ty: &TypeRef,
        interface_member: SymbolId,
        cancel: &CancellationToken,
    ) -> SemanticResult<Option<SymbolId>>;
}

/// Type-hierarchy queries answered by the binder host.
pub trait TypeLattice {
    /// Immediate supertypes of `ty` with type arguments substituted.
    fn base_types(&self, ty: &TypeRef) -> Vec<TypeRef>;

    /// Check whether `ty` satisfies the constraints of `type_param` under
    /// `subst`.
    fn satisfies_constraint(
        &self,
        ty: &TypeRef,
        type_param: SymbolId,
        subst: &Substitution,
        cancel: &CancellationToken,
    ) -> SemanticResult<bool>;
}

// ============================================================================
// FactsStore Implementation
// ============================================================================

impl BinderHost for FactsStore {
    fn enclosing_scope(&self, position: usize) -> ScopeId {
        self.innermost_scope_at(position)
            .map(|s| s.scope_id)
            .unwrap_or(ScopeId::SYNTHETIC_ROOT)
    }

    fn declared_symbols(&self, scope: ScopeId) -> Vec<&Symbol> {
        self.symbols_in_scope(scope)
    }

    fn symbol_type(&self, symbol: SymbolId) -> Option<TypeRef> {
        let sym = self.symbol(symbol)?;
        match sym.kind {
            SymbolKind::Type => {
                let args = self
                    .type_params_of(symbol)
                    .iter()
                    .map(|p| TypeRef::param(*p))
                    .collect();
                Some(TypeRef::generic(symbol, args))
            }
            SymbolKind::TypeParameter => Some(TypeRef::param(symbol)),
            _ => sym.type_ref.clone(),
        }
    }

    fn implements(
        &self,
        ty: &TypeRef,
        interface: SymbolId,
        cancel: &CancellationToken,
    ) -> SemanticResult<bool> {
        hierarchy::implements(self, ty, interface, cancel)
    }

    fn find_implementation_for_interface_member(
        &self,
        ty: &TypeRef,
        interface_member: SymbolId,
        cancel: &CancellationToken,
    ) -> SemanticResult<Option<SymbolId>> {
        let Some(target) = self.symbol(interface_member) else {
            return Ok(None);
        };
        let target_arity = self.signature(interface_member).map(|s| s.params.len());

        for class in hierarchy::base_chain(self, ty, cancel)? {
            let Some(def) = class.definition() else {
                continue;
            };
            let members = self.members_of(def);

            // Explicit implementations win over implicit ones.
            if let Some(explicit) = members
                .iter()
                .find(|m| m.explicit_impl_of == Some(interface_member))
            {
                return Ok(Some(explicit.symbol_id));
            }

            let implicit = members.iter().find(|m| {
                m.kind == target.kind
                    && m.name == target.name
                    && !m.is_static()
                    && m.explicit_impl_of.is_none()
                    && m.accessibility == Accessibility::Public
                    && self.signature(m.symbol_id).map(|s| s.params.len()) == target_arity
            });
            if let Some(member) = implicit {
                return Ok(Some(member.symbol_id));
            }
        }

        Ok(None)
    }
}

impl TypeLattice for FactsStore {
    fn base_types(&self, ty: &TypeRef) -> Vec<TypeRef> {
        hierarchy::direct_supertypes(self, ty)
    }

    fn satisfies_constraint(
        &self,
        ty: &TypeRef,
        type_param: SymbolId,
        subst: &Substitution,
        cancel: &CancellationToken,
    ) -> SemanticResult<bool> {
        hierarchy::satisfies_constraints(self, ty, type_param, subst, cancel)
    }
}

// ============================================================================
// Tests
// ============================================================================
