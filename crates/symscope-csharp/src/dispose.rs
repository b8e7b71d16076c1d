//! Dispose-pattern and interceptor queries.
//!
//! A `using` statement disposes its resource through `IDisposable` (or
//! `IAsyncDisposable` for `await using`) when the type implements it. Otherwise
//! the compiler accepts a structurally matching method: a public instance
//! `Dispose()` on a ref struct, or an awaitable `DisposeAsync()` on any type.
//! The nominal lookup is tried first and the structural probe second.

use symscope_core::adapter::BinderHost;
use symscope_core::cancel::CancellationToken;
use symscope_core::error::{SemanticError, SemanticResult};
use symscope_core::facts::{
    Accessibility, FactsStore, ParamKind, Symbol, SymbolId, SymbolKind, TypeRef, WellKnownType,
};
use symscope_core::hierarchy;
use symscope_core::snapshot::Snapshot;

/// Return type a pattern method must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnConstraint {
    /// `void`.
    Void,
    /// `Task`, `ValueTask` or a constructed form of either.
    Awaitable,
    /// Anything.
    Any,
}

impl ReturnConstraint {
    fn accepts(&self, store: &FactsStore, returns: Option<&TypeRef>) -> bool {
        match self {
            ReturnConstraint::Void => returns.is_none(),
            ReturnConstraint::Awaitable => returns
                .and_then(|t| t.definition())
                .is_some_and(|def| {
                    store.is_well_known(def, WellKnownType::Task)
                        || store.is_well_known(def, WellKnownType::ValueTask)
                }),
            ReturnConstraint::Any => true,
        }
    }
}

/// First public instance method named `name` on `ty` or its base classes
/// with `param_count` required parameters and an accepted return type.
///
/// Explicit interface implementations are not callable by name and never
/// match.
pub fn find_pattern_method(
    store: &FactsStore,
    ty: &TypeRef,
    name: &str,
    returns: ReturnConstraint,
    param_count: usize,
    cancel: &CancellationToken,
) -> SemanticResult<Option<SymbolId>> {
    for class in hierarchy::base_chain(store, ty, cancel)? {
        let Some(def) = class.definition() else {
            continue;
        };
        let found = store
            .members_of(def)
            .into_iter()
            .find(|m| is_pattern_match(store, m, name, returns, param_count));
        if let Some(method) = found {
            tracing::trace!(name, method = %method.symbol_id, "pattern method found");
            return Ok(Some(method.symbol_id));
        }
    }
    Ok(None)
}

fn is_pattern_match(
    store: &FactsStore,
    method: &Symbol,
    name: &str,
    returns: ReturnConstraint,
    param_count: usize,
) -> bool {
    if method.kind != SymbolKind::Method
        || method.name != name
        || method.accessibility != Accessibility::Public
        || method.is_static()
        || method.explicit_impl_of.is_some()
    {
        return false;
    }
    let Some(signature) = store.signature(method.symbol_id) else {
        return param_count == 0 && returns.accepts(store, method.type_ref.as_ref());
    };
    let required = signature
        .params
        .iter()
        .filter(|p| !p.has_default && p.kind != ParamKind::Params)
        .count();
    required == param_count && returns.accepts(store, signature.returns.as_ref())
}

/// The method a `using` (or `await using` when `is_async`) on `ty` calls.
pub fn find_dispose_method(
    snapshot: &Snapshot,
    ty: &TypeRef,
    is_async: bool,
    cancel: &CancellationToken,
) -> SemanticResult<Option<SymbolId>> {
    cancel.check()?;
    let store = snapshot.store();
    let ty = hierarchy::normalize(store, ty);
    if ty.is_unresolved() {
        return Ok(None);
    }

    let (interface, name, returns) = if is_async {
        (WellKnownType::AsyncDisposable, "DisposeAsync", ReturnConstraint::Awaitable)
    } else {
        (WellKnownType::Disposable, "Dispose", ReturnConstraint::Void)
    };

    if let Some(interface) = store.well_known(interface) {
        if store.implements(&ty, interface, cancel)? {
            let member = store
                .members_of(interface)
                .into_iter()
                .find(|m| m.kind == SymbolKind::Method && m.name == name);
            if let Some(member) = member {
                if let Some(found) = store.find_implementation_for_interface_member(
                    &ty,
                    member.symbol_id,
                    cancel,
                )? {
                    return Ok(Some(found));
                }
                // Interfaces (and type parameters) dispose through the
                // interface member itself.
                return Ok(Some(member.symbol_id));
            }
        }
    }

    let pattern_allowed = is_async
        || ty
            .definition()
            .and_then(|d| store.type_decl(d))
            .is_some_and(|d| d.is_ref_like);
    if !pattern_allowed {
        return Ok(None);
    }
    find_pattern_method(store, &ty, name, returns, 0, cancel)
}

/// Interceptor bound to the call site at `position`.
///
/// # Errors
///
/// `InvariantViolation` if the recorded interceptor symbol is missing from
/// the snapshot.
pub fn find_interceptor(
    snapshot: &Snapshot,
    position: usize,
    cancel: &CancellationToken,
) -> SemanticResult<Option<SymbolId>> {
    cancel.check()?;
    let store = snapshot.store();
    let Some(interceptor) = store.interceptor_at(position) else {
        return Ok(None);
    };
    if store.symbol(interceptor).is_none() {
        return Err(SemanticError::invariant(format!(
            "interception at {} names missing {}",
            position, interceptor
        )));
    }
    Ok(Some(interceptor))
}
