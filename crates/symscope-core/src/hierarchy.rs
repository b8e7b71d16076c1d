//! Type-hierarchy walks over the facts store.
//!
//! This module answers the type-lattice questions the applicability rules
//! need: what are the supertypes of a (possibly constructed) type, does a
//! type derive from an exact closed instantiation, and does a type argument
//! satisfy the constraints of a type parameter.
//!
//! # Algorithm
//!
//! Supertypes are collected depth-first, base class before interfaces, with
//! type arguments substituted at every step:
//!
//! ```text
//! class Base<T> : IFace<T[]> { }
//! class Derived : Base<Int32> { }
//!
//! supertypes(Derived) = [Derived, Base<Int32>, Object, IFace<Int32[]>]
//! ```
//!
//! Types without an explicit base get an implicit one from the well-known
//! registry: classes derive from `Object`, structs from `ValueType`, enums
//! from `Enum`. A value-type `T?` is treated as the constructed
//! `Nullable<T>`; a reference-type `T?` is only an annotation and behaves
//! as `T`.
//!
//! # Cycles
//!
//! A type that appears in its own ancestry is an inheritance cycle. That is a
//! binder bug and is reported as `InvariantViolation` rather than cut short.

use std::collections::HashSet;

use crate::cancel::CancellationToken;
use crate::error::{SemanticError, SemanticResult};
use crate::facts::{
    FactsStore, Modifier, Substitution, SymbolId, SymbolKind, TypeKind, TypeRef, WellKnownType,
};

// ============================================================================
// Normalization
// ============================================================================

/// Rewrite `T?` to the type lookup should walk.
///
/// Value types become `Nullable<T>`; reference types drop the annotation.
/// Other types are returned unchanged.
pub fn normalize(store: &FactsStore, ty: &TypeRef) -> TypeRef {
    match ty {
        TypeRef::Nullable { inner } => {
            let inner = normalize(store, inner);
            if is_value_type(store, &inner) {
                match store.well_known(WellKnownType::Nullable) {
                    Some(nullable) => TypeRef::generic(nullable, vec![inner]),
                    None => TypeRef::nullable(inner),
                }
            } else {
                inner
            }
        }
        _ => ty.clone(),
    }
}

/// If `ty` is a constructed `Nullable<T>` (or value-type `T?`), return `T`.
pub fn nullable_underlying(store: &FactsStore, ty: &TypeRef) -> Option<TypeRef> {
    match normalize(store, ty) {
        TypeRef::Named { symbol_id, args }
            if store.is_well_known(symbol_id, WellKnownType::Nullable) && args.len() == 1 =>
        {
            args.into_iter().next()
        }
        _ => None,
    }
}

/// Check whether values of `ty` are value types.
pub fn is_value_type(store: &FactsStore, ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Named { symbol_id, .. } => store
            .type_decl(*symbol_id)
            .map(|d| d.kind.is_value_type())
            .unwrap_or(false),
        TypeRef::Param { symbol_id } => store
            .type_param(*symbol_id)
            .map(|p| p.value_type)
            .unwrap_or(false),
        TypeRef::Nullable { inner } => is_value_type(store, inner),
        TypeRef::Array { .. } | TypeRef::Unresolved => false,
    }
}

/// Substitution mapping a generic definition's type parameters to the type
/// arguments of `ty`.
pub fn substitution_for(store: &FactsStore, ty: &TypeRef) -> Substitution {
    match ty {
        TypeRef::Named { symbol_id, args } if !args.is_empty() => {
            Substitution::from_pairs(store.type_params_of(*symbol_id), args)
        }
        _ => Substitution::new(),
    }
}

// ============================================================================
// Supertypes
// ============================================================================

/// Immediate supertypes of a type, with type arguments substituted.
pub fn direct_supertypes(store: &FactsStore, ty: &TypeRef) -> Vec<TypeRef> {
    let ty = normalize(store, ty);
    match &ty {
        TypeRef::Named { symbol_id, .. } => {
            let Some(decl) = store.type_decl(*symbol_id) else {
                return Vec::new();
            };
            let subst = substitution_for(store, &ty);
            let mut result = Vec::new();

            match &decl.base {
                Some(base) => result.push(base.substitute(&subst)),
                None => {
                    if let Some(implicit) = implicit_base(store, *symbol_id, decl.kind) {
                        result.push(TypeRef::named(implicit));
                    }
                }
            }
            result.extend(decl.interfaces.iter().map(|i| i.substitute(&subst)));
            result
        }
        TypeRef::Param { symbol_id } => {
            let mut result: Vec<TypeRef> = store
                .type_param(*symbol_id)
                .map(|p| p.constraints.clone())
                .unwrap_or_default();
            let has_class_constraint = result.iter().any(|c| {
                c.definition()
                    .and_then(|d| store.type_decl(d))
                    .is_some_and(|d| d.kind != TypeKind::Interface)
            });
            if !has_class_constraint {
                let root = if is_value_type(store, &ty) {
                    store.well_known(WellKnownType::ValueType)
                } else {
                    store.well_known(WellKnownType::Object)
                };
                result.extend(root.map(TypeRef::named));
            }
            result
        }
        TypeRef::Array { .. } => store
            .well_known(WellKnownType::Object)
            .map(TypeRef::named)
            .into_iter()
            .collect(),
        TypeRef::Nullable { .. } | TypeRef::Unresolved => Vec::new(),
    }
}

fn implicit_base(store: &FactsStore, symbol_id: SymbolId, kind: TypeKind) -> Option<SymbolId> {
    let implicit = match kind {
        TypeKind::Interface => return None,
        TypeKind::Struct | TypeKind::RecordStruct => store.well_known(WellKnownType::ValueType),
        TypeKind::Enum => store.well_known(WellKnownType::Enum),
        TypeKind::Class | TypeKind::Record | TypeKind::Delegate => {
            store.well_known(WellKnownType::Object)
        }
    };
    implicit.filter(|id| *id != symbol_id)
}

/// All supertypes of `ty`, starting with `ty` itself.
///
/// Diamond-inherited interfaces appear once. Order is depth-first with the
/// base class visited before interfaces.
///
/// # Errors
///
/// - `Cancelled` if the token fires
/// - `InvariantViolation` on an inheritance cycle
pub fn supertypes(
    store: &FactsStore,
    ty: &TypeRef,
    cancel: &CancellationToken,
) -> SemanticResult<Vec<TypeRef>> {
    let mut result = Vec::new();
    let mut seen = HashSet::new();
    let mut path = Vec::new();
    collect_supertypes(store, &normalize(store, ty), cancel, &mut path, &mut seen, &mut result)?;
    Ok(result)
}

fn collect_supertypes(
    store: &FactsStore,
    ty: &TypeRef,
    cancel: &CancellationToken,
    path: &mut Vec<SymbolId>,
    seen: &mut HashSet<TypeRef>,
    result: &mut Vec<TypeRef>,
) -> SemanticResult<()> {
    cancel.check()?;

    let definition = match ty {
        TypeRef::Named { symbol_id, .. } | TypeRef::Param { symbol_id } => Some(*symbol_id),
        _ => None,
    };
    if let Some(def) = definition {
        if path.contains(&def) {
            let name = store.symbol(def).map(|s| s.name.as_str()).unwrap_or("?");
            return Err(SemanticError::invariant(format!(
                "inheritance cycle through '{}' ({})",
                name, def
            )));
        }
    }
    if !seen.insert(ty.clone()) {
        return Ok(());
    }
    result.push(ty.clone());

    if let Some(def) = definition {
        path.push(def);
    }
    for parent in direct_supertypes(store, ty) {
        collect_supertypes(store, &normalize(store, &parent), cancel, path, seen, result)?;
    }
    if definition.is_some() {
        path.pop();
    }
    Ok(())
}

/// The class chain of `ty`: the type itself, its base, its base's base, ...
///
/// Interfaces are not included.
pub fn base_chain(
    store: &FactsStore,
    ty: &TypeRef,
    cancel: &CancellationToken,
) -> SemanticResult<Vec<TypeRef>> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(normalize(store, ty));

    while let Some(ty) = current {
        cancel.check()?;
        if let Some(def) = ty.definition() {
            if !visited.insert(def) {
                return Err(SemanticError::invariant(format!(
                    "inheritance cycle in base chain at {}",
                    def
                )));
            }
        }
        let next = direct_supertypes(store, &ty).into_iter().find(|t| {
            t.definition()
                .and_then(|d| store.type_decl(d))
                .is_some_and(|d| d.kind != TypeKind::Interface)
        });
        chain.push(ty);
        current = next.map(|t| normalize(store, &t));
    }

    Ok(chain)
}

/// The first supertype of `ty` whose definition is `definition`.
///
/// Used to find the constructed form of a generic base
/// (`Derived` → `Base<Int32>`) before substituting into inherited members.
pub fn find_supertype(
    store: &FactsStore,
    ty: &TypeRef,
    definition: SymbolId,
    cancel: &CancellationToken,
) -> SemanticResult<Option<TypeRef>> {
    Ok(supertypes(store, ty, cancel)?
        .into_iter()
        .find(|t| t.definition() == Some(definition)))
}

/// Check whether `ty` is `target` or derives from the exact closed `target`.
///
/// `List<Int32>` does not match `List<String>`; only identical type arguments
/// count. An unresolved type never matches.
pub fn is_same_or_derived(
    store: &FactsStore,
    ty: &TypeRef,
    target: &TypeRef,
    cancel: &CancellationToken,
) -> SemanticResult<bool> {
    if ty.is_unresolved() || target.is_unresolved() {
        return Ok(false);
    }
    let target = normalize(store, target);
    Ok(supertypes(store, ty, cancel)?.contains(&target))
}

/// Check whether `ty` implements (or is) the interface definition
/// `interface`, with any type arguments.
pub fn implements(
    store: &FactsStore,
    ty: &TypeRef,
    interface: SymbolId,
    cancel: &CancellationToken,
) -> SemanticResult<bool> {
    Ok(find_supertype(store, ty, interface, cancel)?.is_some())
}

// ============================================================================
// Constraints
// ============================================================================

/// Check whether `arg` satisfies the constraints of type parameter `param`.
///
/// Constraint types are substituted with `subst` first, so self-referential
/// constraints (`where T : List<T>`) are checked against the closed form
/// (`List<Arg>`).
pub fn satisfies_constraints(
    store: &FactsStore,
    arg: &TypeRef,
    param: SymbolId,
    subst: &Substitution,
    cancel: &CancellationToken,
) -> SemanticResult<bool> {
    if arg.is_unresolved() {
        return Ok(false);
    }
    let Some(info) = store.type_param(param) else {
        return Ok(true);
    };

    let arg_is_value = is_value_type(store, arg);
    let arg_is_nullable_value = nullable_underlying(store, arg).is_some();
    if info.value_type && (!arg_is_value || arg_is_nullable_value) {
        return Ok(false);
    }
    if info.reference_type && arg_is_value {
        return Ok(false);
    }

    for constraint in &info.constraints {
        cancel.check()?;
        let constraint = constraint.substitute(subst);
        if !is_same_or_derived(store, arg, &constraint, cancel)? {
            tracing::trace!(
                param = %param,
                constraint = %constraint.display(store),
                "type argument fails constraint"
            );
            return Ok(false);
        }
    }
    Ok(true)
}

/// Check whether a symbol is a static class.
pub fn is_static_type(store: &FactsStore, symbol_id: SymbolId) -> bool {
    store
        .symbol(symbol_id)
        .is_some_and(|s| s.kind == SymbolKind::Type && s.has_modifier(Modifier::Static))
}

// ============================================================================
// Tests
// ============================================================================
