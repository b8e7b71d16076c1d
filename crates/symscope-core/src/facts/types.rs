//! Structured type references.
//!
//! [`TypeRef`] is the type language shared by symbols, signatures, base-type
//! lists and generic constraints. Generic definitions are referenced by the
//! [`SymbolId`] of their type symbol; type parameters by the [`SymbolId`] of
//! their `TypeParameter` symbol. A [`Substitution`] maps type parameters to
//! type arguments and is applied when walking from a constructed type into the
//! members and bases of its definition.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{FactsStore, SymbolId};

/// A reference to a type.
///
/// # Examples
///
/// ```
/// use symscope_core::facts::{SymbolId, TypeRef};
///
/// let list = SymbolId::new(7);
/// let int32 = SymbolId::new(3);
///
/// // List<Int32>
/// let ty = TypeRef::generic(list, vec![TypeRef::named(int32)]);
/// assert_eq!(ty.definition(), Some(list));
/// assert!(!ty.is_unresolved());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    /// A named type, possibly constructed with type arguments.
    ///
    /// Also used by alias symbols to point at a namespace symbol.
    Named {
        symbol_id: SymbolId,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<TypeRef>,
    },
    /// A type parameter of a generic type or method.
    Param { symbol_id: SymbolId },
    /// `T?`. For value types this is the nullable wrapper type; for reference
    /// types it is only an annotation.
    Nullable { inner: Box<TypeRef> },
    /// `T[]`, `T[,]`, ...
    Array { element: Box<TypeRef>, rank: u32 },
    /// The binder could not determine the type.
    Unresolved,
}

impl TypeRef {
    /// A non-generic named type.
    pub fn named(symbol_id: SymbolId) -> Self {
        TypeRef::Named {
            symbol_id,
            args: Vec::new(),
        }
    }

    /// A constructed generic type.
    pub fn generic(symbol_id: SymbolId, args: Vec<TypeRef>) -> Self {
        TypeRef::Named { symbol_id, args }
    }

    /// A type parameter reference.
    pub fn param(symbol_id: SymbolId) -> Self {
        TypeRef::Param { symbol_id }
    }

    /// `inner?`
    pub fn nullable(inner: TypeRef) -> Self {
        TypeRef::Nullable {
            inner: Box::new(inner),
        }
    }

    /// Single-dimensional array of `element`.
    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array {
            element: Box::new(element),
            rank: 1,
        }
    }

    /// The definition symbol of a named type.
    pub fn definition(&self) -> Option<SymbolId> {
        match self {
            TypeRef::Named { symbol_id, .. } => Some(*symbol_id),
            _ => None,
        }
    }

    /// Type arguments of a named type (empty otherwise).
    pub fn type_args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            _ => &[],
        }
    }

    /// Check whether this type, or any type nested in it, is unresolved.
    pub fn is_unresolved(&self) -> bool {
        match self {
            TypeRef::Unresolved => true,
            TypeRef::Named { args, .. } => args.iter().any(TypeRef::is_unresolved),
            TypeRef::Param { .. } => false,
            TypeRef::Nullable { inner } => inner.is_unresolved(),
            TypeRef::Array { element, .. } => element.is_unresolved(),
        }
    }

    /// Check whether any type parameter in `params` occurs in this type.
    pub fn mentions_any(&self, params: &[SymbolId]) -> bool {
        match self {
            TypeRef::Param { symbol_id } => params.contains(symbol_id),
            TypeRef::Named { args, .. } => args.iter().any(|a| a.mentions_any(params)),
            TypeRef::Nullable { inner } => inner.mentions_any(params),
            TypeRef::Array { element, .. } => element.mentions_any(params),
            TypeRef::Unresolved => false,
        }
    }

    /// Apply a substitution, replacing mapped type parameters.
    pub fn substitute(&self, subst: &Substitution) -> TypeRef {
        if subst.is_empty() {
            return self.clone();
        }
        match self {
            TypeRef::Param { symbol_id } => subst
                .get(*symbol_id)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeRef::Named { symbol_id, args } => TypeRef::Named {
                symbol_id: *symbol_id,
                args: args.iter().map(|a| a.substitute(subst)).collect(),
            },
            TypeRef::Nullable { inner } => TypeRef::Nullable {
                inner: Box::new(inner.substitute(subst)),
            },
            TypeRef::Array { element, rank } => TypeRef::Array {
                element: Box::new(element.substitute(subst)),
                rank: *rank,
            },
            TypeRef::Unresolved => TypeRef::Unresolved,
        }
    }

    /// Render the type for display (`List<Int32>`, `Int32?`, `T[]`).
    pub fn display(&self, store: &FactsStore) -> String {
        match self {
            TypeRef::Named { symbol_id, args } => {
                let name = store
                    .symbol(*symbol_id)
                    .map(|s| s.name.as_str())
                    .unwrap_or("?");
                if args.is_empty() {
                    name.to_string()
                } else {
                    let rendered: Vec<String> = args.iter().map(|a| a.display(store)).collect();
                    format!("{}<{}>", name, rendered.join(", "))
                }
            }
            TypeRef::Param { symbol_id } => store
                .symbol(*symbol_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "?".to_string()),
            TypeRef::Nullable { inner } => format!("{}?", inner.display(store)),
            TypeRef::Array { element, rank } => {
                let commas = ",".repeat(rank.saturating_sub(1) as usize);
                format!("{}[{}]", element.display(store), commas)
            }
            TypeRef::Unresolved => "?".to_string(),
        }
    }
}

/// A mapping from type parameters to type arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    map: HashMap<SymbolId, TypeRef>,
}

impl Substitution {
    /// Create an empty substitution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair up `params` with `args`. Extra entries on either side are ignored.
    pub fn from_pairs(params: &[SymbolId], args: &[TypeRef]) -> Self {
        let map = params
            .iter()
            .copied()
            .zip(args.iter().cloned())
            .collect::<HashMap<_, _>>();
        Substitution { map }
    }

    /// Bind a type parameter.
    pub fn insert(&mut self, param: SymbolId, arg: TypeRef) {
        self.map.insert(param, arg);
    }

    /// Look up the binding for a type parameter.
    pub fn get(&self, param: SymbolId) -> Option<&TypeRef> {
        self.map.get(&param)
    }

    /// Check if the substitution binds nothing.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of bound type parameters.
    pub fn len(&self) -> usize {
        self.map.len()
    }
}
