//! Serialized form of a [`FactsStore`].
//!
//! Binder hosts running out of process hand snapshots over as JSON. The
//! serialized form carries [`FACTS_SCHEMA_VERSION`] so a reader can reject a
//! snapshot written by an incompatible host instead of misreading it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    FactsStore, Interception, ScopeInfo, Signature, Symbol, SymbolId, TypeDecl, TypeParamInfo,
    WellKnownType, FACTS_SCHEMA_VERSION,
};
use crate::error::{SemanticError, SemanticResult};

/// Flat, serializable copy of a [`FactsStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactsSnapshot {
    pub schema_version: u32,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub scopes: Vec<ScopeInfo>,
    #[serde(default)]
    pub type_decls: Vec<TypeDecl>,
    #[serde(default)]
    pub type_params: Vec<TypeParamInfo>,
    #[serde(default)]
    pub signatures: Vec<Signature>,
    #[serde(default)]
    pub interceptions: Vec<Interception>,
    #[serde(default)]
    pub well_known: Vec<(WellKnownType, SymbolId)>,
}

impl FactsStore {
    /// Copy the store into its serializable form.
    pub fn to_snapshot(&self) -> FactsSnapshot {
        FactsSnapshot {
            schema_version: self.schema_version,
            symbols: self.symbols().cloned().collect(),
            scopes: self.scopes().cloned().collect(),
            type_decls: self.type_decls().cloned().collect(),
            type_params: self.type_param_infos().cloned().collect(),
            signatures: self.signatures().cloned().collect(),
            interceptions: self.interceptions().cloned().collect(),
            well_known: self.well_known_types().collect(),
        }
    }

    /// Rebuild a store (and its indexes) from the serialized form.
    ///
    /// # Errors
    ///
    /// - `InvalidSnapshot` if the schema version differs from
    ///   [`FACTS_SCHEMA_VERSION`]
    /// - `InvariantViolation` if the rebuilt store fails [`FactsStore::validate`]
    pub fn from_snapshot(snapshot: FactsSnapshot) -> SemanticResult<FactsStore> {
        if snapshot.schema_version != FACTS_SCHEMA_VERSION {
            return Err(SemanticError::invalid_snapshot(format!(
                "schema version {}, expected {}",
                snapshot.schema_version, FACTS_SCHEMA_VERSION
            )));
        }

        let mut store = FactsStore::new();
        for scope in snapshot.scopes {
            store.insert_scope(scope);
        }
        for symbol in snapshot.symbols {
            store.insert_symbol(symbol);
        }
        for decl in snapshot.type_decls {
            store.insert_type_decl(decl);
        }
        for param in snapshot.type_params {
            store.insert_type_param(param);
        }
        for signature in snapshot.signatures {
            store.insert_signature(signature);
        }
        for interception in snapshot.interceptions {
            store.insert_interception(interception);
        }
        for (kind, id) in snapshot.well_known {
            store.register_well_known(kind, id);
        }

        store.validate()?;
        tracing::debug!(
            symbols = store.symbol_count(),
            scopes = store.scope_count(),
            "loaded facts snapshot"
        );
        Ok(store)
    }

    /// Serialize the store to pretty-printed JSON.
    pub fn to_json(&self) -> SemanticResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    /// Deserialize a store from JSON.
    pub fn from_json(json: &str) -> SemanticResult<FactsStore> {
        let snapshot: FactsSnapshot = serde_json::from_str(json)?;
        FactsStore::from_snapshot(snapshot)
    }

    /// Load a store from a JSON file.
    pub fn load(path: &Path) -> SemanticResult<FactsStore> {
        let json = std::fs::read_to_string(path)?;
        FactsStore::from_json(&json)
    }
}
