//! Lexical symbol lookup.
//!
//! [`lookup`] walks the scope chain from the innermost scope at a position
//! out to the global namespace and records every symbol it meets together
//! with a [`Verdict`]. Symbols that cannot be referenced are kept with the
//! reason, so callers can tell "hidden" from "never declared".
//!
//! ## Walk
//!
//! ```text
//! block / switch arm / query      declared symbols
//! lambda / local function / method  parameters, locals, type parameters
//! type                            type parameters, then members (own + inherited)
//! namespace                       declared types and namespaces, then imports
//! ```
//!
//! - A name seen in an inner scope shadows the same name further out.
//! - Locals are only usable after their declaration, but a later local still
//!   hides an outer symbol of the same name.
//! - Local functions and labels are visible throughout their scope.
//! - Leaving a `static` method, lambda or local function makes instance
//!   members unusable; leaving a `static` lambda or local function also makes
//!   outer locals unusable (constants excepted).
//! - Leaving the innermost type makes outer types' instance members unusable.
//! - Inside `nameof(...)` instance members and captures are allowed again.

use std::collections::HashSet;

use symscope_core::adapter::BinderHost;
use symscope_core::cancel::CancellationToken;
use symscope_core::error::{SemanticError, SemanticResult};
use symscope_core::facts::{
    FactsStore, Modifier, ScopeId, ScopeInfo, ScopeKind, Symbol, SymbolId, SymbolKind, TypeRef,
};
use symscope_core::snapshot::Snapshot;

use crate::access::AccessSite;
use crate::applicability::{Exclusion, Verdict};
use crate::members::type_members;
use crate::options::AnalysisOptions;

/// How a symbol entered the lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Declared in a scope on the chain (or a member of the enclosing type).
    Declared,
    /// Member inherited from a base type.
    Inherited,
    /// Type brought in by a `using` namespace import.
    Imported,
    /// Extension method reduced onto a receiver.
    Extension,
}

/// One symbol met during lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupEntry {
    pub symbol_id: SymbolId,
    /// Constructed type the symbol was found on, for members.
    pub via: Option<TypeRef>,
    pub verdict: Verdict,
    pub origin: Origin,
}

impl LookupEntry {
    /// Check if the symbol can be referenced.
    pub fn is_visible(&self) -> bool {
        self.verdict.is_applicable()
    }
}

/// Result of a lexical lookup, innermost scope first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    /// Innermost scope at the position.
    pub scope: ScopeId,
    pub entries: Vec<LookupEntry>,
    /// `this` and `base` denote an instance of the innermost type here.
    pub has_instance: bool,
}

impl LookupOutcome {
    fn empty() -> Self {
        LookupOutcome {
            scope: ScopeId::SYNTHETIC_ROOT,
            entries: Vec::new(),
            has_instance: false,
        }
    }

    /// Entries that can be referenced.
    pub fn visible(&self) -> impl Iterator<Item = &LookupEntry> {
        self.entries.iter().filter(|e| e.is_visible())
    }

    /// IDs of the symbols that can be referenced.
    pub fn visible_ids(&self) -> Vec<SymbolId> {
        self.visible().map(|e| e.symbol_id).collect()
    }

    /// The entry recorded for a symbol, if lookup met it.
    pub fn entry(&self, symbol_id: SymbolId) -> Option<&LookupEntry> {
        self.entries.iter().find(|e| e.symbol_id == symbol_id)
    }

    /// The innermost visible symbol called `name`.
    pub fn find_visible(
        &self,
        store: &FactsStore,
        name: &str,
        options: &AnalysisOptions,
    ) -> Option<&LookupEntry> {
        let wanted = options.fold_name(name);
        self.visible().find(|e| {
            store
                .symbol(e.symbol_id)
                .is_some_and(|s| options.fold_name(&s.name) == wanted)
        })
    }
}

/// Nearest local declaration space (block, function body, parameter list)
/// containing `position`.
///
/// An explicit `container` wins when it exists. Positions outside any local
/// declaration space resolve to the innermost scope; positions outside every
/// scope resolve to [`ScopeId::SYNTHETIC_ROOT`].
pub fn enclosing_scope(
    store: &FactsStore,
    position: usize,
    container: Option<ScopeId>,
    cancel: &CancellationToken,
) -> SemanticResult<ScopeId> {
    if let Some(container) = container {
        if store.scope(container).is_some() {
            return Ok(container);
        }
        tracing::warn!(scope = %container, "container scope not in snapshot");
        return Ok(ScopeId::SYNTHETIC_ROOT);
    }

    let innermost = store.enclosing_scope(position);
    if innermost.is_synthetic_root() {
        tracing::debug!(position, "no scope at position");
        return Ok(innermost);
    }

    for id in store.ancestors(innermost)? {
        cancel.check()?;
        if store
            .scope(id)
            .is_some_and(|s| s.kind.is_local_declaration_space())
        {
            return Ok(id);
        }
    }
    Ok(innermost)
}

/// Look up every symbol reachable from `position`.
///
/// # Errors
///
/// - `Cancelled` if the token fires (checked once per scope)
/// - `InvariantViolation` if the scope chain is broken
pub fn lookup(
    store: &FactsStore,
    position: usize,
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<LookupOutcome> {
    cancel.check()?;
    let start = store.enclosing_scope(position);
    if start.is_synthetic_root() {
        return Ok(LookupOutcome::empty());
    }

    let site = AccessSite::at(store, start)?;
    let mut walk = Walk {
        store,
        options,
        site: &site,
        position,
        instance_available: true,
        captures_available: true,
        in_nameof: false,
        seen: HashSet::new(),
        entries: Vec::new(),
    };

    let mut has_instance = None;
    for scope_id in store.ancestors(start)? {
        cancel.check()?;
        let scope = store.scope(scope_id).ok_or_else(|| {
            SemanticError::invariant(format!("scope chain references missing {}", scope_id))
        })?;
        if scope.kind == ScopeKind::Type && has_instance.is_none() {
            has_instance = Some(walk.instance_available);
        }
        walk.visit(scope, cancel)?;
    }

    tracing::debug!(
        position,
        scope = %start,
        entries = walk.entries.len(),
        visible = walk.entries.iter().filter(|e| e.is_visible()).count(),
        "lookup complete"
    );
    Ok(LookupOutcome {
        scope: start,
        entries: walk.entries,
        has_instance: has_instance.unwrap_or(false),
    })
}

/// Symbols that can be referenced at `position`.
///
/// Order follows the walk (inner scopes first); callers that need a stable
/// presentation order sort by name.
pub fn visible_symbols<'s>(
    snapshot: &'s Snapshot,
    position: usize,
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<Vec<&'s Symbol>> {
    let store = snapshot.store();
    let outcome = lookup(store, position, options, cancel)?;
    Ok(outcome
        .visible()
        .filter_map(|e| store.symbol(e.symbol_id))
        .collect())
}

// ============================================================================
// Walk
// ============================================================================

struct Walk<'a> {
    store: &'a FactsStore,
    options: &'a AnalysisOptions,
    site: &'a AccessSite,
    position: usize,
    instance_available: bool,
    captures_available: bool,
    in_nameof: bool,
    /// Folded names already bound by an inner scope.
    seen: HashSet<String>,
    entries: Vec<LookupEntry>,
}

type Level = Vec<(SymbolId, Option<TypeRef>, Origin)>;

impl Walk<'_> {
    fn visit(&mut self, scope: &ScopeInfo, cancel: &CancellationToken) -> SemanticResult<()> {
        match scope.kind {
            ScopeKind::Nameof => self.in_nameof = true,
            ScopeKind::AttributeArgument => self.instance_available = false,
            _ => {}
        }

        for level in self.levels(scope, cancel)? {
            self.record_level(level, cancel)?;
        }

        if scope.kind.is_function_like() && self.is_static_function(scope) {
            self.instance_available = false;
            if matches!(scope.kind, ScopeKind::LocalFunction | ScopeKind::Lambda) {
                self.captures_available = false;
            }
        }
        if scope.kind == ScopeKind::Type {
            self.instance_available = false;
        }
        Ok(())
    }

    /// Groups of symbols contributed by a scope; names bound in one group
    /// shadow the later groups.
    fn levels(&self, scope: &ScopeInfo, cancel: &CancellationToken) -> SemanticResult<Vec<Level>> {
        let store = self.store;
        let declared = |filter: fn(&Symbol) -> bool| -> Level {
            store
                .symbols_in_scope(scope.scope_id)
                .into_iter()
                .filter(|s| filter(s))
                .map(|s| (s.symbol_id, None, Origin::Declared))
                .collect()
        };

        Ok(match scope.kind {
            ScopeKind::Type => {
                let type_params = declared(|s| s.kind == SymbolKind::TypeParameter);
                let members = match scope.owner.and_then(|o| store.symbol_type(o)) {
                    Some(self_type) => type_members(store, &self_type, cancel)?
                        .into_iter()
                        .map(|m| {
                            let origin = if m.inherited {
                                Origin::Inherited
                            } else {
                                Origin::Declared
                            };
                            (m.symbol_id, Some(m.declaring_type), origin)
                        })
                        .collect(),
                    None => declared(|s| s.kind.is_member()),
                };
                vec![type_params, members]
            }
            ScopeKind::Namespace => {
                let own = declared(|_| true);
                let mut imported = Level::new();
                for namespace in &scope.imports {
                    let Some(ns_scope) = store.scope_owned_by(*namespace) else {
                        tracing::debug!(namespace = %namespace, "import has no namespace scope");
                        continue;
                    };
                    imported.extend(
                        store
                            .symbols_in_scope(ns_scope.scope_id)
                            .into_iter()
                            .filter(|s| s.kind == SymbolKind::Type)
                            .map(|s| (s.symbol_id, None, Origin::Imported)),
                    );
                }
                vec![own, imported]
            }
            _ => {
                let mut level = declared(|_| true);
                if let Some(owner) = scope.owner {
                    for param in store.type_params_of(owner) {
                        if !level.iter().any(|(id, _, _)| id == param) {
                            level.push((*param, None, Origin::Declared));
                        }
                    }
                }
                vec![level]
            }
        })
    }

    fn record_level(&mut self, level: Level, cancel: &CancellationToken) -> SemanticResult<()> {
        let mut bound = Vec::new();
        for (symbol_id, via, origin) in level {
            let Some(symbol) = self.store.symbol(symbol_id) else {
                return Err(SemanticError::invariant(format!(
                    "scope lists missing symbol {}",
                    symbol_id
                )));
            };
            let key = self.options.fold_name(&symbol.name);
            let verdict = if self.seen.contains(&key) {
                Verdict::NotApplicable(Exclusion::Shadowed)
            } else {
                self.scoping_verdict(symbol, cancel)?
            };
            // Inaccessible members do not hide outer names.
            if !matches!(
                verdict,
                Verdict::NotApplicable(Exclusion::Shadowed | Exclusion::Inaccessible)
            ) {
                bound.push(key);
            }
            self.entries.push(LookupEntry {
                symbol_id,
                via,
                verdict,
                origin,
            });
        }
        self.seen.extend(bound);
        Ok(())
    }

    fn scoping_verdict(
        &self,
        symbol: &Symbol,
        cancel: &CancellationToken,
    ) -> SemanticResult<Verdict> {
        if symbol.kind.is_textually_scoped() && !symbol.is_declared_before(self.position) {
            return Ok(Verdict::NotApplicable(Exclusion::DeclaredLater));
        }

        let is_capture = matches!(
            symbol.kind,
            SymbolKind::Local
                | SymbolKind::Parameter
                | SymbolKind::RangeVariable
                | SymbolKind::PatternVariable
        );
        if is_capture && !self.captures_available && !symbol.is_constant() && !self.in_nameof {
            return Ok(Verdict::NotApplicable(Exclusion::CapturedInStaticFunction));
        }

        if symbol.kind.is_member() {
            if !self.site.can_access(self.store, symbol, cancel)? {
                return Ok(Verdict::NotApplicable(Exclusion::Inaccessible));
            }
            if symbol.is_instance_member() && !self.instance_available && !self.in_nameof {
                return Ok(Verdict::NotApplicable(Exclusion::InstanceInStaticContext));
            }
        }

        Ok(Verdict::Applicable)
    }

    fn is_static_function(&self, scope: &ScopeInfo) -> bool {
        scope.is_static
            || scope
                .owner
                .and_then(|o| self.store.symbol(o))
                .is_some_and(|s| s.has_modifier(Modifier::Static))
    }
}

// ============================================================================
// Tests
// ============================================================================
