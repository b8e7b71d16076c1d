//! Completion candidates.
//!
//! [`completion_candidates`] turns the applicable symbols at a request into
//! the list an editor shows: filtered by the typed prefix, method overloads
//! collapsed into one entry, sorted by display name.
//! [`evaluate_candidates`] returns every considered symbol, excluded ones
//! included, each with its verdict.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use symscope_core::cancel::CancellationToken;
use symscope_core::error::SemanticResult;
use symscope_core::facts::{FactsStore, Symbol, SymbolId, SymbolKind, TypeRef};
use symscope_core::hierarchy;
use symscope_core::snapshot::Snapshot;

use crate::applicability::{self, Evaluation, Verdict};
use crate::lookup::Origin;
use crate::members::Receiver;
use crate::options::AnalysisOptions;

/// Where completion was requested, and optionally on what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Byte offset of the cursor.
    pub position: usize,
    /// Receiver bound by the host; when absent it is resolved from the text
    /// before `.` or `?.`.
    pub receiver: Option<Receiver>,
}

impl CompletionRequest {
    /// Request at a cursor position.
    pub fn at(position: usize) -> Self {
        CompletionRequest {
            position,
            receiver: None,
        }
    }

    /// Use a receiver bound by the host.
    pub fn with_receiver(mut self, receiver: Receiver) -> Self {
        self.receiver = Some(receiver);
        self
    }
}

/// Presentation hints for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateTag {
    ExtensionMethod,
    Inherited,
    Obsolete,
    Static,
    Generic,
}

/// One completion entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionCandidate {
    pub symbol_id: SymbolId,
    pub name: String,
    /// Name as displayed (`List<>` for generic symbols when enabled).
    pub display_name: String,
    pub kind: SymbolKind,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<CandidateTag>,
    /// Further distinct overloads collapsed into this entry.
    pub overload_count: usize,
    /// Rendered type or parameter list (`(Int32 index)`, `List<Int32>`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl CompletionCandidate {
    /// Check if the candidate may be inserted.
    pub fn is_applicable(&self) -> bool {
        self.verdict.is_applicable()
    }
}

/// Every symbol considered at the request with its verdict, sorted by
/// display name. Overloads are not collapsed.
pub fn evaluate_candidates(
    snapshot: &Snapshot,
    request: &CompletionRequest,
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<Vec<CompletionCandidate>> {
    let store = snapshot.store();
    let set = applicability::evaluate(snapshot, request, options, cancel)?;

    let mut seen = HashSet::new();
    let mut candidates: Vec<CompletionCandidate> = set
        .evaluations
        .iter()
        .filter(|e| seen.insert(e.symbol_id))
        .filter_map(|e| Rendered::new(store, e, options))
        .map(|r| r.into_candidate(0))
        .collect();
    sort_candidates(&mut candidates);
    Ok(candidates)
}

/// Applicable symbols at the request matching the typed prefix, with
/// overloads collapsed and sorted by display name.
pub fn completion_candidates(
    snapshot: &Snapshot,
    request: &CompletionRequest,
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<Vec<CompletionCandidate>> {
    let store = snapshot.store();
    let set = applicability::evaluate(snapshot, request, options, cancel)?;
    let prefix = set.context.prefix.to_lowercase();

    let mut seen = HashSet::new();
    let rendered: Vec<Rendered> = set
        .evaluations
        .iter()
        .filter(|e| e.verdict.is_applicable())
        .filter(|e| seen.insert(e.symbol_id))
        .filter_map(|e| Rendered::new(store, e, options))
        .filter(|r| r.symbol.name.to_lowercase().starts_with(&prefix))
        .collect();

    let mut candidates = if options.collapse_overloads {
        collapse_overloads(rendered)
    } else {
        rendered.into_iter().map(|r| r.into_candidate(0)).collect()
    };
    sort_candidates(&mut candidates);

    tracing::debug!(
        position = request.position,
        prefix = %set.context.prefix,
        considered = set.evaluations.len(),
        offered = candidates.len(),
        "completion candidates"
    );
    Ok(candidates)
}

// ============================================================================
// Rendering
// ============================================================================

struct Rendered<'s> {
    symbol: &'s Symbol,
    verdict: Verdict,
    origin: Origin,
    generic: bool,
    display_name: String,
    /// Parameter types after substitution, for methods.
    params: Option<Vec<TypeRef>>,
    signature: Option<String>,
}

impl<'s> Rendered<'s> {
    fn new(
        store: &'s FactsStore,
        evaluation: &Evaluation,
        options: &AnalysisOptions,
    ) -> Option<Self> {
        let symbol = store.symbol(evaluation.symbol_id)?;
        let generic = is_generic(store, symbol);
        let display_name = if generic && options.generic_display_suffix {
            format!("{}<>", symbol.name)
        } else {
            symbol.name.clone()
        };

        let via = evaluation
            .via
            .as_ref()
            .filter(|_| evaluation.origin != Origin::Extension)
            .map(|v| hierarchy::substitution_for(store, v))
            .unwrap_or_default();
        let close = |t: &TypeRef| t.substitute(&via).substitute(&evaluation.inferred);

        let (params, signature) = match symbol.kind {
            SymbolKind::Method | SymbolKind::LocalFunction => {
                let (params, rendered) = match store.signature(symbol.symbol_id) {
                    Some(sig) => {
                        let reduced = evaluation.origin == Origin::Extension;
                        let skip = usize::from(reduced && sig.this_param().is_some());
                        let params: Vec<_> = sig.params.iter().skip(skip).collect();
                        let types: Vec<_> = params.iter().map(|p| close(&p.type_ref)).collect();
                        let text = params
                            .iter()
                            .zip(&types)
                            .map(|(p, t)| format!("{} {}", t.display(store), p.name))
                            .collect::<Vec<_>>()
                            .join(", ");
                        (types, format!("({})", text))
                    }
                    None => (Vec::new(), "()".to_string()),
                };
                (Some(params), Some(rendered))
            }
            SymbolKind::Type
            | SymbolKind::TypeParameter
            | SymbolKind::Namespace
            | SymbolKind::Label => (None, None),
            _ => (None, symbol.type_ref.as_ref().map(|t| close(t).display(store))),
        };

        Some(Rendered {
            symbol,
            verdict: evaluation.verdict,
            origin: evaluation.origin,
            generic,
            display_name,
            params,
            signature,
        })
    }

    fn tags(&self) -> Vec<CandidateTag> {
        let mut tags = Vec::new();
        if self.origin == Origin::Extension {
            tags.push(CandidateTag::ExtensionMethod);
        }
        if self.origin == Origin::Inherited {
            tags.push(CandidateTag::Inherited);
        }
        if self.symbol.is_obsolete() {
            tags.push(CandidateTag::Obsolete);
        }
        if self.symbol.kind.is_member()
            && self.symbol.is_static()
            && self.origin != Origin::Extension
        {
            tags.push(CandidateTag::Static);
        }
        if self.generic {
            tags.push(CandidateTag::Generic);
        }
        tags
    }

    fn into_candidate(self, overload_count: usize) -> CompletionCandidate {
        CompletionCandidate {
            symbol_id: self.symbol.symbol_id,
            name: self.symbol.name.clone(),
            display_name: self.display_name.clone(),
            kind: self.symbol.kind,
            verdict: self.verdict,
            tags: self.tags(),
            overload_count,
            signature: self.signature,
        }
    }
}

fn is_generic(store: &FactsStore, symbol: &Symbol) -> bool {
    matches!(
        symbol.kind,
        SymbolKind::Type | SymbolKind::Method | SymbolKind::LocalFunction
    ) && (symbol.arity > 0 || !store.type_params_of(symbol.symbol_id).is_empty())
}

// ============================================================================
// Overloads
// ============================================================================

/// Merge methods sharing a name into one entry.
///
/// Identical parameter lists (a partial declaration and its implementation,
/// an extern and its definition) count once. The representative is the
/// first non-obsolete overload in declaration order, else the first.
fn collapse_overloads(rendered: Vec<Rendered<'_>>) -> Vec<CompletionCandidate> {
    let mut groups: Vec<Vec<Rendered<'_>>> = Vec::new();
    let mut group_of: HashMap<String, usize> = HashMap::new();
    let mut result = Vec::new();

    for item in rendered {
        if item.params.is_none() {
            result.push(item.into_candidate(0));
            continue;
        }
        let index = *group_of.entry(item.symbol.name.clone()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[index].push(item);
    }

    for mut group in groups {
        group.sort_by_key(|r| (r.symbol.decl_span.map(|s| s.start), r.symbol.symbol_id));
        let mut distinct: Vec<&Option<Vec<TypeRef>>> = Vec::new();
        for item in &group {
            if !distinct.contains(&&item.params) {
                distinct.push(&item.params);
            }
        }
        let overload_count = distinct.len().saturating_sub(1);

        let pick = group.iter().position(|r| !r.symbol.is_obsolete()).unwrap_or(0);
        let representative = group.swap_remove(pick);
        if overload_count > 0 {
            tracing::trace!(
                name = %representative.symbol.name,
                overload_count,
                "collapsed overloads"
            );
        }
        result.push(representative.into_candidate(overload_count));
    }
    result
}

fn sort_candidates(candidates: &mut [CompletionCandidate]) {
    candidates.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.display_name.cmp(&b.display_name))
            .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
            .then_with(|| a.symbol_id.cmp(&b.symbol_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applicability::Exclusion;
    use crate::test_helpers::SnapshotBuilder;
    use symscope_core::facts::TypeKind;

    fn names(candidates: &[CompletionCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.name.as_str()).collect()
    }

    mod overload_tests {
        use super::*;

        #[test]
        fn test_overloads_collapse() {
            let mut b = SnapshotBuilder::new(
                "class C { void M(int a) { } void M(int a, int b) { } void N() { $$ } }",
            );
            let corlib = b.corlib();
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            let one = b.method(&c, "void M(int a)");
            b.parameter(&one, "a", TypeRef::named(corlib.int32));
            let two = b.method(&c, "void M(int a, int b)");
            b.parameter(&two, "a", TypeRef::named(corlib.int32));
            b.parameter(&two, "b", TypeRef::named(corlib.int32));
            b.method(&c, "void N");
            let request = CompletionRequest::at(b.cursor());
            let snapshot = b.build();
            let cancel = CancellationToken::none();

            let candidates =
                completion_candidates(&snapshot, &request, &AnalysisOptions::default(), &cancel)
                    .unwrap();
            let m: Vec<_> = candidates.iter().filter(|c| c.name == "M").collect();
            assert_eq!(m.len(), 1);
            assert_eq!(m[0].overload_count, 1);
            assert_eq!(m[0].symbol_id, one.symbol);
            assert_eq!(m[0].signature.as_deref(), Some("(Int32 a)"));

            let options = AnalysisOptions::default().with_collapse_overloads(false);
            let uncollapsed = completion_candidates(&snapshot, &request, &options, &cancel).unwrap();
            assert_eq!(uncollapsed.iter().filter(|c| c.name == "M").count(), 2);
        }

        #[test]
        fn test_identical_signatures_count_once() {
            let mut b = SnapshotBuilder::new(
                "partial class C { partial void P(int a); partial void P(int a) { } void N() { $$ } }",
            );
            let corlib = b.corlib();
            let global = b.global();
            let c = b.type_decl(global, "partial class C", TypeKind::Class);
            let decl = b.method(&c, "partial void P(int a);");
            b.parameter(&decl, "a", TypeRef::named(corlib.int32));
            let imp = b.method(&c, "partial void P(int a) {");
            b.parameter(&imp, "a", TypeRef::named(corlib.int32));
            b.method(&c, "void N");
            let request = CompletionRequest::at(b.cursor());
            let snapshot = b.build();

            let candidates = completion_candidates(
                &snapshot,
                &request,
                &AnalysisOptions::default(),
                &CancellationToken::none(),
            )
            .unwrap();
            let p = candidates.iter().find(|c| c.name == "P").unwrap();
            assert_eq!(p.overload_count, 0);
        }

        #[test]
        fn test_obsolete_overload_is_not_representative() {
            let mut b = SnapshotBuilder::new(
                "class C { [Obsolete] void M() { } void M(int a) { } void N() { $$ } }",
            );
            let corlib = b.corlib();
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            b.method(&c, "[Obsolete] void M");
            let current = b.method(&c, "void M(int a)");
            b.parameter(&current, "a", TypeRef::named(corlib.int32));
            b.method(&c, "void N");
            let request = CompletionRequest::at(b.cursor());
            let snapshot = b.build();

            let candidates = completion_candidates(
                &snapshot,
                &request,
                &AnalysisOptions::default(),
                &CancellationToken::none(),
            )
            .unwrap();
            let m = candidates.iter().find(|c| c.name == "M").unwrap();
            assert_eq!(m.symbol_id, current.symbol);
            assert_eq!(m.overload_count, 1);
            assert!(!m.tags.contains(&CandidateTag::Obsolete));
        }
    }

    mod listing_tests {
        use super::*;

        #[test]
        fn test_prefix_filter_and_order() {
            let mut b = SnapshotBuilder::new(
                "class C { int total; int Tally; int other; void M() { ta$$ } }",
            );
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            b.field(&c, "int total", "total", TypeRef::Unresolved);
            b.field(&c, "int Tally", "Tally", TypeRef::Unresolved);
            b.field(&c, "int other", "other", TypeRef::Unresolved);
            b.method(&c, "void M");
            let request = CompletionRequest::at(b.cursor());
            let snapshot = b.build();

            let candidates = completion_candidates(
                &snapshot,
                &request,
                &AnalysisOptions::default(),
                &CancellationToken::none(),
            )
            .unwrap();
            assert_eq!(names(&candidates), vec!["Tally"]);
        }

        #[test]
        fn test_generic_display_suffix() {
            let mut b = SnapshotBuilder::new("class C { void M() { var x = new $$ } }");
            let corlib = b.corlib();
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            b.method(&c, "void M");
            let request = CompletionRequest::at(b.cursor());
            let snapshot = b.build();
            let cancel = CancellationToken::none();

            let candidates =
                completion_candidates(&snapshot, &request, &AnalysisOptions::default(), &cancel)
                    .unwrap();
            let list = candidates.iter().find(|c| c.symbol_id == corlib.list).unwrap();
            assert_eq!(list.display_name, "List<>");
            assert!(list.tags.contains(&CandidateTag::Generic));

            let options = AnalysisOptions {
                generic_display_suffix: false,
                ..AnalysisOptions::default()
            };
            let plain = completion_candidates(&snapshot, &request, &options, &cancel).unwrap();
            let list = plain.iter().find(|c| c.symbol_id == corlib.list).unwrap();
            assert_eq!(list.display_name, "List");
        }

        #[test]
        fn test_evaluate_reports_exclusions() {
            let mut b = SnapshotBuilder::new("class C { int f; static void M() { $$ } }");
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            let f = b.field(&c, "int f", "f", TypeRef::Unresolved);
            b.method(&c, "static void M");
            let request = CompletionRequest::at(b.cursor());
            let snapshot = b.build();

            let all = evaluate_candidates(
                &snapshot,
                &request,
                &AnalysisOptions::default(),
                &CancellationToken::none(),
            )
            .unwrap();
            let field = all.iter().find(|c| c.symbol_id == f).unwrap();
            assert_eq!(
                field.verdict,
                Verdict::NotApplicable(Exclusion::InstanceInStaticContext)
            );
            let json = serde_json::to_value(field).unwrap();
            assert_eq!(json["verdict"]["reason"], "instance_in_static_context");
            assert_eq!(json["kind"], "field");
        }

        #[test]
        fn test_member_signature_uses_constructed_type() {
            let mut b = SnapshotBuilder::new("class C { void M(List<int> xs) { xs.$$ } }");
            let corlib = b.corlib();
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            let m = b.method(&c, "void M");
            b.parameter(
                &m,
                "xs",
                TypeRef::generic(corlib.list, vec![TypeRef::named(corlib.int32)]),
            );
            let request = CompletionRequest::at(b.cursor());
            let snapshot = b.build();

            let candidates = completion_candidates(
                &snapshot,
                &request,
                &AnalysisOptions::default(),
                &CancellationToken::none(),
            )
            .unwrap();
            let add = candidates.iter().find(|c| c.symbol_id == corlib.list_add).unwrap();
            assert_eq!(add.signature.as_deref(), Some("(Int32 item)"));
            let count = candidates.iter().find(|c| c.symbol_id == corlib.list_count).unwrap();
            assert_eq!(count.signature.as_deref(), Some("Int32"));
        }
    }
}
