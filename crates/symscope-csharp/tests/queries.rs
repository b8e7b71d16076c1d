//! Integration tests for the editor queries of symscope-csharp.
//!
//! Unit tests in each module pin individual rules; these tests run whole
//! requests the way a host issues them: text with a cursor in, candidates
//! or verdicts out.

use symscope_core::cancel::CancellationToken;
use symscope_core::facts::{SymbolId, TypeKind, TypeRef};
use symscope_core::snapshot::Snapshot;
use symscope_csharp::completion::{CandidateTag, CompletionCandidate, CompletionRequest};
use symscope_csharp::dispose::find_dispose_method;
use symscope_csharp::test_helpers::SnapshotBuilder;
use symscope_csharp::{completion_candidates, is_applicable, AnalysisOptions, Exclusion, Verdict};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn complete(snapshot: &Snapshot, position: usize) -> Vec<CompletionCandidate> {
    completion_candidates(
        snapshot,
        &CompletionRequest::at(position),
        &AnalysisOptions::default(),
        &CancellationToken::none(),
    )
    .expect("completion succeeds")
}

fn find(candidates: &[CompletionCandidate], id: SymbolId) -> Option<&CompletionCandidate> {
    candidates.iter().find(|c| c.symbol_id == id)
}

// ============================================================================
// Qualified Access
// ============================================================================

mod qualified_access {
    use super::*;

    #[test]
    fn test_namespace_offers_types() {
        init_tracing();
        let mut b = SnapshotBuilder::new("class C { void M() { System.$$ } }");
        let corlib = b.corlib();
        let global = b.global();
        let c = b.type_decl(global, "class C", TypeKind::Class);
        b.method(&c, "void M");
        let cursor = b.cursor();
        let snapshot = b.build();

        let candidates = complete(&snapshot, cursor);
        assert!(find(&candidates, corlib.console).is_some());
        assert!(find(&candidates, corlib.list).is_some());
        assert!(find(&candidates, corlib.console_write_line).is_none());
    }

    #[test]
    fn test_static_class_offers_static_members() {
        init_tracing();
        let mut b = SnapshotBuilder::new("class C { void M() { Console.$$ } }");
        let corlib = b.corlib();
        let global = b.global();
        let c = b.type_decl(global, "class C", TypeKind::Class);
        b.method(&c, "void M");
        let cursor = b.cursor();
        let snapshot = b.build();

        let candidates = complete(&snapshot, cursor);
        let write_line = find(&candidates, corlib.console_write_line).unwrap();
        assert_eq!(write_line.signature.as_deref(), Some("(String value)"));
        assert!(write_line.tags.contains(&CandidateTag::Static));
        assert!(find(&candidates, corlib.object_to_string).is_none());
    }

    #[test]
    fn test_instance_receiver_rejects_static_members() {
        init_tracing();
        let mut b = SnapshotBuilder::new("class C { void M(int n) { n.$$ } }");
        let corlib = b.corlib();
        let global = b.global();
        let c = b.type_decl(global, "class C", TypeKind::Class);
        let m = b.method(&c, "void M");
        b.parameter(&m, "n", TypeRef::named(corlib.int32));
        let cursor = b.cursor();
        let snapshot = b.build();
        let request = CompletionRequest::at(cursor);
        let options = AnalysisOptions::default();
        let cancel = CancellationToken::none();

        let verdict =
            is_applicable(&snapshot, corlib.int32_max_value, &request, &options, &cancel).unwrap();
        assert_eq!(verdict, Verdict::NotApplicable(Exclusion::StaticViaInstance));
        let verdict =
            is_applicable(&snapshot, corlib.int32_compare_to, &request, &options, &cancel).unwrap();
        assert_eq!(verdict, Verdict::Applicable);
    }
}

// ============================================================================
// Type Positions
// ============================================================================

mod type_positions {
    use super::*;

    #[test]
    fn test_constraint_position_filters_types() {
        init_tracing();
        let mut b = SnapshotBuilder::new("class C<T> where T : $$ { }");
        let corlib = b.corlib();
        let global = b.global();
        b.type_decl(global, "class C<T>", TypeKind::Class);
        let cursor = b.cursor();
        let snapshot = b.build();
        let request = CompletionRequest::at(cursor);
        let options = AnalysisOptions::default();
        let cancel = CancellationToken::none();

        let verdict_of = |id| is_applicable(&snapshot, id, &request, &options, &cancel).unwrap();
        assert_eq!(verdict_of(corlib.list), Verdict::Applicable);
        assert_eq!(verdict_of(corlib.idisposable), Verdict::Applicable);
        assert_eq!(
            verdict_of(corlib.string),
            Verdict::NotApplicable(Exclusion::InvalidConstraintType)
        );
        assert_eq!(
            verdict_of(corlib.int32),
            Verdict::NotApplicable(Exclusion::InvalidConstraintType)
        );
    }

    #[test]
    fn test_object_creation_offers_types_only() {
        init_tracing();
        let mut b = SnapshotBuilder::new("class C { int f; void M() { var x = new $$ } }");
        let corlib = b.corlib();
        let global = b.global();
        let c = b.type_decl(global, "class C", TypeKind::Class);
        let f = b.field(&c, "int f", "f", TypeRef::Unresolved);
        b.method(&c, "void M");
        let cursor = b.cursor();
        let snapshot = b.build();

        let candidates = complete(&snapshot, cursor);
        assert!(find(&candidates, corlib.string).is_some());
        assert!(find(&candidates, c.symbol).is_some());
        assert!(find(&candidates, f).is_none());
    }
}

// ============================================================================
// Dispose
// ============================================================================

mod dispose {
    use super::*;

    #[test]
    fn test_explicit_implementation_wins() {
        init_tracing();
        let mut b = SnapshotBuilder::new(
            "class Res : IDisposable { void IDisposable.Dispose() { } public void Dispose(int code) { } }",
        );
        let corlib = b.corlib();
        let global = b.global();
        let res = b.type_decl(global, "class Res", TypeKind::Class);
        b.add_interface(&res, TypeRef::named(corlib.idisposable));
        let explicit = b.method(&res, "void IDisposable.Dispose");
        let symbol = b.store_mut().symbol(explicit.symbol).cloned().unwrap();
        b.store_mut()
            .insert_symbol(symbol.with_explicit_impl(corlib.idisposable_dispose));
        let overload = b.method(&res, "public void Dispose");
        b.parameter(&overload, "code", TypeRef::named(corlib.int32));
        let snapshot = b.build();

        let found = find_dispose_method(
            &snapshot,
            &TypeRef::named(res.symbol),
            false,
            &CancellationToken::none(),
        )
        .unwrap();
        assert_eq!(found, Some(explicit.symbol));
    }

    #[test]
    fn test_constrained_type_parameter_uses_interface_member() {
        init_tracing();
        let mut b = SnapshotBuilder::new("class C { void M<T>(T r) where T : IDisposable { } }");
        let corlib = b.corlib();
        let global = b.global();
        let c = b.type_decl(global, "class C", TypeKind::Class);
        let m = b.method(&c, "void M<T>");
        let t = m.type_params[0];
        b.constrain(t, TypeRef::named(corlib.idisposable));
        let snapshot = b.build();

        let found = find_dispose_method(
            &snapshot,
            &TypeRef::param(t),
            false,
            &CancellationToken::none(),
        )
        .unwrap();
        assert_eq!(found, Some(corlib.idisposable_dispose));
    }

    #[test]
    fn test_unresolved_type_has_no_dispose() {
        init_tracing();
        let snapshot = SnapshotBuilder::new("class C { }").build();
        let found =
            find_dispose_method(&snapshot, &TypeRef::Unresolved, true, &CancellationToken::none())
                .unwrap();
        assert_eq!(found, None);
    }
}
