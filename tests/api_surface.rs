//! Compile-only test to verify public API surface.
//!
//! This file serves as a compile-time contract for the public API.
//! If this file fails to compile, the public API has regressed.
//!
//! Run with: cargo test -- api_surface

// Allow unused imports - this test is about compile-time verification, not runtime usage
#![allow(unused_imports)]

// ============================================================================
// Core Infrastructure Types
// ============================================================================

// facts module - bound program facts
use symscope::facts::{
    Accessibility, FactsSnapshot, FactsStore, Interception, Modifier, ParamKind, Parameter,
    ScopeId, ScopeInfo, ScopeKind, Signature, Substitution, Symbol, SymbolId, SymbolKind,
    TypeDecl, TypeKind, TypeParamInfo, TypeRef, WellKnownType, FACTS_SCHEMA_VERSION,
};

// error module - error taxonomy
use symscope::error::{SemanticError, SemanticResult};

// snapshot, cancellation and seam traits
use symscope::adapter::{BinderHost, TypeLattice};
use symscope::cancel::CancellationToken;
use symscope::snapshot::Snapshot;

// type-lattice walks and name generation
use symscope::hierarchy;
use symscope::names::UniqueNameGenerator;
use symscope::text::{byte_offset_to_position, position_to_byte_offset, Span};

// ============================================================================
// Language Rules
// ============================================================================

use symscope::csharp::access::AccessSite;
use symscope::csharp::applicability::{
    evaluate, is_applicable, Evaluation, EvaluationSet, Exclusion, Verdict,
};
use symscope::csharp::collision::{
    collidable_symbols, filter_for_collision_check, is_local_collision_candidate,
};
use symscope::csharp::completion::{
    completion_candidates, evaluate_candidates, CandidateTag, CompletionCandidate,
    CompletionRequest,
};
use symscope::csharp::context::{classify, AccessOperator, PositionKind, SyntacticContext};
use symscope::csharp::dispose::{
    find_dispose_method, find_interceptor, find_pattern_method, ReturnConstraint,
};
use symscope::csharp::extension::{
    extension_methods_in_scope, is_extension_method, reduce_extension,
};
use symscope::csharp::keywords::{escape_identifier, is_reserved_keyword, make_valid_identifier};
use symscope::csharp::lookup::{enclosing_scope, lookup, visible_symbols, LookupOutcome, Origin};
use symscope::csharp::members::{resolve_receiver, type_members, MemberEntry, Receiver};
use symscope::csharp::names::{
    generate_unique_local_name, generate_unique_local_name_with_used,
    generate_unique_local_names, generate_unique_name, GeneratedName,
};
use symscope::csharp::options::AnalysisOptions;
use symscope::csharp::test_helpers::{Corlib, Decl, MethodDecl, SnapshotBuilder, CURSOR_MARKER};

// ============================================================================
// Front Door
// ============================================================================

use symscope::{
    completion_candidates as front_completion, evaluate_candidates as front_evaluate,
    generate_unique_local_name as front_unique_name, is_applicable as front_is_applicable,
    visible_symbols as front_visible, AnalysisOptions as FrontOptions,
    CancellationToken as FrontToken, CompletionCandidate as FrontCandidate,
    CompletionRequest as FrontRequest, SemanticError as FrontError,
    SemanticResult as FrontResult, Snapshot as FrontSnapshot, Verdict as FrontVerdict,
};

#[test]
fn api_surface_compiles() {
    // This test exists only to ensure the imports above compile.
    // If you're seeing this test fail, check the imports above.
}

#[test]
fn snapshot_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Snapshot>();
    assert_send_sync::<CancellationToken>();
}
