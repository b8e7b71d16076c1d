//! Symscope: incremental semantic analysis for C#-family editors.
//!
//! Answers the questions an editor asks at a cursor position: which names
//! are in scope, which of them may legally appear there, what completion
//! should offer after `x.`, and which identifier is free for a new local.
//! Queries run against an immutable, binder-supplied snapshot of the program.

// Core infrastructure - re-exported from symscope-core
pub use symscope_core::adapter;
pub use symscope_core::cancel;
pub use symscope_core::error;
pub use symscope_core::facts;
pub use symscope_core::hierarchy;
pub use symscope_core::names;
pub use symscope_core::snapshot;
pub use symscope_core::text;

// Language rules
pub use symscope_csharp as csharp;

// Front door
pub use symscope_core::cancel::CancellationToken;
pub use symscope_core::error::{SemanticError, SemanticResult};
pub use symscope_core::snapshot::Snapshot;
pub use symscope_csharp::{
    completion_candidates, evaluate_candidates, generate_unique_local_name, is_applicable,
    visible_symbols, AnalysisOptions, CompletionCandidate, CompletionRequest, Verdict,
};
