//! C#-family language rules for symscope.
//!
//! This crate answers editor queries against a bound [`Snapshot`] of a
//! program. It includes:
//! - Syntactic classification of the text before the cursor
//! - Scope lookup with shadowing, static contexts and accessibility
//! - Member lookup for receivers and extension-method applicability
//! - The applicability resolver and completion pipeline
//! - Collision candidates and unique local names
//! - Dispose-pattern and interceptor queries
//!
//! Every query takes a [`CancellationToken`] and returns a
//! [`SemanticResult`]. Snapshots are immutable, so queries may run on any
//! number of threads at once.
//!
//! [`Snapshot`]: symscope_core::snapshot::Snapshot
//! [`CancellationToken`]: symscope_core::cancel::CancellationToken
//! [`SemanticResult`]: symscope_core::error::SemanticResult

pub mod access;
pub mod applicability;
pub mod collision;
pub mod completion;
pub mod context;
pub mod dispose;
pub mod extension;
pub mod keywords;
pub mod lookup;
pub mod members;
pub mod names;
pub mod options;
pub mod test_helpers;

pub use applicability::{evaluate, is_applicable, Exclusion, Verdict};
pub use completion::{
    completion_candidates, evaluate_candidates, CompletionCandidate, CompletionRequest,
};
pub use lookup::visible_symbols;
pub use names::{generate_unique_local_name, generate_unique_name};
pub use options::AnalysisOptions;
