//! Core infrastructure for symscope.
//!
//! This crate provides language-agnostic infrastructure:
//! - Facts store for scopes, symbols and type declarations
//! - Immutable snapshot handles shared across query threads
//! - Type-hierarchy walks and generic constraint checks
//! - Binder-host seam traits for pluggable semantic models
//! - Unique name generation
//! - Cooperative cancellation
//! - Error types and text position utilities

pub mod adapter;
pub mod cancel;
pub mod error;
pub mod facts;
pub mod hierarchy;
pub mod names;
pub mod snapshot;
pub mod text;
