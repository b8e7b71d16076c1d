//! Unique identifiers for new declarations.
//!
//! These functions combine the collision candidates at a position with the
//! language-neutral [`UniqueNameGenerator`]. The returned name never clashes
//! with a candidate's name (under the configured case sensitivity) and its
//! token text is escaped when the name is a reserved keyword.
//!
//! Names minted by one call are not known to later calls unless the caller
//! passes them back as used names; [`generate_unique_local_names`] does this
//! for a batch.

use serde::Serialize;
use symscope_core::cancel::CancellationToken;
use symscope_core::error::SemanticResult;
use symscope_core::facts::{ScopeId, Symbol};
use symscope_core::names::UniqueNameGenerator;
use symscope_core::snapshot::Snapshot;

use crate::collision::{
    collidable_symbols, filter_for_collision_check, is_local_collision_candidate,
};
use crate::keywords::{escape_identifier, make_valid_identifier};
use crate::options::AnalysisOptions;

/// A generated identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedName {
    /// The identifier value (`class1`, `value`).
    pub name: String,
    /// Token text to insert (`@class` for a bare keyword).
    pub text: String,
}

impl GeneratedName {
    fn new(name: String) -> Self {
        let text = escape_identifier(&name);
        GeneratedName { name, text }
    }
}

/// A unique local-variable name at `position`.
pub fn generate_unique_local_name(
    snapshot: &Snapshot,
    position: usize,
    base: &str,
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<GeneratedName> {
    generate_unique_local_name_with_used::<&str>(snapshot, position, base, &[], options, cancel)
}

/// A unique local-variable name that also avoids `used_names`.
pub fn generate_unique_local_name_with_used<S: AsRef<str>>(
    snapshot: &Snapshot,
    position: usize,
    base: &str,
    used_names: &[S],
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<GeneratedName> {
    let mut generator = local_generator(snapshot, position, None, options, cancel)?;
    for name in used_names {
        generator.mark_used(name.as_ref());
    }
    Ok(mint(&mut generator, base, position))
}

/// A unique name declared into `container` (or the nearest local declaration
/// space at `position`), colliding only with symbols `predicate` admits.
pub fn generate_unique_name<P>(
    snapshot: &Snapshot,
    position: usize,
    container: Option<ScopeId>,
    base: &str,
    predicate: P,
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<GeneratedName>
where
    P: Fn(&Symbol) -> bool,
{
    let candidates = collidable_symbols(snapshot, position, container, options, cancel)?;
    let mut generator = UniqueNameGenerator::with_used_names(
        filter_for_collision_check(candidates, predicate)
            .into_iter()
            .map(|s| s.name.as_str()),
        options.case_sensitive,
    );
    Ok(mint(&mut generator, base, position))
}

/// Unique local names for a batch of bases; each name also avoids the names
/// minted before it.
pub fn generate_unique_local_names<S: AsRef<str>>(
    snapshot: &Snapshot,
    position: usize,
    bases: &[S],
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<Vec<GeneratedName>> {
    let mut generator = local_generator(snapshot, position, None, options, cancel)?;
    let mut names = Vec::with_capacity(bases.len());
    for base in bases {
        cancel.check()?;
        names.push(mint(&mut generator, base.as_ref(), position));
    }
    Ok(names)
}

fn local_generator(
    snapshot: &Snapshot,
    position: usize,
    container: Option<ScopeId>,
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<UniqueNameGenerator> {
    let candidates = collidable_symbols(snapshot, position, container, options, cancel)?;
    Ok(UniqueNameGenerator::with_used_names(
        filter_for_collision_check(candidates, is_local_collision_candidate)
            .into_iter()
            .map(|s| s.name.as_str()),
        options.case_sensitive,
    ))
}

fn mint(generator: &mut UniqueNameGenerator, base: &str, position: usize) -> GeneratedName {
    let base = make_valid_identifier(base);
    let name = generator.generate_and_mark(&base);
    tracing::debug!(position, base = %base, name = %name, "generated unique name");
    GeneratedName::new(name)
}
