//! Immutable snapshot handle threaded through every query.
//!
//! A [`Snapshot`] pairs the bound facts with the source text they were bound
//! from. It is cheap to clone and `Send + Sync`, so a host can hand the same
//! snapshot to several worker threads. When the source changes the host
//! builds a new snapshot; existing ones are never updated in place.

use std::sync::Arc;

use crate::error::SemanticResult;
use crate::facts::FactsStore;
use crate::text::{byte_offset_to_position, position_to_byte_offset};

/// Shared, immutable view of one analysis of a document.
#[derive(Debug, Clone)]
pub struct Snapshot {
    store: Arc<FactsStore>,
    text: Arc<str>,
    version: u64,
}

impl Snapshot {
    /// Wrap a populated store without validating it.
    pub fn new(store: FactsStore, text: impl Into<Arc<str>>, version: u64) -> Self {
        Snapshot {
            store: Arc::new(store),
            text: text.into(),
            version,
        }
    }

    /// Wrap a store after checking its structural invariants.
    pub fn validated(
        store: FactsStore,
        text: impl Into<Arc<str>>,
        version: u64,
    ) -> SemanticResult<Self> {
        store.validate()?;
        Ok(Snapshot::new(store, text, version))
    }

    /// The bound facts.
    pub fn store(&self) -> &FactsStore {
        &self.store
    }

    /// The source text the facts were bound from.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Host-assigned document version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Source text before a byte position (clamped to a char boundary).
    pub fn text_before(&self, position: usize) -> &str {
        let mut end = position.min(self.text.len());
        while !self.text.is_char_boundary(end) {
            end -= 1;
        }
        &self.text[..end]
    }

    /// 1-indexed line and column of a byte position.
    pub fn line_col(&self, position: usize) -> (u32, u32) {
        byte_offset_to_position(&self.text, position)
    }

    /// Byte position of a 1-indexed line and column.
    pub fn offset_of(&self, line: u32, col: u32) -> usize {
        position_to_byte_offset(&self.text, line, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Snapshot>();
    }

    #[test]
    fn test_clones_share_store() {
        let snapshot = Snapshot::new(FactsStore::new(), "class C {}", 3);
        let clone = snapshot.clone();
        assert!(std::ptr::eq(snapshot.store(), clone.store()));
        assert_eq!(clone.version(), 3);
    }

    #[test]
    fn test_text_before_clamps_to_char_boundary() {
        let snapshot = Snapshot::new(FactsStore::new(), "var é = 1;", 0);
        // 'é' is two bytes starting at offset 4
        assert_eq!(snapshot.text_before(5), "var ");
        assert_eq!(snapshot.text_before(100), "var é = 1;");
    }

    #[test]
    fn test_line_col_round_trip() {
        let snapshot = Snapshot::new(FactsStore::new(), "a\nbc", 0);
        assert_eq!(snapshot.line_col(3), (2, 2));
        assert_eq!(snapshot.offset_of(2, 2), 3);
    }
}
