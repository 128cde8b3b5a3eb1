//! Read-only view of the user's bookmarks.

use std::collections::HashSet;

/// Source of bookmarked resource ids.
///
/// Owned elsewhere (local key-value persistence); the pipeline only reads it
/// to overlay `bookmarked` on the items it returns.
pub trait BookmarkSource: Send + Sync {
    fn bookmarked_ids(&self) -> HashSet<String>;

    fn is_bookmarked(&self, id: &str) -> bool {
        self.bookmarked_ids().contains(id)
    }
}

/// No bookmarks at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBookmarks;

impl BookmarkSource for NoBookmarks {
    fn bookmarked_ids(&self) -> HashSet<String> {
        HashSet::new()
    }

    fn is_bookmarked(&self, _id: &str) -> bool {
        false
    }
}

impl BookmarkSource for HashSet<String> {
    fn bookmarked_ids(&self) -> HashSet<String> {
        self.clone()
    }

    fn is_bookmarked(&self, id: &str) -> bool {
        self.contains(id)
    }
}

impl BookmarkSource for Vec<String> {
    fn bookmarked_ids(&self) -> HashSet<String> {
        self.iter().cloned().collect()
    }
}
