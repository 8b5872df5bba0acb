//! Document snapshots queried by the resolver.

use crate::balancer::{base::Range, classifier::Classifier, zone::ZoneTree};

/// A paired open/close construct produced by the itemizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Full span including the opening and closing constructs.
    pub range: Range,
    /// Content span strictly between the opening and closing constructs.
    pub inner_range: Range,
}

impl Item {
    /// Returns the span of the opening construct.
    pub fn open_span(&self) -> Range {
        Range::new(
            self.range.location,
            self.inner_range.location - self.range.location,
        )
    }

    /// Returns the span of the closing construct.
    pub fn close_span(&self) -> Range {
        Range::new(self.inner_range.end(), self.range.end() - self.inner_range.end())
    }
}

/// An immutable snapshot of a classified document.
///
/// Owns the character buffer, the zone tree, and the item index. A snapshot
/// never changes after classification; edits produce a new snapshot.
pub struct Document {
    content: Vec<char>,
    zones: ZoneTree,
    items: Vec<Item>,
}

impl Document {
    /// Classifies the given content into a new snapshot.
    pub fn new(content: &str) -> Self {
        Classifier::new(content).classify()
    }

    /// Assembles a snapshot from externally produced parts.
    pub fn from_parts(content: Vec<char>, zones: ZoneTree, items: Vec<Item>) -> Self {
        Document {
            content,
            zones,
            items,
        }
    }

    /// Returns the number of characters in the document.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns true if the document holds no characters.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns the character at the given position.
    pub fn char_at(&self, position: usize) -> Option<char> {
        self.content.get(position).copied()
    }

    /// Returns the characters covered by the given range.
    pub fn substring(&self, range: Range) -> String {
        let end = range.end().min(self.content.len());
        let start = range.location.min(end);
        self.content[start..end].iter().collect()
    }

    /// Returns the zone tree.
    pub fn zones(&self) -> &ZoneTree {
        &self.zones
    }

    /// Returns the structural items.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns the smallest item whose range contains the given range.
    pub fn smallest_item_containing(&self, range: Range) -> Option<&Item> {
        self.items
            .iter()
            .filter(|item| item.range.contains_range(range))
            .min_by_key(|item| item.range.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_access() {
        let document = Document::new("hello (world)");

        assert_eq!(document.len(), 13);
        assert_eq!(document.char_at(6), Some('('));
        assert_eq!(document.char_at(13), None);
        assert_eq!(document.substring(Range::new(6, 7)), "(world)");
        assert_eq!(document.substring(Range::new(10, 20)), "ld)");
    }

    #[test]
    fn test_item_spans() {
        let item = Item {
            range: Range::new(0, 16),
            inner_range: Range::new(5, 5),
        };

        assert_eq!(item.open_span(), Range::new(0, 5));
        assert_eq!(item.close_span(), Range::new(10, 6));
    }

    #[test]
    fn test_smallest_item_containing_prefers_innermost() {
        let document = Document::new("<a><b>x</b></a>");

        let inner = document
            .smallest_item_containing(Range::new(4, 0))
            .expect("inner item");
        assert_eq!(inner.range, Range::new(3, 8));
        assert_eq!(inner.inner_range, Range::new(6, 1));

        let outer = document
            .smallest_item_containing(Range::new(1, 0))
            .expect("outer item");
        assert_eq!(outer.range, Range::new(0, 15));

        assert!(document.smallest_item_containing(Range::new(0, 16)).is_none());
    }
}
