//! Zone tree over a classified document.

use crate::balancer::base::Range;

/// Identifies a zone within a zone tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneId(usize);

/// Represents the classification of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    /// Plain source text outside any literal or markup construct.
    Source,
    /// A quoted string literal.
    String,
    /// A regular expression literal.
    Regex,
    /// A line comment.
    LineComment,
    /// A block comment.
    BlockComment,
    /// The opening construct of a paired markup item.
    TagOpen,
    /// The closing construct of a paired markup item.
    TagClose,
    /// A boundary mark (quote, comment fence) delimiting its parent region.
    DelimiterMark,
}

impl ZoneKind {
    /// Returns true for region kinds whose boundary marks balance as a pair.
    pub fn is_syntax_region(&self) -> bool {
        matches!(
            self,
            ZoneKind::String | ZoneKind::Regex | ZoneKind::BlockComment
        )
    }

    /// Returns true for markup kinds resolved through the item index.
    pub fn is_item(&self) -> bool {
        matches!(self, ZoneKind::TagOpen | ZoneKind::TagClose)
    }
}

/// Represents a classified span of a document.
#[derive(Debug)]
pub struct Zone {
    pub kind: ZoneKind,
    pub range: Range,
    pub parent: Option<ZoneId>,
    pub children: Vec<ZoneId>,
}

/// Containment tree of zones over a document.
///
/// Zones live in an arena and reference each other by index: parents own an
/// ordered child list and children hold an index back-reference, so the tree
/// needs no reference cycles. The root zone always covers the whole document.
#[derive(Debug)]
pub struct ZoneTree {
    zones: Vec<Zone>,
}

impl ZoneTree {
    /// Creates a tree holding a single root zone covering the whole document.
    pub fn new(document_length: usize) -> Self {
        ZoneTree {
            zones: vec![Zone {
                kind: ZoneKind::Source,
                range: Range::new(0, document_length),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Returns the root zone id.
    pub fn root(&self) -> ZoneId {
        ZoneId(0)
    }

    /// Adds a zone under the given parent and returns its id.
    ///
    /// Children must be added in document order and must not overlap their
    /// siblings; the queries below rely on both.
    pub fn add(&mut self, parent: ZoneId, kind: ZoneKind, range: Range) -> ZoneId {
        let id = ZoneId(self.zones.len());
        self.zones.push(Zone {
            kind,
            range,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.zones[parent.0].children.push(id);
        id
    }

    /// Returns the zone for an id.
    pub fn zone(&self, id: ZoneId) -> &Zone {
        &self.zones[id.0]
    }

    /// Returns the kind of a zone.
    pub fn kind(&self, id: ZoneId) -> ZoneKind {
        self.zones[id.0].kind
    }

    /// Returns the range of a zone.
    pub fn range(&self, id: ZoneId) -> Range {
        self.zones[id.0].range
    }

    /// Returns the parent of a zone, if any.
    pub fn parent(&self, id: ZoneId) -> Option<ZoneId> {
        self.zones[id.0].parent
    }

    /// Returns the children of a zone, in document order.
    pub fn children(&self, id: ZoneId) -> &[ZoneId] {
        &self.zones[id.0].children
    }

    /// Returns the deepest zone containing the given position.
    ///
    /// Positions past the document resolve to the root zone.
    pub fn zone_at(&self, position: usize) -> ZoneId {
        let mut cur = self.root();
        loop {
            let next = self.zones[cur.0]
                .children
                .iter()
                .copied()
                .find(|&child| self.zones[child.0].range.contains(position));

            match next {
                Some(child) => cur = child,
                None => return cur,
            }
        }
    }

    /// Returns all zones intersecting the given span, in document order.
    ///
    /// The root zone is excluded; parents precede their children.
    pub fn zones_in(&self, span: Range) -> Vec<ZoneId> {
        let mut result = Vec::new();
        self.collect_zones(self.root(), span, &mut result);
        result
    }

    fn collect_zones(&self, id: ZoneId, span: Range, result: &mut Vec<ZoneId>) {
        for &child in &self.zones[id.0].children {
            // children lie within their parent, so pruning here is safe
            if self.zones[child.0].range.intersects(span) {
                result.push(child);
                self.collect_zones(child, span, result);
            }
        }
    }

    /// Returns the nearest zone, from `id` upward, whose kind matches.
    pub fn nearest(&self, id: ZoneId, matches: impl Fn(ZoneKind) -> bool) -> Option<ZoneId> {
        let mut cur = Some(id);
        while let Some(zone) = cur {
            if matches(self.zones[zone.0].kind) {
                return Some(zone);
            }
            cur = self.zones[zone.0].parent;
        }

        None
    }

    /// Returns true if the zone or one of its ancestors is a string literal.
    pub fn in_string(&self, id: ZoneId) -> bool {
        self.nearest(id, |kind| kind == ZoneKind::String).is_some()
    }

    /// Returns true if the zone or one of its ancestors is a markup construct.
    pub fn in_item(&self, id: ZoneId) -> bool {
        self.nearest(id, |kind| kind.is_item()).is_some()
    }

    /// Returns true for a boundary mark delimiting a syntax region.
    pub fn is_syntax_delimiter(&self, id: ZoneId) -> bool {
        self.zones[id.0].kind == ZoneKind::DelimiterMark
            && self.zones[id.0]
                .parent
                .map(|parent| self.zones[parent.0].kind.is_syntax_region())
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> ZoneTree {
        // 0123456789012345678
        // aa"bb"cc<t s="x">dd
        let mut tree = ZoneTree::new(19);
        let root = tree.root();

        let string = tree.add(root, ZoneKind::String, Range::new(2, 4));
        tree.add(string, ZoneKind::DelimiterMark, Range::new(2, 1));
        tree.add(string, ZoneKind::DelimiterMark, Range::new(5, 1));

        let tag = tree.add(root, ZoneKind::TagOpen, Range::new(8, 9));
        let attr = tree.add(tag, ZoneKind::String, Range::new(13, 3));
        tree.add(attr, ZoneKind::DelimiterMark, Range::new(13, 1));
        tree.add(attr, ZoneKind::DelimiterMark, Range::new(15, 1));

        tree
    }

    #[test]
    fn test_zone_at_returns_deepest() {
        let tree = sample_tree();

        assert_eq!(tree.kind(tree.zone_at(0)), ZoneKind::Source);
        assert_eq!(tree.kind(tree.zone_at(2)), ZoneKind::DelimiterMark);
        assert_eq!(tree.kind(tree.zone_at(3)), ZoneKind::String);
        assert_eq!(tree.kind(tree.zone_at(9)), ZoneKind::TagOpen);
        assert_eq!(tree.kind(tree.zone_at(14)), ZoneKind::String);
        assert_eq!(tree.kind(tree.zone_at(13)), ZoneKind::DelimiterMark);
    }

    #[test]
    fn test_zone_at_past_document() {
        let tree = sample_tree();
        assert_eq!(tree.zone_at(100), tree.root());
    }

    #[test]
    fn test_zones_in_document_order() {
        let tree = sample_tree();

        let all = tree.zones_in(Range::new(0, 19));
        let starts: Vec<usize> = all.iter().map(|&id| tree.range(id).location).collect();
        assert_eq!(starts, vec![2, 2, 5, 8, 13, 13, 15]);
    }

    #[test]
    fn test_zones_in_prunes_by_span() {
        let tree = sample_tree();

        let tail = tree.zones_in(Range::new(8, 11));
        assert!(tail
            .iter()
            .all(|&id| tree.range(id).location >= 8));
        assert_eq!(tail.len(), 4);
    }

    #[test]
    fn test_ancestry_predicates() {
        let tree = sample_tree();

        assert!(tree.in_string(tree.zone_at(3)));
        assert!(tree.in_string(tree.zone_at(2)));
        assert!(!tree.in_string(tree.zone_at(7)));

        // attribute strings count as both string and item context
        assert!(tree.in_string(tree.zone_at(14)));
        assert!(tree.in_item(tree.zone_at(14)));
        assert!(tree.in_item(tree.zone_at(9)));
        assert!(!tree.in_item(tree.zone_at(0)));
    }

    #[test]
    fn test_syntax_delimiter_requires_region_parent() {
        let mut tree = sample_tree();

        assert!(tree.is_syntax_delimiter(tree.zone_at(2)));
        assert!(tree.is_syntax_delimiter(tree.zone_at(15)));
        assert!(!tree.is_syntax_delimiter(tree.zone_at(3)));

        // a mark directly under the source root delimits nothing
        let root = tree.root();
        let stray = tree.add(root, ZoneKind::DelimiterMark, Range::new(17, 1));
        assert!(!tree.is_syntax_delimiter(stray));
    }
}
