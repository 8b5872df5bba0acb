//! Balancing delimiter resolution.
//!
//! Three strategies cooperate: anchors inside paired markup resolve through
//! the item index, anchors on a syntax region boundary resolve through the
//! region's child zones, and everything else falls back to a directional
//! character scan that honors string containment.

use crate::balancer::{
    base::{Range, ResolveError, SelectMode},
    document::{Document, Item},
    zone::{ZoneId, ZoneKind},
};

/// Balanceable delimiter characters.
///
/// Openers sit at even indices and every opener is immediately followed by
/// its closer, so the scan direction falls out of the index parity.
const DELIMITER_CHARS: [char; 8] = ['[', ']', '{', '}', '(', ')', '<', '>'];

/// Resolves balancing delimiters over a single document snapshot.
///
/// A resolver holds no state of its own beyond the snapshot reference;
/// constructing one per call is free and calls never observe each other.
pub struct Resolver<'a> {
    document: &'a Document,
}

// strategy dispatch for a classified anchor
enum Anchor {
    /// The selection lies inside a paired structural item.
    Item(Item),
    /// The selection sits on a boundary mark of a syntax region.
    SyntaxDelimiter(ZoneId),
    /// A bare character scan seeded at the given position.
    Character { ch: char, index: usize },
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over the given document.
    pub fn new(document: &'a Document) -> Self {
        Resolver { document }
    }

    /// Returns true if the selection qualifies for any resolution strategy.
    ///
    /// Mirrors the gating of `resolve` so hosts can disable the action
    /// cheaply; a true result does not guarantee that resolution succeeds.
    pub fn can_resolve(&self, selection: Range) -> bool {
        let zones = self.document.zones();
        selection.length <= 1
            || zones.in_item(zones.zone_at(selection.location))
            || self.syntax_delimiter_at(selection.location).is_some()
    }

    /// Finds the delimiter balancing the one at the selection.
    ///
    /// Returns both delimiter ranges in `Both` mode and only the far one in
    /// `Opposite` mode.
    pub fn resolve(&self, selection: Range, mode: SelectMode) -> Result<Vec<Range>, ResolveError> {
        match self.classify_anchor(selection)? {
            Anchor::Item(item) => Ok(resolve_item(&item, selection, mode)),
            Anchor::SyntaxDelimiter(zone) => self.resolve_syntax_region(zone, mode),
            Anchor::Character { ch, index } => self.scan_balance(ch, index, mode),
        }
    }

    // decide which strategy the selection qualifies for
    fn classify_anchor(&self, selection: Range) -> Result<Anchor, ResolveError> {
        let zones = self.document.zones();
        let anchor = selection.location;

        // structural items take precedence over syntax regions and raw
        // characters; an unpaired tag zone falls through
        if zones.in_item(zones.zone_at(anchor)) {
            if let Some(item) = self.document.smallest_item_containing(selection) {
                return Ok(Anchor::Item(item.clone()));
            }
        }

        if let Some(zone) = self.syntax_delimiter_at(anchor) {
            return Ok(Anchor::SyntaxDelimiter(zone));
        }

        if selection.length > 1 {
            return Err(ResolveError::NotApplicable);
        }

        if selection.length == 1 {
            return match self.document.char_at(anchor) {
                Some(ch) => Ok(Anchor::Character { ch, index: anchor }),
                None => Err(ResolveError::NotBalanceable),
            };
        }

        // cursor: prefer the character to the left, then the one to the right
        if anchor > 0 {
            if let Some(ch) = self.document.char_at(anchor - 1) {
                if delimiter_index(ch).is_some() {
                    return Ok(Anchor::Character {
                        ch,
                        index: anchor - 1,
                    });
                }
            }
        }
        match self.document.char_at(anchor) {
            Some(ch) => Ok(Anchor::Character { ch, index: anchor }),
            None => Err(ResolveError::NotBalanceable),
        }
    }

    // a syntax region boundary mark at the position, or just before it
    fn syntax_delimiter_at(&self, position: usize) -> Option<ZoneId> {
        let zones = self.document.zones();

        let zone = zones.zone_at(position);
        if zones.is_syntax_delimiter(zone) {
            return Some(zone);
        }

        if position > 0 {
            let zone = zones.zone_at(position - 1);
            if zones.is_syntax_delimiter(zone) {
                return Some(zone);
            }
        }

        None
    }

    // resolve through the first and last boundary children of the region
    fn resolve_syntax_region(
        &self,
        zone: ZoneId,
        mode: SelectMode,
    ) -> Result<Vec<Range>, ResolveError> {
        let zones = self.document.zones();

        let parent = match zones.parent(zone) {
            Some(parent) => parent,
            None => {
                log::error!("Boundary mark zone has no parent region");
                return Err(ResolveError::MalformedZoneTree);
            }
        };

        let children = zones.children(parent);
        let (first, last) = match (children.first(), children.last()) {
            (Some(&first), Some(&last)) if children.len() >= 2 => (first, last),
            _ => {
                log::error!("Syntax region holds fewer than two boundary zones");
                return Err(ResolveError::MalformedZoneTree);
            }
        };

        let first_range = zones.range(first);
        let last_range = zones.range(last);
        match mode {
            SelectMode::Both => Ok(vec![first_range, last_range]),
            SelectMode::Opposite => {
                if zones.range(zone).location == first_range.location {
                    Ok(vec![last_range])
                } else {
                    Ok(vec![first_range])
                }
            }
        }
    }

    // directional scan counting nesting depth, honoring string containment
    fn scan_balance(
        &self,
        start_char: char,
        start_index: usize,
        mode: SelectMode,
    ) -> Result<Vec<Range>, ResolveError> {
        let table_index = delimiter_index(start_char).ok_or(ResolveError::NotBalanceable)?;

        // openers sit at even indices, so parity decides the direction
        let (step, end_char): (isize, char) = if table_index % 2 == 0 {
            (1, DELIMITER_CHARS[table_index + 1])
        } else {
            (-1, DELIMITER_CHARS[table_index - 1])
        };

        let zones = self.document.zones();
        // when the anchor starts inside a string literal, only string
        // interiors count; otherwise they are skipped wholesale
        let search_strings = zones.in_string(zones.zone_at(start_index));
        let length = self.document.len() as isize;

        let mut open_count = 1usize;
        let mut cur = start_index as isize + step;
        let mut end_index = None;

        while end_index.is_none() && cur >= 0 && cur < length {
            let position = cur as usize;
            let zone = zones.zone_at(position);

            if zones.in_string(zone) == search_strings {
                match self.document.char_at(position) {
                    Some(ch) if ch == start_char => open_count += 1,
                    Some(ch) if ch == end_char => {
                        open_count -= 1;
                        if open_count == 0 {
                            end_index = Some(position);
                        }
                    }
                    _ => {}
                }
                cur += step;
            } else if !search_strings {
                // inside a string region: jump past it entirely
                let region = zones
                    .nearest(zone, |kind| kind == ZoneKind::String)
                    .map(|id| zones.range(id))
                    .unwrap_or_else(|| zones.range(zone));
                cur = if step > 0 {
                    region.end() as isize
                } else {
                    region.location as isize - 1
                };
            } else {
                // outside every string region: jump to the next one, if any
                match self.next_string_position(position, step) {
                    Some(next) => cur = next as isize,
                    None => break,
                }
            }
        }

        match (end_index, mode) {
            (Some(end), SelectMode::Both) => {
                Ok(vec![Range::new(start_index, 1), Range::new(end, 1)])
            }
            (Some(end), SelectMode::Opposite) => Ok(vec![Range::new(end, 1)]),
            (None, _) => Err(ResolveError::Unbalanced),
        }
    }

    // first character of the next string region past `position` (forward),
    // or last character of the nearest one before it (backward)
    fn next_string_position(&self, position: usize, step: isize) -> Option<usize> {
        let zones = self.document.zones();

        if step > 0 {
            let span = Range::new(position, self.document.len() - position);
            zones
                .zones_in(span)
                .into_iter()
                .find(|&id| zones.kind(id) == ZoneKind::String && !zones.range(id).is_empty())
                .map(|id| zones.range(id).location)
        } else {
            let span = Range::new(0, position);
            zones
                .zones_in(span)
                .into_iter()
                .rev()
                .find(|&id| zones.kind(id) == ZoneKind::String && !zones.range(id).is_empty())
                .map(|id| zones.range(id).end() - 1)
        }
    }
}

// resolve through the item's pre-computed sub-ranges; no scanning involved
fn resolve_item(item: &Item, selection: Range, mode: SelectMode) -> Vec<Range> {
    match mode {
        SelectMode::Both => vec![item.open_span(), item.close_span()],
        SelectMode::Opposite => {
            if selection.location < item.inner_range.end() {
                vec![item.close_span()]
            } else {
                vec![item.open_span()]
            }
        }
    }
}

// table index of a balanceable character
fn delimiter_index(ch: char) -> Option<usize> {
    DELIMITER_CHARS.iter().position(|&delimiter| delimiter == ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balancer::zone::ZoneTree;

    fn resolve(content: &str, selection: Range, mode: SelectMode) -> Result<Vec<Range>, ResolveError> {
        let document = Document::new(content);
        Resolver::new(&document).resolve(selection, mode)
    }

    #[test]
    fn test_nested_brackets_outer_pair() {
        // 0123456
        // (a(b)c)
        let result = resolve("(a(b)c)", Range::new(0, 1), SelectMode::Both);
        assert_eq!(result, Ok(vec![Range::new(0, 1), Range::new(6, 1)]));
    }

    #[test]
    fn test_nested_brackets_inner_pair() {
        let result = resolve("(a(b)c)", Range::new(2, 1), SelectMode::Both);
        assert_eq!(result, Ok(vec![Range::new(2, 1), Range::new(4, 1)]));
    }

    #[test]
    fn test_forward_backward_symmetry() {
        let forward = resolve("(a(b)c)", Range::new(0, 1), SelectMode::Both).unwrap();
        let backward = resolve("(a(b)c)", Range::new(6, 1), SelectMode::Both).unwrap();

        // the anchor leads in each result; the matched pair is the same
        assert_eq!(forward, vec![Range::new(0, 1), Range::new(6, 1)]);
        assert_eq!(backward, vec![Range::new(6, 1), Range::new(0, 1)]);
    }

    #[test]
    fn test_scan_skips_string_interior() {
        // 012345678
        // a("b)c"d)
        // the unmatched ')' inside the literal must not count
        let result = resolve("a(\"b)c\"d)", Range::new(1, 1), SelectMode::Both);
        assert_eq!(result, Ok(vec![Range::new(1, 1), Range::new(8, 1)]));
    }

    #[test]
    fn test_scan_inside_string_ignores_plain_code() {
        // 0123456789..
        // f("x(", ")")
        // anchored inside the first literal, only literal interiors count;
        // the plain ')' at the end must be ignored
        let result = resolve("f(\"x(\", \")\")", Range::new(4, 1), SelectMode::Both);
        assert_eq!(result, Ok(vec![Range::new(4, 1), Range::new(9, 1)]));
    }

    #[test]
    fn test_backward_scan_skips_string_interior() {
        let result = resolve("a(\"b)c\"d)", Range::new(8, 1), SelectMode::Both);
        assert_eq!(result, Ok(vec![Range::new(8, 1), Range::new(1, 1)]));
    }

    #[test]
    fn test_opposite_returns_single_range() {
        let result = resolve("(x)", Range::new(0, 1), SelectMode::Opposite);
        assert_eq!(result, Ok(vec![Range::new(2, 1)]));
    }

    #[test]
    fn test_unbalanced_forward() {
        assert_eq!(
            resolve("(a", Range::new(0, 1), SelectMode::Both),
            Err(ResolveError::Unbalanced)
        );
    }

    #[test]
    fn test_unbalanced_backward() {
        assert_eq!(
            resolve("a)", Range::new(1, 1), SelectMode::Both),
            Err(ResolveError::Unbalanced)
        );
    }

    #[test]
    fn test_cursor_uses_character_to_the_left() {
        let result = resolve("(x)", Range::new(1, 0), SelectMode::Both);
        assert_eq!(result, Ok(vec![Range::new(0, 1), Range::new(2, 1)]));
    }

    #[test]
    fn test_cursor_falls_back_to_character_to_the_right() {
        // 'a' to the left is not balanceable, '(' to the right is
        let result = resolve("a(b)", Range::new(1, 0), SelectMode::Both);
        assert_eq!(result, Ok(vec![Range::new(1, 1), Range::new(3, 1)]));
    }

    #[test]
    fn test_non_delimiter_is_not_balanceable() {
        assert_eq!(
            resolve("abc", Range::new(1, 1), SelectMode::Both),
            Err(ResolveError::NotBalanceable)
        );
    }

    #[test]
    fn test_wide_selection_in_plain_text_is_not_applicable() {
        let document = Document::new("hello (world)");
        let resolver = Resolver::new(&document);

        assert!(!resolver.can_resolve(Range::new(0, 5)));
        assert_eq!(
            resolver.resolve(Range::new(0, 5), SelectMode::Both),
            Err(ResolveError::NotApplicable)
        );
    }

    #[test]
    fn test_item_resolution_returns_tag_spans() {
        // 0123456789012345
        // <div>hello</div>
        let result = resolve("<div>hello</div>", Range::new(2, 0), SelectMode::Both);
        assert_eq!(result, Ok(vec![Range::new(0, 5), Range::new(10, 6)]));
    }

    #[test]
    fn test_item_resolution_opposite_ends() {
        let from_open = resolve("<div>hello</div>", Range::new(2, 0), SelectMode::Opposite);
        assert_eq!(from_open, Ok(vec![Range::new(10, 6)]));

        let from_close = resolve("<div>hello</div>", Range::new(12, 0), SelectMode::Opposite);
        assert_eq!(from_close, Ok(vec![Range::new(0, 5)]));
    }

    #[test]
    fn test_item_resolution_accepts_wide_selection() {
        let document = Document::new("<div>hello</div>");
        let resolver = Resolver::new(&document);

        assert!(resolver.can_resolve(Range::new(1, 3)));
        assert_eq!(
            resolver.resolve(Range::new(1, 3), SelectMode::Both),
            Ok(vec![Range::new(0, 5), Range::new(10, 6)])
        );
    }

    #[test]
    fn test_nested_items_resolve_innermost() {
        // 012345678901234
        // <a><b>x</b></a>
        let result = resolve("<a><b>x</b></a>", Range::new(4, 0), SelectMode::Both);
        assert_eq!(result, Ok(vec![Range::new(3, 3), Range::new(7, 4)]));
    }

    #[test]
    fn test_item_precedence_over_bracket_scan() {
        // the '<' left of the cursor is in the delimiter table, but the
        // anchor sits inside tag markup, which wins
        let result = resolve("<a>b</a>", Range::new(1, 0), SelectMode::Both);
        assert_eq!(result, Ok(vec![Range::new(0, 3), Range::new(4, 4)]));
    }

    #[test]
    fn test_angle_brackets_scan_outside_markup() {
        // 0123456789
        // Map<K, V<T>>
        // the unpaired generic head falls back to a character scan
        let result = resolve("Map<K, V<T>>", Range::new(3, 1), SelectMode::Both);
        assert_eq!(result, Ok(vec![Range::new(3, 1), Range::new(11, 1)]));
    }

    #[test]
    fn test_string_quote_resolves_region_pair() {
        // 0123456789
        // x = "abc";
        let result = resolve("x = \"abc\";", Range::new(4, 0), SelectMode::Both);
        assert_eq!(result, Ok(vec![Range::new(4, 1), Range::new(8, 1)]));
    }

    #[test]
    fn test_quote_resolution_checks_position_before_cursor() {
        // cursor right after the closing quote
        let result = resolve("x = \"abc\";", Range::new(9, 0), SelectMode::Opposite);
        assert_eq!(result, Ok(vec![Range::new(4, 1)]));
    }

    #[test]
    fn test_quote_opposite_from_opening_mark() {
        let result = resolve("x = \"abc\";", Range::new(4, 0), SelectMode::Opposite);
        assert_eq!(result, Ok(vec![Range::new(8, 1)]));
    }

    #[test]
    fn test_block_comment_fences_resolve_as_pair() {
        // 01234567
        // /* hi */
        let result = resolve("/* hi */", Range::new(0, 0), SelectMode::Both);
        assert_eq!(result, Ok(vec![Range::new(0, 2), Range::new(6, 2)]));
    }

    #[test]
    fn test_regex_region_from_external_tree() {
        // regex literals come from richer external classifiers; their
        // boundary marks resolve like any other syntax region
        let content: Vec<char> = "/ab/g".chars().collect();
        let mut tree = ZoneTree::new(content.len());
        let root = tree.root();
        let regex = tree.add(root, ZoneKind::Regex, Range::new(0, 5));
        tree.add(regex, ZoneKind::DelimiterMark, Range::new(0, 1));
        tree.add(regex, ZoneKind::DelimiterMark, Range::new(3, 1));

        let document = Document::from_parts(content, tree, Vec::new());
        assert_eq!(
            Resolver::new(&document).resolve(Range::new(4, 0), SelectMode::Opposite),
            Ok(vec![Range::new(0, 1)])
        );
    }

    #[test]
    fn test_malformed_region_is_reported() {
        // a hand-built tree violating the two-boundary invariant
        let content: Vec<char> = "\"ab\"x".chars().collect();
        let mut tree = ZoneTree::new(content.len());
        let root = tree.root();
        let string = tree.add(root, ZoneKind::String, Range::new(0, 4));
        tree.add(string, ZoneKind::DelimiterMark, Range::new(0, 1));

        let document = Document::from_parts(content, tree, Vec::new());
        assert_eq!(
            Resolver::new(&document).resolve(Range::new(0, 0), SelectMode::Both),
            Err(ResolveError::MalformedZoneTree)
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let document = Document::new("(a(b)c) \"(\" <t>x</t>");
        let resolver = Resolver::new(&document);

        for selection in [Range::new(0, 1), Range::new(2, 1), Range::new(13, 0)] {
            let first = resolver.resolve(selection, SelectMode::Both);
            let second = resolver.resolve(selection, SelectMode::Both);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_empty_document_is_not_balanceable() {
        assert_eq!(
            resolve("", Range::new(0, 0), SelectMode::Both),
            Err(ResolveError::NotBalanceable)
        );
    }
}
