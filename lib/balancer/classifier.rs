//! Lexical classifier building zone trees and item indexes.

use crate::balancer::{
    base::Range,
    document::{Document, Item},
    zone::{ZoneId, ZoneKind, ZoneTree},
};

/// Single-pass classifier over a document's characters.
///
/// Produces the zone tree and item index the resolver queries: string
/// literals, line and block comments, and markup tag pairs. Hosts with a
/// richer grammar can instead build the same structures through the
/// `ZoneTree` API and `Document::from_parts`.
pub struct Classifier {
    input: Vec<char>,
    offset: usize, // next reading offset
}

enum TagForm {
    Open,
    SelfClosing,
    Close,
}

struct TagSpan {
    length: usize,
    form: TagForm,
    name: String,
    // absolute range and termination flag per quoted attribute value
    attribute_strings: Vec<(Range, bool)>,
}

struct OpenTag {
    name: String,
    range: Range,
}

impl Classifier {
    /// Creates a new classifier for the given content.
    pub fn new(content: &str) -> Self {
        Classifier {
            input: content.chars().collect(),
            offset: 0,
        }
    }

    /// Classifies the input and returns the document snapshot.
    pub fn classify(mut self) -> Document {
        let mut zones = ZoneTree::new(self.input.len());
        let root = zones.root();
        let mut items: Vec<Item> = Vec::new();
        let mut open_tags: Vec<OpenTag> = Vec::new();

        while self.offset < self.input.len() {
            let ch = self.input[self.offset];

            match ch {
                '"' | '\'' => {
                    let (offset, terminated) = self.scan_string_at(self.offset);
                    let range = Range::new(self.offset, offset);
                    add_region(&mut zones, root, ZoneKind::String, range, 1, terminated);
                    self.offset += offset;
                }
                '/' if self.peek(1) == Some('/') => {
                    let offset = self.scan_line_comment();
                    zones.add(root, ZoneKind::LineComment, Range::new(self.offset, offset));
                    self.offset += offset;
                }
                '/' if self.peek(1) == Some('*') => {
                    let (offset, terminated) = self.scan_block_comment();
                    let range = Range::new(self.offset, offset);
                    add_region(&mut zones, root, ZoneKind::BlockComment, range, 2, terminated);
                    self.offset += offset;
                }
                '<' => match self.scan_tag() {
                    Some(tag) => {
                        let range = Range::new(self.offset, tag.length);
                        let kind = match tag.form {
                            TagForm::Close => ZoneKind::TagClose,
                            _ => ZoneKind::TagOpen,
                        };

                        let zone = zones.add(root, kind, range);
                        for &(string_range, terminated) in &tag.attribute_strings {
                            add_region(&mut zones, zone, ZoneKind::String, string_range, 1, terminated);
                        }

                        match tag.form {
                            TagForm::Open => open_tags.push(OpenTag {
                                name: tag.name,
                                range,
                            }),
                            TagForm::SelfClosing => {}
                            TagForm::Close => {
                                if let Some(index) =
                                    open_tags.iter().rposition(|open| open.name == tag.name)
                                {
                                    let open = open_tags.remove(index);
                                    // opens nested inside the pair can no longer close
                                    open_tags.truncate(index);
                                    items.push(Item {
                                        range: Range::new(
                                            open.range.location,
                                            range.end() - open.range.location,
                                        ),
                                        inner_range: Range::new(
                                            open.range.end(),
                                            range.location - open.range.end(),
                                        ),
                                    });
                                }
                            }
                        }

                        self.offset += tag.length;
                    }
                    None => self.offset += 1,
                },
                _ => self.offset += 1,
            }
        }

        Document::from_parts(self.input, zones, items)
    }
}

impl Classifier {
    fn peek(&self, ahead: usize) -> Option<char> {
        self.input.get(self.offset + ahead).copied()
    }

    // scan the string literal starting at `start` and return the end offset.
    // `start` must sit on the opening quote.
    fn scan_string_at(&self, start: usize) -> (usize, bool) {
        let quote = self.input[start];
        let mut offset = 1;

        while start + offset < self.input.len() {
            let ch = self.input[start + offset];
            offset += 1;

            if ch == '\\' {
                // skip the escaped character
                if start + offset < self.input.len() {
                    offset += 1;
                }
            } else if ch == quote {
                return (offset, true);
            }
        }

        (offset, false)
    }

    // scan the next line comment and return the end offset (newline excluded).
    fn scan_line_comment(&self) -> usize {
        let mut offset = 2;
        while self.offset + offset < self.input.len() && self.input[self.offset + offset] != '\n' {
            offset += 1;
        }

        offset
    }

    // scan the next block comment, honoring nesting, and return the end offset.
    fn scan_block_comment(&self) -> (usize, bool) {
        let mut offset = 2;
        let mut depth = 1;

        while self.offset + offset < self.input.len() {
            let ch = self.input[self.offset + offset];
            let next = self.peek(offset + 1);

            if ch == '*' && next == Some('/') {
                offset += 2;
                depth -= 1;
                if depth == 0 {
                    return (offset, true);
                }
            } else if ch == '/' && next == Some('*') {
                offset += 2;
                depth += 1;
            } else {
                offset += 1;
            }
        }

        (offset, false)
    }

    // scan a markup tag starting at '<', or return None if no well-formed
    // tag starts here.
    fn scan_tag(&self) -> Option<TagSpan> {
        let start = self.offset;
        let close = self.peek(1) == Some('/');
        let mut offset = if close { 2 } else { 1 };

        let name_start = start + offset;
        while start + offset < self.input.len() && is_tag_name_char(self.input[start + offset]) {
            offset += 1;
        }
        if start + offset == name_start {
            return None;
        }
        let name = self.input[name_start..start + offset].iter().collect::<String>();

        let mut attribute_strings = Vec::new();
        while start + offset < self.input.len() {
            let ch = self.input[start + offset];

            match ch {
                '>' => {
                    offset += 1;
                    let form = if close { TagForm::Close } else { TagForm::Open };
                    return Some(TagSpan {
                        length: offset,
                        form,
                        name,
                        attribute_strings,
                    });
                }
                '/' if !close && self.input.get(start + offset + 1) == Some(&'>') => {
                    offset += 2;
                    return Some(TagSpan {
                        length: offset,
                        form: TagForm::SelfClosing,
                        name,
                        attribute_strings,
                    });
                }
                '"' | '\'' if !close => {
                    let (length, terminated) = self.scan_string_at(start + offset);
                    attribute_strings.push((Range::new(start + offset, length), terminated));
                    offset += length;
                }
                // tags do not nest inside a tag head
                '<' => return None,
                _ => offset += 1,
            }
        }

        None
    }
}

// add a region zone, attaching boundary mark children when terminated
fn add_region(
    zones: &mut ZoneTree,
    parent: ZoneId,
    kind: ZoneKind,
    range: Range,
    mark_length: usize,
    terminated: bool,
) -> ZoneId {
    let zone = zones.add(parent, kind, range);
    if terminated {
        zones.add(zone, ZoneKind::DelimiterMark, Range::new(range.location, mark_length));
        zones.add(
            zone,
            ZoneKind::DelimiterMark,
            Range::new(range.end() - mark_length, mark_length),
        );
    }

    zone
}

fn is_tag_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | ':')
}
