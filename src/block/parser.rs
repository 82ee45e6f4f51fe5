use super::*;

const CODE_INDENT: usize = 4;

/// Blockquotes and lists nested deeper than this are not opened; their
/// markers stay in the paragraph text.
const MAX_BLOCK_DEPTH: usize = 64;

/// Blocks left open from the previous line that the current line did not
/// continue. Closing them is deferred until a new container starts or the
/// line turns out not to be a lazy paragraph continuation.
struct Unmatched {
    old_tip: BlockId,
    last_matched: BlockId,
    closed: bool,
}

impl BlockParser {
    /// Feeds one line (without its line terminator) into the document.
    ///
    /// `line_number` is 1-based and is recorded as the start or end line of
    /// the blocks this line opens or closes.
    pub fn incorporate_line(&mut self, line: &str, line_number: usize) -> Result<(), IncorporateError> {
        let root = self.doc.root();
        if !self.doc[root].open {
            return Err(IncorporateError::ClosedContainer {
                line_number,
                kind: self.doc[root].kind.name(),
            });
        }

        let line = detab(line);
        let line: &str = &line;
        let mut offset = 0;
        let mut blank = false;
        let mut container = root;

        while let Some(&last_child) = self.doc[container].children.last() {
            if !self.doc[last_child].open {
                break;
            }
            container = last_child;
            let (nonspace, is_blank) = first_nonspace(line, offset);
            blank = is_blank;
            if !self.continues(container, line, &mut offset, nonspace, blank) {
                container = self.doc[container].parent.unwrap_or(root);
                break;
            }
        }

        let mut unmatched = Unmatched {
            old_tip: self.tip,
            last_matched: container,
            closed: false,
        };

        if blank && self.doc[container].last_line_blank {
            self.close_unmatched(&mut unmatched, line_number);
            self.break_out_of_lists(container, line_number);
            container = self.tip;
        }

        while !self.doc[container].kind.is_raw_content() && may_start_container(line, offset) {
            let (nonspace, is_blank) = first_nonspace(line, offset);
            blank = is_blank;
            let indent = nonspace - offset;
            let rest = &line[nonspace..];
            let can_nest = self.doc.depth(container) < MAX_BLOCK_DEPTH;

            if indent >= CODE_INDENT {
                if self.doc[self.tip].kind == BlockKind::Paragraph || blank {
                    // indented text continuing a lazy paragraph
                    break;
                }
                offset += CODE_INDENT;
                self.close_unmatched(&mut unmatched, line_number);
                container = self.add_child(BlockKind::IndentedCode, line_number, offset)?;
            } else if can_nest && !blank && rest.starts_with('>') {
                offset = nonspace + 1;
                if line.as_bytes().get(offset) == Some(&b' ') {
                    offset += 1;
                }
                self.close_unmatched(&mut unmatched, line_number);
                container = self.add_child(BlockKind::BlockQuote, line_number, offset)?;
            } else if let Some((level, len)) = parse_atx_open(rest) {
                offset = nonspace + len;
                self.close_unmatched(&mut unmatched, line_number);
                container = self.add_child(BlockKind::AtxHeading { level }, line_number, nonspace)?;
                let text = strip_atx_closing(&line[offset..]).into_owned();
                self.doc[container].raw_lines.push(text);
                break;
            } else if let Some((fence_char, fence_length)) = parse_fence_open(rest) {
                self.close_unmatched(&mut unmatched, line_number);
                let kind = BlockKind::FencedCode {
                    fence_offset: indent,
                    fence_length,
                    fence_char,
                    info: String::new(),
                };
                container = self.add_child(kind, line_number, nonspace)?;
                offset = nonspace + fence_length;
                break;
            } else if HTML_BLOCK_OPEN.is_match(rest) {
                self.close_unmatched(&mut unmatched, line_number);
                container = self.add_child(BlockKind::HtmlBlock, line_number, nonspace)?;
                // the tag itself is part of the block's text
                break;
            } else if let Some(level) = self.setext_level(container, rest) {
                self.close_unmatched(&mut unmatched, line_number);
                self.doc[container].kind = BlockKind::SetextHeading { level };
                offset = line.len();
            } else if THEMATIC_BREAK.is_match(rest) {
                self.close_unmatched(&mut unmatched, line_number);
                container = self.add_child(BlockKind::ThematicBreak, line_number, nonspace)?;
                offset = line.len();
                break;
            } else if let Some(data) = parse_list_marker(rest, indent).filter(|_| can_nest) {
                self.close_unmatched(&mut unmatched, line_number);
                offset = if data.padding < rest.len() {
                    nonspace + data.padding
                } else {
                    line.len()
                };
                let continues_list = matches!(
                    &self.doc[container].kind,
                    BlockKind::List { data: existing, .. } if existing.list_type.same_list(&data.list_type)
                );
                if !continues_list {
                    container = self.add_child(BlockKind::List { data, tight: true }, line_number, nonspace)?;
                }
                container = self.add_child(BlockKind::ListItem { data }, line_number, nonspace)?;
            } else {
                break;
            }

            if self.doc[container].kind.accepts_lines() {
                break;
            }
        }

        let (nonspace, is_blank) = first_nonspace(line, offset);
        blank = is_blank;
        let indent = nonspace - offset;
        let tip = self.tip;

        if tip != unmatched.last_matched
            && !blank
            && self.doc[tip].kind == BlockKind::Paragraph
            && !self.doc[tip].raw_lines.is_empty()
        {
            self.doc[tip].last_line_blank = false;
            return self.add_line(line, offset, line_number);
        }

        self.close_unmatched(&mut unmatched, line_number);

        // Blockquote lines start with `>`, blank lines inside fenced code do
        // not affect list looseness, and an empty list item opened on this
        // very line is not considered to end with a blank line.
        let exempt = match &self.doc[container].kind {
            BlockKind::BlockQuote | BlockKind::FencedCode { .. } => true,
            BlockKind::ListItem { .. } => {
                self.doc[container].children.is_empty() && self.doc[container].start_line == line_number
            }
            _ => false,
        };
        self.doc[container].last_line_blank = blank && !exempt;
        let mut ancestor = self.doc[container].parent;
        while let Some(id) = ancestor {
            self.doc[id].last_line_blank = false;
            ancestor = self.doc[id].parent;
        }

        match self.doc[container].kind {
            BlockKind::IndentedCode | BlockKind::HtmlBlock => self.add_line(line, offset, line_number)?,
            BlockKind::FencedCode {
                fence_char,
                fence_length,
                ..
            } => {
                if indent <= 3 && is_closing_fence(&line[nonspace..], fence_char, fence_length) {
                    // the closing fence belongs to the block's line range
                    self.finalize_block(container, line_number + 1);
                } else {
                    self.add_line(line, offset, line_number)?;
                }
            }
            BlockKind::AtxHeading { .. } | BlockKind::SetextHeading { .. } | BlockKind::ThematicBreak => {}
            ref kind if kind.accepts_lines() => self.add_line(line, nonspace, line_number)?,
            _ if blank => {}
            _ => {
                self.add_child(BlockKind::Paragraph, line_number, nonspace)?;
                self.add_line(line, nonspace, line_number)?;
            }
        }
        Ok(())
    }

    /// Applies the continuation rule of `container` to the line at `offset`,
    /// advancing `offset` past any consumed prefix.
    fn continues(&mut self, container: BlockId, line: &str, offset: &mut usize, nonspace: usize, blank: bool) -> bool {
        let indent = nonspace - *offset;
        let mut paragraph_ended = false;
        let matched = match &self.doc[container].kind {
            BlockKind::BlockQuote => {
                if indent <= 3 && !blank && line.as_bytes()[nonspace] == b'>' {
                    *offset = nonspace + 1;
                    if line.as_bytes().get(*offset) == Some(&b' ') {
                        *offset += 1;
                    }
                    true
                } else {
                    false
                }
            }
            BlockKind::ListItem { data } => {
                let width = data.marker_offset + data.padding;
                if indent >= width {
                    *offset += width;
                    true
                } else if blank {
                    *offset = nonspace;
                    true
                } else {
                    false
                }
            }
            BlockKind::IndentedCode => {
                if indent >= CODE_INDENT {
                    *offset += CODE_INDENT;
                    true
                } else if blank {
                    *offset = nonspace;
                    true
                } else {
                    false
                }
            }
            BlockKind::AtxHeading { .. } | BlockKind::SetextHeading { .. } | BlockKind::ThematicBreak => false,
            BlockKind::FencedCode { fence_offset, .. } => {
                let skip = indent.min(*fence_offset);
                *offset += skip;
                true
            }
            BlockKind::HtmlBlock => !blank,
            BlockKind::Paragraph => {
                paragraph_ended = blank;
                !blank
            }
            _ => true,
        };
        if paragraph_ended {
            self.doc[container].last_line_blank = true;
        }
        matched
    }

    /// A setext underline only applies to a paragraph holding exactly one line.
    fn setext_level(&self, container: BlockId, rest: &str) -> Option<u8> {
        let block = &self.doc[container];
        if block.kind != BlockKind::Paragraph || block.raw_lines.len() != 1 {
            return None;
        }
        parse_setext_underline(rest)
    }

    fn close_unmatched(&mut self, unmatched: &mut Unmatched, line_number: usize) {
        if unmatched.closed {
            return;
        }
        while unmatched.old_tip != unmatched.last_matched {
            self.finalize_block(unmatched.old_tip, line_number);
            match self.doc[unmatched.old_tip].parent {
                Some(parent) => unmatched.old_tip = parent,
                None => break,
            }
        }
        unmatched.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(lines: &[&str]) -> Document {
        let mut parser = BlockParser::new();
        for (i, line) in lines.iter().enumerate() {
            parser.incorporate_line(line, i + 1).unwrap();
        }
        parser.finalize(lines.len() + 1);
        parser.into_document()
    }

    fn only_child(doc: &Document, id: BlockId) -> BlockId {
        assert_eq!(doc[id].children.len(), 1, "{doc}");
        doc[id].children[0]
    }

    #[test]
    fn lazy_continuation_stays_in_blockquote() {
        let doc = feed(&["> a", "b"]);
        let quote = only_child(&doc, doc.root());
        assert_eq!(doc[quote].kind, BlockKind::BlockQuote);
        let para = only_child(&doc, quote);
        assert_eq!(doc[para].raw_lines, ["a", "b"]);
        assert_eq!((doc[quote].start_line, doc[quote].end_line), (1, 2));
    }

    #[test]
    fn setext_converts_paragraph_in_place() {
        let doc = feed(&["Title", "---"]);
        let heading = only_child(&doc, doc.root());
        assert_eq!(doc[heading].kind, BlockKind::SetextHeading { level: 2 });
    }

    #[test]
    fn setext_requires_single_line_paragraph() {
        let doc = feed(&["one", "two", "==="]);
        let para = only_child(&doc, doc.root());
        assert_eq!(doc[para].kind, BlockKind::Paragraph);
    }

    #[test]
    fn same_list_accepts_different_start_numbers() {
        let doc = feed(&["1. a", "5. b", "3) c"]);
        let kinds: Vec<_> = doc.children(doc.root()).map(|b| b.kind.name()).collect();
        assert_eq!(kinds, ["List", "List"]);
        let first = doc[doc.root()].children[0];
        assert_eq!(doc[first].children.len(), 2);
    }

    #[test]
    fn second_blank_line_closes_nested_lists() {
        let doc = feed(&["- a", "  - b", "", "", "  c"]);
        let kinds: Vec<_> = doc.children(doc.root()).map(|b| b.kind.name()).collect();
        assert_eq!(kinds, ["List", "Paragraph"]);
    }

    #[test]
    fn indented_line_continues_paragraph() {
        let doc = feed(&["text", "    more"]);
        let para = only_child(&doc, doc.root());
        assert_eq!(doc[para].kind, BlockKind::Paragraph);
    }

    #[test]
    fn fenced_code_range_includes_closing_fence() {
        let doc = feed(&["```", "x", "```", "after"]);
        let code = doc[doc.root()].children[0];
        assert_eq!((doc[code].start_line, doc[code].end_line), (1, 3));
        let para = doc[doc.root()].children[1];
        assert_eq!((doc[para].start_line, doc[para].end_line), (4, 4));
    }

    #[test]
    fn fence_offset_is_stripped_from_content() {
        let doc = feed(&["  ```", "    code", "  ```"]);
        let code = only_child(&doc, doc.root());
        assert_eq!(doc[code].content, "  code\n");
    }

    #[test]
    fn start_columns_are_one_based() {
        let doc = feed(&["  > quote"]);
        let quote = only_child(&doc, doc.root());
        let para = only_child(&doc, quote);
        assert_eq!(doc[quote].start_column, 5);
        assert_eq!(doc[para].start_column, 5);
    }
}
