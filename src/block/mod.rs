mod leaf_blocks;
mod parser;

use leaf_blocks::*;

use crate::ast::{Block, BlockId, BlockKind, Document, ListData, ListType};
use crate::error::IncorporateError;
use crate::html::trim_cr;
use crate::inline::InlineParser;
use crate::pattern::{
    ATX_OPEN, BULLET_MARKER, HTML_BLOCK_OPEN, ORDERED_MARKER, SETEXT_UNDERLINE, THEMATIC_BREAK,
    chomp_trailing_blank_lines, strip_atx_closing, strip_leading_spaces, unescape,
};
use std::borrow::Cow;

/// Parse a complete Markdown string into a [`Document`].
///
/// Line endings (`\r\n`, `\r`, `\n`) are normalized, and a single trailing
/// empty line left by a final newline is ignored.
///
/// # Examples
///
/// ```
/// use stmd::parse;
///
/// let doc = parse("# Hello\n\nworld");
/// let kinds: Vec<_> = doc.children(doc.root()).map(|b| b.kind.name()).collect();
/// assert_eq!(kinds, ["ATXHeading", "Paragraph"]);
/// ```
pub fn parse(markdown: &str) -> Document {
    let normalized = normalize_line_endings(markdown);
    let bytes = normalized.as_bytes();
    let mut parser = BlockParser::new();
    let mut line_number = 0;
    let mut start = 0;

    while start < bytes.len() {
        let end = memchr::memchr(b'\n', &bytes[start..]).map_or(bytes.len(), |i| start + i);
        line_number += 1;
        if let Err(err) = parser.incorporate_line(&normalized[start..end], line_number) {
            log::error!("stopped parsing: {err}");
            break;
        }
        start = end + 1;
    }

    parser.finalize(line_number + 1);
    parser.into_document()
}

fn normalize_line_endings(input: &str) -> Cow<'_, str> {
    if memchr::memchr(b'\r', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    for (i, line) in input.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let line = trim_cr(line);
        for (j, piece) in line.split('\r').enumerate() {
            if j > 0 {
                out.push('\n');
            }
            out.push_str(piece);
        }
    }
    Cow::Owned(out)
}

/// Incremental block-structure parser.
///
/// Lines are fed one at a time through [`incorporate_line`](Self::incorporate_line);
/// [`finalize`](Self::finalize) closes whatever is still open and runs the
/// inline pass over every paragraph and heading.
///
/// ```
/// use stmd::BlockParser;
///
/// let mut parser = BlockParser::new();
/// for (i, line) in ["> quoted", "lazy"].iter().enumerate() {
///     parser.incorporate_line(line, i + 1).unwrap();
/// }
/// let doc = parser.finalize(3);
/// assert_eq!(doc.children(doc.root()).count(), 1);
/// ```
pub struct BlockParser {
    doc: Document,
    tip: BlockId,
    inline_parser: InlineParser,
}

impl Default for BlockParser {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockParser {
    pub fn new() -> Self {
        let doc = Document::new();
        let tip = doc.root();
        Self {
            doc,
            tip,
            inline_parser: InlineParser::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Closes every open block, innermost first, and parses inline content.
    /// `line_number` is one past the last line fed in. Calling this again
    /// has no effect.
    pub fn finalize(&mut self, line_number: usize) -> &Document {
        let root = self.doc.root();
        if !self.doc[root].open {
            return &self.doc;
        }
        let mut cur = Some(self.tip);
        while let Some(id) = cur {
            self.finalize_block(id, line_number);
            cur = self.doc[id].parent;
        }
        self.process_inlines();
        &self.doc
    }

    /// Appends a block of `kind` under the tip, closing blocks that cannot
    /// hold it first. `offset` is the zero-based column of the block start.
    fn add_child(
        &mut self,
        kind: BlockKind,
        line_number: usize,
        offset: usize,
    ) -> Result<BlockId, IncorporateError> {
        while !self.doc[self.tip].kind.can_contain(&kind) {
            let tip = self.tip;
            if self.doc[tip].open {
                self.finalize_block(tip, line_number);
            } else if let Some(parent) = self.doc[tip].parent {
                self.tip = parent;
            } else {
                break;
            }
        }
        let parent = self.tip;
        if !self.doc[parent].open {
            return Err(IncorporateError::ClosedContainer {
                line_number,
                kind: self.doc[parent].kind.name(),
            });
        }
        log::trace!("line {line_number}: open {} under {}", kind.name(), self.doc[parent].kind.name());
        let id = self
            .doc
            .append_child(parent, Block::new(kind, line_number, offset + 1));
        self.tip = id;
        Ok(id)
    }

    fn add_line(&mut self, line: &str, offset: usize, line_number: usize) -> Result<(), IncorporateError> {
        let tip = &mut self.doc[self.tip];
        if !tip.open {
            return Err(IncorporateError::ClosedContainer {
                line_number,
                kind: tip.kind.name(),
            });
        }
        tip.raw_lines.push(line[offset..].to_string());
        Ok(())
    }

    /// Closes `id`, derives its final content and moves the tip to its
    /// parent. Already-closed blocks are left untouched.
    fn finalize_block(&mut self, id: BlockId, line_number: usize) {
        let tight = match self.doc[id].kind {
            BlockKind::List { .. } => Some(self.list_is_tight(id)),
            _ => None,
        };

        let block = &mut self.doc[id];
        if !block.open {
            return;
        }
        block.open = false;
        block.end_line = if line_number > block.start_line {
            line_number - 1
        } else {
            line_number
        };
        log::trace!("close {} {}..={}", block.kind.name(), block.start_line, block.end_line);

        match block.kind {
            BlockKind::Paragraph => {
                let joined = block.raw_lines.join("\n");
                let mut content = strip_leading_spaces(&joined).into_owned();
                while content.starts_with('[') {
                    let Some(consumed) = self.inline_parser.parse_reference(&content) else {
                        break;
                    };
                    content.drain(..consumed);
                    if content.trim().is_empty() {
                        block.kind = BlockKind::ReferenceDefinition;
                        break;
                    }
                }
                block.content = content;
            }
            BlockKind::AtxHeading { .. } | BlockKind::SetextHeading { .. } | BlockKind::HtmlBlock => {
                block.content = block.raw_lines.join("\n");
            }
            BlockKind::IndentedCode => {
                block.content = chomp_trailing_blank_lines(&block.raw_lines.join("\n")).into_owned();
            }
            BlockKind::FencedCode { ref mut info, .. } => {
                if let Some((first, body)) = block.raw_lines.split_first() {
                    *info = unescape(first.trim()).into_owned();
                    block.content = if body.is_empty() {
                        String::new()
                    } else {
                        let mut content = body.join("\n");
                        content.push('\n');
                        content
                    };
                }
            }
            BlockKind::List { tight: ref mut t, .. } => {
                if let Some(tight) = tight {
                    *t = tight;
                }
            }
            _ => {}
        }

        if let Some(parent) = block.parent {
            self.tip = parent;
        }
    }

    /// A list is loose when any item but the last ends with a blank line, or
    /// when blank lines separate the children of any item.
    fn list_is_tight(&self, list: BlockId) -> bool {
        let items = &self.doc[list].children;
        for (i, &item) in items.iter().enumerate() {
            let last_item = i + 1 == items.len();
            if self.doc.ends_with_blank_line(item) && !last_item {
                return false;
            }
            let subitems = &self.doc[item].children;
            for (j, &sub) in subitems.iter().enumerate() {
                let last_sub = j + 1 == subitems.len();
                if self.doc.ends_with_blank_line(sub) && !(last_item && last_sub) {
                    return false;
                }
            }
        }
        true
    }

    /// Closes `block` and every ancestor up to and including its outermost
    /// enclosing list.
    fn break_out_of_lists(&mut self, block: BlockId, line_number: usize) {
        let Some(list) = self
            .doc
            .highest_ancestor(block, |k| matches!(k, BlockKind::List { .. }))
        else {
            return;
        };
        log::debug!("line {line_number}: second blank line, leaving list");
        let mut cur = block;
        while cur != list {
            self.finalize_block(cur, line_number);
            match self.doc[cur].parent {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        self.finalize_block(list, line_number);
        if let Some(parent) = self.doc[list].parent {
            self.tip = parent;
        }
    }

    fn process_inlines(&mut self) {
        let parser = &self.inline_parser;
        for block in self.doc.blocks_mut() {
            if block.kind.has_inlines() {
                block.inlines = parser.parse(block.content.trim());
                block.content.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(doc: &Document) -> Vec<&'static str> {
        doc.children(doc.root()).map(|b| b.kind.name()).collect()
    }

    #[test]
    fn normalizes_all_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\nd"), "a\nb\nc\nd");
        assert!(matches!(normalize_line_endings("a\nb"), Cow::Borrowed(_)));
    }

    #[test]
    fn empty_input_yields_empty_document() {
        let doc = parse("");
        assert!(doc.is_empty());
        assert!(!doc[doc.root()].open);
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut parser = BlockParser::new();
        parser.incorporate_line("text", 1).unwrap();
        let first = parser.finalize(2).clone();
        let second = parser.finalize(5).clone();
        assert_eq!(first, second);
    }

    #[test]
    fn reference_only_paragraph_is_reclassified() {
        let doc = parse("[a]: /url\n[b]: /other 'title'");
        assert_eq!(kinds(&doc), ["ReferenceDefinition"]);
    }

    #[test]
    fn paragraph_keeps_text_after_definitions() {
        let doc = parse("[a]: /url\nnot a definition");
        let para = doc.children(doc.root()).next().unwrap();
        assert_eq!(para.kind, BlockKind::Paragraph);
        assert_eq!(para.inlines, vec![crate::Inline::Str("not a definition".into())]);
    }

    #[test]
    fn indented_code_drops_trailing_blank_lines() {
        let doc = parse("    a\n    b\n\n\n");
        let code = doc.children(doc.root()).next().unwrap();
        assert_eq!(code.kind, BlockKind::IndentedCode);
        assert_eq!(code.content, "a\nb\n");
    }

    #[test]
    fn fenced_code_info_is_unescaped() {
        let doc = parse("``` foo\\+bar \ncode\n```");
        let code = doc.children(doc.root()).next().unwrap();
        match &code.kind {
            BlockKind::FencedCode { info, fence_length, .. } => {
                assert_eq!(info, "foo+bar");
                assert_eq!(*fence_length, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(code.content, "code\n");
    }

    #[test]
    fn empty_fence_has_no_content() {
        let doc = parse("```\n```");
        let code = doc.children(doc.root()).next().unwrap();
        assert_eq!(code.content, "");
    }

    #[test]
    fn lines_after_finalize_are_rejected() {
        let mut parser = BlockParser::new();
        parser.incorporate_line("a", 1).unwrap();
        parser.finalize(2);
        let err = parser.incorporate_line("b", 2).unwrap_err();
        assert_eq!(
            err,
            IncorporateError::ClosedContainer {
                line_number: 2,
                kind: "Document"
            }
        );
    }
}
