//! # stmd
//!
//! A two-phase Markdown parser in the style of the original `stmd` reference
//! implementation. Lines are folded one at a time into a tree of container
//! and leaf blocks; once the document is closed, the text of paragraphs and
//! headings is parsed into inline nodes, and the tree is rendered to HTML.
//!
//! ## Usage
//!
//! ```
//! use stmd::{markdown_to_html, parse, HtmlRenderer, RenderOptions};
//!
//! // One call
//! let html = markdown_to_html("# Hello, *world*!");
//! assert_eq!(html, "<h1>Hello, <em>world</em>!</h1>\n");
//!
//! // Or keep the tree and choose the rendering
//! let doc = parse("a\nb");
//! let renderer = HtmlRenderer::new(RenderOptions {
//!     soft_break: " ".to_string(),
//!     ..Default::default()
//! });
//! assert_eq!(renderer.render(&doc), "<p>a b</p>\n");
//! ```
//!
//! Lines can also be fed incrementally through [`BlockParser`], which is
//! how the `stmd` binary reads standard input.

pub mod ast;
mod block;
mod error;
mod html;
mod inline;
mod pattern;
mod render;

pub use ast::{Block, BlockId, BlockKind, Document, Inline, ListData, ListType};
pub use block::{BlockParser, parse};
pub use error::IncorporateError;
pub use inline::LinkReference;
pub use render::{HtmlRenderer, RenderOptions};

/// Parses `markdown` and renders it with the default [`RenderOptions`].
pub fn markdown_to_html(markdown: &str) -> String {
    HtmlRenderer::default().render(&parse(markdown))
}

#[inline(always)]
pub(crate) fn is_ascii_punctuation(b: u8) -> bool {
    matches!(b, b'!'..=b'/' | b':'..=b'@' | b'['..=b'`' | b'{'..=b'~')
}

#[inline(always)]
pub(crate) fn utf8_char_len(first: u8) -> usize {
    if first < 0x80 {
        1
    } else if first < 0xE0 {
        2
    } else if first < 0xF0 {
        3
    } else {
        4
    }
}
