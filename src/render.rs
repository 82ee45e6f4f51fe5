use crate::ast::{BlockId, BlockKind, Document, Inline, ListType};
use crate::html::{escape_attribute_into, escape_html_into};
use std::fmt::Write;

/// Output knobs for [`HtmlRenderer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emitted for a soft line break inside a paragraph. Common choices are
    /// `"\n"`, `" "` and `"<br />"`. Default: `"\n"`.
    pub soft_break: String,
    /// Placed between the rendered outputs of sibling blocks. Default: `"\n"`.
    pub block_separator: String,
    /// Placed just inside the tags of block quotes and lists. Default: `"\n"`.
    pub inner_separator: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            soft_break: "\n".to_string(),
            block_separator: "\n".to_string(),
            inner_separator: "\n".to_string(),
        }
    }
}

/// Renders a finalized [`Document`] to HTML.
///
/// Rendering is a pure function of the tree; the same document always
/// yields the same output.
#[derive(Clone, Debug, Default)]
pub struct HtmlRenderer {
    options: RenderOptions,
}

impl HtmlRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Renders the whole document. Non-empty output ends with a newline.
    pub fn render(&self, doc: &Document) -> String {
        self.render_block(doc, doc.root(), false)
    }

    /// Renders one block and its descendants. `in_tight_list` drops the
    /// `<p>` wrapper of a paragraph directly inside a tight list item.
    pub fn render_block(&self, doc: &Document, id: BlockId, in_tight_list: bool) -> String {
        let mut out = String::new();
        self.write_block(&mut out, doc, id, in_tight_list);
        out
    }

    fn write_block(&self, out: &mut String, doc: &Document, id: BlockId, in_tight_list: bool) {
        let block = &doc[id];
        let inner = &self.options.inner_separator;
        match &block.kind {
            BlockKind::Document => {
                let start = out.len();
                self.write_blocks(out, doc, id, false);
                if out.len() > start {
                    out.push('\n');
                }
            }
            BlockKind::Paragraph => {
                if in_tight_list {
                    self.write_inlines(out, &block.inlines);
                } else {
                    out.push_str("<p>");
                    self.write_inlines(out, &block.inlines);
                    out.push_str("</p>");
                }
            }
            BlockKind::BlockQuote => {
                out.push_str("<blockquote>");
                out.push_str(inner);
                let start = out.len();
                self.write_blocks(out, doc, id, false);
                if out.len() > start {
                    out.push_str(inner);
                }
                out.push_str("</blockquote>");
            }
            BlockKind::ListItem { .. } => {
                let mut contents = String::new();
                self.write_blocks(&mut contents, doc, id, in_tight_list);
                out.push_str("<li>");
                out.push_str(contents.trim());
                out.push_str("</li>");
            }
            BlockKind::List { data, tight } => {
                let tag = match data.list_type {
                    ListType::Bullet(_) => {
                        out.push_str("<ul>");
                        "</ul>"
                    }
                    ListType::Ordered { start: 1, .. } => {
                        out.push_str("<ol>");
                        "</ol>"
                    }
                    ListType::Ordered { start, .. } => {
                        let _ = write!(out, "<ol start=\"{start}\">");
                        "</ol>"
                    }
                };
                out.push_str(inner);
                self.write_blocks(out, doc, id, *tight);
                out.push_str(inner);
                out.push_str(tag);
            }
            BlockKind::AtxHeading { level } | BlockKind::SetextHeading { level } => {
                let _ = write!(out, "<h{level}>");
                self.write_inlines(out, &block.inlines);
                let _ = write!(out, "</h{level}>");
            }
            BlockKind::IndentedCode => {
                out.push_str("<pre><code>");
                escape_html_into(out, &block.content);
                out.push_str("</code></pre>");
            }
            BlockKind::FencedCode { info, .. } => {
                out.push_str("<pre><code");
                if let Some(word) = info.split(' ').next().filter(|w| !w.is_empty()) {
                    out.push_str(" class=\"");
                    escape_attribute_into(out, word);
                    out.push('"');
                }
                out.push('>');
                escape_html_into(out, &block.content);
                out.push_str("</code></pre>");
            }
            BlockKind::HtmlBlock => out.push_str(&block.content),
            BlockKind::ThematicBreak => out.push_str("<hr />"),
            BlockKind::ReferenceDefinition => {}
        }
    }

    /// Children of `parent` joined by the block separator. Reference
    /// definitions are skipped entirely rather than rendered empty.
    fn write_blocks(&self, out: &mut String, doc: &Document, parent: BlockId, in_tight_list: bool) {
        let mut first = true;
        for &child in &doc[parent].children {
            if doc[child].kind == BlockKind::ReferenceDefinition {
                continue;
            }
            if !first {
                out.push_str(&self.options.block_separator);
            }
            first = false;
            self.write_block(out, doc, child, in_tight_list);
        }
    }

    fn write_inlines(&self, out: &mut String, inlines: &[Inline]) {
        for inline in inlines {
            self.write_inline(out, inline);
        }
    }

    fn write_inline(&self, out: &mut String, inline: &Inline) {
        match inline {
            Inline::Str(text) => escape_html_into(out, text),
            Inline::Softbreak => out.push_str(&self.options.soft_break),
            Inline::Hardbreak => out.push_str("<br />\n"),
            Inline::Emphasis(children) => {
                out.push_str("<em>");
                self.write_inlines(out, children);
                out.push_str("</em>");
            }
            Inline::Strong(children) => {
                out.push_str("<strong>");
                self.write_inlines(out, children);
                out.push_str("</strong>");
            }
            Inline::RawHtml(html) | Inline::Entity(html) => out.push_str(html),
            Inline::Code(code) => {
                out.push_str("<code>");
                escape_html_into(out, code);
                out.push_str("</code>");
            }
            Inline::Link {
                destination,
                title,
                label,
            } => {
                out.push_str("<a href=\"");
                escape_attribute_into(out, destination);
                out.push('"');
                write_title(out, title);
                out.push('>');
                self.write_inlines(out, label);
                out.push_str("</a>");
            }
            Inline::Image {
                destination,
                title,
                label,
            } => {
                out.push_str("<img src=\"");
                escape_attribute_into(out, destination);
                out.push_str("\" alt=\"");
                // alt carries the rendered label markup, escaped as an attribute
                let mut alt = String::new();
                self.write_inlines(&mut alt, label);
                escape_attribute_into(out, &alt);
                out.push('"');
                write_title(out, title);
                out.push_str(" />");
            }
        }
    }
}

#[inline]
fn write_title(out: &mut String, title: &str) {
    if !title.is_empty() {
        out.push_str(" title=\"");
        escape_attribute_into(out, title);
        out.push('"');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn render(input: &str) -> String {
        HtmlRenderer::default().render(&parse(input))
    }

    #[test]
    fn empty_document_renders_nothing() {
        assert_eq!(render(""), "");
        assert_eq!(render("[a]: /url"), "");
    }

    #[test]
    fn empty_blockquote() {
        assert_eq!(render(">"), "<blockquote>\n</blockquote>\n");
    }

    #[test]
    fn ordered_list_start() {
        assert_eq!(render("3. a\n4. b"), "<ol start=\"3\">\n<li>a</li>\n<li>b</li>\n</ol>\n");
        assert_eq!(render("1) a"), "<ol>\n<li>a</li>\n</ol>\n");
    }

    #[test]
    fn soft_break_option() {
        let renderer = HtmlRenderer::new(RenderOptions {
            soft_break: "<br />".to_string(),
            ..RenderOptions::default()
        });
        assert_eq!(renderer.render(&parse("a\nb")), "<p>a<br />b</p>\n");
    }

    #[test]
    fn image_alt_is_escaped_label_markup() {
        assert_eq!(
            render("![*a* `b`](/i \"t\")"),
            "<p><img src=\"/i\" alt=\"&lt;em&gt;a&lt;/em&gt; &lt;code&gt;b&lt;/code&gt;\" title=\"t\" /></p>\n"
        );
        assert_eq!(render("![a & b](/i)"), "<p><img src=\"/i\" alt=\"a &amp; b\" /></p>\n");
    }

    #[test]
    fn render_single_block() {
        let doc = parse("- a\n- b");
        let list = doc[doc.root()].children[0];
        let item = doc[list].children[0];
        let para = doc[item].children[0];
        let renderer = HtmlRenderer::default();
        assert_eq!(renderer.render_block(&doc, para, true), "a");
        assert_eq!(renderer.render_block(&doc, para, false), "<p>a</p>");
    }
}
