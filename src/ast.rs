use std::fmt;
use std::ops::{Index, IndexMut};

/// Index of a [`Block`] inside its [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ListType {
    Bullet(u8), // marker character: b'-', b'*', b'+'
    Ordered { start: u32, delimiter: u8 },
}

impl ListType {
    /// Two markers belong to the same list when the bullet character, or the
    /// ordered delimiter, agrees. The start number is ignored.
    pub fn same_list(&self, other: &ListType) -> bool {
        match (self, other) {
            (ListType::Bullet(a), ListType::Bullet(b)) => a == b,
            (ListType::Ordered { delimiter: a, .. }, ListType::Ordered { delimiter: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ListData {
    pub list_type: ListType,
    pub marker_offset: usize,
    pub padding: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum BlockKind {
    Document,
    List {
        data: ListData,
        tight: bool,
    },
    ListItem {
        data: ListData,
    },
    Paragraph,
    BlockQuote,
    AtxHeading {
        level: u8,
    },
    SetextHeading {
        level: u8,
    },
    IndentedCode,
    FencedCode {
        fence_offset: usize,
        fence_length: usize,
        fence_char: u8,
        info: String,
    },
    HtmlBlock,
    ReferenceDefinition,
    ThematicBreak,
}

impl BlockKind {
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Document => "Document",
            BlockKind::List { .. } => "List",
            BlockKind::ListItem { .. } => "ListItem",
            BlockKind::Paragraph => "Paragraph",
            BlockKind::BlockQuote => "BlockQuote",
            BlockKind::AtxHeading { .. } => "ATXHeading",
            BlockKind::SetextHeading { .. } => "SetextHeading",
            BlockKind::IndentedCode => "IndentedCode",
            BlockKind::FencedCode { .. } => "FencedCode",
            BlockKind::HtmlBlock => "HtmlBlock",
            BlockKind::ReferenceDefinition => "ReferenceDefinition",
            BlockKind::ThematicBreak => "ThematicBreak",
        }
    }

    /// Whether a block of this kind may hold `child` as a direct child.
    pub fn can_contain(&self, child: &BlockKind) -> bool {
        match self {
            BlockKind::Document | BlockKind::BlockQuote | BlockKind::ListItem { .. } => true,
            BlockKind::List { .. } => matches!(child, BlockKind::ListItem { .. }),
            _ => false,
        }
    }

    pub fn accepts_lines(&self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph | BlockKind::IndentedCode | BlockKind::FencedCode { .. }
        )
    }

    /// Kinds whose lines are taken verbatim; no container starts are
    /// recognized inside them.
    pub fn is_raw_content(&self) -> bool {
        matches!(
            self,
            BlockKind::IndentedCode | BlockKind::FencedCode { .. } | BlockKind::HtmlBlock
        )
    }

    pub fn has_inlines(&self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph | BlockKind::AtxHeading { .. } | BlockKind::SetextHeading { .. }
        )
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::List { data, tight } => match data.list_type {
                ListType::Bullet(c) => {
                    write!(f, "List(type:bullet, tight:{tight}, character:{})", c as char)
                }
                ListType::Ordered { start, delimiter } => write!(
                    f,
                    "List(type:ordered, tight:{tight}, start:{start}, delimiter:{})",
                    delimiter as char
                ),
            },
            BlockKind::AtxHeading { level } => write!(f, "ATXHeading(level:{level})"),
            BlockKind::SetextHeading { level } => write!(f, "SetextHeading(level:{level})"),
            BlockKind::FencedCode {
                fence_length, info, ..
            } => write!(f, "FencedCode(length:{fence_length}, info:{info})"),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "value"))]
pub enum Inline {
    Str(String),
    Entity(String),
    RawHtml(String),
    Code(String),
    Hardbreak,
    Softbreak,
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Link {
        destination: String,
        title: String,
        label: Vec<Inline>,
    },
    Image {
        destination: String,
        title: String,
        label: Vec<Inline>,
    },
}

impl Inline {
    /// Concatenated literal text of this node and its descendants.
    pub fn plain_text(&self, out: &mut String) {
        match self {
            Inline::Str(s) | Inline::Code(s) | Inline::Entity(s) | Inline::RawHtml(s) => {
                out.push_str(s)
            }
            Inline::Hardbreak | Inline::Softbreak => out.push('\n'),
            Inline::Emphasis(children) | Inline::Strong(children) => {
                children.iter().for_each(|c| c.plain_text(out))
            }
            Inline::Link { label, .. } | Inline::Image { label, .. } => {
                label.iter().for_each(|c| c.plain_text(out))
            }
        }
    }
}

fn escape_newlines(s: &str) -> String {
    s.replace('\n', "\\n")
}

impl fmt::Display for Inline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn nested(f: &mut fmt::Formatter<'_>, children: &[Inline]) -> fmt::Result {
            for child in children {
                for line in child.to_string().lines() {
                    write!(f, "\n  {line}")?;
                }
            }
            Ok(())
        }

        match self {
            Inline::Str(s) => write!(f, "Str({})", escape_newlines(s)),
            Inline::Entity(s) => write!(f, "Entity({s})"),
            Inline::RawHtml(s) => write!(f, "HTML({})", escape_newlines(s)),
            Inline::Code(s) => write!(f, "Code({})", escape_newlines(s)),
            Inline::Hardbreak => f.write_str("Hardbreak"),
            Inline::Softbreak => f.write_str("Softbreak"),
            Inline::Emphasis(children) => {
                f.write_str("Emphasis:")?;
                nested(f, children)
            }
            Inline::Strong(children) => {
                f.write_str("Strong:")?;
                nested(f, children)
            }
            Inline::Link {
                destination,
                title,
                label,
            } => {
                write!(f, "Link(destination:{destination}, title:{title}):")?;
                nested(f, label)
            }
            Inline::Image {
                destination,
                title,
                label,
            } => {
                write!(f, "Image(destination:{destination}, title:{title}):")?;
                nested(f, label)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub open: bool,
    pub last_line_blank: bool,
    pub raw_lines: Vec<String>,
    pub content: String,
    pub inlines: Vec<Inline>,
    pub children: Vec<BlockId>,
    pub parent: Option<BlockId>,
}

impl Block {
    pub(crate) fn new(kind: BlockKind, start_line: usize, start_column: usize) -> Self {
        Self {
            kind,
            start_line,
            start_column,
            end_line: start_line,
            open: true,
            last_line_blank: false,
            raw_lines: Vec::new(),
            content: String::new(),
            inlines: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }
}

/// A parsed document: every block lives in one arena, the root at index 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub(crate) fn new() -> Self {
        Self {
            blocks: vec![Block::new(BlockKind::Document, 1, 1)],
        }
    }

    pub fn root(&self) -> BlockId {
        BlockId(0)
    }

    /// Number of blocks in the arena, the root included.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.blocks[0].children.is_empty()
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    pub fn children(&self, id: BlockId) -> impl Iterator<Item = &Block> + '_ {
        self.blocks[id.0].children.iter().map(|&c| &self.blocks[c.0])
    }

    /// Pre-order walk of every block reachable from the root.
    pub fn descendants(&self) -> Vec<BlockId> {
        let mut out = Vec::with_capacity(self.blocks.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.blocks[id.0].children.iter().rev());
        }
        out
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub(crate) fn append_child(&mut self, parent: BlockId, mut block: Block) -> BlockId {
        let id = BlockId(self.blocks.len());
        block.parent = Some(parent);
        self.blocks.push(block);
        self.blocks[parent.0].children.push(id);
        id
    }

    /// The outermost ancestor (or `id` itself) whose kind satisfies `pred`.
    pub(crate) fn highest_ancestor(
        &self,
        id: BlockId,
        pred: impl Fn(&BlockKind) -> bool,
    ) -> Option<BlockId> {
        let mut found = None;
        let mut cur = Some(id);
        while let Some(c) = cur {
            if pred(&self.blocks[c.0].kind) {
                found = Some(c);
            }
            cur = self.blocks[c.0].parent;
        }
        found
    }

    /// Number of ancestors between `id` and the root.
    pub(crate) fn depth(&self, id: BlockId) -> usize {
        let mut depth = 0;
        let mut cur = self.blocks[id.0].parent;
        while let Some(c) = cur {
            depth += 1;
            cur = self.blocks[c.0].parent;
        }
        depth
    }

    pub(crate) fn ends_with_blank_line(&self, id: BlockId) -> bool {
        let mut block = &self.blocks[id.0];
        loop {
            if block.last_line_blank {
                return true;
            }
            match (&block.kind, block.children.last()) {
                (BlockKind::List { .. } | BlockKind::ListItem { .. }, Some(&last)) => {
                    block = &self.blocks[last.0];
                }
                _ => return false,
            }
        }
    }

    fn fmt_block(&self, f: &mut fmt::Formatter<'_>, id: BlockId, depth: usize) -> fmt::Result {
        let block = &self[id];
        let pad = "  ".repeat(depth);
        if !block.children.is_empty() {
            writeln!(f, "{pad}{} ({} children)", block.kind, block.children.len())?;
            for &child in &block.children {
                self.fmt_block(f, child, depth + 1)?;
            }
        } else if !block.inlines.is_empty() {
            writeln!(f, "{pad}{} ({} inlines)", block.kind, block.inlines.len())?;
            for inline in &block.inlines {
                for line in inline.to_string().lines() {
                    writeln!(f, "{pad}  {line}")?;
                }
            }
        } else if block.content.is_empty() {
            writeln!(f, "{pad}{}", block.kind)?;
        } else {
            writeln!(f, "{pad}{} {}", block.kind, escape_newlines(&block.content))?;
        }
        Ok(())
    }
}

impl Index<BlockId> for Document {
    type Output = Block;

    fn index(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }
}

impl IndexMut<BlockId> for Document {
    fn index_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0]
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_block(f, self.root(), 0)
    }
}

#[cfg(feature = "serde")]
mod serialize {
    use super::{BlockId, Document};
    use serde::ser::{Serialize, SerializeStruct, Serializer};

    struct Node<'a> {
        doc: &'a Document,
        id: BlockId,
    }

    impl Serialize for Node<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let block = &self.doc[self.id];
            let children: Vec<Node<'_>> = block
                .children
                .iter()
                .map(|&id| Node { doc: self.doc, id })
                .collect();
            let mut s = serializer.serialize_struct("Block", 7)?;
            s.serialize_field("kind", &block.kind)?;
            s.serialize_field("start_line", &block.start_line)?;
            s.serialize_field("start_column", &block.start_column)?;
            s.serialize_field("end_line", &block.end_line)?;
            s.serialize_field("content", &block.content)?;
            s.serialize_field("inlines", &block.inlines)?;
            s.serialize_field("children", &children)?;
            s.end()
        }
    }

    /// Serializes as a nested tree rooted at the document block.
    impl Serialize for Document {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            Node {
                doc: self,
                id: self.root(),
            }
            .serialize(serializer)
        }
    }
}
