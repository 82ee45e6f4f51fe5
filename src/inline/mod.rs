mod links;
mod scanner;

use crate::ast::Inline;
use crate::pattern::{
    EMAIL_AUTOLINK, ENTITY, HTML_TAG, LINK_DESTINATION_BRACES, LINK_TITLE, URI_AUTOLINK,
    collapse_code_whitespace, unescape,
};
use crate::{is_ascii_punctuation, utf8_char_len};
use std::borrow::Cow;
use std::collections::HashMap;

pub(crate) use scanner::InlineScanner;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkReference {
    pub destination: String,
    pub title: Option<String>,
}

pub(crate) type LinkRefMap = HashMap<String, LinkReference>;

/// Case-folds a link label and collapses internal whitespace runs to a
/// single space.
pub(crate) fn normalize_reference_label(label: &str) -> Cow<'_, str> {
    let trimmed = label.trim();
    let bytes = trimmed.as_bytes();

    let mut simple = true;
    let mut prev_space = false;
    for &b in bytes {
        if b.is_ascii_uppercase() || b == b'\t' || b == b'\n' || b == b'\r' || b >= 0x80 {
            simple = false;
            break;
        }
        if b == b' ' {
            if prev_space {
                simple = false;
                break;
            }
            prev_space = true;
        } else {
            prev_space = false;
        }
    }
    if simple {
        return Cow::Borrowed(trimmed);
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut in_space = false;
    for c in trimmed.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
            continue;
        }
        in_space = false;
        match c {
            'ß' | 'ẞ' => out.push_str("ss"),
            _ => out.extend(c.to_lowercase()),
        }
    }
    Cow::Owned(out)
}

/// Parses the text of paragraphs and headings into [`Inline`] nodes.
///
/// Owns the reference map for one document. Definitions are registered by
/// [`parse_reference`](Self::parse_reference) while blocks are finalized,
/// before any inline content is parsed.
#[derive(Debug, Default)]
pub(crate) struct InlineParser {
    refmap: LinkRefMap,
}

impl InlineParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn parse(&self, subject: &str) -> Vec<Inline> {
        InlineScanner::new(subject, Some(&self.refmap), 0).parse_all()
    }

    /// Tries to read one link reference definition from the start of
    /// `subject`, returning the number of bytes it spans. The first
    /// definition of a label wins; later ones are consumed but ignored.
    pub(crate) fn parse_reference(&mut self, subject: &str) -> Option<usize> {
        let (consumed, label, reference) =
            InlineScanner::new(subject, Some(&self.refmap), 0).scan_reference()?;
        if self.refmap.contains_key(&label) {
            log::debug!("ignoring duplicate reference definition [{label}]");
        } else {
            log::debug!("reference [{label}] -> {}", reference.destination);
            self.refmap.insert(label, reference);
        }
        Some(consumed)
    }

    #[cfg(test)]
    pub(crate) fn reference(&self, label: &str) -> Option<&LinkReference> {
        self.refmap.get(normalize_reference_label(label).as_ref())
    }
}
