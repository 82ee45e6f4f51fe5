use super::*;
use super::scanner::MAX_NESTING;

/// Parenthesis nesting accepted inside a bare link destination.
const MAX_PAREN_DEPTH: usize = 32;

impl<'a> InlineScanner<'a> {
    /// Scans a bracketed label starting at `[` and returns its length
    /// including both brackets, or 0 without moving the cursor.
    pub(super) fn parse_link_label(&mut self) -> usize {
        if self.peek() != Some(b'[') {
            return 0;
        }
        if self.label_nest_level > 0 {
            self.label_nest_level -= 1;
            return 0;
        }
        let start = self.pos;
        self.pos += 1;
        let mut nest = 0usize;
        let mut scratch = Vec::new();

        loop {
            let Some(c) = self.peek() else {
                self.label_nest_level = nest;
                self.pos = start;
                return 0;
            };
            match c {
                b']' if nest == 0 => break,
                b']' => {
                    nest -= 1;
                    self.pos += 1;
                }
                b'[' => {
                    nest += 1;
                    self.pos += 1;
                }
                b'`' => {
                    self.parse_backticks(&mut scratch);
                }
                b'<' => {
                    let _ = self.parse_autolink(&mut scratch)
                        || self.parse_html_tag(&mut scratch)
                        || self.parse_string(&mut scratch);
                }
                b'\\' => {
                    self.parse_escaped(&mut scratch);
                }
                _ => {
                    self.parse_string(&mut scratch);
                }
            }
            scratch.clear();
        }

        self.label_nest_level = 0;
        self.pos += 1;
        self.pos - start
    }

    /// `[label](destination "title")`, `[label][ref]`, `[label][]` or
    /// `[label]`. On failure nothing is consumed.
    pub(super) fn parse_link(&mut self, inlines: &mut Vec<Inline>) -> bool {
        if self.depth >= MAX_NESTING {
            return false;
        }
        let input = self.input;
        let start = self.pos;
        let n = self.parse_link_label();
        if n == 0 {
            return false;
        }
        let raw_label = &input[start + 1..start + n - 1];

        let target = if self.peek() == Some(b'(') {
            self.pos += 1;
            self.parse_inline_target()
        } else {
            self.parse_reference_target(raw_label)
        };

        match target {
            Some((destination, title)) => {
                let label = InlineScanner::new(raw_label, None, self.depth + 1).parse_all();
                inlines.push(Inline::Link {
                    destination,
                    title,
                    label,
                });
                true
            }
            None => {
                self.pos = start;
                false
            }
        }
    }

    /// The part of an inline link after `(`. A title is only recognized
    /// when whitespace separates it from the destination.
    fn parse_inline_target(&mut self) -> Option<(String, String)> {
        self.spnl();
        let destination = self.parse_link_destination()?;
        self.spnl();
        let title = match self.pos.checked_sub(1).map(|i| self.bytes[i]) {
            Some(b' ' | b'\n') => self.parse_link_title(),
            _ => None,
        };
        self.spnl();
        if self.peek() != Some(b')') {
            return None;
        }
        self.pos += 1;
        Some((destination, title.unwrap_or_default()))
    }

    fn parse_reference_target(&mut self, raw_label: &str) -> Option<(String, String)> {
        let refmap = self.refmap?;
        let input = self.input;
        let after_label = self.pos;
        self.spnl();
        let before_second = self.pos;
        let n = self.parse_link_label();
        let key = if n > 2 {
            &input[before_second + 1..before_second + n - 1]
        } else {
            if n == 0 {
                self.pos = after_label;
            }
            raw_label
        };
        let reference = refmap.get(normalize_reference_label(key).as_ref())?;
        Some((
            reference.destination.clone(),
            reference.title.clone().unwrap_or_default(),
        ))
    }

    /// `![label](...)`. Without a valid link the `!` stays literal.
    pub(super) fn parse_image(&mut self, inlines: &mut Vec<Inline>) -> bool {
        if self.peek() != Some(b'!') {
            return false;
        }
        self.pos += 1;
        if !self.parse_link(inlines) {
            inlines.push(Inline::Str("!".to_string()));
            return true;
        }
        if let Some(Inline::Link {
            destination,
            title,
            label,
        }) = inlines.pop()
        {
            inlines.push(Inline::Image {
                destination,
                title,
                label,
            });
        }
        true
    }

    /// Either `<...>` or a run of non-space characters whose unescaped
    /// parentheses balance. The bare form may be empty.
    pub(super) fn parse_link_destination(&mut self) -> Option<String> {
        if let Some(m) = LINK_DESTINATION_BRACES.find(self.rest()) {
            let inner = &m.as_str()[1..m.len() - 1];
            self.pos += m.len();
            return Some(unescape(inner).into_owned());
        }
        let start = self.pos;
        let mut i = start;
        let mut depth = 0usize;
        let mut last_balanced = start;
        while let Some(&b) = self.bytes.get(i) {
            match b {
                0..=0x20 => break,
                b'\\' => {
                    i += match self.bytes.get(i + 1) {
                        Some(&next) if is_ascii_punctuation(next) => 2,
                        _ => 1,
                    };
                }
                b'(' => {
                    if depth == MAX_PAREN_DEPTH {
                        break;
                    }
                    depth += 1;
                    i += 1;
                }
                b')' => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    i += 1;
                }
                _ => i += utf8_char_len(b),
            }
            if depth == 0 {
                last_balanced = i;
            }
        }

        self.pos = last_balanced;
        Some(unescape(&self.input[start..last_balanced]).into_owned())
    }

    pub(super) fn parse_link_title(&mut self) -> Option<String> {
        let m = LINK_TITLE.find(self.rest())?;
        let inner = &m.as_str()[1..m.len() - 1];
        self.pos += m.len();
        Some(unescape(inner).into_owned())
    }

    pub(super) fn parse_autolink(&mut self, inlines: &mut Vec<Inline>) -> bool {
        let rest = self.rest();
        let (destination, address, len) = if let Some(caps) = EMAIL_AUTOLINK.captures(rest) {
            let address = &caps[1];
            (format!("mailto:{address}"), address.to_string(), caps[0].len())
        } else if let Some(caps) = URI_AUTOLINK.captures(rest) {
            (caps[1].to_string(), caps[1].to_string(), caps[0].len())
        } else {
            return false;
        };
        self.pos += len;
        inlines.push(Inline::Link {
            destination,
            title: String::new(),
            label: vec![Inline::Str(address)],
        });
        true
    }

    pub(super) fn parse_html_tag(&mut self, inlines: &mut Vec<Inline>) -> bool {
        let Some(m) = HTML_TAG.find(self.rest()) else {
            return false;
        };
        inlines.push(Inline::RawHtml(m.as_str().to_string()));
        self.pos += m.len();
        true
    }

    pub(super) fn parse_entity(&mut self, inlines: &mut Vec<Inline>) -> bool {
        let Some(m) = ENTITY.find(self.rest()) else {
            return false;
        };
        inlines.push(Inline::Entity(m.as_str().to_string()));
        self.pos += m.len();
        true
    }

    /// Reads `[label]: destination "title"` from the start of the input,
    /// returning the bytes consumed, the normalized label and the target.
    pub(crate) fn scan_reference(mut self) -> Option<(usize, String, LinkReference)> {
        let n = self.parse_link_label();
        if n == 0 {
            return None;
        }
        let label = normalize_reference_label(&self.input[1..n - 1]).into_owned();
        if label.is_empty() || self.peek() != Some(b':') {
            return None;
        }
        self.pos += 1;

        self.spnl();
        let destination = self.parse_link_destination()?;
        if destination.is_empty() {
            return None;
        }

        let before_title = self.pos;
        self.spnl();
        let title = self.parse_link_title();
        if title.is_none() {
            self.pos = before_title;
        }

        self.skip_spaces();
        match self.peek() {
            None => {}
            Some(b'\n') => self.pos += 1,
            Some(_) => return None,
        }

        Some((
            self.pos,
            label,
            LinkReference { destination, title },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn refmap() -> LinkRefMap {
        let mut map = LinkRefMap::new();
        map.insert(
            "foo".to_string(),
            LinkReference {
                destination: "/url".into(),
                title: Some("t".into()),
            },
        );
        map
    }

    fn parse_with(input: &str, map: &LinkRefMap) -> Vec<Inline> {
        InlineScanner::new(input, Some(map), 0).parse_all()
    }

    fn link(destination: &str, title: &str, label: &str) -> Inline {
        Inline::Link {
            destination: destination.into(),
            title: title.into(),
            label: vec![Inline::Str(label.into())],
        }
    }

    #[test]
    fn inline_links() {
        let map = LinkRefMap::new();
        assert_eq!(parse_with("[a](/u)", &map), vec![link("/u", "", "a")]);
        assert_eq!(parse_with("[a](/u \"t\")", &map), vec![link("/u", "t", "a")]);
        assert_eq!(parse_with("[a](<my url>)", &map), vec![link("my url", "", "a")]);
        assert_eq!(parse_with("[a]()", &map), vec![link("", "", "a")]);
        assert_eq!(parse_with("[a](x(y)z)", &map), vec![link("x(y)z", "", "a")]);
    }

    #[test]
    fn title_needs_preceding_space() {
        let map = LinkRefMap::new();
        let out = parse_with("[a](</u>\"t\")", &map);
        assert!(!matches!(out.first(), Some(Inline::Link { .. })));
    }

    #[test]
    fn reference_links() {
        let map = refmap();
        assert_eq!(parse_with("[foo]", &map), vec![link("/url", "t", "foo")]);
        assert_eq!(parse_with("[Foo][]", &map), vec![link("/url", "t", "Foo")]);
        assert_eq!(parse_with("[text][FOO]", &map), vec![link("/url", "t", "text")]);
        assert_eq!(parse_with("[text] [foo]", &map), vec![link("/url", "t", "text")]);
    }

    #[test]
    fn undefined_reference_is_text() {
        let map = refmap();
        assert_eq!(
            parse_with("[bar]", &map),
            vec![
                Inline::Str("[".into()),
                Inline::Str("bar".into()),
                Inline::Str("]".into())
            ]
        );
    }

    #[test]
    fn nested_brackets_in_label() {
        let map = LinkRefMap::new();
        match &parse_with("[a [b] c](/u)", &map)[..] {
            [Inline::Link { label, .. }] => assert_eq!(label.len(), 5),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unclosed_brackets_short_circuit() {
        let input = "[".repeat(1000);
        let mut scanner = InlineScanner::new(&input, None, 0);
        assert_eq!(scanner.parse_link_label(), 0);
        assert_eq!(scanner.label_nest_level, 999);
        assert_eq!(scanner.pos, 0);
    }

    #[test]
    fn images() {
        let map = LinkRefMap::new();
        assert_eq!(
            parse_with("![alt](/i.png)", &map),
            vec![Inline::Image {
                destination: "/i.png".into(),
                title: String::new(),
                label: vec![Inline::Str("alt".into())],
            }]
        );
        assert_eq!(
            parse_with("!x", &map),
            vec![Inline::Str("!".into()), Inline::Str("x".into())]
        );
    }

    #[test]
    fn autolinks() {
        let map = LinkRefMap::new();
        assert_eq!(
            parse_with("<foo@bar.com>", &map),
            vec![link("mailto:foo@bar.com", "", "foo@bar.com")]
        );
        assert_eq!(
            parse_with("<http://x.org/a>", &map),
            vec![link("http://x.org/a", "", "http://x.org/a")]
        );
    }

    #[test]
    fn raw_html_and_entities() {
        let map = LinkRefMap::new();
        assert_eq!(
            parse_with("<b>&amp;", &map),
            vec![Inline::RawHtml("<b>".into()), Inline::Entity("&amp;".into())]
        );
        assert_eq!(
            parse_with("<3", &map),
            vec![Inline::Str("<".into()), Inline::Str("3".into())]
        );
    }

    #[test]
    fn unbalanced_destination_stops_at_last_balanced_point() {
        let mut scanner = InlineScanner::new("a(b", None, 0);
        assert_eq!(scanner.parse_link_destination().as_deref(), Some("a"));
        assert_eq!(scanner.pos, 1);
    }
}
