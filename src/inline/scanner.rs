use super::*;

/// Deepest emphasis or link-label nesting parsed recursively; runs opened
/// below this depth are kept as literal text.
pub(super) const MAX_NESTING: usize = 128;

static SPECIAL: [bool; 256] = {
    let mut t = [false; 256];
    t[b'\n' as usize] = true;
    t[b'`' as usize] = true;
    t[b'[' as usize] = true;
    t[b']' as usize] = true;
    t[b'\\' as usize] = true;
    t[b'!' as usize] = true;
    t[b'<' as usize] = true;
    t[b'&' as usize] = true;
    t[b'*' as usize] = true;
    t[b'_' as usize] = true;
    t
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct DelimRun {
    pub count: usize,
    pub can_open: bool,
    pub can_close: bool,
}

/// Cursor over one block's text. Every `parse_*` method either consumes
/// input and appends to `inlines`, returning `true`, or leaves both
/// untouched and returns `false`.
pub(crate) struct InlineScanner<'a> {
    pub(super) input: &'a str,
    pub(super) bytes: &'a [u8],
    pub(super) pos: usize,
    pub(super) refmap: Option<&'a LinkRefMap>,
    /// Bracket depth already shown to reach end of input without a closing
    /// `]`; later label scans that start inside it fail immediately.
    pub(super) label_nest_level: usize,
    pub(super) depth: usize,
}

impl<'a> InlineScanner<'a> {
    pub(crate) fn new(input: &'a str, refmap: Option<&'a LinkRefMap>, depth: usize) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            refmap,
            label_nest_level: 0,
            depth,
        }
    }

    #[inline(always)]
    pub(super) fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    pub(super) fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Skips spaces, at most one newline, then spaces again.
    pub(super) fn spnl(&mut self) {
        self.skip_spaces();
        if self.peek() == Some(b'\n') {
            self.pos += 1;
            self.skip_spaces();
        }
    }

    #[inline]
    pub(super) fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    pub(crate) fn parse_all(mut self) -> Vec<Inline> {
        let mut inlines = Vec::new();
        while self.parse_inline(&mut inlines) {}
        inlines
    }

    /// Parses one inline element at the cursor. Returns `false` only at the
    /// end of input.
    pub(super) fn parse_inline(&mut self, inlines: &mut Vec<Inline>) -> bool {
        let Some(c) = self.peek() else {
            return false;
        };
        let handled = match c {
            b'\n' => self.parse_newline(inlines),
            b'\\' => self.parse_escaped(inlines),
            b'`' => self.parse_backticks(inlines),
            b'*' | b'_' => self.parse_emphasis(inlines),
            b'[' => self.parse_link(inlines),
            b'!' => self.parse_image(inlines),
            b'<' => self.parse_autolink(inlines) || self.parse_html_tag(inlines),
            b'&' => self.parse_entity(inlines),
            _ => false,
        };
        handled || self.parse_string(inlines)
    }

    /// A single special character, or the longest run of ordinary text.
    pub(super) fn parse_string(&mut self, inlines: &mut Vec<Inline>) -> bool {
        let Some(b) = self.peek() else {
            return false;
        };
        let start = self.pos;
        if SPECIAL[b as usize] {
            self.pos += 1;
        } else {
            while let Some(b) = self.peek() {
                if SPECIAL[b as usize] {
                    break;
                }
                self.pos += 1;
            }
        }
        inlines.push(Inline::Str(self.input[start..self.pos].to_string()));
        true
    }

    pub(super) fn parse_newline(&mut self, inlines: &mut Vec<Inline>) -> bool {
        if self.peek() != Some(b'\n') {
            return false;
        }
        self.pos += 1;
        if let Some(Inline::Str(last)) = inlines.last_mut() {
            if last.ends_with("  ") {
                last.truncate(last.trim_end_matches(' ').len());
                inlines.push(Inline::Hardbreak);
                return true;
            }
            if last.ends_with(' ') {
                last.pop();
            }
        }
        inlines.push(Inline::Softbreak);
        true
    }

    pub(super) fn parse_escaped(&mut self, inlines: &mut Vec<Inline>) -> bool {
        if self.peek() != Some(b'\\') {
            return false;
        }
        match self.bytes.get(self.pos + 1) {
            Some(b'\n') => {
                inlines.push(Inline::Hardbreak);
                self.pos += 2;
            }
            Some(&next) if is_ascii_punctuation(next) => {
                inlines.push(Inline::Str((next as char).to_string()));
                self.pos += 2;
            }
            _ => {
                inlines.push(Inline::Str("\\".to_string()));
                self.pos += 1;
            }
        }
        true
    }

    /// Code span delimited by equal-length backtick runs. Without a closer
    /// the opening run is literal text.
    pub(super) fn parse_backticks(&mut self, inlines: &mut Vec<Inline>) -> bool {
        let start = self.pos;
        let ticks = self.bytes[start..].iter().take_while(|&&b| b == b'`').count();
        if ticks == 0 {
            return false;
        }
        let after_open = start + ticks;
        let mut search = after_open;

        while let Some(found) = memchr::memchr(b'`', &self.bytes[search..]) {
            let run_start = search + found;
            let run = self.bytes[run_start..].iter().take_while(|&&b| b == b'`').count();
            search = run_start + run;
            if run == ticks {
                let code = collapse_code_whitespace(&self.input[after_open..run_start]);
                inlines.push(Inline::Code(code.trim().to_string()));
                self.pos = search;
                return true;
            }
        }

        inlines.push(Inline::Str(self.input[start..after_open].to_string()));
        self.pos = after_open;
        true
    }

    pub(super) fn scan_delims(&self, c: u8) -> DelimRun {
        let count = self.bytes[self.pos..].iter().take_while(|&&b| b == c).count();
        let before = self.input[..self.pos].chars().next_back().unwrap_or('\n');
        let after = self.input[self.pos + count..].chars().next().unwrap_or('\n');

        let mut can_open = (1..=3).contains(&count) && !after.is_whitespace();
        let mut can_close = (1..=3).contains(&count) && !before.is_whitespace();
        if c == b'_' {
            can_open = can_open && !before.is_ascii_alphanumeric();
            can_close = can_close && !after.is_ascii_alphanumeric();
        }
        DelimRun {
            count,
            can_open,
            can_close,
        }
    }

    /// Emphasis by in-place resolution: the opening run is pushed as literal
    /// text, inlines are parsed until a matching closer, and the placeholder
    /// is then replaced by an `Emphasis`/`Strong` node owning everything
    /// after it.
    pub(super) fn parse_emphasis(&mut self, inlines: &mut Vec<Inline>) -> bool {
        let Some(c) = self.peek().filter(|&b| b == b'*' || b == b'_') else {
            return false;
        };
        let open = self.scan_delims(c);
        let start = self.pos;
        self.pos += open.count;
        inlines.push(Inline::Str(self.input[start..self.pos].to_string()));
        let delim_pos = inlines.len() - 1;

        if !open.can_open {
            return true;
        }
        if self.depth >= MAX_NESTING {
            log::debug!("emphasis nesting limit reached at byte {start}");
            return true;
        }

        self.depth += 1;
        match open.count {
            1 => self.close_simple(inlines, c, delim_pos, 1),
            2 => self.close_simple(inlines, c, delim_pos, 2),
            _ => self.close_triple(inlines, c, delim_pos),
        }
        self.depth -= 1;
        true
    }

    fn close_simple(&mut self, inlines: &mut Vec<Inline>, c: u8, delim_pos: usize, width: usize) {
        loop {
            let run = self.scan_delims(c);
            if run.count >= width && run.can_close {
                self.pos += width;
                let children = inlines.split_off(delim_pos + 1);
                inlines[delim_pos] = if width == 1 {
                    Inline::Emphasis(children)
                } else {
                    Inline::Strong(children)
                };
                return;
            }
            if !self.parse_inline(inlines) {
                return;
            }
        }
    }

    /// `***` may close as `*` then `**` (strong around emphasis) or `**` then
    /// `*` (emphasis around strong). A closing `***` counts as `*` first.
    fn close_triple(&mut self, inlines: &mut Vec<Inline>, c: u8, delim_pos: usize) {
        let mut first_close: Option<usize> = None;
        let mut first_width = 0;

        loop {
            let run = self.scan_delims(c);
            if (1..=3).contains(&run.count) && run.can_close && run.count != first_width {
                let width = match first_width {
                    1 => 2,
                    2 => 1,
                    _ if run.count == 3 => 1,
                    _ => run.count,
                };
                self.pos += width;

                let Some(first) = first_close else {
                    inlines.push(Inline::Str(self.input[self.pos - width..self.pos].to_string()));
                    first_close = Some(inlines.len() - 1);
                    first_width = width;
                    continue;
                };

                let after = inlines.split_off(first + 1);
                inlines.truncate(first);
                let inner = inlines.split_off(delim_pos + 1);
                let mut children = Vec::with_capacity(after.len() + 1);
                if first_width == 1 {
                    children.push(Inline::Emphasis(inner));
                    children.extend(after);
                    inlines[delim_pos] = Inline::Strong(children);
                } else {
                    children.push(Inline::Strong(inner));
                    children.extend(after);
                    inlines[delim_pos] = Inline::Emphasis(children);
                }
                return;
            }
            if !self.parse_inline(inlines) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Vec<Inline> {
        InlineScanner::new(input, None, 0).parse_all()
    }

    fn s(text: &str) -> Inline {
        Inline::Str(text.to_string())
    }

    #[test]
    fn plain_text_is_one_node() {
        assert_eq!(parse("hello world"), vec![s("hello world")]);
    }

    #[test]
    fn newline_breaks() {
        assert_eq!(
            parse("a  \nb\nc"),
            vec![s("a"), Inline::Hardbreak, s("b"), Inline::Softbreak, s("c")]
        );
        assert_eq!(parse("a \nb"), vec![s("a"), Inline::Softbreak, s("b")]);
    }

    #[test]
    fn backslash_escapes() {
        assert_eq!(parse("\\*x"), vec![s("*"), s("x")]);
        assert_eq!(parse("a\\\nb"), vec![s("a"), Inline::Hardbreak, s("b")]);
        assert_eq!(parse("\\q"), vec![s("\\"), s("q")]);
    }

    #[test]
    fn code_spans() {
        assert_eq!(parse("`a  b`"), vec![Inline::Code("a b".into())]);
        assert_eq!(parse("`` a ` b ``"), vec![Inline::Code("a ` b".into())]);
        assert_eq!(parse("```x``"), vec![s("```"), s("x"), s("``")]);
        assert_eq!(parse("`a\nb`"), vec![Inline::Code("a b".into())]);
    }

    #[test]
    fn delimiter_flanking() {
        let at = |input: &str, pos: usize, c: u8| {
            let mut scanner = InlineScanner::new(input, None, 0);
            scanner.pos = pos;
            scanner.scan_delims(c)
        };
        assert_eq!(
            at("*a*", 0, b'*'),
            DelimRun {
                count: 1,
                can_open: true,
                can_close: false
            }
        );
        assert!(at("*a*", 2, b'*').can_close);
        assert!(!at("a * b", 2, b'*').can_open);
        assert!(!at("snake_case", 5, b'_').can_open);
        assert!(!at("snake_case", 5, b'_').can_close);
        assert!(at("a**b", 1, b'*').can_open);
        assert_eq!(at("****", 0, b'*').count, 4);
        assert!(!at("****", 0, b'*').can_open);
    }

    #[test]
    fn emphasis_and_strong() {
        assert_eq!(parse("*a*"), vec![Inline::Emphasis(vec![s("a")])]);
        assert_eq!(parse("__a__"), vec![Inline::Strong(vec![s("a")])]);
        assert_eq!(
            parse("***a***"),
            vec![Inline::Strong(vec![Inline::Emphasis(vec![s("a")])])]
        );
        assert_eq!(
            parse("***a** b*"),
            vec![Inline::Emphasis(vec![Inline::Strong(vec![s("a")]), s(" b")])]
        );
        assert_eq!(
            parse("***a* b**"),
            vec![Inline::Strong(vec![Inline::Emphasis(vec![s("a")]), s(" b")])]
        );
    }

    #[test]
    fn unmatched_delimiters_stay_literal() {
        assert_eq!(parse("*foo"), vec![s("*"), s("foo")]);
        assert_eq!(parse("a * b"), vec![s("a "), s("*"), s(" b")]);
        assert_eq!(parse("foo_bar_"), vec![s("foo"), s("_"), s("bar"), s("_")]);
    }

    #[test]
    fn deep_emphasis_nesting_is_bounded() {
        let input = "*a ".repeat(MAX_NESTING * 4);
        let inlines = parse(&input);
        let mut text = String::new();
        inlines.iter().for_each(|i| i.plain_text(&mut text));
        assert_eq!(text, input);
    }
}
