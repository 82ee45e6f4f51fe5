use crate::pattern::ENTITY;

static NEEDS_ESCAPE: [bool; 256] = {
    let mut t = [false; 256];
    t[b'&' as usize] = true;
    t[b'<' as usize] = true;
    t[b'>' as usize] = true;
    t[b'"' as usize] = true;
    t
};

#[cfg(test)]
pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    escape_html_into(&mut out, input);
    out
}

#[inline]
pub(crate) fn escape_html_into(out: &mut String, input: &str) {
    escape_into(out, input, false);
}

/// Like [`escape_html_into`], but an `&` that already begins a numeric or
/// named entity is copied through unchanged. Used for attribute values.
#[inline]
pub(crate) fn escape_attribute_into(out: &mut String, input: &str) {
    escape_into(out, input, true);
}

fn escape_into(out: &mut String, input: &str, preserve_entities: bool) {
    let bytes = input.as_bytes();
    let mut last = 0;

    for (i, &b) in bytes.iter().enumerate() {
        if !NEEDS_ESCAPE[b as usize] {
            continue;
        }
        let replacement = match b {
            b'&' if preserve_entities && ENTITY.is_match(&input[i..]) => continue,
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            _ => "&quot;",
        };
        out.push_str(&input[last..i]);
        out.push_str(replacement);
        last = i + 1;
    }

    out.push_str(&input[last..]);
}

#[inline(always)]
pub(crate) fn trim_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape_attribute(input: &str) -> String {
        let mut out = String::new();
        escape_attribute_into(&mut out, input);
        out
    }

    #[test]
    fn escapes_all_html_specials() {
        assert_eq!(escape_html("<>&\"'"), "&lt;&gt;&amp;&quot;'");
    }

    #[test]
    fn escapes_into_existing_buffer() {
        let mut out = String::from("x=");
        escape_html_into(&mut out, "<>");
        assert_eq!(out, "x=&lt;&gt;");
    }

    #[test]
    fn plain_text_is_copied() {
        assert_eq!(escape_html("hello wörld"), "hello wörld");
    }

    #[test]
    fn text_escaping_ignores_entities() {
        assert_eq!(escape_html("&amp; &copy;"), "&amp;amp; &amp;copy;");
    }

    #[test]
    fn attributes_preserve_entities() {
        assert_eq!(escape_attribute("/a?b=1&amp;c=2"), "/a?b=1&amp;c=2");
        assert_eq!(escape_attribute("&#x27;&#39;"), "&#x27;&#39;");
        assert_eq!(escape_attribute("a&b \"q\""), "a&amp;b &quot;q&quot;");
    }

    #[test]
    fn trims_windows_cr() {
        assert_eq!(trim_cr("abc\r"), "abc");
        assert_eq!(trim_cr("abc"), "abc");
    }
}
