use super::*;

const TAB_STOP: usize = 4;

/// Expands tabs to spaces with tab stops every four columns.
pub(super) fn detab(line: &str) -> Cow<'_, str> {
    if memchr::memchr(b'\t', line.as_bytes()).is_none() {
        return Cow::Borrowed(line);
    }
    let mut out = String::with_capacity(line.len() + TAB_STOP);
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let width = TAB_STOP - column % TAB_STOP;
            out.extend(std::iter::repeat_n(' ', width));
            column += width;
        } else {
            out.push(c);
            column += 1;
        }
    }
    Cow::Owned(out)
}

/// Position of the first non-space byte at or after `from`, and whether the
/// rest of the line is blank.
#[inline]
pub(super) fn first_nonspace(line: &str, from: usize) -> (usize, bool) {
    let bytes = line.as_bytes();
    let mut i = from;
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    (i, i >= bytes.len())
}

/// Cheap filter run before trying any container start.
#[inline(always)]
pub(super) fn may_start_container(line: &str, offset: usize) -> bool {
    matches!(
        line.as_bytes().get(offset),
        Some(b' ' | b'#' | b'`' | b'~' | b'*' | b'+' | b'_' | b'=' | b'<' | b'>' | b'-' | b'0'..=b'9')
    )
}

/// Recognizes a bullet or ordered list marker at the start of `rest`.
///
/// `marker_offset` is the indentation of the marker relative to the
/// enclosing container. A line that is a thematic break is never a marker.
pub(super) fn parse_list_marker(rest: &str, marker_offset: usize) -> Option<ListData> {
    if THEMATIC_BREAK.is_match(rest) {
        return None;
    }

    let (list_type, marker_len, spaces) = if let Some(caps) = BULLET_MARKER.captures(rest) {
        let whole = caps.get(0)?;
        let spaces = caps.get(1).map_or(0, |m| m.len());
        (ListType::Bullet(rest.as_bytes()[0]), whole.len(), spaces)
    } else if let Some(caps) = ORDERED_MARKER.captures(rest) {
        let whole = caps.get(0)?;
        let start = caps[1].parse().ok()?;
        let delimiter = caps[2].as_bytes()[0];
        let spaces = caps.get(3).map_or(0, |m| m.len());
        (ListType::Ordered { start, delimiter }, whole.len(), spaces)
    } else {
        return None;
    };

    let blank_item = marker_len == rest.len();
    let padding = if blank_item || spaces == 0 || spaces >= 5 {
        marker_len - spaces + 1
    } else {
        marker_len
    };

    Some(ListData {
        list_type,
        marker_offset,
        padding,
    })
}

/// Returns the fence character and run length of a code fence opener.
/// Neither fence character may appear again later on the line.
pub(super) fn parse_fence_open(rest: &str) -> Option<(u8, usize)> {
    let bytes = rest.as_bytes();
    let ch = *bytes.first()?;
    if ch != b'`' && ch != b'~' {
        return None;
    }
    let run = bytes.iter().take_while(|&&b| b == ch).count();
    if run < 3 || memchr::memchr(ch, &bytes[run..]).is_some() {
        return None;
    }
    Some((ch, run))
}

/// A closing fence is a run of at least `min_len` fence characters followed
/// only by spaces.
pub(super) fn is_closing_fence(rest: &str, fence_char: u8, min_len: usize) -> bool {
    let bytes = rest.as_bytes();
    let run = bytes.iter().take_while(|&&b| b == fence_char).count();
    run >= 3 && run >= min_len && bytes[run..].iter().all(|&b| b == b' ')
}

pub(super) fn parse_setext_underline(rest: &str) -> Option<u8> {
    if !SETEXT_UNDERLINE.is_match(rest) {
        return None;
    }
    Some(if rest.starts_with('=') { 1 } else { 2 })
}

/// Heading level of an ATX opener and the byte length of the opening
/// sequence including its trailing spaces.
pub(super) fn parse_atx_open(rest: &str) -> Option<(u8, usize)> {
    let m = ATX_OPEN.find(rest)?;
    let level = m.as_str().trim_end().len() as u8;
    Some((level, m.end()))
}
