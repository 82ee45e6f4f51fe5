//! Line and token patterns shared by the block and inline parsers.
//!
//! Every pattern is anchored with `^` and matched against the text at the
//! current scan offset, so "does the line continue with X" is a plain
//! `find` on a slice. `regex` has no look-around; the few checks that need
//! it (fence openers and closers, entity-preserving `&`) are done by hand in
//! their callers.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

const ESCAPABLE: &str = r##"[!"#$%&'()*+,./:;<=>?@\[\\\]^_`{|}~-]"##;
const TAG_NAME: &str = r"[A-Za-z][A-Za-z0-9]*";
const BLOCK_TAG_NAME: &str = "(?:article|header|aside|hgroup|blockquote|hr|body|li|br|map|button|object|canvas|ol|caption|output|col|p|colgroup|pre|dd|progress|div|section|dl|table|td|dt|tbody|embed|textarea|fieldset|tfoot|figcaption|th|figure|thead|footer|tr|form|ul|h1|h2|h3|h4|h5|h6|video|script|style)";
const ATTRIBUTE_NAME: &str = r"[a-zA-Z_:][a-zA-Z0-9:._-]*";
const ATTRIBUTE_VALUE: &str = r#"(?:[^"'=<>`\x00-\x20]+|'[^']*'|"[^"]*")"#;
const URI_SCHEMES: &str = r"coap|doi|javascript|aaa|aaas|about|acap|cap|cid|crid|data|dav|dict|dns|file|ftp|geo|go|gopher|h323|http|https|iax|icap|im|imap|info|ipp|iris|iris\.beep|iris\.xpc|iris\.xpcs|iris\.lwz|ldap|mailto|mid|msrp|msrps|mtqp|mupdate|news|nfs|ni|nih|nntp|opaquelocktoken|pop|pres|rtsp|service|session|shttp|sieve|sip|sips|sms|snmp|soap\.beep|soap\.beeps|tag|tel|telnet|tftp|thismessage|tn3270|tip|tv|urn|vemmi|ws|wss|xcon|xcon-userid|xmlrpc\.beep|xmlrpc\.beeps|xmpp|z39\.50r|z39\.50s|adiumxtra|afp|afs|aim|apt|attachment|aw|beshare|bitcoin|bolo|callto|chrome|chrome-extension|com-eventbrite-attendee|content|cvs|dlna-playsingle|dlna-playcontainer|dtn|dvb|ed2k|facetime|feed|finger|fish|gg|git|gizmoproject|gtalk|hcp|icon|ipn|irc|irc6|ircs|itms|jar|jms|keyparc|lastfm|ldaps|magnet|maps|market|message|mms|ms-help|msnim|mumble|mvn|notes|oid|palm|paparazzi|platform|proxy|psyc|query|res|resource|rmi|rsync|rtmp|secondlife|sftp|sgn|skype|smb|soldat|spotify|ssh|steam|svn|teamspeak|things|udp|unreal|ut2004|ventrilo|view-source|webcal|wtai|wyciwyg|xfire|xri|ymsgr";

fn attribute() -> String {
    format!(r"(?:\s+{ATTRIBUTE_NAME}(?:\s*=\s*{ATTRIBUTE_VALUE})?)")
}

/// Open tag, closing tag, comment, processing instruction, declaration or CDATA.
pub(crate) static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    let open_tag = format!(r"<{TAG_NAME}{}*\s*/?>", attribute());
    let close_tag = format!(r"</{TAG_NAME}\s*[>]");
    let comment = r"<!--(?:[^-]+|-[^-]+)*-->";
    let processing = r"<\?.*?\?>";
    let declaration = r"<![A-Z]+\s+[^>]*>";
    let cdata = r"<!\[CDATA\[(?:[^\]]+|\][^\]]|\]\][^>])*\]\]>";
    Regex::new(&format!(
        "(?i)^(?:{open_tag}|{close_tag}|{comment}|{processing}|{declaration}|{cdata})"
    ))
    .unwrap()
});

pub(crate) static HTML_BLOCK_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^<(?:{BLOCK_TAG_NAME}[\s/>]|/{BLOCK_TAG_NAME}[\s>]|[?!])"
    ))
    .unwrap()
});

pub(crate) static THEMATIC_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(?:\* *){3,}|(?:_ *){3,}|(?:- *){3,}) *$").unwrap());

pub(crate) static ATX_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}(?: +|$)").unwrap());

static ATX_CLOSING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:(\\#) *#*| *#+) *$").unwrap());

pub(crate) static SETEXT_UNDERLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:=+|-+) *$").unwrap());

pub(crate) static BULLET_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[*+-]( +|$)").unwrap());

pub(crate) static ORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,9})([.)])( +|$)").unwrap());

pub(crate) static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^&(?:#x[a-f0-9]{1,8}|#[0-9]{1,8}|[a-z][a-z0-9]{1,31});").unwrap()
});

pub(crate) static EMAIL_AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^<([a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*)>",
    )
    .unwrap()
});

pub(crate) static URI_AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^<((?:{URI_SCHEMES}):[^<>\x00-\x20]*)>")).unwrap()
});

pub(crate) static LINK_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"^(?:"(?:\\{ESCAPABLE}|[^"\x00])*"|'(?:\\{ESCAPABLE}|[^'\x00])*'|\((?:\\{ESCAPABLE}|[^)\x00])*\))"#
    ))
    .unwrap()
});

pub(crate) static LINK_DESTINATION_BRACES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^<(?:[^<>\n\\\x00]|\\{ESCAPABLE}|\\)*>")).unwrap()
});

static ESCAPED_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\\({ESCAPABLE})")).unwrap());

static LEADING_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^ +").unwrap());

static TRAILING_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\n *)*$").unwrap());

static CODE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \n]+").unwrap());

/// Removes backslashes in front of escapable punctuation.
pub(crate) fn unescape(text: &str) -> Cow<'_, str> {
    if memchr::memchr(b'\\', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }
    ESCAPED_CHAR.replace_all(text, "$1")
}

/// Drops an optional closing `#` sequence from ATX heading text. An escaped
/// `\#` survives as the literal `\#`.
pub(crate) fn strip_atx_closing(text: &str) -> Cow<'_, str> {
    ATX_CLOSING.replace(text, "$1")
}

pub(crate) fn strip_leading_spaces(text: &str) -> Cow<'_, str> {
    LEADING_SPACES.replace_all(text, "")
}

/// Collapses any run of trailing blank lines into a single `\n`.
pub(crate) fn chomp_trailing_blank_lines(text: &str) -> Cow<'_, str> {
    TRAILING_BLANK_LINES.replace(text, "\n")
}

pub(crate) fn collapse_code_whitespace(text: &str) -> Cow<'_, str> {
    CODE_WHITESPACE.replace_all(text, " ")
}
