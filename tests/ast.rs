use pretty_assertions::assert_eq;
use stmd::{BlockId, BlockKind, BlockParser, Document, IncorporateError, Inline, ListType, parse};

const SAMPLE: &str = "# Title\n\n- one\n- two\n\n> quote\n> more\n\n```rust\nfn main() {}\n```";

fn top_level(doc: &Document) -> Vec<BlockId> {
    doc[doc.root()].children.clone()
}

#[test]
fn builds_expected_tree() {
    let doc = parse(SAMPLE);
    let kinds: Vec<_> = doc.children(doc.root()).map(|b| b.kind.name()).collect();
    assert_eq!(kinds, ["ATXHeading", "List", "BlockQuote", "FencedCode"]);
    assert!(doc.descendants().iter().all(|&id| !doc[id].open));
}

#[test]
fn records_line_ranges() {
    let doc = parse(SAMPLE);
    let ranges: Vec<_> = top_level(&doc)
        .into_iter()
        .map(|id| (doc[id].start_line, doc[id].end_line))
        .collect();
    assert_eq!(ranges, [(1, 1), (3, 5), (6, 7), (9, 11)]);
    assert_eq!(doc[doc.root()].end_line, 11);
}

#[test]
fn sibling_ranges_do_not_overlap() {
    let doc = parse("a\n\n- b\n  c\n\n> d\n\n    e\n\n***");
    let children = top_level(&doc);
    for pair in children.windows(2) {
        assert!(doc[pair[0]].end_line < doc[pair[1]].start_line, "{doc}");
    }
}

#[test]
fn list_payload_and_tightness() {
    let doc = parse(SAMPLE);
    let list = &doc[top_level(&doc)[1]];
    match &list.kind {
        BlockKind::List { data, tight } => {
            assert!(*tight);
            assert_eq!(data.list_type, ListType::Bullet(b'-'));
            assert_eq!(data.padding, 2);
        }
        other => panic!("expected list, got {other:?}"),
    }
    assert_eq!(list.children.len(), 2);

    let loose = parse("1. a\n\n2. b");
    let list = &loose[top_level(&loose)[0]];
    assert!(matches!(
        list.kind,
        BlockKind::List {
            tight: false,
            data: stmd::ListData {
                list_type: ListType::Ordered {
                    start: 1,
                    delimiter: b'.'
                },
                ..
            }
        }
    ));
}

#[test]
fn fenced_code_payload() {
    let doc = parse(SAMPLE);
    let code = &doc[top_level(&doc)[3]];
    match &code.kind {
        BlockKind::FencedCode {
            fence_char,
            fence_length,
            info,
            ..
        } => {
            assert_eq!(*fence_char, b'`');
            assert_eq!(*fence_length, 3);
            assert_eq!(info, "rust");
        }
        other => panic!("expected fenced code, got {other:?}"),
    }
    assert_eq!(code.content, "fn main() {}\n");
}

#[test]
fn parent_links_climb_to_root() {
    let doc = parse("> - *x*");
    let mut id = *doc.descendants().last().unwrap();
    let mut path = vec![doc[id].kind.name()];
    while let Some(parent) = doc[id].parent {
        path.push(doc[parent].kind.name());
        id = parent;
    }
    assert_eq!(path, ["Paragraph", "ListItem", "List", "BlockQuote", "Document"]);
    assert_eq!(id, doc.root());
}

#[test]
fn inline_content_replaces_text() {
    let doc = parse("## *hi* there");
    let heading = &doc[top_level(&doc)[0]];
    assert_eq!(heading.kind, BlockKind::AtxHeading { level: 2 });
    assert_eq!(
        heading.inlines,
        vec![
            Inline::Emphasis(vec![Inline::Str("hi".into())]),
            Inline::Str(" there".into()),
        ]
    );
    assert!(heading.content.is_empty());
}

#[test]
fn reference_definitions_remain_in_tree() {
    let doc = parse("[a]: /u\n\n[a]");
    let kinds: Vec<_> = doc.children(doc.root()).map(|b| b.kind.name()).collect();
    assert_eq!(kinds, ["ReferenceDefinition", "Paragraph"]);
}

#[test]
fn tree_dump() {
    let doc = parse("*hi*\n\n- a");
    assert_eq!(
        doc.to_string(),
        "Document (2 children)\n\
         \x20 Paragraph (1 inlines)\n\
         \x20   Emphasis:\n\
         \x20     Str(hi)\n\
         \x20 List(type:bullet, tight:true, character:-) (1 children)\n\
         \x20   ListItem (1 children)\n\
         \x20     Paragraph (1 inlines)\n\
         \x20       Str(a)\n"
    );
}

#[test]
fn incremental_parsing_matches_one_shot() {
    let lines: Vec<&str> = SAMPLE.split('\n').collect();
    let mut parser = BlockParser::new();
    for (i, line) in lines.iter().enumerate() {
        parser.incorporate_line(line, i + 1).unwrap();
    }
    let incremental = parser.finalize(lines.len() + 1).clone();
    assert_eq!(incremental, parse(SAMPLE));
}

#[test]
fn document_is_visible_before_finalize() {
    let mut parser = BlockParser::new();
    parser.incorporate_line("> a", 1).unwrap();
    let doc = parser.document();
    let quote = doc[doc.root()].children[0];
    assert!(doc[quote].open);
    assert_eq!(doc[quote].start_line, 1);
}

#[test]
fn finalize_twice_is_a_no_op() {
    let mut parser = BlockParser::new();
    parser.incorporate_line("text", 1).unwrap();
    let first = parser.finalize(2).clone();
    assert_eq!(parser.finalize(9), &first);
}

#[test]
fn lines_after_finalize_are_an_error() {
    let mut parser = BlockParser::new();
    parser.incorporate_line("a", 1).unwrap();
    parser.finalize(2);
    let err = parser.incorporate_line("b", 3).unwrap_err();
    assert_eq!(err.line_number(), 3);
    assert!(matches!(err, IncorporateError::ClosedContainer { kind: "Document", .. }));
    assert_eq!(
        err.to_string(),
        "line 3: attempted to add content to closed Document block"
    );
}

#[cfg(feature = "serde")]
#[test]
fn serializes_as_nested_json() {
    let doc = parse("# T\n\n[x](/y)");
    let json = serde_json::to_value(&doc).unwrap();
    assert_eq!(json["kind"]["type"], "document");
    assert_eq!(json["children"][0]["kind"]["type"], "atx_heading");
    assert_eq!(json["children"][0]["kind"]["level"], 1);
    assert_eq!(json["children"][0]["inlines"][0]["type"], "Str");
    assert_eq!(json["children"][0]["inlines"][0]["value"], "T");
    let link = &json["children"][1]["inlines"][0];
    assert_eq!(link["type"], "Link");
    assert_eq!(link["value"]["destination"], "/y");
}
