// Unit tests for selector synthesis

use super::*;
use crate::dom::{Document, ElementSnapshot, ElementSpec, NodeId};
use pretty_assertions::assert_eq;

/// html > body > (nested chain of the given tags), returns the document and the deepest node
fn chain(tags: &[&str]) -> (Document, NodeId) {
    let mut doc = Document::new("html");
    let mut current = doc.append(doc.root(), ElementSpec::new("body"));
    for tag in tags {
        current = doc.append(current, ElementSpec::new(tag));
    }
    (doc, current)
}

#[test]
fn test_id_short_circuits_at_any_depth() {
    let (mut doc, deep) = chain(&["div", "section", "article", "div"]);
    let target = doc.append(deep, ElementSpec::new("button").id("submit"));

    assert_eq!(synthesize_string(&doc.element(target)), "#submit");
}

#[test]
fn test_id_wins_over_class() {
    let (mut doc, body) = chain(&[]);
    let target = doc.append(body, ElementSpec::new("a").id("home").class("nav-link active"));

    assert_eq!(synthesize_string(&doc.element(target)), "#home");
}

#[test]
fn test_class_list_keeps_token_order() {
    let (mut doc, deep) = chain(&["main", "ul"]);
    let target = doc.append(deep, ElementSpec::new("li").class("  item \t selected   last "));

    assert_eq!(
        synthesize_string(&doc.element(target)),
        ".item.selected.last"
    );
}

#[test]
fn test_empty_id_falls_through_to_class() {
    let (mut doc, body) = chain(&[]);
    let target = doc.append(body, ElementSpec::new("span").id("").class("badge"));

    assert_eq!(synthesize_string(&doc.element(target)), ".badge");
}

#[test]
fn test_single_children_need_no_qualifier() {
    let (doc, target) = chain(&["div", "span"]);

    assert_eq!(
        synthesize_string(&doc.element(target)),
        "html > body > div > span"
    );
}

#[test]
fn test_nth_of_type_among_same_tag_siblings() {
    let (mut doc, ul) = chain(&["ul"]);
    doc.append(ul, ElementSpec::new("li"));
    let second = doc.append(ul, ElementSpec::new("li"));
    doc.append(ul, ElementSpec::new("li"));

    let selector = synthesize(&doc.element(second));
    assert_eq!(selector.to_string(), "html > body > ul > li:nth-of-type(2)");
    // The bare `li` the traversal adds after the qualifier is collapsed
    assert!(!selector.segments().contains(&Segment::Tag("li".to_string())));
}

#[test]
fn test_nth_of_type_skips_other_tags() {
    let (mut doc, body) = chain(&[]);
    doc.append(body, ElementSpec::new("div"));
    doc.append(body, ElementSpec::new("p"));
    let container = doc.append(body, ElementSpec::new("div"));
    let target = doc.append(container, ElementSpec::new("span"));

    assert_eq!(
        synthesize_string(&doc.element(target)),
        "html > body > div:nth-of-type(2) > span"
    );
}

#[test]
fn test_nested_qualifiers_collapse_independently() {
    let (mut doc, body) = chain(&[]);
    doc.append(body, ElementSpec::new("div"));
    let outer = doc.append(body, ElementSpec::new("div"));
    doc.append(outer, ElementSpec::new("div"));
    let inner = doc.append(outer, ElementSpec::new("div"));
    let target = doc.append(inner, ElementSpec::new("span"));

    assert_eq!(
        synthesize_string(&doc.element(target)),
        "html > body > div:nth-of-type(2) > div:nth-of-type(2) > span"
    );
}

#[test]
fn test_tags_are_lower_cased() {
    let mut doc = Document::new("HTML");
    let body = doc.append(doc.root(), ElementSpec::new("BODY"));
    let target = doc.append(body, ElementSpec::new("INPUT"));

    assert_eq!(synthesize_string(&doc.element(target)), "html > body > input");
}

#[test]
fn test_root_element_alone() {
    let doc = Document::new("html");
    assert_eq!(synthesize_string(&doc.element(doc.root())), "html");
}

#[test]
fn test_whitespace_only_class_is_ignored() {
    let (mut doc, body) = chain(&[]);
    let target = doc.append(body, ElementSpec::new("p").class("   "));

    assert_eq!(synthesize_string(&doc.element(target)), "html > body > p");
}

#[test]
fn test_collapse_is_a_single_pass() {
    let selector = Selector::new(vec![
        Segment::TagWithIndex {
            tag: "li".into(),
            position: 1,
        },
        Segment::Tag("li".into()),
        Segment::Tag("li".into()),
    ]);
    assert_eq!(collapse_redundant(selector).to_string(), "li:nth-of-type(1) > li");

    let untouched = Selector::new(vec![
        Segment::TagWithIndex {
            tag: "li".into(),
            position: 3,
        },
        Segment::Tag("a".into()),
    ]);
    assert_eq!(
        collapse_redundant(untouched.clone()),
        untouched
    );
}

#[test]
fn test_structural_selector_resolves_to_source() {
    let (mut doc, body) = chain(&[]);
    let list = doc.append(body, ElementSpec::new("ul"));
    let mut items = Vec::new();
    for _ in 0..4 {
        let li = doc.append(list, ElementSpec::new("li"));
        items.push(doc.append(li, ElementSpec::new("a")));
    }

    for item in items {
        let text = synthesize_string(&doc.element(item));
        let parsed = Selector::parse(&text).unwrap();
        assert_eq!(parsed.to_string(), text);
        assert_eq!(doc.select(&parsed), vec![item], "selector {}", text);
    }
}

#[test]
fn test_unique_id_and_class_resolve_to_source() {
    let (mut doc, body) = chain(&["div"]);
    let by_id = doc.append(body, ElementSpec::new("input").id("email"));
    let by_class = doc.append(body, ElementSpec::new("button").class("btn submit"));
    doc.append(body, ElementSpec::new("button").class("btn"));

    let id_selector = Selector::parse(&synthesize_string(&doc.element(by_id))).unwrap();
    assert_eq!(doc.select(&id_selector), vec![by_id]);

    let class_selector = Selector::parse(&synthesize_string(&doc.element(by_class))).unwrap();
    assert_eq!(doc.select(&class_selector), vec![by_class]);
}

#[test]
fn test_repeated_class_is_not_verified_unique() {
    let (mut doc, body) = chain(&[]);
    let first = doc.append(body, ElementSpec::new("div").class("card"));
    let second = doc.append(body, ElementSpec::new("div").class("card"));

    let selector = synthesize(&doc.element(second));
    assert_eq!(selector.to_string(), ".card");
    assert_eq!(doc.select(&selector), vec![first, second]);
}

#[test]
fn test_snapshot_matches_document() {
    let (mut doc, body) = chain(&[]);
    doc.append(body, ElementSpec::new("div"));
    let form = doc.append(body, ElementSpec::new("div"));
    doc.append(form, ElementSpec::new("input"));
    let target = doc.append(form, ElementSpec::new("input"));

    let snapshot = ElementSnapshot::capture(&doc.element(target));
    assert_eq!(snapshot.lineage.len(), 4);
    assert_eq!(snapshot.lineage[0].index, 1);
    assert!(snapshot.lineage[3].siblings.is_empty());

    let from_snapshot = synthesize_string(&snapshot.target().unwrap());
    assert_eq!(from_snapshot, synthesize_string(&doc.element(target)));
    assert_eq!(
        from_snapshot,
        "html > body > div:nth-of-type(2) > input:nth-of-type(2)"
    );
}

#[test]
fn test_snapshot_from_page_json() {
    let payload = r#"{
        "lineage": [
            {"tag": "TD", "siblings": ["TD", "TD", "TD"], "index": 2},
            {"tag": "TR", "siblings": ["TR", "TR"], "index": 0},
            {"tag": "TBODY", "siblings": ["TBODY"], "index": 0},
            {"tag": "TABLE", "className": "", "siblings": ["H1", "TABLE"], "index": 1},
            {"tag": "BODY", "siblings": ["HEAD", "BODY"], "index": 1},
            {"tag": "HTML"}
        ]
    }"#;
    let snapshot: ElementSnapshot = serde_json::from_str(payload).unwrap();

    assert_eq!(
        synthesize_string(&snapshot.target().unwrap()),
        "html > body > table > tbody > tr:nth-of-type(1) > td:nth-of-type(3)"
    );
}

#[test]
fn test_parse_rejects_malformed_segments() {
    assert!(Selector::parse("").is_err());
    assert!(Selector::parse("#").is_err());
    assert!(Selector::parse("div > .").is_err());
    assert!(Selector::parse("li:nth-of-type(0)").is_err());
    assert!(Selector::parse("li:nth-of-type(x)").is_err());
    assert!(Selector::parse("div span").is_err());
    assert!(Selector::parse("div>span").is_err());

    let parsed = Selector::parse("body > .a.b > #x > li:nth-of-type(4)").unwrap();
    assert_eq!(
        parsed.segments(),
        &[
            Segment::Tag("body".into()),
            Segment::ClassList(vec!["a".into(), "b".into()]),
            Segment::Id("x".into()),
            Segment::TagWithIndex {
                tag: "li".into(),
                position: 4
            },
        ]
    );
}

#[test]
fn test_parse_keeps_angle_brackets_inside_tokens() {
    let mut doc = Document::new("html");
    let body = doc.append(doc.root(), ElementSpec::new("body"));
    let by_id = doc.append(body, ElementSpec::new("div").id("step>2"));
    let by_class = doc.append(body, ElementSpec::new("span").class("a>b  c"));

    for id in [by_id, by_class] {
        let text = synthesize_string(&doc.element(id));
        let parsed = Selector::parse(&text).unwrap();
        assert_eq!(parsed.to_string(), text);
        assert_eq!(parsed.segments().len(), 1);
    }
    assert_eq!(synthesize_string(&doc.element(by_class)), ".a>b.c");
}
