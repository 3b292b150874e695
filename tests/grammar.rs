//! Grammar pattern compilation through the public API.

use fscript::grammar::{MatchNode, MatchType, compile, required_count};
use fscript::{ErrorCategory, ErrorKind};

fn leaf(node: &MatchNode) -> &fscript::grammar::TokenMatch {
    match node {
        MatchNode::Token(m) => m,
        other => panic!("expected a token match, got {other:?}"),
    }
}

// -----------------------------------------------------------
// Shapes.
// -----------------------------------------------------------

#[test]
fn date_like_pattern_has_three_leaves() {
    let nodes = compile("$m:@number $d:@number $y:@number?").expect("compile");
    assert_eq!(nodes.len(), 3);
    for node in &nodes {
        assert_eq!(leaf(node).token_type, Some(MatchType::Number));
    }
    assert!(!nodes[2].is_required());
    assert_eq!(required_count(&nodes), 2);
}

#[test]
fn alternation_then_literal() {
    let nodes = compile("(a|b) c").expect("compile");
    assert_eq!(nodes.len(), 2);
    let MatchNode::Or(or) = &nodes[0] else {
        panic!("expected alternation");
    };
    assert_eq!(leaf(&or.left).text.as_deref(), Some("a"));
    assert_eq!(leaf(&or.right).text.as_deref(), Some("b"));
    assert_eq!(leaf(&nodes[1]).text.as_deref(), Some("c"));
}

#[test]
fn optional_group_keeps_its_members() {
    let nodes = compile("send $what:@word (to $who:@word)?").expect("compile");
    let MatchNode::Group(group) = &nodes[2] else {
        panic!("expected group");
    };
    assert!(!group.required);
    assert_eq!(group.matches.len(), 2);
    assert_eq!(leaf(&group.matches[1]).name.as_deref(), Some("who"));
}

#[test]
fn value_set_capture() {
    let nodes = compile("$unit:(kb|mb|gb)").expect("compile");
    let m = leaf(&nodes[0]);
    assert_eq!(m.values, vec!["kb", "mb", "gb"]);
    assert_eq!(m.name.as_deref(), Some("unit"));
}

#[test]
fn type_names_are_forgiving() {
    for spelling in ["@param_names", "ParamNames", "param-names"] {
        assert_eq!(MatchType::from_name(spelling), Some(MatchType::ParamNames));
    }
    assert_eq!(MatchType::from_name("@unknown"), None);
}

// -----------------------------------------------------------
// Errors.
// -----------------------------------------------------------

#[test]
fn unclosed_group_is_rejected() {
    let err = compile("(a b").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Syntax);
    let ErrorKind::InvalidGrammar { pattern, message } = err.kind else {
        panic!("expected grammar error");
    };
    assert_eq!(pattern, "(a b");
    assert!(message.contains("')'"));
}

#[test]
fn malformed_patterns() {
    for pattern in ["", "a |", "| a", "?", "()", "$:@word", "$x @word", "$x:@nope", "a \\"] {
        assert!(compile(pattern).is_err(), "{pattern:?} should not compile");
    }
}
