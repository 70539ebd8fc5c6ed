//! Small helpers over `select` documents shared by the HTML scrapers.

use select::node::Node;
use select::predicate::Predicate;

/// Collapses runs of whitespace into single spaces and trims.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleaned text content of a node and its descendants.
pub fn node_text(node: &Node<'_>) -> String {
    clean_text(&node.text())
}

/// True if the text mentions "ГОСТ" in any letter case.
pub fn mentions_gost(text: &str) -> bool {
    text.to_uppercase().contains("ГОСТ")
}

/// First descendant of `node` matching `predicate`.
pub fn first<'a, P: Predicate>(node: &Node<'a>, predicate: P) -> Option<Node<'a>> {
    node.find(predicate).next()
}

/// Cleaned text of the first descendant matching `predicate`, or "".
pub fn first_text<P: Predicate>(node: &Node<'_>, predicate: P) -> String {
    first(node, predicate).map(|n| node_text(&n)).unwrap_or_default()
}
