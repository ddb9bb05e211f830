//! Visible-text extraction from a page snapshot.

use crate::host::{NodePath, PageNode, PageSnapshot, Viewport};

/// Content-bearing tags worth sampling. Structural containers (`div`,
/// `nav`, `footer`...) are walked but contribute no text of their own.
const CONTENT_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "li",
    "td",
    "blockquote",
    "article",
    "span",
];

/// Extract the concatenated visible text of a snapshot, optionally scoped
/// to the subtree at `scope`. Each contributing node's text is trimmed and
/// whitespace-collapsed; the result is capped at `max_len` chars.
pub fn extract_visible_text(
    snapshot: &PageSnapshot,
    scope: Option<&NodePath>,
    max_len: usize,
) -> String {
    let root = scope
        .and_then(|path| resolve_path(&snapshot.root, path))
        .unwrap_or(&snapshot.root);

    let mut pieces = Vec::new();
    collect_text(root, &snapshot.viewport, &mut pieces);

    let joined = pieces.join(" ");
    truncate_chars(&joined, max_len)
}

/// Follow a child-index path from `root`. `None` when the path points past
/// the tree, which happens when the DOM changed between event and snapshot.
fn resolve_path<'a>(root: &'a PageNode, path: &NodePath) -> Option<&'a PageNode> {
    let mut node = root;
    for &index in path {
        node = node.children.get(index)?;
    }
    Some(node)
}

fn collect_text(node: &PageNode, viewport: &Viewport, pieces: &mut Vec<String>) {
    if node.attached && is_content_tag(&node.tag) && node_visible(node, viewport) {
        let collapsed = collapse_whitespace(&node.text);
        if !collapsed.is_empty() {
            pieces.push(collapsed);
        }
    }

    for child in &node.children {
        collect_text(child, viewport, pieces);
    }
}

fn is_content_tag(tag: &str) -> bool {
    CONTENT_TAGS.contains(&tag)
}

fn node_visible(node: &PageNode, viewport: &Viewport) -> bool {
    !node.rect.is_zero() && node.rect.intersects_viewport(viewport)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
