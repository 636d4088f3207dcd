//! Content classifier: heuristic removal of page chrome from a DOM tree.
//!
//! ## The safety net
//!
//! Every heuristic here can misfire — a page may keep its only content in a
//! `class="sidebar"` wrapper, or mark the whole body `role="navigation"`.
//! The contract is therefore asymmetric: partial content loss is accepted,
//! total loss is not. Removals that would reduce the document's visible
//! text to nothing are rolled back, one element at a time. Bulk removal
//! could empty the tree even when each removal individually is safe, and a
//! single bad removal must not abort the rest of the pass, so candidates
//! are detached and checked individually.
//!
//! Rollback is cheap: the DOM is a pointer tree, so a "snapshot" is just
//! the detached node's parent and preceding sibling, and restore is a
//! positional re-insert. No subtree is ever copied.

use kuchikikiki::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::visible_text_is_empty;

/// Semantic chrome tags removed unconditionally. Structurally these are
/// almost never main content, even when they hold the only text.
const CHROME_TAGS: [&str; 4] = ["header", "footer", "nav", "aside"];

/// Boilerplate markers, matched as whole word-boundary-delimited tokens so
/// that e.g. `submenu` does not trip the `menu` marker.
static UNWANTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:nav|popup|menu|footer|header|sidebar|advert|modal|cookie|social|share|navigation|dialog|banner|menubar|menuitem)\b",
    )
    .expect("unwanted pattern compiles")
});

/// Stricter variant used when the loose pass matched nothing: markers only
/// count when anchored at the start of the attribute value. Reduces false
/// positives like a class literally named `content-nav-wrapper` being
/// excluded by a mid-string match.
static UNWANTED_ANCHORED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:nav|popup|menu|footer|header|sidebar|advert|modal|cookie|social|share|navigation|dialog|banner|menubar|menuitem)\b",
    )
    .expect("anchored unwanted pattern compiles")
});

/// Main-content indicators that veto a removal.
static KEEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:content|page|wrapper|main)\b").expect("keep pattern compiles"));

/// Narrower marker set for the list pass; list-based navigation menus are
/// common enough boilerplate to warrant removal with no keep override.
static LIST_UNWANTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:nav|menu|menubar|menuitem)\b").expect("list pattern compiles")
});

/// One table-driven pruning pass: which attributes to scan, what marks an
/// element unwanted, what (if anything) vetoes removal, and optionally
/// which tags the pass is restricted to.
pub struct PruneRules<'a> {
    pub unwanted: &'a Regex,
    pub keep: Option<&'a Regex>,
    pub attributes: &'a [&'a str],
    pub tags: Option<&'a [&'a str]>,
}

/// Attribute signal pass over `class`/`id`/`role` with the keep override.
pub fn matching_rules() -> PruneRules<'static> {
    PruneRules {
        unwanted: &UNWANTED,
        keep: Some(&KEEP),
        attributes: &["class", "id", "role"],
        tags: None,
    }
}

fn anchored_rules() -> PruneRules<'static> {
    PruneRules {
        unwanted: &UNWANTED_ANCHORED,
        keep: Some(&KEEP),
        attributes: &["class", "id", "role"],
        tags: None,
    }
}

/// Second, harsher pass: `ul`/`li` by `class` only, deliberately without a
/// keep override — a navigation list inside a keep-protected wrapper must
/// still fall to this pass.
fn list_rules() -> PruneRules<'static> {
    PruneRules {
        unwanted: &LIST_UNWANTED,
        keep: None,
        attributes: &["class"],
        tags: Some(&["ul", "li"]),
    }
}

/// Remove boilerplate subtrees from `doc` in place.
///
/// Guarantees that if the input had non-empty visible text, the output does
/// too: each risky removal is individually rolled back when it would empty
/// the document.
pub fn strip_chrome(doc: &NodeRef) {
    remove_semantic_chrome(doc);
    remove_forms(doc);

    let candidates = prune_matching(doc, &matching_rules());
    if candidates == 0 {
        // Nothing matched loosely; one stricter retry, then give up and
        // leave the tree as-is rather than looping further.
        debug!("no pruning candidates; retrying with anchored pattern");
        prune_matching(doc, &anchored_rules());
    }

    prune_matching(doc, &list_rules());
}

// ── Removal passes ───────────────────────────────────────────────────────

/// Unconditionally remove `header`/`footer`/`nav`/`aside` subtrees.
fn remove_semantic_chrome(doc: &NodeRef) {
    for tag in CHROME_TAGS {
        for node in elements_by_tag(doc, &[tag]) {
            node.detach();
        }
    }
}

/// Remove all `form` subtrees, rolling the whole step back if it empties
/// the document — forms sometimes wrap main content in poorly marked-up
/// pages.
fn remove_forms(doc: &NodeRef) {
    let mut removed: Vec<(NodeRef, DetachPoint)> = Vec::new();
    for form in elements_by_tag(doc, &["form"]) {
        if let Some(point) = DetachPoint::of(&form) {
            form.detach();
            removed.push((form, point));
        }
    }

    if !removed.is_empty() && visible_text_is_empty(doc) {
        debug!("form removal emptied the document; restoring {} form(s)", removed.len());
        for (form, point) in removed.into_iter().rev() {
            point.reattach(form);
        }
    }
}

/// Scan the tree for elements whose attributes match `rules.unwanted`,
/// then remove them one at a time with per-element rollback.
///
/// Returns the number of candidates queued (before rollback), so callers
/// can detect a pass that matched nothing.
pub fn prune_matching(doc: &NodeRef, rules: &PruneRules<'_>) -> usize {
    let mut candidates: Vec<NodeRef> = Vec::new();

    for node in doc.descendants() {
        let Some(element) = node.as_element() else {
            continue;
        };
        let tag = element.name.local.to_string();

        if let Some(tags) = rules.tags {
            if !tags.contains(&tag.as_str()) {
                continue;
            }
        }
        // The document root is never a candidate, whatever it claims to be.
        if tag == "body" || tag == "html" {
            continue;
        }

        let attributes = element.attributes.borrow();
        let matched = rules
            .attributes
            .iter()
            .filter_map(|name| attributes.get(*name))
            .any(|value| rules.unwanted.is_match(value));
        if !matched {
            continue;
        }

        if let Some(keep) = rules.keep {
            let kept = rules
                .attributes
                .iter()
                .filter_map(|name| attributes.get(*name))
                .any(|value| keep.is_match(value));
            if kept {
                debug!("keeping matched element <{}> (keep override)", tag);
                continue;
            }
        }

        drop(attributes);
        candidates.push(node);
    }

    let count = candidates.len();
    for node in candidates {
        remove_with_rollback(doc, &node);
    }
    count
}

/// Detach `node`; if that empties the document's visible text, put it back
/// exactly where it was.
fn remove_with_rollback(doc: &NodeRef, node: &NodeRef) {
    let Some(point) = DetachPoint::of(node) else {
        return; // already detached by an earlier removal
    };
    node.detach();
    if visible_text_is_empty(doc) {
        debug!("removal emptied the document; rolling back one element");
        point.reattach(node.clone());
    }
}

// ── Detach/reattach plumbing ─────────────────────────────────────────────

/// Where a node sat before it was detached. Enough to restore it in the
/// same sibling position.
struct DetachPoint {
    parent: NodeRef,
    prev_sibling: Option<NodeRef>,
}

impl DetachPoint {
    fn of(node: &NodeRef) -> Option<Self> {
        node.parent().map(|parent| DetachPoint {
            parent,
            prev_sibling: node.previous_sibling(),
        })
    }

    fn reattach(&self, node: NodeRef) {
        match &self.prev_sibling {
            Some(prev) => prev.insert_after(node),
            None => self.parent.prepend(node),
        }
    }
}

/// All elements with one of the given tag names, in document order.
fn elements_by_tag(doc: &NodeRef, tags: &[&str]) -> Vec<NodeRef> {
    doc.descendants()
        .filter(|node| {
            node.as_element()
                .map(|e| tags.contains(&e.name.local.as_ref()))
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::visible_text;
    use kuchikikiki::traits::TendrilSink;

    fn parse(html: &str) -> NodeRef {
        kuchikikiki::parse_html().one(html)
    }

    fn stripped_text(html: &str) -> String {
        let doc = parse(html);
        strip_chrome(&doc);
        visible_text(&doc)
            .into_iter()
            .filter(|piece| !piece.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn semantic_chrome_removed_unconditionally() {
        let text = stripped_text("<div><nav>Navigation</nav><main>Main Content</main></div>");
        assert_eq!(text, "Main Content");
    }

    #[test]
    fn header_footer_aside_removed() {
        let text = stripped_text(
            "<body><header>top</header><p>body text</p><aside>rail</aside><footer>bottom</footer></body>",
        );
        assert_eq!(text, "body text");
    }

    #[test]
    fn form_wrapping_all_content_is_restored() {
        let text = stripped_text(
            r#"<body><form><p>Hello, <a href="world.html">World!</a></p></form></body>"#,
        );
        assert!(text.contains("Hello,"), "got: {text}");
        assert!(text.contains("World!"));
    }

    #[test]
    fn form_next_to_content_is_removed() {
        let text =
            stripped_text("<body><form><input><label>Search</label></form><p>Article</p></body>");
        assert_eq!(text, "Article");
    }

    #[test]
    fn unwanted_class_token_removed() {
        let text = stripped_text(
            r#"<body><div class="sidebar">chrome text</div><p>real text</p></body>"#,
        );
        assert_eq!(text, "real text");
    }

    #[test]
    fn near_match_token_is_not_a_candidate_casualty() {
        // "not-a-popup" holds the only content: even though "popup" appears
        // as a substring, removal must be undone to keep the document
        // non-empty.
        let text = stripped_text(
            r#"<html><body class="sidebar"><div class="main-sidebar"><div id="not-a-popup">Hello World!</div></div></body></html>"#,
        );
        assert_eq!(text, "Hello World!");
    }

    #[test]
    fn keep_override_protects_matched_element() {
        // "main-sidebar" matches both `sidebar` (unwanted) and `main`
        // (keep); the keep override wins.
        let text = stripped_text(
            r#"<body><div class="main-sidebar">kept rail</div><p>article</p></body>"#,
        );
        assert!(text.contains("kept rail"), "got: {text}");
        assert!(text.contains("article"));
    }

    #[test]
    fn role_attribute_is_scanned() {
        let text = stripped_text(
            r#"<body><div class="main-sidebar">Hello World!<div role="navigation"> Goodbye World!</div></div></body>"#,
        );
        assert_eq!(text, "Hello World!");
    }

    #[test]
    fn removal_emptying_document_is_rolled_back() {
        // A role="navigation" wrapper holding the only content on the page
        // must be restored.
        let text = stripped_text(
            r#"<html><body class="sidebar"><div class="main-sidebar"><div role="navigation">Hello World!</div></div></body></html>"#,
        );
        assert_eq!(text, "Hello World!");
    }

    #[test]
    fn body_is_never_removed() {
        let text = stripped_text(r#"<html><body class="popup"><p>survives</p></body></html>"#);
        assert_eq!(text, "survives");
    }

    #[test]
    fn element_without_signal_attributes_is_never_a_candidate() {
        let text = stripped_text("<body><div><p>plain markup</p></div></body>");
        assert_eq!(text, "plain markup");
    }

    #[test]
    fn nav_wrapper_subtree_falls_to_list_pass() {
        // The wrapper div is protected by `wrapper`, but its nav list still
        // goes, leaving the wrapper empty of text.
        let text = stripped_text(
            r#"<body><div class="wd_mobile-nav-wrapper"><ul class="wd_mobile-nav"><li><a href="/a">A</a></li><li><a href="/b">B</a></li></ul></div><p>Hello</p></body>"#,
        );
        assert_eq!(text, "Hello");
    }

    #[test]
    fn list_pass_ignores_keep_override() {
        // `main-menu` matches `main` (keep) so the attribute pass spares
        // it; the list pass has no keep override and removes it anyway.
        let text = stripped_text(
            r#"<body><ul class="main-menu"><li>Home</li><li>About</li></ul><p>Hello</p></body>"#,
        );
        assert_eq!(text, "Hello");
    }

    #[test]
    fn list_pass_checks_class_tokens_only() {
        // `submenu` must not trip the `menu` marker (word boundary), and
        // the list pass only looks at `class`.
        let text = stripped_text(
            r#"<body><ul class="wd_submenu"><li>kept item</li></ul><p>body</p></body>"#,
        );
        assert!(text.contains("kept item"), "got: {text}");
    }

    #[test]
    fn anchored_retry_when_nothing_matches() {
        // No loose candidate exists; the anchored retry must not invent
        // one, and the tree comes back unchanged.
        let doc = parse(r#"<body><div class="article"><p>Hello, World!</p></div></body>"#);
        let before = visible_text(&doc).join("\n");
        strip_chrome(&doc);
        let after = visible_text(&doc).join("\n");
        assert_eq!(before, after);
    }

    #[test]
    fn nonempty_input_never_prunes_to_empty() {
        // Property from the contract: visible text in implies visible text out.
        let pathological = [
            r#"<body class="popup"><div class="sidebar">only text</div></body>"#,
            r#"<body><div role="dialog"><span class="banner">x</span></div></body>"#,
            r#"<body><ul class="menu"><li class="menuitem">links</li></ul></body>"#,
            r#"<body><form><div class="advert">ad copy</div></form></body>"#,
        ];
        for html in pathological {
            let doc = parse(html);
            strip_chrome(&doc);
            assert!(
                !visible_text_is_empty(&doc),
                "document emptied for input: {html}"
            );
        }
    }

    #[test]
    fn prune_matching_reports_candidate_count() {
        let doc = parse(
            r#"<body><div class="sidebar">a</div><div class="advert">b</div><p>content</p></body>"#,
        );
        let count = prune_matching(&doc, &matching_rules());
        assert_eq!(count, 2);
    }
}
