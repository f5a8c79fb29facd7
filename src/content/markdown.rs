//! Markdown to HTML for blog posts.
//!
//! pulldown-cmark renders first, then ammonia filters the output down to a
//! fixed tag/attribute allow-list. Raw HTML in a post passes through the
//! renderer untouched, so the sanitizer must always run last.

use ammonia::Builder;
use pulldown_cmark::{html::push_html, Options, Parser};
use std::collections::{HashMap, HashSet};

const ALLOWED_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "strong", "em", "ul", "ol", "li", "a", "code",
    "pre", "blockquote", "br", "hr", "img",
];

const LINK_ATTRIBUTES: &[&str] = &["href", "title"];
const IMAGE_ATTRIBUTES: &[&str] = &["src", "alt", "title"];

fn sanitizer() -> Builder<'static> {
    let tag_attributes: HashMap<&'static str, HashSet<&'static str>> = HashMap::from([
        ("a", LINK_ATTRIBUTES.iter().copied().collect()),
        ("img", IMAGE_ATTRIBUTES.iter().copied().collect()),
    ]);

    let mut builder = Builder::default();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect())
        .tag_attributes(tag_attributes)
        .generic_attributes(HashSet::new())
        .link_rel(None);
    builder
}

/// Render author markdown to HTML that is safe to embed in a page.
pub fn render_markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, Options::empty());

    let mut html = String::with_capacity(source.len() * 2);
    push_html(&mut html, parser);

    sanitizer().clean(&html).to_string()
}
