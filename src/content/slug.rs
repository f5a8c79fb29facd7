use regex::Regex;

/// Default excerpt length in characters, before the ellipsis.
pub const EXCERPT_LENGTH: usize = 150;

pub const ELLIPSIS: &str = "...";

lazy_static::lazy_static! {
    /// Anything that is not a word character, whitespace or hyphen
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^\w\s-]").unwrap();

    static ref SEPARATOR_RUNS: Regex = Regex::new(r"[-\s]+").unwrap();

    /// Markdown punctuation dropped from excerpts
    static ref MARKDOWN_MARKS: Regex = Regex::new(r"[#*`\[\]()]").unwrap();
}

/// Turn a title into a URL-safe identifier.
///
/// `"Hello, World!"` becomes `"hello-world"`. Distinct titles can collapse
/// to the same slug; uniqueness is the content store's job.
pub fn derive_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let joined = SEPARATOR_RUNS.replace_all(&stripped, "-");
    joined.trim_matches('-').to_string()
}

/// Plain-text preview of markdown content.
///
/// Text longer than `max_length` characters is cut at the last space
/// inside the limit and suffixed with [`ELLIPSIS`].
pub fn derive_excerpt(content: &str, max_length: usize) -> String {
    let text = MARKDOWN_MARKS.replace_all(content, "");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if text.chars().count() <= max_length {
        return text;
    }

    let cut = text
        .char_indices()
        .nth(max_length)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..cut];
    let head = head.rsplit_once(' ').map(|(kept, _)| kept).unwrap_or(head);

    format!("{}{}", head, ELLIPSIS)
}
