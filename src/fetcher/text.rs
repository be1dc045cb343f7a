use select::document::Document;
use select::node::Node;
use select::predicate::Text;
use unicode_normalization::UnicodeNormalization;

const HIDDEN_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Folds script variants and formatting marks so visually equivalent text
/// compares equal.
pub fn normalize(input: &str) -> String {
    input
        .nfkc()
        .filter_map(|c| match c {
            // Arabic yeh and alef maksura -> Persian yeh
            '\u{064A}' | '\u{0649}' => Some('\u{06CC}'),
            // Arabic kaf -> Persian keheh
            '\u{0643}' => Some('\u{06A9}'),
            // Zero-width non-joiner separates words
            '\u{200C}' => Some(' '),
            c if is_invisible_mark(c) => None,
            c => Some(c),
        })
        .collect()
}

fn is_invisible_mark(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'
            | '\u{200D}'
            | '\u{200E}'
            | '\u{200F}'
            | '\u{061C}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'
            | '\u{2066}'..='\u{2069}'
            | '\u{FEFF}'
    )
}

/// Non-overlapping, left-to-right count of `target` in `text` after both are
/// normalized. An empty target never matches.
pub fn count_occurrences(text: &str, target: &str) -> u64 {
    let needle = normalize(target);
    if needle.is_empty() {
        return 0;
    }
    normalize(text).matches(needle.as_str()).count() as u64
}

/// Text nodes outside script/style/noscript, trimmed and joined with spaces.
pub fn visible_text(html: &str) -> String {
    let document = Document::from(html);
    document
        .find(Text)
        .filter(|node| !is_hidden(node))
        .filter_map(|node| node.as_text().map(|t| t.trim().to_string()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_hidden(node: &Node) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent
            .name()
            .is_some_and(|name| HIDDEN_ELEMENTS.contains(&name))
        {
            return true;
        }
        current = parent.parent();
    }
    false
}
