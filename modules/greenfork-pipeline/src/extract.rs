//! Candidate recipe text from raw HTML, structural hints first.
//!
//! Ordered patterns run highest-precision first (explicit recipe microdata)
//! down to generic paragraphs. When the structural passes find too little,
//! the whole document is tag-stripped instead, so a page with zero recipe
//! markup still yields text, and the transformer degrades to a
//! low-information draft rather than failing.

use std::sync::LazyLock;

use regex::Regex;

use ai_client::util::truncate_chars;

/// Below this, the structural extraction is considered degenerate and the
/// whole-page fallback takes over.
const MIN_STRUCTURED_CHARS: usize = 100;

/// Character budget handed to the transformer, bounding token cost.
const MAX_EXTRACT_CHARS: usize = 15_000;

static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("valid regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Structural patterns in precision order.
static STRUCTURAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Explicit recipe microdata
        r#"(?is)<[^>]+itemprop\s*=\s*["']recipeIngredient["'][^>]*>(.*?)</[a-z][a-z0-9]*\s*>"#,
        r#"(?is)<[^>]+itemprop\s*=\s*["']recipeInstructions["'][^>]*>(.*?)</[a-z][a-z0-9]*\s*>"#,
        // Headings
        r"(?is)<h[1-6][^>]*>(.*?)</h[1-6]\s*>",
        // Class-name hints
        r#"(?is)<[^>]+class\s*=\s*["'][^"']*(?:ingredient|instruction|step)[^"']*["'][^>]*>(.*?)</[a-z][a-z0-9]*\s*>"#,
        // Generic structure
        r"(?is)<li[^>]*>(.*?)</li\s*>",
        r"(?is)<p[^>]*>(.*?)</p\s*>",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Pull candidate recipe text out of raw HTML. Never fails; a page with no
/// extractable content just yields a short string.
pub fn extract_recipe_text(html: &str) -> String {
    let cleaned = SCRIPT_STYLE_RE.replace_all(html, " ");

    let mut phrases = Vec::new();
    for pattern in STRUCTURAL_PATTERNS.iter() {
        for cap in pattern.captures_iter(&cleaned) {
            let phrase = strip_tags(&cap[1]);
            if !phrase.is_empty() {
                phrases.push(phrase);
            }
        }
    }

    let structured = phrases.join("\n");
    let text = if structured.chars().count() < MIN_STRUCTURED_CHARS {
        strip_tags(&cleaned)
    } else {
        structured
    };

    truncate_chars(&text, MAX_EXTRACT_CHARS)
}

/// Drop tags, decode the common entities, collapse whitespace.
fn strip_tags(fragment: &str) -> String {
    let text = TAG_RE.replace_all(fragment, " ");
    let text = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
