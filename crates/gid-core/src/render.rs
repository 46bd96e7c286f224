//! Reply rendering: a small Markdown subset to an HTML fragment
//!
//! Passes run in a fixed order and each one only sees the output of the
//! previous one:
//!
//! 1. escape every HTML metacharacter of the raw text
//! 2. inline markup: bold, italic, inline code, links
//! 3. split into lines, dropping blank ones
//! 4. classify each line as a list item or a paragraph
//! 5. wrap every run of consecutive list items in one `<ul>`
//!
//! Escaping comes first so markup inserted by later passes is never
//! escaped again. Markers are matched left to right, non-recursively;
//! a marker without a partner stays literal.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static BOLD_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern"));
static BOLD_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(.+?)__").expect("bold pattern"));
static ITALIC_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("italic pattern"));
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(.+?)_").expect("italic pattern"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`(.+?)`").expect("code pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link pattern"));
static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s+").expect("numbered item pattern"));
static BULLET_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-•]\s+").expect("bullet item pattern"));

/// Schemes that can run script when followed from an anchor
const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

#[derive(Debug, PartialEq, Eq)]
enum Block {
    ListItem(String),
    Paragraph(String),
}

/// Render a bot reply as an HTML fragment that is safe to insert directly.
pub fn render(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let escaped = escape_html(text);
    let inline = apply_inline(&escaped);
    group_blocks(classify_lines(&inline))
}

/// Escape `&`, `<`, `>`, `"` and `'`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// Bold before italic so `**` pairs are consumed before single `*` is looked at.
fn apply_inline(text: &str) -> String {
    let text = BOLD_STARS.replace_all(text, "<b>${1}</b>");
    let text = BOLD_UNDERSCORES.replace_all(&text, "<b>${1}</b>");
    let text = ITALIC_STAR.replace_all(&text, "<em>${1}</em>");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "<em>${1}</em>");
    let text = INLINE_CODE.replace_all(&text, "<code>${1}</code>");
    LINK.replace_all(&text, |caps: &Captures| {
        let label = &caps[1];
        let href = &caps[2];
        if is_unsafe_href(href) {
            caps[0].to_string()
        } else {
            format!(r#"<a href="{href}" target="_blank" rel="noopener noreferrer">{label}</a>"#)
        }
    })
    .into_owned()
}

fn is_unsafe_href(href: &str) -> bool {
    // Browsers ignore embedded whitespace and control characters in schemes.
    let normalized: String = href
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    UNSAFE_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}

fn classify_lines(text: &str) -> Vec<Block> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(classify_line)
        .collect()
}

fn classify_line(line: &str) -> Block {
    if NUMBERED_ITEM.is_match(line) {
        // The number and its punctuation stay in the item text.
        Block::ListItem(format!(r#"<li class="numbered">{line}</li>"#))
    } else if let Some(marker) = BULLET_ITEM.find(line) {
        Block::ListItem(format!("<li>{}</li>", &line[marker.end()..]))
    } else {
        Block::Paragraph(format!("<p>{line}</p>"))
    }
}

fn group_blocks(blocks: Vec<Block>) -> String {
    let mut html = String::new();
    let mut in_list = false;

    for block in blocks {
        match block {
            Block::ListItem(item) => {
                if !in_list {
                    html.push_str("<ul>");
                    in_list = true;
                }
                html.push_str(&item);
            }
            Block::Paragraph(paragraph) => {
                if in_list {
                    html.push_str("</ul>");
                    in_list = false;
                }
                html.push_str(&paragraph);
            }
        }
    }

    if in_list {
        html.push_str("</ul>");
    }

    html
}
