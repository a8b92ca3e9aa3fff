use std::sync::OnceLock;

use regex::Regex;

static SALES_BADGE_OPEN: OnceLock<Regex> = OnceLock::new();
static SPAN_TAG: OnceLock<Regex> = OnceLock::new();
static INNER_TAG: OnceLock<Regex> = OnceLock::new();
static COUNT: OnceLock<Regex> = OnceLock::new();

fn sales_badge_open() -> &'static Regex {
    SALES_BADGE_OPEN.get_or_init(|| {
        Regex::new(
            r#"(?i)<span\b[^>]*\bdata-buy-box-region\s*=\s*(?:"sales"|'sales'|sales\b)[^>]*>"#,
        )
        .expect("sales badge pattern is valid")
    })
}

fn span_tag() -> &'static Regex {
    SPAN_TAG.get_or_init(|| {
        Regex::new(r"(?i)<(/?)span\b[^>]*?(/?)>").expect("span pattern is valid")
    })
}

fn inner_tag() -> &'static Regex {
    INNER_TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

fn count() -> &'static Regex {
    COUNT.get_or_init(|| Regex::new(r"\d[\d,]*").expect("count pattern is valid"))
}

/// Everything between the end of an opening `<span>` at `from` and its
/// balancing `</span>`. Unclosed badges run to the end of the document.
fn span_body(html: &str, from: usize) -> &str {
    let mut depth = 1usize;

    for caps in span_tag().captures_iter(&html[from..]) {
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let self_closing = caps.get(2).is_some_and(|m| !m.as_str().is_empty());

        if closing {
            depth -= 1;
            if depth == 0 {
                let end = caps.get(0).map_or(html.len(), |m| from + m.start());
                return &html[from..end];
            }
        } else if !self_closing {
            depth += 1;
        }
    }

    &html[from..]
}

/// Pull the storefront's cumulative sales counter out of a shop page.
///
/// Only the first sales badge is read, including the text of any markup
/// nested inside it. Returns `None` when the badge is missing or holds no
/// number; thousands separators are ignored.
pub fn extract_sales_count(html: &str) -> Option<u64> {
    let open = sales_badge_open().find(html)?;
    let badge = span_body(html, open.end());
    let text = inner_tag().replace_all(badge, " ");
    let digits: String = count()
        .find(&text)?
        .as_str()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    digits.parse().ok()
}
