//! HTML metadata extraction
//!
//! Fetched pages keep their raw body; the only thing parsed out of them is
//! the `<title>` tag. Link following, pagination and script execution are out
//! of scope.

use scraper::{Html, Selector};

/// Extracts the page title from HTML content
///
/// Returns None when the document has no `<title>` tag or the tag is empty.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
