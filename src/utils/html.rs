// src/utils/html.rs

//! HTML text, title and link extraction.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::url::normalize_link;

/// Elements whose text is never part of the page content.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

fn is_skipped(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .chain(std::iter::once(*element))
        .any(|e| SKIPPED_ELEMENTS.contains(&e.value().name()))
}

/// Visible text of the whole document, text nodes joined by single spaces.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        if is_skipped(&parent) {
            continue;
        }
        let text = text.trim();
        if !text.is_empty() {
            parts.push(text);
        }
    }

    parts.join(" ")
}

/// Content of the first `<title>` element, trimmed. Empty when absent.
pub fn page_title(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };
    document
        .select(&selector)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Own text (direct text children only) of every element in document
/// order, skipping elements without any.
pub fn own_texts(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("body, body *") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| !is_skipped(element))
        .filter_map(|element| {
            let own: Vec<&str> = element
                .children()
                .filter_map(|child| child.value().as_text())
                .map(|text| text.trim())
                .filter(|text| !text.is_empty())
                .collect();
            (!own.is_empty()).then(|| own.join(" "))
        })
        .collect()
}

/// Crawlable same-site paths linked from a page, in document order, without duplicates.
pub fn extract_links(html: &str, page_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| normalize_link(page_url, href))
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html>
<head><title> Котики и собаки </title><style>.x { color: red }</style></head>
<body>
  <h1>Про котов</h1>
  <div>Вступление <p>Кот сидит дома</p> хвост</div>
  <script>var кот = 1;</script>
  <a href="/Cats/">Коты</a>
  <a href="/dogs.html">Собаки</a>
  <a href="/cats">Снова коты</a>
  <a href="https://other.org/cats">Чужой сайт</a>
  <a href="/img/cat.jpg">Фото</a>
</body>
</html>"#;

    #[test]
    fn test_page_title() {
        assert_eq!(page_title(PAGE), "Котики и собаки");
        assert_eq!(page_title("<p>no title</p>"), "");
    }

    #[test]
    fn test_page_text_skips_scripts_and_styles() {
        let text = page_text(PAGE);
        assert!(text.contains("Кот сидит дома"));
        assert!(text.contains("Котики и собаки"));
        assert!(!text.contains("var"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_own_texts_exclude_child_text() {
        let texts = own_texts(PAGE);
        assert!(texts.contains(&"Вступление хвост".to_string()));
        assert!(texts.contains(&"Кот сидит дома".to_string()));
        assert!(!texts.iter().any(|t| t.contains("var")));
    }

    #[test]
    fn test_extract_links_normalizes_and_dedupes() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_links(PAGE, &url), vec!["/cats", "/dogs.html"]);
    }
}
