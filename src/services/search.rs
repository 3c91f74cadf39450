// src/services/search.rs

//! Query-time ranking and snippet extraction.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::Regex;
use rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{Page, SearchConfig, SearchPage, SearchResult, Site};
use crate::services::lemmatizer::Lemmatizer;
use crate::storage::{Database, LemmaStore, PageStore, SiteStore};
use crate::utils::html;

/// A query lemma that exists in the searched scope.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    lemma: String,
    frequency: i64,
}

/// Answers keyword queries against the lemma index.
pub struct SearchRanker {
    db: Arc<Database>,
    lemmatizer: Arc<Lemmatizer>,
    config: SearchConfig,
}

impl SearchRanker {
    pub fn new(db: Arc<Database>, lemmatizer: Arc<Lemmatizer>, config: SearchConfig) -> Self {
        Self {
            db,
            lemmatizer,
            config,
        }
    }

    /// Rank the pages matching every selected query lemma.
    ///
    /// `site` restricts the search to one site; `None` searches the whole corpus.
    /// Results are ordered by relative relevance, then page id, and sliced to
    /// `[offset, offset + limit)`. `total_count` is the size before slicing.
    pub fn search(
        &self,
        query: &str,
        site: Option<&Site>,
        offset: usize,
        limit: usize,
    ) -> Result<SearchPage> {
        if query.trim().is_empty() {
            return Err(AppError::validation("Empty search query"));
        }

        let mut query_lemmas: Vec<String> = self.lemmatizer.collect_lemmas(query).into_keys().collect();
        query_lemmas.sort();
        let site_id = site.map(|s| s.id);

        self.db.read(|conn| {
            let lemmas = self.select_lemmas(conn, &query_lemmas, site_id)?;
            if lemmas.is_empty() {
                log::debug!("No indexed lemmas for query '{}'", query);
                return Ok(SearchPage::default());
            }

            let page_ids = matching_pages(conn, &lemmas, site_id)?;
            if page_ids.is_empty() {
                return Ok(SearchPage::default());
            }

            let mut scored = Vec::with_capacity(page_ids.len());
            for page_id in page_ids {
                scored.push((page_id, conn.rank_sum_for_page(page_id)?));
            }
            let scored = normalize(scored);
            let total_count = scored.len();

            let mut sites: HashMap<i64, Site> = HashMap::new();
            let mut results = Vec::new();
            for (page_id, relevance) in scored.into_iter().skip(offset).take(limit) {
                let Some(page) = conn.find_page_by_id(page_id)? else {
                    continue;
                };
                let site = match sites.get(&page.site_id) {
                    Some(site) => site.clone(),
                    None => {
                        let Some(site) = conn.find_site_by_id(page.site_id)? else {
                            continue;
                        };
                        sites.insert(site.id, site.clone());
                        site
                    }
                };
                results.push(self.build_result(&site, &page, &lemmas, relevance));
            }

            Ok(SearchPage {
                total_count,
                results,
            })
        })
    }

    /// Resolve query lemmas in scope, drop the too-common ones and order
    /// the rest rarest first.
    fn select_lemmas(
        &self,
        conn: &Connection,
        query_lemmas: &[String],
        site_id: Option<i64>,
    ) -> Result<Vec<String>> {
        let mut candidates = Vec::new();
        for lemma in query_lemmas {
            let frequency = match site_id {
                Some(site_id) => conn.find_lemma(lemma, site_id)?.map(|row| row.frequency),
                None => {
                    let rows = conn.find_lemmas_by_text(lemma)?;
                    (!rows.is_empty()).then(|| rows.iter().map(|row| row.frequency).sum())
                }
            };
            if let Some(frequency) = frequency {
                candidates.push(Candidate {
                    lemma: lemma.clone(),
                    frequency,
                });
            }
        }

        let max_frequency = conn.max_frequency(site_id)?.unwrap_or(0);
        Ok(filter_common(
            candidates,
            max_frequency,
            self.config.frequency_threshold,
        ))
    }

    fn build_result(&self, site: &Site, page: &Page, lemmas: &[String], relevance: f64) -> SearchResult {
        SearchResult {
            site_url: site.url.clone(),
            site_name: site.name.clone(),
            path: page.path.clone(),
            title: html::page_title(&page.content),
            snippet: snippet(&page.content, lemmas, self.config.snippet_max_chars),
            relevance,
        }
    }
}

/// Drop candidates whose frequency exceeds `threshold * max_frequency`.
///
/// When that would drop every candidate the unfiltered list is kept.
fn filter_common(candidates: Vec<Candidate>, max_frequency: i64, threshold: f64) -> Vec<String> {
    let limit = threshold * max_frequency as f64;
    let mut selected: Vec<Candidate> = candidates
        .iter()
        .filter(|c| c.frequency as f64 <= limit)
        .cloned()
        .collect();
    if selected.is_empty() {
        selected = candidates;
    }

    selected.sort_by(|a, b| a.frequency.cmp(&b.frequency).then_with(|| a.lemma.cmp(&b.lemma)));
    let mut lemmas: Vec<String> = selected.into_iter().map(|c| c.lemma).collect();
    let mut seen = HashSet::new();
    lemmas.retain(|lemma| seen.insert(lemma.clone()));
    lemmas
}

/// Pages indexed under the first lemma, narrowed to those indexed under every other.
fn matching_pages(conn: &Connection, lemmas: &[String], site_id: Option<i64>) -> Result<Vec<i64>> {
    let Some((rarest, rest)) = lemmas.split_first() else {
        return Ok(Vec::new());
    };

    let mut pages = conn.page_ids_containing_lemma(rarest, site_id)?;
    for lemma in rest {
        if pages.is_empty() {
            break;
        }
        let containing = conn.page_ids_containing_lemma(lemma, site_id)?;
        pages.retain(|id| containing.contains(id));
    }

    let mut pages: Vec<i64> = pages.into_iter().collect();
    pages.sort_unstable();
    Ok(pages)
}

/// Divide every score by the maximum and sort descending, ties by page id.
fn normalize(mut scored: Vec<(i64, f64)>) -> Vec<(i64, f64)> {
    let max = scored.iter().map(|(_, score)| *score).fold(0.0_f64, f64::max);
    for (_, score) in &mut scored {
        *score = if max > 0.0 { *score / max } else { 0.0 };
    }
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    scored
}

/// Text of the element best matching `lemmas`, with matches in `<b>` tags.
///
/// The first lemma found in some element's own text picks the candidate
/// elements; later lemmas narrow them down while at least one remains.
pub fn snippet(content: &str, lemmas: &[String], max_chars: usize) -> String {
    let texts = html::own_texts(content);
    let lowered: Vec<String> = texts.iter().map(|t| t.to_lowercase()).collect();

    let mut matching: Vec<usize> = Vec::new();
    for lemma in lemmas {
        matching = (0..texts.len())
            .filter(|&i| lowered[i].contains(lemma.as_str()))
            .collect();
        if !matching.is_empty() {
            break;
        }
    }
    if matching.is_empty() {
        return String::new();
    }

    for lemma in lemmas {
        if matching.len() == 1 {
            break;
        }
        let narrowed: Vec<usize> = matching
            .iter()
            .copied()
            .filter(|&i| lowered[i].contains(lemma.as_str()))
            .collect();
        if !narrowed.is_empty() {
            matching = narrowed;
        }
    }
    let Some(&best) = matching.first() else {
        return String::new();
    };

    truncate(&highlight(&texts[best], lemmas), max_chars)
}

/// Wrap every case-insensitive occurrence of any lemma in `<b>`.
fn highlight(text: &str, lemmas: &[String]) -> String {
    let mut sorted: Vec<&String> = lemmas.iter().filter(|l| !l.is_empty()).collect();
    if sorted.is_empty() {
        return text.to_string();
    }
    sorted.sort_by_key(|l| std::cmp::Reverse(l.chars().count()));

    let alternation = sorted
        .iter()
        .map(|l| regex::escape(l))
        .collect::<Vec<_>>()
        .join("|");
    match Regex::new(&format!("(?i){alternation}")) {
        Ok(re) => re.replace_all(text, "<b>$0</b>").into_owned(),
        Err(e) => {
            log::warn!("Cannot build highlight pattern: {}", e);
            text.to_string()
        }
    }
}

/// Cut to `max_chars - 3` characters plus "..." when longer than `max_chars`.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(lemma: &str, frequency: i64) -> Candidate {
        Candidate {
            lemma: lemma.to_string(),
            frequency,
        }
    }

    #[test]
    fn test_filter_drops_common_lemmas_and_sorts_rarest_first() {
        let lemmas = filter_common(
            vec![candidate("дом", 5), candidate("кот", 10), candidate("сад", 2)],
            10,
            0.9,
        );
        assert_eq!(lemmas, vec!["сад", "дом"]);
    }

    #[test]
    fn test_filter_keeps_all_when_everything_is_common() {
        let lemmas = filter_common(vec![candidate("кот", 2)], 2, 0.9);
        assert_eq!(lemmas, vec!["кот"]);
    }

    #[test]
    fn test_normalize_orders_by_relevance_then_id() {
        let scored = normalize(vec![(3, 1.0), (1, 5.0), (2, 1.0)]);
        assert_eq!(scored, vec![(1, 1.0), (2, 0.2), (3, 0.2)]);
    }

    #[test]
    fn test_highlight_is_case_insensitive() {
        assert_eq!(
            highlight("Кот видит кота", &["кот".to_string()]),
            "<b>Кот</b> видит <b>кот</b>а"
        );
    }

    #[test]
    fn test_highlight_prefers_longer_lemma() {
        assert_eq!(
            highlight("котенок", &["кот".to_string(), "котенок".to_string()]),
            "<b>котенок</b>"
        );
    }

    #[test]
    fn test_truncate_counts_characters() {
        let long = "я".repeat(250);
        let cut = truncate(&long, 200);
        assert_eq!(cut.chars().count(), 200);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("коротко", 200), "коротко");
    }

    #[test]
    fn test_snippet_narrows_to_element_with_more_lemmas() {
        let html = "<body><p>кот спит</p><p>кот и дом</p><p>дом пуст</p></body>";
        let lemmas = vec!["кот".to_string(), "дом".to_string()];
        assert_eq!(snippet(html, &lemmas, 200), "<b>кот</b> и <b>дом</b>");
    }

    #[test]
    fn test_snippet_falls_back_to_later_lemma() {
        let html = "<body><h1>Сад</h1><p>ничего</p></body>";
        let lemmas = vec!["лес".to_string(), "сад".to_string()];
        assert_eq!(snippet(html, &lemmas, 200), "<b>Сад</b>");
    }

    #[test]
    fn test_snippet_without_match_is_empty() {
        assert_eq!(snippet("<p>ничего</p>", &["кот".to_string()], 200), "");
    }
}
