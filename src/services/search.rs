//! Keyword search over published content
//!
//! Matching runs in the database; this module trims the query, builds the
//! snippet around the first hit and wraps every hit in `<mark>`.

use crate::db::repositories::{SearchRepository, SearchRow};
use crate::models::{ContentKind, ListParams, PagedResult};
use crate::services::markdown::MarkdownRenderer;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::sync::Arc;

/// Queries shorter than this (after trimming) are answered with an empty page
pub const MIN_QUERY_CHARS: usize = 2;
pub const SNIPPET_CHARS: usize = 160;
/// Characters of context kept before the first hit
const LEAD_CHARS: usize = 40;

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub id: i64,
    pub slug: String,
    pub title: String,
    /// Title with hits highlighted, HTML-escaped
    pub title_html: String,
    /// Plain-text excerpt around the first hit, HTML-escaped and highlighted
    pub snippet: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Case-insensitive matcher for the literal `query`
pub fn hit_pattern(query: &str) -> Option<Regex> {
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}

/// HTML-escape `text` and wrap every occurrence of `query` in `<mark>`.
///
/// Hits are found in the raw text, so a query can never land inside an
/// entity such as `&amp;`.
pub fn highlight(text: &str, query: &str) -> String {
    let Some(re) = hit_pattern(query) else {
        return html_escape::encode_text(text).into_owned();
    };

    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for m in re.find_iter(text) {
        out.push_str(&html_escape::encode_text(&text[last..m.start()]));
        out.push_str("<mark>");
        out.push_str(&html_escape::encode_text(m.as_str()));
        out.push_str("</mark>");
        last = m.end();
    }
    out.push_str(&html_escape::encode_text(&text[last..]));
    out
}

/// Up to `SNIPPET_CHARS` characters of `text` around the first hit.
///
/// Falls back to the start of the text when the query only matched the title.
pub fn snippet(text: &str, query: &str) -> String {
    let total = text.chars().count();
    if total <= SNIPPET_CHARS {
        return text.to_string();
    }

    let hit_char = hit_pattern(query)
        .and_then(|re| re.find(text))
        .map(|m| text[..m.start()].chars().count())
        .unwrap_or(0);

    let start = hit_char.saturating_sub(LEAD_CHARS).min(total - SNIPPET_CHARS);
    let window: String = text.chars().skip(start).take(SNIPPET_CHARS).collect();

    let mut out = String::with_capacity(window.len() + 6);
    if start > 0 {
        out.push('…');
    }
    out.push_str(window.trim());
    if start + SNIPPET_CHARS < total {
        out.push('…');
    }
    out
}

fn public_url(kind: ContentKind, slug: &str) -> String {
    let section = match kind {
        ContentKind::News => "news",
        ContentKind::Speech => "speeches",
        ContentKind::Report => "reports",
    };
    format!("/{}/{}", section, slug)
}

pub struct SearchService {
    repo: Arc<dyn SearchRepository>,
    markdown: MarkdownRenderer,
}

impl SearchService {
    pub fn new(repo: Arc<dyn SearchRepository>, markdown: MarkdownRenderer) -> Self {
        Self { repo, markdown }
    }

    pub async fn search(
        &self,
        query: &str,
        kind: Option<ContentKind>,
        params: &ListParams,
    ) -> Result<PagedResult<SearchHit>> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Ok(PagedResult::empty(params));
        }

        let (rows, total) = self
            .repo
            .search(query, kind, params)
            .await
            .context("Search query failed")?;

        let hits = rows.into_iter().map(|row| self.to_hit(row, query)).collect();
        Ok(PagedResult::new(hits, total, params))
    }

    fn to_hit(&self, row: SearchRow, query: &str) -> SearchHit {
        let text = self.markdown.plain_text(&row.body);
        SearchHit {
            kind: row.kind,
            id: row.id,
            url: public_url(row.kind, &row.slug),
            slug: row.slug,
            title_html: highlight(&row.title, query),
            title: row.title,
            snippet: highlight(&snippet(&text, query), query),
            published_at: row.published_at,
        }
    }
}
