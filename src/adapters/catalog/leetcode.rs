//! LeetCode catalog - implementation of `ProblemCatalog` over the public
//! listing endpoint and the GraphQL question API.
//!
//! The listing endpoint returns every problem's id, title and slug in one
//! response; detail fetches go through GraphQL per slug. Problem statements
//! arrive as HTML and are flattened to plain text for prompting.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::domain::{CatalogEntry, ProblemDetail};
use crate::ports::{CatalogError, ProblemCatalog};

/// Configuration for the LeetCode catalog.
#[derive(Debug, Clone)]
pub struct LeetCodeConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for LeetCodeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://leetcode.com".to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

impl LeetCodeConfig {
    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

const DETAIL_QUERY: &str = "\
query questionData($titleSlug: String!) {
  question(titleSlug: $titleSlug) {
    questionFrontendId
    title
    content
    difficulty
    topicTags { name }
  }
}";

/// Catalog adapter backed by leetcode.com.
pub struct LeetCodeCatalog {
    config: LeetCodeConfig,
    client: Client,
}

impl LeetCodeCatalog {
    /// Creates a catalog with the given configuration.
    pub fn new(config: LeetCodeConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("codequest/0.1")
            .build()
            .map_err(|e| CatalogError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn listing_url(&self) -> String {
        format!("{}/api/problems/all/", self.config.base_url)
    }

    fn graphql_url(&self) -> String {
        format!("{}/graphql", self.config.base_url)
    }
}

#[async_trait]
impl ProblemCatalog for LeetCodeCatalog {
    async fn list_problems(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let response = self
            .client
            .get(self.listing_url())
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Unavailable(format!(
                "listing returned status {status}"
            )));
        }

        let listing: ListingResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(format!("failed to parse listing: {e}")))?;

        let mut entries: Vec<CatalogEntry> = listing
            .stat_status_pairs
            .into_iter()
            .map(|pair| {
                CatalogEntry::new(
                    pair.stat.frontend_question_id,
                    pair.stat.question_title,
                    pair.stat.question_title_slug,
                )
            })
            .collect();
        entries.sort_by_key(|e| e.id);
        debug!(count = entries.len(), "fetched problem listing");
        Ok(entries)
    }

    async fn fetch_problem(&self, slug: &str) -> Result<Option<ProblemDetail>, CatalogError> {
        let body = GraphqlRequest {
            query: DETAIL_QUERY,
            variables: DetailVariables { title_slug: slug },
        };

        let response = self
            .client
            .post(self.graphql_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CatalogError::Unavailable(format!(
                "detail fetch returned status {status}"
            )));
        }

        let parsed: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(format!("failed to parse detail: {e}")))?;

        // An unknown slug comes back as a success with a null question.
        let Some(question) = parsed.data.and_then(|d| d.question) else {
            return Ok(None);
        };

        let id = question
            .frontend_id
            .parse::<u32>()
            .map_err(|_| CatalogError::Malformed(format!(
                "non-numeric question id: {}",
                question.frontend_id
            )))?;

        Ok(Some(ProblemDetail {
            id,
            title: question.title,
            difficulty: question.difficulty,
            body: html_to_text(question.content.as_deref().unwrap_or_default()),
            tags: question.topic_tags.into_iter().map(|t| t.name).collect(),
        }))
    }
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static BLANK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank-line regex"));

/// Flattens problem-statement HTML to readable plain text.
fn html_to_text(html: &str) -> String {
    let with_breaks = html
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("</p>", "\n\n")
        .replace("</li>", "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    BLANK_RE.replace_all(decoded.trim(), "\n\n").into_owned()
}

// ── Wire types ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    stat_status_pairs: Vec<StatPair>,
}

#[derive(Debug, Deserialize)]
struct StatPair {
    stat: Stat,
}

#[derive(Debug, Deserialize)]
struct Stat {
    frontend_question_id: u32,
    #[serde(rename = "question__title")]
    question_title: String,
    #[serde(rename = "question__title_slug")]
    question_title_slug: String,
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: DetailVariables<'a>,
}

#[derive(Debug, Serialize)]
struct DetailVariables<'a> {
    #[serde(rename = "titleSlug")]
    title_slug: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<GraphqlData>,
}

#[derive(Debug, Deserialize)]
struct GraphqlData {
    question: Option<Question>,
}

#[derive(Debug, Deserialize)]
struct Question {
    #[serde(rename = "questionFrontendId")]
    frontend_id: String,
    title: String,
    content: Option<String>,
    difficulty: String,
    #[serde(rename = "topicTags", default)]
    topic_tags: Vec<TopicTag>,
}

#[derive(Debug, Deserialize)]
struct TopicTag {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_flattens_to_plain_text() {
        let html = "<p>Given an array of integers <code>nums</code>.</p>\
                    <ul><li>First</li><li>Second</li></ul>";
        let text = html_to_text(html);
        assert!(text.starts_with("Given an array of integers nums."));
        assert!(text.contains("First\nSecond"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn html_entities_are_decoded() {
        assert_eq!(
            html_to_text("1 &lt;= n &lt;= 10&nbsp;&amp;&nbsp;x &gt; 0"),
            "1 <= n <= 10 & x > 0"
        );
    }

    #[test]
    fn excess_blank_lines_collapse() {
        let text = html_to_text("<p>a</p><p>b</p><p>c</p>");
        assert_eq!(text, "a\n\nb\n\nc");
    }

    #[test]
    fn listing_response_parses_wire_shape() {
        let json = r#"{
            "stat_status_pairs": [
                {"stat": {
                    "frontend_question_id": 1,
                    "question__title": "Two Sum",
                    "question__title_slug": "two-sum"
                }}
            ]
        }"#;
        let parsed: ListingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.stat_status_pairs[0].stat.question_title, "Two Sum");
    }

    #[test]
    fn detail_response_tolerates_null_question() {
        let json = r#"{"data": {"question": null}}"#;
        let parsed: GraphqlResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.data.unwrap().question.is_none());
    }
}
