use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Timeouts;
use crate::domain::{
    Citation, DomainResult, HistoryPoint, HistorySeries, PnlCardList, SentimentReport,
};
use crate::error::{BadRequest, ErrorKind};

/// The remote resources the analytics backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Sentiment,
    History,
    PnlCards,
    Trending,
}

impl ResourceKind {
    fn needs_project(self) -> bool {
        !matches!(self, ResourceKind::Trending)
    }

    fn timeout(self, timeouts: &Timeouts) -> Duration {
        match self {
            ResourceKind::Sentiment => timeouts.sentiment,
            _ => timeouts.lookup,
        }
    }

    fn path_segments(self, project: &str) -> Vec<String> {
        match self {
            ResourceKind::Sentiment => vec!["project".into(), normalize_project(project)],
            ResourceKind::History => vec!["history".into(), normalize_project(project)],
            ResourceKind::PnlCards => vec!["pnl".into(), normalize_project(project)],
            ResourceKind::Trending => vec!["trending".into()],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Sentiment => write!(f, "sentiment"),
            ResourceKind::History => write!(f, "history"),
            ResourceKind::PnlCards => write!(f, "pnl"),
            ResourceKind::Trending => write!(f, "trending"),
        }
    }
}

/// Upper-case the first character and lower-case the rest, the form the
/// backend keys projects by.
pub fn normalize_project(name: &str) -> String {
    let mut chars = name.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[derive(Debug, Deserialize)]
struct SentimentPayload {
    #[serde(default)]
    sentiment_score: f64,
    #[serde(default)]
    analyzed_tweet_count: u64,
    #[serde(default)]
    top_tweet: Option<TopTweet>,
}

#[derive(Debug, Deserialize)]
struct TopTweet {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    author_username: Option<String>,
    #[serde(default)]
    media_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryRecord {
    date: chrono::NaiveDate,
    #[serde(default)]
    average_sentiment_score: f64,
}

#[derive(Debug, Deserialize)]
struct PnlCard {
    #[serde(default)]
    url: Option<String>,
}

/// Thin HTTP client for the analytics backend. Cloning shares the
/// underlying connection pool.
#[derive(Clone)]
pub struct BackendGateway {
    client: reqwest::Client,
    base_url: Url,
    timeouts: Timeouts,
}

impl BackendGateway {
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid backend base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Backend base URL cannot carry a path: {}", base_url);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            timeouts,
        })
    }

    fn url_for(&self, kind: ResourceKind, project: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(kind.path_segments(project));
        }
        url
    }

    /// Fetch one resource. `project` is ignored for [`ResourceKind::Trending`].
    pub async fn fetch(
        &self,
        kind: ResourceKind,
        project: &str,
    ) -> std::result::Result<DomainResult, ErrorKind> {
        let project = project.trim();
        if kind.needs_project() && project.is_empty() {
            return Err(BadRequest::EmptyIdentifier.into());
        }

        let url = self.url_for(kind, project);
        debug!("Fetching {} from {}", kind, url);

        let response = self
            .client
            .get(url)
            .timeout(kind.timeout(&self.timeouts))
            .send()
            .await
            .map_err(|e| ErrorKind::from_reqwest(&e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ErrorKind::NotFound);
        }
        if !status.is_success() {
            return Err(ErrorKind::Upstream {
                status: Some(status.as_u16()),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ErrorKind::from_reqwest(&e))?;

        decode(kind, project, &body)
    }
}

fn malformed(err: serde_json::Error) -> ErrorKind {
    warn!("Backend returned a malformed body: {}", err);
    ErrorKind::Upstream { status: None }
}

fn decode(
    kind: ResourceKind,
    project: &str,
    body: &[u8],
) -> std::result::Result<DomainResult, ErrorKind> {
    match kind {
        ResourceKind::Sentiment => {
            let payload: SentimentPayload = serde_json::from_slice(body).map_err(malformed)?;
            let top_citation = payload.top_tweet.map(|tweet| Citation {
                text: tweet.text.unwrap_or_else(|| "N/A".to_string()),
                author: tweet.author_username.unwrap_or_else(|| "N/A".to_string()),
                media_url: tweet.media_url.filter(|u| !u.is_empty()),
            });
            Ok(DomainResult::Sentiment(SentimentReport {
                project: project.to_string(),
                score: payload.sentiment_score,
                tweet_count: payload.analyzed_tweet_count,
                top_citation,
            }))
        }
        ResourceKind::History => {
            let records: Vec<HistoryRecord> = serde_json::from_slice(body).map_err(malformed)?;
            let points = records
                .into_iter()
                .map(|r| HistoryPoint {
                    date: r.date,
                    score: r.average_sentiment_score,
                })
                .collect();
            Ok(DomainResult::History(HistorySeries::new(project, points)))
        }
        ResourceKind::PnlCards => {
            let cards: Vec<PnlCard> = serde_json::from_slice(body).map_err(malformed)?;
            Ok(DomainResult::PnlCards(PnlCardList {
                project: project.to_string(),
                urls: cards
                    .into_iter()
                    .filter_map(|c| c.url.filter(|u| !u.is_empty()))
                    .collect(),
            }))
        }
        ResourceKind::Trending => {
            let symbols: Vec<String> = serde_json::from_slice(body).map_err(malformed)?;
            Ok(DomainResult::Trending(symbols))
        }
    }
}
