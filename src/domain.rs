use chrono::NaiveDate;

/// Decoded backend response, one variant per resource kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainResult {
    Sentiment(SentimentReport),
    History(HistorySeries),
    PnlCards(PnlCardList),
    Trending(Vec<String>),
}

impl DomainResult {
    /// Media attached to the top citation, sent as a follow-up photo.
    pub fn media_url(&self) -> Option<&str> {
        match self {
            DomainResult::Sentiment(report) => report
                .top_citation
                .as_ref()
                .and_then(|c| c.media_url.as_deref()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentReport {
    /// Project identifier as the user asked for it.
    pub project: String,
    /// Score in percent, nominally 0–100.
    pub score: f64,
    pub tweet_count: u64,
    pub top_citation: Option<Citation>,
}

/// The tweet that contributed most to a sentiment score.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub text: String,
    pub author: String,
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub score: f64,
}

/// Daily scores, always ascending by date.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySeries {
    pub project: String,
    points: Vec<HistoryPoint>,
}

impl HistorySeries {
    pub fn new(project: impl Into<String>, mut points: Vec<HistoryPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self {
            project: project.into(),
            points,
        }
    }

    pub fn points(&self) -> &[HistoryPoint] {
        &self.points
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PnlCardList {
    pub project: String,
    pub urls: Vec<String>,
}
