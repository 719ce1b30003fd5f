//! Pure functions turning results into chat text plus an inline keyboard.
//! All text is Telegram HTML; anything user- or backend-supplied is escaped.

pub mod menus;

use teloxide::utils::html::escape;

use crate::backend::normalize_project;
use crate::domain::{DomainResult, HistorySeries, PnlCardList, SentimentReport};
use crate::error::{BadRequest, ErrorKind};
use crate::router::Intent;

pub use menus::{main_menu_keyboard, render_static, sentiment_keyboard};

/// Telegram rejects callback data longer than this.
const MAX_CALLBACK_BYTES: usize = 64;

pub const BAR_LENGTH: usize = 10;
const BAR_FILLED: char = '█';
const BAR_EMPTY: char = '░';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub token: String,
}

impl Button {
    /// A button that routes to `intent`, or `None` if the intent has no
    /// token or the token would not fit in callback data.
    pub fn for_intent(label: impl Into<String>, intent: &Intent) -> Option<Self> {
        let token = intent.callback_token()?;
        if token.len() > MAX_CALLBACK_BYTES {
            return None;
        }
        Some(Self {
            label: label.into(),
            token,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn push_row(&mut self, row: impl IntoIterator<Item = Option<Button>>) {
        let row: Vec<Button> = row.into_iter().flatten().collect();
        if !row.is_empty() {
            self.rows.push(row);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl RenderedView {
    pub fn new(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }

    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Bullish,
    Neutral,
    Bearish,
}

impl Mood {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Mood::Bullish
        } else if score >= 50.0 {
            Mood::Neutral
        } else {
            Mood::Bearish
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::Bullish => "🟢 Bullish",
            Mood::Neutral => "🟡 Neutral",
            Mood::Bearish => "🔴 Bearish",
        }
    }
}

/// Fixed-width bar for a 0–100 score. Out-of-range input is clamped.
pub fn bar(score: f64, length: usize) -> String {
    let score = if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    };
    let filled = ((length as f64) * score / 100.0).round() as usize;
    let filled = filled.min(length);

    let mut out = String::with_capacity(length * BAR_FILLED.len_utf8());
    out.extend(std::iter::repeat(BAR_FILLED).take(filled));
    out.extend(std::iter::repeat(BAR_EMPTY).take(length - filled));
    out
}

pub fn render_result(result: &DomainResult) -> RenderedView {
    match result {
        DomainResult::Sentiment(report) => render_sentiment(report),
        DomainResult::History(series) => render_history(series),
        DomainResult::PnlCards(list) => render_pnl_cards(list),
        DomainResult::Trending(symbols) => render_trending(symbols),
    }
}

fn render_sentiment(report: &SentimentReport) -> RenderedView {
    let mut parts = vec![
        format!(
            "<b>📈 Sentiment for {}</b>\n",
            escape(&report.project.to_uppercase())
        ),
        format!("<b>Overall Mood:</b> {}", Mood::from_score(report.score).label()),
        format!("<b>Sentiment Score:</b> <code>{:.2}%</code>", report.score),
        format!("<b>Based on:</b> <i>{} recent tweets</i>", report.tweet_count),
    ];

    if let Some(citation) = &report.top_citation {
        parts.push(format!(
            "\n<b>🔝 Top Tweet driving the score:</b>\n<i>\"{}\"</i>\n- <b>Author:</b> @{}",
            escape(&citation.text),
            escape(&citation.author)
        ));
    }

    RenderedView::new(parts.join("\n"), sentiment_keyboard(Some(report.project.as_str())))
}

fn render_history(series: &HistorySeries) -> RenderedView {
    let project = escape(&series.project.to_uppercase());
    let keyboard = sentiment_keyboard(Some(series.project.as_str()));

    if series.points().is_empty() {
        return RenderedView::new(
            format!("😕 No historical data found for <b>{}</b>.", project),
            keyboard,
        );
    }

    let mut parts = vec![format!("<b>📈 7-Day Sentiment History for {}</b>\n", project)];
    for point in series.points() {
        parts.push(format!(
            "<code>{}: {} {:.0}%</code>",
            point.date.format("%a"),
            bar(point.score, BAR_LENGTH),
            point.score
        ));
    }

    RenderedView::new(parts.join("\n"), keyboard)
}

fn render_pnl_cards(list: &PnlCardList) -> RenderedView {
    let project = escape(&list.project.to_uppercase());

    if list.urls.is_empty() {
        return RenderedView::new(
            format!("😕 No PNL cards found for <b>{}</b>.", project),
            main_menu_keyboard(),
        );
    }

    let mut parts = vec![format!("<b>📸 PNL Cards for {}</b>\n", project)];
    for (i, url) in list.urls.iter().enumerate() {
        parts.push(format!(
            "{n}. <a href=\"{}\">PNL Card #{n}</a>",
            escape(url),
            n = i + 1
        ));
    }

    RenderedView::new(parts.join("\n"), main_menu_keyboard())
}

fn render_trending(symbols: &[String]) -> RenderedView {
    if symbols.is_empty() {
        return RenderedView::new(
            "😕 No trending projects found at the moment.",
            main_menu_keyboard(),
        );
    }

    let mut parts = vec!["<b>🔥 Top Trending Projects</b>\n".to_string()];
    for (i, symbol) in symbols.iter().enumerate() {
        parts.push(format!("{}. ${}", i + 1, escape(&symbol.to_uppercase())));
    }

    RenderedView::new(parts.join("\n"), main_menu_keyboard())
}

/// The transient "working on it" message for intents that call the backend.
pub fn pending_view(intent: &Intent) -> Option<RenderedView> {
    let text = match intent {
        Intent::Sentiment(p) => format!(
            "<i>⛏️ Digging for {} sentiment...</i>",
            escape(&normalize_project(p))
        ),
        Intent::History(p) => format!(
            "<i>Fetching 7-day history for {}...</i>",
            escape(&normalize_project(p))
        ),
        Intent::PnlCards(p) => format!(
            "<i>Fetching PNL cards for {}...</i>",
            escape(&normalize_project(p))
        ),
        Intent::TopProjects => "<i>🔥 Fetching top trending projects...</i>".to_string(),
        _ => return None,
    };
    Some(RenderedView::text_only(text))
}

/// User-facing copy for a failed interaction, with a keyboard to recover.
/// `intent` is `None` when the event never resolved to one.
pub fn render_error(err: &ErrorKind, intent: Option<&Intent>) -> RenderedView {
    if let ErrorKind::BadRequest(bad) = err {
        return render_bad_request(bad);
    }

    let subject = intent.and_then(subject_of).map(|p| escape(&p.to_uppercase()));
    let text = match (err, subject) {
        (ErrorKind::NotFound, Some(project)) => format!(
            "⚠️ No data found for <b>{}</b>. The tracker may not have this token yet.",
            project
        ),
        (ErrorKind::NotFound, None) => "⚠️ No data found. Please try again later.".to_string(),
        (ErrorKind::Upstream { status: Some(code) }, _) => format!(
            "❌ Server error: Could not retrieve data ({}). Please try again.",
            code
        ),
        (ErrorKind::Upstream { status: None }, _) => {
            "❌ The analytics service sent an unreadable response. Please try again.".to_string()
        }
        (ErrorKind::Timeout, _) => {
            "⏳ The analytics service took too long to respond. It may be waking up, \
             please try again in a minute."
                .to_string()
        }
        (ErrorKind::Transport(_), _) => {
            "❌ Could not reach the analytics service. Please try again.".to_string()
        }
        _ => "❌ Something went wrong. Please try again.".to_string(),
    };

    RenderedView::new(text, recovery_keyboard(intent))
}

fn render_bad_request(bad: &BadRequest) -> RenderedView {
    match bad {
        BadRequest::MissingArgument {
            command: "sentiment",
        } => RenderedView::new(
            "Please specify a project. Usage: <code>/sentiment Solana</code>",
            sentiment_keyboard(None),
        ),
        BadRequest::MissingArgument { command: "history" } => RenderedView::new(
            "Please specify a project. Usage: <code>/history Solana</code>",
            sentiment_keyboard(None),
        ),
        BadRequest::MissingArgument { command: "pnl" } => RenderedView::new(
            "Please specify a project. Usage: <code>/pnl Solana</code>",
            main_menu_keyboard(),
        ),
        BadRequest::MissingArgument {
            command: "trackwallet",
        } => RenderedView::new(
            "Usage: <code>/trackwallet &lt;address&gt;</code>",
            main_menu_keyboard(),
        ),
        BadRequest::MissingArgument { command } => RenderedView::new(
            format!("<code>/{}</code> needs an argument.", escape(command)),
            main_menu_keyboard(),
        ),
        BadRequest::MalformedToken(_) | BadRequest::EmptyIdentifier => RenderedView::new(
            "⚠️ Could not determine the project. Please try again.",
            sentiment_keyboard(None),
        ),
    }
}

fn subject_of(intent: &Intent) -> Option<&str> {
    match intent {
        Intent::Sentiment(p) | Intent::History(p) | Intent::PnlCards(p) => Some(p.as_str()),
        _ => None,
    }
}

fn recovery_keyboard(intent: Option<&Intent>) -> Keyboard {
    let Some(intent) = intent else {
        return main_menu_keyboard();
    };

    let mut keyboard = Keyboard::default();
    keyboard.push_row([Button::for_intent("🔄 Try again", intent)]);

    let base = match intent {
        Intent::Sentiment(p) | Intent::History(p) => sentiment_keyboard(Some(p.as_str())),
        _ => main_menu_keyboard(),
    };
    keyboard.rows.extend(base.rows);
    keyboard
}
