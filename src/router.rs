//! Maps inbound events to intents.
//!
//! Button tokens are matched against two declared tables: every exact token
//! first, then the `<namespace>_` prefixes in order. A prefix therefore can
//! never shadow an exact token, whatever the table order.

use tracing::debug;

use crate::backend::ResourceKind;
use crate::error::BadRequest;
use crate::platform::{parse_command, InboundEvent};

/// The logical action a user request maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    MainMenu,
    SentimentMenu,
    PnlMenu,
    TrackWalletMenu,
    Subscribe,
    TopProjects,
    Sentiment(String),
    History(String),
    PnlCards(String),
    TrackWallet(String),
}

impl Intent {
    /// The backend lookup this intent needs, if any.
    pub fn lookup(&self) -> Option<(ResourceKind, &str)> {
        match self {
            Intent::Sentiment(project) => Some((ResourceKind::Sentiment, project.as_str())),
            Intent::History(project) => Some((ResourceKind::History, project.as_str())),
            Intent::PnlCards(project) => Some((ResourceKind::PnlCards, project.as_str())),
            Intent::TopProjects => Some((ResourceKind::Trending, "")),
            _ => None,
        }
    }

    /// The button token that routes back to this intent.
    pub fn callback_token(&self) -> Option<String> {
        if let Some((token, _)) = EXACT_TOKENS.iter().find(|(_, intent)| intent == self) {
            return Some((*token).to_string());
        }
        let (prefix, payload) = match self {
            Intent::Sentiment(p) => ("sentiment_", p),
            Intent::History(p) => ("history_", p),
            Intent::PnlCards(p) => ("pnl_", p),
            _ => return None,
        };
        Some(format!("{}{}", prefix, payload))
    }
}

/// Result of routing one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dispatch(Intent),
    Invalid(BadRequest),
    /// Not ours; dropped without a reply.
    NoMatch,
}

const EXACT_TOKENS: &[(&str, Intent)] = &[
    ("menu_start", Intent::MainMenu),
    ("menu_sentiment", Intent::SentimentMenu),
    ("menu_topprojects", Intent::TopProjects),
    ("menu_analyze_pnl", Intent::PnlMenu),
    ("menu_track_wallet", Intent::TrackWalletMenu),
    ("menu_subscribe", Intent::Subscribe),
];

const PREFIX_TOKENS: &[(&str, fn(String) -> Intent)] = &[
    ("sentiment_", Intent::Sentiment),
    ("history_", Intent::History),
    ("pnl_", Intent::PnlCards),
];

/// Caption marker that turns a photo into a PNL lookup.
const MEDIA_COMMAND: &str = "pnl";

pub fn route(event: &InboundEvent) -> Route {
    match event {
        InboundEvent::TypedCommand { name, args, .. } => route_command(name, args),
        InboundEvent::ButtonPress { token, .. } => route_token(token),
        InboundEvent::MediaMessage {
            caption,
            attachment,
            ..
        } => match parse_command(caption) {
            Some((name, args)) if name == MEDIA_COMMAND => {
                debug!("Photo {} carries /{}", attachment, name);
                route_command(&name, &args)
            }
            _ => Route::NoMatch,
        },
    }
}

pub fn route_command(name: &str, args: &[String]) -> Route {
    let first = args.first().map(|a| a.trim()).filter(|a| !a.is_empty());
    let with_arg = |command: &'static str, make: fn(String) -> Intent| match first {
        Some(arg) => Route::Dispatch(make(arg.to_string())),
        None => Route::Invalid(BadRequest::MissingArgument { command }),
    };

    match name {
        "start" | "help" => Route::Dispatch(Intent::MainMenu),
        "sentiment" => with_arg("sentiment", Intent::Sentiment),
        "history" => with_arg("history", Intent::History),
        "pnl" => with_arg("pnl", Intent::PnlCards),
        "trackwallet" => with_arg("trackwallet", Intent::TrackWallet),
        "topprojects" | "trending" => Route::Dispatch(Intent::TopProjects),
        "subscribe" => Route::Dispatch(Intent::Subscribe),
        _ => Route::NoMatch,
    }
}

pub fn route_token(token: &str) -> Route {
    if let Some((_, intent)) = EXACT_TOKENS.iter().find(|(exact, _)| *exact == token) {
        return Route::Dispatch(intent.clone());
    }

    for (prefix, make) in PREFIX_TOKENS {
        if let Some(payload) = token.strip_prefix(prefix) {
            let payload = payload.trim();
            if payload.is_empty() {
                return Route::Invalid(BadRequest::MalformedToken(token.to_string()));
            }
            return Route::Dispatch(make(payload.to_string()));
        }
    }

    Route::NoMatch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MessageRef;

    fn button(token: &str) -> InboundEvent {
        InboundEvent::ButtonPress {
            callback_id: "cb".to_string(),
            token: token.to_string(),
            origin: MessageRef {
                chat_id: 1,
                message_id: 2,
            },
            user_id: 3,
        }
    }

    fn command(text: &str) -> InboundEvent {
        let (name, args) = parse_command(text).unwrap();
        InboundEvent::TypedCommand {
            name,
            args,
            chat_id: 1,
            user_id: Some(3),
        }
    }

    #[test]
    fn test_exact_token_beats_prefix() {
        assert_eq!(
            route(&button("menu_sentiment")),
            Route::Dispatch(Intent::SentimentMenu)
        );
    }

    #[test]
    fn test_prefix_token_carries_payload() {
        assert_eq!(
            route(&button("sentiment_Solana")),
            Route::Dispatch(Intent::Sentiment("Solana".to_string()))
        );
        assert_eq!(
            route(&button("history_Jupiter")),
            Route::Dispatch(Intent::History("Jupiter".to_string()))
        );
        assert_eq!(
            route(&button("sentiment_dog_wif_hat")),
            Route::Dispatch(Intent::Sentiment("dog_wif_hat".to_string()))
        );
    }

    #[test]
    fn test_empty_payload_is_bad_request() {
        assert_eq!(
            route(&button("sentiment_")),
            Route::Invalid(BadRequest::MalformedToken("sentiment_".to_string()))
        );
        assert!(matches!(route(&button("history_ ")), Route::Invalid(_)));
    }

    #[test]
    fn test_unknown_events_are_no_match() {
        assert_eq!(route(&button("something_else")), Route::NoMatch);
        assert_eq!(route(&button("sentiment")), Route::NoMatch);
        assert_eq!(route(&command("/unknown thing")), Route::NoMatch);
    }

    #[test]
    fn test_commands() {
        assert_eq!(route(&command("/start")), Route::Dispatch(Intent::MainMenu));
        assert_eq!(route(&command("/help")), Route::Dispatch(Intent::MainMenu));
        assert_eq!(
            route(&command("/sentiment Solana")),
            Route::Dispatch(Intent::Sentiment("Solana".to_string()))
        );
        assert_eq!(
            route(&command("/trending")),
            Route::Dispatch(Intent::TopProjects)
        );
        assert_eq!(
            route(&command("/trackwallet 7xKXtg2CW87")),
            Route::Dispatch(Intent::TrackWallet("7xKXtg2CW87".to_string()))
        );
    }

    #[test]
    fn test_missing_argument_is_bad_request() {
        assert_eq!(
            route(&command("/sentiment")),
            Route::Invalid(BadRequest::MissingArgument {
                command: "sentiment"
            })
        );
        assert_eq!(
            route(&command("/pnl")),
            Route::Invalid(BadRequest::MissingArgument { command: "pnl" })
        );
    }

    #[test]
    fn test_photo_caption_routes_pnl() {
        let event = InboundEvent::MediaMessage {
            caption: "/pnl Bonk".to_string(),
            attachment: "file-1".to_string(),
            chat_id: 1,
            user_id: None,
        };
        assert_eq!(
            route(&event),
            Route::Dispatch(Intent::PnlCards("Bonk".to_string()))
        );

        let event = InboundEvent::MediaMessage {
            caption: "/sentiment Bonk".to_string(),
            attachment: "file-1".to_string(),
            chat_id: 1,
            user_id: None,
        };
        assert_eq!(route(&event), Route::NoMatch);
    }

    #[test]
    fn test_callback_tokens_route_back() {
        let intents = [
            Intent::MainMenu,
            Intent::SentimentMenu,
            Intent::PnlMenu,
            Intent::TrackWalletMenu,
            Intent::Subscribe,
            Intent::TopProjects,
            Intent::Sentiment("Pyth".to_string()),
            Intent::History("Bonk".to_string()),
            Intent::PnlCards("Solana".to_string()),
        ];
        for intent in intents {
            let token = intent.callback_token().unwrap();
            assert_eq!(route_token(&token), Route::Dispatch(intent));
        }
        assert_eq!(Intent::TrackWallet("x".to_string()).callback_token(), None);
    }
}
