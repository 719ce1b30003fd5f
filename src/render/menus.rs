use teloxide::utils::html::escape;

use super::{Button, Keyboard, RenderedView};
use crate::router::Intent;

/// Shortcut buttons on the sentiment menu: (label, project).
const POPULAR_PROJECTS: &[(&str, &str)] = &[
    ("SOL", "Solana"),
    ("JUP", "Jupiter"),
    ("PYTH", "Pyth"),
    ("BONK", "Bonk"),
];

pub fn main_menu_keyboard() -> Keyboard {
    let mut keyboard = Keyboard::default();
    keyboard.push_row([
        Button::for_intent("📊 Check Sentiment", &Intent::SentimentMenu),
        Button::for_intent("🔥 Top Projects", &Intent::TopProjects),
    ]);
    keyboard.push_row([
        Button::for_intent("📸 PNL Viewer", &Intent::PnlMenu),
        Button::for_intent("🧠 Track Wallet (Premium)", &Intent::TrackWalletMenu),
    ]);
    keyboard.push_row([Button::for_intent("👑 Subscribe", &Intent::Subscribe)]);
    keyboard
}

/// Popular projects, plus a history shortcut when keyed by `project`.
pub fn sentiment_keyboard(project: Option<&str>) -> Keyboard {
    let mut keyboard = Keyboard::default();
    for pair in POPULAR_PROJECTS.chunks(2) {
        keyboard.push_row(pair.iter().map(|(label, name)| {
            Button::for_intent(*label, &Intent::Sentiment(name.to_string()))
        }));
    }
    if let Some(project) = project {
        keyboard.push_row([Button::for_intent(
            "📈 7-Day History",
            &Intent::History(project.to_string()),
        )]);
    }
    keyboard.push_row([Button::for_intent("« Back to Main Menu", &Intent::MainMenu)]);
    keyboard
}

/// Views that need no backend call. `None` for intents that do.
pub fn render_static(intent: &Intent) -> Option<RenderedView> {
    let view = match intent {
        Intent::MainMenu => RenderedView::new(
            "<b>⛏️ DugTrio is Online. Ready to Unearth Alpha! 🚀</b>\n\n\
             <i>Your AI-powered analytics system for the Solana ecosystem is live.</i>\n\n\
             Use the buttons below to navigate or type a command like \
             <code>/sentiment Solana</code>.",
            main_menu_keyboard(),
        ),
        Intent::SentimentMenu => RenderedView::new(
            "<b>📊 Sentiment Analysis</b>\n\n\
             Choose a popular project below or type your own:\n\
             <code>/sentiment [project_name]</code>\n\n\
             Example: <code>/sentiment WIF</code>",
            sentiment_keyboard(None),
        ),
        Intent::PnlMenu => RenderedView::new(
            "<b>📸 PNL Card Viewer</b>\n\n\
             Please enter the project name to view its PNL cards. Usage:\n\
             <code>/pnl [project_name]</code>\n\n\
             Example: <code>/pnl Solana</code>",
            main_menu_keyboard(),
        ),
        Intent::TrackWalletMenu => RenderedView::new(
            "<b>🧠 Smart Wallet Tracker (Premium Demo)</b>\n\n\
             Please send the command:\n<code>/trackwallet [address]</code>",
            main_menu_keyboard(),
        ),
        Intent::Subscribe => RenderedView::new(
            "<b>👑 Unlock DugTrio Premium</b>\n\n\
             1. Send <b>0.5 SOL</b> to:\n<code>YourSolanaWalletAddress.sol</code>\n\n\
             2. DM <b>@YourUsername</b> with your transaction ID.\n\n\
             <i>Thanks for supporting the alpha!</i>",
            main_menu_keyboard(),
        ),
        Intent::TrackWallet(address) => RenderedView::new(
            format!(
                "<b>🧠 Smart Wallet Tracker (Premium)</b>\n\n\
                 Now tracking wallet: <code>{}</code>\n\
                 Status: 🟢 <b>Active</b>\n\n\
                 <i>You will receive alerts on this wallet's significant trades.</i>",
                escape(address)
            ),
            main_menu_keyboard(),
        ),
        Intent::Sentiment(_) | Intent::History(_) | Intent::PnlCards(_) | Intent::TopProjects => {
            return None
        }
    };
    Some(view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_layout() {
        let keyboard = main_menu_keyboard();
        let shape: Vec<usize> = keyboard.rows.iter().map(Vec::len).collect();
        assert_eq!(shape, vec![2, 2, 1]);
        assert_eq!(keyboard.rows[0][0].token, "menu_sentiment");
        assert_eq!(keyboard.rows[2][0].token, "menu_subscribe");
    }

    #[test]
    fn test_sentiment_keyboard_history_row() {
        let plain = sentiment_keyboard(None);
        assert_eq!(plain.rows.len(), 3);
        assert_eq!(plain.rows[0][0].token, "sentiment_Solana");
        assert_eq!(plain.rows[2][0].token, "menu_start");

        let keyed = sentiment_keyboard(Some("Bonk"));
        assert_eq!(keyed.rows.len(), 4);
        assert_eq!(keyed.rows[2][0].token, "history_Bonk");
    }

    #[test]
    fn test_static_views() {
        assert!(render_static(&Intent::MainMenu)
            .unwrap()
            .text
            .contains("DugTrio is Online"));
        assert!(render_static(&Intent::Sentiment("Solana".to_string())).is_none());
        assert!(render_static(&Intent::TopProjects).is_none());

        let view = render_static(&Intent::TrackWallet("<addr>".to_string())).unwrap();
        assert!(view.text.contains("<code>&lt;addr&gt;</code>"));
    }
}
