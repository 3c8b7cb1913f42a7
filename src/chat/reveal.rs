//! Word-by-word reveal of the assistant's intro sentence

use std::time::Duration;

use super::session::ChatTurn;

/// Appended to partial frames while the reveal is in progress
pub const CURSOR: char = '▌';

/// How fast the intro is revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPace {
    /// Emit every frame without waiting
    Instant,
    /// Wait this long before each word
    PerWord(Duration),
}

impl RevealPace {
    pub fn from_millis(millis: u64) -> Self {
        if millis == 0 {
            RevealPace::Instant
        } else {
            RevealPace::PerWord(Duration::from_millis(millis))
        }
    }
}

/// Receives progress of a turn as it is processed
pub trait TurnObserver: Send {
    fn user_turn(&mut self, _turn: &ChatTurn) {}
    fn reveal(&mut self, _partial: &str) {}
    fn assistant_turn(&mut self, _turn: &ChatTurn) {}
}

impl TurnObserver for () {}

/// Reveal `intro` one word at a time and return the revealed line.
///
/// Whitespace is collapsed, so the result is always a single line.
pub async fn reveal_words(intro: &str, pace: RevealPace, observer: &mut dyn TurnObserver) -> String {
    let mut shown = String::new();

    for word in intro.split_whitespace() {
        if let RevealPace::PerWord(delay) = pace {
            tokio::time::sleep(delay).await;
        }
        if !shown.is_empty() {
            shown.push(' ');
        }
        shown.push_str(word);
        observer.reveal(&format!("{}{}", shown, CURSOR));
    }

    observer.reveal(&shown);
    shown
}
