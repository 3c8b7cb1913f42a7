//! Terminal rendering of a chat turn

use std::io::Write;

use crate::chat::{ChatTurn, TurnObserver};

/// Redraws the reveal in place on stdout
#[derive(Debug, Default)]
pub struct TerminalObserver;

impl TurnObserver for TerminalObserver {
    fn reveal(&mut self, partial: &str) {
        let mut stdout = std::io::stdout();
        let _ = write!(stdout, "\x1b[2K\r{}", partial);
        let _ = stdout.flush();
    }

    fn assistant_turn(&mut self, turn: &ChatTurn) {
        println!();
        // The intro was already revealed
        if let Some((_, rest)) = turn.content().split_once("\n\n") {
            println!("\n{}", rest);
        }
    }
}
