//! Single-line terminal readout of the current prediction and pending buffer.

use crate::defaults;
use crate::pipeline::assembler::ClassActionMap;
use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::{StableLabel, Tick, TickOutcome, Token};
use std::io::{self, Write};

const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Clear the current terminal line.
pub fn clear_line() {
    eprint!("\r\x1b[2K");
}

/// Plain-text readout for one inference tick, `None` for other ticks.
pub fn format_readout(tick: &Tick, actions: &ClassActionMap, separator: &str) -> Option<String> {
    let TickOutcome::Inferred {
        decision, pending, ..
    } = &tick.outcome
    else {
        return None;
    };

    let prediction = match decision.label {
        StableLabel::Class(index) => {
            format!("{} ({:.2})", actions.label_name(index), decision.confidence)
        }
        StableLabel::NoGesture => defaults::NO_GESTURE_TEXT.to_string(),
    };
    Some(format!(
        "Prediction: {} | Buffer: {}",
        prediction,
        join_tokens(pending, separator)
    ))
}

fn join_tokens(tokens: &[Token], separator: &str) -> String {
    tokens
        .iter()
        .map(Token::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Terminal station that redraws the readout line on stderr.
pub struct ReadoutStation {
    actions: ClassActionMap,
    separator: String,
    color: bool,
    drawn: bool,
}

impl ReadoutStation {
    pub fn new(actions: ClassActionMap, separator: &str) -> Self {
        Self {
            actions,
            separator: separator.to_string(),
            color: true,
            drawn: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn draw(&mut self, line: &str, active: bool) {
        let mut stderr = io::stderr().lock();
        let _ = if !self.color {
            write!(stderr, "\r\x1b[2K{line}")
        } else if active {
            write!(stderr, "\r\x1b[2K{GREEN}{line}{RESET}")
        } else {
            write!(stderr, "\r\x1b[2K{DIM}{line}{RESET}")
        };
        let _ = stderr.flush();
        self.drawn = true;
    }
}

impl Station for ReadoutStation {
    type Input = Tick;
    type Output = ();

    fn process(&mut self, tick: Tick) -> Result<Option<()>, StationError> {
        if let Some(line) = format_readout(&tick, &self.actions, &self.separator) {
            let active = matches!(
                tick.outcome,
                TickOutcome::Inferred { ref decision, .. } if decision.label != StableLabel::NoGesture
            );
            self.draw(&line, active);
        }
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "readout"
    }

    fn shutdown(&mut self) {
        if self.drawn {
            eprintln!();
        }
    }
}
