//! Data types flowing through the gesture pipeline.

use crate::pipeline::features::RegionCoverage;
use crate::pipeline::gate::GateDecision;
use std::fmt;

/// Debounced categorical signal produced by the stability gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StableLabel {
    /// No class reached the confidence threshold.
    #[default]
    NoGesture,
    /// Class index below the classifier's class count.
    Class(usize),
}

impl StableLabel {
    pub fn class(&self) -> Option<usize> {
        match self {
            StableLabel::Class(index) => Some(*index),
            StableLabel::NoGesture => None,
        }
    }
}

/// Opaque text unit appended to the sentence buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// A flushed run of tokens, handed by value to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Counts flushes from 1 within one pipeline run.
    pub sequence: u64,
    pub tokens: Vec<Token>,
}

impl Sentence {
    pub fn new(sequence: u64, tokens: Vec<Token>) -> Self {
        Self { sequence, tokens }
    }

    /// Render the tokens joined by `separator`.
    pub fn join(&self, separator: &str) -> String {
        self.tokens
            .iter()
            .map(Token::as_str)
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// What the sentence assembler did with one stable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Same label as last time.
    Held,
    Appended(Token),
    /// The buffer was non-empty and has been handed off.
    Flushed(Sentence),
    /// A flush edge arrived with an empty buffer.
    NothingToFlush,
    /// The class is mapped to no action.
    Ignored,
}

impl Transition {
    /// True when the edge changed nothing in the buffer.
    pub fn is_quiet(&self) -> bool {
        matches!(
            self,
            Transition::Held | Transition::NothingToFlush | Transition::Ignored
        )
    }
}

/// Result of feeding one frame through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// 1-based frame counter.
    pub frame: u64,
    pub coverage: RegionCoverage,
    pub outcome: TickOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The window is still filling up.
    Warming { buffered: usize },
    /// Window is full but this frame is not on the stride.
    OffStride,
    Inferred {
        decision: GateDecision,
        transition: Transition,
        /// Sentence buffer after the transition.
        pending: Vec<Token>,
    },
    /// The classifier errored; the previous label stays in effect.
    ClassifierFailed { message: String },
}

impl Tick {
    /// True for ticks on which the classifier was called.
    pub fn ran_inference(&self) -> bool {
        matches!(
            self.outcome,
            TickOutcome::Inferred { .. } | TickOutcome::ClassifierFailed { .. }
        )
    }

    /// The sentence flushed on this tick, if any.
    pub fn flushed(&self) -> Option<&Sentence> {
        match &self.outcome {
            TickOutcome::Inferred {
                transition: Transition::Flushed(sentence),
                ..
            } => Some(sentence),
            _ => None,
        }
    }
}
