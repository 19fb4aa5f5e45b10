//! Edge-triggered sentence assembly driven by a class action map.

use crate::config::{ActionKind, ClassConfig};
use crate::error::{Result, SignSyncError};
use crate::pipeline::types::{Sentence, StableLabel, Token, Transition};
use std::mem;

/// What a stable label does to the sentence buffer on a label edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassAction {
    Append(Token),
    Flush,
    Ignore,
}

/// Per-class actions and display names, complete over `0..classes`.
#[derive(Debug, Clone)]
pub struct ClassActionMap {
    actions: Vec<ClassAction>,
    labels: Vec<Option<String>>,
}

static FLUSH: ClassAction = ClassAction::Flush;
static IGNORE: ClassAction = ClassAction::Ignore;

impl ClassActionMap {
    /// Build from config entries. Every class index below `classes` must be
    /// mapped exactly once.
    pub fn from_config(entries: &[ClassConfig], classes: usize) -> Result<Self> {
        let mut actions: Vec<Option<ClassAction>> = vec![None; classes];
        let mut labels = vec![None; classes];

        for entry in entries {
            if entry.index >= classes {
                return Err(SignSyncError::invalid(
                    "classes",
                    format!(
                        "class {} is out of range, the classifier reports {} classes",
                        entry.index, classes
                    ),
                ));
            }
            if actions[entry.index].is_some() {
                return Err(SignSyncError::invalid(
                    "classes",
                    format!("class {} is mapped more than once", entry.index),
                ));
            }

            let action = match entry.action {
                ActionKind::Append => match entry.token.as_deref() {
                    Some(token) if !token.is_empty() => ClassAction::Append(Token::new(token)),
                    _ => {
                        return Err(SignSyncError::invalid(
                            "classes",
                            format!("class {} appends but has no token", entry.index),
                        ));
                    }
                },
                ActionKind::Flush => ClassAction::Flush,
                ActionKind::Ignore => ClassAction::Ignore,
            };
            actions[entry.index] = Some(action);
            labels[entry.index] = entry.label.clone();
        }

        let actions = actions
            .into_iter()
            .enumerate()
            .map(|(index, action)| action.ok_or(SignSyncError::UnmappedClass { index }))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { actions, labels })
    }

    pub fn classes(&self) -> usize {
        self.actions.len()
    }

    /// `NoGesture` always flushes.
    pub fn action_for(&self, label: StableLabel) -> &ClassAction {
        match label {
            StableLabel::NoGesture => &FLUSH,
            StableLabel::Class(index) => self.actions.get(index).unwrap_or(&IGNORE),
        }
    }

    /// Display name of a class, `class <i>` when none is configured.
    pub fn label_name(&self, index: usize) -> String {
        self.labels
            .get(index)
            .and_then(|label| label.clone())
            .unwrap_or_else(|| format!("class {index}"))
    }
}

/// Turns a stream of stable labels into sentences.
///
/// Only label changes act; a held label never mutates the buffer.
#[derive(Debug)]
pub struct SentenceAssembler {
    actions: ClassActionMap,
    last_label: StableLabel,
    buffer: Vec<Token>,
    flushed: u64,
}

impl SentenceAssembler {
    pub fn new(actions: ClassActionMap) -> Self {
        Self {
            actions,
            last_label: StableLabel::NoGesture,
            buffer: Vec::new(),
            flushed: 0,
        }
    }

    pub fn advance(&mut self, current: StableLabel) -> Transition {
        if current == self.last_label {
            return Transition::Held;
        }

        let transition = match self.actions.action_for(current) {
            ClassAction::Append(token) => {
                self.buffer.push(token.clone());
                Transition::Appended(token.clone())
            }
            ClassAction::Flush if self.buffer.is_empty() => Transition::NothingToFlush,
            ClassAction::Flush => {
                self.flushed += 1;
                Transition::Flushed(Sentence::new(self.flushed, mem::take(&mut self.buffer)))
            }
            ClassAction::Ignore => Transition::Ignored,
        };

        self.last_label = current;
        transition
    }

    pub fn last_label(&self) -> StableLabel {
        self.last_label
    }

    pub fn pending(&self) -> &[Token] {
        &self.buffer
    }

    /// Drop the pending buffer without dispatching it. Returns how many tokens were lost.
    pub fn discard(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }

    pub fn actions(&self) -> &ClassActionMap {
        &self.actions
    }
}
