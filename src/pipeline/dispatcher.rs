//! Non-blocking handoff of finished sentences to a single consumer.

use crate::pipeline::sink::SentenceSink;
use crate::pipeline::types::Sentence;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::thread::{self, JoinHandle};

/// Producer side of the dispatch queue, owned by the gesture station.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: Sender<Sentence>,
}

impl Dispatcher {
    /// Create a dispatcher and the receiving end of its queue.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Sentence>) {
        let (tx, rx) = bounded(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Hand a sentence off without blocking.
    ///
    /// Returns false when the sentence was lost to a full or closed queue.
    pub fn dispatch(&self, sentence: Sentence) -> bool {
        match self.tx.try_send(sentence) {
            Ok(()) => true,
            Err(TrySendError::Full(sentence)) => {
                tracing::warn!(
                    sequence = sentence.sequence,
                    tokens = sentence.len(),
                    capacity = self.tx.capacity(),
                    "dispatch queue full (see pipeline.dispatch_queue), best-effort delivery loss"
                );
                false
            }
            Err(TrySendError::Disconnected(sentence)) => {
                tracing::warn!(
                    sequence = sentence.sequence,
                    tokens = sentence.len(),
                    "dispatch queue closed, best-effort delivery loss"
                );
                false
            }
        }
    }
}

/// Thread draining the dispatch queue into a sink.
pub struct DispatchWorker {
    handle: Option<JoinHandle<()>>,
    sink_name: &'static str,
}

impl DispatchWorker {
    /// Spawn the consumer. When the queue disconnects it calls `sink.finish()`
    /// and sends the result on `result_tx`.
    pub fn spawn(
        rx: Receiver<Sentence>,
        mut sink: Box<dyn SentenceSink>,
        result_tx: Sender<Option<String>>,
    ) -> Self {
        let sink_name = sink.name();
        let handle = thread::spawn(move || {
            let mut delivered = 0usize;
            while let Ok(sentence) = rx.recv() {
                match sink.deliver(&sentence) {
                    Ok(()) => delivered += 1,
                    Err(e) => tracing::warn!(
                        sink = sink_name,
                        sequence = sentence.sequence,
                        error = %e,
                        "sentence delivery failed"
                    ),
                }
            }
            tracing::debug!(sink = sink_name, delivered, "dispatch queue drained");
            let _ = result_tx.send(sink.finish());
        });

        Self {
            handle: Some(handle),
            sink_name,
        }
    }

    pub fn join(mut self) -> Result<(), String> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| format!("Dispatch worker for '{}' panicked", self.sink_name))
        } else {
            Ok(())
        }
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink_name
    }
}
