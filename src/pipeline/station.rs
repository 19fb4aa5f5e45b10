//! Station abstraction: one thread per processing stage, linked by channels.

use crate::pipeline::error::{ErrorReporter, StationError};
use crossbeam_channel::{Receiver, Sender};
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A processing stage that runs on its own thread.
pub trait Station: Send + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Processes a single input item.
    ///
    /// - `Ok(Some(output))` forwards output downstream
    /// - `Ok(None)` consumes the input silently
    /// - `Err(Recoverable)` is reported and the loop continues
    /// - `Err(Fatal)` is reported and the station stops
    fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, StationError>;

    fn name(&self) -> &'static str;

    /// Called once when the input channel closes or a fatal error stops the loop.
    fn shutdown(&mut self) {}
}

/// Handle to a station running in a dedicated thread.
pub struct StationRunner<S: Station> {
    handle: Option<JoinHandle<()>>,
    station_name: &'static str,
    _phantom: PhantomData<S>,
}

impl<S: Station> StationRunner<S> {
    pub fn spawn(
        mut station: S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let station_name = station.name();

        let handle = thread::spawn(move || {
            Self::run_station(&mut station, input_rx, output_tx, error_reporter);
        });

        Self {
            handle: Some(handle),
            station_name,
            _phantom: PhantomData,
        }
    }

    fn run_station(
        station: &mut S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        error_reporter: Arc<dyn ErrorReporter>,
    ) {
        let station_name = station.name();
        let mut stats = RunStats::default();
        tracing::debug!(station = station_name, "station started");

        for input in input_rx.iter() {
            stats.received += 1;
            let output = match station.process(input) {
                Ok(output) => output,
                Err(error) => {
                    error_reporter.report(station_name, &error);
                    stats.errors += 1;
                    if error.is_fatal() {
                        stats.stopped_early = true;
                        break;
                    }
                    continue;
                }
            };
            let Some(output) = output else { continue };
            if output_tx.send(output).is_err() {
                tracing::debug!(station = station_name, "downstream closed");
                stats.stopped_early = true;
                break;
            }
            stats.forwarded += 1;
        }

        station.shutdown();
        tracing::debug!(
            station = station_name,
            received = stats.received,
            forwarded = stats.forwarded,
            errors = stats.errors,
            stopped_early = stats.stopped_early,
            "station stopped"
        );
    }

    /// Waits for the station thread to complete.
    pub fn join(mut self) -> Result<(), String> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| format!("Station '{}' thread panicked", self.station_name))
        } else {
            Ok(())
        }
    }
}

/// Per-thread counters, logged when a station stops.
#[derive(Debug, Default)]
struct RunStats {
    received: u64,
    forwarded: u64,
    errors: u64,
    stopped_early: bool,
}
