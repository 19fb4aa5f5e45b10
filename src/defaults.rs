//! Default configuration constants for signsync.
//!
//! Shared between the TOML config, the pipeline settings and the CLI so the
//! values stay consistent.

/// Number of feature vectors the classifier sees per window.
///
/// The reference model was trained on 30-frame sequences (one second of
/// video at 30 fps).
pub const WINDOW_SIZE: usize = 30;

/// Run the classifier on every Nth frame.
///
/// 2 gives ~15 Hz inference at 30 fps capture.
pub const STRIDE: u64 = 2;

/// Number of recent probability vectors averaged before gating.
pub const SMOOTHING_WINDOW: usize = 10;

/// Minimum smoothed probability for a class to become the stable label.
pub const CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Capacity of the sentence dispatch queue.
///
/// Sentences are rare (one per flush gesture); a small queue only fills up
/// when the output consumer is slow or stuck. Once it is full, newly flushed
/// sentences are dropped rather than stalling the frame loop.
pub const DISPATCH_QUEUE: usize = 8;

/// Token appended by the default append class.
pub const DEFAULT_TOKEN: &str = "six-seven";

/// Separator used when rendering a sentence as text.
pub const TOKEN_SEPARATOR: &str = " ";

/// Text shown for the "no gesture" stable label.
pub const NO_GESTURE_TEXT: &str = "...";

/// Environment variable controlling the log filter.
pub const LOG_ENV: &str = "SIGNSYNC_LOG";

/// Landmark counts of the default holistic layout.
pub const POSE_POINTS: usize = 33;
pub const FACE_POINTS: usize = 468;
pub const HAND_POINTS: usize = 21;

/// Feature vector length of the default layout:
/// pose 33×4 + face 468×3 + two hands 21×3.
pub const FEATURE_DIMS: usize = POSE_POINTS * 4 + FACE_POINTS * 3 + 2 * HAND_POINTS * 3;
