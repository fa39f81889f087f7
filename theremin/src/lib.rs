//! # theremin
//!
//! A two-handed visual theremin: hand detections from a camera estimator (or
//! the simulator, a recording, or LeapMotion) become a continuously playing
//! tone, with a mirrored overlay showing what the controller sees.
//!
//! ## Control mapping
//!
//! | Role | Raw label | Metric | Drives |
//! |---|---|---|---|
//! | Left (vertical) | `Right` | lowest finger point (max y, landmarks 5–20) | amplitude 0.101 → 0.001 as y goes 0.5 → 0.8 |
//! | Right (horizontal) | `Left` | leftmost point (min x, all landmarks) | frequency 880 → 261.626 Hz as x goes 0 → 0.5 |
//!
//! Raw labels are crossed to roles by `hand_signal::ROLE_TABLE`.  When a
//! frame cannot be resolved the last good control signal is held, so the
//! tone never drops out mid-phrase.
//!
//! ## Threads
//!
//! The control loop runs on the main thread and pushes set-points into
//! lock-free slots ([`voice::SharedControls`]); the audio callback reads
//! them on cpal's real-time thread.
//!
//! ## Feature flags
//!
//! * (default): simulator, JSON-lines replay and external estimators.
//! * `leap`: polls a real LeapMotion controller via LeapC.
//!
//! ### Simulator controls
//!
//! | Input | Effect |
//! |---|---|
//! | Left mouse drag | Move both hands (y → amplitude, x → frequency) |
//! | `L` / `R` | Hide the hand for that role |
//! | `C` | Drop the horizontal hand below the confidence threshold |
//! | `D` | Give both hands the same label |
//! | `Q` / `Esc` | Quit |

pub mod voice;
pub mod tone;
pub mod source;
pub mod pipeline;
pub mod visualizer;
pub mod app;
