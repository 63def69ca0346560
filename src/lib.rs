//! # stimlag — stimulus preparation for encoding models
//!
//! `stimlag` turns multichannel stimulus recordings into time-lagged design
//! matrices for linear / ridge encoding models, resolves time intervals to the
//! stimulus epochs they cover, and keeps a plain-text ledger of fit results.
//!
//! ## Pipeline overview
//!
//! ```text
//! interval (s)
//!   │
//!   ├─ epoch::resolve_epochs()        ⌊t / 1.5⌋ → covered STIM_00 epochs
//!   ├─ SignalSource::extract_interval [C, T] samples
//!   ├─ design::build_design_matrix    first m channels, lag depth d
//!   │                                 → [T, m·(d+1)]
//!   ├─ (external model fit)
//!   └─ ledger::append_trial           N: k header + one block per trial
//! ```
//!
//! ## Quick start
//!
//! ```
//! use ndarray::Array2;
//! use stimlag::{prepare_stimuli, resolve_epochs, EpochInterval, Interval, RasterSignal};
//!
//! // 2-channel, 6-second stimulus at 100 Hz with four 1.5 s stimulus epochs.
//! let data = Array2::from_shape_fn((2, 600), |(c, t)| (c * 1000 + t) as f64);
//! let epochs = (0..4)
//!     .map(|k| EpochInterval::new(format!("STIM_00e{k}"), k as f64 * 1.5, (k + 1) as f64 * 1.5))
//!     .collect();
//! let signal = RasterSignal::new(data, 100.0, vec![], epochs).unwrap();
//!
//! let interval = Interval::new(0.0, 3.0);
//! let covered = resolve_epochs(&signal, &interval).unwrap();
//! assert_eq!(covered.names, vec!["STIM_00e0", "STIM_00e1"]);
//!
//! let x = prepare_stimuli(&signal, &interval, 2, 3).unwrap();
//! assert_eq!(x.dim(), (300, 8));
//! ```

pub mod config;
pub mod design;
pub mod epoch;
pub mod error;
pub mod io;
pub mod ledger;
pub mod signal;
pub mod sites;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use config::PrepConfig;
pub use design::{build_design_matrix, column_index, column_labels, prepare_stimuli, prepare_with_config};
pub use epoch::{
    rank_stimuli, rank_stimuli_lenient, resolve_epochs, select_epochs, stimulus_label,
    EpochResolver, ResolvedEpochs, EPOCH_STEP, STIM_PATTERN,
};
pub use error::{Error, Result};
pub use io::{load_recording, load_state, save_state, write_design, write_recording, StWriter};
pub use ledger::{append_trial, FileStore, Ledger, MemoryStore, TextStore, TrialRecord};
pub use signal::{EpochInterval, Interval, RasterSignal, SignalSource, SignalSummary};
pub use sites::{count_sites, site_name};
