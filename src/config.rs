//! Preparation configuration.
//!
//! [`PrepConfig`] holds every tunable parameter used when turning a recording
//! interval into a design matrix and logging the fit.  All fields have
//! defaults matching the A1 single-site stimulus recordings.
use std::path::PathBuf;

/// Configuration for stimulus preparation.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use stimlag::PrepConfig;
///
/// let cfg = PrepConfig {
///     n_channels: 4,
///     lag_depth:  10,
///     ..PrepConfig::default()
/// };
/// assert_eq!(cfg.n_columns(), 44);
/// ```
#[derive(Debug, Clone)]
pub struct PrepConfig {
    /// Width of one stimulus epoch bin in seconds.
    ///
    /// Interval bounds are mapped to epoch indices with `floor(t / epoch_step)`.
    ///
    /// Default: `1.5` s.
    pub epoch_step: f64,

    /// Prefix selecting stimulus epochs from the recording's epoch list.
    ///
    /// Default: `"STIM_00"`.
    pub stim_pattern: String,

    /// Number of leading stimulus channels (m) fed into the design matrix.
    ///
    /// Default: `18`.
    pub n_channels: usize,

    /// Lag depth (d): number of past samples embedded for every channel.
    ///
    /// `0` yields the instantaneous channels only.
    ///
    /// Default: `0`.
    pub lag_depth: usize,

    /// Where trial results are appended.
    ///
    /// Default: `results.txt` in the working directory.
    pub ledger_path: PathBuf,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            epoch_step: 1.5,
            stim_pattern: "STIM_00".to_string(),
            n_channels: 18,
            lag_depth: 0,
            ledger_path: PathBuf::from("results.txt"),
        }
    }
}

impl PrepConfig {
    /// Number of design-matrix columns, `m · (d + 1)`.
    pub fn n_columns(&self) -> usize {
        self.n_channels * (self.lag_depth + 1)
    }
}
