//! Signal source abstraction and an in-memory raster implementation.
//!
//! The recording storage format is not owned by this crate; everything
//! downstream talks to a [`SignalSource`].  [`RasterSignal`] is the
//! preloaded `[C, T]` implementation used by the CLI and the tests.
use std::fmt;

use ndarray::{s, Array2};
use tracing::debug;

use crate::error::{Error, Result};

// ── Interval ──────────────────────────────────────────────────────────────

/// A continuous time window `[start, end]` in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Reject negative or NaN starts and reversed or NaN ends.
    pub fn check(&self) -> Result<()> {
        if self.start.is_nan() || self.end.is_nan() {
            return Err(Error::Range(format!(
                "interval [{}, {}] has a NaN bound",
                self.start, self.end
            )));
        }
        if self.start < 0.0 {
            return Err(Error::Range(format!(
                "interval start {} is negative",
                self.start
            )));
        }
        if self.end < self.start {
            return Err(Error::Range(format!(
                "interval end {} precedes start {}",
                self.end, self.start
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

// ── Epochs ────────────────────────────────────────────────────────────────

/// One labeled sub-interval of a recording.  Epochs may overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochInterval {
    pub name: String,
    pub start: f64,
    pub end: f64,
}

impl EpochInterval {
    pub fn new(name: impl Into<String>, start: f64, end: f64) -> Self {
        Self { name: name.into(), start, end }
    }
}

// ── SignalSource ──────────────────────────────────────────────────────────

/// Read-only view of a multichannel recording.
pub trait SignalSource {
    /// Samples `[C, T]` covering `interval`, every channel included.
    fn extract_interval(&self, interval: &Interval) -> Result<Array2<f64>>;

    /// Ordered channel names.
    fn channel_names(&self) -> &[String];

    /// Unique epoch names starting with `pattern`, in order of first
    /// appearance.
    fn epochs_matching(&self, pattern: &str) -> Vec<String>;
}

// ── RasterSignal ──────────────────────────────────────────────────────────

/// Preloaded recording: `[C, T]` samples at a fixed sampling rate.
#[derive(Debug, Clone)]
pub struct RasterSignal {
    /// `[C, T]` samples.
    pub data: Array2<f64>,
    /// Sampling rate in Hz.
    pub fs: f64,
    pub chans: Vec<String>,
    /// Labeled epochs, sorted by start time.
    pub epochs: Vec<EpochInterval>,
}

impl RasterSignal {
    /// Build a raster signal; channel names default to `"0"`, `"1"`, … when
    /// `chans` is empty.
    pub fn new(
        data: Array2<f64>,
        fs: f64,
        chans: Vec<String>,
        mut epochs: Vec<EpochInterval>,
    ) -> Result<Self> {
        if !(fs > 0.0) {
            return Err(Error::Precondition(format!("sampling rate {fs} must be positive")));
        }
        let chans = if chans.is_empty() {
            (0..data.nrows()).map(|c| c.to_string()).collect()
        } else {
            chans
        };
        if chans.len() != data.nrows() {
            return Err(Error::Precondition(format!(
                "{} channel names for {} channels",
                chans.len(),
                data.nrows()
            )));
        }
        epochs.sort_by(|a, b| a.start.total_cmp(&b.start));
        Ok(Self { data, fs, chans, epochs })
    }

    #[inline]
    pub fn n_chans(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Total duration in seconds.
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.n_times() as f64 / self.fs
    }

    pub fn summary(&self) -> SignalSummary {
        SignalSummary {
            n_chans: self.n_chans(),
            n_times: self.n_times(),
            fs: self.fs,
            n_epochs: self.epochs.len(),
        }
    }
}

impl SignalSource for RasterSignal {
    fn extract_interval(&self, interval: &Interval) -> Result<Array2<f64>> {
        interval.check()?;
        let start = (interval.start * self.fs).round() as usize;
        let end = (interval.end * self.fs).round() as usize;
        if end > self.n_times() {
            return Err(Error::Range(format!(
                "interval end {} s (sample {end}) beyond {} samples",
                interval.end,
                self.n_times()
            )));
        }
        debug!(start, end, n_chans = self.n_chans(), "extracting interval");
        Ok(self.data.slice(s![.., start..end]).to_owned())
    }

    fn channel_names(&self) -> &[String] {
        &self.chans
    }

    fn epochs_matching(&self, pattern: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for ep in self.epochs.iter().filter(|e| e.name.starts_with(pattern)) {
            if !names.contains(&ep.name) {
                names.push(ep.name.clone());
            }
        }
        names
    }
}

// ── Summary ───────────────────────────────────────────────────────────────

/// Shape and timing overview of a recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSummary {
    pub n_chans: usize,
    pub n_times: usize,
    pub fs: f64,
    pub n_epochs: usize,
}

impl fmt::Display for SignalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ch × {} samples @ {} Hz ({:.3} s, {} epochs)",
            self.n_chans,
            self.n_times,
            self.fs,
            self.n_times as f64 / self.fs,
            self.n_epochs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n_ch: usize, n_t: usize) -> Array2<f64> {
        Array2::from_shape_fn((n_ch, n_t), |(c, t)| (c * 1000 + t) as f64)
    }

    #[test]
    fn extract_interval_uses_sample_rate() {
        let sig = RasterSignal::new(ramp(3, 400), 100.0, vec![], vec![]).unwrap();
        let x = sig.extract_interval(&Interval::new(0.5, 1.5)).unwrap();
        assert_eq!(x.dim(), (3, 100));
        assert_eq!(x[[0, 0]], 50.0);
        assert_eq!(x[[2, 99]], 2149.0);
    }

    #[test]
    fn extract_past_end_is_range_error() {
        let sig = RasterSignal::new(ramp(2, 100), 100.0, vec![], vec![]).unwrap();
        let err = sig.extract_interval(&Interval::new(0.0, 1.5)).unwrap_err();
        assert!(matches!(err, Error::Range(_)));
    }

    #[test]
    fn epochs_matching_is_unique_and_ordered() {
        let epochs = vec![
            EpochInterval::new("STIM_00b", 1.5, 3.0),
            EpochInterval::new("REFERENCE", 0.0, 6.0),
            EpochInterval::new("STIM_00a", 0.0, 1.5),
            EpochInterval::new("STIM_00a", 3.0, 4.5),
        ];
        let sig = RasterSignal::new(ramp(1, 600), 100.0, vec![], epochs).unwrap();
        assert_eq!(sig.epochs_matching("STIM_00"), vec!["STIM_00a", "STIM_00b"]);
        assert!(sig.epochs_matching("TRIAL").is_empty());
    }

    #[test]
    fn channel_name_count_must_match() {
        let err = RasterSignal::new(ramp(2, 10), 10.0, vec!["a".into()], vec![]).unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn summary_display() {
        let sig = RasterSignal::new(ramp(2, 200), 100.0, vec![], vec![]).unwrap();
        assert_eq!(sig.summary().to_string(), "2 ch × 200 samples @ 100 Hz (2.000 s, 0 epochs)");
    }
}
