//! Interval → stimulus-epoch resolution.
//!
//! Stimulus epochs are fixed-width bins of [`EPOCH_STEP`] seconds.  An interval
//! `[a, b]` covers bins `floor(a / step) ..= floor(b / step)`, except that a
//! bound landing exactly on a bin edge does not pull in the bin starting there.
//! The last bin has no upper neighbour, so an end index equal to the number of
//! bins selects the open-ended tail.
use std::collections::HashMap;
use std::ops::Range;

use tracing::{debug, warn};

use crate::config::PrepConfig;
use crate::error::{Error, Result};
use crate::signal::{Interval, SignalSource};

/// Width of one stimulus epoch in seconds.
pub const EPOCH_STEP: f64 = 1.5;

/// Prefix shared by every stimulus epoch name.
pub const STIM_PATTERN: &str = "STIM_00";

/// Epochs covered by an interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEpochs {
    /// Covered epoch names, in recording order.
    pub names: Vec<String>,
    /// `(floor(start / step), floor(end / step))`, kept for diagnostics.
    pub index_range: (usize, usize),
}

/// Epoch selection policy as a pure function of the bin indices.
///
/// * `end_idx == total`            → `start_idx..total`
/// * `end_idx > total − 1`         → [`Error::Range`]
/// * `end_idx != 0 && exact_boundary` → `start_idx..end_idx`
/// * otherwise                     → `start_idx..end_idx + 1`
pub fn select_epochs(
    start_idx: usize,
    end_idx: usize,
    total: usize,
    exact_boundary: bool,
) -> Result<Range<usize>> {
    if start_idx > end_idx {
        return Err(Error::Range(format!(
            "start index {start_idx} after end index {end_idx}"
        )));
    }
    if end_idx == total {
        return Ok(start_idx..total);
    }
    if end_idx >= total {
        return Err(Error::Range(format!(
            "end index {end_idx} beyond {total} stimulus epochs"
        )));
    }
    if end_idx != 0 && exact_boundary {
        return Ok(start_idx..end_idx);
    }
    Ok(start_idx..end_idx + 1)
}

/// Resolves intervals against a signal's stimulus epochs.
#[derive(Debug, Clone)]
pub struct EpochResolver {
    pub step: f64,
    pub pattern: String,
}

impl Default for EpochResolver {
    fn default() -> Self {
        Self { step: EPOCH_STEP, pattern: STIM_PATTERN.to_string() }
    }
}

impl EpochResolver {
    pub fn from_config(cfg: &PrepConfig) -> Self {
        Self { step: cfg.epoch_step, pattern: cfg.stim_pattern.clone() }
    }

    /// Bin indices `(floor(start / step), floor(end / step))`.
    pub fn indices(&self, interval: &Interval) -> Result<(usize, usize)> {
        interval.check()?;
        let start = (interval.start / self.step).floor() as usize;
        let end = (interval.end / self.step).floor() as usize;
        Ok((start, end))
    }

    pub fn resolve<S: SignalSource + ?Sized>(
        &self,
        signal: &S,
        interval: &Interval,
    ) -> Result<ResolvedEpochs> {
        let (start, end) = self.indices(interval)?;
        let epochs = signal.epochs_matching(&self.pattern);
        let exact = interval.end % self.step == 0.0;

        let range = select_epochs(start, end, epochs.len(), exact)?;
        if end == epochs.len() && !exact {
            warn!(end, total = epochs.len(), "interval ends past the last stimulus epoch; returning tail");
        }
        debug!(?range, start, end, total = epochs.len(), "resolved interval");

        Ok(ResolvedEpochs {
            names: epochs[range].to_vec(),
            index_range: (start, end),
        })
    }
}

/// Resolve `interval` against `signal` with the default 1.5 s step and
/// `STIM_00` prefix.
pub fn resolve_epochs<S: SignalSource + ?Sized>(
    signal: &S,
    interval: &Interval,
) -> Result<ResolvedEpochs> {
    EpochResolver::default().resolve(signal, interval)
}

// ── Stimulus ranking ──────────────────────────────────────────────────────

/// Sound label embedded in a stimulus epoch name:
/// `STIM_00rec1_drumroll_excerpt1` → `drumroll`.
///
/// Looks for `rec<digits>_` and takes everything up to the next `_excerpt`.
pub fn stimulus_label(epoch_name: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(pos) = epoch_name[from..].find("rec") {
        let after = from + pos + 3;
        let digits = epoch_name[after..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let label_start = after + digits + 1;
        if digits > 0 && epoch_name[after + digits..].starts_with('_') {
            if let Some(end) = epoch_name[label_start..].find("_excerpt") {
                return Some(&epoch_name[label_start..label_start + end]);
            }
        }
        from = after;
    }
    None
}

fn count_labels(epoch_names: &[String]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in epoch_names {
        match stimulus_label(name) {
            Some(label) => *counts.entry(label).or_default() += 1,
            None => debug!(name = name.as_str(), "no stimulus label"),
        }
    }
    let mut ranked: Vec<(String, usize)> =
        counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// The `top_n` most frequent stimulus labels, most frequent first (ties by
/// label).
///
/// # Errors
///
/// [`Error::Range`] unless `0 < top_n < number of distinct labels`.
pub fn rank_stimuli(epoch_names: &[String], top_n: usize) -> Result<Vec<(String, usize)>> {
    let mut ranked = count_labels(epoch_names);
    if top_n == 0 || top_n >= ranked.len() {
        return Err(Error::Range(format!(
            "invalid top_n {top_n}, {} distinct stimuli",
            ranked.len()
        )));
    }
    ranked.truncate(top_n);
    Ok(ranked)
}

/// Like [`rank_stimuli`] but returns the full ranking when `top_n` is out of
/// range.
pub fn rank_stimuli_lenient(epoch_names: &[String], top_n: usize) -> Vec<(String, usize)> {
    let mut ranked = count_labels(epoch_names);
    if 0 < top_n && top_n < ranked.len() {
        ranked.truncate(top_n);
    }
    ranked
}
