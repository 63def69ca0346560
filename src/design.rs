//! Time-lagged design matrix.
//!
//! Turns a `[m, T]` stimulus slice into a `[T, m·(d+1)]` feature matrix for
//! linear / ridge encoding models:
//!
//! ```text
//! X[t, i·(d+1) + j] = x[i, t − j]      (0 when t − j < 0)
//! ```
//!
//! History before the first sample is read from a `d`-sample zero buffer
//! prepended to every channel, so the first `j` rows of every lag-`j` column
//! are zero.
use ndarray::{s, Array2, ArrayView2};
use tracing::debug;

use crate::config::PrepConfig;
use crate::error::{Error, Result};
use crate::signal::{Interval, SignalSource};

/// Build the causal lag embedding of the first `m` channels of `stim` (`[C, T]`).
///
/// Column order is channel-major: `(0,0), (0,1) … (0,d), (1,0) … (m−1,d)`.
/// See [`column_labels`].
///
/// # Errors
///
/// [`Error::Precondition`] if `m == 0` or `stim` has fewer than `m` channels.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use stimlag::build_design_matrix;
///
/// let x = array![[1.0, 2.0, 3.0]];
/// let dm = build_design_matrix(x.view(), 1, 1).unwrap();
/// assert_eq!(dm, array![[1.0, 0.0], [2.0, 1.0], [3.0, 2.0]]);
/// ```
pub fn build_design_matrix(stim: ArrayView2<'_, f64>, m: usize, d: usize) -> Result<Array2<f64>> {
    let (n_ch, n_t) = stim.dim();
    if m == 0 {
        return Err(Error::Precondition("design matrix needs at least one channel".into()));
    }
    if n_ch < m {
        return Err(Error::Precondition(format!(
            "stimulus has {n_ch} channels, {m} requested"
        )));
    }

    // Lag buffer: d zeros in front of every channel.
    let len = n_t + d;
    let mut padded = Array2::<f64>::zeros((m, len));
    padded.slice_mut(s![.., d..]).assign(&stim.slice(s![..m, ..]));

    let n_lags = d + 1;
    let mut out = Array2::<f64>::zeros((n_t, m * n_lags));
    for i in 0..m {
        for j in 0..n_lags {
            out.column_mut(i * n_lags + j)
                .assign(&padded.slice(s![i, d - j..len - j]));
        }
    }

    debug!(rows = n_t, cols = m * n_lags, m, d, "built design matrix");
    Ok(out)
}

/// `(channel, lag)` pair of every design-matrix column, in column order.
pub fn column_labels(m: usize, d: usize) -> Vec<(usize, usize)> {
    (0..m)
        .flat_map(|i| (0..=d).map(move |j| (i, j)))
        .collect()
}

/// Column holding `channel` at `lag`, or `None` outside `m × (d+1)`.
#[inline]
pub fn column_index(m: usize, d: usize, channel: usize, lag: usize) -> Option<usize> {
    (channel < m && lag <= d).then(|| channel * (d + 1) + lag)
}

/// Extract `interval` from `signal` and build its design matrix over the
/// first `m` channels with lag depth `d`.
pub fn prepare_stimuli<S: SignalSource + ?Sized>(
    signal: &S,
    interval: &Interval,
    m: usize,
    d: usize,
) -> Result<Array2<f64>> {
    let stim = signal.extract_interval(interval)?;
    build_design_matrix(stim.view(), m, d)
}

/// [`prepare_stimuli`] with `m` and `d` taken from `cfg`.
pub fn prepare_with_config<S: SignalSource + ?Sized>(
    signal: &S,
    interval: &Interval,
    cfg: &PrepConfig,
) -> Result<Array2<f64>> {
    prepare_stimuli(signal, interval, cfg.n_channels, cfg.lag_depth)
}
