/// Shared helpers for building synthetic recordings.
use ndarray::Array2;
use stimlag::{EpochInterval, RasterSignal};

#[allow(unused)]
pub const FS: f64 = 100.0;

#[allow(unused)]
/// `[n_ch, n_t]` signal whose value encodes its position: `c·1000 + t + 1`.
/// Never zero, so zero-padding is distinguishable from data.
pub fn ramp(n_ch: usize, n_t: usize) -> Array2<f64> {
    Array2::from_shape_fn((n_ch, n_t), |(c, t)| (c * 1000 + t + 1) as f64)
}

#[allow(unused)]
/// Smooth multichannel signal for value checks.
pub fn sines(n_ch: usize, n_t: usize) -> Array2<f64> {
    Array2::from_shape_fn((n_ch, n_t), |(c, t)| {
        ((c as f64 * 3.7 + t as f64 * 0.1).sin() + 1.5) * (c + 1) as f64
    })
}

#[allow(unused)]
/// `n_epochs` back-to-back 1.5 s stimulus epochs plus one overlapping
/// non-stimulus epoch, sampled at [`FS`].
pub fn stim_signal(n_ch: usize, n_epochs: usize) -> RasterSignal {
    let n_t = (n_epochs as f64 * 1.5 * FS).round() as usize;
    let mut epochs: Vec<EpochInterval> = (0..n_epochs)
        .map(|k| {
            EpochInterval::new(
                format!("STIM_00rec{k}_sound{}_excerpt1", k % 3),
                k as f64 * 1.5,
                (k + 1) as f64 * 1.5,
            )
        })
        .collect();
    epochs.push(EpochInterval::new("REFERENCE", 0.0, n_epochs as f64 * 1.5));
    RasterSignal::new(sines(n_ch, n_t), FS, vec![], epochs).unwrap()
}
