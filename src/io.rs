//! Safetensors I/O: recording containers, design-matrix output and the
//! development state cache.
//!
//! Recording container layout (all little-endian):
//!
//! | key            | dtype | shape   |                                   |
//! |----------------|-------|---------|-----------------------------------|
//! | `data`         | F64   | [C, T]  | samples                           |
//! | `fs`           | F64   | [1]     | sampling rate (Hz)                |
//! | `epoch_bounds` | F64   | [E, 2]  | `(start, end)` seconds, optional  |
//! | `epoch_names`  | U8    | [n]     | newline-separated, optional       |
//! | `ch_names`     | U8    | [n]     | newline-separated, optional       |
use std::collections::HashMap;
use std::path::Path;

use ndarray::Array2;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::signal::{EpochInterval, RasterSignal};

// ── Low-level safetensors parser ─────────────────────────────────────────────

type Header = HashMap<String, Value>;

fn parse_header(bytes: &[u8]) -> Result<(Header, usize)> {
    if bytes.len() < 8 {
        return Err(Error::Parse("safetensors file too small".into()));
    }
    let mut len = [0u8; 8];
    len.copy_from_slice(&bytes[..8]);
    let n = u64::from_le_bytes(len) as usize;
    if bytes.len() - 8 < n {
        return Err(Error::Parse(format!("header length {n} exceeds file size")));
    }
    let header: Header = serde_json::from_slice(&bytes[8..8 + n])?;
    Ok((header, 8 + n))
}

fn tensor_bytes<'a>(bytes: &'a [u8], data_start: usize, entry: &Value) -> Result<&'a [u8]> {
    let offsets = entry["data_offsets"]
        .as_array()
        .ok_or_else(|| Error::Parse("missing data_offsets".into()))?;
    let off = |i: usize| {
        offsets
            .get(i)
            .and_then(Value::as_u64)
            .and_then(|v| data_start.checked_add(usize::try_from(v).ok()?))
            .ok_or_else(|| Error::Parse("malformed data_offsets".into()))
    };
    let (s, e) = (off(0)?, off(1)?);
    bytes
        .get(s..e)
        .ok_or_else(|| Error::Parse(format!("tensor bytes {s}..{e} out of bounds")))
}

fn shape_of(entry: &Value) -> Result<Vec<usize>> {
    entry["shape"]
        .as_array()
        .ok_or_else(|| Error::Parse("missing shape".into()))?
        .iter()
        .map(|v| {
            v.as_u64()
                .map(|d| d as usize)
                .ok_or_else(|| Error::Parse("malformed shape".into()))
        })
        .collect()
}

fn read_f64_tensor(bytes: &[u8], data_start: usize, entry: &Value) -> Result<Vec<f64>> {
    if entry["dtype"].as_str() != Some("F64") {
        return Err(Error::Parse(format!("expected F64 tensor, got {}", entry["dtype"])));
    }
    let raw = tensor_bytes(bytes, data_start, entry)?;
    Ok(raw
        .chunks_exact(8)
        .map(|b| {
            let mut a = [0u8; 8];
            a.copy_from_slice(b);
            f64::from_le_bytes(a)
        })
        .collect())
}

fn read_arr2(bytes: &[u8], data_start: usize, header: &Header, key: &str) -> Result<Array2<f64>> {
    let entry = header
        .get(key)
        .ok_or_else(|| Error::Parse(format!("missing '{key}' key")))?;
    let shape = shape_of(entry)?;
    if shape.len() != 2 {
        return Err(Error::Parse(format!("'{key}' has rank {}, expected 2", shape.len())));
    }
    let vals = read_f64_tensor(bytes, data_start, entry)?;
    Array2::from_shape_vec((shape[0], shape[1]), vals)
        .map_err(|e| Error::Parse(format!("'{key}' shape {shape:?}: {e}")))
}

fn read_lines(bytes: &[u8], data_start: usize, header: &Header, key: &str) -> Result<Vec<String>> {
    let Some(entry) = header.get(key) else {
        return Ok(vec![]);
    };
    let raw = tensor_bytes(bytes, data_start, entry)?;
    let text = std::str::from_utf8(raw).map_err(|e| Error::Parse(format!("'{key}': {e}")))?;
    Ok(text
        .split('\n')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

// ── Generic safetensors builder ───────────────────────────────────────────────

/// Safetensors writer for F64 and raw-byte (U8) tensors.
///
/// ```rust,no_run
/// use stimlag::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f64("fs", &[100.0], &[1]);
/// w.add_lines("ch_names", &["A1".to_string(), "A2".to_string()]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    pub fn add_f64_arr2(&mut self, name: &str, arr: &Array2<f64>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    /// Newline-joined strings stored as a U8 tensor.
    pub fn add_lines(&mut self, name: &str, lines: &[String]) {
        let bytes = lines.join("\n").into_bytes();
        let n = bytes.len();
        self.entries.push((name.to_string(), bytes, "U8", vec![n]));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

// ── Recording containers ──────────────────────────────────────────────────────

/// Load a recording container into a [`RasterSignal`].
pub fn load_recording(path: &Path) -> Result<RasterSignal> {
    let bytes = std::fs::read(path)?;
    let (header, data_start) = parse_header(&bytes)?;

    let data = read_arr2(&bytes, data_start, &header, "data")?;

    let fs_entry = header
        .get("fs")
        .ok_or_else(|| Error::Parse("missing 'fs' key".into()))?;
    let fs = *read_f64_tensor(&bytes, data_start, fs_entry)?
        .first()
        .ok_or_else(|| Error::Parse("empty 'fs' tensor".into()))?;

    let ch_names = read_lines(&bytes, data_start, &header, "ch_names")?;
    let epoch_names = read_lines(&bytes, data_start, &header, "epoch_names")?;

    let epochs = if epoch_names.is_empty() {
        vec![]
    } else {
        let bounds = read_arr2(&bytes, data_start, &header, "epoch_bounds")?;
        if bounds.nrows() != epoch_names.len() || bounds.ncols() != 2 {
            return Err(Error::Parse(format!(
                "{} epoch names but epoch_bounds is {:?}",
                epoch_names.len(),
                bounds.dim()
            )));
        }
        epoch_names
            .into_iter()
            .zip(bounds.rows())
            .map(|(name, b)| EpochInterval::new(name, b[0], b[1]))
            .collect()
    };

    RasterSignal::new(data, fs, ch_names, epochs)
}

/// Write `signal` as a recording container readable by [`load_recording`].
pub fn write_recording(signal: &RasterSignal, path: &Path) -> Result<()> {
    let mut w = StWriter::new();
    w.add_f64_arr2("data", &signal.data);
    w.add_f64("fs", &[signal.fs], &[1]);
    w.add_lines("ch_names", &signal.chans);
    if !signal.epochs.is_empty() {
        let names: Vec<String> = signal.epochs.iter().map(|e| e.name.clone()).collect();
        let bounds: Vec<f64> = signal.epochs.iter().flat_map(|e| [e.start, e.end]).collect();
        w.add_lines("epoch_names", &names);
        w.add_f64("epoch_bounds", &bounds, &[signal.epochs.len(), 2]);
    }
    w.write(path)
}

/// Write a design matrix as the single tensor `design` [T, m·(d+1)].
pub fn write_design(design: &Array2<f64>, path: &Path) -> Result<()> {
    let mut w = StWriter::new();
    w.add_f64_arr2("design", design);
    w.write(path)
}

// ── Development state cache ───────────────────────────────────────────────────

/// Cache a prepared `(stim, resp)` pair.
pub fn save_state(path: &Path, stim: &Array2<f64>, resp: &Array2<f64>) -> Result<()> {
    let mut w = StWriter::new();
    w.add_f64_arr2("stim", stim);
    w.add_f64_arr2("resp", resp);
    w.write(path)
}

/// Load a cached `(stim, resp)` pair; `None` when `path` does not exist.
pub fn load_state(path: &Path) -> Result<Option<(Array2<f64>, Array2<f64>)>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let (header, data_start) = parse_header(&bytes)?;
    let stim = read_arr2(&bytes, data_start, &header, "stim")?;
    let resp = read_arr2(&bytes, data_start, &header, "resp")?;
    Ok(Some((stim, resp)))
}
