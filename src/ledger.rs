//! Append-only trial result ledger.
//!
//! Plain-text log of completed fits.  Line 1 carries the running trial count
//! and is the only line ever rewritten:
//!
//! ```text
//! N: 2
//! Trial: n=1, m=2, d=1
//! Results:
//! 	Coefficients: [0.5, 1.25]
//! 	Intercepts: [0.0]
//! 	R2: 0.91
//! 	MSE: 0.02
//! 	MAE: 0.1
//! 	Function: ridge
//! Trial: n=2, m=2, d=1
//! ...
//! ```
//!
//! The read-modify-append sequence is not atomic: one writer per file.
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};

// ── Record ────────────────────────────────────────────────────────────────

/// Outcome of one model fit.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub coefficients: Vec<f64>,
    pub intercepts: Vec<f64>,
    /// Lag depth used to build the design matrix.
    pub d: usize,
    /// Channel count used to build the design matrix.
    pub m: usize,
    pub r2: f64,
    pub mae: f64,
    pub mse: f64,
    /// Free-text model / function identifier.
    pub function: String,
}

fn bracketed(values: &[f64]) -> String {
    let joined: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
    format!("[{}]", joined.join(", "))
}

impl TrialRecord {
    /// Fixed-layout ledger block for trial number `n`.
    pub fn to_block(&self, n: u64) -> String {
        let mut s = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(s, "Trial: n={n}, m={}, d={}", self.m, self.d);
        let _ = writeln!(s, "Results:");
        let _ = writeln!(s, "\tCoefficients: {}", bracketed(&self.coefficients));
        let _ = writeln!(s, "\tIntercepts: {}", bracketed(&self.intercepts));
        let _ = writeln!(s, "\tR2: {:?}", self.r2);
        let _ = writeln!(s, "\tMSE: {:?}", self.mse);
        let _ = writeln!(s, "\tMAE: {:?}", self.mae);
        let _ = writeln!(s, "\tFunction: {}", self.function);
        s
    }
}

// ── Text store ────────────────────────────────────────────────────────────

/// Backing text artifact of a ledger.
pub trait TextStore {
    /// Full content, or `None` when the artifact does not exist yet.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the first line with `line` (no trailing newline), keeping the
    /// rest byte-for-byte.
    fn replace_first_line(&mut self, line: &str) -> Result<()>;

    /// Append `text` at the end, creating the artifact if needed.
    fn append(&mut self, text: &str) -> Result<()>;
}

/// File-backed store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextStore for FileStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn replace_first_line(&mut self, line: &str) -> Result<()> {
        let content = fs::read_to_string(&self.path)?;
        fs::write(&self.path, splice_first_line(&content, line))?;
        Ok(())
    }

    fn append(&mut self, text: &str) -> Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        f.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// In-memory store; `None` until first written.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub content: Option<String>,
}

impl TextStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.content.clone())
    }

    fn replace_first_line(&mut self, line: &str) -> Result<()> {
        let content = self.content.as_deref().unwrap_or("");
        self.content = Some(splice_first_line(content, line));
        Ok(())
    }

    fn append(&mut self, text: &str) -> Result<()> {
        self.content.get_or_insert_with(String::new).push_str(text);
        Ok(())
    }
}

/// Swap the text of line 1 for `line`, keeping its `\n` or `\r\n` ending.
fn splice_first_line(content: &str, line: &str) -> String {
    match content.find('\n') {
        Some(pos) => {
            let eol = if content[..pos].ends_with('\r') { pos - 1 } else { pos };
            format!("{line}{}", &content[eol..])
        }
        None => line.to_string(),
    }
}

// ── Counter line ──────────────────────────────────────────────────────────

/// Split the first line into `(prefix, trailing numeral)`.
fn parse_counter(content: &str) -> Result<(&str, u64)> {
    let first = content.lines().next().unwrap_or("").trim_end();
    let digits = first
        .bytes()
        .rev()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return Err(Error::Parse(format!(
            "ledger counter line {first:?} does not end in a number"
        )));
    }
    let (prefix, num) = first.split_at(first.len() - digits);
    let n = num
        .parse::<u64>()
        .map_err(|e| Error::Parse(format!("ledger counter {num:?}: {e}")))?;
    Ok((prefix, n))
}

// ── Ledger ────────────────────────────────────────────────────────────────

/// Trial ledger over an injected [`TextStore`].
///
/// Writes take `&mut self`: one writer per ledger.
#[derive(Debug, Clone)]
pub struct Ledger<S: TextStore> {
    store: S,
}

impl Ledger<FileStore> {
    /// Ledger backed by the file at `path` (created on first append).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(FileStore::new(path))
    }
}

impl<S: TextStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Trials recorded so far (`0` for a missing or empty ledger).
    pub fn trial_count(&self) -> Result<u64> {
        match self.store.load()? {
            Some(content) if !content.is_empty() => Ok(parse_counter(&content)?.1),
            _ => Ok(0),
        }
    }

    /// Bump the counter line and append `record` as the next trial.
    ///
    /// Returns the trial number assigned to `record`.  Appending the same
    /// record twice yields two trials.
    pub fn append(&mut self, record: &TrialRecord) -> Result<u64> {
        let content = self.store.load()?.unwrap_or_default();

        let n = if content.is_empty() {
            0
        } else {
            let (prefix, n) = parse_counter(&content)?;
            self.store.replace_first_line(&format!("{prefix}{}", n + 1))?;
            n
        };

        let trial = n + 1;
        let mut text = String::new();
        if content.is_empty() {
            text.push_str("N: 1\n");
        }
        text.push_str(&record.to_block(trial));
        self.store.append(&text)?;

        info!(trial, m = record.m, d = record.d, function = record.function.as_str(), "trial recorded");
        Ok(trial)
    }
}

/// Append `record` to the ledger file at `path`.
pub fn append_trial(record: &TrialRecord, path: impl AsRef<Path>) -> Result<()> {
    Ledger::open(path.as_ref()).append(record).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TrialRecord {
        TrialRecord {
            coefficients: vec![0.0, 1.0, 2.0],
            intercepts: vec![0.0],
            d: 1,
            m: 2,
            r2: 1.3,
            mae: 4.432,
            mse: 5.432,
            function: "test_function".into(),
        }
    }

    #[test]
    fn block_layout() {
        let expected = "Trial: n=1, m=2, d=1\n\
                        Results:\n\
                        \tCoefficients: [0.0, 1.0, 2.0]\n\
                        \tIntercepts: [0.0]\n\
                        \tR2: 1.3\n\
                        \tMSE: 5.432\n\
                        \tMAE: 4.432\n\
                        \tFunction: test_function\n";
        assert_eq!(record().to_block(1), expected);
    }

    #[test]
    fn first_append_writes_header() {
        let mut ledger = Ledger::new(MemoryStore::default());
        assert_eq!(ledger.append(&record()).unwrap(), 1);
        let content = ledger.store().content.clone().unwrap();
        assert!(content.starts_with("N: 1\nTrial: n=1, m=2, d=1\n"));
    }

    #[test]
    fn counter_rewritten_in_place() {
        let mut ledger = Ledger::new(MemoryStore::default());
        for _ in 0..3 {
            ledger.append(&record()).unwrap();
        }
        let content = ledger.store().content.clone().unwrap();
        assert_eq!(content.lines().next(), Some("N: 3"));
        assert_eq!(content.matches("Trial: n=").count(), 3);
        assert_eq!(ledger.trial_count().unwrap(), 3);
    }

    #[test]
    fn multi_digit_counter() {
        let mut ledger = Ledger::new(MemoryStore {
            content: Some("N: 12\nTrial: n=12, m=1, d=0\n".into()),
        });
        assert_eq!(ledger.append(&record()).unwrap(), 13);
        let content = ledger.store().content.clone().unwrap();
        assert!(content.starts_with("N: 13\nTrial: n=12, m=1, d=0\nTrial: n=13,"));
    }

    #[test]
    fn malformed_counter_is_parse_error() {
        let mut ledger = Ledger::new(MemoryStore {
            content: Some("N: x\n".into()),
        });
        assert!(matches!(ledger.append(&record()), Err(Error::Parse(_))));
        // Nothing was written.
        assert_eq!(ledger.store().content.as_deref(), Some("N: x\n"));
    }

    #[test]
    fn zero_counter_is_bumped_without_second_header() {
        let mut ledger = Ledger::new(MemoryStore {
            content: Some("N: 0\n".into()),
        });
        assert_eq!(ledger.append(&record()).unwrap(), 1);
        let content = ledger.store().content.clone().unwrap();
        assert!(content.starts_with("N: 1\nTrial: n=1, m=2, d=1\n"));
        assert_eq!(content.matches("N: ").count(), 1);
    }

    #[test]
    fn crlf_counter_line_keeps_its_ending() {
        let mut ledger = Ledger::new(MemoryStore {
            content: Some("N: 1\r\nTrial: n=1, m=1, d=0\r\n".into()),
        });
        assert_eq!(ledger.append(&record()).unwrap(), 2);
        let content = ledger.store().content.clone().unwrap();
        assert!(content.starts_with("N: 2\r\nTrial: n=1, m=1, d=0\r\n"));
    }

    #[test]
    fn empty_store_counts_zero() {
        let ledger = Ledger::new(MemoryStore::default());
        assert_eq!(ledger.trial_count().unwrap(), 0);
    }
}
