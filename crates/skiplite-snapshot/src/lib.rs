//! # SkipLite Snapshot
//!
//! Whole-dataset dump and load for SkipLite stores.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of SkipLite.**
//!
//! Users should depend on the main `skiplite` crate instead, which provides
//! the stable public API. This crate's API may change without notice between
//! minor versions.
//!
//! ---
//!
//! A snapshot is a text file with one `key:value` line per live entry, in
//! ascending key order. There is no escaping: a line is split at the first
//! `:` so values may contain the delimiter but keys may not.
//!
//! Next to the data file a small bincode sidecar (`<path>.meta`) records the
//! format version, record count and a CRC32 of the data file. Loading checks
//! it when present; a snapshot without a sidecar still loads.
//!
//! ## Usage
//!
//! ```ignore
//! use skiplite_snapshot::{dump_snapshot, load_snapshot, SnapshotConfig};
//!
//! let config = SnapshotConfig::default();
//! dump_snapshot(&config, vec![(1, "sing"), (3, "rap")])?;
//! let stats = load_snapshot(&config, |key, value| {
//!     println!("{} => {}", key, value);
//!     Ok(true)
//! })?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use skiplite_core::format_version::{magic, snapshot_version, SNAPSHOT_FORMAT_VERSION};
use skiplite_core::{Error, Result};
use std::fmt::{self, Display};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Separator between key and value on a snapshot line
pub const DELIMITER: char = ':';

/// Snapshot location used when none is configured
pub const DEFAULT_SNAPSHOT_PATH: &str = "store/dumpFile.txt";

/// Extension appended to the data file path for the metadata sidecar
const META_EXTENSION: &str = "meta";

/// Snapshot configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Data file location
    pub path: PathBuf,
    /// Write the metadata sidecar on dump
    pub write_meta: bool,
    /// Check the sidecar checksum on load
    pub verify_checksums: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            write_meta: true,
            verify_checksums: true,
        }
    }
}

impl SnapshotConfig {
    /// Default settings for a snapshot at `path`
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Sidecar metadata describing one dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Always [`magic::SNAPSHOT_META`]
    pub magic: u32,
    /// Sidecar format version
    pub format_version: u16,
    /// When the dump finished (Unix milliseconds)
    pub timestamp_ms: u64,
    /// Number of lines written
    pub records: u64,
    /// CRC32 of the data file
    pub checksum: u32,
}

/// Counters returned by [`load_snapshot`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Lines handed to the apply callback and accepted
    pub applied: usize,
    /// Malformed or rejected lines
    pub skipped: usize,
}

/// Why a snapshot line was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotLineError {
    /// Blank line
    Empty,
    /// No delimiter on the line
    MissingDelimiter,
    /// Nothing before the delimiter
    EmptyKey,
    /// Nothing after the delimiter
    EmptyValue,
    /// Line bytes are not UTF-8
    InvalidUtf8,
}

impl Display for SnapshotLineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotLineError::Empty => write!(f, "empty line"),
            SnapshotLineError::MissingDelimiter => {
                write!(f, "missing '{}' delimiter", DELIMITER)
            }
            SnapshotLineError::EmptyKey => write!(f, "empty key"),
            SnapshotLineError::EmptyValue => write!(f, "empty value"),
            SnapshotLineError::InvalidUtf8 => write!(f, "invalid UTF-8"),
        }
    }
}

impl std::error::Error for SnapshotLineError {}

/// Splits a line at the first delimiter
pub fn parse_line(line: &str) -> std::result::Result<(&str, &str), SnapshotLineError> {
    if line.is_empty() {
        return Err(SnapshotLineError::Empty);
    }
    let (key, value) = line
        .split_once(DELIMITER)
        .ok_or(SnapshotLineError::MissingDelimiter)?;
    if key.is_empty() {
        return Err(SnapshotLineError::EmptyKey);
    }
    if value.is_empty() {
        return Err(SnapshotLineError::EmptyValue);
    }
    Ok((key, value))
}

/// Strips the line terminator (`\n` or `\r\n`) and checks the encoding
fn decode_line(raw: &[u8]) -> std::result::Result<&str, SnapshotLineError> {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    std::str::from_utf8(line).map_err(|_| SnapshotLineError::InvalidUtf8)
}

/// Path of the sidecar for a data file
pub fn meta_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(META_EXTENSION);
    PathBuf::from(name)
}

/// Writes every entry as a `key:value` line, truncating any previous
/// snapshot, then writes or clears the sidecar.
pub fn dump_snapshot<I, K, V>(config: &SnapshotConfig, entries: I) -> Result<SnapshotMeta>
where
    I: IntoIterator<Item = (K, V)>,
    K: Display,
    V: Display,
{
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(&config.path)?;
    let mut writer = BufWriter::new(file);
    let mut hasher = crc32fast::Hasher::new();
    let mut records = 0u64;

    for (key, value) in entries {
        let key = key.to_string();
        let value = value.to_string();
        if key.contains(DELIMITER) || key.contains('\n') || value.contains('\n') {
            tracing::warn!(key = %key, "record will not reload intact");
        }
        let line = format!("{}{}{}\n", key, DELIMITER, value);
        hasher.update(line.as_bytes());
        writer.write_all(line.as_bytes())?;
        records += 1;
    }
    writer.flush()?;

    let meta = SnapshotMeta {
        magic: magic::SNAPSHOT_META,
        format_version: SNAPSHOT_FORMAT_VERSION,
        timestamp_ms: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64,
        records,
        checksum: hasher.finalize(),
    };

    let sidecar = meta_path(&config.path);
    if config.write_meta {
        write_meta(&sidecar, &meta)?;
    } else if sidecar.exists() {
        // A stale sidecar would fail verification of the new data file
        fs::remove_file(&sidecar)?;
    }

    tracing::info!(path = ?config.path, records, "snapshot dumped");
    Ok(meta)
}

fn write_meta(path: &Path, meta: &SnapshotMeta) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encoded = bincode::serialize(meta).map_err(|e| Error::Serialization(e.to_string()))?;
    writer.write_all(&encoded)?;
    writer.flush()?;
    Ok(())
}

/// Reads the sidecar of a data file, if one exists
pub fn read_meta(path: &Path) -> Result<Option<SnapshotMeta>> {
    let sidecar = meta_path(path);
    if !sidecar.exists() {
        return Ok(None);
    }
    let mut contents = Vec::new();
    File::open(&sidecar)?.read_to_end(&mut contents)?;
    let meta: SnapshotMeta =
        bincode::deserialize(&contents).map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(Some(meta))
}

fn compute_checksum(path: &Path) -> Result<u32> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = crc32fast::Hasher::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize())
}

fn verify(path: &Path) -> Result<()> {
    let meta = match read_meta(path)? {
        Some(meta) => meta,
        None => {
            tracing::warn!(path = ?path, "snapshot has no metadata, skipping verification");
            return Ok(());
        }
    };
    if meta.magic != magic::SNAPSHOT_META {
        return Err(Error::Corruption(format!(
            "Bad snapshot metadata magic: {:#x}",
            meta.magic
        )));
    }
    if !snapshot_version().can_read(meta.format_version) {
        return Err(Error::Corruption(format!(
            "Unsupported snapshot format version {}",
            meta.format_version
        )));
    }
    let actual = compute_checksum(path)?;
    if actual != meta.checksum {
        return Err(Error::Corruption(format!(
            "Snapshot checksum mismatch: expected {}, got {}",
            meta.checksum, actual
        )));
    }
    Ok(())
}

/// Reads a snapshot and hands each well-formed line to `apply`.
///
/// `apply` returns `Ok(false)` to reject a pair (for instance when the key
/// does not parse); rejected and malformed lines are counted as skipped.
/// An error from `apply` aborts the load.
pub fn load_snapshot<F>(config: &SnapshotConfig, mut apply: F) -> Result<LoadStats>
where
    F: FnMut(&str, &str) -> Result<bool>,
{
    if config.verify_checksums {
        verify(&config.path)?;
    }

    let mut reader = BufReader::new(File::open(&config.path)?);
    let mut stats = LoadStats::default();
    let mut buf = Vec::new();
    let mut number = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        number += 1;
        let parsed = decode_line(&buf).and_then(parse_line);
        match parsed {
            Ok((key, value)) => {
                if apply(key, value)? {
                    stats.applied += 1;
                } else {
                    tracing::warn!(line = number, key, "snapshot record rejected");
                    stats.skipped += 1;
                }
            }
            Err(reason) => {
                tracing::warn!(line = number, %reason, "skipping malformed snapshot line");
                stats.skipped += 1;
            }
        }
    }

    tracing::info!(
        path = ?config.path,
        applied = stats.applied,
        skipped = stats.skipped,
        "snapshot loaded"
    );
    Ok(stats)
}
