//! # Item Codec
//!
//! Turns [`CacheEntry`] values into the bytes kept by the persistent tier and
//! back. A record is JSON:
//!
//! ```text
//! {"item": {...entry...}, "version": "2.0"}
//! ```
//!
//! With compression enabled the record text goes through a run-length pass
//! and, when that makes it smaller, is stored wrapped as:
//!
//! ```text
//! {"compressed": true, "data": "...", "originalSize": 812, "compressedSize": 301}
//! ```
//!
//! Readers accept both shapes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DecodeError, EncodeError};
use crate::CacheEntry;

/// Format tag written into every record.
pub const FORMAT_VERSION: &str = "2.0";

const RUN_MARKER: char = '~';
const MIN_RUN: usize = 4;

#[derive(Serialize)]
struct RecordRef<'a, V> {
    item: &'a CacheEntry<V>,
    version: &'a str,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompressedRecord {
    compressed: bool,
    data: String,
    original_size: usize,
    compressed_size: usize,
}

/// Serializes and deserializes cache entries for the persistent tier.
///
/// # Examples
///
/// ```
/// use tiercache_core::{CacheEntry, ItemCodec};
///
/// let codec = ItemCodec::new(true);
/// let entry = CacheEntry::new("k", "x".repeat(64), 0, 1_000, 66);
///
/// let bytes = codec.encode(&entry).unwrap();
/// let back: CacheEntry<String> = codec.decode(&bytes).unwrap();
/// assert_eq!(back, entry);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ItemCodec {
    compression: bool,
}

impl Default for ItemCodec {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ItemCodec {
    pub fn new(compression: bool) -> Self {
        Self { compression }
    }

    pub fn compression(&self) -> bool {
        self.compression
    }

    /// Encodes an entry as a versioned record.
    ///
    /// The compressed wrapper is only used when it is strictly smaller than
    /// the plain record; if the run-length pass fails, the plain record is
    /// returned instead.
    pub fn encode<V: Serialize>(&self, entry: &CacheEntry<V>) -> Result<Vec<u8>, EncodeError> {
        let plain = serde_json::to_vec(&RecordRef {
            item: entry,
            version: FORMAT_VERSION,
        })?;

        if !self.compression {
            return Ok(plain);
        }

        match compress(&plain) {
            Some(wrapped) if wrapped.len() < plain.len() => Ok(wrapped),
            _ => Ok(plain),
        }
    }

    /// Decodes a record written by [`encode`](Self::encode), compressed or not.
    pub fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<CacheEntry<V>, DecodeError> {
        let item = record_item(unwrap_record(bytes)?)?;
        serde_json::from_value(item).map_err(malformed)
    }

    /// Returns the `expires_at` of a record without knowing its value type.
    ///
    /// Sweeps use this to judge persisted entries; any decode failure means
    /// the record is corrupt.
    pub fn inspect(&self, bytes: &[u8]) -> Result<u64, DecodeError> {
        self.decode::<Value>(bytes).map(|entry| entry.expires_at)
    }
}

fn malformed(e: impl std::fmt::Display) -> DecodeError {
    DecodeError::Malformed(e.to_string())
}

fn compress(plain: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(plain).ok()?;
    let data = rle_encode(text);
    let record = CompressedRecord {
        compressed: true,
        original_size: plain.len(),
        compressed_size: data.len(),
        data,
    };
    serde_json::to_vec(&record).ok()
}

fn unwrap_record(bytes: &[u8]) -> Result<Value, DecodeError> {
    let value: Value = serde_json::from_slice(bytes).map_err(malformed)?;

    if value.get("compressed").and_then(Value::as_bool) == Some(true) {
        let wrapper: CompressedRecord = serde_json::from_value(value).map_err(malformed)?;
        let text = rle_decode(&wrapper.data)?;
        return serde_json::from_str(&text).map_err(malformed);
    }

    Ok(value)
}

fn record_item(mut record: Value) -> Result<Value, DecodeError> {
    let obj = record
        .as_object_mut()
        .ok_or_else(|| DecodeError::Malformed("record is not an object".into()))?;

    match obj.get("version") {
        Some(Value::String(v)) if v == FORMAT_VERSION => {}
        Some(Value::String(v)) => return Err(DecodeError::UnsupportedVersion(v.clone())),
        Some(other) => return Err(DecodeError::UnsupportedVersion(other.to_string())),
        None => return Err(DecodeError::UnsupportedVersion("none".into())),
    }

    obj.remove("item")
        .ok_or_else(|| DecodeError::Malformed("record has no item".into()))
}

/// Replaces runs of [`MIN_RUN`] or more identical characters with
/// `~<char><count>~`. A literal `~` is written as `~~` and never run-encoded.
fn rle_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let mut run = 1usize;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }

        if c == RUN_MARKER {
            for _ in 0..run {
                out.push(RUN_MARKER);
                out.push(RUN_MARKER);
            }
        } else if run >= MIN_RUN {
            out.push(RUN_MARKER);
            out.push(c);
            out.push_str(&run.to_string());
            out.push(RUN_MARKER);
        } else {
            out.extend(std::iter::repeat(c).take(run));
        }
    }

    out
}

fn rle_decode(input: &str) -> Result<String, DecodeError> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c != RUN_MARKER {
            out.push(c);
            continue;
        }

        let repeated = chars
            .next()
            .ok_or_else(|| DecodeError::Malformed("truncated run marker".into()))?;
        if repeated == RUN_MARKER {
            out.push(RUN_MARKER);
            continue;
        }

        let mut digits = String::new();
        loop {
            match chars.next() {
                Some(RUN_MARKER) => break,
                Some(d) if d.is_ascii_digit() => digits.push(d),
                _ => return Err(DecodeError::Malformed("invalid run length".into())),
            }
        }
        let count: usize = digits.parse().map_err(malformed)?;
        out.extend(std::iter::repeat(repeated).take(count));
    }

    Ok(out)
}
