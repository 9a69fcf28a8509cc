//! Snapshot blob format.
//!
//! The remote blob is JSON. The current shape is an envelope carrying a
//! format version and a record count next to positional guess tuples:
//!
//! ```text
//! {"version":2,"count":2,"guesses":[[1700000000000,"<fingerprint>","bag",true], ...]}
//! ```
//!
//! The count lets a truncated-but-parseable blob be told apart from a short
//! ledger. Two older shapes are still read: a bare array of positional
//! tuples, and a bare array of keyed objects. Local guess ids never appear in
//! a blob.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use puzzle_core::Fingerprint;

use super::error::DecodeError;
use crate::repository::Guess;
use crate::types::TimestampMs;

/// Current envelope version written by [`SnapshotCodec::encode`].
pub const SNAPSHOT_FORMAT_VERSION: u64 = 2;

/// `[timestamp, fingerprint, word, isCorrect]`
#[derive(Serialize, Deserialize)]
struct WireGuess(TimestampMs, String, String, bool);

#[derive(Serialize)]
struct Envelope {
    version: u64,
    count: usize,
    guesses: Vec<WireGuess>,
}

/// Keyed object shape written by older clients.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyedGuess {
    timestamp: TimestampMs,
    #[serde(alias = "puzzle", alias = "puzzleHash", alias = "hash")]
    fingerprint: String,
    word: String,
    #[serde(alias = "correct")]
    is_correct: bool,
}

/// Bidirectional mapping between guesses and the remote blob.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotCodec;

impl SnapshotCodec {
    /// Encode guesses into the current envelope format.
    pub fn encode(guesses: &[Guess]) -> Result<Vec<u8>, serde_json::Error> {
        let envelope = Envelope {
            version: SNAPSHOT_FORMAT_VERSION,
            count: guesses.len(),
            guesses: guesses
                .iter()
                .map(|g| {
                    WireGuess(
                        g.timestamp,
                        g.puzzle.as_str().to_owned(),
                        g.word.clone(),
                        g.is_correct,
                    )
                })
                .collect(),
        };
        serde_json::to_vec(&envelope)
    }

    /// Decode any supported shape.
    ///
    /// An empty (or whitespace-only) blob is a freshly created snapshot and
    /// decodes to no guesses.
    pub fn decode(bytes: &[u8]) -> Result<Vec<Guess>, DecodeError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_slice(bytes).map_err(DecodeError::Malformed)?;

        match value {
            Value::Object(mut map) => {
                let version = map
                    .get("version")
                    .and_then(Value::as_u64)
                    .ok_or(DecodeError::UnrecognizedShape("object without version"))?;
                if version != SNAPSHOT_FORMAT_VERSION {
                    return Err(DecodeError::UnsupportedVersion(version));
                }

                let count = map
                    .get("count")
                    .and_then(Value::as_u64)
                    .ok_or(DecodeError::UnrecognizedShape("envelope without count"))?;
                let expected = usize::try_from(count)
                    .map_err(|_| DecodeError::UnrecognizedShape("count out of range"))?;
                let Some(Value::Array(items)) = map.remove("guesses") else {
                    return Err(DecodeError::UnrecognizedShape("envelope without guesses"));
                };
                if items.len() != expected {
                    return Err(DecodeError::Truncated {
                        expected,
                        actual: items.len(),
                    });
                }
                decode_positional(items)
            }
            Value::Array(items) => match items.first() {
                None => Ok(Vec::new()),
                Some(Value::Array(_)) => decode_positional(items),
                Some(Value::Object(_)) => decode_keyed(items),
                Some(_) => Err(DecodeError::UnrecognizedShape("array of scalars")),
            },
            _ => Err(DecodeError::UnrecognizedShape("scalar")),
        }
    }
}

fn decode_positional(items: Vec<Value>) -> Result<Vec<Guess>, DecodeError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let WireGuess(timestamp, fingerprint, word, is_correct) =
                serde_json::from_value(item)
                    .map_err(|source| DecodeError::InvalidRecord { index, source })?;
            into_guess(index, timestamp, fingerprint, word, is_correct)
        })
        .collect()
}

fn decode_keyed(items: Vec<Value>) -> Result<Vec<Guess>, DecodeError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let keyed: KeyedGuess = serde_json::from_value(item)
                .map_err(|source| DecodeError::InvalidRecord { index, source })?;
            into_guess(
                index,
                keyed.timestamp,
                keyed.fingerprint,
                keyed.word,
                keyed.is_correct,
            )
        })
        .collect()
}

fn into_guess(
    index: usize,
    timestamp: TimestampMs,
    fingerprint: String,
    word: String,
    is_correct: bool,
) -> Result<Guess, DecodeError> {
    if fingerprint.is_empty() {
        return Err(DecodeError::EmptyFingerprint { index });
    }
    Ok(Guess::new(
        timestamp,
        Fingerprint::new(fingerprint),
        word,
        is_correct,
    ))
}
