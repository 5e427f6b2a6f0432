//! Fractional ordering keys for z-order.
//!
//! Keys are strings over a base-62 alphabet compared lexicographically. A new key
//! can always be generated between two existing keys, so inserting an element never
//! renumbers its siblings.
//!
//! A valid key is non-empty, contains only alphabet characters and never ends with
//! the smallest character. That last rule keeps room below every key.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Ordered alphabet. ASCII order of these characters matches their position.
const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Smallest alphabet character. Valid keys never end with it.
const ZERO: u8 = b'0';

/// Errors produced when generating or parsing ordering keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderKeyError {
    #[error("invalid ordering key {0:?}")]
    InvalidKey(String),
    #[error("ordering key {lower:?} is not below {upper:?}")]
    InvalidRange { lower: String, upper: String },
}

/// A fractional index used to sort elements back to front.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderKey(String);

impl OrderKey {
    /// Parse and validate a key, e.g. one read from a persisted document.
    pub fn parse(key: &str) -> Result<Self, OrderKeyError> {
        let valid = !key.is_empty()
            && key.bytes().all(|b| digit_value(b).is_some())
            && !key.ends_with(ZERO as char);
        if valid {
            Ok(Self(key.to_string()))
        } else {
            Err(OrderKeyError::InvalidKey(key.to_string()))
        }
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A key sorting after `key`, or the alphabet midpoint when `key` is `None`.
    pub fn after(key: Option<&OrderKey>) -> OrderKey {
        let lower = key.map(|k| k.0.as_bytes()).unwrap_or_default();
        OrderKey(into_string(midpoint(lower, None)))
    }

    /// A key sorting before `key`, or the alphabet midpoint when `key` is `None`.
    pub fn before(key: Option<&OrderKey>) -> OrderKey {
        let upper = key.map(|k| k.0.as_bytes());
        OrderKey(into_string(midpoint(b"", upper)))
    }

    /// A key strictly between `lower` and `upper`.
    pub fn between(lower: &OrderKey, upper: &OrderKey) -> Result<OrderKey, OrderKeyError> {
        if lower >= upper {
            return Err(OrderKeyError::InvalidRange {
                lower: lower.0.clone(),
                upper: upper.0.clone(),
            });
        }
        Ok(OrderKey(into_string(midpoint(
            lower.0.as_bytes(),
            Some(upper.0.as_bytes()),
        ))))
    }

    /// Generate `n` strictly increasing keys between the optional bounds.
    pub fn n_keys_between(
        n: usize,
        lower: Option<&OrderKey>,
        upper: Option<&OrderKey>,
    ) -> Result<Vec<OrderKey>, OrderKeyError> {
        if let (Some(a), Some(b)) = (lower, upper) {
            if a >= b {
                return Err(OrderKeyError::InvalidRange {
                    lower: a.0.clone(),
                    upper: b.0.clone(),
                });
            }
        }
        Ok(generate_n(n, lower, upper))
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for OrderKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        OrderKey::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn generate_n(n: usize, lower: Option<&OrderKey>, upper: Option<&OrderKey>) -> Vec<OrderKey> {
    match (n, lower, upper) {
        (0, _, _) => Vec::new(),
        (1, Some(a), Some(b)) => vec![OrderKey(into_string(midpoint(
            a.0.as_bytes(),
            Some(b.0.as_bytes()),
        )))],
        (1, a, None) => vec![OrderKey::after(a)],
        (1, None, b) => vec![OrderKey::before(b)],
        (_, a, None) => {
            let mut keys = Vec::with_capacity(n);
            let mut last = OrderKey::after(a);
            for _ in 1..n {
                let next = OrderKey::after(Some(&last));
                keys.push(std::mem::replace(&mut last, next));
            }
            keys.push(last);
            keys
        }
        (_, None, Some(b)) => {
            let mut keys = Vec::with_capacity(n);
            let mut last = OrderKey::before(Some(b));
            for _ in 1..n {
                let next = OrderKey::before(Some(&last));
                keys.push(std::mem::replace(&mut last, next));
            }
            keys.push(last);
            keys.reverse();
            keys
        }
        (_, Some(a), Some(b)) => {
            let mid = n / 2;
            let pivot = OrderKey(into_string(midpoint(a.0.as_bytes(), Some(b.0.as_bytes()))));
            let mut keys = generate_n(mid, Some(a), Some(&pivot));
            keys.push(pivot.clone());
            keys.extend(generate_n(n - mid - 1, Some(&pivot), Some(b)));
            keys
        }
    }
}

fn digit_value(byte: u8) -> Option<usize> {
    ALPHABET.iter().position(|&c| c == byte)
}

fn into_string(bytes: Vec<u8>) -> String {
    // Only alphabet bytes are ever produced.
    bytes.into_iter().map(char::from).collect()
}

/// Midpoint of two digit strings. `lower` may be empty (zero) and `upper` may be
/// absent (one). Requires `lower < upper`; neither ends with the zero digit.
fn midpoint(lower: &[u8], upper: Option<&[u8]>) -> Vec<u8> {
    if let Some(upper) = upper {
        // Strip the common prefix, treating a missing lower digit as zero.
        let mut n = 0;
        while n < upper.len() && lower.get(n).copied().unwrap_or(ZERO) == upper[n] {
            n += 1;
        }
        if n > 0 {
            let mut key = upper[..n].to_vec();
            let rest_lower = if n < lower.len() { &lower[n..] } else { &[] };
            key.extend(midpoint(rest_lower, Some(&upper[n..])));
            return key;
        }
    }

    let digit_lower = lower.first().and_then(|&b| digit_value(b)).unwrap_or(0);
    let digit_upper = match upper {
        Some(upper) => upper.first().and_then(|&b| digit_value(b)).unwrap_or(ALPHABET.len()),
        None => ALPHABET.len(),
    };

    if digit_upper - digit_lower > 1 {
        let mid = (digit_lower + digit_upper + 1) / 2;
        vec![ALPHABET[mid]]
    } else if let Some(upper) = upper.filter(|u| u.len() > 1) {
        // Adjacent first digits: the one-digit prefix of upper already fits.
        vec![upper[0]]
    } else {
        // Adjacent first digits and no room: descend one level below lower.
        let mut key = vec![ALPHABET[digit_lower]];
        let rest_lower = if lower.len() > 1 { &lower[1..] } else { &[] };
        key.extend(midpoint(rest_lower, None));
        key
    }
}
