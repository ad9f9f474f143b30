//! Derivation of cache keys from an ordered sequence of scalar arguments.
//!
//! A key is the `_`-joined rendering of its parts. Text parts are
//! percent-escaped so that no part can smuggle in a separator or a path
//! component, and text that reads as a number gets its first character
//! escaped so it never renders like an `Int` or `Float` part. Distinct part
//! sequences therefore give distinct keys, usable as a flat file name.

use std::fmt;

const SEPARATOR: char = '_';

/// One scalar argument of a cache key.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPart {
    Int(i64),
    Float(f64),
    Text(String),
}

impl KeyPart {
    fn render(&self, out: &mut String) {
        match self {
            KeyPart::Int(value) => out.push_str(&value.to_string()),
            KeyPart::Float(value) => out.push_str(&render_float(*value)),
            KeyPart::Text(text) => escape_text(text, out),
        }
    }
}

/// Renders a float the way it reads: `21.0`, `105.9`, `-3.25`.
fn render_float(value: f64) -> String {
    // -0.0 and 0.0 are the same location.
    let value = if value == 0.0 { 0.0 } else { value };
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn escape_text(text: &str, out: &mut String) {
    let numeric = text.parse::<f64>().is_ok() || text.parse::<i64>().is_ok();
    for (i, c) in text.chars().enumerate() {
        match c {
            c if i == 0 && numeric && c.is_ascii() => {
                out.push_str(&format!("%{:02X}", u32::from(c)));
            }
            '%' => out.push_str("%25"),
            '_' => out.push_str("%5F"),
            '/' => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            '.' if i == 0 => out.push_str("%2E"),
            c => out.push(c),
        }
    }
}

impl From<f64> for KeyPart {
    fn from(value: f64) -> Self {
        KeyPart::Float(value)
    }
}

impl From<f32> for KeyPart {
    fn from(value: f32) -> Self {
        KeyPart::Float(f64::from(value))
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<i32> for KeyPart {
    fn from(value: i32) -> Self {
        KeyPart::Int(i64::from(value))
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        KeyPart::Int(i64::from(value))
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Text(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Text(value)
    }
}

/// A derived cache key. Two equal part sequences always produce the same key.
///
/// # Examples
///
/// ```
/// use meteogrid::{CacheKey, KeyPart};
///
/// let key = CacheKey::new([KeyPart::from(21.0), KeyPart::from(105.9)]);
/// assert_eq!(key.as_str(), "21.0_105.9");
///
/// let config = CacheKey::new(["user_config"]);
/// assert_eq!(config.file_name(), "user%5Fconfig.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new<I, P>(parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPart>,
    {
        let mut key = String::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                key.push(SEPARATOR);
            }
            part.into().render(&mut key);
        }
        CacheKey(key)
    }

    /// Key for a coordinate pair, as used by the grid entries.
    pub fn for_location(latitude: f64, longitude: f64) -> Self {
        Self::new([latitude, longitude])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The flat file name this key is stored under.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floats_keep_decimal() {
        assert_eq!(CacheKey::for_location(21.0, 105.9).as_str(), "21.0_105.9");
        assert_eq!(CacheKey::for_location(-0.0, -3.25).as_str(), "0.0_-3.25");
    }

    #[test]
    fn test_int_and_float_are_distinct() {
        assert_ne!(CacheKey::new([21i64]), CacheKey::new([21.0f64]));
    }

    #[test]
    fn test_same_parts_same_key() {
        let a = CacheKey::new([KeyPart::from("forecast"), KeyPart::from(1.5)]);
        let b = CacheKey::new([KeyPart::from("forecast".to_string()), KeyPart::from(1.5)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_separator_in_text_does_not_collide() {
        let joined = CacheKey::new(["a_b"]);
        let split = CacheKey::new(["a", "b"]);
        assert_ne!(joined, split);
        assert_eq!(joined.as_str(), "a%5Fb");
        assert_eq!(split.as_str(), "a_b");

        let shifted_left = CacheKey::new(["1", "23"]);
        let shifted_right = CacheKey::new(["12", "3"]);
        assert_ne!(shifted_left, shifted_right);

        // An escape sequence typed literally must not alias the escaped form.
        assert_ne!(CacheKey::new(["a%5Fb"]), CacheKey::new(["a_b"]));
    }

    #[test]
    fn test_numeric_text_does_not_alias_numbers() {
        assert_ne!(CacheKey::new(["21.0"]), CacheKey::new([21.0f64]));
        assert_ne!(CacheKey::new(["21"]), CacheKey::new([21i64]));
        assert_ne!(CacheKey::new(["-3"]), CacheKey::new([-3i64]));
        assert_ne!(CacheKey::new(["NaN"]), CacheKey::new([f64::NAN]));
        assert_eq!(CacheKey::new(["21.0"]).as_str(), "%321.0");
        assert_eq!(CacheKey::new(["-3"]).as_str(), "%2D3");
        // Words are left alone.
        assert_eq!(CacheKey::new(["forecast"]).as_str(), "forecast");
    }

    #[test]
    fn test_text_cannot_escape_cache_dir() {
        let key = CacheKey::new(["../etc/passwd"]);
        assert!(!key.as_str().contains('/'));
        assert!(!key.as_str().starts_with('.'));
        assert_eq!(key.file_name(), "%2E.%2Fetc%2Fpasswd.json");
    }

    #[test]
    fn test_empty_parts() {
        assert_eq!(CacheKey::new(Vec::<KeyPart>::new()).as_str(), "");
        assert_eq!(CacheKey::new(["", ""]).as_str(), "_");
    }
}
