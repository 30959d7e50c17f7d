//! Validated field types for request payloads.
//!
//! # Design
//! Each constrained input is a newtype whose only constructor checks the
//! bound, so a value that reaches `CanvasClient` has already been validated.
//! The types serialize transparently and re-check their bounds on
//! deserialization via `try_from`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A field value rejected before any request was built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be between {min} and {max} characters, got {len}")]
    Length {
        field: &'static str,
        len: usize,
        min: usize,
        max: usize,
    },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(InputError::OutOfRange { field, value, min, max });
    }
    Ok(value)
}

fn check_len(field: &'static str, value: String, min: usize, max: usize) -> Result<String, InputError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(InputError::Length { field, len, min, max });
    }
    Ok(value)
}

/// Declares an `f64` newtype limited to `[MIN, MAX]`.
macro_rules! bounded_number {
    ($(#[$doc:meta])* $name:ident, $field:literal, $min:expr, $max:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
        #[serde(try_from = "f64", into = "f64")]
        pub struct $name(f64);

        impl $name {
            pub const MIN: f64 = $min;
            pub const MAX: f64 = $max;

            pub fn new(value: f64) -> Result<Self, InputError> {
                check_range($field, value, Self::MIN, Self::MAX).map(Self)
            }

            pub fn get(self) -> f64 {
                self.0
            }
        }

        impl TryFrom<f64> for $name {
            type Error = InputError;

            fn try_from(value: f64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for f64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

/// Declares a `String` newtype whose length in characters is limited to
/// `[MIN_LEN, MAX_LEN]`.
macro_rules! bounded_text {
    ($(#[$doc:meta])* $name:ident, $field:literal, $min:expr, $max:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub const MIN_LEN: usize = $min;
            pub const MAX_LEN: usize = $max;

            pub fn new(value: impl Into<String>) -> Result<Self, InputError> {
                check_len($field, value.into(), Self::MIN_LEN, Self::MAX_LEN).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = InputError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

bounded_number!(
    /// Canvas coordinate, limited to ±1 000 000.
    Coordinate, "coordinate", -1_000_000.0, 1_000_000.0
);
bounded_number!(
    /// Width or height of an item, 1 to 10 000.
    Dimension, "dimension", 1.0, 10_000.0
);
bounded_number!(
    /// Rotation in degrees, 0 to 360 inclusive.
    Rotation, "rotation", 0.0, 360.0
);

impl Default for Rotation {
    fn default() -> Self {
        Self(0.0)
    }
}

/// Page size for list calls, 1 to 100. Defaults to 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Limit(u32);

impl Limit {
    pub const MAX: u32 = 100;

    pub fn new(value: u32) -> Result<Self, InputError> {
        if value == 0 || value > Self::MAX {
            return Err(InputError::OutOfRange {
                field: "limit",
                value: f64::from(value),
                min: 1.0,
                max: f64::from(Self::MAX),
            });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self(50)
    }
}

impl TryFrom<u32> for Limit {
    type Error = InputError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Limit> for u32 {
    fn from(value: Limit) -> Self {
        value.0
    }
}

bounded_text!(
    /// Target URL of a webhook, 1 to 2000 characters.
    WebhookUrl, "url", 1, 2000
);
bounded_text!(
    /// Free-text description, at most 500 characters.
    Description, "description", 0, 500
);
bounded_text!(
    /// Document title, 1 to 255 characters.
    DocumentTitle, "title", 1, 255
);
bounded_text!(
    /// Document author, 1 to 100 characters.
    AuthorName, "author", 1, 100
);

impl AuthorName {
    pub const DEFAULT: &'static str = "canvas-rs";
}

impl Default for AuthorName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

/// A credential (API key or webhook secret). Redacted in `Debug` and
/// `Display`; use [`Secret::expose`] to read it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}
