//! Gesture vocabulary and combination parsing.
//!
//! Maps user-supplied tokens onto the fixed set of recognizable gestures
//! and validates the target combination at startup.  All validation happens
//! here, before any capture or classifier resource is acquired.

use std::fmt;

use thiserror::Error;

/// Combinations must be strictly longer than this many gestures, so a
/// couple of stray classifications cannot unlock by accident.
pub const DEFAULT_MIN_LENGTH: usize = 3;

// ── Labels ─────────────────────────────────────────────────

/// Recognized gesture labels (the classifier's fixed vocabulary).
///
/// "No gesture" is represented as `Option::<GestureLabel>::None` by callers,
/// not as a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    ClosedFist,
    OpenPalm,
    PointingUp,
    ThumbDown,
    ThumbUp,
    Victory,
    LoveSign,
}

impl GestureLabel {
    /// Every label, in canonical-token order.
    pub const ALL: [GestureLabel; 7] = [
        Self::ClosedFist,
        Self::OpenPalm,
        Self::PointingUp,
        Self::ThumbDown,
        Self::ThumbUp,
        Self::Victory,
        Self::LoveSign,
    ];

    /// Canonical token for CLI input and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClosedFist => "closed-fist",
            Self::OpenPalm => "open-palm",
            Self::PointingUp => "pointing-up",
            Self::ThumbDown => "thumbs-down",
            Self::ThumbUp => "thumbs-up",
            Self::Victory => "victory",
            Self::LoveSign => "love-sign",
        }
    }

    /// Parse a user token.  Accepts the canonical token plus short aliases.
    /// Case-insensitive; returns None for anything outside the vocabulary.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "closed-fist" | "closed" | "fist" => Some(Self::ClosedFist),
            "open-palm" | "open" | "palm" => Some(Self::OpenPalm),
            "pointing-up" | "point" => Some(Self::PointingUp),
            "thumbs-down" | "thumb-down" => Some(Self::ThumbDown),
            "thumbs-up" | "thumb-up" => Some(Self::ThumbUp),
            "victory" | "peace" => Some(Self::Victory),
            "love-sign" | "love" => Some(Self::LoveSign),
            _ => None,
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Validation errors ──────────────────────────────────────

/// Construction-time validation failures.  Fatal: reported to the user and
/// the process exits before any camera or classifier resource is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The combination has too few gestures to be safe against accidental
    /// unlock.  Length must strictly exceed the minimum.
    #[error("combination has {got} gesture(s), need more than {min}")]
    TooShort { got: usize, min: usize },

    /// A token is not in the gesture vocabulary.
    #[error("unknown gesture token {token:?} (valid tokens: {valid})")]
    UnknownToken { token: String, valid: String },

    /// The requested capture device does not exist.
    #[error("camera device {index} unavailable ({path} not found)")]
    CameraUnavailable { index: u32, path: String },
}

// ── Combination ────────────────────────────────────────────

/// The validated target sequence.  Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationSpec {
    labels: Vec<GestureLabel>,
}

impl CombinationSpec {
    /// Parse a comma-separated token string into a combination.
    ///
    /// Fails fast: the token count must strictly exceed `min_len`, and every
    /// token must be in the vocabulary.  Repeating a gesture across
    /// positions is allowed (fist, palm, fist, palm).
    pub fn parse(tokens: &str, min_len: usize) -> Result<Self, ConfigError> {
        let parts: Vec<&str> = tokens
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        if parts.len() <= min_len {
            return Err(ConfigError::TooShort {
                got: parts.len(),
                min: min_len,
            });
        }

        let mut labels = Vec::with_capacity(parts.len());
        for part in parts {
            match GestureLabel::from_token(part) {
                Some(label) => labels.push(label),
                None => {
                    return Err(ConfigError::UnknownToken {
                        token: part.to_string(),
                        valid: Self::valid_tokens(),
                    })
                }
            }
        }
        Ok(Self { labels })
    }

    /// Canonical token list for error messages.
    fn valid_tokens() -> String {
        GestureLabel::ALL
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Number of gestures in the combination.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The target labels, in order.
    pub fn labels(&self) -> &[GestureLabel] {
        &self.labels
    }
}

// ── Tests ──────────────────────────────────────────────────
