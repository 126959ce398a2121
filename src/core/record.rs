use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Tokens in a group line are separated by this character.
pub const TOKEN_DELIMITER: char = '/';

// `ID((WIDTH, HEIGHT),SIZE`; anything after SIZE (closing paren, colour triple) is ignored.
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\(\((\d+),\s*(\d+)\),(\d+)").expect("token pattern is valid")
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordParseError {
    #[error("Token does not match ID((WIDTH, HEIGHT),SIZE): {token:?}")]
    Malformed { token: String },

    #[error("Field {field} out of range in token {token:?}")]
    OutOfRange { field: &'static str, token: String },

    #[error("Zero width or height in token {token:?}")]
    ZeroDimension { token: String },
}

/// One image of a duplicate group, as reported by the similarity pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

impl ImageRecord {
    pub fn new(id: u64, width: u32, height: u32, size_bytes: u64) -> Self {
        Self {
            id,
            width,
            height,
            size_bytes,
        }
    }

    /// Placeholder produced by [`MalformedPolicy::ZeroFill`].
    pub fn zeroed() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// False when width or height is zero.
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// `width / height - 1.0`: positive for landscape, negative for portrait.
    pub fn orientation(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height) - 1.0
    }

    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl fmt::Display for ImageRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}(({}, {}),{})",
            self.id, self.width, self.height, self.size_bytes
        )
    }
}

impl FromStr for ImageRecord {
    type Err = RecordParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let caps = TOKEN_PATTERN
            .captures(token)
            .ok_or_else(|| RecordParseError::Malformed {
                token: token.to_string(),
            })?;

        let out_of_range = |field| RecordParseError::OutOfRange {
            field,
            token: token.to_string(),
        };
        let record = ImageRecord {
            id: caps[1].parse().map_err(|_| out_of_range("id"))?,
            width: caps[2].parse().map_err(|_| out_of_range("width"))?,
            height: caps[3].parse().map_err(|_| out_of_range("height"))?,
            size_bytes: caps[4].parse().map_err(|_| out_of_range("size"))?,
        };

        if !record.has_dimensions() {
            return Err(RecordParseError::ZeroDimension {
                token: token.to_string(),
            });
        }
        Ok(record)
    }
}

/// What to do with a token that fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedPolicy {
    /// Skip the token and keep the rest of the line
    #[default]
    #[value(name = "drop")]
    Drop,
    /// Replace the token with an all-zero record (legacy behaviour)
    #[value(name = "zero-fill")]
    ZeroFill,
    /// Emit no decision for the whole line
    #[value(name = "reject-line")]
    RejectLine,
}

/// Result of reading one input line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// Whitespace only.
    Blank,
    /// Records in line order; may be empty when every token was dropped.
    Group(Vec<ImageRecord>),
    /// A token failed under [`MalformedPolicy::RejectLine`].
    Rejected(RecordParseError),
}

pub fn parse_line(line: &str, policy: MalformedPolicy) -> ParsedLine {
    let line = line.trim();
    if line.is_empty() {
        return ParsedLine::Blank;
    }

    let mut records = Vec::new();
    for token in line.split(TOKEN_DELIMITER).filter(|t| !t.trim().is_empty()) {
        match token.parse::<ImageRecord>() {
            Ok(record) => records.push(record),
            Err(err) => match policy {
                MalformedPolicy::Drop => {
                    log::warn!("Dropping token: {}", err);
                }
                MalformedPolicy::ZeroFill => {
                    log::warn!("Zero-filling token: {}", err);
                    records.push(ImageRecord::zeroed());
                }
                MalformedPolicy::RejectLine => {
                    log::warn!("Rejecting line: {}", err);
                    return ParsedLine::Rejected(err);
                }
            },
        }
    }
    ParsedLine::Group(records)
}
