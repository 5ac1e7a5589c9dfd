//! FDI tooth notation.
//!
//! Accepts either the two-digit FDI form (`"16"`) or the quadrant-letter
//! shorthand used on the chart (`"UR6"`), and stores the tooth as its FDI
//! number.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed tooth designator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Unknown quadrant in tooth designator: {0}")]
    Quadrant(String),

    #[error("Tooth position must be 1-8: {0}")]
    Position(String),

    #[error("Malformed tooth designator: {0}")]
    Malformed(String),
}

/// A permanent tooth in FDI two-digit notation (quadrant 1-4, position 1-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tooth(u8);

impl Tooth {
    /// Build a tooth from quadrant (1-4) and position (1-8).
    pub fn new(quadrant: u8, position: u8) -> Result<Self, FormatError> {
        if !(1..=4).contains(&quadrant) {
            return Err(FormatError::Quadrant(quadrant.to_string()));
        }
        if !(1..=8).contains(&position) {
            return Err(FormatError::Position(position.to_string()));
        }
        Ok(Self(quadrant * 10 + position))
    }

    /// Quadrant digit (1 = upper right, 2 = upper left, 3 = lower left, 4 = lower right).
    pub fn quadrant(self) -> u8 {
        self.0 / 10
    }

    /// Position within the quadrant, counted from the midline.
    pub fn position(self) -> u8 {
        self.0 % 10
    }

    /// FDI two-digit string.
    pub fn fdi(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for Tooth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Tooth {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let designator = s.trim().to_uppercase();
        let chars: Vec<char> = designator.chars().collect();

        match chars.as_slice() {
            [q, p] if q.is_ascii_digit() && p.is_ascii_digit() => {
                let quadrant = digit(*q);
                let position = digit(*p);
                Tooth::new(quadrant, position).map_err(|e| match e {
                    FormatError::Quadrant(_) => FormatError::Quadrant(designator.clone()),
                    FormatError::Position(_) => FormatError::Position(designator.clone()),
                    other => other,
                })
            }
            [a, b, p] if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
                let quadrant = match (a, b) {
                    ('U', 'R') => 1,
                    ('U', 'L') => 2,
                    ('L', 'L') => 3,
                    ('L', 'R') => 4,
                    _ => return Err(FormatError::Quadrant(designator)),
                };
                if !p.is_ascii_digit() {
                    return Err(FormatError::Position(designator));
                }
                Tooth::new(quadrant, digit(*p))
                    .map_err(|_| FormatError::Position(designator.clone()))
            }
            _ => Err(FormatError::Malformed(designator)),
        }
    }
}

impl TryFrom<String> for Tooth {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tooth> for String {
    fn from(tooth: Tooth) -> Self {
        tooth.fdi()
    }
}

fn digit(c: char) -> u8 {
    c.to_digit(10).map(|d| d as u8).unwrap_or(u8::MAX)
}

/// Normalize a tooth designator to two-digit FDI notation.
pub fn to_fdi(designator: &str) -> Result<String, FormatError> {
    designator.parse::<Tooth>().map(Tooth::fdi)
}
