use crate::common::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A live position owned by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
        }
    }

    /// Reject NaN and infinite coordinates before they reach a round.
    pub fn ensure_finite(&self) -> DomainResult<()> {
        for value in [self.x, self.y] {
            if !value.is_finite() {
                return Err(DomainError::invalid_coordinate(format!(
                    "{} (position {})",
                    value, self.id
                )));
            }
        }
        Ok(())
    }
}

/// Quantized grid coordinate. Text form is `"x y"`, matching the
/// identifiers the PSI server returns in `decrypted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i64,
    pub y: i64,
}

impl Cell {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

impl FromStr for Cell {
    type Err = DomainError;

    /// Accepts `"x y"` and `"x,y"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unrecognised = || DomainError::UnrecognisedCell {
            value: s.to_string(),
        };
        let mut parts = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty());
        let x = parts.next().ok_or_else(unrecognised)?;
        let y = parts.next().ok_or_else(unrecognised)?;
        if parts.next().is_some() {
            return Err(unrecognised());
        }
        Ok(Cell {
            x: x.parse().map_err(|_| unrecognised())?,
            y: y.parse().map_err(|_| unrecognised())?,
        })
    }
}

/// Cells deduplicated by value; ordered so requests built from a set are deterministic.
pub type CellSet = BTreeSet<Cell>;

/// Edge length of one grid cell, in the same units as [`Position`] coordinates.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct GridSize(f64);

impl GridSize {
    pub fn new(size: f64) -> DomainResult<Self> {
        if !size.is_finite() || size <= 0.0 {
            return Err(DomainError::invalid_configuration(format!(
                "grid size must be a positive number, got {size}"
            )));
        }
        Ok(Self(size))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionLevel {
    Coarse,
    Fine,
}

impl ResolutionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionLevel::Coarse => "coarse",
            ResolutionLevel::Fine => "fine",
        }
    }
}

impl fmt::Display for ResolutionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
