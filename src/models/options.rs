//! Arrow shape options and solver mode

use crate::error::OptionsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which solver variant runs
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ArrowType {
    /// Centre of one rect to centre of the other
    Point,
    /// Facing edges of the two rects
    #[default]
    Box,
}

impl ArrowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArrowType::Point => "point",
            ArrowType::Box => "box",
        }
    }
}

impl fmt::Display for ArrowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArrowType {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "point" => Ok(ArrowType::Point),
            "box" => Ok(ArrowType::Box),
            other => Err(OptionsError::UnknownType(other.to_string())),
        }
    }
}

/// Shape options passed to the solver on every call
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ArrowOptions {
    /// Natural bend of the curve; `0` draws straight lines
    pub bow: f64,

    /// How much the connector length relaxes the bow between
    /// `stretch_min` and `stretch_max`; `0` disables the effect
    pub stretch: f64,

    /// Length up to which the bow is applied in full
    pub stretch_min: f64,

    /// Length from which the stretch effect is saturated
    pub stretch_max: f64,

    /// Pull-back of the drawn start from its anchor
    pub pad_start: f64,

    /// Pull-back of the drawn end from its anchor
    pub pad_end: f64,

    /// Mirror the bend direction
    pub flip: bool,

    /// Snap connectors close to 0/45/90° to straight segments
    pub straights: bool,
}

impl Default for ArrowOptions {
    fn default() -> Self {
        Self {
            bow: 0.0,
            stretch: 0.25,
            stretch_min: 50.0,
            stretch_max: 420.0,
            pad_start: 0.0,
            pad_end: 20.0,
            flip: false,
            straights: true,
        }
    }
}

impl ArrowOptions {
    /// Check the invariants the solver relies on
    pub fn validate(&self) -> Result<(), OptionsError> {
        let numbers = [
            ("bow", self.bow),
            ("stretch", self.stretch),
            ("stretchMin", self.stretch_min),
            ("stretchMax", self.stretch_max),
            ("padStart", self.pad_start),
            ("padEnd", self.pad_end),
        ];
        for (field, value) in numbers {
            if !value.is_finite() {
                return Err(OptionsError::NotFinite { field, value });
            }
        }

        for &(field, value) in &numbers[2..] {
            if value < 0.0 {
                return Err(OptionsError::Negative { field, value });
            }
        }

        if self.stretch_min > self.stretch_max {
            return Err(OptionsError::InvertedStretch {
                min: self.stretch_min,
                max: self.stretch_max,
            });
        }

        Ok(())
    }
}
