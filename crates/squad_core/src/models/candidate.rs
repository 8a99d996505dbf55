use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type CandidateId = u32;

/// Price floor used when computing score/price efficiency.
pub const MIN_EFFICIENCY_PRICE: f64 = 0.1;

/// Squad position category.
///
/// The declaration order is the order the search fills positions in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    #[serde(alias = "GKP")]
    GK,
    DEF,
    MID,
    FWD,
}

impl Position {
    pub const COUNT: usize = 4;

    /// Fixed processing order (GK → DEF → MID → FWD).
    pub const ALL: [Position; Position::COUNT] =
        [Position::GK, Position::DEF, Position::MID, Position::FWD];

    /// Dense index into per-position arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Position::GK => 0,
            Position::DEF => 1,
            Position::MID => 2,
            Position::FWD => 3,
        }
    }

    /// Decode from compact numeric codes (0=GK ... 3=FWD).
    pub fn from_code(code: u8) -> Option<Self> {
        Position::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> &'static str {
        match self {
            Position::GK => "GK",
            Position::DEF => "DEF",
            Position::MID => "MID",
            Position::FWD => "FWD",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "GKP" | "GOALKEEPER" => Ok(Position::GK),
            "DEF" | "DF" | "DEFENDER" => Ok(Position::DEF),
            "MID" | "MF" | "MIDFIELDER" => Ok(Position::MID),
            "FWD" | "FW" | "FORWARD" => Ok(Position::FWD),
            other => Err(format!("Unknown position: {}", other)),
        }
    }
}

/// A selectable entity. Immutable for the duration of one optimization run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: CandidateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Opaque expected score supplied by an external model.
    pub score: f64,
    pub price: f64,
    pub position: Position,
    /// Group affiliation (club). `None` never counts toward the group cap.
    #[serde(default)]
    pub group: Option<String>,
}

impl Candidate {
    pub fn new(id: CandidateId, score: f64, price: f64, position: Position) -> Self {
        Self { id, name: None, score, price, position, group: None }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Score per unit of price, with the price floored at [`MIN_EFFICIENCY_PRICE`].
    #[inline]
    pub fn efficiency(&self) -> f64 {
        self.score / self.price.max(MIN_EFFICIENCY_PRICE)
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#{}", self.id),
        }
    }
}
