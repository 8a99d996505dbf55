//! # squad_core - Constrained Squad Optimization Engine
//!
//! Picks fixed-size squads from a scored, priced candidate pool under a budget,
//! per-position quotas and a per-group cap, then extracts the best lineup and
//! captain of each squad and ranks the results.
//!
//! ## Features
//! - Beam search over positions with score/efficiency shortlists
//! - Exact lineup selection over every admissible formation
//! - Deterministic ranking (same input = same output, including ties)
//! - One- and two-swap transfer planning for an existing squad
//! - JSON API for easy integration

// `search()` mirrors the flat engine contract and takes every knob positionally
#![allow(clippy::too_many_arguments)]
// Complex types are sometimes necessary for generic APIs
#![allow(clippy::type_complexity)]
// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]
// Loop style - can fix incrementally
#![allow(clippy::needless_range_loop)]

pub mod api;
pub mod captain;
pub mod config;
pub mod error;
pub mod lineup;
pub mod models;
pub mod optimizer;
pub mod ranking;
pub mod search;
pub mod transfers;
pub mod validation;


// Re-export main API functions
pub use api::{optimize_json, suggest_transfers_json};
pub use error::{Result, SquadError};

pub use captain::{score_with_captain, CaptainChoice};
pub use config::{CountBounds, FormationRules, OptimizerConfig, CONFIG_PATH_ENV};
pub use lineup::{best_lineup, best_lineup_from};
pub use models::{Candidate, CandidateId, CandidatePool, Lineup, Position, Squad};
pub use optimizer::{evaluate_squad, optimize, OptimizationReport};
pub use ranking::{top_k, RankedResult, TopK};
pub use search::{search, SearchBudget, SearchStats, SquadSearch};
pub use transfers::{suggest_transfers, Transfer, TransferSuggestion};
pub use validation::{validate_lineup, validate_squad, ConstraintViolation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
