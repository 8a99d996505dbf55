//! Squad search engine: shortlisting, combination generation and beam search.

pub mod beam;
pub mod combinations;
pub mod deadline;
pub mod shortlist;

pub use beam::{search, SearchOutcome, SearchParams, SearchStats, SquadSearch, PRICE_EPSILON};
pub use combinations::{binomial, Combinations};
pub use deadline::SearchBudget;
pub use shortlist::{ExhaustiveShortlist, ScoreEfficiencyShortlist, ShortlistStrategy};
