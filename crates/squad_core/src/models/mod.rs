pub mod candidate;
pub mod lineup;
pub mod pool;
pub mod squad;

pub use candidate::{Candidate, CandidateId, Position, MIN_EFFICIENCY_PRICE};
pub use lineup::Lineup;
pub use pool::CandidatePool;
pub use squad::Squad;
