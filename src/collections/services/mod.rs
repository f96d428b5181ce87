mod confirmation_gate;
mod search_matcher;

pub use confirmation_gate::{ConfirmationGate, ConfirmationPhase, ConfirmationState};
pub use search_matcher::{MatchRank, SearchMatcher};
