//! Prediction Model
//!
//! What a user can predict for one match, which of those fields apply to a
//! chosen result, and how a prediction is stored and read back.

pub mod options;
pub mod serializer;
pub mod sets;

pub use options::{PredictionOptions, TieBreakChoice, MAX_SETS};
pub use serializer::{build_prediction_text, extract_labelled, parse_prediction_text, Prediction};
pub use sets::{set_winners, sets_to_show, MatchFormat, MatchScore};
