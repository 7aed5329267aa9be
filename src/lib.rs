//! NetProphet Prediction Engine
//!
//! Turns a user's tennis predictions into a priced wager, stores it and
//! settles it. Pure prediction/odds logic lives in `prediction` and `odds`;
//! `wager` adds the lifecycle and the SQLite-backed wallet store.

pub mod config;
pub mod error;
pub mod odds;
pub mod prediction;
pub mod wager;

pub use config::EngineConfig;
pub use error::PredictionError;
