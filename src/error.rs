//! Prediction engine errors
//!
//! Pure computations favour graceful defaults; these are the cases that must
//! fail loudly because they would otherwise leak a wrong number into a payout
//! or leave a wager in an inconsistent state.

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionError {
    /// Match result is not of the form `<a>-<b>`
    InvalidResult(String),
    /// Selected winner matches neither side of the match
    UnknownPlayer(String),
    /// Wallet debit rejected at wager creation
    InsufficientFunds { balance: u64, requested: u64 },
    /// Match is locked or already started
    MatchLocked(String),
    /// Mutation attempted on a resolved wager
    ImmutableWager(Uuid),
    /// Decimal odds below 1.0 or not finite
    InvalidOdds { name: String, odds: f64 },
    /// Bet amount zero or outside the configured limits
    InvalidBetAmount { amount: u64, min: u64, max: u64 },
    /// Submission carries no populated prediction field
    EmptyPrediction,
    WagerNotFound(Uuid),
}

impl PredictionError {
    /// Short machine-friendly reason attached to a rejected submission.
    pub fn reason(&self) -> &'static str {
        match self {
            PredictionError::InvalidResult(_) => "invalid_result",
            PredictionError::UnknownPlayer(_) => "unknown_player",
            PredictionError::InsufficientFunds { .. } => "insufficient_funds",
            PredictionError::MatchLocked(_) => "match_locked",
            PredictionError::ImmutableWager(_) => "immutable_wager",
            PredictionError::InvalidOdds { .. } => "invalid_odds",
            PredictionError::InvalidBetAmount { .. } => "invalid_bet_amount",
            PredictionError::EmptyPrediction => "empty_prediction",
            PredictionError::WagerNotFound(_) => "wager_not_found",
        }
    }
}

impl std::fmt::Display for PredictionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionError::InvalidResult(raw) => {
                write!(f, "Invalid match result '{}' (expected <sets>-<sets>)", raw)
            }
            PredictionError::UnknownPlayer(name) => {
                write!(f, "Player '{}' is not part of this match", name)
            }
            PredictionError::InsufficientFunds { balance, requested } => write!(
                f,
                "Insufficient funds: balance {} coins, bet requires {}",
                balance, requested
            ),
            PredictionError::MatchLocked(match_id) => {
                write!(f, "Match {} is locked for predictions", match_id)
            }
            PredictionError::ImmutableWager(id) => {
                write!(f, "Wager {} is already resolved", id)
            }
            PredictionError::InvalidOdds { name, odds } => {
                write!(f, "Invalid odds {} for '{}' (must be >= 1.0)", odds, name)
            }
            PredictionError::InvalidBetAmount { amount, min, max } => write!(
                f,
                "Bet amount {} outside allowed range {}..={}",
                amount, min, max
            ),
            PredictionError::EmptyPrediction => write!(f, "No predictions selected"),
            PredictionError::WagerNotFound(id) => write!(f, "Wager {} not found", id),
        }
    }
}

impl std::error::Error for PredictionError {}
