//! Wager Module - Slip, Lifecycle & Settlement
//!
//! This module handles:
//! 1. Validating and pricing a betting slip
//! 2. The active -> won/lost/cancelled state machine
//! 3. Persisting wallets and wagers (atomic debit + insert)
//! 4. History views and summary totals

pub mod history;
pub mod lifecycle;
pub mod slip;
pub mod store;

pub use history::{partition_wagers, summarize, BetHistoryItem, WagerSummary};
pub use lifecycle::{
    potential_winnings, MatchOutcome, SettlementClassifier, SettlementOutcome, Wager, WagerStatus,
    WalletCredit, WinnerClassifier,
};
pub use slip::{prepare_wager, MatchSnapshot, MatchStatus, WagerRequest};
pub use store::{Wallet, WagerStore};
