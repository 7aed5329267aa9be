//! Odds and payout multipliers

pub mod multiplier;

pub use multiplier::{
    calculate_multiplier, calculate_multiplier_with, multiplier_options, multiplier_options_with,
    round2, BonusTier, MultiplierConfig, MultiplierOption, PlayerOdds, PREVIEW_COUNTS,
};
