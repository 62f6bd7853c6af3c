use thiserror::Error;

/// Errors that can occur while playing a game of blackjack.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlackjackGameError {
    /// A card was requested from a shoe with no cards left in it.
    #[error("the shoe is empty")]
    EmptyShoe,

    /// A bet, double down or split asked for more than the bankroll holds.
    #[error("insufficient funds: requested {requested:.2} but the bankroll holds {bankroll:.2}")]
    InsufficientFunds { requested: f64, bankroll: f64 },

    /// The player's hands and bets fell out of step, this is always a bug in the engine.
    #[error("the number of player hands ({hands}) does not match the number of bets ({bets})")]
    HandBetMismatch { hands: usize, bets: usize },

    #[error("no hand at index {0}")]
    InvalidHandIndex(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
