//! Core primitives for simulating blackjack: cards, decks, the shoe they are dealt from
//! and the hands they are dealt into.

mod card;
mod deck;
mod error;
mod hand;
mod shoe;

pub use card::{Card, Rank, Suit};
pub use deck::Deck;
pub use error::BlackjackGameError;
pub use hand::{Hand, HandType};
pub use shoe::{Shoe, CARDS_PER_DECK};
