use blackjack_lib::{Card, Hand, HandType};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt::Display;
use tracing::trace;

pub mod prelude {
    pub use super::{
        basic_strategy, dealer_next_move, BasicStrategy, BettingStrategy, CountingStrategy,
        DecisionStrategy, HiLo, KellyBettingStrategy, Move, BASE_BET_DIVISOR, DEFAULT_MAX_BET,
        KELLY_MULTIPLIER,
    };
}

/// Fraction of full Kelly used when sizing bets.
pub const KELLY_MULTIPLIER: f64 = 0.5;

/// The base betting unit is this fraction of the bankroll.
pub const BASE_BET_DIVISOR: f64 = 600.0;

pub const DEFAULT_MAX_BET: f64 = 10_000.0;

lazy_static! {
    static ref BASIC_STRATEGY: BasicStrategy = BasicStrategy::new();
}

/// Returns the shared, immutable basic strategy tables.
pub fn basic_strategy() -> &'static BasicStrategy {
    &BASIC_STRATEGY
}

/// A move available to the player or the dealer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Hit,
    Stand,
    Double,
    Split,
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::Hit => write!(f, "hit"),
            Move::Stand => write!(f, "stand"),
            Move::Double => write!(f, "double down"),
            Move::Split => write!(f, "split"),
        }
    }
}

/// Trait for a decision strategy, i.e. how the player plays a hand against the dealer's up card.
/// Returning `None` means the strategy has no further action for the hand.
pub trait DecisionStrategy {
    /// The recommended move for `hand` against `dealer_hand`.
    fn player_next_move(&self, hand: &Hand, dealer_hand: &Hand) -> Option<Move>;

    /// The recommended move for `hand` when splitting is not possible, a pair is played by its total.
    fn unsplit_move(&self, hand: &Hand, dealer_hand: &Hand) -> Option<Move>;
}

/// Trait for a betting strategy. Sizes the next bet from the true count and the bankroll.
pub trait BettingStrategy {
    fn bet(&self, true_count: f64, balance: f64) -> f64;
}

/// Trait for a card counting strategy. Every card dealt is passed to `update`, the count is
/// cleared with `reset` whenever the shoe is replaced.
pub trait CountingStrategy {
    fn update(&mut self, card: &Card);
    fn running_count(&self) -> i32;
    /// The running count normalized by the number of decks left in the shoe.
    fn true_count(&self, remaining_decks: f64) -> i32;
    fn reset(&mut self);
}

/// Decides the dealer's next move. Returns `None` when every player hand has busted, the dealer
/// has nothing left to play for. Otherwise the dealer hits below 17, hits a soft 17 when
/// `soft_seventeen` is set, and stands on everything else.
pub fn dealer_next_move(
    player_hands: &[Hand],
    dealer_hand: &Hand,
    soft_seventeen: bool,
) -> Option<Move> {
    if player_hands.iter().all(|hand| hand.is_busted()) {
        return None;
    }

    let value = dealer_hand.value();
    if value < 17 || (soft_seventeen && value == 17 && dealer_hand.is_soft()) {
        Some(Move::Hit)
    } else {
        Some(Move::Stand)
    }
}

/// Basic strategy decision tables. Each table is keyed by `(hand value, dealer up card)` where the
/// up card runs from 2 to 11, 11 being an ace. A key missing from a table yields `None`, which the
/// caller treats as no further action.
pub struct BasicStrategy {
    hard_totals: HashMap<(u8, u8), Move>,
    soft_totals: HashMap<(u8, u8), Move>,
    pair_totals: HashMap<(u8, u8), Move>,
}

impl BasicStrategy {
    /// Associated method for populating the lookup tables, intended to be a helper method.
    fn build_lookup_tables() -> (
        HashMap<(u8, u8), Move>,
        HashMap<(u8, u8), Move>,
        HashMap<(u8, u8), Move>,
    ) {
        // Hard totals, anything below 9 or above 16 never reaches the table
        let mut hard_totals = HashMap::new();
        for i in 9..=16 {
            for j in 2..=11 {
                let option = match i {
                    9 => match j {
                        3..=6 => Move::Double,
                        _ => Move::Hit,
                    },
                    10 => match j {
                        2..=9 => Move::Double,
                        _ => Move::Hit,
                    },
                    11 => match j {
                        2..=10 => Move::Double,
                        _ => Move::Hit,
                    },
                    12 => match j {
                        4..=6 => Move::Stand,
                        _ => Move::Hit,
                    },
                    _ => match j {
                        2..=6 => Move::Stand,
                        _ => Move::Hit,
                    },
                };
                hard_totals.insert((i, j), option);
            }
        }

        // Soft totals i.e. an ace still counted as 11
        let mut soft_totals = HashMap::new();
        for i in 13..=19 {
            for j in 2..=11 {
                let option = match i {
                    13 | 14 => match j {
                        5 | 6 => Move::Double,
                        _ => Move::Hit,
                    },
                    15 | 16 => match j {
                        4..=6 => Move::Double,
                        _ => Move::Hit,
                    },
                    17 => match j {
                        3..=6 => Move::Double,
                        _ => Move::Hit,
                    },
                    18 => match j {
                        3..=6 => Move::Double,
                        2 | 7 | 8 => Move::Stand,
                        _ => Move::Hit,
                    },
                    _ => Move::Stand,
                };
                soft_totals.insert((i, j), option);
            }
        }

        // Pair totals. Pairs of 2s, 3s and 7s all share the 4 row, 8s, 10s and aces are
        // decided before the table is consulted.
        let mut pair_totals = HashMap::new();
        for i in [4, 8, 10, 12, 18] {
            for j in 2..=11 {
                let option = match i {
                    4 => match j {
                        2..=7 => Move::Split,
                        _ => Move::Hit,
                    },
                    8 => match j {
                        5 | 6 => Move::Split,
                        _ => Move::Hit,
                    },
                    10 => match j {
                        2..=9 => Move::Double,
                        _ => Move::Hit,
                    },
                    12 => match j {
                        2..=6 => Move::Split,
                        _ => Move::Hit,
                    },
                    _ => match j {
                        2..=6 | 8 | 9 => Move::Split,
                        _ => Move::Stand,
                    },
                };
                pair_totals.insert((i, j), option);
            }
        }

        (hard_totals, soft_totals, pair_totals)
    }

    /// Associated method for creating a new `BasicStrategy` struct.
    pub fn new() -> BasicStrategy {
        let (hard_totals, soft_totals, pair_totals) = BasicStrategy::build_lookup_tables();
        BasicStrategy {
            hard_totals,
            soft_totals,
            pair_totals,
        }
    }

    fn next_move_as(&self, hand: &Hand, dealer_hand: &Hand, hand_type: HandType) -> Option<Move> {
        if hand.is_doubled() {
            return Some(Move::Stand);
        }

        let dealer_up_card = dealer_hand.up_card_value()?;
        let next = self.determine_move(hand.value(), hand_type, hand.has_ace(), dealer_up_card);
        trace!(hand = %hand, dealer_up_card, ?next, "player decision");

        match next {
            Some(Move::Double) if hand.len() > 2 => Some(Move::Hit),
            other => other,
        }
    }

    /// Picks the table for the hand type and looks up the move.
    pub fn determine_move(
        &self,
        hand_value: u8,
        hand_type: HandType,
        has_ace: bool,
        dealer_up_card: u8,
    ) -> Option<Move> {
        if hand_value >= 21 {
            return Some(Move::Stand);
        }

        match hand_type {
            HandType::Pair => self.handle_pair(hand_value, has_ace, dealer_up_card),
            HandType::Soft => self.handle_soft(hand_value, dealer_up_card),
            HandType::Hard => self.handle_hard(hand_value, dealer_up_card),
        }
    }

    pub fn handle_pair(&self, hand_value: u8, has_ace: bool, dealer_up_card: u8) -> Option<Move> {
        if matches!(hand_value, 4 | 6 | 14) {
            return self.pair_totals.get(&(4, dealer_up_card)).copied();
        }

        if (hand_value == 20 && has_ace) || hand_value == 16 {
            return Some(Move::Split);
        }

        if hand_value == 20 {
            return Some(Move::Stand);
        }

        self.pair_totals.get(&(hand_value, dealer_up_card)).copied()
    }

    pub fn handle_soft(&self, hand_value: u8, dealer_up_card: u8) -> Option<Move> {
        if hand_value > 19 {
            return Some(Move::Stand);
        }

        self.soft_totals.get(&(hand_value, dealer_up_card)).copied()
    }

    pub fn handle_hard(&self, hand_value: u8, dealer_up_card: u8) -> Option<Move> {
        if hand_value < 9 {
            return Some(Move::Hit);
        }

        if hand_value > 16 {
            return Some(Move::Stand);
        }

        self.hard_totals.get(&(hand_value, dealer_up_card)).copied()
    }
}

impl DecisionStrategy for BasicStrategy {
    /// A doubled hand always stands, and a recommended double on a hand that has already taken a
    /// hit is played as a hit.
    fn player_next_move(&self, hand: &Hand, dealer_hand: &Hand) -> Option<Move> {
        self.next_move_as(hand, dealer_hand, hand.hand_type())
    }

    fn unsplit_move(&self, hand: &Hand, dealer_hand: &Hand) -> Option<Move> {
        // A pair of aces is a soft 12 which has no soft row, play it like a hard 12
        let hand_type = if hand.is_soft() && hand.value() >= 13 {
            HandType::Soft
        } else {
            HandType::Hard
        };
        self.next_move_as(hand, dealer_hand, hand_type)
    }
}

impl Default for BasicStrategy {
    fn default() -> Self {
        BasicStrategy::new()
    }
}

/// Hi-Lo card counter. Keeps the running count of every card seen since the last reshuffle.
#[derive(Debug, Clone, Default)]
pub struct HiLo {
    running_count: i32,
    total_cards_counted: u32,
}

impl HiLo {
    pub fn new() -> Self {
        HiLo::default()
    }

    pub fn total_cards_counted(&self) -> u32 {
        self.total_cards_counted
    }
}

impl CountingStrategy for HiLo {
    fn update(&mut self, card: &Card) {
        self.running_count += card.count_weight();
        self.total_cards_counted += 1;
    }

    fn running_count(&self) -> i32 {
        self.running_count
    }

    /// The running count per remaining deck, rounded down. With no decks left the running count
    /// is returned as is.
    fn true_count(&self, remaining_decks: f64) -> i32 {
        if remaining_decks <= 0.0 {
            return self.running_count;
        }
        (self.running_count as f64 / remaining_decks).floor() as i32
    }

    fn reset(&mut self) {
        self.running_count = 0;
        self.total_cards_counted = 0;
    }
}

impl Display for HiLo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = "total cards counted:".len();
        write!(
            f,
            "{:<width$}{:>8}\n{:<width$}{:>8}",
            "running count:", self.running_count, "total cards counted:", self.total_cards_counted,
        )
    }
}

/// Sizes bets with a simplified Kelly formula: one base unit (1/600 of the bankroll) until the
/// true count reaches 2, then a fraction of the bankroll proportional to the estimated edge.
#[derive(Debug, Clone, Copy)]
pub struct KellyBettingStrategy {
    max_bet: f64,
}

impl KellyBettingStrategy {
    /// Associated method for returning a new `KellyBettingStrategy` capped at `max_bet`.
    pub fn new(max_bet: f64) -> KellyBettingStrategy {
        KellyBettingStrategy { max_bet }
    }

    pub fn max_bet(&self) -> f64 {
        self.max_bet
    }

    pub fn base_bet(&self, balance: f64) -> f64 {
        balance / BASE_BET_DIVISOR
    }

    /// The player's edge in percent for a given true count.
    pub fn edge(&self, true_count: f64) -> f64 {
        (true_count - 1.0) * 0.5
    }

    pub fn optimal_percent(&self, true_count: f64) -> f64 {
        self.edge(true_count) * KELLY_MULTIPLIER
    }

    pub fn optimal_bet(&self, true_count: f64, balance: f64) -> f64 {
        if true_count < 2.0 {
            return self.base_bet(balance);
        }
        (balance / 100.0) * self.optimal_percent(true_count)
    }

}

impl BettingStrategy for KellyBettingStrategy {
    /// Returns the bet for the current true count: the optimal bet capped at the maximum bet and
    /// rounded down to a whole number of base units.
    fn bet(&self, true_count: f64, balance: f64) -> f64 {
        let base = self.base_bet(balance);
        if base <= 0.0 {
            return 0.0;
        }
        let capped = f64::min(self.optimal_bet(true_count, balance), self.max_bet);
        f64::max(0.0, (capped / base).floor() * base)
    }
}

impl Default for KellyBettingStrategy {
    fn default() -> Self {
        KellyBettingStrategy::new(DEFAULT_MAX_BET)
    }
}
