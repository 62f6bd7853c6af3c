use crate::card::Card;
use crate::deck::Deck;
use crate::error::BlackjackGameError;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use tracing::trace;

pub const CARDS_PER_DECK: usize = 52;

/// Represents a dealing shoe holding one or more shuffled decks.
/// Cards are drawn from the top one at a time. Once the number of remaining cards falls to the
/// cut index the shoe remembers that the cut card has been reached, the flag is never cleared,
/// a new shoe has to be built instead.
#[derive(Debug, Clone)]
pub struct Shoe {
    num_decks: usize,
    penetration: f64,
    cards: Vec<Card>,
    cut_index: usize,
    reached_cut_card: bool,
}

impl Shoe {
    /// Builds a new shoe with `num_decks` decks shuffled using the thread local rng.
    /// `penetration` is the fraction of the shoe left undealt when the cut card comes out.
    pub fn new(num_decks: usize, penetration: f64) -> Shoe {
        Shoe::with_rng(num_decks, penetration, &mut thread_rng())
    }

    /// Builds a new shoe shuffled with the given rng, a seeded rng gives a reproducible shoe.
    pub fn with_rng<R: Rng + ?Sized>(num_decks: usize, penetration: f64, rng: &mut R) -> Shoe {
        let mut cards = Vec::with_capacity(num_decks * CARDS_PER_DECK);
        for _ in 0..num_decks {
            cards.extend(Deck::new());
        }
        // Fisher-Yates, once per shoe
        cards.shuffle(rng);

        let cut_index = ((num_decks * CARDS_PER_DECK) as f64 * penetration).floor() as usize;
        Shoe {
            num_decks,
            penetration,
            cards,
            cut_index,
            reached_cut_card: false,
        }
    }

    /// Builds a shoe that deals `cards` in the order given, with the cut card placed so that it
    /// comes out once `cut_index` cards remain. Useful for replaying a known sequence of cards.
    pub fn stacked(cards: Vec<Card>, cut_index: usize) -> Shoe {
        let total = cards.len();
        let num_decks = usize::max(1, (total + CARDS_PER_DECK - 1) / CARDS_PER_DECK);
        let penetration = if total == 0 {
            0.0
        } else {
            cut_index as f64 / total as f64
        };
        let mut cards = cards;
        cards.reverse();
        Shoe {
            num_decks,
            penetration,
            cards,
            cut_index,
            reached_cut_card: false,
        }
    }

    /// Removes and returns the top card of the shoe. Fails with `EmptyShoe` when nothing is left.
    pub fn draw(&mut self) -> Result<Card, BlackjackGameError> {
        let card = self.cards.pop().ok_or(BlackjackGameError::EmptyShoe)?;
        if !self.reached_cut_card && self.cards.len() <= self.cut_index {
            trace!(remaining = self.cards.len(), "cut card reached");
            self.reached_cut_card = true;
        }
        Ok(card)
    }

    pub fn remaining_cards(&self) -> usize {
        self.cards.len()
    }

    /// The number of decks left in the shoe, rounded to two decimals. Only used to turn a
    /// running count into a true count.
    pub fn remaining_decks(&self) -> f64 {
        let decks = self.cards.len() as f64 / CARDS_PER_DECK as f64;
        (decks * 100.0).round() / 100.0
    }

    pub fn reached_cut_card(&self) -> bool {
        self.reached_cut_card
    }

    pub fn cut_index(&self) -> usize {
        self.cut_index
    }

    pub fn num_decks(&self) -> usize {
        self.num_decks
    }

    pub fn penetration(&self) -> f64 {
        self.penetration
    }
}
