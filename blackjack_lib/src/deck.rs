use crate::card::{Card, Rank, Suit};

/// One ordered set of 52 cards, one per suit and rank.
/// A deck only exists long enough to be poured into a `Shoe`.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Associated method for building a new ordered deck.
    pub fn new() -> Deck {
        let cards = Suit::ALL
            .iter()
            .flat_map(|&suit| Rank::ALL.iter().map(move |&rank| Card::new(rank, suit)))
            .collect();
        Deck { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Deck::new()
    }
}

impl IntoIterator for Deck {
    type Item = Card;
    type IntoIter = std::vec::IntoIter<Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn deck_has_52_distinct_cards() {
        let deck = Deck::new();
        assert_eq!(deck.len(), 52);
        let distinct: HashSet<(Rank, Suit)> =
            deck.cards().iter().map(|c| (c.rank(), c.suit())).collect();
        assert_eq!(distinct.len(), 52);
    }

    #[test]
    fn deck_count_sums_to_zero() {
        // Hi-Lo is a balanced count
        let total: i32 = Deck::new().into_iter().map(|c| c.count_weight()).sum();
        assert_eq!(total, 0);
    }
}
