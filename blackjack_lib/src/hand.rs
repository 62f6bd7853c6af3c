use crate::card::Card;
use crate::error::BlackjackGameError;
use crate::shoe::Shoe;
use std::fmt::Display;

/// Classification of a hand used when looking up a basic strategy move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HandType {
    #[default]
    Hard,
    Soft,
    Pair,
}

impl Display for HandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandType::Hard => write!(f, "hard"),
            HandType::Soft => write!(f, "soft"),
            HandType::Pair => write!(f, "pair"),
        }
    }
}

/// A growable sequence of cards held by the player or the dealer.
/// The value, softness and type of the hand are recomputed every time a card is added.
#[derive(Debug, Clone, Default)]
pub struct Hand {
    cards: Vec<Card>,
    value: u8,
    soft: bool,
    hand_type: HandType,
    doubled: bool,
}

impl Hand {
    pub fn new() -> Hand {
        Hand::default()
    }

    /// Adds `card` to the hand and recomputes the derived fields. A doubled hand takes exactly
    /// one more card, once it holds three cards any further card is ignored.
    pub fn add_card(&mut self, card: Card) {
        if self.doubled && self.cards.len() >= 3 {
            return;
        }
        self.cards.push(card);
        self.update();
    }

    /// Doubles down on the hand, drawing exactly one card from `shoe`.
    /// Only a two card hand may double, for any other hand nothing happens and `Ok(None)` is returned.
    /// On success the drawn card is returned so the caller can count it.
    pub fn double_down(&mut self, shoe: &mut Shoe) -> Result<Option<Card>, BlackjackGameError> {
        if !self.can_double_down() {
            return Ok(None);
        }
        let card = shoe.draw()?;
        self.doubled = true;
        self.add_card(card);
        Ok(Some(card))
    }

    pub fn can_double_down(&self) -> bool {
        !self.doubled && self.cards.len() == 2
    }

    /// Recomputes value, softness and type. Aces start out as 11 and are knocked down to 1 one
    /// at a time while the hand is over 21, giving the highest total that does not bust.
    fn update(&mut self) {
        let mut sum: u32 = 0;
        let mut aces_as_eleven = 0;
        for card in &self.cards {
            if card.is_ace() {
                aces_as_eleven += 1;
            }
            sum += card.val() as u32;
        }

        while sum > 21 && aces_as_eleven > 0 {
            sum -= 10;
            aces_as_eleven -= 1;
        }

        self.value = sum as u8;
        self.soft = self.has_ace() && aces_as_eleven > 0 && sum <= 21;
        self.hand_type = if self.cards.len() == 2 && self.cards[0].rank() == self.cards[1].rank() {
            HandType::Pair
        } else if self.soft {
            HandType::Soft
        } else {
            HandType::Hard
        };
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

    /// Getter for the best total of the hand.
    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_soft(&self) -> bool {
        self.soft
    }

    pub fn hand_type(&self) -> HandType {
        self.hand_type
    }

    pub fn is_doubled(&self) -> bool {
        self.doubled
    }

    /// A blackjack is any two card hand worth 21.
    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.value == 21
    }

    pub fn is_busted(&self) -> bool {
        self.value > 21
    }

    pub fn has_ace(&self) -> bool {
        self.cards.iter().any(|card| card.is_ace())
    }

    /// The blackjack value of the first card, which is the dealer's face up card.
    pub fn up_card_value(&self) -> Option<u8> {
        self.cards.first().map(|card| card.val())
    }

    /// Sum of the Hi-Lo weights of every card in the hand.
    pub fn running_count(&self) -> i32 {
        self.cards.iter().map(|card| card.count_weight()).sum()
    }
}

impl Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cards = self
            .cards
            .iter()
            .map(|card| card.to_string())
            .collect::<Vec<String>>()
            .join(" ");
        write!(f, "[{}] ({} {})", cards, self.hand_type, self.value)
    }
}
