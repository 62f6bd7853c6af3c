use blackjack_lib::Hand;

/// The dealer's side of the table: a single hand, no bankroll and no bets.
#[derive(Debug, Clone, Default)]
pub struct DealerSim {
    hand: Hand,
}

impl DealerSim {
    /// Associated function to create a new `DealerSim` struct
    pub fn new() -> Self {
        DealerSim::default()
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn hand_mut(&mut self) -> &mut Hand {
        &mut self.hand
    }

    /// The blackjack value of the dealer's face up card, if one has been dealt.
    pub fn up_card_value(&self) -> Option<u8> {
        self.hand.up_card_value()
    }

    /// Method to reset the hand after a complete round
    pub fn reset_hand(&mut self) {
        self.hand = Hand::new();
    }
}
