use blackjack_lib::{BlackjackGameError, Card, Hand, HandType, Shoe};
use std::fmt::Display;
use tracing::trace;

/// The most hands a player may hold after splitting.
pub const MAX_HANDS: usize = 4;

/// Struct for a simulated player. Holds one hand per split, a bet for every hand at the same
/// index, and the player's bankroll.
#[derive(Debug, Clone)]
pub struct PlayerSim {
    hands: Vec<Hand>,
    bets: Vec<f64>,
    balance: f64,
}

impl PlayerSim {
    /// Associated function to create a new `PlayerSim` struct.
    pub fn new(starting_balance: f64) -> PlayerSim {
        PlayerSim {
            hands: vec![Hand::new()],
            bets: vec![0.0],
            balance: starting_balance,
        }
    }

    /// Getter method for the players current balance.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn hands(&self) -> &[Hand] {
        &self.hands
    }

    pub fn bets(&self) -> &[f64] {
        &self.bets
    }

    pub fn hand(&self, index: usize) -> Result<&Hand, BlackjackGameError> {
        self.hands
            .get(index)
            .ok_or(BlackjackGameError::InvalidHandIndex(index))
    }

    pub fn hand_mut(&mut self, index: usize) -> Result<&mut Hand, BlackjackGameError> {
        self.hands
            .get_mut(index)
            .ok_or(BlackjackGameError::InvalidHandIndex(index))
    }

    pub fn bet(&self, index: usize) -> Result<f64, BlackjackGameError> {
        self.bets
            .get(index)
            .copied()
            .ok_or(BlackjackGameError::InvalidHandIndex(index))
    }

    /// Sum of the Hi-Lo weights of every card across all of the player's hands.
    pub fn running_count(&self) -> i32 {
        self.hands.iter().map(|hand| hand.running_count()).sum()
    }

    fn check_funds(&self, amount: f64) -> Result<(), BlackjackGameError> {
        if amount > self.balance {
            return Err(BlackjackGameError::InsufficientFunds {
                requested: amount,
                bankroll: self.balance,
            });
        }
        Ok(())
    }

    /// Places a bet of `amount` on the hand at `index`, debiting the bankroll.
    /// Nothing changes if the bankroll cannot cover the bet.
    pub fn place_bet(&mut self, amount: f64, index: usize) -> Result<(), BlackjackGameError> {
        if index >= self.hands.len() {
            return Err(BlackjackGameError::InvalidHandIndex(index));
        }
        self.check_funds(amount)?;
        self.balance -= amount;
        self.bets[index] = amount;
        Ok(())
    }

    /// Returns true if the hand at `index` can be doubled and the bankroll covers a second bet.
    pub fn can_double_down(&self, index: usize) -> bool {
        match (self.hands.get(index), self.bets.get(index)) {
            (Some(hand), Some(&bet)) => hand.can_double_down() && bet <= self.balance,
            _ => false,
        }
    }

    /// Doubles the bet on the hand at `index` and draws its one remaining card.
    /// Returns the drawn card, or `None` if the hand was not eligible to double.
    pub fn double_down(
        &mut self,
        shoe: &mut Shoe,
        index: usize,
    ) -> Result<Option<Card>, BlackjackGameError> {
        let bet = self.bet(index)?;
        self.check_funds(bet)?;

        let card = match self.hands[index].double_down(shoe)? {
            Some(card) => card,
            None => return Ok(None),
        };
        self.balance -= bet;
        self.bets[index] = bet * 2.0;
        trace!(index, %card, "doubled down");
        Ok(Some(card))
    }

    /// Returns true if the hand at `index` is a pair, there is room for another hand and the
    /// bankroll covers the extra bet.
    pub fn can_split(&self, index: usize) -> bool {
        match (self.hands.get(index), self.bets.get(index)) {
            (Some(hand), Some(&bet)) => {
                hand.hand_type() == HandType::Pair
                    && self.hands.len() < MAX_HANDS
                    && bet <= self.balance
            }
            _ => false,
        }
    }

    /// Splits the pair at `index` into two hands, each keeping one of the original cards and
    /// receiving a fresh card from `shoe`. The first new hand replaces the original, the second
    /// is appended along with a copy of the bet. Does nothing unless the hand is a pair and fewer
    /// than `MAX_HANDS` hands are held. Returns the cards drawn.
    pub fn split_hand(
        &mut self,
        shoe: &mut Shoe,
        index: usize,
    ) -> Result<Vec<Card>, BlackjackGameError> {
        let hand = self.hand(index)?;
        if hand.hand_type() != HandType::Pair || self.hands.len() >= MAX_HANDS {
            return Ok(vec![]);
        }
        let (first, second) = (hand.cards()[0], hand.cards()[1]);
        let bet = self.bet(index)?;
        self.check_funds(bet)?;

        let drawn = vec![shoe.draw()?, shoe.draw()?];
        let mut first_hand = Hand::new();
        first_hand.add_card(first);
        first_hand.add_card(drawn[0]);
        let mut second_hand = Hand::new();
        second_hand.add_card(second);
        second_hand.add_card(drawn[1]);

        self.balance -= bet;
        self.hands[index] = first_hand;
        self.hands.push(second_hand);
        self.bets.push(bet);
        trace!(index, hands = self.hands.len(), "split hand");
        Ok(drawn)
    }

    /// Method for receiving winnings.
    pub fn add_winnings(&mut self, amount: f64) {
        self.balance += amount;
    }

    /// Hands any outstanding bets back to the bankroll, used when a round has to be abandoned.
    pub fn refund_bets(&mut self) {
        let outstanding: f64 = self.bets.iter().sum();
        self.balance += outstanding;
        self.bets.iter_mut().for_each(|bet| *bet = 0.0);
    }

    /// Discards all hands and bets, leaving a single empty hand with a bet of zero.
    pub fn reset_hands(&mut self) {
        self.hands = vec![Hand::new()];
        self.bets = vec![0.0];
    }

    #[cfg(test)]
    pub(crate) fn push_bet(&mut self, amount: f64) {
        self.bets.push(amount);
    }
}

impl Display for PlayerSim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hands = self
            .hands
            .iter()
            .map(|hand| hand.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        write!(
            f,
            "{:<21}{}\n\
             {:<21}{:?}\n\
             {:<21}${:.2}",
            "hands:", hands, "bets:", self.bets, "balance:", self.balance,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_lib::{Rank, Suit};

    fn card(rank: Rank) -> Card {
        Card::new(rank, Suit::Clubs)
    }

    fn player_with(ranks: &[Rank], balance: f64, bet: f64) -> PlayerSim {
        let mut player = PlayerSim::new(balance);
        player.place_bet(bet, 0).unwrap();
        for &rank in ranks {
            player.hand_mut(0).unwrap().add_card(card(rank));
        }
        player
    }

    #[test]
    fn place_bet_debits_bankroll() {
        let mut player = PlayerSim::new(100.0);
        player.place_bet(25.0, 0).unwrap();
        assert_eq!(player.balance(), 75.0);
        assert_eq!(player.bets(), &[25.0]);
    }

    #[test]
    fn place_bet_beyond_bankroll_changes_nothing() {
        let mut player = PlayerSim::new(10.0);
        let err = player.place_bet(25.0, 0).unwrap_err();
        assert_eq!(
            err,
            BlackjackGameError::InsufficientFunds {
                requested: 25.0,
                bankroll: 10.0
            }
        );
        assert_eq!(player.balance(), 10.0);
        assert_eq!(player.bets(), &[0.0]);
        assert_eq!(
            player.place_bet(1.0, 3),
            Err(BlackjackGameError::InvalidHandIndex(3))
        );
    }

    #[test]
    fn double_down_doubles_bet_and_draws_once() {
        let mut shoe = Shoe::stacked(vec![card(Rank::Nine), card(Rank::Two)], 0);
        let mut player = player_with(&[Rank::Five, Rank::Six], 100.0, 10.0);
        let drawn = player.double_down(&mut shoe, 0).unwrap();
        assert_eq!(drawn, Some(card(Rank::Nine)));
        assert_eq!(player.balance(), 80.0);
        assert_eq!(player.bets(), &[20.0]);
        assert_eq!(player.hands()[0].value(), 20);
        assert!(player.hands()[0].is_doubled());
        assert!(!player.can_double_down(0));
    }

    #[test]
    fn double_down_without_funds_is_rejected() {
        let mut shoe = Shoe::stacked(vec![card(Rank::Nine)], 0);
        let mut player = player_with(&[Rank::Five, Rank::Six], 15.0, 10.0);
        assert!(!player.can_double_down(0));
        assert!(player.double_down(&mut shoe, 0).is_err());
        assert_eq!(player.balance(), 5.0);
        assert_eq!(player.bets(), &[10.0]);
        assert_eq!(player.hands()[0].len(), 2);
        assert_eq!(shoe.remaining_cards(), 1);
    }

    #[test]
    fn splitting_eights() {
        let mut shoe = Shoe::stacked(vec![card(Rank::Three), card(Rank::King)], 0);
        let mut player = player_with(&[Rank::Eight, Rank::Eight], 100.0, 10.0);
        assert!(player.can_split(0));

        let drawn = player.split_hand(&mut shoe, 0).unwrap();
        assert_eq!(drawn, vec![card(Rank::Three), card(Rank::King)]);
        assert_eq!(player.hands().len(), 2);
        assert_eq!(player.bets(), &[10.0, 10.0]);
        assert_eq!(player.balance(), 80.0);
        assert_eq!(player.hands()[0].len(), 2);
        assert_eq!(player.hands()[0].value(), 11);
        assert_eq!(player.hands()[1].len(), 2);
        assert_eq!(player.hands()[1].value(), 18);
    }

    #[test]
    fn split_of_non_pair_is_a_no_op() {
        let mut shoe = Shoe::stacked(vec![card(Rank::Three), card(Rank::King)], 0);
        let mut player = player_with(&[Rank::Eight, Rank::Nine], 100.0, 10.0);
        assert!(!player.can_split(0));
        assert_eq!(player.split_hand(&mut shoe, 0), Ok(vec![]));
        assert_eq!(player.hands().len(), 1);
        assert_eq!(player.balance(), 90.0);
        assert_eq!(shoe.remaining_cards(), 2);
    }

    #[test]
    fn split_stops_at_four_hands() {
        let cards = vec![card(Rank::Eight); 6];
        let mut shoe = Shoe::stacked(cards, 0);
        let mut player = player_with(&[Rank::Eight, Rank::Eight], 1000.0, 10.0);

        player.split_hand(&mut shoe, 0).unwrap();
        player.split_hand(&mut shoe, 0).unwrap();
        player.split_hand(&mut shoe, 1).unwrap();
        assert_eq!(player.hands().len(), MAX_HANDS);
        assert!(player.hands()[0].hand_type() == HandType::Pair);
        assert!(!player.can_split(0));

        assert_eq!(player.split_hand(&mut shoe, 0), Ok(vec![]));
        assert_eq!(player.hands().len(), MAX_HANDS);
        assert_eq!(player.bets().len(), MAX_HANDS);
        assert_eq!(player.balance(), 960.0);
    }

    #[test]
    fn refund_and_reset() {
        let mut player = player_with(&[Rank::Ace, Rank::Two], 100.0, 10.0);
        assert_eq!(player.running_count(), 0);
        player.refund_bets();
        assert_eq!(player.balance(), 100.0);

        player.reset_hands();
        assert_eq!(player.hands().len(), 1);
        assert!(player.hands()[0].is_empty());
        assert_eq!(player.bets(), &[0.0]);
    }
}
