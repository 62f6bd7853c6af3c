use blackjack_lib::Hand;
use std::fmt::Display;

/// The result of comparing one player hand with the dealer's hand at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandOutcome {
    PlayerBlackjack,
    BlackjackPush,
    DealerBlackjack,
    PlayerBust,
    DealerBust,
    PlayerWin,
    Push,
    DealerWin,
}

impl HandOutcome {
    /// Settles `player` against `dealer`. The checks run in a fixed order: blackjacks first,
    /// then a player bust, then a dealer bust, then the totals.
    pub fn evaluate(player: &Hand, dealer: &Hand) -> HandOutcome {
        match (player.is_blackjack(), dealer.is_blackjack()) {
            (true, false) => return HandOutcome::PlayerBlackjack,
            (true, true) => return HandOutcome::BlackjackPush,
            (false, true) => return HandOutcome::DealerBlackjack,
            (false, false) => {}
        }

        if player.is_busted() {
            HandOutcome::PlayerBust
        } else if dealer.is_busted() {
            HandOutcome::DealerBust
        } else if player.value() > dealer.value() {
            HandOutcome::PlayerWin
        } else if player.value() == dealer.value() {
            HandOutcome::Push
        } else {
            HandOutcome::DealerWin
        }
    }

    /// The amount returned to the bankroll per unit bet, stake included.
    pub fn payout_multiplier(self) -> f64 {
        match self {
            HandOutcome::PlayerBlackjack => 2.5,
            HandOutcome::DealerBust | HandOutcome::PlayerWin => 2.0,
            HandOutcome::BlackjackPush | HandOutcome::Push => 1.0,
            HandOutcome::DealerBlackjack | HandOutcome::PlayerBust | HandOutcome::DealerWin => 0.0,
        }
    }

    pub fn is_win(self) -> bool {
        self.payout_multiplier() > 1.0
    }

    pub fn is_push(self) -> bool {
        self.payout_multiplier() == 1.0
    }

    pub fn is_loss(self) -> bool {
        self.payout_multiplier() == 0.0
    }
}

impl Display for HandOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            HandOutcome::PlayerBlackjack => "blackjack, the player wins 3:2",
            HandOutcome::BlackjackPush => "both have blackjack, push",
            HandOutcome::DealerBlackjack => "dealer blackjack, the dealer wins",
            HandOutcome::PlayerBust => "the dealer wins, the player busted",
            HandOutcome::DealerBust => "the player wins, the dealer busted",
            HandOutcome::PlayerWin => "the player wins",
            HandOutcome::Push => "push",
            HandOutcome::DealerWin => "the dealer wins",
        };
        write!(f, "{}", message)
    }
}

/// Settlement of a single player hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandResult {
    pub index: usize,
    pub outcome: HandOutcome,
    pub bet: f64,
    pub payout: f64,
    pub player_value: u8,
    pub dealer_value: u8,
}

impl Display for HandResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hand #{}: {} ({} vs {}), bet {:.2}, paid {:.2}",
            self.index + 1,
            self.outcome,
            self.player_value,
            self.dealer_value,
            self.bet,
            self.payout
        )
    }
}

/// Everything recorded about one completed round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    pub bet: f64,
    pub true_count: i32,
    pub results: Vec<HandResult>,
    pub reshuffled: bool,
}

impl RoundReport {
    pub fn wins(&self) -> u32 {
        self.results.iter().filter(|r| r.outcome.is_win()).count() as u32
    }

    pub fn pushes(&self) -> u32 {
        self.results.iter().filter(|r| r.outcome.is_push()).count() as u32
    }

    pub fn losses(&self) -> u32 {
        self.results.iter().filter(|r| r.outcome.is_loss()).count() as u32
    }

    pub fn player_blackjacks(&self) -> u32 {
        self.results
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    HandOutcome::PlayerBlackjack | HandOutcome::BlackjackPush
                )
            })
            .count() as u32
    }

    pub fn total_payout(&self) -> f64 {
        self.results.iter().map(|r| r.payout).sum()
    }
}

impl Display for RoundReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines = self
            .results
            .iter()
            .map(|result| result.to_string())
            .collect::<Vec<String>>()
            .join("\n");
        write!(f, "{}", lines)
    }
}
