//! Module that focuses on the simulation of a single table of blackjack. In other words,
//! this module provides everything needed to play rounds of blackjack for a card counting player
//! who follows basic strategy and sizes bets with the Kelly criterion.

pub mod dealer;
pub mod player;
pub mod settlement;
pub mod strategy;
pub mod prelude {
    pub use super::BlackjackGameSim;
    pub use crate::game::dealer::DealerSim;
    pub use crate::game::player::{PlayerSim, MAX_HANDS};
    pub use crate::game::settlement::{HandOutcome, HandResult, RoundReport};
    pub use crate::game::strategy::prelude::*;
    pub use blackjack_lib::{BlackjackGameError, Card, Hand, Shoe};
}

pub use prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, trace, warn};

/// Checks the table parameters shared by every constructor.
pub(crate) fn validate_table(
    num_decks: usize,
    penetration: f64,
    starting_bankroll: f64,
) -> Result<(), BlackjackGameError> {
    if num_decks < 1 {
        return Err(BlackjackGameError::InvalidConfig(
            "the shoe needs at least one deck".to_string(),
        ));
    }
    if !(penetration > 0.0 && penetration < 1.0) {
        return Err(BlackjackGameError::InvalidConfig(format!(
            "penetration must be strictly between 0 and 1, got {}",
            penetration
        )));
    }
    if !starting_bankroll.is_finite() || starting_bankroll < 0.0 {
        return Err(BlackjackGameError::InvalidConfig(format!(
            "starting bankroll must be a non-negative number, got {}",
            starting_bankroll
        )));
    }
    Ok(())
}

/// Struct that plays rounds of blackjack between one counting player and the dealer.
/// The game owns the shoe, both actors, the counter and the rng used for every reshuffle,
/// so a round either runs to completion or leaves the table as if it never started.
/// `C` keeps the count and `B` sizes the bets, by default Hi-Lo with Kelly bets.
pub struct BlackjackGameSim<C = HiLo, B = KellyBettingStrategy>
where
    C: CountingStrategy,
    B: BettingStrategy,
{
    shoe: Shoe,
    player: PlayerSim,
    dealer: DealerSim,
    betting: B,
    counter: C,
    num_decks: usize,
    penetration: f64,
    soft_seventeen: bool,
    rng: StdRng,
    rounds_played: u32,
}

impl BlackjackGameSim<HiLo, KellyBettingStrategy> {
    /// Associated method for building a new game with an entropy seeded rng.
    /// `penetration` is the fraction of the shoe left undealt when the cut card comes out and
    /// `soft_seventeen` makes the dealer hit a soft 17.
    pub fn new(
        num_decks: usize,
        penetration: f64,
        soft_seventeen: bool,
        starting_bankroll: f64,
    ) -> Result<BlackjackGameSim, BlackjackGameError> {
        BlackjackGameSim::with_rng(
            num_decks,
            penetration,
            soft_seventeen,
            starting_bankroll,
            StdRng::from_entropy(),
        )
    }

    /// Same as `new` but every shuffle is drawn from `rng`, a seeded rng makes the game reproducible.
    pub fn with_rng(
        num_decks: usize,
        penetration: f64,
        soft_seventeen: bool,
        starting_bankroll: f64,
        rng: StdRng,
    ) -> Result<BlackjackGameSim, BlackjackGameError> {
        BlackjackGameSim::with_strategies(
            num_decks,
            penetration,
            soft_seventeen,
            starting_bankroll,
            rng,
            HiLo::new(),
            KellyBettingStrategy::default(),
        )
    }
}

impl<C, B> BlackjackGameSim<C, B>
where
    C: CountingStrategy,
    B: BettingStrategy,
{
    /// Builds a game that counts with `counter` and sizes bets with `betting`.
    pub fn with_strategies(
        num_decks: usize,
        penetration: f64,
        soft_seventeen: bool,
        starting_bankroll: f64,
        mut rng: StdRng,
        counter: C,
        betting: B,
    ) -> Result<BlackjackGameSim<C, B>, BlackjackGameError> {
        validate_table(num_decks, penetration, starting_bankroll)?;
        let shoe = Shoe::with_rng(num_decks, penetration, &mut rng);
        Ok(BlackjackGameSim {
            shoe,
            player: PlayerSim::new(starting_bankroll),
            dealer: DealerSim::new(),
            betting,
            counter,
            num_decks,
            penetration,
            soft_seventeen,
            rng,
            rounds_played: 0,
        })
    }

    /// Replaces the current shoe, e.g. with a stacked one. Reshuffles still build shoes from the
    /// deck count and penetration the game was created with.
    pub fn with_shoe(mut self, shoe: Shoe) -> Self {
        self.shoe = shoe;
        self.counter.reset();
        self
    }

    pub fn with_betting_strategy(mut self, betting: B) -> Self {
        self.betting = betting;
        self
    }

    pub fn player(&self) -> &PlayerSim {
        &self.player
    }

    pub fn dealer(&self) -> &DealerSim {
        &self.dealer
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    pub fn betting_strategy(&self) -> &B {
        &self.betting
    }

    pub fn soft_seventeen(&self) -> bool {
        self.soft_seventeen
    }

    pub fn running_count(&self) -> i32 {
        self.counter.running_count()
    }

    /// The running count per remaining deck, rounded down.
    pub fn true_count(&self) -> i32 {
        self.counter.true_count(self.shoe.remaining_decks())
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    /// The bet the player would place if a round started now.
    pub fn next_bet(&self) -> f64 {
        self.betting
            .bet(self.true_count() as f64, self.player.balance())
    }

    /// Plays one complete round and returns the settlement summary, one line per player hand.
    pub fn play_round(&mut self) -> Result<String, BlackjackGameError> {
        self.play_round_report().map(|report| report.to_string())
    }

    /// Plays one complete round and returns the full settlement report.
    /// If the bet cannot be placed nothing changes. Any failure after the bet is placed aborts
    /// the round: bets are refunded, hands are cleared and a fresh shoe is shuffled.
    pub fn play_round_report(&mut self) -> Result<RoundReport, BlackjackGameError> {
        let (bet, true_count) = self.place_initial_bet()?;
        match self.play_placed_round(bet, true_count) {
            Ok(report) => {
                self.rounds_played += 1;
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, round = self.rounds_played + 1, "round aborted");
                self.abort_round();
                Err(e)
            }
        }
    }

    fn place_initial_bet(&mut self) -> Result<(f64, i32), BlackjackGameError> {
        let true_count = self.true_count();
        let bet = self.betting.bet(true_count as f64, self.player.balance());
        self.player.place_bet(bet, 0)?;
        debug!(
            round = self.rounds_played + 1,
            bet,
            true_count,
            balance = self.player.balance(),
            "bet placed"
        );
        Ok((bet, true_count))
    }

    fn play_placed_round(
        &mut self,
        bet: f64,
        true_count: i32,
    ) -> Result<RoundReport, BlackjackGameError> {
        self.deal()?;
        self.player_turn()?;
        self.dealer_turn()?;
        let results = self.settle()?;
        let reshuffled = self.reset();

        let report = RoundReport {
            bet,
            true_count,
            results,
            reshuffled,
        };
        debug!(round = self.rounds_played + 1, "\n{}", report);
        Ok(report)
    }

    /// Draws a card from the shoe and counts it.
    fn draw(&mut self) -> Result<Card, BlackjackGameError> {
        let card = self.shoe.draw()?;
        self.counter.update(&card);
        Ok(card)
    }

    fn deal(&mut self) -> Result<(), BlackjackGameError> {
        let card = self.draw()?;
        self.player.hand_mut(0)?.add_card(card);
        let card = self.draw()?;
        self.player.hand_mut(0)?.add_card(card);
        let card = self.draw()?;
        self.dealer.hand_mut().add_card(card);
        let card = self.draw()?;
        self.dealer.hand_mut().add_card(card);
        trace!(player = %self.player.hands()[0], dealer = %self.dealer.hand(), "dealt");
        Ok(())
    }

    /// Plays every player hand in order. Split hands are appended to the end of the hand list, so
    /// they are reached by the same loop.
    fn player_turn(&mut self) -> Result<(), BlackjackGameError> {
        let mut index = 0;
        while index < self.player.hands().len() {
            self.play_hand(index)?;
            index += 1;
        }
        Ok(())
    }

    fn play_hand(&mut self, index: usize) -> Result<(), BlackjackGameError> {
        loop {
            match self.playable_move(index)? {
                None | Some(Move::Stand) => return Ok(()),
                Some(Move::Hit) => {
                    let card = self.draw()?;
                    self.player.hand_mut(index)?.add_card(card);
                }
                Some(Move::Double) => {
                    if let Some(card) = self.player.double_down(&mut self.shoe, index)? {
                        self.counter.update(&card);
                    }
                }
                Some(Move::Split) => {
                    for card in self.player.split_hand(&mut self.shoe, index)? {
                        self.counter.update(&card);
                    }
                }
            }
        }
    }

    /// The basic strategy move for the hand at `index`, adjusted to what the player can actually
    /// do. A split that is not allowed falls back to playing the pair by its total and a double
    /// that cannot be afforded becomes a hit.
    fn playable_move(&self, index: usize) -> Result<Option<Move>, BlackjackGameError> {
        let strategy = basic_strategy();
        let hand = self.player.hand(index)?;
        let dealer_hand = self.dealer.hand();

        let next = match strategy.player_next_move(hand, dealer_hand) {
            Some(Move::Split) if !self.player.can_split(index) => {
                if self.player.hands().len() >= MAX_HANDS {
                    debug!(index, "hand limit reached, playing the pair by its total");
                } else {
                    warn!(
                        index,
                        balance = self.player.balance(),
                        "cannot afford to split, playing the pair by its total"
                    );
                }
                strategy.unsplit_move(hand, dealer_hand)
            }
            other => other,
        };

        Ok(match next {
            Some(Move::Double) if !self.player.can_double_down(index) => {
                warn!(
                    index,
                    balance = self.player.balance(),
                    "cannot afford to double down, hitting instead"
                );
                Some(Move::Hit)
            }
            other => other,
        })
    }

    fn dealer_turn(&mut self) -> Result<(), BlackjackGameError> {
        while let Some(Move::Hit) =
            dealer_next_move(self.player.hands(), self.dealer.hand(), self.soft_seventeen)
        {
            let card = self.draw()?;
            self.dealer.hand_mut().add_card(card);
        }
        Ok(())
    }

    /// Compares every player hand with the dealer's and pays out the winnings.
    fn settle(&mut self) -> Result<Vec<HandResult>, BlackjackGameError> {
        let (hands, bets) = (self.player.hands().len(), self.player.bets().len());
        if hands != bets {
            return Err(BlackjackGameError::HandBetMismatch { hands, bets });
        }

        let dealer_hand = self.dealer.hand();
        let results = self
            .player
            .hands()
            .iter()
            .zip(self.player.bets())
            .enumerate()
            .map(|(index, (hand, &bet))| {
                let outcome = HandOutcome::evaluate(hand, dealer_hand);
                HandResult {
                    index,
                    outcome,
                    bet,
                    payout: bet * outcome.payout_multiplier(),
                    player_value: hand.value(),
                    dealer_value: dealer_hand.value(),
                }
            })
            .collect::<Vec<HandResult>>();

        let winnings: f64 = results.iter().map(|result| result.payout).sum();
        self.player.add_winnings(winnings);
        Ok(results)
    }

    /// Clears the table for the next round. Returns true if the cut card had come out and the
    /// shoe was replaced.
    fn reset(&mut self) -> bool {
        self.player.reset_hands();
        self.dealer.reset_hand();
        if self.shoe.reached_cut_card() {
            self.reshuffle();
            return true;
        }
        false
    }

    fn reshuffle(&mut self) {
        self.shoe = Shoe::with_rng(self.num_decks, self.penetration, &mut self.rng);
        self.counter.reset();
        info!(
            num_decks = self.num_decks,
            penetration = self.penetration,
            "reshuffled shoe"
        );
    }

    fn abort_round(&mut self) {
        self.player.refund_bets();
        self.player.reset_hands();
        self.dealer.reset_hand();
        self.reshuffle();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use blackjack_lib::{Rank, Suit, CARDS_PER_DECK};

    const FILLER: usize = 20;

    fn card(rank: Rank) -> Card {
        Card::new(rank, Suit::Spades)
    }

    /// A game whose shoe deals `ranks` first, followed by enough filler that the cut card never
    /// comes out during a single round.
    fn stacked_cards(ranks: &[Rank]) -> Shoe {
        let mut cards = ranks.iter().map(|&rank| card(rank)).collect::<Vec<Card>>();
        cards.extend(std::iter::repeat(card(Rank::Seven)).take(FILLER));
        Shoe::stacked(cards, 0)
    }

    fn stacked_game(ranks: &[Rank], soft_seventeen: bool, bankroll: f64) -> BlackjackGameSim {
        BlackjackGameSim::with_rng(6, 0.25, soft_seventeen, bankroll, StdRng::seed_from_u64(1))
            .unwrap()
            .with_shoe(stacked_cards(ranks))
    }

    /// Bets the same amount every round regardless of the count.
    struct FlatBet(f64);

    impl BettingStrategy for FlatBet {
        fn bet(&self, _true_count: f64, balance: f64) -> f64 {
            f64::min(self.0, balance)
        }
    }

    fn flat_bet_game(ranks: &[Rank], bankroll: f64, bet: f64) -> BlackjackGameSim<HiLo, FlatBet> {
        BlackjackGameSim::with_strategies(
            6,
            0.25,
            false,
            bankroll,
            StdRng::seed_from_u64(1),
            HiLo::new(),
            FlatBet(bet),
        )
        .unwrap()
        .with_shoe(stacked_cards(ranks))
    }

    #[test]
    fn rejects_invalid_tables() {
        assert!(BlackjackGameSim::new(0, 0.25, false, 100.0).is_err());
        assert!(BlackjackGameSim::new(6, 0.0, false, 100.0).is_err());
        assert!(BlackjackGameSim::new(6, 1.0, false, 100.0).is_err());
        assert!(BlackjackGameSim::new(6, 0.25, false, -1.0).is_err());
        assert!(BlackjackGameSim::new(6, 0.25, false, f64::NAN).is_err());
        assert!(BlackjackGameSim::new(6, 0.25, false, 0.0).is_ok());
    }

    #[test]
    fn blackjack_pays_three_to_two() {
        let mut game = stacked_game(&[Rank::Ace, Rank::King, Rank::Ten, Rank::Eight], false, 6000.0);
        assert_eq!(game.next_bet(), 10.0);

        let summary = game.play_round().unwrap();
        assert_eq!(
            summary,
            "hand #1: blackjack, the player wins 3:2 (21 vs 18), bet 10.00, paid 25.00"
        );
        assert_eq!(game.player().balance(), 6015.0);
        assert_eq!(game.running_count(), -3);
        assert_eq!(game.shoe().remaining_cards(), FILLER);
        assert_eq!(game.rounds_played(), 1);

        // the table is cleared for the next round
        assert_eq!(game.player().hands().len(), 1);
        assert!(game.player().hands()[0].is_empty());
        assert!(game.dealer().hand().is_empty());
    }

    #[test]
    fn dealer_hits_soft_seventeen_when_configured() {
        let ranks = [Rank::Ten, Rank::Nine, Rank::Ace, Rank::Six, Rank::Two];

        let mut hitting = stacked_game(&ranks, true, 6000.0);
        let report = hitting.play_round_report().unwrap();
        assert_eq!(report.results[0].outcome, HandOutcome::Push);
        assert_eq!(report.results[0].dealer_value, 19);
        assert_eq!(hitting.player().balance(), 6000.0);
        assert_eq!(hitting.shoe().remaining_cards(), FILLER);

        let mut standing = stacked_game(&ranks, false, 6000.0);
        let report = standing.play_round_report().unwrap();
        assert_eq!(report.results[0].outcome, HandOutcome::PlayerWin);
        assert_eq!(report.results[0].dealer_value, 17);
        assert_eq!(standing.player().balance(), 6010.0);
        assert_eq!(standing.shoe().remaining_cards(), FILLER + 1);
    }

    #[test]
    fn split_then_double() {
        let ranks = [
            Rank::Eight,
            Rank::Eight,
            Rank::Ten,
            Rank::Seven,
            Rank::Three,
            Rank::Ten,
            Rank::Nine,
        ];
        let mut game = stacked_game(&ranks, false, 6000.0);
        let report = game.play_round_report().unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].player_value, 20);
        assert_eq!(report.results[0].bet, 20.0);
        assert_eq!(report.results[0].payout, 40.0);
        assert_eq!(report.results[1].player_value, 18);
        assert_eq!(report.results[1].bet, 10.0);
        assert_eq!(report.wins(), 2);
        assert_eq!(game.player().balance(), 6030.0);
        // 8 8 10 7 3 10 9
        assert_eq!(game.running_count(), -1);
    }

    #[test]
    fn player_bust_skips_dealer_draws() {
        let ranks = [Rank::Ten, Rank::Six, Rank::Ten, Rank::Six, Rank::Ten];
        let mut game = stacked_game(&ranks, false, 6000.0);
        let report = game.play_round_report().unwrap();
        assert_eq!(report.results[0].outcome, HandOutcome::PlayerBust);
        assert_eq!(report.results[0].dealer_value, 16);
        assert_eq!(game.player().balance(), 5990.0);
        assert_eq!(game.shoe().remaining_cards(), FILLER);
    }

    #[test]
    fn splits_stop_at_the_hand_limit() {
        let ranks = [
            Rank::Eight,
            Rank::Eight,
            Rank::Ten,
            Rank::Seven,
            // three splits, every new hand is another pair of 8s
            Rank::Eight,
            Rank::Eight,
            Rank::Eight,
            Rank::Eight,
            Rank::Eight,
            Rank::Eight,
            // each hand is played as a hard 16 and hits once
            Rank::Two,
            Rank::Two,
            Rank::Two,
            Rank::Two,
        ];
        let mut game = stacked_game(&ranks, false, 6000.0);
        let report = game.play_round_report().unwrap();

        assert_eq!(report.results.len(), MAX_HANDS);
        for result in &report.results {
            assert_eq!(result.bet, 10.0);
            assert_eq!(result.player_value, 18);
            assert_eq!(result.outcome, HandOutcome::PlayerWin);
        }
        assert_eq!(game.player().balance(), 6040.0);
        assert_eq!(game.shoe().remaining_cards(), FILLER);
        assert_eq!(game.running_count(), 3);
    }

    #[test]
    fn unaffordable_double_is_played_as_a_hit() {
        // 11 against a 10 doubles, but 40 left cannot cover a second bet of 60
        let ranks = [Rank::Five, Rank::Six, Rank::Ten, Rank::Seven, Rank::Two, Rank::Eight];
        let mut game = flat_bet_game(&ranks, 100.0, 60.0);
        let report = game.play_round_report().unwrap();

        let result = &report.results[0];
        assert_eq!(result.bet, 60.0);
        assert_eq!(result.player_value, 21);
        assert_eq!(result.outcome, HandOutcome::PlayerWin);
        assert_eq!(game.player().balance(), 160.0);
        assert_eq!(game.shoe().remaining_cards(), FILLER);
    }

    #[test]
    fn unaffordable_split_is_played_by_total() {
        let ranks = [Rank::Eight, Rank::Eight, Rank::Ten, Rank::Seven, Rank::Three];
        let mut game = flat_bet_game(&ranks, 100.0, 60.0);
        let report = game.play_round_report().unwrap();

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].bet, 60.0);
        assert_eq!(report.results[0].player_value, 19);
        assert_eq!(game.player().balance(), 160.0);
        assert_eq!(game.shoe().remaining_cards(), FILLER);
    }

    #[test]
    fn losing_a_flat_bet_never_overdraws() {
        // 8 8 split refused, hard 16 hits a 10 and busts
        let ranks = [Rank::Eight, Rank::Eight, Rank::Ten, Rank::Seven, Rank::Ten];
        let mut game = flat_bet_game(&ranks, 100.0, 60.0);
        let report = game.play_round_report().unwrap();
        assert_eq!(report.results[0].outcome, HandOutcome::PlayerBust);
        assert_eq!(game.player().balance(), 40.0);
        assert_eq!(game.betting_strategy().bet(0.0, 40.0), 40.0);
    }

    #[test]
    fn reshuffles_after_cut_card() {
        let cards = [Rank::Ten, Rank::Nine, Rank::Ten, Rank::Eight]
            .iter()
            .map(|&rank| card(rank))
            .collect::<Vec<Card>>();
        let mut game = BlackjackGameSim::with_rng(6, 0.25, false, 6000.0, StdRng::seed_from_u64(3))
            .unwrap()
            .with_shoe(Shoe::stacked(cards, 100));

        let report = game.play_round_report().unwrap();
        assert!(report.reshuffled);
        assert_eq!(game.shoe().remaining_cards(), 6 * CARDS_PER_DECK);
        assert!(!game.shoe().reached_cut_card());
        assert_eq!(game.running_count(), 0);
        assert_eq!(game.player().balance(), 6010.0);
    }

    #[test]
    fn count_carries_over_until_reshuffle() {
        let mut game = stacked_game(&[Rank::Two, Rank::Three, Rank::Four, Rank::Ten], false, 6000.0);
        let report = game.play_round_report().unwrap();
        assert!(!report.reshuffled);
        // 2 3 4 10 then the player hits 7s from the filler
        assert_eq!(game.running_count(), 2);
        assert_eq!(game.counter().total_cards_counted() as usize, 24 - game.shoe().remaining_cards());
    }

    #[test]
    fn mismatched_bets_abort_the_round() {
        let mut game = stacked_game(&[Rank::Ten, Rank::Nine, Rank::Ten, Rank::Eight], false, 6000.0);
        game.player.push_bet(0.0);

        let err = game.play_round().unwrap_err();
        assert_eq!(err, BlackjackGameError::HandBetMismatch { hands: 1, bets: 2 });
        assert_eq!(game.player().balance(), 6000.0);
        assert_eq!(game.player().bets(), &[0.0]);
        assert!(game.player().hands()[0].is_empty());
        assert!(game.dealer().hand().is_empty());
        assert_eq!(game.shoe().remaining_cards(), 6 * CARDS_PER_DECK);
        assert_eq!(game.running_count(), 0);
        assert_eq!(game.rounds_played(), 0);
    }

    #[test]
    fn empty_shoe_aborts_the_round() {
        let cards = vec![card(Rank::Ten), card(Rank::Nine)];
        let mut game = BlackjackGameSim::with_rng(1, 0.25, false, 600.0, StdRng::seed_from_u64(5))
            .unwrap()
            .with_shoe(Shoe::stacked(cards, 0));

        assert_eq!(game.play_round(), Err(BlackjackGameError::EmptyShoe));
        assert_eq!(game.player().balance(), 600.0);
        assert_eq!(game.shoe().remaining_cards(), CARDS_PER_DECK);
    }

    #[test]
    fn seeded_games_are_reproducible() {
        let play = |seed: u64| {
            let mut game =
                BlackjackGameSim::with_rng(6, 0.25, true, 300_000.0, StdRng::seed_from_u64(seed))
                    .unwrap();
            for _ in 0..500 {
                game.play_round().unwrap();
            }
            game
        };

        let first = play(42);
        let second = play(42);
        assert_eq!(first.rounds_played(), 500);
        assert_eq!(first.player().balance(), second.player().balance());
        assert_eq!(first.running_count(), second.running_count());
        assert!(first.player().balance().is_finite());
        assert!(first.player().balance() >= 0.0);
    }
}
