pub mod game;
pub mod write;

pub use game::prelude::*;
pub use game::strategy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;
use tracing::{info, warn};

pub mod prelude {
    pub use super::{
        game::prelude::*, BlackjackSimulator, BlackjackSimulatorConfig,
        BlackjackSimulatorConfigBuilder, ProfitPoint, SimulationError, SimulationSummary,
    };
}

/// Simple struct for recording all of the interesting data points accumulated during a simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub wins: u32,
    pub pushes: u32,
    pub losses: u32,
    pub player_blackjacks: u32,
    pub rounds_played: u64,
    pub starting_bankroll: f64,
    pub final_bankroll: f64,
    pub profit: f64,
    pub ended_early: bool,
}

impl SimulationSummary {
    /// Number of settled player hands, split hands included.
    pub fn total_hands(&self) -> u32 {
        self.wins + self.pushes + self.losses
    }

    fn ratio(&self, n: u32) -> f64 {
        match self.total_hands() {
            0 => 0.0,
            total => n as f64 / total as f64,
        }
    }
}

impl Display for SimulationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const WIDTH: usize = 80;
        const TEXT_WIDTH: usize = "number of player blackjacks".len() + 20;
        const NUM_WIDTH: usize = WIDTH - TEXT_WIDTH;
        let average_profit = match self.rounds_played {
            0 => 0.0,
            rounds => self.profit / rounds as f64,
        };
        write!(
            f,
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
             {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
             {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
             {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
             {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
             {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
             {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
             {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
             {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
             {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
             {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
             {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
             {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
             {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n",
            "rounds played",
            self.rounds_played,
            "hands played",
            self.total_hands(),
            "hands won",
            self.wins,
            "hands pushed",
            self.pushes,
            "hands lost",
            self.losses,
            "number of player blackjacks",
            self.player_blackjacks,
            "win percentage",
            self.ratio(self.wins),
            "push percentage",
            self.ratio(self.pushes),
            "loss percentage",
            self.ratio(self.losses),
            "starting bankroll",
            self.starting_bankroll,
            "final bankroll",
            self.final_bankroll,
            "profit",
            self.profit,
            "average profit per round",
            average_profit,
            "ended early",
            self.ended_early,
        )
    }
}

/// Profit made over one batch of rounds, tagged with the number of rounds played so far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitPoint {
    pub played_hands: u64,
    pub profit: f64,
}

impl Display for ProfitPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "played hands: {:>10}    profit: {:>14.2}",
            self.played_hands, self.profit
        )
    }
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    GameError(#[from] BlackjackGameError),
    #[error("unable to write output: {0}")]
    WriteError(#[from] std::io::Error),
    #[error("unable to serialize output: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Struct for running batches of rounds for a single counting player.
/// A `BlackjackSimulator` object's main purpose is convenience, it wraps a `BlackjackGameSim` and
/// records the profit made per batch along with win, push and loss tallies across every batch.
pub struct BlackjackSimulator {
    config: BlackjackSimulatorConfig,
    game: BlackjackGameSim,
    outputs: Vec<ProfitPoint>,
    played_hands: u64,
    wins: u32,
    pushes: u32,
    losses: u32,
    player_blackjacks: u32,
    ended_early: bool,
}

impl BlackjackSimulator {
    /// Associated method for building a simulator from `config`, fails if the config is invalid.
    pub fn new(config: BlackjackSimulatorConfig) -> Result<BlackjackSimulator, SimulationError> {
        let game = BlackjackSimulator::build_game(&config)?;
        Ok(BlackjackSimulator {
            config,
            game,
            outputs: vec![],
            played_hands: 0,
            wins: 0,
            pushes: 0,
            losses: 0,
            player_blackjacks: 0,
            ended_early: false,
        })
    }

    fn build_game(config: &BlackjackSimulatorConfig) -> Result<BlackjackGameSim, BlackjackGameError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(BlackjackGameSim::with_rng(
            config.num_decks,
            config.penetration,
            config.soft_seventeen,
            config.starting_bankroll,
            rng,
        )?
        .with_betting_strategy(KellyBettingStrategy::new(config.max_bet)))
    }

    pub fn config(&self) -> &BlackjackSimulatorConfig {
        &self.config
    }

    pub fn game(&self) -> &BlackjackGameSim {
        &self.game
    }

    /// Every profit point recorded so far, one per call to `run_batch`.
    pub fn outputs(&self) -> &[ProfitPoint] {
        &self.outputs
    }

    pub fn ended_early(&self) -> bool {
        self.ended_early
    }

    /// Plays a single round and records its outcome. Returns `None` once the player can no longer
    /// place a bet, after which the simulation is over until it is reset.
    pub fn play_round(&mut self) -> Result<Option<RoundReport>, SimulationError> {
        if self.ended_early {
            return Ok(None);
        }
        if self.game.next_bet() <= 0.0 {
            info!(balance = self.game.player().balance(), "bankroll exhausted");
            self.ended_early = true;
            return Ok(None);
        }

        match self.game.play_round_report() {
            Ok(report) => {
                self.wins += report.wins();
                self.pushes += report.pushes();
                self.losses += report.losses();
                self.player_blackjacks += report.player_blackjacks();
                Ok(Some(report))
            }
            Err(BlackjackGameError::InsufficientFunds { requested, bankroll }) => {
                info!(requested, bankroll, "unable to cover the next bet");
                self.ended_early = true;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Plays `plays` rounds, or fewer if the bankroll runs out, and records the profit made.
    /// If a round fails the rounds settled before it are still recorded, then the error is returned.
    pub fn run_batch(&mut self, plays: u32) -> Result<ProfitPoint, SimulationError> {
        let before = self.game.player().balance();
        let mut played = 0;
        let mut failure = None;
        for _ in 0..plays {
            match self.play_round() {
                Ok(Some(_)) => played += 1,
                Ok(None) => break,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        self.played_hands += played;

        let point = ProfitPoint {
            played_hands: self.played_hands,
            profit: self.game.player().balance() - before,
        };
        info!(
            played,
            played_hands = point.played_hands,
            profit = point.profit,
            "batch complete"
        );
        self.outputs.push(point);

        match failure {
            Some(e) => {
                warn!(error = %e, played, "batch stopped by a failed round");
                Err(e)
            }
            None => Ok(point),
        }
    }

    /// Runs the configured number of batches and returns the summary of everything played.
    pub fn run(&mut self) -> Result<SimulationSummary, SimulationError> {
        for i in 0..self.config.num_simulations {
            let point = self.run_batch(self.config.hands_per_simulation)?;
            if !self.config.silent {
                println!("batch #{:<6}{}", i + 1, point);
            }
            if self.ended_early {
                break;
            }
        }
        Ok(self.summary())
    }

    /// Method to get a `SimulationSummary` object derived from the current data recorded in `self`.
    pub fn summary(&self) -> SimulationSummary {
        let final_bankroll = self.game.player().balance();
        SimulationSummary {
            wins: self.wins,
            pushes: self.pushes,
            losses: self.losses,
            player_blackjacks: self.player_blackjacks,
            rounds_played: self.played_hands,
            starting_bankroll: self.config.starting_bankroll,
            final_bankroll,
            profit: final_bankroll - self.config.starting_bankroll,
            ended_early: self.ended_early,
        }
    }

    /// Method for resetting the state of the simulation, so it can be run again.
    /// A fresh game is built from the config, with a seed the rounds replay identically.
    pub fn reset(&mut self) -> Result<(), SimulationError> {
        self.game = BlackjackSimulator::build_game(&self.config)?;
        self.outputs.clear();
        self.played_hands = 0;
        self.wins = 0;
        self.pushes = 0;
        self.losses = 0;
        self.player_blackjacks = 0;
        self.ended_early = false;
        Ok(())
    }
}

/// Struct for configuring a single `BlackjackSimulator` object.
/// Missing fields take their default values when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackjackSimulatorConfig {
    pub num_decks: usize,
    pub penetration: f64,
    pub soft_seventeen: bool,
    pub starting_bankroll: f64,
    pub max_bet: f64,
    pub hands_per_simulation: u32,
    pub num_simulations: u32,
    pub seed: Option<u64>,
    pub silent: bool,
}

impl BlackjackSimulatorConfig {
    /// Associated method for returning a new `BlackjackSimulatorConfigBuilder` object. Allows
    /// customization of the simulator, i.e. the number of decks, the penetration of the shoe,
    /// the dealer's soft seventeen rule, the player's bankroll and the number of rounds played.
    pub fn new() -> BlackjackSimulatorConfigBuilder {
        BlackjackSimulatorConfigBuilder::default()
    }

    /// Checks that the config describes a playable table.
    pub fn validate(&self) -> Result<(), BlackjackGameError> {
        game::validate_table(self.num_decks, self.penetration, self.starting_bankroll)?;
        if !(self.max_bet >= 0.0) {
            return Err(BlackjackGameError::InvalidConfig(format!(
                "max bet must be a non-negative number, got {}",
                self.max_bet
            )));
        }
        Ok(())
    }
}

impl Default for BlackjackSimulatorConfig {
    /// Returns the standard configuration: six decks dealt to 75%, dealer stands on soft 17.
    fn default() -> Self {
        BlackjackSimulatorConfig::new().build()
    }
}

/// Struct to implement builder pattern for `BlackjackSimulatorConfig`
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackjackSimulatorConfigBuilder {
    num_decks: Option<usize>,
    penetration: Option<f64>,
    soft_seventeen: Option<bool>,
    starting_bankroll: Option<f64>,
    max_bet: Option<f64>,
    hands_per_simulation: Option<u32>,
    num_simulations: Option<u32>,
    seed: Option<u64>,
    silent: Option<bool>,
}

impl BlackjackSimulatorConfigBuilder {
    /// Method for choosing the number of decks used in the game
    pub fn num_decks(&mut self, decks: usize) -> &mut Self {
        self.num_decks = Some(decks);
        self
    }

    /// Method for setting the fraction of the shoe left undealt when the cut card comes out
    pub fn penetration(&mut self, penetration: f64) -> &mut Self {
        self.penetration = Some(penetration);
        self
    }

    /// Method for setting the flag that determines if the dealer must hit soft seventeens, default is false
    pub fn soft_seventeen(&mut self, seventeen: bool) -> &mut Self {
        self.soft_seventeen = Some(seventeen);
        self
    }

    /// Method for changing the starting bankroll of the player.
    pub fn starting_bankroll(&mut self, bankroll: f64) -> &mut Self {
        self.starting_bankroll = Some(bankroll);
        self
    }

    pub fn max_bet(&mut self, max_bet: f64) -> &mut Self {
        self.max_bet = Some(max_bet);
        self
    }

    /// Method for setting the number of rounds played in each batch
    pub fn hands_per_simulation(&mut self, hands: u32) -> &mut Self {
        self.hands_per_simulation = Some(hands);
        self
    }

    /// Method for setting the number of batches run.
    pub fn num_simulations(&mut self, n: u32) -> &mut Self {
        self.num_simulations = Some(n);
        self
    }

    /// Method for seeding the rng used for every shuffle, making the simulation reproducible
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Method for setting a boolean flag, if set to false the simulator prints the profit of every batch
    pub fn silent(&mut self, silent: bool) -> &mut Self {
        self.silent = Some(silent);
        self
    }

    /// Method for building a `BlackjackSimulatorConfig` object from the given builder.
    pub fn build(&mut self) -> BlackjackSimulatorConfig {
        BlackjackSimulatorConfig {
            num_decks: self.num_decks.unwrap_or(6),
            penetration: self.penetration.unwrap_or(0.25),
            soft_seventeen: self.soft_seventeen.unwrap_or(false),
            starting_bankroll: self.starting_bankroll.unwrap_or(300_000.0),
            max_bet: self.max_bet.unwrap_or(DEFAULT_MAX_BET),
            hands_per_simulation: self.hands_per_simulation.unwrap_or(1000),
            num_simulations: self.num_simulations.unwrap_or(10),
            seed: self.seed,
            silent: self.silent.unwrap_or(true),
        }
    }
}
