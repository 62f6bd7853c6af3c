use blackjack_sim::write::{write_outputs, write_report_json, write_summary};
use blackjack_sim::{BlackjackSimulator, BlackjackSimulatorConfig, SimulationError};
use clap::Parser;
use tracing::{error, Level};

/// Simulates a Hi-Lo counting player who follows basic strategy and sizes bets with the Kelly criterion.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Number of decks in the shoe
    #[arg(short, long, default_value_t = 6)]
    decks: usize,

    /// Fraction of the shoe left undealt when the cut card comes out
    #[arg(short, long, default_value_t = 0.25)]
    penetration: f64,

    /// Dealer hits a soft 17
    #[arg(long)]
    soft_seventeen: bool,

    /// Starting bankroll of the player
    #[arg(short, long, default_value_t = 300_000.0)]
    bankroll: f64,

    /// Largest bet the player will place
    #[arg(short, long, default_value_t = 10_000.0)]
    max_bet: f64,

    /// Rounds played per batch
    #[arg(long, default_value_t = 1000)]
    hands: u32,

    /// Number of batches
    #[arg(long, default_value_t = 10)]
    batches: u32,

    /// Seed for the shuffles, makes the run reproducible
    #[arg(short, long)]
    seed: Option<u64>,

    /// Print the summary and profit series as JSON
    #[arg(long)]
    json: bool,

    /// Log every round, repeat for draws and decisions
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl From<&Cli> for BlackjackSimulatorConfig {
    fn from(cli: &Cli) -> Self {
        let mut builder = BlackjackSimulatorConfig::new();
        builder
            .num_decks(cli.decks)
            .penetration(cli.penetration)
            .soft_seventeen(cli.soft_seventeen)
            .starting_bankroll(cli.bankroll)
            .max_bet(cli.max_bet)
            .hands_per_simulation(cli.hands)
            .num_simulations(cli.batches)
            .silent(true);
        if let Some(seed) = cli.seed {
            builder.seed(seed);
        }
        builder.build()
    }
}

fn run(cli: &Cli) -> Result<(), SimulationError> {
    let mut simulator = BlackjackSimulator::new(BlackjackSimulatorConfig::from(cli))?;
    let summary = simulator.run()?;

    let stdout = std::io::stdout();
    if cli.json {
        write_report_json(&summary, simulator.outputs(), stdout.lock())?;
    } else {
        write_outputs(simulator.outputs(), stdout.lock())?;
        write_summary(&summary, "hi-lo / basic strategy / kelly", stdout.lock())?;
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        error!(error = %e, "simulation failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
