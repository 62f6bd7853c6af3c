use blackjack_sim::prelude::*;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, Level};

/// Plays a number of rounds one at a time, printing the table and the settlement of each round.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Number of rounds to play
    rounds: u32,

    #[arg(short, long, default_value_t = 6)]
    decks: usize,

    #[arg(short, long, default_value_t = 0.25)]
    penetration: f64,

    #[arg(long)]
    soft_seventeen: bool,

    #[arg(short, long, default_value_t = 6000.0)]
    bankroll: f64,

    #[arg(short, long)]
    seed: Option<u64>,

    /// Log draws and decisions
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::TRACE } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut game = match BlackjackGameSim::with_rng(
        cli.decks,
        cli.penetration,
        cli.soft_seventeen,
        cli.bankroll,
        rng,
    ) {
        Ok(game) => game,
        Err(e) => {
            error!(error = %e, "unable to set up the table");
            std::process::exit(1);
        }
    };

    let starting_balance = game.player().balance();
    let (mut wins, mut pushes, mut losses, mut blackjacks) = (0, 0, 0, 0);
    let mut rounds_played = 0;

    for round in 1..=cli.rounds {
        let bet = game.next_bet();
        if bet <= 0.0 {
            println!("the player can no longer place a bet");
            break;
        }
        println!("{:-^80}", format!(" round #{} ", round));
        println!(
            "true count: {}    bet: {:.2}    balance: {:.2}",
            game.true_count(),
            bet,
            game.player().balance()
        );

        let report = match game.play_round_report() {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, round, "round aborted");
                std::process::exit(1);
            }
        };
        println!("{}", report);
        println!(
            "balance: {:.2}    running count: {}",
            game.player().balance(),
            game.running_count()
        );
        if report.reshuffled {
            println!("cut card reached, shoe reshuffled");
        }
        println!();

        wins += report.wins();
        pushes += report.pushes();
        losses += report.losses();
        blackjacks += report.player_blackjacks();
        rounds_played += 1;
    }

    let width = "number of player blackjacks:".len() + 20;
    let numeric_display_width = 80 - width;
    println!("{}", "-".repeat(80));
    println!("{:-^80}", "stats");
    println!("{:<width$}{:>numeric_display_width$}", "rounds played:", rounds_played);
    println!("{:<width$}{:>numeric_display_width$}", "total wins:", wins);
    println!("{:<width$}{:>numeric_display_width$}", "total pushes:", pushes);
    println!("{:<width$}{:>numeric_display_width$}", "total losses:", losses);
    println!(
        "{:<width$}{:>numeric_display_width$}",
        "number of player blackjacks:", blackjacks
    );
    println!(
        "{:<width$}{:>numeric_display_width$.2}",
        "total winnings:",
        game.player().balance() - starting_balance
    );
    println!(
        "{:<width$}{:>numeric_display_width$.2}",
        "final balance:",
        game.player().balance()
    );
    println!("{}", "-".repeat(80));
}
