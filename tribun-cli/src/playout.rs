//! Playout command - seeded random games from the opening
//!
//! Each game picks uniformly among the board actions of the side to move
//! and claims END (no legal moves) when there are none. Resign and draw
//! actions are never chosen.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use tribun_core::{Action, Color, EndReason, GameState};

use crate::config::PlayoutConfig;

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct PlayoutArgs {
    /// Number of games to play
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Abandon a game after this many plies
    #[arg(long, default_value = "200")]
    pub max_plies: u32,

    /// Play games one after another
    #[arg(long)]
    pub sequential: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

impl PlayoutArgs {
    fn config(&self, seed: Option<u64>) -> PlayoutConfig {
        let config = PlayoutConfig::games(self.games)
            .with_max_plies(self.max_plies)
            .with_parallel(!self.sequential)
            .with_progress(!self.json);
        match seed {
            Some(s) => config.with_seed(s),
            None => config,
        }
    }
}

/// Result of a single game
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct GameRecord {
    pub game_number: usize,
    pub seed: u64,
    pub ended: bool,
    pub winner: Option<Color>,
    pub plies: u32,
    /// Units left on the board per color (white, black)
    pub material: (u32, u32),
}

/// Aggregated playout results
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct PlayoutStats {
    pub games: usize,
    pub white_wins: usize,
    pub black_wins: usize,
    pub ties: usize,
    pub unfinished: usize,
    pub avg_plies: f32,
}

// ============================================================================
// ORCHESTRATION
// ============================================================================

pub fn run(args: PlayoutArgs, seed: Option<u64>) -> Result<()> {
    let config = args.config(seed);

    tracing::info!(
        "Starting {} playouts (max {} plies, parallel={})",
        config.games,
        config.max_plies,
        config.parallel
    );

    let records = play_games(&config);
    let stats = compute_statistics(&records);

    if args.json {
        print_json_results(&records, &stats)?;
    } else {
        print_text_results(&records, &stats);
    }
    Ok(())
}

/// Play every game of the batch. Results are ordered by game number
/// whether or not the batch ran in parallel.
pub fn play_games(config: &PlayoutConfig) -> Vec<GameRecord> {
    let base_seed = config.seed.unwrap_or_else(rand::random);
    let bar = progress_bar(config);

    let play = |index: usize| {
        let seed = base_seed.wrapping_add(index as u64);
        let record = play_single_game(index + 1, seed, config.max_plies);
        bar.inc(1);
        record
    };

    let records: Vec<GameRecord> = if config.parallel {
        (0..config.games).into_par_iter().map(play).collect()
    } else {
        (0..config.games).map(play).collect()
    };

    bar.finish_and_clear();
    records
}

// ============================================================================
// SINGLE GAME
// ============================================================================

pub fn play_single_game(game_number: usize, seed: u64, max_plies: u32) -> GameRecord {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = GameState::new_game();

    while !state.is_ended() && state.ply() < max_plies {
        let word = choose_action(&state, &mut rng);
        match state.apply_action(word) {
            Ok(next) => state = next,
            Err(e) => {
                // every chosen word comes from the enumerator
                tracing::error!(game_number, seed, "enumerated action rejected: {}", e);
                break;
            }
        }
    }

    tracing::debug!(game_number, ply = state.ply(), winner = ?state.winner(), "playout finished");

    let board = state.board();
    let count = |color| board.units().filter(|(_, u)| u.color == color).count() as u32;
    GameRecord {
        game_number,
        seed,
        ended: state.is_ended(),
        winner: state.winner(),
        plies: state.ply(),
        material: (count(Color::White), count(Color::Black)),
    }
}

/// Uniform pick among board actions, END when the side to move is stuck
fn choose_action(state: &GameState, rng: &mut ChaCha8Rng) -> u32 {
    let actions = state.board_actions();
    match actions.choose(rng) {
        Some(action) => action.encode(),
        None => Action::End {
            reason: EndReason::NoLegalMoves,
            loser: state.turn(),
        }
        .encode(),
    }
}

pub fn compute_statistics(records: &[GameRecord]) -> PlayoutStats {
    let finished = |winner: Option<Color>| {
        records
            .iter()
            .filter(|r| r.ended && r.winner == winner)
            .count()
    };

    let total_plies: u64 = records.iter().map(|r| u64::from(r.plies)).sum();
    let avg_plies = if records.is_empty() {
        0.0
    } else {
        total_plies as f32 / records.len() as f32
    };

    PlayoutStats {
        games: records.len(),
        white_wins: finished(Some(Color::White)),
        black_wins: finished(Some(Color::Black)),
        ties: finished(None),
        unfinished: records.iter().filter(|r| !r.ended).count(),
        avg_plies,
    }
}

// ============================================================================
// UTILITIES
// ============================================================================

fn progress_bar(config: &PlayoutConfig) -> ProgressBar {
    if !config.progress {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(config.games as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
    {
        bar.set_style(style);
    }
    bar
}

fn percent(part: usize, total: usize) -> f32 {
    if total > 0 {
        part as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

fn print_json_results(records: &[GameRecord], stats: &PlayoutStats) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonOutput<'a> {
        stats: &'a PlayoutStats,
        games: &'a [GameRecord],
    }

    let json = serde_json::to_string_pretty(&JsonOutput { stats, games: records })
        .context("Failed to serialize playout results")?;
    println!("{}", json);
    Ok(())
}

fn print_text_results(records: &[GameRecord], stats: &PlayoutStats) {
    let total = stats.games;

    println!("\n=== Playout Results ===");
    println!("Total games: {}", total);
    println!("White wins:  {} ({:.1}%)", stats.white_wins, percent(stats.white_wins, total));
    println!("Black wins:  {} ({:.1}%)", stats.black_wins, percent(stats.black_wins, total));
    println!("Ties:        {} ({:.1}%)", stats.ties, percent(stats.ties, total));
    println!("Unfinished:  {} ({:.1}%)", stats.unfinished, percent(stats.unfinished, total));
    println!("Avg plies:   {:.1}", stats.avg_plies);

    println!("\nGame details:");
    for game in records {
        let outcome = match (game.ended, game.winner) {
            (false, _) => "unfinished".to_string(),
            (true, Some(color)) => format!("{:?} wins", color),
            (true, None) => "tie".to_string(),
        };
        println!(
            "  Game {} (seed {}): {} in {} plies, units {}/{}",
            game.game_number, game.seed, outcome, game.plies, game.material.0, game.material.1
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ended: bool, winner: Option<Color>, plies: u32) -> GameRecord {
        GameRecord {
            game_number: 1,
            seed: 0,
            ended,
            winner,
            plies,
            material: (0, 0),
        }
    }

    #[test]
    fn test_compute_statistics_empty() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats, PlayoutStats::default());
    }

    #[test]
    fn test_compute_statistics() {
        let records = vec![
            record(true, Some(Color::White), 10),
            record(true, Some(Color::Black), 20),
            record(true, None, 30),
            record(false, None, 40),
        ];
        let stats = compute_statistics(&records);
        assert_eq!(stats.white_wins, 1);
        assert_eq!(stats.black_wins, 1);
        assert_eq!(stats.ties, 1);
        assert_eq!(stats.unfinished, 1);
        assert_eq!(stats.avg_plies, 25.0);
    }

    #[test]
    fn test_single_game_deterministic() {
        let a = play_single_game(1, 42, 40);
        let b = play_single_game(1, 42, 40);
        assert_eq!(a, b);
        assert!(a.ended || a.plies == 40);
    }

    #[test]
    fn test_choose_action_is_legal() {
        let state = GameState::new_game();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let word = choose_action(&state, &mut rng);
        assert!(state.legal_actions().contains(&word));
    }
}
