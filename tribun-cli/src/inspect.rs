//! Inspection commands: legal action listing, word decoding, perft

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use tribun_core::action::to_frame;
use tribun_core::{perft, Action, GameState, Snapshot};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct LegalArgs {
    /// Snapshot JSON file (defaults to the opening position)
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Output the list as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Action word, decimal or 0x-prefixed hex
    pub word: String,
}

#[derive(Args)]
pub struct PerftArgs {
    /// Snapshot JSON file (defaults to the opening position)
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Deepest level to count
    #[arg(long, default_value = "2")]
    pub depth: u32,
}

// ============================================================================
// COMMANDS
// ============================================================================

pub fn run_legal(args: LegalArgs) -> Result<()> {
    let state = load_state(args.snapshot.as_deref())?;
    let words = state.legal_actions();
    tracing::info!("{} legal actions at ply {}", words.len(), state.ply());

    if args.json {
        #[derive(serde::Serialize)]
        struct JsonAction {
            word: u32,
            action: Action,
        }

        let listing = words
            .iter()
            .map(|&word| -> Result<JsonAction> {
                Ok(JsonAction { word, action: Action::decode(word)? })
            })
            .collect::<Result<Vec<_>>>()?;
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        for word in words {
            println!("{:#010x}  {:?}", word, Action::decode(word)?);
        }
    }
    Ok(())
}

pub fn run_decode(args: DecodeArgs) -> Result<()> {
    let word = parse_word(&args.word)?;
    let action = Action::decode(word).with_context(|| format!("Cannot decode {}", args.word))?;
    let frame = to_frame(word);

    println!("word:   {:#010x}", word);
    println!("frame:  {:02x?}", frame);
    println!("action: {}", serde_json::to_string(&action)?);
    Ok(())
}

pub fn run_perft(args: PerftArgs) -> Result<()> {
    let state = load_state(args.snapshot.as_deref())?;

    for depth in 1..=args.depth {
        let start = Instant::now();
        let nodes = perft(&state, depth);
        let elapsed = start.elapsed();
        println!("perft({}) = {} ({:.2?})", depth, nodes, elapsed);
    }
    Ok(())
}

// ============================================================================
// UTILITIES
// ============================================================================

fn load_state(path: Option<&Path>) -> Result<GameState> {
    let Some(path) = path else {
        return Ok(GameState::new_game());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let snapshot = Snapshot::from_json(&text)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;
    snapshot
        .into_state()
        .with_context(|| format!("Invalid snapshot: {}", path.display()))
}

/// Parse a word given in decimal or `0x` hex
pub fn parse_word(text: &str) -> Result<u32> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.with_context(|| format!("Not a 32-bit word: {}", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_word() {
        assert_eq!(parse_word("0x1000007f").unwrap(), 0x1000_007f);
        assert_eq!(parse_word("42").unwrap(), 42);
        assert_eq!(parse_word(" 0XFF ").unwrap(), 255);
        assert!(parse_word("0x1_0000_0000").is_err());
        assert!(parse_word("move").is_err());
    }

    #[test]
    fn test_load_default_state() {
        let state = load_state(None).unwrap();
        assert_eq!(state, GameState::new_game());
    }
}
