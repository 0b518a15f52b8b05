use anyhow::{Context, Result, bail};
use cardcycle_core::CardCycle;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod state;

use config::Loaded;

#[derive(Parser, Debug)]
#[command(name = "cardcycle", version, about = "Card billing-cycle windows and due dates")]
struct Cli {
    /// Config file (default: ~/.cardcycle/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cycle of one card that closes in the given month
    Resolve {
        card: String,

        /// Month as YYYY-MM
        #[arg(long)]
        month: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// All cards' cycles for a month
    Bills {
        /// Month as YYYY-MM
        #[arg(long)]
        month: String,

        /// List the cycles whose bill is due in the month instead of generated
        #[arg(long)]
        due: bool,
    },

    /// List configured cards and their cycle days
    Cards,

    /// Map payment-mode text to a card
    Identify {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Write a starter config (does not overwrite)
    Init,

    /// Print version and build SHA
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config_path = match cli.config {
        Some(p) => p,
        None => state::default_config_path()?,
    };

    match cli.command {
        Command::Init => {
            state::ensure_cardcycle_home()?;
            if config::init_config(&config_path)? {
                println!("Wrote {}", config_path.display());
            } else {
                println!("Config already exists: {}", config_path.display());
            }
        }

        Command::Version => {
            println!(
                "cardcycle {} ({})",
                env!("CARGO_PKG_VERSION"),
                env!("CARDCYCLE_BUILD_SHA")
            );
        }

        Command::Resolve { card, month, json } => {
            let loaded = load(&config_path)?;
            let (year, month) = parse_month(&month)?;
            let cycle = loaded
                .resolver
                .resolve_effective(&card, year, month)
                .with_context(|| format!("resolving {card} for {year:04}-{month:02}"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cycle)?);
            } else {
                print_cycle(&cycle);
            }
        }

        Command::Bills { month, due } => {
            let loaded = load(&config_path)?;
            let (year, month) = parse_month(&month)?;
            let rows = if due {
                loaded.resolver.statements_due_in(year, month)?
            } else {
                loaded.resolver.statements_generated_in(year, month)?
            };

            let label = if due { "due" } else { "generated" };
            println!("# Bills {label} in {year:04}-{month:02}\n");
            for c in &rows {
                print_cycle(c);
            }
        }

        Command::Cards => {
            let loaded = load(&config_path)?;
            for (id, def) in loaded.resolver.registry().iter() {
                println!(
                    "{id:<12} start={:>2} end={:>2} due={:>2} offset={}",
                    def.start_day, def.end_day, def.due_day, def.due_offset_months
                );
            }
        }

        Command::Identify { text } => {
            let loaded = load(&config_path)?;
            let text = text.join(" ");
            match loaded.matcher.identify(&text).card() {
                Some(card) => println!("{card}"),
                None => println!("(unmapped)"),
            }
        }
    }

    Ok(())
}

fn load(path: &std::path::Path) -> Result<Loaded> {
    let cfg = config::load_config(path)?;
    Loaded::from_config(cfg)
}

/// Parse `YYYY-MM`. Month range is checked by the resolver.
fn parse_month(s: &str) -> Result<(i32, u32)> {
    let Some((y, m)) = s.trim().split_once('-') else {
        bail!("month must look like YYYY-MM, got '{s}'");
    };
    let year: i32 = y.parse().with_context(|| format!("year in '{s}'"))?;
    let month: u32 = m.parse().with_context(|| format!("month in '{s}'"))?;
    Ok((year, month))
}

fn print_cycle(c: &CardCycle) {
    let w = &c.window;
    println!(
        "{:<12} {} .. {} ({:>2} days) | statement {} | due {}{}",
        c.card,
        w.cycle_start,
        w.cycle_end,
        w.len_days(),
        w.statement_date,
        w.due_date,
        if c.overridden { " (override)" } else { "" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2025-10").unwrap(), (2025, 10));
        assert_eq!(parse_month(" 2026-01 ").unwrap(), (2026, 1));
        // Out-of-range months pass through; the resolver rejects them.
        assert_eq!(parse_month("2025-13").unwrap(), (2025, 13));
        assert!(parse_month("202510").is_err());
        assert!(parse_month("2025-Oct").is_err());
    }

    #[test]
    fn test_far_future_month_is_an_error_not_a_panic() {
        let (year, month) = parse_month("999999999-10").unwrap();
        let resolver = cardcycle_core::CycleResolver::new(cardcycle_core::CycleRegistry::builtin());
        assert!(matches!(
            resolver.resolve_effective("Amex", year, month),
            Err(cardcycle_core::CycleError::DateOutOfRange { .. })
        ));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["cardcycle", "resolve", "Amex", "--month", "2025-10", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Resolve { ref card, json: true, .. } if card == "Amex"));

        let cli = Cli::try_parse_from(["cardcycle", "-v", "bills", "--month", "2025-11", "--due"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Bills { due: true, .. }));

        assert!(Cli::try_parse_from(["cardcycle", "identify"]).is_err());
    }
}
