use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use piece_coordination::{
    analyze_position, compute_attack_census, compute_square_control, control_trace,
    coordination_trace, open_games, render, AnalysisConfig, GameRecord, Position,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Square control and piece coordination for chess positions")]
struct Cli {
    /// JSON file with analysis settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Square control heatmap of a position
    Control(PositionArgs),
    /// Raw attacker counts of a position
    Census(PositionArgs),
    /// Every metric of a position
    Metrics(PositionArgs),
    /// Coordination trace over a PGN game
    Game(GameArgs),
}

#[derive(Args, Debug)]
struct PositionArgs {
    /// Position in FEN; the initial position when omitted
    #[arg(long)]
    fen: Option<String>,

    /// Write the result here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also draw the heatmap to a PNG file (needs the `plots` feature)
    #[arg(long)]
    png: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GameArgs {
    /// PGN file, optionally gzipped
    #[arg(long)]
    pgn: PathBuf,

    /// Which game of the file to analyse
    #[arg(long, default_value_t = 0)]
    index: usize,

    #[arg(long)]
    output: Option<PathBuf>,

    /// Also draw the trace to a PNG file (needs the `plots` feature)
    #[arg(long)]
    png: Option<PathBuf>,
}

#[derive(Serialize)]
struct GameSummary<'a> {
    white: &'a str,
    black: &'a str,
    moves: &'a [String],
    coordination: Vec<piece_coordination::CoordinationSample>,
    control_balance: Vec<f64>,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    )
    .format(|buf, record| writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args()))
    .target(env_logger::Target::Stderr)
    .init();

    if let Err(e) = run(cli) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    log::debug!("config: {:?}", config);

    match cli.command {
        Command::Control(args) => {
            let position = load_position(&args)?;
            let map = compute_square_control(&position);
            if let Some(png) = &args.png {
                render::plot_heatmap_png(png, &map)?;
            }
            let text = if cli.json {
                serde_json::to_string_pretty(&map)?
            } else {
                format!("{}\nbalance {:+.3}\n", render::render_heatmap(&map), map.total())
            };
            emit(args.output.as_deref(), &text)
        }
        Command::Census(args) => {
            let position = load_position(&args)?;
            let census = compute_attack_census(&position);
            let text = if cli.json {
                serde_json::to_string_pretty(&census)?
            } else {
                render::render_census(&census)
            };
            emit(args.output.as_deref(), &text)
        }
        Command::Metrics(args) => {
            let position = load_position(&args)?;
            let report = analyze_position(&position, &config);
            if let Some(png) = &args.png {
                render::plot_heatmap_png(png, &report.control)?;
            }
            let text = if cli.json {
                serde_json::to_string_pretty(&report)?
            } else {
                format!(
                    "{}\n{}\ncoordination        white {:.2}  black {:.2}\n\
                     king area defense   white {:.3}  black {:.3}\n\
                     offensive pressure  white {:.3}  black {:.3}\n",
                    report.fen,
                    render::render_heatmap(&report.control),
                    report.coordination.white,
                    report.coordination.black,
                    report.king_area_defense.white,
                    report.king_area_defense.black,
                    report.offensive_pressure.white,
                    report.offensive_pressure.black,
                )
            };
            emit(args.output.as_deref(), &text)
        }
        Command::Game(args) => {
            let games = open_games(&args.pgn)
                .with_context(|| format!("failed to read {}", args.pgn.display()))?;
            let game = games.get(args.index).ok_or(piece_coordination::AnalysisError::GameIndex {
                index: args.index,
                available: games.len(),
            })?;
            let record = GameRecord::from_pgn(game)?;
            log::info!(
                "{} vs {}: {} plies",
                record.white(),
                record.black(),
                record.moves().len()
            );

            let coordination = coordination_trace(&record, &config);
            if let Some(png) = &args.png {
                render::plot_trace_png(png, &coordination, record.white(), record.black())?;
            }
            let text = if cli.json {
                let summary = GameSummary {
                    white: record.white(),
                    black: record.black(),
                    moves: record.moves(),
                    control_balance: control_trace(&record, &config),
                    coordination,
                };
                serde_json::to_string_pretty(&summary)?
            } else {
                render::render_trace(&coordination, record.white(), record.black())
            };
            emit(args.output.as_deref(), &text)
        }
    }
}

fn load_position(args: &PositionArgs) -> Result<Position> {
    match &args.fen {
        Some(fen) => Ok(Position::from_fen(fen)?),
        None => Ok(Position::new()),
    }
}

fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}
