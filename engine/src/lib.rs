pub mod battery;
pub mod board;
pub mod census;
pub mod config;
pub mod control;
pub mod coordination;
pub mod error;
pub mod game;
pub mod pgn;
pub mod render;
pub mod values;

pub use board::{square_at, square_distance, Position};
pub use census::{compute_attack_census, AttackCensus, SquareAttackCount};
pub use config::AnalysisConfig;
pub use control::{compute_square_control, evaluate_square, simulate_exchange, ControlMap};
pub use coordination::{
    analyze_position, king_area_defense, offensive_pressure, piece_coordination,
    CoordinationSample, PositionReport, SidePair,
};
pub use error::{AnalysisError, Result};
pub use game::{control_trace, coordination_trace, GameRecord};
pub use pgn::{open_games, read_games, PgnGame};
