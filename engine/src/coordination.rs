use chess::{Color, Piece, Square, ALL_SQUARES};
use serde::{Deserialize, Serialize};

use crate::board::{square_distance, Position};
use crate::census::{compute_attack_census, AttackCensus};
use crate::config::AnalysisConfig;
use crate::control::{compute_square_control, ControlMap};

/// A per-side scalar, White first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SidePair {
    pub white: f64,
    pub black: f64,
}

impl SidePair {
    pub fn new(white: f64, black: f64) -> Self {
        Self { white, black }
    }

    pub fn for_color(&self, color: Color) -> f64 {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    fn for_color_mut(&mut self, color: Color) -> &mut f64 {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }
}

/// Coordination of both sides in one position of a game trace.
pub type CoordinationSample = SidePair;

/// Number of friendly pieces the piece on `square` attacks.
pub fn defense_score(position: &Position, square: Square, config: &AnalysisConfig) -> u32 {
    let Some(color) = position.color_at(square) else {
        return 0;
    };

    let defended = position.piece_attacks(square) & position.pieces_of(color);
    defended
        .into_iter()
        .filter(|&target| {
            config.count_pawns_as_defended || position.piece_at(target) != Some(Piece::Pawn)
        })
        .count() as u32
}

pub fn count_attacked_squares(census: &AttackCensus, color: Color) -> u32 {
    census.total(color)
}

/// Weighted sum of attacked squares and of the defense scores of every
/// non-pawn piece (king included).
pub fn piece_coordination(
    position: &Position,
    census: &AttackCensus,
    config: &AnalysisConfig,
) -> CoordinationSample {
    let mut sample = CoordinationSample::new(
        f64::from(count_attacked_squares(census, Color::White)) * config.attack_weight,
        f64::from(count_attacked_squares(census, Color::Black)) * config.attack_weight,
    );

    for square in position.occupied() {
        let (Some(piece), Some(color)) = (position.piece_at(square), position.color_at(square))
        else {
            continue;
        };
        if piece == Piece::Pawn {
            continue;
        }
        *sample.for_color_mut(color) +=
            f64::from(defense_score(position, square, config)) * config.defense_weight;
    }

    sample
}

/// `Σ_{i < count} 1/2^(i + first_exponent)`
fn diminishing_sum(count: i32, first_exponent: i32) -> f64 {
    (0..count).map(|i| 0.5f64.powi(i + first_exponent)).sum()
}

/// Surplus defenders around each king, with diminishing returns, relative to
/// the number of squares the king itself covers.
pub fn king_area_defense(position: &Position, census: &AttackCensus) -> SidePair {
    let mut scores = SidePair::default();

    for color in [Color::White, Color::Black] {
        let king = position.king_square(color);
        let mut total = 0.0;

        for (square, count) in census.iter() {
            let own = i32::from(count.for_color(color));
            let theirs = i32::from(count.for_color(!color));
            if square_distance(king, square) == 1 && own > 1 {
                total += diminishing_sum((own - theirs).max(0), 1);
            }
        }

        let king_reach = position.piece_attacks(king).popcnt();
        *scores.for_color_mut(color) = total / f64::from(king_reach);
    }

    scores
}

/// White counts from a3 upwards. Black counts from a7 downwards, so a7 is
/// the one square of Black's second rank that is included.
fn in_attacking_zone(color: Color, square: Square) -> bool {
    match color {
        Color::White => square.to_index() >= 16,
        Color::Black => square.to_index() <= 48,
    }
}

/// Attacks in each side's attacking zone on squares not held by its own
/// pieces, each extra attacker worth half the previous one.
pub fn offensive_pressure(
    position: &Position,
    census: &AttackCensus,
    config: &AnalysisConfig,
) -> SidePair {
    let mut scores = SidePair::default();

    for color in [Color::White, Color::Black] {
        let total: f64 = ALL_SQUARES
            .into_iter()
            .filter(|&square| {
                in_attacking_zone(color, square) && position.color_at(square) != Some(color)
            })
            .map(|square| diminishing_sum(i32::from(census.get(square).for_color(color)), 0))
            .sum();
        *scores.for_color_mut(color) = total / config.offensive_normalizer;
    }

    scores
}

/// Every metric of one position.
#[derive(Debug, Clone, Serialize)]
pub struct PositionReport {
    pub fen: String,
    pub control: ControlMap,
    pub census: AttackCensus,
    pub coordination: CoordinationSample,
    pub king_area_defense: SidePair,
    pub offensive_pressure: SidePair,
}

pub fn analyze_position(position: &Position, config: &AnalysisConfig) -> PositionReport {
    let census = compute_attack_census(position);
    PositionReport {
        fen: position.to_fen(),
        control: compute_square_control(position),
        coordination: piece_coordination(position, &census, config),
        king_area_defense: king_area_defense(position, &census),
        offensive_pressure: offensive_pressure(position, &census, config),
        census,
    }
}
