use chess::{Color, Square, ALL_SQUARES};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::board::Position;

/// Raw attacker counts of both colours on one square.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct SquareAttackCount {
    pub white: u8,
    pub black: u8,
}

impl SquareAttackCount {
    pub fn for_color(&self, color: Color) -> u8 {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

/// Attacker counts for every square of one position.
///
/// Counts every attacker, kings and pinned pieces included; batteries are
/// not looked through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackCensus {
    counts: [SquareAttackCount; 64],
}

impl AttackCensus {
    pub fn get(&self, square: Square) -> SquareAttackCount {
        self.counts[square.to_index()]
    }

    /// Entries in square order, a1 first.
    pub fn iter(&self) -> impl Iterator<Item = (Square, SquareAttackCount)> + '_ {
        ALL_SQUARES
            .into_iter()
            .map(move |square| (square, self.counts[square.to_index()]))
    }

    /// Number of (attacker, attacked square) pairs for one colour.
    pub fn total(&self, color: Color) -> u32 {
        self.counts
            .iter()
            .map(|count| count.for_color(color) as u32)
            .sum()
    }
}

pub fn compute_attack_census(position: &Position) -> AttackCensus {
    let mut counts = [SquareAttackCount::default(); 64];
    for square in ALL_SQUARES {
        counts[square.to_index()] = SquareAttackCount {
            white: position.attackers(Color::White, square, None).popcnt() as u8,
            black: position.attackers(Color::Black, square, None).popcnt() as u8,
        };
    }
    AttackCensus { counts }
}

impl Serialize for AttackCensus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(64))?;
        for (square, count) in self.iter() {
            map.serialize_entry(&square.to_string(), &count)?;
        }
        map.end()
    }
}
