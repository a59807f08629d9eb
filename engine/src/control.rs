//! Square control: who nets a square once a simplified capture sequence on it
//! has been played out.
//!
//! Every square gets a score in `[-1, 1]`, positive for White. Attackers are
//! taken cheapest first, pinned pieces and kings never take part, and one
//! battery partner per side may join the sequence. Each attacker is weighted
//! by the reciprocal of its material value, so a lone pawn is worth far more
//! than a lone queen.

use chess::{BitBoard, Color, Square, ALL_SQUARES, EMPTY};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::battery::detect_battery;
use crate::board::Position;
use crate::values::capture_value;

/// Control score of every square of one position.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMap {
    scores: [f64; 64],
}

impl ControlMap {
    pub fn get(&self, square: Square) -> f64 {
        self.scores[square.to_index()]
    }

    /// Scores in square order, a1 first.
    pub fn iter(&self) -> impl Iterator<Item = (Square, f64)> + '_ {
        ALL_SQUARES
            .into_iter()
            .map(move |square| (square, self.scores[square.to_index()]))
    }

    /// Sum of all square scores; positive when White controls more of the board.
    pub fn total(&self) -> f64 {
        self.scores.iter().sum()
    }
}

impl Serialize for ControlMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(64))?;
        for (square, score) in self.iter() {
            map.serialize_entry(&square.to_string(), &score)?;
        }
        map.end()
    }
}

fn unpinned_attackers(position: &Position, color: Color, square: Square) -> BitBoard {
    position.attackers(color, square, None) & !position.pinned(color)
}

/// Material values of `color`'s attackers on `square`, cheapest first.
///
/// Pinned attackers are dropped before the battery search, and the battery
/// partner (if any) is sorted into the sequence with the others.
pub fn attacker_values(position: &Position, color: Color, square: Square) -> Vec<u8> {
    let provisional = unpinned_attackers(position, color, square);

    let mut values: Vec<u8> = provisional
        .into_iter()
        .filter_map(|attacker| position.piece_at(attacker).and_then(capture_value))
        .collect();

    if provisional != EMPTY {
        if let Some(value) =
            detect_battery(position, color, square, provisional).and_then(capture_value)
        {
            values.push(value);
        }
    }

    values.sort_unstable();
    values
}

/// Plays out the exchange between two ascending attacker-value sequences.
///
/// The sequences are walked in lockstep. Equal values cancel. When one side
/// leads with the cheaper piece and still has a recapture behind it, that side
/// runs through its remaining attackers, netting `1/own - 1/their` for each
/// pair as long as its piece is no dearer than the opponent's, and `1/own`
/// once the opponent runs out; the scan ends there. Attackers facing no
/// opposite number add `1/value` for their side and the scan goes on. When
/// both sequences end on the same index the last pair is left uncompared.
///
/// The result is positive for White and is not clamped.
pub fn simulate_exchange(white: &[u8], black: &[u8]) -> f64 {
    let mut score = 0.0;

    for i in 0..white.len().max(black.len()) {
        if i + 1 == white.len() && i + 1 == black.len() {
            break;
        }

        match (white.get(i), black.get(i)) {
            (Some(&w), Some(&b)) => {
                if w == b {
                    continue;
                }
                if w < b && white.len() > i + 1 {
                    score += winning_walk(&white[i..], &black[i..]);
                    break;
                }
                if b < w && black.len() > i + 1 {
                    score -= winning_walk(&black[i..], &white[i..]);
                    break;
                }
            }
            (Some(&w), None) => score += reciprocal(w),
            (None, Some(&b)) => score -= reciprocal(b),
            (None, None) => unreachable!("index {} beyond both attacker sequences", i),
        }
    }

    score
}

/// Gain of the side whose attackers are `ours`, seen from that side.
fn winning_walk(ours: &[u8], theirs: &[u8]) -> f64 {
    let mut gain = 0.0;
    for (j, &own) in ours.iter().enumerate() {
        match theirs.get(j) {
            Some(&their) if own <= their => gain += reciprocal(own) - reciprocal(their),
            Some(_) => break,
            None => gain += reciprocal(own),
        }
    }
    gain
}

fn reciprocal(value: u8) -> f64 {
    1.0 / f64::from(value)
}

/// Control score of a single square, clamped to `[-1, 1]`.
pub fn evaluate_square(position: &Position, square: Square) -> f64 {
    let white = attacker_values(position, Color::White, square);
    let black = attacker_values(position, Color::Black, square);
    simulate_exchange(&white, &black).clamp(-1.0, 1.0)
}

pub fn compute_square_control(position: &Position) -> ControlMap {
    let mut scores = [0.0; 64];
    for square in ALL_SQUARES {
        scores[square.to_index()] = evaluate_square(position, square);
    }
    let map = ControlMap { scores };
    log::debug!(
        "square control for {}: balance {:.3}",
        position.to_fen(),
        map.total()
    );
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const EPSILON: f64 = 1e-9;

    fn sq(name: &str) -> Square {
        Square::from_str(name).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    /// Same position with colours swapped and the board flipped top to bottom.
    fn mirror_fen(fen: &str) -> String {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let placement = fields[0]
            .split('/')
            .rev()
            .map(|rank| {
                rank.chars()
                    .map(|c| {
                        if c.is_ascii_uppercase() {
                            c.to_ascii_lowercase()
                        } else {
                            c.to_ascii_uppercase()
                        }
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("/");
        let side = if fields[1] == "w" { "b" } else { "w" };
        format!("{} {} - - 0 1", placement, side)
    }

    fn mirror_square(square: Square) -> Square {
        crate::board::square_at(square.to_index() ^ 56)
    }

    #[test]
    fn test_exchange_degenerate_cases() {
        assert_close(simulate_exchange(&[], &[]), 0.0);
        assert_close(simulate_exchange(&[3], &[3]), 0.0);
        assert_close(simulate_exchange(&[3, 3], &[3, 3]), 0.0);
        // A lone attacker on each side is never compared.
        assert_close(simulate_exchange(&[1], &[9]), 0.0);
    }

    #[test]
    fn test_exchange_uncontested() {
        assert_close(simulate_exchange(&[9], &[]), 1.0 / 9.0);
        assert_close(simulate_exchange(&[], &[5]), -0.2);
        assert_close(simulate_exchange(&[1, 3], &[]), 1.0 + 1.0 / 3.0);
    }

    #[test]
    fn test_exchange_white_wins_walk() {
        // Pawn takes, knight recaptures, black has nothing left.
        assert_close(simulate_exchange(&[1, 3], &[3]), 1.0);
        // The queen is dearer than the rook, so the walk stops there.
        assert_close(simulate_exchange(&[1, 9], &[3, 5]), 2.0 / 3.0);
    }

    #[test]
    fn test_exchange_black_wins_walk() {
        assert_close(simulate_exchange(&[3], &[1, 5]), -(2.0 / 3.0) - 0.2);
        assert_close(simulate_exchange(&[9], &[1, 1]), 1.0 / 9.0 - 2.0);
    }

    #[test]
    fn test_exchange_extra_attackers_after_cancel() {
        assert_close(simulate_exchange(&[5, 5, 5], &[5]), 0.4);
        assert_close(simulate_exchange(&[3], &[3, 3, 5]), -(1.0 / 3.0) - 0.2);
    }

    #[test]
    fn test_exchange_cheaper_piece_without_recapture() {
        // White's cheap piece cannot follow up, black's dearer one is alone too.
        assert_close(simulate_exchange(&[3, 5], &[1]), 0.2);
    }

    #[test]
    fn test_initial_position() {
        let control = compute_square_control(&Position::new());

        for file in ["a", "b", "c", "d", "e", "f", "g", "h"] {
            assert_close(control.get(sq(&format!("{}3", file))), 1.0);
            assert_close(control.get(sq(&format!("{}4", file))), 0.0);
            assert_close(control.get(sq(&format!("{}5", file))), 0.0);
            assert_close(control.get(sq(&format!("{}6", file))), -1.0);
        }

        assert_close(control.get(sq("d2")), 7.0 / 9.0);
        assert_close(control.get(sq("e2")), 7.0 / 9.0);
        assert_close(control.get(sq("c1")), 1.0 / 9.0);
        assert_close(control.get(sq("b1")), 0.2);
        assert_close(control.get(sq("b2")), 1.0 / 3.0);
        // Only the king covers these.
        assert_close(control.get(sq("f2")), 0.0);
        assert_close(control.get(sq("d1")), 0.0);
        assert_close(control.get(sq("a1")), 0.0);
        assert_close(control.get(sq("d7")), -7.0 / 9.0);
        assert_close(control.total(), 0.0);
    }

    #[test]
    fn test_scores_are_bounded() {
        for fen in [
            "rnbq1rk1/pp2ppbp/3p1np1/8/3NP3/2N1BP2/PPPQ2PP/R3KB1R b KQ - 2 8",
            "2r1r1k1/1pq1np1p/p3p1p1/3pP3/5Q2/P1P5/1P1NRPPP/4R1K1 b - - 4 22",
            "2bqr1k1/1p3ppp/p2b1n2/3p4/8/1P2PN2/PB2NPPP/3Q1RK1 b - - 1 17",
            "2k5/7R/3K1p2/3P1P2/8/7p/7r/8 b - - 1 53",
        ] {
            let position = Position::from_fen(fen).unwrap();
            let control = compute_square_control(&position);
            assert_eq!(control.iter().count(), 64);
            for (square, score) in control.iter() {
                assert!(
                    (-1.0..=1.0).contains(&score),
                    "{} scored {} in {}",
                    square,
                    score,
                    fen
                );
            }
        }
    }

    #[test]
    fn test_unattacked_squares_are_neutral() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let control = compute_square_control(&position);
        assert_close(control.get(sq("c5")), 0.0);
        assert_close(control.get(sq("h4")), 0.0);
    }

    #[test]
    fn test_single_attacker() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        assert_close(evaluate_square(&position, sq("a5")), 0.2);

        let position = Position::from_fen("4k3/8/8/8/3Q4/8/8/4K3 w - - 0 1").unwrap();
        assert_close(evaluate_square(&position, sq("a7")), 1.0 / 9.0);
    }

    #[test]
    fn test_equal_attackers_cancel() {
        let position = Position::from_fen("4k3/8/8/1n6/8/8/8/1N2K3 w - - 0 1").unwrap();
        assert_eq!(attacker_values(&position, Color::White, sq("a3")), vec![3]);
        assert_eq!(attacker_values(&position, Color::Black, sq("a3")), vec![3]);
        assert_close(evaluate_square(&position, sq("a3")), 0.0);
    }

    #[test]
    fn test_pinned_attacker_is_excluded() {
        let pinned = Position::from_fen("k3r3/8/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
        assert!(attacker_values(&pinned, Color::White, sq("d3")).is_empty());
        assert_close(evaluate_square(&pinned, sq("d3")), 0.0);

        let free = Position::from_fen("k7/8/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
        assert_eq!(attacker_values(&free, Color::White, sq("d3")), vec![3]);
        assert_close(evaluate_square(&free, sq("d3")), 1.0 / 3.0);
    }

    #[test]
    fn test_kings_never_join_the_exchange() {
        let position = Position::new();
        assert_eq!(
            attacker_values(&position, Color::White, sq("d2")),
            vec![3, 3, 9]
        );
    }

    #[test]
    fn test_battery_adds_an_attacker() {
        let doubled = Position::from_fen("4k3/8/8/8/8/8/R7/R3K3 w - - 0 1").unwrap();
        assert_eq!(attacker_values(&doubled, Color::White, sq("a5")), vec![5, 5]);
        assert_close(evaluate_square(&doubled, sq("a5")), 0.4);

        let single = Position::from_fen("4k3/8/8/8/8/8/R7/4K3 w - - 0 1").unwrap();
        assert_eq!(attacker_values(&single, Color::White, sq("a5")), vec![5]);
        assert_close(evaluate_square(&single, sq("a5")), 0.2);
    }

    #[test]
    fn test_battery_adds_at_most_one_attacker() {
        let tripled = Position::from_fen("4k3/8/8/8/8/R7/R7/R3K3 w - - 0 1").unwrap();
        assert_eq!(attacker_values(&tripled, Color::White, sq("a6")), vec![5, 5]);
        assert_close(evaluate_square(&tripled, sq("a6")), 0.4);
    }

    #[test]
    fn test_battery_is_sorted_into_place() {
        // Queen in front, rook behind: the rook value lands before the queen.
        let position = Position::from_fen("4k3/8/8/8/8/8/Q7/R3K3 w - - 0 1").unwrap();
        assert_eq!(attacker_values(&position, Color::White, sq("a5")), vec![5, 9]);
    }

    #[test]
    fn test_last_battery_partner_wins() {
        // Rook behind the e2 rook and queen behind the d3 bishop: only the queen joins.
        let position = Position::from_fen("7k/8/8/8/8/3B4/2Q1R3/4R2K w - - 0 1").unwrap();
        assert_eq!(attacker_values(&position, Color::White, sq("e4")), vec![3, 5, 9]);
    }

    #[test]
    fn test_pinned_battery_partner_still_joins() {
        let position = Position::from_fen("7k/8/8/8/4b3/6R1/6Q1/7K w - - 0 1").unwrap();
        assert!(position.is_pinned(Color::White, sq("g2")));
        assert_eq!(attacker_values(&position, Color::White, sq("g6")), vec![5, 9]);
    }

    #[test]
    fn test_bishop_behind_queen_joins() {
        let position = Position::from_fen("7k/8/8/8/8/3Q4/2B5/4K3 w - - 0 1").unwrap();
        assert_eq!(attacker_values(&position, Color::White, sq("e4")), vec![3, 9]);
    }

    #[test]
    fn test_mirrored_positions_negate() {
        for fen in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "4k3/8/8/8/8/8/R7/R3K3 w - - 0 1",
            "k3r3/8/8/8/8/8/4B3/4K3 w - - 0 1",
            "4k3/8/8/1n6/8/2P5/1B6/4K3 w - - 0 1",
            "4k3/8/2p5/3r4/4B3/2N5/8/3RK3 w - - 0 1",
        ] {
            let position = Position::from_fen(fen).unwrap();
            let mirrored = Position::from_fen(&mirror_fen(fen)).unwrap();
            let control = compute_square_control(&position);
            let mirrored_control = compute_square_control(&mirrored);
            for (square, score) in control.iter() {
                assert_close(mirrored_control.get(mirror_square(square)), -score);
            }
        }
    }

    #[test]
    fn test_contested_square_exchange() {
        // d5 rook is attacked by the c3 knight, e4 bishop and d1 rook, defended by the c6 pawn.
        let position = Position::from_fen("4k3/8/2p5/3r4/4B3/2N5/8/3RK3 w - - 0 1").unwrap();
        assert_eq!(attacker_values(&position, Color::White, sq("d5")), vec![3, 3, 5]);
        assert_eq!(attacker_values(&position, Color::Black, sq("d5")), vec![1]);
        // The pawn has no follow-up, so no walk starts and white's spare attackers count alone.
        assert_close(evaluate_square(&position, sq("d5")), 1.0 / 3.0 + 0.2);
    }

    #[test]
    fn test_serializes_by_square_name() {
        let control = compute_square_control(&Position::new());
        let json = serde_json::to_value(&control).unwrap();
        assert_eq!(json["e4"], 0.0);
        assert_eq!(json["a3"], 1.0);
    }
}
