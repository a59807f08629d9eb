use chess::{BitBoard, Color, Piece, Square};

use crate::board::Position;

fn is_straight_slider(piece: Piece) -> bool {
    matches!(piece, Piece::Rook | Piece::Queen)
}

fn is_diagonal_slider(piece: Piece) -> bool {
    matches!(piece, Piece::Bishop | Piece::Queen)
}

/// Front pieces that can have a diagonal slider lined up behind them.
/// Pawns qualify because they capture along a diagonal.
fn opens_diagonal(piece: Piece) -> bool {
    matches!(piece, Piece::Pawn | Piece::Bishop | Piece::Rook | Piece::Queen)
}

/// Finds the slider of `color` reinforcing an attack on `target` from behind.
///
/// Each provisional attacker is lifted off the board in turn and the attackers
/// are traced again; a newly revealed rook or queen behind a rook or queen, or
/// a newly revealed bishop or queen behind a pawn, bishop or queen, is a
/// battery partner. Only one partner is reported: later finds overwrite
/// earlier ones. The partner's own pin status is not checked.
pub fn detect_battery(
    position: &Position,
    color: Color,
    target: Square,
    provisional: BitBoard,
) -> Option<Piece> {
    let mut battery = None;

    for front_square in provisional {
        let Some(front) = position.piece_at(front_square) else {
            continue;
        };
        if !is_straight_slider(front) && !opens_diagonal(front) {
            continue;
        }

        let lifted = position.occupied() ^ BitBoard::from_square(front_square);
        let revealed = position.attackers(color, target, Some(lifted)) & !provisional;

        for revealed_square in revealed {
            let Some(rear) = position.piece_at(revealed_square) else {
                continue;
            };
            let straight = is_straight_slider(front) && is_straight_slider(rear);
            let diagonal = opens_diagonal(front) && is_diagonal_slider(rear);
            if straight || diagonal {
                log::trace!(
                    "battery on {}: {:?} on {} behind {:?} on {}",
                    target,
                    rear,
                    revealed_square,
                    front,
                    front_square
                );
                battery = Some(rear);
            }
        }
    }

    battery
}
