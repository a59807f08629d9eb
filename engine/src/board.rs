use chess::{BitBoard, Board as ChessBoard, Color, Piece, Square, ALL_SQUARES, EMPTY};
use std::fmt;
use std::str::FromStr;

use crate::error::{AnalysisError, Result};

/// Immutable position snapshot used by every analysis pass.
///
/// Wraps a `chess::Board` and answers the attacker, pin and occupancy queries
/// the evaluators need. Pins are resolved once for both colours when the
/// snapshot is created, since the underlying board only tracks pins for the
/// side to move.
#[derive(Clone)]
pub struct Position {
    inner: ChessBoard,
    pinned: [BitBoard; 2],
}

impl Position {
    pub fn new() -> Self {
        Self::from(ChessBoard::default())
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        ChessBoard::from_str(fen)
            .map(Self::from)
            .map_err(|e| AnalysisError::InvalidFen {
                fen: fen.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn occupied(&self) -> BitBoard {
        *self.inner.combined()
    }

    pub fn pieces_of(&self, color: Color) -> BitBoard {
        *self.inner.color_combined(color)
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.inner.piece_on(square)
    }

    pub fn color_at(&self, square: Square) -> Option<Color> {
        self.inner.color_on(square)
    }

    pub fn king_square(&self, color: Color) -> Square {
        self.inner.king_square(color)
    }

    pub fn side_to_move(&self) -> Color {
        self.inner.side_to_move()
    }

    /// Squares of `color`'s pieces attacking `square`.
    ///
    /// Sliders are traced against `occupancy` when given, which lets callers
    /// look through a piece that has already been counted. The result is
    /// masked with the real piece set of `color`, so a square removed from
    /// the occupancy can still show up and must be filtered by the caller.
    pub fn attackers(&self, color: Color, square: Square, occupancy: Option<BitBoard>) -> BitBoard {
        let occupied = occupancy.unwrap_or_else(|| self.occupied());
        let ours = self.pieces_of(color);

        let pawns = *self.inner.pieces(Piece::Pawn);
        let knights = *self.inner.pieces(Piece::Knight);
        let bishops = *self.inner.pieces(Piece::Bishop);
        let rooks = *self.inner.pieces(Piece::Rook);
        let queens = *self.inner.pieces(Piece::Queen);
        let kings = *self.inner.pieces(Piece::King);

        // A pawn of `color` attacks `square` exactly when a pawn of the other
        // colour standing on `square` would attack the pawn's square.
        let pawn_attackers = chess::get_pawn_attacks(square, !color, pawns & ours);
        let knight_attackers = chess::get_knight_moves(square) & knights;
        let king_attackers = chess::get_king_moves(square) & kings;
        let diagonal_attackers = chess::get_bishop_moves(square, occupied) & (bishops | queens);
        let straight_attackers = chess::get_rook_moves(square, occupied) & (rooks | queens);

        (pawn_attackers | knight_attackers | king_attackers | diagonal_attackers | straight_attackers)
            & ours
    }

    /// Whether the `color` piece on `square` is absolutely pinned to its own king.
    pub fn is_pinned(&self, color: Color, square: Square) -> bool {
        (self.pinned[color.to_index()] & BitBoard::from_square(square)) != EMPTY
    }

    pub fn pinned(&self, color: Color) -> BitBoard {
        self.pinned[color.to_index()]
    }

    /// Squares attacked by the piece standing on `square`, or none if it is empty.
    pub fn piece_attacks(&self, square: Square) -> BitBoard {
        let (Some(piece), Some(color)) = (self.piece_at(square), self.color_at(square)) else {
            return EMPTY;
        };
        let occupied = self.occupied();

        match piece {
            Piece::Pawn => chess::get_pawn_attacks(square, color, !EMPTY),
            Piece::Knight => chess::get_knight_moves(square),
            Piece::Bishop => chess::get_bishop_moves(square, occupied),
            Piece::Rook => chess::get_rook_moves(square, occupied),
            Piece::Queen => {
                chess::get_bishop_moves(square, occupied) | chess::get_rook_moves(square, occupied)
            }
            Piece::King => chess::get_king_moves(square),
        }
    }

    pub fn to_fen(&self) -> String {
        self.inner.to_string()
    }

    pub fn as_chess_board(&self) -> &ChessBoard {
        &self.inner
    }

    fn compute_pinned(board: &ChessBoard, color: Color) -> BitBoard {
        let king = board.king_square(color);
        let occupied = *board.combined();
        let ours = *board.color_combined(color);
        let theirs = *board.color_combined(!color);
        let queens = *board.pieces(Piece::Queen);

        let snipers = ((chess::get_rook_rays(king) & (*board.pieces(Piece::Rook) | queens))
            | (chess::get_bishop_rays(king) & (*board.pieces(Piece::Bishop) | queens)))
            & theirs;

        let mut pinned = EMPTY;
        for sniper in snipers {
            let blockers = chess::between(sniper, king) & occupied;
            if blockers.popcnt() == 1 {
                pinned |= blockers & ours;
            }
        }
        pinned
    }
}

/// Square for a rank-major index (a1 = 0, h8 = 63).
///
/// Panics on an index outside the board; callers pass indices they derived
/// from the board itself, so anything else is a programming error.
pub fn square_at(index: usize) -> Square {
    assert!(index < 64, "square index {} is outside the board (0..=63)", index);
    ALL_SQUARES[index]
}

/// Chebyshev distance between two squares (king steps).
pub fn square_distance(a: Square, b: Square) -> usize {
    let rank_delta = a.get_rank().to_index().abs_diff(b.get_rank().to_index());
    let file_delta = a.get_file().to_index().abs_diff(b.get_file().to_index());
    rank_delta.max(file_delta)
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Position").field(&self.to_fen()).finish()
    }
}

impl From<ChessBoard> for Position {
    fn from(board: ChessBoard) -> Self {
        let pinned = [
            Self::compute_pinned(&board, Color::White),
            Self::compute_pinned(&board, Color::Black),
        ];
        Self { inner: board, pinned }
    }
}

impl AsRef<ChessBoard> for Position {
    fn as_ref(&self) -> &ChessBoard {
        &self.inner
    }
}
