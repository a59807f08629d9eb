use chess::Piece;

pub const PAWN_VALUE: u8 = 1;
pub const KNIGHT_VALUE: u8 = 3;
pub const BISHOP_VALUE: u8 = 3;
pub const ROOK_VALUE: u8 = 5;
pub const QUEEN_VALUE: u8 = 9;

/// Material value of a piece taking part in an exchange.
///
/// Kings never capture in the exchange model and have no value here.
pub fn capture_value(piece: Piece) -> Option<u8> {
    match piece {
        Piece::Pawn => Some(PAWN_VALUE),
        Piece::Knight => Some(KNIGHT_VALUE),
        Piece::Bishop => Some(BISHOP_VALUE),
        Piece::Rook => Some(ROOK_VALUE),
        Piece::Queen => Some(QUEEN_VALUE),
        Piece::King => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_values() {
        assert_eq!(capture_value(Piece::Pawn), Some(PAWN_VALUE));
        assert_eq!(capture_value(Piece::Knight), capture_value(Piece::Bishop));
        assert_eq!(capture_value(Piece::Queen), Some(QUEEN_VALUE));
        assert_eq!(capture_value(Piece::King), None);
    }
}
