use chess::{Board, ChessMove, File, MoveGen, Piece, Rank, Square};
use rayon::prelude::*;
use std::str::FromStr;

use crate::board::Position;
use crate::census::compute_attack_census;
use crate::config::AnalysisConfig;
use crate::control::compute_square_control;
use crate::coordination::{piece_coordination, CoordinationSample};
use crate::error::{AnalysisError, Result};
use crate::pgn::PgnGame;

const DEFAULT_WHITE_NAME: &str = "White";
const DEFAULT_BLACK_NAME: &str = "Black";

/// A replayed game: player names and every position from the start through
/// the final move.
#[derive(Debug, Clone)]
pub struct GameRecord {
    white: String,
    black: String,
    moves: Vec<String>,
    positions: Vec<Position>,
}

impl GameRecord {
    /// Replays the mainline of a parsed PGN game.
    ///
    /// Starts from the `FEN` tag when present, otherwise from the initial
    /// position.
    pub fn from_pgn(game: &PgnGame) -> Result<Self> {
        let start = match game.header("FEN") {
            Some(fen) => Position::from_fen(fen)?,
            None => Position::new(),
        };
        let mut record = Self::from_moves(start, game.moves.iter().map(String::as_str))?;
        if let Some(white) = game.header("White") {
            record.white = white.to_string();
        }
        if let Some(black) = game.header("Black") {
            record.black = black.to_string();
        }
        Ok(record)
    }

    /// Replays SAN moves from `start`.
    pub fn from_moves<'a, I>(start: Position, moves: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut positions = vec![start];
        let mut played = Vec::new();

        for (ply, san) in moves.into_iter().enumerate() {
            let board = *positions[positions.len() - 1].as_chess_board();
            let normalized = normalize_san(san);

            let mv = resolve_san(&board, &normalized).map_err(|reason| {
                AnalysisError::InvalidMove {
                    ply: ply + 1,
                    san: san.to_string(),
                    reason,
                }
            })?;

            positions.push(Position::from(board.make_move_new(mv)));
            played.push(normalized);
        }

        log::debug!("replayed {} plies", played.len());
        Ok(Self {
            white: DEFAULT_WHITE_NAME.to_string(),
            black: DEFAULT_BLACK_NAME.to_string(),
            moves: played,
            positions,
        })
    }

    pub fn white(&self) -> &str {
        &self.white
    }

    pub fn black(&self) -> &str {
        &self.black
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// Start position first, then one position per ply.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn final_position(&self) -> &Position {
        &self.positions[self.positions.len() - 1]
    }
}

/// Strips check marks and annotation glyphs and spells castling with letters.
fn normalize_san(san: &str) -> String {
    let trimmed = san.trim_end_matches(['+', '#', '!', '?']);
    match trimmed {
        "0-0" => "O-O".to_string(),
        "0-0-0" => "O-O-O".to_string(),
        other => other.to_string(),
    }
}

fn piece_letter(c: char) -> Option<Piece> {
    match c {
        'N' => Some(Piece::Knight),
        'B' => Some(Piece::Bishop),
        'R' => Some(Piece::Rook),
        'Q' => Some(Piece::Queen),
        'K' => Some(Piece::King),
        _ => None,
    }
}

/// Splits `e8=Q` (or `e8Q`) into the move body and the promotion piece.
fn split_promotion(san: &str) -> std::result::Result<(&str, Option<Piece>), String> {
    if let Some((body, suffix)) = san.split_once('=') {
        let promotion = suffix
            .chars()
            .next()
            .and_then(piece_letter)
            .filter(|&p| p != Piece::King)
            .ok_or_else(|| format!("bad promotion piece in '{}'", san))?;
        return Ok((body, Some(promotion)));
    }

    let mut chars = san.chars().rev();
    match (chars.next(), chars.next()) {
        (Some(last), Some(before)) if before.is_ascii_digit() => {
            match piece_letter(last).filter(|&p| p != Piece::King) {
                Some(promotion) => Ok((&san[..san.len() - 1], Some(promotion))),
                None => Ok((san, None)),
            }
        }
        _ => Ok((san, None)),
    }
}

/// Finds the legal move a normalized SAN token names.
///
/// Matches piece, destination, promotion and any file or rank hint against
/// the legal moves of `board`, so en passant and promotions resolve like any
/// other move.
fn resolve_san(board: &Board, san: &str) -> std::result::Result<ChessMove, String> {
    if !san.is_ascii() {
        return Err(format!("'{}' is not SAN", san));
    }

    if san == "O-O" || san == "O-O-O" {
        let king = board.king_square(board.side_to_move());
        let file = if san == "O-O" { File::G } else { File::C };
        let dest = Square::make_square(king.get_rank(), file);
        return MoveGen::new_legal(board)
            .find(|m| {
                m.get_source() == king
                    && m.get_dest() == dest
                    && king.get_file().to_index().abs_diff(file.to_index()) == 2
            })
            .ok_or_else(|| format!("'{}' is not legal here", san));
    }

    let (body, promotion) = split_promotion(san)?;
    let (piece, rest) = match body.chars().next().and_then(piece_letter) {
        Some(piece) => (piece, &body[1..]),
        None => (Piece::Pawn, body),
    };
    let rest: String = rest.chars().filter(|&c| c != 'x').collect();
    if rest.len() < 2 {
        return Err(format!("'{}' has no destination square", san));
    }

    let (hint, dest) = rest.split_at(rest.len() - 2);
    let dest = Square::from_str(dest).map_err(|_| format!("bad destination in '{}'", san))?;
    let mut file_hint = None;
    let mut rank_hint = None;
    for c in hint.chars() {
        match c {
            'a'..='h' => file_hint = Some(File::from_index(c as usize - 'a' as usize)),
            '1'..='8' => rank_hint = Some(Rank::from_index(c as usize - '1' as usize)),
            _ => return Err(format!("unexpected '{}' in '{}'", c, san)),
        }
    }

    let mut candidates = MoveGen::new_legal(board).filter(|m| {
        let source = m.get_source();
        m.get_dest() == dest
            && m.get_promotion() == promotion
            && board.piece_on(source) == Some(piece)
            && file_hint.map_or(true, |f| source.get_file() == f)
            && rank_hint.map_or(true, |r| source.get_rank() == r)
    });
    match (candidates.next(), candidates.next()) {
        (Some(mv), None) => Ok(mv),
        (None, _) => Err(format!("no legal move matches '{}'", san)),
        (Some(_), Some(_)) => Err(format!("'{}' is ambiguous", san)),
    }
}

fn map_positions<T, F>(record: &GameRecord, parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&Position) -> T + Sync + Send,
{
    if parallel {
        record.positions.par_iter().map(f).collect()
    } else {
        record.positions.iter().map(f).collect()
    }
}

/// Coordination of both sides at every position of the game, in ply order.
pub fn coordination_trace(record: &GameRecord, config: &AnalysisConfig) -> Vec<CoordinationSample> {
    map_positions(record, config.parallel, |position| {
        let census = compute_attack_census(position);
        piece_coordination(position, &census, config)
    })
}

/// Square control balance (sum over the board) at every position, in ply order.
pub fn control_trace(record: &GameRecord, config: &AnalysisConfig) -> Vec<f64> {
    map_positions(record, config.parallel, |position| {
        compute_square_control(position).total()
    })
}
