/*
  Fiddler, a UCI-compatible chess engine.
  Copyright (C) 2022 Clayton Ramsey.

  Fiddler is free software: you can redistribute it and/or modify
  it under the terms of the GNU General Public License as published by
  the Free Software Foundation, either version 3 of the License, or
  (at your option) any later version.

  Fiddler is distributed in the hope that it will be useful,
  but WITHOUT ANY WARRANTY; without even the implied warranty of
  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
  GNU General Public License for more details.

  You should have received a copy of the GNU General Public License
  along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

//! Full chess games, including history and metadata.
//!
//! A `Game` is a stack of `Board` snapshots plus the list of moves that produced them.
//! Every legality-sensitive rule (threefold repetition, the cooperative worker boundary
//! that the search driver uses to undo moves) lives here; material draws and check/pin
//! bookkeeping live on `Board` itself, since they need no history to compute.

use super::{board::Board, movegen::GenMode, zobrist, Bitboard, Color, Move, Piece, Square};

use std::{
    fmt::{Display, Formatter},
    ops::Deref,
};

#[derive(Clone, Debug, PartialEq)]
/// A game in progress: a stack of board snapshots and the moves that connect them.
pub struct Game {
    /// `history[0]` is the position the game started from; `history.last()` is current.
    history: Vec<Board>,
    /// The moves played to get from `history[0]` to the current position.
    /// A `None` entry marks a null move.
    pub moves: Vec<Option<Move>>,
}

impl Game {
    #[must_use]
    /// Construct a new game in the conventional chess starting position.
    pub fn new() -> Game {
        Game {
            history: vec![Board::new()],
            moves: Vec::new(),
        }
    }

    /// Construct a game from a FEN string.
    ///
    /// # Errors
    ///
    /// Will return an error if `fen` is not a legal FEN string, or if the position it
    /// describes is not a legal chess position.
    pub fn from_fen(fen: &str) -> Result<Game, &'static str> {
        let board = Board::from_fen(fen).map_err(|_| "illegal FEN string")?;
        Ok(Game {
            history: vec![board],
            moves: Vec::new(),
        })
    }

    #[must_use]
    /// Get the board representing the current position.
    pub fn board(&self) -> &Board {
        // there is always at least the starting position
        self.history.last().unwrap()
    }

    #[must_use]
    /// Get the metadata (side to move, castling rights, check/pin info, hash) of the current
    /// position. `Board` already carries this metadata directly, so this is just `board()`
    /// under the name the evaluator expects.
    pub fn meta(&self) -> &Board {
        self.board()
    }

    #[must_use]
    /// Get the number of half-moves played since the start of the game.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    /// Is this game at its starting position?
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Play a move on the board, assuming it is legal.
    pub fn make_move(&mut self, m: Move) {
        let mut next = *self.board();
        next.make_move(m);
        self.history.push(next);
        self.moves.push(Some(m));
    }

    /// Attempt to play a move, validating that it is among the legal moves in this position.
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if `m` is not legal in the current position. The game is left
    /// unmodified on failure.
    pub fn try_move(&mut self, m: Move) -> Result<(), ()> {
        let mut found = false;
        super::movegen::get_moves::<{ GenMode::All }>(self.board(), |cand| {
            if cand == m {
                found = true;
            }
        });
        if !found {
            return Err(());
        }
        self.make_move(m);
        Ok(())
    }

    /// Play a null move: pass the turn without moving a piece.
    ///
    /// # Panics
    ///
    /// Panics (in debug builds) if the side to move is in check, since null moves are only
    /// sound when the side to move is not in check.
    pub fn null_move(&mut self) {
        debug_assert!(self.board().checkers.is_empty());
        let mut next = *self.board();
        let mut hash = next.hash;
        if let Some(ep) = next.en_passant_square {
            hash ^= zobrist::ep_key(ep);
        }
        next.en_passant_square = None;
        next.player = !next.player;
        hash ^= zobrist::BLACK_TO_MOVE_KEY;
        next.hash = hash;
        next.checkers = Bitboard::EMPTY;
        self.history.push(next);
        self.moves.push(None);
    }

    /// Undo the most recent move (or null move) played.
    ///
    /// # Errors
    ///
    /// Returns an error if called on a game with no moves to undo.
    pub fn undo(&mut self) -> Result<(), &'static str> {
        if self.history.len() <= 1 {
            return Err("cannot undo before the start of the game");
        }
        self.history.pop();
        self.moves.pop();
        Ok(())
    }

    /// Undo a null move. Equivalent to `undo`, kept as a separate name to mirror the
    /// asymmetry between `make_move` and `null_move` at call sites.
    ///
    /// # Panics
    ///
    /// Panics if there is no move to undo.
    pub fn undo_null(&mut self) {
        self.undo().expect("undo_null called with empty history");
    }

    #[must_use]
    /// Is the current position drawn by threefold repetition, counting only the last
    /// `moves_since_root` plies (so a search does not see repetitions that happened before
    /// the position it was asked to search)?
    pub fn drawn_by_repetition(&self, moves_since_root: u16) -> bool {
        let target_hash = self.board().hash;
        let lookback = (moves_since_root as usize).min(self.history.len() - 1);
        let mut seen = 0;
        // walk backward two plies at a time: repetitions always share the side to move
        let mut i = self.history.len() - 1;
        for _ in 0..lookback {
            if i < 2 {
                break;
            }
            i -= 2;
            if self.history[i].hash == target_hash {
                seen += 1;
                if seen >= 2 {
                    return true;
                }
            }
        }
        false
    }

    #[must_use]
    /// Is this game drawn, either by the 50-move rule, insufficient material, or threefold
    /// repetition within the whole recorded history?
    pub fn is_drawn(&self) -> bool {
        self.board().is_drawn() || self.drawn_by_repetition(self.history.len() as u16)
    }

    #[must_use]
    /// Would playing `m` on the current position capture a piece?
    pub fn is_move_capture(&self, m: Move) -> bool {
        self.board().is_move_capture(m)
    }

    #[must_use]
    /// Get the squares occupied by pieces of the given type.
    pub fn by_piece(&self, piece: Piece) -> Bitboard {
        self.board()[piece]
    }

    #[must_use]
    /// Get the squares occupied by pieces of the given color.
    pub fn by_color(&self, color: Color) -> Bitboard {
        self.board()[color]
    }

    #[must_use]
    /// Get the square the king of the given color is on.
    pub fn king_sq(&self, color: Color) -> Square {
        self.board().king_sqs[color as usize]
    }

    #[must_use]
    /// Get the squares occupied by White's pieces.
    pub fn white(&self) -> Bitboard {
        self.by_color(Color::White)
    }

    #[must_use]
    /// Get the squares occupied by Black's pieces.
    pub fn black(&self) -> Bitboard {
        self.by_color(Color::Black)
    }

    #[must_use]
    /// Get the squares occupied by knights of either color.
    pub fn knights(&self) -> Bitboard {
        self.by_piece(Piece::Knight)
    }

    #[must_use]
    /// Get the squares occupied by bishops of either color.
    pub fn bishops(&self) -> Bitboard {
        self.by_piece(Piece::Bishop)
    }

    #[must_use]
    /// Get the squares occupied by rooks of either color.
    pub fn rooks(&self) -> Bitboard {
        self.by_piece(Piece::Rook)
    }

    #[must_use]
    /// Get the squares occupied by queens of either color.
    pub fn queens(&self) -> Bitboard {
        self.by_piece(Piece::Queen)
    }

    #[must_use]
    /// Get the squares occupied by pawns of either color.
    pub fn pawns(&self) -> Bitboard {
        self.by_piece(Piece::Pawn)
    }

    #[must_use]
    /// Get the squares occupied by kings of either color.
    pub fn kings(&self) -> Bitboard {
        self.by_piece(Piece::King)
    }

    #[must_use]
    /// Get the set of all occupied squares.
    pub fn occupancy(&self) -> Bitboard {
        self.board().occupancy()
    }
}

impl Game {
    #[must_use]
    /// Get the piece and color occupying a square, if any.
    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        Some((
            self.board().type_at_square(sq)?,
            self.board().color_at_square(sq)?,
        ))
    }
}

impl Deref for Game {
    type Target = Board;

    /// Expose the current position directly, so functions written against `&Board` (move
    /// generation, legality checks, static evaluation of a single snapshot) accept a `&Game`
    /// without an explicit `.board()` at every call site.
    fn deref(&self) -> &Board {
        self.board()
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

impl Display for Game {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Square;

    #[test]
    fn repetition_off_by_one() {
        let mut g = Game::new();
        let moves = [
            Move::normal(Square::G1, Square::F3),
            Move::normal(Square::G8, Square::F6),
            Move::normal(Square::F3, Square::G1),
            Move::normal(Square::F6, Square::G8),
        ];
        for _ in 0..2 {
            for m in moves {
                g.make_move(m);
            }
        }
        assert!(g.drawn_by_repetition(g.len() as u16));
    }

    #[test]
    fn undo_restores_position() {
        let mut g = Game::new();
        let before = g.board().hash;
        g.make_move(Move::normal(Square::E2, Square::E4));
        assert_ne!(g.board().hash, before);
        g.undo().unwrap();
        assert_eq!(g.board().hash, before);
    }
}
