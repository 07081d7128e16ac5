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

//! Basic mating technique for lone-king endgames.
//!
//! Piece-square tables are static per square, so they cannot express that a king should be
//! driven towards *another piece*, rather than towards a fixed corner. In a KQ vs K or KR vs K
//! ending, the winning side needs to push the lone king to the edge of the board and then walk
//! its own king in to help deliver mate; this rule adds that knowledge directly.

use crate::base::{game::Game, Color, Square, CHEBYSHEV_DISTANCE, MANHATTAN_DISTANCE};

use super::Score;

/// The four center squares, used to measure how far the losing king has been pushed towards the
/// rim of the board.
const CENTER_SQUARES: [Square; 4] = [Square::D4, Square::D5, Square::E4, Square::E5];

/// The four corners, used to measure how far the losing king has been pushed into a corner.
/// Corner-pushing is a gentler nudge than edge-pushing: it matters most for bishop-and-knight
/// mates, but it never hurts a rook or queen mate either, since every mate of a lone king
/// ultimately happens in a corner or on an edge next to one.
const CORNER_SQUARES: [Square; 4] = [Square::A1, Square::A8, Square::H1, Square::H8];

/// The largest possible Manhattan distance between two squares on the board.
const MAX_MANHATTAN_DISTANCE: u8 = 14;

/// The largest possible Chebyshev distance between two squares on the board.
const MAX_CHEBYSHEV_DISTANCE: u8 = 7;

/// Reward, per unit of Chebyshev distance from the center, for pushing the losing king towards
/// the rim.
const EDGE_PUSH_VALUE: Score = Score::centipawns(0, 10);

/// Reward, per unit of reduced Manhattan distance to the nearest corner, for pushing the losing
/// king into a corner.
const CORNER_PUSH_VALUE: Score = Score::centipawns(0, 4);

/// Reward, per unit of reduced Chebyshev distance, for bringing the winning king closer to the
/// losing king.
const KING_DISTANCE_VALUE: Score = Score::centipawns(0, 6);

#[must_use]
/// Get an evaluation of basic mating technique, from the player-to-move's perspective.
///
/// This only contributes a score once one side is reduced to a lone king (or a king with pawns)
/// and the other has no more than one queen or rook and nothing else; otherwise it is a no-op.
pub fn evaluate(g: &Game) -> Score {
    let Some(strong) = mating_side(g) else {
        return Score::DRAW;
    };
    let weak = !strong;

    let weak_king = g.king_sq(weak);
    let strong_king = g.king_sq(strong);

    let center_distance = CENTER_SQUARES
        .iter()
        .map(|&c| CHEBYSHEV_DISTANCE[weak_king as usize][c as usize])
        .min()
        .unwrap_or(0);
    let corner_distance = CORNER_SQUARES
        .iter()
        .map(|&c| MANHATTAN_DISTANCE[weak_king as usize][c as usize])
        .min()
        .unwrap_or(0);
    let king_distance = strong_king.chebyshev_to(weak_king);

    let raw = EDGE_PUSH_VALUE * center_distance
        + CORNER_PUSH_VALUE * (MAX_MANHATTAN_DISTANCE - corner_distance)
        + KING_DISTANCE_VALUE * (MAX_CHEBYSHEV_DISTANCE - king_distance);

    if strong == g.meta().player {
        raw
    } else {
        Score::DRAW - raw
    }
}

#[must_use]
/// Is one side reduced to mating material (at most one queen or rook, nothing else) against a
/// lone king? If so, return the side with the mating material.
fn mating_side(g: &Game) -> Option<Color> {
    if is_lone_king(g, Color::Black) && has_only_minor_mating_piece(g, Color::White) {
        Some(Color::White)
    } else if is_lone_king(g, Color::White) && has_only_minor_mating_piece(g, Color::Black) {
        Some(Color::Black)
    } else {
        None
    }
}

/// Does `color` have nothing on the board but its king?
fn is_lone_king(g: &Game, color: Color) -> bool {
    (g.by_color(color) & !g.kings()).is_empty()
}

/// Does `color` have nothing but its king, plus at most one queen or rook?
fn has_only_minor_mating_piece(g: &Game, color: Color) -> bool {
    let non_king = g.by_color(color) & !g.kings();
    let heavy = non_king & (g.queens() | g.rooks());
    non_king == heavy && heavy.len() <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_in_midgame() {
        let g = Game::new();
        assert_eq!(evaluate(&g), Score::DRAW);
    }

    #[test]
    fn kr_vs_k_pushes_king_to_edge() {
        // Black king in the center is worse for Black than Black king on the rim.
        let center = Game::from_fen("8/8/8/3k4/8/2K5/8/6R1 w - - 0 1").unwrap();
        let edge = Game::from_fen("7k/8/8/8/8/2K5/8/6R1 w - - 0 1").unwrap();

        assert!(evaluate(&edge).eg > evaluate(&center).eg);
    }

    #[test]
    fn no_bonus_with_extra_material() {
        // White has a rook and a bishop, so this is not a basic KR vs K mate.
        let g = Game::from_fen("7k/8/8/8/8/2K5/8/2B3R1 w - - 0 1").unwrap();
        assert_eq!(evaluate(&g), Score::DRAW);
    }

    #[test]
    fn symmetric_for_black_to_move() {
        let fen_white_to_move = "7k/8/8/8/8/2K5/8/6R1 w - - 0 1";
        let fen_black_to_move = "7k/8/8/8/8/2K5/8/6R1 b - - 0 1";

        let white_score = evaluate(&Game::from_fen(fen_white_to_move).unwrap());
        let black_score = evaluate(&Game::from_fen(fen_black_to_move).unwrap());

        assert_eq!(white_score, black_score);
    }
}
