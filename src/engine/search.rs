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

//! Primary search algorithms.
//!
//! All chess engines do some sort of tree searching, and as a classical engine,
//! Fiddler uses a variation of Minimax search.
//! In this case, Fiddler uses principal-variation search, which runs in
//! Omega(b^{d/2}) time, so long as the move ordering is correct and causes the
//! most critical moves to be searched first at each depth.
//!
//! At each leaf of the principal-variation search, a second, shorter quiescence
//! search is performed to exhaust all captures in the position, preventing the
//! mis-evaluation of positions with hanging pieces.

use crate::base::{
    game::Game,
    movegen::{get_moves, has_moves, is_legal, GenMode},
    Color, Move, Piece, Square,
};

use super::{
    evaluate::Eval,
    transposition::{BoundType, TTEntry, TTEntryGuard},
};

use super::{
    evaluate::evaluate, limit::SearchLimit,
    pick::{MovePicker, TaggedMove},
    thread::SearchConfig, transposition::TTable,
};

use std::{cmp::max, sync::PoisonError};

/// The reduction applied to the search depth during null-move pruning.
const NULL_MOVE_REDUCTION: i8 = 2;

/// The number of moves which must be searched at full depth before LMR may kick in.
const LMR_MIN_MOVE_INDEX: u16 = 4;

#[derive(Clone, Debug)]
#[allow(clippy::module_name_repetitions)]
/// A `[from][to]`-indexed table of history heuristic scores.
///
/// Every time a quiet move causes a beta cutoff, its score is bumped by the square of the depth
/// it was found at, so that cutoffs found deep in the tree (and therefore more reliable) count for
/// more than shallow ones.
pub struct HistoryTable {
    scores: Vec<i32>,
}

impl HistoryTable {
    /// The ceiling (and floor, negated) on the bonus a single entry can contribute to move
    /// ordering, so that a long search cannot let history swamp the static move-quality estimate.
    const BONUS_CAP: i32 = 2000;

    fn new() -> HistoryTable {
        HistoryTable {
            scores: vec![0; 64 * 64],
        }
    }

    const fn index(m: Move) -> usize {
        m.from_square() as usize * 64 + m.to_square() as usize
    }

    /// Record that `m` caused a beta cutoff at `depth_to_go`.
    fn record_cutoff(&mut self, m: Move, depth_to_go: i8) {
        let d = i32::from(depth_to_go.max(0));
        let idx = Self::index(m);
        self.scores[idx] = (self.scores[idx] + d * d).min(Self::BONUS_CAP * Self::BONUS_CAP);
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    /// The move-ordering bonus `m` should receive from history, as an `Eval` delta.
    pub fn bonus(&self, m: Move) -> Eval {
        let raw = self.scores[Self::index(m)] / 64;
        Eval::centipawns(raw.clamp(-Self::BONUS_CAP, Self::BONUS_CAP) as i16)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
/// The types of errors which can occur during a search.
pub enum SearchError {
    /// This search failed due to timeout.
    Timeout,
    /// This search failed because a lock was poisoned.
    Poison,
    /// This searched failed because a thread failed to join.
    Join,
}

impl<T> From<PoisonError<T>> for SearchError {
    #[inline(always)]
    fn from(_: PoisonError<T>) -> Self {
        SearchError::Poison
    }
}

#[allow(clippy::module_name_repetitions)]
/// The result of performing a search.
/// The `Ok` version contains data on the search, while the `Err` version
/// contains a reason why the search failed.
pub type SearchResult = Result<SearchInfo, SearchError>;

#[allow(clippy::too_many_arguments, clippy::cast_possible_wrap)]
/// Evaluate the given game.
/// The evaluation will be from the player's perspective, i.e. inverted if the
/// player to move is Black.
///
/// Inputs:
/// * `g`: the game which will be evaluated.
/// * `ttable`: a reference to the shared transposition table.
/// * `config`: the configuration of this search.
/// * `limit`:the search limiter, which will be interiorly mutated by this
///     function.
/// * `is_main`: whether or not this search is the "main" search or a subjugate
///     thread, and determines responsibilities as such.
/// * `alpha`: a lower bound on the evaluation.
///     This is primarily intended to be used for aspiration windowing, and in
///     most cases will be set to `Eval::MIN`.
/// * `beta`: is an upper bound on the evaluation.
///     This is primarily intended to be used for aspiration windowing, and in
///     most cases will be set to `Eval::MAX`.
pub fn search(
    g: Game,
    depth: u8,
    ttable: &TTable,
    config: &SearchConfig,
    limit: &SearchLimit,
    is_main: bool,
    alpha: Eval,
    beta: Eval,
) -> SearchResult {
    let mut searcher = PVSearch::new(g, ttable, config, limit, is_main);
    let mut pv = Vec::new();

    let eval = searcher.pvs::<true, true, true>(
        depth as i8,
        0,
        alpha,
        beta,
        &mut pv,
        depth as i8 / 2,
    )?;

    Ok(SearchInfo {
        pv,
        eval,
        num_transpositions: searcher.num_transpositions,
        num_nodes_evaluated: searcher.num_nodes_evaluated,
        depth,
        selective_depth: searcher.selective_depth,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
/// Information about the search which will be returned at the end of a search.
pub struct SearchInfo {
    /// The principal variation.
    pub pv: Vec<Move>,
    /// The evaluation of the position.
    pub eval: Eval,
    /// The number of times a transposition table get was successful.
    pub num_transpositions: u64,
    /// The number of nodes evaluated in this search.
    pub num_nodes_evaluated: u64,
    /// The highest depth at which this search succeeded.
    pub depth: u8,
    /// The selective search depth, i.e. the highest depth to which any position
    /// was considered.
    pub selective_depth: u8,
}


#[derive(Clone, Debug)]
/// A structure containing data which is shared across function calls to a
/// principal variation search.
struct PVSearch<'a> {
    /// The game being searched.
    game: Game,
    /// The transposition table.
    ttable: &'a TTable,
    /// The set of "killer" moves. Each index corresponds to a depth (0 is most
    /// shallow, etc).
    killer_moves: Vec<Move>,
    /// The cumulative number of nodes evaluated in this evaluation.
    num_nodes_evaluated: u64,
    /// The cumulative number of nodes visited since we last updated the limit.
    nodes_since_limit_update: u16,
    /// The cumulative number of transpositions.
    num_transpositions: u64,
    /// The configuration of this search.
    config: &'a SearchConfig,
    /// The limit to this search.
    limit: &'a SearchLimit,
    /// Whether this search is the main search.
    is_main: bool,
    /// The highest depth to which any line was searched.
    selective_depth: u8,
    /// The history heuristic table, used to rank quiet moves which are not the killer.
    history: HistoryTable,
    /// The destination square of the previously-played move, used to detect recaptures for the
    /// recapture extension. `None` at the root.
    last_destination: Option<Square>,
}

impl<'a> PVSearch<'a> {
    /// Construct a new `PVSearch` using a given transposition table,
    /// configuration, and limit.
    /// `is_main` is whether the thread is a main search, responsible for
    /// certain synchronization activities.
    pub fn new(
        game: Game,
        ttable: &'a TTable,
        config: &'a SearchConfig,
        limit: &'a SearchLimit,
        is_main: bool,
    ) -> PVSearch<'a> {
        PVSearch {
            game,
            ttable,
            killer_moves: vec![Move::BAD_MOVE; usize::from(u8::MAX) + 1],
            num_nodes_evaluated: 0,
            nodes_since_limit_update: 0,
            num_transpositions: 0,
            config,
            limit,
            is_main,
            selective_depth: 0,
            history: HistoryTable::new(),
            last_destination: None,
        }
    }

    /// Use Principal Variation Search to evaluate the given game to a depth.
    ///
    /// At each node, the search will examine all legal moves and try to find
    /// the best line, recursively searching to `depth_to_go` moves deep.
    /// However, some heuristics will cause certain lines to be examined more
    /// deeply than `depth_to_go`, and some less so.
    /// When `depth_to_go` reaches zero, a quiescence search will be performed,
    /// preventing the evaluation of "loud" positions from giving incorrect
    /// results.
    ///
    /// When the search is complete, the `Ok()` variant will contain the
    /// evaluation of the position.
    ///
    /// # Inputs
    ///
    /// * `PV`: Whether this node is a principal variation node.
    ///     At the root, this should be `true`.
    /// * `ROOT`: Whether this is the root node of the search.
    ///     External callers of this function should always set `ROOT` to
    ///     `true`.
    /// * `REDUCE`: Whether heuristic depth reduction should be performed.
    /// * `depth_to_go`: The depth to search the position.
    /// * `depth_so_far`: The depth of the recursive stack when this function
    ///     was called. At the start of the search, `depth_so_far` is 0.
    /// * `alpha`: A lower bound on the evaluation of a parent node, in
    ///     perspective of the player to move.
    ///     One way of thinking of `alpha` is that it is the best score that the
    ///     player to move could get if they made a move which did *not* cause
    ///     `pvs()` to be called in this position.
    ///     When called externally, `alpha` should be equal to `Eval::MIN`.
    /// * `beta`: An upper bound on the evaluation of a parent node, in
    ///     perspective of the player to move.
    ///     `beta` can be thought of as the worst score that the opponent of the
    ///     current player to move could get if they decided not to allow the
    ///     current player to make a move.
    ///     When called externally, `beta` should be equal to `Eval::MAX`.
    /// * `parent_line`: The principal variation line of the parent position.
    ///     `parent_line` will be overwritten with the best line found by this
    ///     search, so long as it achieves an alpha cutoff at some point.
    ///
    /// # Errors
    ///
    /// This function will return an error under the conditions described in
    /// `SearchError`'s variants.
    /// The most likely cause of an error will be `SearchError::Timeout`, which
    /// is returned if the limit times out while `pvs()` is runninself.game.
    /// `ext_budget` is the number of plies of search extension still available along this line,
    /// so that check, recapture, and passed-pawn-push extensions cannot runaway the search; it is
    /// initialized to half of the requested root depth and decremented whenever an extension is
    /// granted.
    pub fn pvs<const PV: bool, const ROOT: bool, const REDUCE: bool>(
        &mut self,
        depth_to_go: i8,
        depth_so_far: u8,
        mut alpha: Eval,
        mut beta: Eval,
        parent_line: &mut Vec<Move>,
        ext_budget: i8,
    ) -> Result<Eval, SearchError> {
        // verify that ROOT implies PV
        debug_assert!(if ROOT { PV } else { true });

        if self.is_main {
            self.limit.update_time();
        }

        if self.limit.is_over() {
            return Err(SearchError::Timeout);
        }

        if depth_to_go <= 0 {
            return self.quiesce::<PV>(depth_so_far, alpha, beta, parent_line);
        }

        self.increment_nodes()?;
        self.selective_depth = max(self.selective_depth, depth_so_far);

        // mate distance pruning
        let lower_bound = -Eval::mate_in(depth_so_far);
        if alpha < lower_bound {
            if beta <= lower_bound {
                if PV {
                    parent_line.clear();
                }
                return Ok(lower_bound);
            }
            alpha = lower_bound;
        }

        let upper_bound = Eval::mate_in(1 + depth_so_far);
        if upper_bound < beta {
            if upper_bound <= alpha {
                if PV {
                    parent_line.clear();
                }
                return Ok(upper_bound);
            }
            beta = upper_bound;
        }

        // detect draws.
        if self.game.drawn_by_repetition(self.game.len() as u16) || self.game.board().is_drawn() {
            if PV && alpha < Eval::DRAW {
                parent_line.clear();
            }
            // required so that movepicker only needs to know about current
            // position, and not about history
            return Ok(Eval::DRAW);
        }

        // Retrieve transposition data and use it to improve our estimate on
        // the position
        let mut tt_move = None;
        let mut tt_guard = self.ttable.get(self.game.board().hash);
        if let Some(entry) = tt_guard.entry() {
            self.num_transpositions += 1;
            let m = entry.best_move;
            if is_legal(m, self.game.board()) {
                tt_move = Some(m);
                // check if we can cutoff due to transposition table
                if !PV && entry.depth >= depth_to_go {
                    let value = entry.value.step_back_by(depth_so_far);
                    match entry.bound_type() {
                        BoundType::Exact => return Ok(value),
                        BoundType::Upper if value <= alpha => return Ok(value),
                        BoundType::Lower if beta <= value => return Ok(value),
                        BoundType::Upper | BoundType::Lower => {}
                    }
                }
            }
        }

        let in_check = !self.game.board().checkers.is_empty();
        let static_eval = evaluate(&self.game).in_perspective(self.game.board().player);

        // null-move pruning: if we're so far ahead that even giving our opponent a free move
        // fails to bring them back into the game, assume a reduced-depth search would confirm a
        // cutoff and skip straight to it.
        if !PV
            && !ROOT
            && !in_check
            && depth_to_go >= 3
            && static_eval >= beta
            && has_non_pawn_material(&self.game)
        {
            self.game.null_move();
            let mut null_line = Vec::new();
            let null_score = -self.pvs::<false, false, REDUCE>(
                depth_to_go - 1 - NULL_MOVE_REDUCTION,
                depth_so_far + 1,
                -beta,
                -beta + Eval::centipawns(1),
                &mut null_line,
                ext_budget,
            )?;
            self.game.undo_null();

            if null_score >= beta {
                return Ok(null_score);
            }
        }

        // razoring: at shallow depth, if the static evaluation is so far below alpha that only a
        // tactical shot could save us, drop straight to quiescence rather than searching quiets.
        if !PV && !ROOT && !in_check && (1..=2).contains(&depth_to_go) {
            let margin = Eval::centipawns(if depth_to_go == 1 { 300 } else { 500 });
            if static_eval + margin < alpha {
                return self.quiesce::<PV>(depth_so_far, alpha, beta, parent_line);
            }
        }

        let mut moves_iter = MovePicker::new(
            tt_move,
            self.killer_moves.get(depth_so_far as usize).copied(),
        );
        let mut best_move = Move::BAD_MOVE;
        let mut best_score = Eval::MIN;

        // The number of moves checked. If this is zero after the move search
        // loop, no moves were played.
        let mut move_count = 0;
        // Whether we were able to overwrite alpha by searching moves.
        let mut overwrote_alpha = false;
        while let Some(TaggedMove { m, .. }) = moves_iter.next(&self.game, Some(&self.history)) {
            // The principal variation line, following the best move.
            let mut line = Vec::new();
            move_count += 1;

            // figure out whether this move earns a search extension before playing it, since
            // some of the conditions (recapture, pawn push) need the pre-move position.
            let player = self.game.board().player;
            let is_capture = self.game.is_move_capture(m);
            let moving_piece = self.game.piece_at(m.from_square()).map(|(p, _)| p);
            let is_advanced_pawn_push = moving_piece == Some(Piece::Pawn)
                && match player {
                    Color::White => m.to_square().rank() >= 5,
                    Color::Black => m.to_square().rank() <= 2,
                };
            let is_recapture = is_capture && self.last_destination == Some(m.to_square());

            let prev_last_destination = self.last_destination;
            self.game.make_move(m);
            self.last_destination = Some(m.to_square());
            let mut score = Eval::MIN;

            let gives_check = !self.game.board().checkers.is_empty();
            let ext = i8::from(
                ext_budget > 0 && (gives_check || is_recapture || is_advanced_pawn_push),
            );
            let child_budget = ext_budget - ext;

            if !PV || move_count > 1 {
                // For moves which are not the first move searched at a PV node,
                // or for moves which are not in a PV node,
                // perform a zero-window search of the position.

                let do_lmr = ext == 0
                    && (REDUCE && (PV && move_count > 3) || (!PV && move_count > 1));

                let depth_to_search = if do_lmr {
                    depth_to_go - 2
                } else {
                    depth_to_go - 1 + ext
                };

                score = -self.pvs::<false, false, REDUCE>(
                    depth_to_search,
                    depth_so_far + 1,
                    -alpha - Eval::centipawns(1),
                    -alpha,
                    &mut line,
                    child_budget,
                )?;

                // if the LMR search causes an alpha cutoff, ZW search again at
                // full depth.
                if score > alpha && do_lmr {
                    score = -self.pvs::<false, false, REDUCE>(
                        depth_to_go - 1,
                        depth_so_far + 1,
                        -alpha - Eval::centipawns(1),
                        -alpha,
                        &mut line,
                        child_budget,
                    )?;
                }
            }

            if PV && (move_count == 1 || (alpha < score && score < beta)) {
                // Either this is the first move on a PV node, or the previous
                // search returned a PV candidate.
                score = -self.pvs::<true, false, REDUCE>(
                    depth_to_go - 1 + ext,
                    depth_so_far + 1,
                    -beta,
                    -alpha,
                    &mut line,
                    child_budget,
                )?;
            }

            let undo_result = self.game.undo();
            debug_assert!(undo_result.is_ok());
            self.last_destination = prev_last_destination;

            if score > best_score {
                best_score = score;
                best_move = m;

                if score > alpha {
                    // if this move was better than what we've seen before,
                    // write it as the principal variation
                    if PV {
                        write_line(parent_line, m, &line);
                    }

                    if beta <= score {
                        // Beta cutoff: we found a move that was so good that
                        // our opponent would never have let us play it in the
                        // first place. Therefore, we need not consider the
                        // other moves, since we wouldn't be allowed to play
                        // them either.
                        if !is_capture {
                            self.history.record_cutoff(m, depth_to_go);
                            self.killer_moves[depth_so_far as usize] = m;
                        }
                        break;
                    }

                    // to keep alpha < beta, only write to alpha if there was
                    // not a beta cutoff
                    overwrote_alpha = true;
                    alpha = score;
                }
            }
        }

        debug_assert!((move_count == 0) ^ has_moves(self.game.board()));

        if move_count == 0 {
            // No moves were played, therefore this position is either a
            // stalemate or a mate.
            best_score = if self.game.board().checkers.is_empty() {
                // stalemated
                Eval::DRAW
            } else {
                // mated
                lower_bound
            };
        }

        debug_assert!(Eval::MIN < best_score && best_score < Eval::MAX);

        ttable_store(
            &mut tt_guard,
            depth_so_far,
            depth_to_go,
            if overwrote_alpha { Eval::MIN } else { alpha },
            beta,
            best_score,
            best_move,
        );

        Ok(best_score)
    }

    /// Use quiescent search (captures only) to evaluate a position as deep as
    /// it needs to go until all loud moves are exhausted.
    /// The given `depth_to_go` does not alter the power of the search, but
    /// serves as a handy tool for the search to understand where it is.
    fn quiesce<const PV: bool>(
        &mut self,
        depth_so_far: u8,
        mut alpha: Eval,
        beta: Eval,
        parent_line: &mut Vec<Move>,
    ) -> Result<Eval, SearchError> {
        if !self.game.board().checkers.is_empty() {
            // don't allow settling if we are in check
            return self.pvs::<PV, false, false>(
                1,
                depth_so_far,
                alpha,
                beta,
                parent_line,
                0,
            );
        }

        self.increment_nodes()?;
        self.selective_depth = max(self.selective_depth, depth_so_far);

        // check if the game is over before doing anything
        if let Some(mated) = game_over(&self.game) {
            // game is over, quit out immediately
            let score = if mated {
                -Eval::mate_in(depth_so_far)
            } else {
                Eval::DRAW
            };

            if PV && alpha < score {
                parent_line.clear();
            }

            return Ok(score);
        }

        let player = self.game.board().player;

        let mut tt_guard = self.ttable.get(self.game.board().hash);
        if let Some(entry) = tt_guard.entry() {
            if !PV && entry.depth >= TTEntry::DEPTH_CAPTURES {
                // this was a deeper search, just use it
                let value = entry.value.step_back_by(depth_so_far);
                match entry.bound_type() {
                    BoundType::Exact => return Ok(value),
                    BoundType::Upper if value <= alpha => return Ok(value),
                    BoundType::Lower if beta <= value => return Ok(value),
                    BoundType::Upper | BoundType::Lower => {}
                }
            }
        }
        // capturing is unforced, so we can stop here if the player to move
        // doesn't want to capture.
        let mut score = evaluate(&self.game).in_perspective(player);
        // println!("{g}: {score}");

        // Whether alpha was overwritten by any move at this depth.
        // Used to determine whether this is an exact evaluation on a position
        // when writing to the transposition table.
        let mut overwrote_alpha = false;
        if alpha < score {
            if PV {
                parent_line.clear();
            }

            if beta <= score {
                // store in the transposition table since we won't be able to
                // use the call at the end
                ttable_store(
                    &mut tt_guard,
                    depth_so_far,
                    TTEntry::DEPTH_CAPTURES,
                    Eval::MIN,
                    beta,
                    score,
                    Move::BAD_MOVE,
                );
                // beta cutoff, this line would not be selected because there is a
                // better option somewhere else
                return Ok(score);
            }

            overwrote_alpha = true;
            alpha = score;
        }

        let mut best_score = score;
        let mut moves = Vec::new();
        get_moves::<{ GenMode::Captures }>(self.game.board(), |m| {
            moves.push(TaggedMove::new(&self.game, m));
        });
        moves.sort_by_key(|tm| std::cmp::Reverse(tm.quality));
        let mut line = Vec::new();

        for TaggedMove { m, .. } in moves {
            self.game.make_move(m);
            // zero-window search
            score = -self.quiesce::<false>(
                depth_so_far + 1,
                -alpha - Eval::centipawns(1),
                -alpha,
                &mut line,
            )?;
            if PV && alpha < score && score < beta {
                // zero-window search failed high, so there is a better option
                // in this tree. we already have a score from before that we
                // can use as a lower bound in this search.
                score = -self.quiesce::<PV>(
                    depth_so_far + 1,
                    -beta,
                    -alpha,
                    &mut line,
                )?;
            }

            let undo_result = self.game.undo();
            // in test mode, verify that we did correctly undo a move
            debug_assert!(undo_result.is_ok());

            if score > best_score {
                best_score = score;
                if alpha < score {
                    if PV {
                        write_line(parent_line, m, &line);
                    }
                    if beta <= score {
                        // Beta cutoff, we have ound a better line somewhere else
                        self.killer_moves[depth_so_far as usize] = m;
                        break;
                    }

                    overwrote_alpha = true;
                    alpha = score;
                }
            }
        }

        ttable_store(
            &mut tt_guard,
            depth_so_far,
            TTEntry::DEPTH_CAPTURES,
            if overwrote_alpha { Eval::MIN } else { alpha },
            beta,
            best_score,
            Move::BAD_MOVE,
        );
        Ok(best_score)
    }

    #[inline(always)]
    /// Increment the number of nodes searched, copying over the value into the
    /// search limit if it is too high.
    fn increment_nodes(&mut self) -> Result<(), SearchError> {
        self.num_nodes_evaluated += 1;
        self.nodes_since_limit_update += 1;
        if u64::from(self.nodes_since_limit_update)
            > self.config.limit_update_increment
        {
            self.update_node_limits()?;
        }
        Ok(())
    }

    #[inline(always)]
    /// Copy over the number of nodes evaluated by this search into the limit
    /// structure, and zero out our number.
    fn update_node_limits(&mut self) -> Result<(), SearchError> {
        self.limit
            .add_nodes(u64::from(self.nodes_since_limit_update));
        self.nodes_since_limit_update = 0;
        Ok(())
    }
}

/// Does the player to move have any piece other than pawns and the king?
/// Null-move pruning is unsound in king-and-pawn endgames, where "doing nothing" can be the
/// losing move (zugzwang), so this guards against trying it there.
fn has_non_pawn_material(g: &Game) -> bool {
    let player = g.board().player;
    let minor_major = g.by_color(player) & !(g.by_piece(Piece::Pawn) | g.by_piece(Piece::King));
    !minor_major.is_empty()
}

/// Has the game ended in this position? Returns `None` if the position still has legal
/// moves, `Some(true)` if the player to move is checkmated, or `Some(false)` on stalemate.
fn game_over(g: &Game) -> Option<bool> {
    if has_moves(g.board()) {
        None
    } else {
        Some(!g.board().checkers.is_empty())
    }
}

/// Write all of the contents of `line` into the section [1..] of `parent_line`.
fn write_line(parent_line: &mut Vec<Move>, m: Move, line: &[Move]) {
    parent_line.resize(1, m);
    parent_line[0] = m;
    parent_line.extend(line);
}

/// Store data in the transposition table.
/// `score` is the best score of the position as evaluated, while `alpha`
/// and `beta` are the upper and lower bounds on the overall position due
/// to alpha-beta pruning in the game.
fn ttable_store(
    guard: &mut TTEntryGuard,
    depth_so_far: u8,
    depth_to_go: i8,
    alpha: Eval,
    beta: Eval,
    score: Eval,
    best_move: Move,
) {
    let true_score = score.step_forward_by(depth_so_far);
    let kind = if score <= alpha {
        BoundType::Upper
    } else if beta <= score {
        BoundType::Lower
    } else {
        BoundType::Exact
    };
    guard.save(depth_to_go, best_move, true_score, kind);
}
#[cfg(test)]
pub mod tests {

    use super::*;
    use crate::base::{Move, Square};

    /// Helper function to search a position at a given depth.
    ///
    /// # Panics
    ///
    /// This function will panic if searching the position fails or the game is
    /// invalid.
    fn search_helper(fen: &str, depth: u8) -> SearchInfo {
        let mut g = Game::from_fen(fen).unwrap();
        let config = SearchConfig {
            depth,
            ..Default::default()
        };
        let info = search(
            g.clone(),
            depth,
            &TTable::with_size(1000),
            &config,
            &SearchLimit::default(),
            true,
            Eval::MIN,
            Eval::MAX,
        )
        .unwrap();

        // validate principal variation
        for &m in &info.pv {
            println!("{m}");
            assert!(is_legal(m, g.board()));
            g.make_move(m);
        }

        info
    }

    /// A helper function which ensures that the evaluation of a position is
    /// equal to what we expect it to be.
    /// It will check both a normal search and a search without the
    /// transposition table.
    fn eval_helper(fen: &str, eval: Eval, depth: u8) {
        assert_eq!(search_helper(fen, depth).eval, eval);
    }

    #[test]
    /// Test `PVSearch`'s evaluation of the start position of the game.
    fn eval_start() {
        let info = search_helper(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            8,
        );
        println!("best move: {} [{}]", info.pv[0], info.eval);
    }

    #[test]
    /// A test on the evaluation of the game in the fried liver position.
    /// The only winning move for White is Qd3+.
    fn fried_liver() {
        let info = search_helper(
            "r1bq1b1r/ppp2kpp/2n5/3np3/2B5/8/PPPP1PPP/RNBQK2R w KQ - 0 7",
            8,
        );
        let m = Move::normal(Square::D1, Square::F3);
        assert_eq!(info.pv[0], m);
    }

    #[test]
    /// Try searching an end-ish game position.
    /// This was used as part of debugging for an illegal PV being created.
    fn endgame() {
        search_helper(
            "2k5/pp3pp1/2p1pr2/Pn2b3/1P1P1P1r/2p1P1N1/6R1/3R2K1 w - - 0 1",
            6,
        );
    }

    #[test]
    /// A test that the engine can find a mate in 1 move.
    fn mate_in_1() {
        // Rb8# is mate in one
        eval_helper("3k4/R7/1R6/5K2/8/8/8/8 w - - 0 1", Eval::mate_in(1), 2);
    }

    #[test]
    /// A test that shows the engine can find a mate in 4 plies, given enough
    /// depth.
    fn mate_in_4_ply() {
        // because black, the player to move, is getting mated, the evaluation
        // is negative here
        eval_helper("3k4/R7/8/5K2/3R4/8/8/8 b - - 0 1", -Eval::mate_in(4), 5);
    }

    #[test]
    /// A test for a puzzle made by Ian. White has mate in 5 with Rxf7+.
    fn mate_in_9_ply() {
        // because capturing a low-value piece is often a "late" move, it is
        // likely to be reduced in depth
        eval_helper(
            "2r2r2/3p1p1k/p3p1p1/3P3n/q3P1Q1/1p5P/1PP2R2/1K4R1 w - - 0 30",
            Eval::mate_in(9),
            11,
        );
    }

    #[test]
    /// Test that the transposition table contains an entry for the root node of
    /// the search.
    fn ttable_populated() {
        let ttable = TTable::with_size(1);
        let g = Game::new();
        let depth = 5;

        let search_info = search(
            g.clone(),
            depth,
            &ttable,
            &SearchConfig {
                depth: 5,
                ..Default::default()
            },
            &SearchLimit::new(),
            true,
            Eval::MIN,
            Eval::MAX,
        )
        .unwrap();

        let entry = ttable.get(g.board().hash).entry().unwrap();

        // println!("{entry:?}");
        // println!("{search_info:?}");
        assert_eq!(entry.depth, i8::try_from(depth).unwrap());
        assert_eq!(entry.best_move, search_info.pv[0]);
        assert_eq!(entry.bound_type(), BoundType::Exact);
    }
}
