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
#![feature(adt_const_params)]
#![allow(incomplete_features)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]

//! Fiddler, a UCI-compatible chess engine.
//!
//! This crate is split into two halves: [`base`], which defines the rules of chess (board
//! representation, move generation, and game history), and [`engine`], which builds a search
//! and evaluation engine on top of those rules and speaks UCI to a GUI.

pub mod base;
pub mod engine;
