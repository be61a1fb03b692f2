// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hardware-independent logic for the BBQ10 keyboard controller.
//!
//! The firmware crate handles pins, clocks, and the I2C peripheral block;
//! everything that can be reasoned about (and tested) without a board lives
//! here instead:
//!
//! - [`keymap`]: the fixed 7x5 primary and alternate character tables.
//! - [`debounce`]: per-key debouncing of raw matrix samples.
//! - [`matrix`]: the pressed-key grid, the "reportable change" rule, the
//!   sticky modifier latches, and character resolution.
//! - [`mailbox`]: the single-slot hand-off between the scan loop and the bus
//!   interrupt, including the transport-busy spin-wait.
//! - [`responder`]: the bus target protocol engine, as an explicit state
//!   machine driven by one method per hardware event.
//!
//! The split follows the shape of the data flow: scan -> debounce -> commit
//! -> resolve -> publish, with the responder consuming the mailbox from
//! interrupt context whenever the host asks.

#![cfg_attr(not(test), no_std)]

pub mod debounce;
pub mod keymap;
pub mod mailbox;
pub mod matrix;
pub mod responder;

/// Number of matrix rows (sense lines).
pub const ROWS: usize = 7;
/// Number of matrix columns (drive lines).
pub const COLS: usize = 5;

/// One full matrix sample, `true` = switch closed. Indexed `[row][col]`.
pub type Grid = [[bool; COLS]; ROWS];
