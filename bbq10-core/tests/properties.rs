// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property tests for the grid / resolver rules, over all matrix positions
//! rather than the handful of cells the unit tests pick by hand.

use bbq10_core::matrix::{Latches, Matrix};
use bbq10_core::{keymap, Grid, COLS, ROWS};
use proptest::prelude::*;

fn empty() -> Grid {
    [[false; COLS]; ROWS]
}

/// Any single cell, as a (row, col) pair.
fn any_cell() -> impl Strategy<Value = (usize, usize)> {
    (0..ROWS, 0..COLS)
}

/// Any single cell that is not one of the three modifier positions.
fn any_plain_cell() -> impl Strategy<Value = (usize, usize)> {
    any_cell().prop_filter("modifier cell", |&(r, c)| !keymap::is_modifier(r, c))
}

proptest! {
    #[test]
    fn single_plain_key_resolves_to_case_folded_primary((r, c) in any_plain_cell()) {
        let mut grid = empty();
        grid[r][c] = true;

        let mut m = Matrix::new();
        m.commit(&grid);
        prop_assert!(m.changed());

        let expect = keymap::PRIMARY[r][c].to_ascii_lowercase();
        prop_assert_eq!(m.resolve(), expect);
        prop_assert_eq!(m.latches(), Latches::default());
    }

    #[test]
    fn single_modifier_is_latched_not_reported(which in 0usize..3) {
        let (pos, expect) = match which {
            0 => (keymap::ALT, Latches { alt: true, ..Latches::default() }),
            1 => (keymap::LEFT_SHIFT, Latches { left_shift: true, ..Latches::default() }),
            _ => (keymap::RIGHT_SHIFT, Latches { right_shift: true, ..Latches::default() }),
        };
        let mut grid = empty();
        grid[pos.0][pos.1] = true;

        let mut m = Matrix::new();
        m.commit(&grid);
        prop_assert!(!m.changed());
        prop_assert_eq!(m.latches(), expect);
    }

    #[test]
    fn shift_latch_uppercases_any_letter((r, c) in any_plain_cell()) {
        let primary = keymap::PRIMARY[r][c];
        prop_assume!(primary.is_ascii_uppercase());

        let mut m = Matrix::new();
        let mut grid = empty();
        grid[keymap::LEFT_SHIFT.0][keymap::LEFT_SHIFT.1] = true;
        m.commit(&grid);

        let mut grid = empty();
        grid[r][c] = true;
        m.commit(&grid);
        prop_assert_eq!(m.resolve(), primary);
        // Consumed: the same grid resolves unshifted on a second pass.
        prop_assert_eq!(m.resolve(), primary.to_ascii_lowercase());
    }

    #[test]
    fn alt_latch_prefers_alternate_table((r, c) in any_plain_cell()) {
        let mut m = Matrix::new();
        let mut grid = empty();
        grid[keymap::ALT.0][keymap::ALT.1] = true;
        m.commit(&grid);

        let mut grid = empty();
        grid[r][c] = true;
        m.commit(&grid);

        let expect = match keymap::ALTERNATE[r][c] {
            keymap::UNUSED => keymap::PRIMARY[r][c],
            alt => alt,
        };
        prop_assert_eq!(m.resolve(), expect);
    }

    #[test]
    fn release_to_empty_is_never_reportable(cells in proptest::collection::vec(any_cell(), 0..8)) {
        let mut grid = empty();
        for (r, c) in cells {
            grid[r][c] = true;
        }

        let mut m = Matrix::new();
        m.commit(&grid);
        m.commit(&empty());
        prop_assert!(!m.changed());
    }

    #[test]
    fn resolver_never_emits_a_modifier_sentinel(cells in proptest::collection::vec(any_plain_cell(), 1..6)) {
        let mut grid = empty();
        for &(r, c) in &cells {
            grid[r][c] = true;
        }

        let mut m = Matrix::new();
        m.commit(&grid);
        let ch = m.resolve();
        // Whatever wins the iteration-order race, the output is one of the
        // pressed cells' primary mappings, case-folded.
        let valid = cells
            .iter()
            .any(|&(r, c)| keymap::PRIMARY[r][c].to_ascii_lowercase() == ch);
        prop_assert!(valid);
    }
}
