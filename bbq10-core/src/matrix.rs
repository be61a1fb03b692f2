// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pressed-key grid, modifier latches, and character resolution.
//!
//! # Modifier model
//!
//! The BBQ10 modifiers are sticky: pressing (and releasing) shift or alt on
//! its own produces no output, it arms a latch. The latch is consumed by the
//! next real keypress and then cleared, so "shift, then Q" types `Q` and a
//! second `Q` goes back to `q`. A cycle where the only closed switches are
//! modifier keys is therefore never a reportable change -- it only arms the
//! latch.
//!
//! # Rollover
//!
//! There is deliberately no rollover arbitration. When several non-modifier
//! keys are closed in one cycle, [`Matrix::resolve`] walks the grid
//! column-major / row-minor and the last cell visited wins. That matches the
//! reference controller's iteration order; hosts depend on it only in the
//! sense that *some* single character arrives.

use crate::keymap;
use crate::{Grid, COLS, ROWS};

/// The three sticky modifier latches.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Latches {
    pub alt: bool,
    pub left_shift: bool,
    pub right_shift: bool,
}

impl Latches {
    fn any_shift(&self) -> bool {
        self.left_shift || self.right_shift
    }
}

/// Scan-side state: the debounced grid as of the last committed pass, the
/// edge-detected "reportable change" flag, the modifier latches, and the
/// most recently resolved character.
///
/// This is owned exclusively by the scan loop; interrupt code never touches
/// it. Firmware keeps it in a static so the whole thing is visible from a
/// debugger.
#[derive(Debug)]
pub struct Matrix {
    grid: Grid,
    changed: bool,
    latches: Latches,
    resolved: u8,
}

impl Matrix {
    /// Empty grid, no latches, no character yet. `const` so it can appear in
    /// static initializers.
    pub const fn new() -> Self {
        Self {
            grid: [[false; COLS]; ROWS],
            changed: false,
            latches: Latches {
                alt: false,
                left_shift: false,
                right_shift: false,
            },
            resolved: 0,
        }
    }

    /// Records one debounced scan pass and recomputes the reportable-change
    /// flag.
    ///
    /// The flag is set if any cell flipped, and then forced back off when
    /// - nothing is pressed at all (a full release is not an event), or
    /// - every pressed cell is a modifier key, in which case exactly one
    ///   latch is armed instead (alt wins over right shift over left shift,
    ///   matching the reference controller).
    pub fn commit(&mut self, sample: &Grid) {
        self.changed = false;
        let mut any_down = false;

        for r in 0..ROWS {
            for c in 0..COLS {
                any_down |= sample[r][c];
                if sample[r][c] != self.grid[r][c] {
                    self.grid[r][c] = sample[r][c];
                    self.changed = true;
                }
            }
        }

        if !any_down {
            self.changed = false;
            return;
        }

        if self.only_modifiers_down() {
            self.changed = false;
            if self.grid[keymap::ALT.0][keymap::ALT.1] {
                self.latches.alt = true;
            } else if self.grid[keymap::RIGHT_SHIFT.0][keymap::RIGHT_SHIFT.1] {
                self.latches.right_shift = true;
            } else {
                self.latches.left_shift = true;
            }
        }
    }

    fn only_modifiers_down(&self) -> bool {
        for r in 0..ROWS {
            for c in 0..COLS {
                if self.grid[r][c] && !keymap::is_modifier(r, c) {
                    return false;
                }
            }
        }
        true
    }

    /// Resolves the current grid to a single character and stores it in the
    /// resolved-character register. Callers should only bother when
    /// [`changed`](Self::changed) reports true.
    ///
    /// For each pressed non-modifier cell, in column-major / row-minor
    /// order:
    /// - pending alt latch: the alternate table entry, falling back to the
    ///   primary entry where the alternate layer has none;
    /// - pending shift latch: the primary entry, uppercased if it is a
    ///   lowercase letter;
    /// - otherwise: the primary entry, with uppercase letters folded to
    ///   lowercase (the tables store letters uppercase as a labeling
    ///   convention only).
    ///
    /// All three latches are consumed by a single resolve, so running it
    /// twice without an intervening commit never applies a modifier twice.
    pub fn resolve(&mut self) -> u8 {
        for c in 0..COLS {
            for r in 0..ROWS {
                if !self.grid[r][c] || keymap::is_modifier(r, c) {
                    continue;
                }

                let primary = keymap::PRIMARY[r][c];
                self.resolved = if self.latches.alt {
                    match keymap::ALTERNATE[r][c] {
                        keymap::UNUSED => primary,
                        alt => alt,
                    }
                } else if self.latches.any_shift() {
                    if primary.is_ascii_lowercase() {
                        primary.to_ascii_uppercase()
                    } else {
                        primary
                    }
                } else if primary.is_ascii_uppercase() {
                    primary.to_ascii_lowercase()
                } else {
                    primary
                };
            }
        }

        self.latches = Latches::default();
        self.resolved
    }

    /// Did the last committed pass contain a reportable change?
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// The grid as of the last commit.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Currently armed modifier latches.
    pub fn latches(&self) -> Latches {
        self.latches
    }

    /// The resolved-character register: the last character produced by
    /// [`resolve`](Self::resolve), 0 if none yet.
    pub fn last_resolved(&self) -> u8 {
        self.resolved
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(cells: &[(usize, usize)]) -> Grid {
        let mut g = [[false; COLS]; ROWS];
        for &(r, c) in cells {
            g[r][c] = true;
        }
        g
    }

    const EMPTY: Grid = [[false; COLS]; ROWS];

    #[test]
    fn plain_keypress_folds_to_lowercase() {
        // (0,0) is labeled 'Q' on the base layer.
        let mut m = Matrix::new();
        m.commit(&grid_with(&[(0, 0)]));
        assert!(m.changed());
        assert_eq!(m.resolve(), b'q');
        assert_eq!(m.last_resolved(), b'q');
    }

    #[test]
    fn punctuation_passes_through_unmodified() {
        let mut m = Matrix::new();
        m.commit(&grid_with(&[(4, 4)])); // '$'
        assert!(m.changed());
        assert_eq!(m.resolve(), b'$');
    }

    #[test]
    fn full_release_is_not_reportable() {
        let mut m = Matrix::new();
        m.commit(&grid_with(&[(0, 0)]));
        assert!(m.changed());
        m.resolve();

        m.commit(&EMPTY);
        assert!(!m.changed());

        // And an all-released pass from an already-empty grid is equally
        // quiet.
        m.commit(&EMPTY);
        assert!(!m.changed());
    }

    #[test]
    fn bare_modifier_arms_latch_without_reporting() {
        let mut m = Matrix::new();

        m.commit(&grid_with(&[keymap::LEFT_SHIFT]));
        assert!(!m.changed());
        assert_eq!(
            m.latches(),
            Latches { left_shift: true, ..Latches::default() }
        );
    }

    #[test]
    fn shift_then_key_uppercases() {
        let mut m = Matrix::new();
        m.commit(&grid_with(&[keymap::LEFT_SHIFT]));
        assert!(!m.changed());

        m.commit(&grid_with(&[(0, 0)]));
        assert!(m.changed());
        assert_eq!(m.resolve(), b'Q');
        assert_eq!(m.latches(), Latches::default());

        // The latch was consumed: the same key again is lowercase.
        m.commit(&EMPTY);
        m.commit(&grid_with(&[(0, 0)]));
        assert_eq!(m.resolve(), b'q');
    }

    #[test]
    fn alt_then_key_uses_alternate_table() {
        let mut m = Matrix::new();
        m.commit(&grid_with(&[keymap::ALT]));
        assert!(!m.changed());
        assert!(m.latches().alt);

        m.commit(&grid_with(&[(0, 0)])); // alt layer: '#'
        assert_eq!(m.resolve(), b'#');
        assert_eq!(m.latches(), Latches::default());
    }

    #[test]
    fn alt_falls_back_to_primary_when_no_alternate() {
        // (4,4) is '$' on the base layer and unassigned on the alt layer.
        let mut m = Matrix::new();
        m.commit(&grid_with(&[keymap::ALT]));
        m.commit(&grid_with(&[(4, 4)]));
        assert_eq!(m.resolve(), b'$');
    }

    #[test]
    fn resolve_is_idempotent_without_new_commit() {
        let mut m = Matrix::new();
        m.commit(&grid_with(&[keymap::RIGHT_SHIFT]));
        m.commit(&grid_with(&[(1, 0)])); // 'W'
        assert_eq!(m.resolve(), b'W');
        // Latches are gone; a second resolve of the same grid downgrades to
        // the unshifted character rather than re-applying shift.
        assert_eq!(m.resolve(), b'w');
    }

    #[test]
    fn modifier_priority_is_alt_rshift_lshift() {
        let mut m = Matrix::new();
        m.commit(&grid_with(&[keymap::ALT, keymap::LEFT_SHIFT]));
        assert!(!m.changed());
        assert_eq!(m.latches(), Latches { alt: true, ..Latches::default() });

        let mut m = Matrix::new();
        m.commit(&grid_with(&[keymap::RIGHT_SHIFT, keymap::LEFT_SHIFT]));
        assert!(!m.changed());
        assert_eq!(
            m.latches(),
            Latches { right_shift: true, ..Latches::default() }
        );
    }

    #[test]
    fn simultaneous_keys_resolve_to_last_visited() {
        // Column-major, row-minor: (0,0) 'Q' is visited before (0,1) 'E'...
        let mut m = Matrix::new();
        m.commit(&grid_with(&[(0, 0), (0, 1)]));
        assert_eq!(m.resolve(), b'e');

        // ...and within a column, higher rows are visited later.
        let mut m = Matrix::new();
        m.commit(&grid_with(&[(0, 0), (5, 0)]));
        assert_eq!(m.resolve(), b' ');
    }

    #[test]
    fn modifier_chorded_with_key_reports_the_key() {
        // Shift and Q closed in the same pass, with no latch armed
        // beforehand: the pass is reportable (not all pressed cells are
        // modifiers) and the key resolves unshifted.
        let mut m = Matrix::new();
        m.commit(&grid_with(&[keymap::LEFT_SHIFT, (0, 0)]));
        assert!(m.changed());
        assert_eq!(m.resolve(), b'q');
    }
}
