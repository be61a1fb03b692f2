// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-key debouncing.
//!
//! Each cell keeps a counter of consecutive raw samples that disagree with
//! its debounced state; only when the counter reaches [`Debouncer::PERIOD`]
//! does the debounced state flip, so contact chatter shorter than five scan
//! passes is invisible to the rest of the system.

use crate::{Grid, COLS, ROWS};

/// Debounce state for the whole matrix.
#[derive(Debug)]
pub struct Debouncer {
    stable: Grid,
    streak: [[u8; COLS]; ROWS],
}

impl Debouncer {
    /// How many consecutive disagreeing samples it takes to accept a change.
    pub const PERIOD: u8 = 5;

    /// All keys up, no change being tracked. `const` so it can appear in
    /// static initializers.
    pub const fn new() -> Self {
        Self {
            stable: [[false; COLS]; ROWS],
            streak: [[0; COLS]; ROWS],
        }
    }

    /// Feeds one raw scan pass through the debouncer and returns the
    /// debounced grid.
    pub fn step(&mut self, raw: &Grid) -> &Grid {
        for r in 0..ROWS {
            for c in 0..COLS {
                if raw[r][c] == self.stable[r][c] {
                    self.streak[r][c] = 0;
                } else {
                    self.streak[r][c] += 1;
                    if self.streak[r][c] >= Self::PERIOD {
                        self.stable[r][c] = raw[r][c];
                        self.streak[r][c] = 0;
                    }
                }
            }
        }
        &self.stable
    }
}

impl Default for Debouncer {
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

    #[test]
    fn short_glitch_is_suppressed() {
        let mut d = Debouncer::new();
        let bounce = grid_with(&[(0, 0)]);
        let idle = grid_with(&[]);

        for _ in 0..u32::from(Debouncer::PERIOD) - 1 {
            assert!(!d.step(&bounce)[0][0]);
        }
        // One clean sample resets the streak; the key never registers.
        assert!(!d.step(&idle)[0][0]);
        assert!(!d.step(&bounce)[0][0]);
    }

    #[test]
    fn sustained_press_and_release_pass_through() {
        let mut d = Debouncer::new();
        let down = grid_with(&[(2, 3)]);
        let up = grid_with(&[]);

        for _ in 0..u32::from(Debouncer::PERIOD) {
            d.step(&down);
        }
        assert!(d.stable[2][3]);

        for _ in 0..u32::from(Debouncer::PERIOD) {
            d.step(&up);
        }
        assert!(!d.stable[2][3]);
    }
}
