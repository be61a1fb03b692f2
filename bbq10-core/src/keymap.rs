// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed character tables for the BBQ10 matrix.
//!
//! The keyboard has no concept of scancodes: each cell maps directly to the
//! ASCII byte the host will receive. Letters are stored uppercase in
//! [`PRIMARY`] purely because that's what is printed on the keycaps; the
//! resolver folds them to lowercase unless a shift latch is pending.
//!
//! The three modifier keys (alt, left shift, right shift) are identified by
//! their matrix coordinates, not by reserved bytes in the tables, so their
//! cells hold [`UNUSED`] like any other unassigned position.

use crate::{COLS, ROWS};

/// Byte meaning "no character assigned here". Also the host-visible value of
/// the publish register before the first keypress.
pub const UNUSED: u8 = 0;

/// Enter key, delivered to the host as a line feed.
pub const ENTER: u8 = b'\n';
/// Backspace key. The reference design delivers carriage return for this and
/// the host driver maps it back; we keep that wire value for compatibility.
pub const BACKSPACE: u8 = b'\r';

/// Alt key position, `(row, col)`.
pub const ALT: (usize, usize) = (4, 0);
/// Right shift key position.
pub const RIGHT_SHIFT: (usize, usize) = (3, 2);
/// Left shift key position.
pub const LEFT_SHIFT: (usize, usize) = (6, 1);

/// Base layer.
pub const PRIMARY: [[u8; COLS]; ROWS] = [
    [b'Q',    b'E',   b'R',   b'U',      b'O'],
    [b'W',    b'S',   b'G',   b'H',      b'L'],
    [UNUSED,  b'D',   b'T',   b'Y',      b'I'],
    [b'A',    b'P',   UNUSED, ENTER,     BACKSPACE],
    [UNUSED,  b'X',   b'V',   b'B',      b'$'],
    [b' ',    b'Z',   b'C',   b'N',      b'M'],
    [UNUSED,  UNUSED, b'F',   b'J',      b'K'],
];

/// Alt layer. [`UNUSED`] means "no alternate character": the resolver falls
/// back to [`PRIMARY`] for such cells.
pub const ALTERNATE: [[u8; COLS]; ROWS] = [
    [b'#',    b'2',   b'3',   b'_',      b'+'],
    [b'1',    b'4',   b'/',   b':',      b'"'],
    [UNUSED,  b'5',   b'(',   b')',      b'-'],
    [b'*',    b'@',   UNUSED, UNUSED,    UNUSED],
    [UNUSED,  b'8',   b'?',   b'!',      UNUSED],
    [UNUSED,  b'7',   b'9',   b',',      b'.'],
    [b'0',    UNUSED, b'6',   b';',      b'\''],
];

/// Is this cell one of the three modifier keys?
pub fn is_modifier(row: usize, col: usize) -> bool {
    (row, col) == ALT || (row, col) == RIGHT_SHIFT || (row, col) == LEFT_SHIFT
}
