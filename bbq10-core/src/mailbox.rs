// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-slot hand-off between the scan loop and the bus interrupt.
//!
//! Two execution contexts share exactly two scalars: the publish register
//! (the byte the host will read next) and the transport-busy flag. Each has
//! one writer -- the scan side stores the byte, the interrupt side toggles
//! busy -- so plain load/store atomics are all the synchronization there is.
//! No queue on purpose: a fresh character published before the host read the
//! previous one silently replaces it. That lost-update policy is part of the
//! wire contract.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Publish register plus transport-busy flag.
pub struct Mailbox {
    byte: AtomicU8,
    busy: AtomicBool,
}

impl Mailbox {
    /// Empty mailbox: byte 0 ("no key has ever been resolved"), not busy.
    pub const fn new() -> Self {
        Self {
            byte: AtomicU8::new(0),
            busy: AtomicBool::new(false),
        }
    }

    /// Waits for any in-flight bus transfer to finish, then stores `byte`
    /// as the new publish register contents.
    ///
    /// The wait is a spin with no timeout: a host that address-matches and
    /// then never finishes its transfer stalls publication indefinitely.
    /// `idle` runs once per spin iteration
    /// so callers choose what spinning looks like (a `nop` on hardware, a
    /// step counter in tests).
    pub fn publish(&self, byte: u8, mut idle: impl FnMut()) {
        while self.is_busy() {
            idle();
        }
        self.byte.store(byte, Ordering::Release);
    }

    /// Current publish register contents. This is the interrupt side's only
    /// view of the mailbox payload.
    pub fn current(&self) -> u8 {
        self.byte.load(Ordering::Acquire)
    }

    /// Is a bus transfer in flight?
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Marks a transfer in flight. Interrupt side only.
    pub fn set_busy(&self) {
        self.busy.store(true, Ordering::Release);
    }

    /// Marks the bus idle again. Interrupt side only.
    pub fn clear_busy(&self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}
