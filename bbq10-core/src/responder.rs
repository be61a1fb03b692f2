// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bus target protocol engine.
//!
//! The wire protocol is as small as an I2C protocol gets: a read transaction
//! returns exactly one byte (the publish register), a write transaction
//! accepts exactly one byte and throws it away. No register addressing, no
//! multi-byte transfers.
//!
//! The engine is an explicit state machine with one method per hardware
//! event, so it can be driven by an ISR on the target and by plain function
//! calls in tests. State is stored in an `AtomicU8`, which lets a `static`
//! responder be shared with interrupt context; only the interrupt side ever
//! writes it.
//!
//! The transport-busy flag in the [`Mailbox`] tracks address match through
//! transfer end. It is the only thing the scan side consults before
//! overwriting the publish register, so every exit path out of a transfer --
//! completion, discarded write, bus error -- must clear it. Error recovery in
//! particular never leaves the engine parked: any bus fault drops straight
//! back to listening.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::mailbox::Mailbox;

/// Transfer direction from the master's point of view.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    /// Master writes to us; we receive and discard.
    MasterWrite,
    /// Master reads from us; we transmit the publish register.
    MasterRead,
}

/// Protocol engine states.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum State {
    /// Addressable, nothing in flight.
    Listening = 0,
    /// Address matched for a master write; one byte inbound.
    Receiving = 1,
    /// Address matched for a master read; one byte outbound.
    Transmitting = 2,
    /// A bus fault is being cleaned up. Transient: the same handler
    /// invocation that enters this state leaves it again via
    /// [`Responder::resume_listening`].
    Recovering = 3,
}

/// What the hardware layer must arm after an address match.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Transfer {
    /// Receive (and discard) a single byte.
    Receive,
    /// Transmit this byte.
    Transmit(u8),
}

/// The protocol engine. One per bus peripheral.
pub struct Responder {
    state: AtomicU8,
}

impl Responder {
    /// Starts out listening.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(State::Listening as u8),
        }
    }

    /// Current state.
    pub fn state(&self) -> State {
        match self.state.load(Ordering::Acquire) {
            0 => State::Listening,
            1 => State::Receiving,
            2 => State::Transmitting,
            _ => State::Recovering,
        }
    }

    fn set_state(&self, s: State) {
        self.state.store(s as u8, Ordering::Release);
    }

    /// The bus matched our address. Marks the transport busy -- from here
    /// until transfer end the scan side must not touch the publish register
    /// -- and reports what to arm. For a master read the byte to transmit is
    /// captured *now*, so the transfer serves a consistent value even if the
    /// scanner resolves another key mid-transfer.
    pub fn on_address_match(&self, dir: Direction, mailbox: &Mailbox) -> Transfer {
        mailbox.set_busy();
        match dir {
            Direction::MasterWrite => {
                self.set_state(State::Receiving);
                Transfer::Receive
            }
            Direction::MasterRead => {
                self.set_state(State::Transmitting);
                Transfer::Transmit(mailbox.current())
            }
        }
    }

    /// A byte arrived from the master. There is no write-side protocol, so
    /// it is discarded; the transfer still runs to its stop condition.
    pub fn on_byte_received(&self, _byte: u8) {}

    /// The master is clocking out more bytes than the protocol defines.
    /// We cannot NACK a read, so pad with the current publish register.
    pub fn byte_to_transmit(&self, mailbox: &Mailbox) -> u8 {
        mailbox.current()
    }

    /// Stop condition: the matched transfer is over, in either direction.
    /// Releases the transport and goes back to listening.
    pub fn on_transfer_complete(&self, mailbox: &Mailbox) {
        mailbox.clear_busy();
        self.set_state(State::Listening);
    }

    /// Bus fault (arbitration loss, bus error, overrun). Enters recovery and
    /// force-clears the transport-busy flag so a fault mid-transfer can
    /// never wedge the scan side. The caller clears the hardware's error
    /// flags and then calls [`resume_listening`](Self::resume_listening);
    /// no byte is re-sent, the master retries if it cares.
    pub fn on_bus_error(&self, mailbox: &Mailbox) {
        self.set_state(State::Recovering);
        mailbox.clear_busy();
    }

    /// Re-arm listening after error recovery.
    pub fn resume_listening(&self) {
        self.set_state(State::Listening);
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::new()
    }
}
