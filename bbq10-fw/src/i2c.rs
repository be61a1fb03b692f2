// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! I2C target driver serving the publish register to the host.
//!
//! # Architecture
//!
//! The protocol engine proper lives in `bbq10_core::responder`; this module
//! is the thin layer that feeds it hardware events. Everything here below
//! `init` runs in interrupt context: the ISR decodes which I2C1 condition
//! fired, calls the matching transition on the [`Responder`], and performs
//! whatever register access the returned action implies. The scan task never
//! touches the peripheral -- its only contact with this module is the
//! [`MAILBOX`], and the only field it reads there is the busy flag.
//!
//! Per transfer, the engine moves exactly one byte. A host read gets the
//! current publish register; if the host insists on clocking out more bytes
//! we can't NACK, so it gets the same byte again. A host write is accepted
//! and discarded -- there is no write-side protocol.
//!
//! # Operation of the hardware
//!
//! We lean on the peripheral's address-match clock stretch: on ADDR for a
//! read, the first (only) response byte is staged in TXDR *before* the ADDR
//! flag is cleared, so the stretch ends with a valid byte already lined up.
//! NACKF after our byte is the normal way for a host to end a read and is
//! not an error. The real errors -- bus error, arbitration loss, overrun --
//! all take the same exit: count, clear every flag, force the busy flag
//! down, resume listening. The engine never stays parked on a transient
//! fault.

use core::sync::atomic::{AtomicU32, Ordering};

use bbq10_core::mailbox::Mailbox;
use bbq10_core::responder::{Direction, Responder, Transfer};
use lilos::atomic::AtomicArithExt;

use crate::device;

use device::i2c::vals::{Addmode, Dir};
use device::interrupt;

/// Our address, expressed as a 7-bit binary number. This corresponds to the
/// I2C address byte with the read/write bit missing. The BBQ10's host driver
/// has this baked in, so changing it means changing two pieces of software.
#[allow(clippy::unusual_byte_groupings)] // Deliberately written in 4_3
const ADDR7: u8 = 0b0101_001;

/// The publish register / transport-busy pair shared with the scan task.
pub static MAILBOX: Mailbox = Mailbox::new();

/// The protocol engine. Written only from interrupt context.
static RESPONDER: Responder = Responder::new();

///////////////////////////////////////////////////////////////////////////////
// Event counters. These are written from the application but are intended for
// consumption by a debugger, so they appear (from inspection of the code, and
// from rustc) to never be read. Thus, each should carry the #[used] attribute
// to ensure it makes it into the firmware.

/// Number of bus errors observed.
#[used]
static ERR_BUS: AtomicU32 = AtomicU32::new(0);

/// Number of arbitration lost events.
#[used]
static ERR_ARLO: AtomicU32 = AtomicU32::new(0);

/// Number of receive overruns.
#[used]
static ERR_OVR: AtomicU32 = AtomicU32::new(0);

/// Number of times we detected our address.
#[used]
static ADDR_DETECT: AtomicU32 = AtomicU32::new(0);

/// Number of stop conditions we observed (only during our transactions).
#[used]
static STOPS: AtomicU32 = AtomicU32::new(0);

/// Number of bytes we transmitted.
#[used]
static TXS: AtomicU32 = AtomicU32::new(0);

/// Number of bytes we received (and discarded).
#[used]
static RXS: AtomicU32 = AtomicU32::new(0);

///////////////////////////////////////////////////////////////////////////////
// Setup.

/// Brings up I2C1 as a 7-bit-addressed target and ungates its interrupt.
///
/// If the peripheral doesn't come up -- which means the boot-time
/// configuration is wrong, not that the bus is having a bad day -- we stop
/// the whole show rather than run a keyboard the host can't reach.
pub fn init(i2c: device::i2c::I2c, gpiob: device::gpio::Gpio) {
    // Expose I2C pins on PB6/7. Note that these were already set to the
    // correct AF setting in main.
    use device::gpio::vals::Moder;
    gpiob.moder().modify(|w| {
        w.set_moder(6, Moder::ALTERNATE);
        w.set_moder(7, Moder::ALTERNATE);
    });

    // Leave analog and digital filters in reset configuration (analog filter
    // on, digital filter off), and the timing prescaler at 1x -- as a target
    // we follow the host's clock and only stretch it.

    // Respond to our address.
    i2c.oar1().write(|w| {
        w.set_oa1(u16::from(ADDR7 << 1));
        w.set_oa1mode(Addmode::BIT7);
        w.set_oa1en(true);
    });

    i2c.cr1().write(|w| {
        // Peripheral on...
        w.set_pe(true);
        // ...with every event we care about unmasked for the lifetime of
        // the firmware. The ISR sorts out which one fired.
        w.set_addrie(true);
        w.set_rxie(true);
        w.set_txie(true);
        w.set_stopie(true);
        w.set_nackie(true);
        w.set_errie(true);
    });

    // Boot-time guard: if the block didn't enable, nothing downstream can
    // work. Fatal, not recoverable.
    if !i2c.cr1().read().pe() {
        fatal();
    }

    // Safety: this is ungating our interrupt, which is fine because we're
    // not relying on exclusion with this interrupt for safety -- the shared
    // state is all single-writer atomics.
    unsafe {
        cortex_m::peripheral::NVIC::unmask(device::Interrupt::I2C1);
    }
}

/// Bring-up failed: interrupts off, park forever. Mirrors a boot
/// configuration fault, so there's no recovery path on purpose.
fn fatal() -> ! {
    cortex_m::interrupt::disable();
    loop {
        cortex_m::asm::wfi();
    }
}

///////////////////////////////////////////////////////////////////////////////
// The protocol engine's hardware half.

/// ISR. The entire bus responder runs here.
///
/// Conditions are checked in severity order. Errors preempt everything and
/// recover in this same invocation; ADDR stages the response before ending
/// the clock stretch; the data and stop flags are handled as they come. Any
/// flag left pending when we return just re-raises the interrupt.
#[interrupt]
fn I2C1() {
    let i2c = device::I2C1;
    let isr = i2c.isr().read();

    if isr.berr() || isr.arlo() || isr.ovr() {
        if isr.berr() {
            ERR_BUS.fetch_add_polyfill(1, Ordering::Relaxed);
        }
        if isr.arlo() {
            ERR_ARLO.fetch_add_polyfill(1, Ordering::Relaxed);
        }
        if isr.ovr() {
            ERR_OVR.fetch_add_polyfill(1, Ordering::Relaxed);
        }

        RESPONDER.on_bus_error(&MAILBOX);
        // Clear everything the failed transfer may have left behind, not
        // just the error flags: a stop or NACK from a torn-down transfer
        // must not be mistaken for the end of a healthy one.
        i2c.icr().write(|w| {
            w.set_berrcf(true);
            w.set_arlocf(true);
            w.set_ovrcf(true);
            w.set_nackcf(true);
            w.set_stopcf(true);
        });
        RESPONDER.resume_listening();
        return;
    }

    if isr.addr() {
        ADDR_DETECT.fetch_add_polyfill(1, Ordering::Relaxed);

        let dir = match isr.dir() {
            Dir::WRITE => Direction::MasterWrite,
            _ => Direction::MasterRead,
        };

        match RESPONDER.on_address_match(dir, &MAILBOX) {
            Transfer::Transmit(byte) => {
                // Flush whatever a previous transfer left in TXDR, then
                // stage our byte. Both must happen before ADDR is cleared:
                // clearing ADDR ends the clock stretch, and from that point
                // the host reads whatever is lined up.
                i2c.isr().write(|w| w.set_txe(true));
                i2c.txdr().write(|w| w.set_txdata(byte));
                TXS.fetch_add_polyfill(1, Ordering::Relaxed);
            }
            Transfer::Receive => {
                // Nothing to stage; RXNE will bring us the byte.
            }
        }

        // Clear ADDR flag, ending any clock stretching.
        i2c.icr().write(|w| w.set_addrcf(true));
        return;
    }

    if isr.rxne() {
        let byte = i2c.rxdr().read().rxdata();
        RXS.fetch_add_polyfill(1, Ordering::Relaxed);
        RESPONDER.on_byte_received(byte);
    }

    if isr.txis() {
        // The host is reading past the one-byte protocol. Pad.
        i2c.txdr().write(|w| w.set_txdata(RESPONDER.byte_to_transmit(&MAILBOX)));
        TXS.fetch_add_polyfill(1, Ordering::Relaxed);
    }

    if isr.nackf() {
        // The host NACKing our byte is how reads end. Not an error.
        i2c.icr().write(|w| w.set_nackcf(true));
    }

    if isr.stopf() {
        STOPS.fetch_add_polyfill(1, Ordering::Relaxed);
        RESPONDER.on_transfer_complete(&MAILBOX);
        i2c.icr().write(|w| w.set_stopcf(true));
    }
}
