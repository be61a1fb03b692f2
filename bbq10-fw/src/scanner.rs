// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key matrix scan task.
//!
//! # Theory of operation
//!
//! The matrix has 5 column lines (PA0-4) and 7 row lines (PA5-11). Columns
//! idle released (open drain, weakly pulled up); rows are pulled-up inputs.
//! To scan, we drive one column low at a time, give the row lines a moment
//! to settle against parasitic capacitance, and sample all seven rows: a
//! closed switch in the driven column reads as a low row line.
//!
//! One full pass produces a raw 7x5 grid. That goes through the per-key
//! debouncer and into the [`Matrix`] state, which decides whether the pass
//! contained a reportable change (modifier-only and all-released passes are
//! not). On a reportable change we resolve the grid to a single character,
//! park it in the I2C mailbox -- waiting out any in-flight bus transfer
//! first -- and pulse the KEY_CHANGED line so the host comes and reads it.
//!
//! The scan state lives in statics rather than on this task's stack so the
//! grid, the latches, and the last resolved character can be watched from a
//! debugger while the firmware runs.

use core::convert::Infallible;

use bbq10_core::debounce::Debouncer;
use bbq10_core::matrix::Matrix;
use bbq10_core::{Grid, COLS, ROWS};
use device::gpio::vals::{Moder, Ot, Pupdr};
use lilos::time::{sleep_for, Millis, PeriodicGate};

use crate::device;
use crate::i2c::MAILBOX;
use crate::util::StaticResource;

/// Wanna alter the scan interval? Well here it is.
const SCAN_INTERVAL: Millis = Millis(10);

/// How long each column is held low before the rows are sampled.
const SETTLE: Millis = Millis(1);

/// Width of the KEY_CHANGED pulse. The host treats the rising edge as
/// "issue one read now"; 2 ms is comfortably wider than its edge detector
/// needs.
const READY_PULSE: Millis = Millis(2);

/// GPIOA pin for each matrix column.
const COL_PINS: [usize; COLS] = [0, 1, 2, 3, 4];
/// GPIOA pin for each matrix row.
const ROW_PINS: [usize; ROWS] = [5, 6, 7, 8, 9, 10, 11];

/// GPIOB pin for the KEY_CHANGED pulse.
const READY_PIN: usize = 0;

/// Scan state is kept in static RAM because it's the firmware's entire
/// observable surface: pointing a debugger at these two is how you find out
/// what the keyboard thinks is going on.
static MATRIX: StaticResource<Matrix> = StaticResource::new(Matrix::new());
static DEBOUNCE: StaticResource<Debouncer> = StaticResource::new(Debouncer::new());

/// Keyboard scan loop: scan, debounce, commit, and -- on a reportable
/// change -- resolve, publish, pulse.
pub async fn task(
    gpioa: device::gpio::Gpio,
    gpiob: device::gpio::Gpio,
) -> Infallible {
    configure_pins(gpioa, gpiob);

    let matrix = MATRIX.take();
    let debounce = DEBOUNCE.take();

    let mut scan_gate = PeriodicGate::from(SCAN_INTERVAL);
    loop {
        scan_gate.next_time().await;

        let raw = scan(gpioa).await;
        matrix.commit(debounce.step(&raw));

        if matrix.changed() {
            let ch = matrix.resolve();

            // Wait for the bus to go quiet before touching the publish
            // register. The busy flag is cleared from interrupt context, so
            // spinning here can't deadlock it -- but a host that stalls a
            // transfer forever stalls us forever, by design.
            MAILBOX.publish(ch, cortex_m::asm::nop);

            pulse_ready(gpiob).await;
        }
    }
}

fn configure_pins(gpioa: device::gpio::Gpio, gpiob: device::gpio::Gpio) {
    // Columns: open drain (only ever driven low), weak pullup, initially
    // released, then switched to outputs.
    gpioa.otyper().modify(|w| {
        for &pin in &COL_PINS {
            w.set_ot(pin, Ot::OPENDRAIN);
        }
    });
    gpioa.pupdr().modify(|w| {
        for &pin in &COL_PINS {
            w.set_pupdr(pin, Pupdr::PULLUP);
        }
    });
    gpioa.bsrr().write(|w| {
        for &pin in &COL_PINS {
            w.0 |= 1 << pin;
        }
    });
    gpioa.moder().modify(|w| {
        for &pin in &COL_PINS {
            w.set_moder(pin, Moder::OUTPUT);
        }
    });

    // Rows: pulled-up inputs.
    gpioa.pupdr().modify(|w| {
        for &pin in &ROW_PINS {
            w.set_pupdr(pin, Pupdr::PULLUP);
        }
    });
    gpioa.moder().modify(|w| {
        for &pin in &ROW_PINS {
            w.set_moder(pin, Moder::INPUT);
        }
    });

    // KEY_CHANGED: push-pull output, idle low.
    gpiob.bsrr().write(|w| w.0 = 1 << (READY_PIN + 16));
    gpiob.moder().modify(|w| w.set_moder(READY_PIN, Moder::OUTPUT));
}

/// Runs one full pass over the matrix and returns the raw sampled grid.
///
/// # Cancellation
///
/// Cancel-safe in the strict sense: if the scan is canceled during a settle
/// delay, the driven column is released on the way out, so the next scan
/// starts from an idle matrix.
async fn scan(gpioa: device::gpio::Gpio) -> Grid {
    let mut grid = [[false; COLS]; ROWS];

    for (c, &col_pin) in COL_PINS.iter().enumerate() {
        // Drive the column low.
        gpioa.bsrr().write(|w| w.0 = 1 << (col_pin + 16));

        let rows = {
            scopeguard::defer! {
                // Release the column by setting the corresponding SET bit.
                gpioa.bsrr().write(|w| w.0 = 1 << col_pin);
            }

            // Let charge move around. (CANCEL POINT)
            sleep_for(SETTLE).await;

            // Pressed keys pull their row low; invert so 1 = pressed.
            !gpioa.idr().read().0
            // The deferred block fires here, releasing the column.
        };

        for (r, &row_pin) in ROW_PINS.iter().enumerate() {
            grid[r][c] = rows & (1 << row_pin) != 0;
        }
    }

    grid
}

/// Tells the host a byte is ready: assert KEY_CHANGED, hold, deassert.
///
/// No queuing behind this -- if the host hasn't read the previous byte by
/// the time the next pulse fires, the previous byte is gone.
async fn pulse_ready(gpiob: device::gpio::Gpio) {
    gpiob.bsrr().write(|w| w.0 = 1 << READY_PIN);
    sleep_for(READY_PULSE).await;
    gpiob.bsrr().write(|w| w.0 = 1 << (READY_PIN + 16));
}
