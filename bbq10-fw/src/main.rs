// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BBQ10 keyboard controller firmware.
//!
//! Scans the 7x5 key matrix on a fixed cadence, resolves matrix activity to
//! single ASCII characters, and serves the most recent character to an I2C
//! host one byte per read, with a rising-edge pulse on a dedicated line to
//! tell the host a fresh byte is waiting.

#![no_std]
#![no_main]

#[cfg(feature = "panic-halt")]
extern crate panic_halt;

#[cfg(feature = "panic-semihosting")]
extern crate panic_semihosting;

mod i2c;
mod scanner;
mod util;

pub(crate) use stm32_metapac as device;

use core::pin::pin;

#[cortex_m_rt::entry]
fn main() -> ! {
    let mut cp = unsafe { cortex_m::Peripherals::steal() };

    // We stay at 16 MHz on HSI, straight from reset. A 1 kHz scan and a
    // 100 kHz I2C target don't need more.
    const CLOCK_HZ: u32 = 16_000_000;

    // Pin assignment:
    //
    // PA0-4: matrix column drive (open drain, active low)
    // PA5-11: matrix row sense (pulled-up inputs)
    // PA13/PA14: SWD (left at reset defaults)
    //
    // PB0: KEY_CHANGED ready pulse to the host
    // PB6: I2C1 SCL (AF6)
    // PB7: I2C1 SDA (AF6)

    device::RCC.iopenr().modify(|w| {
        w.set_gpioaen(true);
        w.set_gpioben(true);
    });
    device::RCC.apbenr1().modify(|w| w.set_i2c1en(true));
    cortex_m::asm::dsb();

    device::GPIOB.afr(0).modify(|w| {
        w.set_afr(6, 6); // I2C1_SCL
        w.set_afr(7, 6); // I2C1_SDA
    });

    i2c::init(device::I2C1, device::GPIOB);

    let scan_task = pin!(scanner::task(device::GPIOA, device::GPIOB));

    lilos::time::initialize_sys_tick(&mut cp.SYST, CLOCK_HZ);
    lilos::exec::run_tasks(
        &mut [
            scan_task,
        ],
        lilos::exec::ALL_TASKS,
    )
}
