// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Assorted reusable utility thingies.

use core::{sync::atomic::{AtomicBool, Ordering}, cell::UnsafeCell};

use lilos::atomic::AtomicExt;

/// Stores a `T` at static scope such that one exclusive reference (`&mut`)
/// can be produced. We use this for the scan state, which wants to live in
/// static RAM for debugger visibility but be owned by exactly one task.
pub struct StaticResource<T> {
    taken: AtomicBool,
    inner: UnsafeCell<T>,
}

impl<T> StaticResource<T> {
    pub const fn new(initializer: T) -> Self {
        Self {
            taken: AtomicBool::new(false),
            inner: UnsafeCell::new(initializer),
        }
    }

    /// Gets a reference to the resource. Only works once, to avoid aliasing;
    /// a second call panics.
    ///
    /// This requires `self` to be `'static` to ensure that you can't use this
    /// to generate allegedly-`'static` references pointing into, say, the
    /// stack.
    #[allow(clippy::mut_from_ref)] // don't worry, it only succeeds once
    #[track_caller]
    #[inline(always)]
    pub fn take(&'static self) -> &'static mut T {
        let already_taken = self.taken.swap_polyfill(true, Ordering::SeqCst);
        if already_taken {
            panic!();
        }

        // Safety: execution reaches this point once in the lifetime of the
        // storage, so the &mut can't alias.
        unsafe { &mut *self.inner.get() }
    }
}

/// Safety: we protect our inner `T` so we can be `Sync` (and thus stored at
/// static scope, potentially reached by multiple threads) without `T` itself
/// being `Sync`.
unsafe impl<T> Sync for StaticResource<T> {}
