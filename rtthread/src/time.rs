// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Time in kernel ticks.
//!
//! RT-Thread counts time in ticks of `RT_TICK_PER_SECOND`.  Durations here are `fugit` durations
//! at that rate, so that they can be written in whatever unit is clearest and still come out as a
//! whole number of ticks:
//!
//! ```
//! use rtthread::time::Duration;
//!
//! let slice = Duration::millis(20);
//! # let _ = slice.ticks();
//! ```

use crate::kconfig;

/// The kernel's tick counter, `rt_tick_t`.
pub type Tick = crate::raw::rt_tick_t;

/// Ticks per second.
pub const SYS_FREQUENCY: u32 = kconfig::RT_TICK_PER_SECOND as u32;

/// A span of time, in kernel ticks.
pub type Duration = fugit::Duration<Tick, 1, SYS_FREQUENCY>;
