// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! RT-Thread kernel object support for Rust
//!
//! This crate provisions RT-Thread kernel objects (semaphores, mutexes, threads, event groups,
//! mailboxes and message queues) from Rust.  Every one of these can be made by the kernel from its
//! heap (`rt_xxx_create`), or initialized in storage the application provides (`rt_xxx_init`).
//! The [`provision`] module hides the difference behind a single call per object kind, where the
//! choice is just an [`Allocation`] value.
//!
//! The kernel itself is reached through the [`Kernel`] trait.  With the `rtthread` feature, this is
//! the real C API.  The default `sim` feature provides a simulated kernel that runs on the host.
//!
//! [`Allocation`]: provision::Allocation
//! [`Kernel`]: kernel::Kernel

#![cfg_attr(not(test), no_std)]
#![allow(unexpected_cfgs)]
#![deny(missing_docs)]

pub mod align;
pub mod error;
pub mod kernel;
pub mod logging;
#[cfg(all(feature = "rtthread", RT_USING_CONSOLE))]
pub mod kprintf;
pub mod object;
pub mod provision;
pub mod sys;
pub mod time;

pub use error::{Error, Result};

pub use logging::set_logger;

/// Re-export of rtthread-sys as `rtthread::raw`.
pub mod raw {
    pub use rtthread_sys::*;
}

/// RT-Thread `rtconfig.h` values.
pub use rtthread_sys::kconfig;

/// Print the panic, if there is a console, then stop with interrupts masked.
#[cfg(all(feature = "rtthread", not(test)))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    #[cfg(RT_USING_CONSOLE)]
    {
        crate::kprintln!("panic: {}", info);
    }
    let _ = info;

    unsafe {
        raw::rt_hw_interrupt_disable();
    }
    loop {
        core::hint::spin_loop();
    }
}
