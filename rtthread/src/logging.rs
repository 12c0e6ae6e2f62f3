// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Rust logging on RT-Thread
//!
//! Rust code logs through the `log` crate.  The provisioning functions, for one, log a record for
//! every object they make or fail to make.  Those records go nowhere until a logger is installed
//! with [`set_logger`], which should be called once, early, before other threads are started.
//!
//! RT-Thread has no logging framework that every build includes.  What it does nearly always have
//! is a console, `RT_USING_CONSOLE`, and `rt_kprintf` to write to it.  When running on the kernel
//! with a console, messages are formatted in Rust and written there, as `[I/target] message` lines
//! much like the kernel's own `ulog` output.  Without one, [`set_logger`] installs nothing.
//!
//! On the host, tests install their own logger with `log::set_logger`.

use log::{LevelFilter, Log, SetLoggerError};

cfg_if::cfg_if! {
    if #[cfg(all(feature = "rtthread", RT_USING_CONSOLE))] {
        mod impl_kprintf;
        pub use impl_kprintf::set_logger;
    } else {
        /// No console to log to, this installs nothing.
        ///
        /// # Safety
        ///
        /// Always safe, it is unsafe to match the version that installs a logger.
        pub unsafe fn set_logger() -> Result<(), SetLoggerError> {
            Ok(())
        }
    }
}

// The log crate only offers safe installation on targets with atomic pointers.  Elsewhere, the racy
// version is used, which is fine as long as this happens before any other thread runs.
cfg_if::cfg_if! {
    if #[cfg(target_has_atomic = "ptr")] {
        #[allow(dead_code)]
        unsafe fn set_logger_internal(logger: &'static dyn Log) -> Result<(), SetLoggerError> {
            log::set_logger(logger)?;
            log::set_max_level(LevelFilter::Info);
            Ok(())
        }
    } else {
        #[allow(dead_code)]
        unsafe fn set_logger_internal(logger: &'static dyn Log) -> Result<(), SetLoggerError> {
            log::set_logger_racy(logger)?;
            log::set_max_level_racy(LevelFilter::Info);
            Ok(())
        }
    }
}
