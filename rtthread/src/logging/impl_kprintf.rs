// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Logging through `rt_kprintf`
//!
//! Filtering is global, and set to Info.

use log::{Level, Log, Metadata, Record, SetLoggerError};

use crate::kprintln;

struct KprintfLogger;

impl Log for KprintfLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    // The record is written in small pieces, so lines from different threads can interleave.
    fn log(&self, record: &Record<'_>) {
        let level = match record.level() {
            Level::Error => 'E',
            Level::Warn => 'W',
            Level::Info => 'I',
            Level::Debug => 'D',
            Level::Trace => 'T',
        };
        kprintln!("[{}/{}] {}", level, record.target(), record.args());
    }

    fn flush(&self) {}
}

static KPRINTF_LOGGER: KprintfLogger = KprintfLogger;

/// Log messages to the RT-Thread console.
///
/// # Safety
///
/// On targets without atomic pointers, installing the logger is racy.  As long as this is only
/// ever called by a single thread, it is safe to use.
pub unsafe fn set_logger() -> Result<(), SetLoggerError> {
    super::set_logger_internal(&KPRINTF_LOGGER)
}
