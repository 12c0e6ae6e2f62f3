// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Console output for Rust, through `rt_kprintf`.

use core::ffi::c_char;
use core::fmt::{write, Arguments, Result, Write};

/// Print to the RT-Thread console, without a newline.
///
/// Takes the same arguments as [`format!`], but writes to the console with `rt_kprintf`.  No
/// allocation is done.  The output goes out in pieces of a small stack buffer.
///
/// [`format!`]: https://doc.rust-lang.org/alloc/macro.format.html
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {{
        $crate::kprintf::kprint(format_args!($($arg)*));
    }};
}

/// Print to the RT-Thread console, with a newline.
///
/// As for [`kprint!`].
#[macro_export]
macro_rules! kprintln {
    ($($arg:tt)*) => {{
        $crate::kprintf::kprintln(format_args!($($arg)*));
    }};
}

/// Bytes per `rt_kprintf` call, including the NUL.  This lives on the stack.
const BUF_SIZE: usize = 32;

struct Context {
    count: usize,
    buf: [u8; BUF_SIZE],
}

fn utf8_byte_length(byte: u8) -> usize {
    if byte & 0b1000_0000 == 0 {
        1
    } else if byte & 0b1110_0000 == 0b1100_0000 {
        2
    } else if byte & 0b1111_0000 == 0b1110_0000 {
        3
    } else if byte & 0b1111_1000 == 0b1111_0000 {
        4
    } else {
        // Continuation, or invalid.
        1
    }
}

impl Context {
    fn new() -> Context {
        Context {
            count: 0,
            buf: [0; BUF_SIZE],
        }
    }

    fn add_byte(&mut self, b: u8) {
        // Room for a whole UTF-8 sequence, and the NUL.
        if self.count + utf8_byte_length(b) + 1 > self.buf.len() {
            self.flush();
        }

        self.buf[self.count] = b;
        self.count += 1;
    }

    fn flush(&mut self) {
        if self.count > 0 {
            self.buf[self.count] = 0;
            // The text goes through "%s", so a '%' in a message is printed as is.
            unsafe {
                rtthread_sys::rt_kprintf(
                    b"%s\0".as_ptr() as *const c_char,
                    self.buf.as_ptr() as *const c_char,
                );
            }
            self.count = 0;
        }
    }
}

impl Write for Context {
    fn write_str(&mut self, s: &str) -> Result {
        for b in s.bytes() {
            // The console takes C strings.
            if b != 0 {
                self.add_byte(b);
            }
        }
        Ok(())
    }
}

#[doc(hidden)]
pub fn kprint(args: Arguments<'_>) {
    let mut context = Context::new();
    // Writing to the buffer never fails, only a `Display` impl can.
    let _ = write(&mut context, args);
    context.flush();
}

#[doc(hidden)]
pub fn kprintln(args: Arguments<'_>) {
    let mut context = Context::new();
    let _ = write(&mut context, args);
    context.add_byte(b'\n');
    context.flush();
}
