// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! # RT-Thread errors
//!
//! This module contains an `Error` and `Result` type for use in wrapped RT-Thread calls.
//!
//! Provisioning a kernel object can fail three different ways, and the error keeps them apart:
//!
//! - The kernel's allocating constructor (`rt_xxx_create`) returned no object.  The kernel doesn't
//!   say why, but it is always a lack of heap or object table space, so this is [`Error::NoMemory`].
//! - The kernel's in-place initializer (`rt_xxx_init`) returned a status other than `RT_EOK`.  The
//!   status is carried in [`Error::Kernel`] exactly as the kernel gave it.
//! - The request was rejected before the kernel was called at all, [`Error::Invalid`].

use core::fmt;

use crate::raw::{rt_err_t, RT_EINVAL, RT_ENOMEM, RT_EOK};

/// An RT-Thread provisioning error.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The kernel could not allocate the object.
    NoMemory,
    /// The kernel rejected an in-place initialization with this status.
    Kernel(rt_err_t),
    /// The request broke one of the caller's obligations.
    Invalid(Invalid),
}

/// Caller obligations that are checked before the kernel is asked for anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Invalid {
    /// Object names must not be empty.
    EmptyName,
    /// Object names are C strings, so can't hold a NUL.
    NameHasNul,
    /// A semaphore's count is kept in 16 bits.
    CountTooLarge,
    /// A thread needs a stack.
    ZeroStackSize,
    /// The stack size asked for is larger than the stack buffer given.
    StackTooSmall,
    /// Thread priorities must be below `RT_THREAD_PRIORITY_MAX`.
    PriorityOutOfRange,
    /// Mailboxes and queues must hold at least one message.
    ZeroCapacity,
    /// Mailbox and queue capacities are kept in 16 bits.
    CapacityTooLarge,
    /// The message pool buffer is empty, or smaller than the capacity asked for.
    PoolTooSmall,
    /// Queue messages must be at least one byte.
    ZeroMessageSize,
    /// Queue message sizes, rounded up to `RT_ALIGN_SIZE`, are kept in 16 bits.
    MessageTooLarge,
    /// The static control block has already been handed to the kernel.
    AlreadyInitialized,
    /// The stack or pool has already been given to another object.
    BufferInUse,
}

impl Error {
    /// The status code view of this error, as RT-Thread would report it.
    ///
    /// Kernel statuses are returned unchanged.  Note that [`Error::Invalid`] and a kernel
    /// `-RT_EINVAL` share a code, the variant is what tells them apart.
    pub fn code(&self) -> rt_err_t {
        match self {
            Error::NoMemory => -RT_ENOMEM,
            Error::Kernel(code) => *code,
            Error::Invalid(_) => -RT_EINVAL,
        }
    }
}

impl From<Invalid> for Error {
    fn from(invalid: Invalid) -> Self {
        Error::Invalid(invalid)
    }
}

impl core::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoMemory => write!(f, "out of memory"),
            Error::Kernel(code) => write!(f, "rt-thread error {}", code),
            Error::Invalid(invalid) => write!(f, "invalid request: {}", invalid),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoMemory => write!(f, "rt-thread error NoMemory"),
            Error::Kernel(code) => write!(f, "rt-thread error {}", code),
            Error::Invalid(invalid) => write!(f, "rt-thread error Invalid({:?})", invalid),
        }
    }
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Invalid::EmptyName => "empty name",
            Invalid::NameHasNul => "name contains NUL",
            Invalid::CountTooLarge => "initial count too large",
            Invalid::ZeroStackSize => "zero stack size",
            Invalid::StackTooSmall => "stack buffer smaller than stack size",
            Invalid::PriorityOutOfRange => "priority out of range",
            Invalid::ZeroCapacity => "zero capacity",
            Invalid::CapacityTooLarge => "capacity too large",
            Invalid::PoolTooSmall => "message pool too small",
            Invalid::ZeroMessageSize => "zero message size",
            Invalid::MessageTooLarge => "message size too large",
            Invalid::AlreadyInitialized => "control block already initialized",
            Invalid::BufferInUse => "stack or pool already in use",
        };
        f.write_str(msg)
    }
}

/// Wraps a value with a possible RT-Thread error.
pub type Result<T> = core::result::Result<T, Error>;

/// Map a status returned by an RT-Thread initializer into a Result.
///
/// Anything other than `RT_EOK` is an error, kept verbatim.
#[inline(always)]
pub fn to_result(code: rt_err_t) -> Result<()> {
    if code == RT_EOK {
        Ok(())
    } else {
        Err(Error::Kernel(code))
    }
}
