// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! The kernel object API.
//!
//! RT-Thread offers two calls for every kind of kernel object: `rt_xxx_create`, which allocates
//! the object from the kernel heap, and `rt_xxx_init`, which initializes an object in memory the
//! caller provides.  The [`Kernel`] trait gathers those twelve calls, so that the provisioning
//! code can run against the real kernel or against the simulation used for testing.
//!
//! - [`RtThread`] (feature `rtthread`) calls straight into the C API.
//! - [`SimKernel`] (feature `sim`) runs on the host.
//!
//! Implementations take the parameter structs from [`provision`], and an [`ObjectName`], which is
//! the name already in the form the kernel wants it.
//!
//! [`provision`]: crate::provision
//! [`RtThread`]: native::RtThread
//! [`SimKernel`]: sim::SimKernel

use core::ffi::c_char;
use core::fmt;
use core::ptr::NonNull;

use crate::error::Invalid;
use crate::object::{MailboxPool, MessagePool, ThreadStack};
use crate::provision::{
    EventParams, MailboxParams, MessageQueueParams, MutexParams, SemaphoreParams, ThreadParams,
};
use crate::raw::{
    rt_err_t, rt_event, rt_mailbox, rt_messagequeue, rt_mutex, rt_semaphore, rt_thread,
    rt_uint8_t, RT_IPC_FLAG_FIFO, RT_IPC_FLAG_PRIO, RT_NAME_MAX,
};

#[cfg(feature = "rtthread")]
pub mod native;
#[cfg(feature = "sim")]
pub mod sim;

/// The order in which threads waiting on an object are woken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IpcFlag {
    /// First come, first served.
    #[default]
    Fifo,
    /// Highest priority waiter first.
    Prio,
}

impl IpcFlag {
    /// The `RT_IPC_FLAG_*` value.
    pub fn raw(self) -> rt_uint8_t {
        match self {
            IpcFlag::Fifo => RT_IPC_FLAG_FIFO,
            IpcFlag::Prio => RT_IPC_FLAG_PRIO,
        }
    }
}

/// An object name, as a NUL terminated string of at most `RT_NAME_MAX` bytes.
///
/// Longer names are cut short, at a character boundary, the same way the kernel would cut them.
#[derive(Clone, Copy)]
pub struct ObjectName {
    buf: [u8; RT_NAME_MAX],
    len: usize,
}

impl ObjectName {
    /// Convert a name.  It must not be empty and must not contain a NUL.
    pub fn new(name: &str) -> Result<ObjectName, Invalid> {
        if name.is_empty() {
            return Err(Invalid::EmptyName);
        }
        if name.bytes().any(|b| b == 0) {
            return Err(Invalid::NameHasNul);
        }

        let mut len = name.len().min(RT_NAME_MAX - 1);
        while !name.is_char_boundary(len) {
            len -= 1;
        }

        let mut buf = [0u8; RT_NAME_MAX];
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);
        Ok(ObjectName { buf, len })
    }

    /// The name, for handing to C.
    pub fn as_ptr(&self) -> *const c_char {
        self.buf.as_ptr() as *const c_char
    }

    /// The name, without the terminating NUL.
    pub fn as_str(&self) -> &str {
        // SAFETY: The bytes were copied from a `str`, and cut at a character boundary.
        unsafe { core::str::from_utf8_unchecked(&self.buf[..self.len]) }
    }

    /// The name with the NUL terminator and padding, as stored in an `rt_object`.
    pub fn as_bytes_with_nul(&self) -> &[u8; RT_NAME_MAX] {
        &self.buf
    }
}

impl fmt::Debug for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// The RT-Thread kernel object API.
///
/// The `*_create` calls allocate an object, returning `None` when the kernel can't.  The `*_init`
/// calls initialize an object in caller storage, returning the kernel's status, `RT_EOK` or a
/// negated error code.
///
/// # Safety
///
/// Implementations must return, from the `*_create` calls, objects that are fully initialized and
/// that stay valid until deleted through the kernel.
pub unsafe trait Kernel {
    /// `rt_sem_create`.
    fn sem_create(&self, name: &ObjectName, params: &SemaphoreParams) -> Option<NonNull<rt_semaphore>>;

    /// `rt_sem_init`.
    ///
    /// # Safety
    ///
    /// `sem` must be valid for writes, and stay valid for as long as the kernel uses the object.
    unsafe fn sem_init(
        &self,
        sem: NonNull<rt_semaphore>,
        name: &ObjectName,
        params: &SemaphoreParams,
    ) -> rt_err_t;

    /// `rt_mutex_create`.
    fn mutex_create(&self, name: &ObjectName, params: &MutexParams) -> Option<NonNull<rt_mutex>>;

    /// `rt_mutex_init`.
    ///
    /// # Safety
    ///
    /// As for [`sem_init`](Kernel::sem_init).
    unsafe fn mutex_init(
        &self,
        mutex: NonNull<rt_mutex>,
        name: &ObjectName,
        params: &MutexParams,
    ) -> rt_err_t;

    /// `rt_thread_create`.  The kernel allocates the stack as well.
    fn thread_create(&self, name: &ObjectName, params: &ThreadParams) -> Option<NonNull<rt_thread>>;

    /// `rt_thread_init`, on the given stack.
    ///
    /// # Safety
    ///
    /// As for [`sem_init`](Kernel::sem_init), and the stack must be at least
    /// `params.stack_size` bytes and not used by anything else.
    unsafe fn thread_init(
        &self,
        thread: NonNull<rt_thread>,
        name: &ObjectName,
        params: &ThreadParams,
        stack: &ThreadStack,
    ) -> rt_err_t;

    /// `rt_event_create`.
    fn event_create(&self, name: &ObjectName, params: &EventParams) -> Option<NonNull<rt_event>>;

    /// `rt_event_init`.
    ///
    /// # Safety
    ///
    /// As for [`sem_init`](Kernel::sem_init).
    unsafe fn event_init(
        &self,
        event: NonNull<rt_event>,
        name: &ObjectName,
        params: &EventParams,
    ) -> rt_err_t;

    /// `rt_mb_create`.  The kernel allocates the pool as well.
    fn mb_create(&self, name: &ObjectName, params: &MailboxParams) -> Option<NonNull<rt_mailbox>>;

    /// `rt_mb_init`, holding `params.capacity` mails in the given pool.
    ///
    /// # Safety
    ///
    /// As for [`sem_init`](Kernel::sem_init), and the pool must hold at least
    /// `params.capacity` mails and not be used by anything else.
    unsafe fn mb_init(
        &self,
        mb: NonNull<rt_mailbox>,
        name: &ObjectName,
        params: &MailboxParams,
        pool: &MailboxPool,
    ) -> rt_err_t;

    /// `rt_mq_create`.  The kernel allocates the pool as well.
    fn mq_create(
        &self,
        name: &ObjectName,
        params: &MessageQueueParams,
    ) -> Option<NonNull<rt_messagequeue>>;

    /// `rt_mq_init`, using the whole of the given pool.
    ///
    /// # Safety
    ///
    /// As for [`sem_init`](Kernel::sem_init), and the pool must not be used by anything else.
    unsafe fn mq_init(
        &self,
        mq: NonNull<rt_messagequeue>,
        name: &ObjectName,
        params: &MessageQueueParams,
        pool: &MessagePool,
    ) -> rt_err_t;
}
