// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Per-kind request parameters, and the storage static objects need beyond a control block.

use core::ffi::c_void;

use crate::kernel::IpcFlag;
use crate::object::{
    MailboxPool, MessagePool, StaticMailbox, StaticMessageQueue, StaticThread, ThreadStack,
};
use crate::time::Duration;

/// A counting semaphore.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SemaphoreParams {
    /// Initial count.  The kernel keeps this in 16 bits.
    pub value: u32,
    /// Wait queue ordering.
    pub flag: IpcFlag,
}

/// A mutex.
///
/// RT-Thread mutexes always use priority inheritance.  Older kernels honour the flag, newer ones
/// always order waiters by priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutexParams {
    /// Wait queue ordering.
    pub flag: IpcFlag,
}

/// An event group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventParams {
    /// Wait queue ordering.
    pub flag: IpcFlag,
}

/// A mailbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MailboxParams {
    /// Number of mails the box holds.
    pub capacity: usize,
    /// Wait queue ordering.
    pub flag: IpcFlag,
}

/// A message queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageQueueParams {
    /// Largest message, in bytes.
    pub msg_size: usize,
    /// Number of messages a dynamic queue holds.  A static queue holds as many as fit in its
    /// pool, and this is not used.
    pub max_msgs: usize,
    /// Wait queue ordering.
    pub flag: IpcFlag,
}

/// Thread entry point, called with the thread's `parameter`.
pub type ThreadEntry = unsafe extern "C" fn(parameter: *mut c_void);

/// A thread.
#[derive(Clone, Copy, Debug)]
pub struct ThreadParams {
    /// Where the thread starts.
    pub entry: ThreadEntry,
    /// Passed to `entry`.
    pub parameter: *mut c_void,
    /// Stack size in bytes.  For a static thread, no larger than its stack.
    pub stack_size: u32,
    /// Priority, lower numbers are more urgent.  Below `RT_THREAD_PRIORITY_MAX`.
    pub priority: u8,
    /// Round robin time slice among threads of the same priority.
    pub time_slice: Duration,
}

/// Storage for a static thread.
#[derive(Debug)]
pub struct ThreadStorage {
    /// The control block.
    pub thread: &'static StaticThread,
    /// The stack.
    pub stack: ThreadStack,
}

/// Storage for a static mailbox.
#[derive(Debug)]
pub struct MailboxStorage {
    /// The control block.
    pub mailbox: &'static StaticMailbox,
    /// Where the mails are kept.
    pub pool: MailboxPool,
}

/// Storage for a static message queue.
#[derive(Debug)]
pub struct MessageQueueStorage {
    /// The control block.
    pub queue: &'static StaticMessageQueue,
    /// Where the messages are kept.
    pub pool: MessagePool,
}
