// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Kernel object provisioning.
//!
//! Each kind of RT-Thread object can be made two ways.  `rt_sem_create` and friends allocate the
//! object from the kernel heap, report failure by returning no object, and leave the caller with
//! an object to `rt_sem_delete` later.  `rt_sem_init` and friends build the object in memory the
//! caller owns, report failure with a status code, and need no delete.  The functions here give a
//! single call per kind, where the choice between the two is an [`Allocation`]:
//!
//! ```
//! use rtthread::kernel::{IpcFlag, sim::SimKernel};
//! use rtthread::kobj_define;
//! use rtthread::object::StaticMutex;
//! use rtthread::provision::{self, Allocation, MutexParams, SemaphoreParams};
//!
//! kobj_define! {
//!     static LOCK: StaticMutex;
//! }
//!
//! let kernel = SimKernel::new();
//!
//! // From the kernel heap.
//! let sem = provision::semaphore(
//!     &kernel,
//!     "s1",
//!     SemaphoreParams { value: 1, flag: IpcFlag::Fifo },
//!     Allocation::Dynamic,
//! ).unwrap();
//!
//! // In place, in `LOCK`.
//! let lock = provision::mutex(
//!     &kernel,
//!     "lock",
//!     MutexParams { flag: IpcFlag::Prio },
//!     Allocation::Static(&LOCK),
//! ).unwrap();
//! assert_eq!(lock.as_ptr(), LOCK.as_ptr());
//! # let _ = sem;
//! ```
//!
//! Every call logs exactly one record, to the `rtthread::provision` target: `Info` when the
//! object was provisioned, `Error` when it wasn't.
//!
//! Failures come back as:
//!
//! - [`Error::NoMemory`] when the kernel couldn't allocate a dynamic object.
//! - [`Error::Kernel`] with the kernel's own status when an in-place initialization was refused.
//! - [`Error::Invalid`] when the request was rejected without asking the kernel.
//!
//! Nothing is retried, and nothing is cleaned up after a kernel failure.
//!
//! [`Error::NoMemory`]: crate::Error::NoMemory
//! [`Error::Kernel`]: crate::Error::Kernel
//! [`Error::Invalid`]: crate::Error::Invalid

use core::fmt;
use core::ptr::NonNull;

use log::{error, info};

use crate::error::{to_result, Error, Result};
use crate::kernel::{Kernel, ObjectName};
use crate::object::{StaticEvent, StaticMutex, StaticSemaphore};

pub mod kind;
mod params;

pub use kind::{Kind, Primitive};
pub use params::{
    EventParams, MailboxParams, MailboxStorage, MessageQueueParams, MessageQueueStorage,
    MutexParams, SemaphoreParams, ThreadEntry, ThreadParams, ThreadStorage,
};

/// Log target for provisioning records.
pub const LOG_TARGET: &str = "rtthread::provision";

/// Where an object's memory comes from.
///
/// `S` is the storage needed for a static object of the kind: a reference to a control block, or
/// for threads, mailboxes and message queues one of the `*Storage` structs that adds the stack or
/// pool.
#[derive(Debug)]
pub enum Allocation<S> {
    /// The kernel allocates the object from its heap.
    Dynamic,
    /// The kernel initializes the object in this caller owned storage.
    Static(S),
}

impl<S> Allocation<S> {
    /// Which of the two this is.
    pub fn origin(&self) -> Origin {
        match self {
            Allocation::Dynamic => Origin::Dynamic,
            Allocation::Static(_) => Origin::Static,
        }
    }
}

/// How a provisioned object was made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Allocated by the kernel.  Must be deleted through the kernel when done with.
    Dynamic,
    /// Initialized in caller storage.  Never deleted.
    Static,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Dynamic => f.write_str("dynamic"),
            Origin::Static => f.write_str("static"),
        }
    }
}

/// A provisioned kernel object of kind `P`.
///
/// This is the kernel's own reference to the object (an `rt_sem_t`, `rt_thread_t`, ...), along
/// with how it was made.  A handle only exists for an object the kernel has fully set up.
///
/// Dropping a handle does nothing to the object.  A dynamic object should be given back to the
/// kernel's delete call, using the pointer from [`into_dynamic`].  A static object lives for as
/// long as its storage.
///
/// [`into_dynamic`]: Handle::into_dynamic
pub struct Handle<P: Primitive> {
    raw: NonNull<P::Raw>,
    origin: Origin,
}

// The kernel does its own locking on its objects, a handle can be used from any thread.
unsafe impl<P: Primitive> Send for Handle<P> {}
unsafe impl<P: Primitive> Sync for Handle<P> {}

impl<P: Primitive> Handle<P> {
    /// The raw kernel object, for passing to the kernel API.
    pub fn as_ptr(&self) -> *mut P::Raw {
        self.raw.as_ptr()
    }

    /// How the object was made.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// The kind of object.
    pub fn kind(&self) -> Kind {
        P::KIND
    }

    /// Give up the handle of a dynamic object, to delete it.
    ///
    /// Static objects must never reach the kernel's delete calls, so for those the handle is
    /// returned unchanged as the error.
    pub fn into_dynamic(self) -> core::result::Result<NonNull<P::Raw>, Self> {
        match self.origin {
            Origin::Dynamic => Ok(self.raw),
            Origin::Static => Err(self),
        }
    }
}

impl<P: Primitive> fmt::Debug for Handle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {:?}", P::KIND, self.origin, self.raw)
    }
}

/// A semaphore handle.
pub type SemaphoreHandle = Handle<kind::Semaphore>;
/// A mutex handle.
pub type MutexHandle = Handle<kind::Mutex>;
/// A thread handle.  The thread has not been started.
pub type ThreadHandle = Handle<kind::Thread>;
/// An event group handle.
pub type EventHandle = Handle<kind::Event>;
/// A mailbox handle.
pub type MailboxHandle = Handle<kind::Mailbox>;
/// A message queue handle.
pub type MessageQueueHandle = Handle<kind::MessageQueue>;

/// Provision an object of kind `P`.
///
/// This is the algorithm behind all of the per-kind functions in this module.
pub fn provision<P, K>(
    kernel: &K,
    name: &str,
    params: P::Params,
    allocation: Allocation<P::Storage>,
) -> Result<Handle<P>>
where
    P: Primitive,
    K: Kernel + ?Sized,
{
    let origin = allocation.origin();
    let result = try_provision::<P, K>(kernel, name, &params, &allocation);

    let verb = match origin {
        Origin::Dynamic => "created",
        Origin::Static => "initialized",
    };
    match &result {
        Ok(_) => info!(target: LOG_TARGET, "{} {:?} {} ({})", P::KIND, name, verb, origin),
        Err(e) => error!(target: LOG_TARGET, "{} {:?} not {} ({}): {}", P::KIND, name, verb, origin, e),
    }
    result
}

fn try_provision<P, K>(
    kernel: &K,
    name: &str,
    params: &P::Params,
    allocation: &Allocation<P::Storage>,
) -> Result<Handle<P>>
where
    P: Primitive,
    K: Kernel + ?Sized,
{
    let name = ObjectName::new(name)?;

    match allocation {
        Allocation::Dynamic => {
            P::validate(params, None)?;
            let raw = P::create(kernel, &name, params).ok_or(Error::NoMemory)?;
            Ok(Handle {
                raw,
                origin: Origin::Dynamic,
            })
        }
        Allocation::Static(storage) => {
            P::validate(params, Some(storage))?;
            let control = P::control_block(storage);
            let raw = control.claim()?;
            if let Err(e) = P::claim_buffer(storage) {
                control.finish(false);
                return Err(e.into());
            }
            // SAFETY: The control block and any stack or pool are 'static and now ours alone.
            // `validate` has checked the stack or pool against the sizes given to the kernel.
            let status = unsafe { P::init(kernel, raw, &name, params, storage) };
            let result = to_result(status);
            P::finish_buffer(storage, result.is_ok());
            control.finish(result.is_ok());
            result.map(|()| Handle {
                raw,
                origin: Origin::Static,
            })
        }
    }
}

/// Provision a counting semaphore, `rt_sem_create` / `rt_sem_init`.
pub fn semaphore<K: Kernel + ?Sized>(
    kernel: &K,
    name: &str,
    params: SemaphoreParams,
    allocation: Allocation<&'static StaticSemaphore>,
) -> Result<SemaphoreHandle> {
    provision::<kind::Semaphore, K>(kernel, name, params, allocation)
}

/// Provision a mutex, `rt_mutex_create` / `rt_mutex_init`.
pub fn mutex<K: Kernel + ?Sized>(
    kernel: &K,
    name: &str,
    params: MutexParams,
    allocation: Allocation<&'static StaticMutex>,
) -> Result<MutexHandle> {
    provision::<kind::Mutex, K>(kernel, name, params, allocation)
}

/// Provision a thread, `rt_thread_create` / `rt_thread_init`.
///
/// The thread is left suspended, it still has to be started with `rt_thread_startup`.
pub fn thread<K: Kernel + ?Sized>(
    kernel: &K,
    name: &str,
    params: ThreadParams,
    allocation: Allocation<ThreadStorage>,
) -> Result<ThreadHandle> {
    provision::<kind::Thread, K>(kernel, name, params, allocation)
}

/// Provision an event group, `rt_event_create` / `rt_event_init`.
pub fn event<K: Kernel + ?Sized>(
    kernel: &K,
    name: &str,
    params: EventParams,
    allocation: Allocation<&'static StaticEvent>,
) -> Result<EventHandle> {
    provision::<kind::Event, K>(kernel, name, params, allocation)
}

/// Provision a mailbox, `rt_mb_create` / `rt_mb_init`.
pub fn mailbox<K: Kernel + ?Sized>(
    kernel: &K,
    name: &str,
    params: MailboxParams,
    allocation: Allocation<MailboxStorage>,
) -> Result<MailboxHandle> {
    provision::<kind::Mailbox, K>(kernel, name, params, allocation)
}

/// Provision a message queue, `rt_mq_create` / `rt_mq_init`.
pub fn message_queue<K: Kernel + ?Sized>(
    kernel: &K,
    name: &str,
    params: MessageQueueParams,
    allocation: Allocation<MessageQueueStorage>,
) -> Result<MessageQueueHandle> {
    provision::<kind::MessageQueue, K>(kernel, name, params, allocation)
}
