// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! # Statically allocated kernel objects
//!
//! RT-Thread can build any of its kernel objects in memory that the application owns, rather
//! than from the kernel heap.  The memory has to stay put for as long as the kernel knows about the
//! object, which in practice means it is a `static`.  The types here are that memory:
//!
//! - [`StaticObject`] holds one control block (`rt_semaphore`, `rt_thread`, ...).  Aliases such as
//!   [`StaticSemaphore`] name the ones that can be provisioned.
//! - [`StaticThreadStack`] is an aligned stack buffer for a thread.
//! - [`StaticMailboxPool`] and [`StaticMessagePool`] are the message buffers for mailboxes and
//!   message queues.
//!
//! These should be declared with [`kobj_define!`]:
//!
//! ```
//! use rtthread::kobj_define;
//! use rtthread::object::{StaticSemaphore, StaticThread, StaticThreadStack};
//!
//! kobj_define! {
//!     static SEM: StaticSemaphore;
//!     static WORKER: StaticThread;
//!     static WORKER_STACK: StaticThreadStack<1024>;
//! }
//! ```
//!
//! and then handed to the functions in [`provision`] with `Allocation::Static`.
//!
//! A control block can only be handed to the kernel once.  Each [`StaticObject`] tracks this, and a
//! second attempt is rejected instead of re-initializing an object the kernel may already have
//! linked into its object lists.  Stacks and pools are tracked the same way, so a stack already
//! running one thread is never handed to a second.
//!
//! [`provision`]: crate::provision
//! [`kobj_define!`]: crate::kobj_define

use core::cell::UnsafeCell;
use core::fmt;
use core::mem;
use core::ptr::NonNull;

use portable_atomic::{AtomicUsize, Ordering};

use crate::align::{AlignAs, RT_ALIGN};
use crate::error::Invalid;
use crate::raw::{
    rt_event, rt_mailbox, rt_messagequeue, rt_mutex, rt_semaphore, rt_thread, rt_ubase_t,
};

/// Raw kernel control blocks that can live in a [`StaticObject`].
///
/// # Safety
///
/// The all-zero bit pattern must be a valid value of the type.
pub unsafe trait ControlBlock {}

unsafe impl ControlBlock for rt_semaphore {}
unsafe impl ControlBlock for rt_mutex {}
unsafe impl ControlBlock for rt_thread {}
unsafe impl ControlBlock for rt_event {}
unsafe impl ControlBlock for rt_mailbox {}
unsafe impl ControlBlock for rt_messagequeue {}

/// Not yet given to the kernel.
const UNINIT: usize = 0;
/// The kernel initializer is running.
const CLAIMED: usize = 1;
/// Initialized, the kernel owns the contents.
const READY: usize = 2;

/// One-time hand over of a piece of static memory to the kernel.
pub(crate) struct Claim(AtomicUsize);

impl Claim {
    const fn new() -> Claim {
        Claim(AtomicUsize::new(UNINIT))
    }

    fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire) == READY
    }

    fn is_free(&self) -> bool {
        self.0.load(Ordering::Acquire) == UNINIT
    }

    /// Fails if the memory is given to the kernel, or being given by someone else.
    pub(crate) fn claim(&self, taken: Invalid) -> Result<(), Invalid> {
        self.0
            .compare_exchange(UNINIT, CLAIMED, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| taken)
    }

    /// `ok` is whether the kernel accepted the object.  A failed initialization hands the memory
    /// back so it may be tried again.
    pub(crate) fn finish(&self, ok: bool) {
        self.0.store(if ok { READY } else { UNINIT }, Ordering::Release);
    }
}

/// A kernel control block in caller owned storage.
///
/// The contents are only ever touched by the kernel.  Rust code gets at the object through the
/// handle returned when it is provisioned.
pub struct StaticObject<T> {
    value: UnsafeCell<T>,
    init: Claim,
}

// The kernel serializes access to the contents.  The init flag is atomic.
unsafe impl<T: ControlBlock> Sync for StaticObject<T> {}
unsafe impl<T: ControlBlock> Send for StaticObject<T> {}

impl<T: ControlBlock> StaticObject<T> {
    /// An uninitialized control block.
    ///
    /// This is `const` so that it can be used for statics, see [`kobj_define!`].
    ///
    /// [`kobj_define!`]: crate::kobj_define
    pub const fn new() -> Self {
        Self {
            // SAFETY: `ControlBlock` types are valid when zeroed.
            value: UnsafeCell::new(unsafe { mem::zeroed() }),
            init: Claim::new(),
        }
    }

    /// The address of the control block, which is what the kernel knows this object by.
    pub fn as_ptr(&self) -> *mut T {
        self.value.get()
    }

    /// Has this control block been successfully initialized by the kernel?
    pub fn is_initialized(&self) -> bool {
        self.init.is_ready()
    }

    /// Claim the control block for initialization.
    ///
    /// Fails if the block is initialized, or being initialized by someone else.
    pub(crate) fn claim(&self) -> Result<NonNull<T>, Invalid> {
        self.init.claim(Invalid::AlreadyInitialized)?;
        // SAFETY: `UnsafeCell::get` never returns null.
        Ok(unsafe { NonNull::new_unchecked(self.value.get()) })
    }

    /// Finish a claim.  `ok` is whether the kernel accepted the object.  A failed initialization
    /// hands the block back so it may be tried again.
    pub(crate) fn finish(&self, ok: bool) {
        self.init.finish(ok);
    }
}

impl<T: ControlBlock> Default for StaticObject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for StaticObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StaticObject {:?}", self.value.get())
    }
}

/// A static `rt_semaphore`.
pub type StaticSemaphore = StaticObject<rt_semaphore>;
/// A static `rt_mutex`.
pub type StaticMutex = StaticObject<rt_mutex>;
/// A static `rt_thread`.  Also needs a [`StaticThreadStack`].
pub type StaticThread = StaticObject<rt_thread>;
/// A static `rt_event`.
pub type StaticEvent = StaticObject<rt_event>;
/// A static `rt_mailbox`.  Also needs a [`StaticMailboxPool`].
pub type StaticMailbox = StaticObject<rt_mailbox>;
/// A static `rt_messagequeue`.  Also needs a [`StaticMessagePool`].
pub type StaticMessageQueue = StaticObject<rt_messagequeue>;

/// A thread stack buffer of `SIZE` bytes, aligned to `RT_ALIGN_SIZE`.
///
/// Only one thread can ever be given the stack.
pub struct StaticThreadStack<const SIZE: usize> {
    #[allow(dead_code)]
    align: AlignAs<RT_ALIGN>,
    data: UnsafeCell<[u8; SIZE]>,
    claim: Claim,
}

unsafe impl<const SIZE: usize> Sync for StaticThreadStack<SIZE> {}

impl<const SIZE: usize> StaticThreadStack<SIZE> {
    /// A zeroed stack.
    pub const fn new() -> Self {
        Self {
            align: AlignAs::new(),
            data: UnsafeCell::new([0; SIZE]),
            claim: Claim::new(),
        }
    }

    /// The stack, as given to a thread.
    ///
    /// This only describes the stack.  It is claimed when a thread is provisioned on it, and a
    /// second thread on the same stack is refused.
    pub fn stack(&'static self) -> ThreadStack {
        ThreadStack {
            // SAFETY: `UnsafeCell::get` never returns null.
            base: unsafe { NonNull::new_unchecked(self.data.get() as *mut u8) },
            size: SIZE,
            claim: &self.claim,
        }
    }

    /// Has a thread been given this stack?
    pub fn is_in_use(&self) -> bool {
        !self.claim.is_free()
    }
}

impl<const SIZE: usize> Default for StaticThreadStack<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

/// A stack in static storage, ready to be given to a thread.
pub struct ThreadStack {
    base: NonNull<u8>,
    size: usize,
    claim: &'static Claim,
}

impl fmt::Debug for ThreadStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ThreadStack {:?} ({} bytes)", self.base, self.size)
    }
}

impl ThreadStack {
    pub(crate) fn claim(&self) -> Result<(), Invalid> {
        self.claim.claim(Invalid::BufferInUse)
    }

    pub(crate) fn finish(&self, ok: bool) {
        self.claim.finish(ok);
    }

    /// Lowest address of the stack.
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    /// Size of the stack, in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// A mailbox pool, holding `N` mails.  Only one mailbox can ever be given the pool.
pub struct StaticMailboxPool<const N: usize> {
    data: UnsafeCell<[rt_ubase_t; N]>,
    claim: Claim,
}

unsafe impl<const N: usize> Sync for StaticMailboxPool<N> {}

impl<const N: usize> StaticMailboxPool<N> {
    /// A zeroed pool.
    pub const fn new() -> Self {
        Self {
            data: UnsafeCell::new([0; N]),
            claim: Claim::new(),
        }
    }

    /// The pool, as given to a mailbox.  Claimed when the mailbox is provisioned.
    pub fn pool(&'static self) -> MailboxPool {
        MailboxPool {
            // SAFETY: `UnsafeCell::get` never returns null.
            base: unsafe { NonNull::new_unchecked(self.data.get() as *mut rt_ubase_t) },
            len: N,
            claim: &self.claim,
        }
    }

    /// Has a mailbox been given this pool?
    pub fn is_in_use(&self) -> bool {
        !self.claim.is_free()
    }
}

impl<const N: usize> Default for StaticMailboxPool<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// A mailbox pool in static storage.
pub struct MailboxPool {
    base: NonNull<rt_ubase_t>,
    len: usize,
    claim: &'static Claim,
}

impl fmt::Debug for MailboxPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MailboxPool {:?} ({} mails)", self.base, self.len)
    }
}

impl MailboxPool {
    pub(crate) fn claim(&self) -> Result<(), Invalid> {
        self.claim.claim(Invalid::BufferInUse)
    }

    pub(crate) fn finish(&self, ok: bool) {
        self.claim.finish(ok);
    }

    /// The first mail slot.
    pub fn base(&self) -> NonNull<rt_ubase_t> {
        self.base
    }

    /// Number of mail slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Does the pool have no slots at all?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A message queue pool of `BYTES` bytes, aligned to `RT_ALIGN_SIZE`.
///
/// The kernel lays out as many messages as fit.  Each takes the message size, rounded up to
/// `RT_ALIGN_SIZE`, plus a header pointer.  See [`MessagePool::slot_size`].
pub struct StaticMessagePool<const BYTES: usize> {
    #[allow(dead_code)]
    align: AlignAs<RT_ALIGN>,
    data: UnsafeCell<[u8; BYTES]>,
    claim: Claim,
}

unsafe impl<const BYTES: usize> Sync for StaticMessagePool<BYTES> {}

impl<const BYTES: usize> StaticMessagePool<BYTES> {
    /// A zeroed pool.
    pub const fn new() -> Self {
        Self {
            align: AlignAs::new(),
            data: UnsafeCell::new([0; BYTES]),
            claim: Claim::new(),
        }
    }

    /// The pool, as given to a message queue.  Claimed when the queue is provisioned.
    pub fn pool(&'static self) -> MessagePool {
        MessagePool {
            // SAFETY: `UnsafeCell::get` never returns null.
            base: unsafe { NonNull::new_unchecked(self.data.get() as *mut u8) },
            len: BYTES,
            claim: &self.claim,
        }
    }

    /// Has a message queue been given this pool?
    pub fn is_in_use(&self) -> bool {
        !self.claim.is_free()
    }
}

impl<const BYTES: usize> Default for StaticMessagePool<BYTES> {
    fn default() -> Self {
        Self::new()
    }
}

/// A message queue pool in static storage.
pub struct MessagePool {
    base: NonNull<u8>,
    len: usize,
    claim: &'static Claim,
}

impl fmt::Debug for MessagePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessagePool {:?} ({} bytes)", self.base, self.len)
    }
}

impl MessagePool {
    pub(crate) fn claim(&self) -> Result<(), Invalid> {
        self.claim.claim(Invalid::BufferInUse)
    }

    pub(crate) fn finish(&self, ok: bool) {
        self.claim.finish(ok);
    }

    /// Start of the pool.
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    /// Size of the pool, in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the pool zero bytes?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The room one message of `msg_size` bytes takes in a pool.
    pub const fn slot_size(msg_size: usize) -> usize {
        crate::align::align_up(msg_size) + mem::size_of::<crate::raw::rt_mq_message>()
    }

    /// Pool size needed to hold `max_msgs` messages of `msg_size` bytes.
    pub const fn bytes_for(msg_size: usize, max_msgs: usize) -> usize {
        Self::slot_size(msg_size) * max_msgs
    }
}

/// Declare static kernel objects.
///
/// Each entry is a `static` with one of the types from [`object`], initialized with its `const`
/// constructor:
///
/// ```
/// use rtthread::kobj_define;
/// use rtthread::object::{MessagePool, StaticMessagePool, StaticMessageQueue};
///
/// kobj_define! {
///     static QUEUE: StaticMessageQueue;
///     pub static QUEUE_POOL: StaticMessagePool<{ MessagePool::bytes_for(16, 8) }>;
/// }
/// ```
///
/// [`object`]: crate::object
#[macro_export]
macro_rules! kobj_define {
    ($($(#[$attr:meta])* $v:vis static $name:ident: $type:ty;)*) => {
        $(
            $(#[$attr])*
            $v static $name: $type = <$type>::new();
        )*
    };
}
