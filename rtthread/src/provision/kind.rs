// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! The kinds of kernel object that can be provisioned.
//!
//! Each kind is a marker type implementing [`Primitive`], which ties together the kind's raw
//! control block, its parameters, the storage a static object needs, the checks made on a request,
//! and the pair of kernel calls that make the object.  The generic [`provision`] function is
//! written once against this trait.
//!
//! [`provision`]: super::provision

use core::fmt;
use core::ptr::NonNull;

use crate::align::align_up;
use crate::error::Invalid;
use crate::kconfig;
use crate::kernel::{Kernel, ObjectName};
use crate::object::{ControlBlock, StaticObject};
use crate::raw::{
    self, rt_err_t, rt_event, rt_mailbox, rt_messagequeue, rt_mutex, rt_semaphore, rt_thread,
};

use super::params::{
    EventParams, MailboxParams, MailboxStorage, MessageQueueParams, MessageQueueStorage,
    MutexParams, SemaphoreParams, ThreadParams, ThreadStorage,
};

/// Kernel object kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Counting semaphore.
    Semaphore,
    /// Mutex, with priority inheritance.
    Mutex,
    /// Thread.
    Thread,
    /// Event flag group.
    Event,
    /// Mailbox of word sized mails.
    Mailbox,
    /// Queue of fixed size messages.
    MessageQueue,
}

impl Kind {
    /// All of the kinds.
    pub const ALL: [Kind; 6] = [
        Kind::Semaphore,
        Kind::Mutex,
        Kind::Thread,
        Kind::Event,
        Kind::Mailbox,
        Kind::MessageQueue,
    ];

    /// The kernel's `RT_Object_Class_*` for objects of this kind.
    pub fn object_class(self) -> u8 {
        match self {
            Kind::Semaphore => raw::RT_Object_Class_Semaphore,
            Kind::Mutex => raw::RT_Object_Class_Mutex,
            Kind::Thread => raw::RT_Object_Class_Thread,
            Kind::Event => raw::RT_Object_Class_Event,
            Kind::Mailbox => raw::RT_Object_Class_MailBox,
            Kind::MessageQueue => raw::RT_Object_Class_MessageQueue,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Semaphore => "semaphore",
            Kind::Mutex => "mutex",
            Kind::Thread => "thread",
            Kind::Event => "event",
            Kind::Mailbox => "mailbox",
            Kind::MessageQueue => "messagequeue",
        })
    }
}

mod private {
    pub trait Sealed {}
}

/// A kind of kernel object, and how to make one.
pub trait Primitive: private::Sealed + Sized {
    /// Which kind this is.
    const KIND: Kind;

    /// The kernel's control block.
    type Raw: ControlBlock + 'static;

    /// Request parameters.
    type Params;

    /// What a static object needs.
    type Storage;

    /// Check a request.  `storage` is given for static requests.
    fn validate(params: &Self::Params, storage: Option<&Self::Storage>) -> Result<(), Invalid>;

    /// Have the kernel allocate an object.
    fn create<K: Kernel + ?Sized>(
        kernel: &K,
        name: &ObjectName,
        params: &Self::Params,
    ) -> Option<NonNull<Self::Raw>>;

    /// The control block within the static storage.
    fn control_block(storage: &Self::Storage) -> &'static StaticObject<Self::Raw>;

    /// Claim the stack or pool within the static storage, for kinds that have one.
    fn claim_buffer(_storage: &Self::Storage) -> Result<(), Invalid> {
        Ok(())
    }

    /// Finish the claim made by [`Primitive::claim_buffer`].
    fn finish_buffer(_storage: &Self::Storage, _ok: bool) {}

    /// Have the kernel initialize the object in `raw`.
    ///
    /// # Safety
    ///
    /// `raw` is the control block of `storage`, claimed for this call, and `validate` has
    /// accepted the request.
    unsafe fn init<K: Kernel + ?Sized>(
        kernel: &K,
        raw: NonNull<Self::Raw>,
        name: &ObjectName,
        params: &Self::Params,
        storage: &Self::Storage,
    ) -> rt_err_t;
}

/// Counting semaphores.
#[derive(Debug)]
pub enum Semaphore {}
/// Mutexes.
#[derive(Debug)]
pub enum Mutex {}
/// Threads.
#[derive(Debug)]
pub enum Thread {}
/// Event groups.
#[derive(Debug)]
pub enum Event {}
/// Mailboxes.
#[derive(Debug)]
pub enum Mailbox {}
/// Message queues.
#[derive(Debug)]
pub enum MessageQueue {}

impl private::Sealed for Semaphore {}
impl private::Sealed for Mutex {}
impl private::Sealed for Thread {}
impl private::Sealed for Event {}
impl private::Sealed for Mailbox {}
impl private::Sealed for MessageQueue {}

impl Primitive for Semaphore {
    const KIND: Kind = Kind::Semaphore;
    type Raw = rt_semaphore;
    type Params = SemaphoreParams;
    type Storage = &'static StaticObject<rt_semaphore>;

    fn validate(params: &SemaphoreParams, _storage: Option<&Self::Storage>) -> Result<(), Invalid> {
        if params.value > u16::MAX as u32 {
            return Err(Invalid::CountTooLarge);
        }
        Ok(())
    }

    fn create<K: Kernel + ?Sized>(
        kernel: &K,
        name: &ObjectName,
        params: &SemaphoreParams,
    ) -> Option<NonNull<rt_semaphore>> {
        kernel.sem_create(name, params)
    }

    fn control_block(storage: &Self::Storage) -> &'static StaticObject<rt_semaphore> {
        *storage
    }

    unsafe fn init<K: Kernel + ?Sized>(
        kernel: &K,
        raw: NonNull<rt_semaphore>,
        name: &ObjectName,
        params: &SemaphoreParams,
        _storage: &Self::Storage,
    ) -> rt_err_t {
        kernel.sem_init(raw, name, params)
    }
}

impl Primitive for Mutex {
    const KIND: Kind = Kind::Mutex;
    type Raw = rt_mutex;
    type Params = MutexParams;
    type Storage = &'static StaticObject<rt_mutex>;

    fn validate(_params: &MutexParams, _storage: Option<&Self::Storage>) -> Result<(), Invalid> {
        Ok(())
    }

    fn create<K: Kernel + ?Sized>(
        kernel: &K,
        name: &ObjectName,
        params: &MutexParams,
    ) -> Option<NonNull<rt_mutex>> {
        kernel.mutex_create(name, params)
    }

    fn control_block(storage: &Self::Storage) -> &'static StaticObject<rt_mutex> {
        *storage
    }

    unsafe fn init<K: Kernel + ?Sized>(
        kernel: &K,
        raw: NonNull<rt_mutex>,
        name: &ObjectName,
        params: &MutexParams,
        _storage: &Self::Storage,
    ) -> rt_err_t {
        kernel.mutex_init(raw, name, params)
    }
}

impl Primitive for Thread {
    const KIND: Kind = Kind::Thread;
    type Raw = rt_thread;
    type Params = ThreadParams;
    type Storage = ThreadStorage;

    fn validate(params: &ThreadParams, storage: Option<&ThreadStorage>) -> Result<(), Invalid> {
        if params.stack_size == 0 {
            return Err(Invalid::ZeroStackSize);
        }
        if params.priority as usize >= kconfig::RT_THREAD_PRIORITY_MAX {
            return Err(Invalid::PriorityOutOfRange);
        }
        if let Some(storage) = storage {
            if params.stack_size as usize > storage.stack.size() {
                return Err(Invalid::StackTooSmall);
            }
        }
        Ok(())
    }

    fn create<K: Kernel + ?Sized>(
        kernel: &K,
        name: &ObjectName,
        params: &ThreadParams,
    ) -> Option<NonNull<rt_thread>> {
        kernel.thread_create(name, params)
    }

    fn control_block(storage: &ThreadStorage) -> &'static StaticObject<rt_thread> {
        storage.thread
    }

    fn claim_buffer(storage: &ThreadStorage) -> Result<(), Invalid> {
        storage.stack.claim()
    }

    fn finish_buffer(storage: &ThreadStorage, ok: bool) {
        storage.stack.finish(ok);
    }

    unsafe fn init<K: Kernel + ?Sized>(
        kernel: &K,
        raw: NonNull<rt_thread>,
        name: &ObjectName,
        params: &ThreadParams,
        storage: &ThreadStorage,
    ) -> rt_err_t {
        kernel.thread_init(raw, name, params, &storage.stack)
    }
}

impl Primitive for Event {
    const KIND: Kind = Kind::Event;
    type Raw = rt_event;
    type Params = EventParams;
    type Storage = &'static StaticObject<rt_event>;

    fn validate(_params: &EventParams, _storage: Option<&Self::Storage>) -> Result<(), Invalid> {
        Ok(())
    }

    fn create<K: Kernel + ?Sized>(
        kernel: &K,
        name: &ObjectName,
        params: &EventParams,
    ) -> Option<NonNull<rt_event>> {
        kernel.event_create(name, params)
    }

    fn control_block(storage: &Self::Storage) -> &'static StaticObject<rt_event> {
        *storage
    }

    unsafe fn init<K: Kernel + ?Sized>(
        kernel: &K,
        raw: NonNull<rt_event>,
        name: &ObjectName,
        params: &EventParams,
        _storage: &Self::Storage,
    ) -> rt_err_t {
        kernel.event_init(raw, name, params)
    }
}

impl Primitive for Mailbox {
    const KIND: Kind = Kind::Mailbox;
    type Raw = rt_mailbox;
    type Params = MailboxParams;
    type Storage = MailboxStorage;

    fn validate(params: &MailboxParams, storage: Option<&MailboxStorage>) -> Result<(), Invalid> {
        if params.capacity == 0 {
            return Err(Invalid::ZeroCapacity);
        }
        if params.capacity > u16::MAX as usize {
            return Err(Invalid::CapacityTooLarge);
        }
        if let Some(storage) = storage {
            if storage.pool.len() < params.capacity {
                return Err(Invalid::PoolTooSmall);
            }
        }
        Ok(())
    }

    fn create<K: Kernel + ?Sized>(
        kernel: &K,
        name: &ObjectName,
        params: &MailboxParams,
    ) -> Option<NonNull<rt_mailbox>> {
        kernel.mb_create(name, params)
    }

    fn control_block(storage: &MailboxStorage) -> &'static StaticObject<rt_mailbox> {
        storage.mailbox
    }

    fn claim_buffer(storage: &MailboxStorage) -> Result<(), Invalid> {
        storage.pool.claim()
    }

    fn finish_buffer(storage: &MailboxStorage, ok: bool) {
        storage.pool.finish(ok);
    }

    unsafe fn init<K: Kernel + ?Sized>(
        kernel: &K,
        raw: NonNull<rt_mailbox>,
        name: &ObjectName,
        params: &MailboxParams,
        storage: &MailboxStorage,
    ) -> rt_err_t {
        kernel.mb_init(raw, name, params, &storage.pool)
    }
}

impl Primitive for MessageQueue {
    const KIND: Kind = Kind::MessageQueue;
    type Raw = rt_messagequeue;
    type Params = MessageQueueParams;
    type Storage = MessageQueueStorage;

    // How the message size and the pool size fit together is the kernel's business.  Only sizes
    // the control block can't represent, and an empty pool, are refused here.  The kernel keeps
    // the aligned message size, so that is what has to fit in 16 bits.
    fn validate(
        params: &MessageQueueParams,
        storage: Option<&MessageQueueStorage>,
    ) -> Result<(), Invalid> {
        if params.msg_size == 0 {
            return Err(Invalid::ZeroMessageSize);
        }
        if params.msg_size > u16::MAX as usize || align_up(params.msg_size) > u16::MAX as usize {
            return Err(Invalid::MessageTooLarge);
        }
        match storage {
            None => {
                if params.max_msgs == 0 {
                    return Err(Invalid::ZeroCapacity);
                }
                if params.max_msgs > u16::MAX as usize {
                    return Err(Invalid::CapacityTooLarge);
                }
            }
            Some(storage) => {
                if storage.pool.is_empty() {
                    return Err(Invalid::PoolTooSmall);
                }
            }
        }
        Ok(())
    }

    fn create<K: Kernel + ?Sized>(
        kernel: &K,
        name: &ObjectName,
        params: &MessageQueueParams,
    ) -> Option<NonNull<rt_messagequeue>> {
        kernel.mq_create(name, params)
    }

    fn control_block(storage: &MessageQueueStorage) -> &'static StaticObject<rt_messagequeue> {
        storage.queue
    }

    fn claim_buffer(storage: &MessageQueueStorage) -> Result<(), Invalid> {
        storage.pool.claim()
    }

    fn finish_buffer(storage: &MessageQueueStorage, ok: bool) {
        storage.pool.finish(ok);
    }

    unsafe fn init<K: Kernel + ?Sized>(
        kernel: &K,
        raw: NonNull<rt_messagequeue>,
        name: &ObjectName,
        params: &MessageQueueParams,
        storage: &MessageQueueStorage,
    ) -> rt_err_t {
        kernel.mq_init(raw, name, params, &storage.pool)
    }
}
