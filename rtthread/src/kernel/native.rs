// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! The real kernel.
//!
//! Each kind of object, and the kernel heap, can be configured out of RT-Thread.  When it is, the
//! matching C functions don't exist.  The creates then report no object, and the inits return
//! `-RT_ENOSYS`, so callers see the same errors they would for a failed call.

use core::ptr::NonNull;

use crate::kernel::{Kernel, ObjectName};
use crate::object::{MailboxPool, MessagePool, ThreadStack};
use crate::provision::{
    EventParams, MailboxParams, MessageQueueParams, MutexParams, SemaphoreParams, ThreadParams,
};
use crate::raw::{
    self, rt_err_t, rt_event, rt_mailbox, rt_messagequeue, rt_mutex, rt_semaphore, rt_size_t,
    rt_thread,
};

/// The RT-Thread kernel this code is linked against.
#[derive(Clone, Copy, Debug, Default)]
pub struct RtThread;

// Define a function under a cfg, and a stand-in returning `$fallback` when the cfg is not met.
macro_rules! gated {
    ($(
        #[cfg($($cond:tt)*)]
        unsafe fn $name:ident($($arg:ident: $ty:ty),* $(,)?) -> $ret:ty $body:block
        else $fallback:expr;
    )*) => {
        $(
            #[cfg($($cond)*)]
            unsafe fn $name($($arg: $ty),*) -> $ret $body

            #[cfg(not($($cond)*))]
            #[allow(unused_variables)]
            unsafe fn $name($($arg: $ty),*) -> $ret {
                $fallback
            }
        )*
    };
}

gated! {
    #[cfg(all(RT_USING_HEAP, RT_USING_SEMAPHORE))]
    unsafe fn sem_create(name: &ObjectName, params: &SemaphoreParams) -> Option<NonNull<rt_semaphore>> {
        NonNull::new(raw::rt_sem_create(name.as_ptr(), params.value, params.flag.raw()))
    } else None;

    #[cfg(RT_USING_SEMAPHORE)]
    unsafe fn sem_init(
        sem: NonNull<rt_semaphore>,
        name: &ObjectName,
        params: &SemaphoreParams,
    ) -> rt_err_t {
        raw::rt_sem_init(sem.as_ptr(), name.as_ptr(), params.value, params.flag.raw())
    } else -raw::RT_ENOSYS;

    #[cfg(all(RT_USING_HEAP, RT_USING_MUTEX))]
    unsafe fn mutex_create(name: &ObjectName, params: &MutexParams) -> Option<NonNull<rt_mutex>> {
        NonNull::new(raw::rt_mutex_create(name.as_ptr(), params.flag.raw()))
    } else None;

    #[cfg(RT_USING_MUTEX)]
    unsafe fn mutex_init(mutex: NonNull<rt_mutex>, name: &ObjectName, params: &MutexParams) -> rt_err_t {
        raw::rt_mutex_init(mutex.as_ptr(), name.as_ptr(), params.flag.raw())
    } else -raw::RT_ENOSYS;

    #[cfg(RT_USING_HEAP)]
    unsafe fn thread_create(name: &ObjectName, params: &ThreadParams) -> Option<NonNull<rt_thread>> {
        NonNull::new(raw::rt_thread_create(
            name.as_ptr(),
            Some(params.entry),
            params.parameter,
            params.stack_size,
            params.priority,
            params.time_slice.ticks(),
        ))
    } else None;

    #[cfg(all(RT_USING_HEAP, RT_USING_EVENT))]
    unsafe fn event_create(name: &ObjectName, params: &EventParams) -> Option<NonNull<rt_event>> {
        NonNull::new(raw::rt_event_create(name.as_ptr(), params.flag.raw()))
    } else None;

    #[cfg(RT_USING_EVENT)]
    unsafe fn event_init(event: NonNull<rt_event>, name: &ObjectName, params: &EventParams) -> rt_err_t {
        raw::rt_event_init(event.as_ptr(), name.as_ptr(), params.flag.raw())
    } else -raw::RT_ENOSYS;

    #[cfg(all(RT_USING_HEAP, RT_USING_MAILBOX))]
    unsafe fn mb_create(name: &ObjectName, params: &MailboxParams) -> Option<NonNull<rt_mailbox>> {
        NonNull::new(raw::rt_mb_create(
            name.as_ptr(),
            params.capacity as rt_size_t,
            params.flag.raw(),
        ))
    } else None;

    #[cfg(RT_USING_MAILBOX)]
    unsafe fn mb_init(
        mb: NonNull<rt_mailbox>,
        name: &ObjectName,
        params: &MailboxParams,
        pool: &MailboxPool,
    ) -> rt_err_t {
        raw::rt_mb_init(
            mb.as_ptr(),
            name.as_ptr(),
            pool.base().as_ptr().cast(),
            params.capacity as rt_size_t,
            params.flag.raw(),
        )
    } else -raw::RT_ENOSYS;

    #[cfg(all(RT_USING_HEAP, RT_USING_MESSAGEQUEUE))]
    unsafe fn mq_create(
        name: &ObjectName,
        params: &MessageQueueParams,
    ) -> Option<NonNull<rt_messagequeue>> {
        NonNull::new(raw::rt_mq_create(
            name.as_ptr(),
            params.msg_size as rt_size_t,
            params.max_msgs as rt_size_t,
            params.flag.raw(),
        ))
    } else None;

    #[cfg(RT_USING_MESSAGEQUEUE)]
    unsafe fn mq_init(
        mq: NonNull<rt_messagequeue>,
        name: &ObjectName,
        params: &MessageQueueParams,
        pool: &MessagePool,
    ) -> rt_err_t {
        raw::rt_mq_init(
            mq.as_ptr(),
            name.as_ptr(),
            pool.base().as_ptr().cast(),
            params.msg_size as rt_size_t,
            pool.len() as rt_size_t,
            params.flag.raw(),
        )
    } else -raw::RT_ENOSYS;
}

// Threads are always part of the kernel.
unsafe fn thread_init(
    thread: NonNull<rt_thread>,
    name: &ObjectName,
    params: &ThreadParams,
    stack: &ThreadStack,
) -> rt_err_t {
    raw::rt_thread_init(
        thread.as_ptr(),
        name.as_ptr(),
        Some(params.entry),
        params.parameter,
        stack.base().as_ptr().cast(),
        params.stack_size,
        params.priority,
        params.time_slice.ticks(),
    )
}

// The kernel copies the name into the object, so the `ObjectName` need not outlive the call.
unsafe impl Kernel for RtThread {
    fn sem_create(&self, name: &ObjectName, params: &SemaphoreParams) -> Option<NonNull<rt_semaphore>> {
        unsafe { sem_create(name, params) }
    }

    unsafe fn sem_init(
        &self,
        sem: NonNull<rt_semaphore>,
        name: &ObjectName,
        params: &SemaphoreParams,
    ) -> rt_err_t {
        sem_init(sem, name, params)
    }

    fn mutex_create(&self, name: &ObjectName, params: &MutexParams) -> Option<NonNull<rt_mutex>> {
        unsafe { mutex_create(name, params) }
    }

    unsafe fn mutex_init(
        &self,
        mutex: NonNull<rt_mutex>,
        name: &ObjectName,
        params: &MutexParams,
    ) -> rt_err_t {
        mutex_init(mutex, name, params)
    }

    fn thread_create(&self, name: &ObjectName, params: &ThreadParams) -> Option<NonNull<rt_thread>> {
        unsafe { thread_create(name, params) }
    }

    unsafe fn thread_init(
        &self,
        thread: NonNull<rt_thread>,
        name: &ObjectName,
        params: &ThreadParams,
        stack: &ThreadStack,
    ) -> rt_err_t {
        thread_init(thread, name, params, stack)
    }

    fn event_create(&self, name: &ObjectName, params: &EventParams) -> Option<NonNull<rt_event>> {
        unsafe { event_create(name, params) }
    }

    unsafe fn event_init(
        &self,
        event: NonNull<rt_event>,
        name: &ObjectName,
        params: &EventParams,
    ) -> rt_err_t {
        event_init(event, name, params)
    }

    fn mb_create(&self, name: &ObjectName, params: &MailboxParams) -> Option<NonNull<rt_mailbox>> {
        unsafe { mb_create(name, params) }
    }

    unsafe fn mb_init(
        &self,
        mb: NonNull<rt_mailbox>,
        name: &ObjectName,
        params: &MailboxParams,
        pool: &MailboxPool,
    ) -> rt_err_t {
        mb_init(mb, name, params, pool)
    }

    fn mq_create(
        &self,
        name: &ObjectName,
        params: &MessageQueueParams,
    ) -> Option<NonNull<rt_messagequeue>> {
        unsafe { mq_create(name, params) }
    }

    unsafe fn mq_init(
        &self,
        mq: NonNull<rt_messagequeue>,
        name: &ObjectName,
        params: &MessageQueueParams,
        pool: &MessagePool,
    ) -> rt_err_t {
        mq_init(mq, name, params, pool)
    }
}
