// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

#![no_std]
// Cfgs come from rtconfig.h.
#![allow(unexpected_cfgs)]

use core::ffi::c_void;

use log::{error, info};

use rtthread::kernel::native::RtThread;
use rtthread::kernel::IpcFlag;
use rtthread::kobj_define;
use rtthread::object::{
    MessagePool, StaticEvent, StaticMessagePool, StaticMessageQueue, StaticMutex, StaticThread,
    StaticThreadStack,
};
use rtthread::provision::{
    self, Allocation, EventParams, MailboxParams, MessageQueueParams, MessageQueueStorage,
    MutexParams, SemaphoreParams, ThreadParams, ThreadStorage,
};
use rtthread::time::Duration;

/// Size of each message sent to the worker.
const MSG_SIZE: usize = 16;
const MSG_COUNT: usize = 8;

const STACK_SIZE: usize = 2048;

kobj_define! {
    static LOCK: StaticMutex;
    static EVENTS: StaticEvent;
    static WORKER: StaticThread;
    static WORKER_STACK: StaticThreadStack<STACK_SIZE>;
    static QUEUE: StaticMessageQueue;
    static QUEUE_POOL: StaticMessagePool<{ MessagePool::bytes_for(MSG_SIZE, MSG_COUNT) }>;
}

unsafe extern "C" fn worker(_parameter: *mut c_void) {}

#[no_mangle]
extern "C" fn rust_main() {
    unsafe {
        rtthread::set_logger().unwrap();
    }

    if let Err(e) = setup() {
        error!("IPC setup stopped: {} (code {})", e, e.code());
        return;
    }
    info!("IPC setup done");
}

fn setup() -> rtthread::Result<()> {
    let kernel = RtThread;

    // Dynamic objects are only available with a kernel heap.
    if cfg!(RT_USING_HEAP) {
        provision::semaphore(
            &kernel,
            "ready",
            SemaphoreParams { value: 0, flag: IpcFlag::Fifo },
            Allocation::Dynamic,
        )?;
        provision::mailbox(
            &kernel,
            "mail",
            MailboxParams { capacity: 8, flag: IpcFlag::Fifo },
            Allocation::Dynamic,
        )?;
    }

    provision::mutex(
        &kernel,
        "lock",
        MutexParams { flag: IpcFlag::Prio },
        Allocation::Static(&LOCK),
    )?;
    provision::event(
        &kernel,
        "events",
        EventParams { flag: IpcFlag::Prio },
        Allocation::Static(&EVENTS),
    )?;
    provision::message_queue(
        &kernel,
        "work",
        MessageQueueParams { msg_size: MSG_SIZE, max_msgs: MSG_COUNT, flag: IpcFlag::Fifo },
        Allocation::Static(MessageQueueStorage { queue: &QUEUE, pool: QUEUE_POOL.pool() }),
    )?;

    let thread = provision::thread(
        &kernel,
        "worker",
        ThreadParams {
            entry: worker,
            parameter: core::ptr::null_mut(),
            stack_size: STACK_SIZE as u32,
            priority: 20,
            time_slice: Duration::millis(10),
        },
        Allocation::Static(ThreadStorage { thread: &WORKER, stack: WORKER_STACK.stack() }),
    )?;
    info!("worker thread ready at {:?}", thread);

    Ok(())
}
