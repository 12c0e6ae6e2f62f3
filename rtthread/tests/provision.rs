// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Provisioning every kind of object, against the simulated kernel.

use std::cell::RefCell;
use std::ffi::c_void;
use std::ptr;
use std::sync::Once;

use log::{Level, Log, Metadata, Record};

use rtthread::error::Invalid;
use rtthread::kernel::sim::{header, header_name, SimKernel};
use rtthread::kernel::IpcFlag;
use rtthread::kobj_define;
use rtthread::object::{
    MessagePool, StaticEvent, StaticMailbox, StaticMailboxPool, StaticMessagePool,
    StaticMessageQueue, StaticMutex, StaticSemaphore, StaticThread, StaticThreadStack,
};
use rtthread::provision::{
    self, Allocation, EventParams, Kind, MailboxParams, MailboxStorage, MessageQueueParams,
    MessageQueueStorage, MutexParams, Origin, SemaphoreParams, ThreadParams, ThreadStorage,
    LOG_TARGET,
};
use rtthread::raw::{self, RT_Object_Class_Static};
use rtthread::time::Duration;
use rtthread::Error;

// Records are kept per test thread, so that tests running side by side don't see each other's.
thread_local! {
    static RECORDS: RefCell<Vec<(Level, String, String)>> = const { RefCell::new(Vec::new()) };
}

struct Capture;

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        RECORDS.with(|r| {
            r.borrow_mut().push((
                record.level(),
                record.target().to_string(),
                record.args().to_string(),
            ))
        });
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture;
static INSTALL: Once = Once::new();

fn capture() {
    INSTALL.call_once(|| {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(log::LevelFilter::Trace);
    });
    RECORDS.with(|r| r.borrow_mut().clear());
}

/// The one record logged since the last check.
fn one_record() -> (Level, String) {
    let records = RECORDS.with(|r| r.take());
    assert_eq!(records.len(), 1, "expected exactly one record, got {:?}", records);
    let (level, target, msg) = records.into_iter().next().unwrap();
    assert_eq!(target, LOG_TARGET);
    (level, msg)
}

unsafe extern "C" fn worker(_: *mut c_void) {}

fn thread_params(stack_size: u32) -> ThreadParams {
    ThreadParams {
        entry: worker,
        parameter: ptr::null_mut(),
        stack_size,
        priority: 10,
        time_slice: Duration::from_ticks(20),
    }
}

fn class_of<T: rtthread::object::ControlBlock>(obj: *mut T) -> u8 {
    unsafe { header(obj) }.type_
}

fn name_of<T: rtthread::object::ControlBlock>(obj: *mut T) -> String {
    header_name(unsafe { header(obj) }).to_string()
}

#[test]
fn dynamic_semaphore_from_heap() {
    capture();
    let kernel = SimKernel::new();
    let sem = provision::semaphore(
        &kernel,
        "s1",
        SemaphoreParams { value: 1, flag: IpcFlag::Fifo },
        Allocation::Dynamic,
    )
    .unwrap();

    assert_eq!(sem.origin(), Origin::Dynamic);
    assert_eq!(sem.kind(), Kind::Semaphore);
    assert!(!sem.as_ptr().is_null());
    assert_eq!(name_of(sem.as_ptr()), "s1");
    assert_eq!(class_of(sem.as_ptr()), raw::RT_Object_Class_Semaphore);
    assert_eq!(unsafe { (*sem.as_ptr()).value }, 1);

    let (level, msg) = one_record();
    assert_eq!(level, Level::Info);
    assert!(msg.contains("semaphore") && msg.contains("s1"), "{}", msg);

    assert_eq!(kernel.live_objects(), 1);
    let raw = sem.into_dynamic().unwrap();
    assert!(unsafe { kernel.delete(raw) });
    assert_eq!(kernel.live_objects(), 0);
}

#[test]
fn static_mutex_in_caller_storage() {
    kobj_define! {
        static B: StaticMutex;
    }

    capture();
    let kernel = SimKernel::new();
    let mutex = provision::mutex(
        &kernel,
        "lock",
        MutexParams { flag: IpcFlag::Prio },
        Allocation::Static(&B),
    )
    .unwrap();

    assert_eq!(mutex.as_ptr(), B.as_ptr());
    assert_eq!(mutex.origin(), Origin::Static);
    assert!(B.is_initialized());
    assert_eq!(
        class_of(B.as_ptr()),
        raw::RT_Object_Class_Mutex | RT_Object_Class_Static
    );
    assert_eq!(unsafe { header(B.as_ptr()) }.flag, raw::RT_IPC_FLAG_PRIO);
    assert_eq!(kernel.live_objects(), 0);
    assert_eq!(one_record().0, Level::Info);

    // Static objects are never handed to delete.
    let mutex = mutex.into_dynamic().unwrap_err();
    assert_eq!(mutex.as_ptr(), B.as_ptr());
}

#[test]
fn mailbox_create_when_heap_exhausted() {
    capture();
    let kernel = SimKernel::new();
    kernel.exhaust();

    let err = provision::mailbox(
        &kernel,
        "mb",
        MailboxParams { capacity: 8, flag: IpcFlag::Fifo },
        Allocation::Dynamic,
    )
    .unwrap_err();

    assert_eq!(err, Error::NoMemory);
    assert_eq!(err.code(), -raw::RT_ENOMEM);
    assert_eq!(kernel.create_calls(), 1);
    assert_eq!(kernel.live_objects(), 0);

    let (level, msg) = one_record();
    assert_eq!(level, Level::Error);
    assert!(msg.contains("mailbox") && msg.contains("mb"), "{}", msg);
}

#[test]
fn queue_pool_too_small_for_one_message() {
    kobj_define! {
        static C: StaticMessageQueue;
        static C_POOL: StaticMessagePool<32>;
    }

    capture();
    let kernel = SimKernel::new();
    // Not even one 64 byte message fits in the pool.
    let err = provision::message_queue(
        &kernel,
        "mq",
        MessageQueueParams { msg_size: 64, max_msgs: 4, flag: IpcFlag::Fifo },
        Allocation::Static(MessageQueueStorage { queue: &C, pool: C_POOL.pool() }),
    )
    .unwrap_err();

    assert_eq!(err, Error::Kernel(-raw::RT_EINVAL));
    assert_eq!(err.code(), -raw::RT_EINVAL);
    assert_eq!(kernel.init_calls(), 1);
    assert_eq!(one_record().0, Level::Error);

    // The failure left the block free for another go.
    assert!(!C.is_initialized());
    let queue = provision::message_queue(
        &kernel,
        "mq",
        MessageQueueParams { msg_size: 4, max_msgs: 0, flag: IpcFlag::Fifo },
        Allocation::Static(MessageQueueStorage { queue: &C, pool: C_POOL.pool() }),
    )
    .unwrap();
    assert_eq!(queue.as_ptr(), C.as_ptr());
    assert!(unsafe { (*C.as_ptr()).max_msgs } >= 1);
}

#[test]
fn dynamic_all_kinds() {
    capture();
    let kernel = SimKernel::new();

    let sem = provision::semaphore(
        &kernel,
        "sem",
        SemaphoreParams { value: 0, flag: IpcFlag::Prio },
        Allocation::Dynamic,
    )
    .unwrap();
    let mutex =
        provision::mutex(&kernel, "mutex", MutexParams { flag: IpcFlag::Prio }, Allocation::Dynamic)
            .unwrap();
    let thread = provision::thread(&kernel, "worker", thread_params(1024), Allocation::Dynamic)
        .unwrap();
    let event =
        provision::event(&kernel, "event", EventParams { flag: IpcFlag::Fifo }, Allocation::Dynamic)
            .unwrap();
    let mailbox = provision::mailbox(
        &kernel,
        "mail",
        MailboxParams { capacity: 16, flag: IpcFlag::Fifo },
        Allocation::Dynamic,
    )
    .unwrap();
    let queue = provision::message_queue(
        &kernel,
        "queue",
        MessageQueueParams { msg_size: 12, max_msgs: 5, flag: IpcFlag::Fifo },
        Allocation::Dynamic,
    )
    .unwrap();

    let records = RECORDS.with(|r| r.take());
    assert_eq!(records.len(), 6);
    assert!(records.iter().all(|(level, _, _)| *level == Level::Info));
    assert_eq!(kernel.live_objects(), 6);

    assert_eq!(class_of(thread.as_ptr()), raw::RT_Object_Class_Thread);
    assert_eq!(unsafe { (*thread.as_ptr()).stack_size }, 1024);
    assert_eq!(unsafe { (*mailbox.as_ptr()).size }, 16);
    assert_eq!(unsafe { (*queue.as_ptr()).max_msgs }, 5);
    assert_eq!(class_of(event.as_ptr()), raw::RT_Object_Class_Event);

    unsafe {
        assert!(kernel.delete(sem.into_dynamic().unwrap()));
        assert!(kernel.delete(mutex.into_dynamic().unwrap()));
        assert!(kernel.delete(thread.into_dynamic().unwrap()));
        assert!(kernel.delete(event.into_dynamic().unwrap()));
        assert!(kernel.delete(mailbox.into_dynamic().unwrap()));
        assert!(kernel.delete(queue.into_dynamic().unwrap()));
    }
    assert_eq!(kernel.live_objects(), 0);
}

#[test]
fn exhaustion_all_kinds() {
    capture();
    let kernel = SimKernel::new();
    kernel.exhaust();

    let results = [
        provision::semaphore(
            &kernel,
            "sem",
            SemaphoreParams { value: 0, flag: IpcFlag::Fifo },
            Allocation::Dynamic,
        )
        .map(|_| ()),
        provision::mutex(&kernel, "mutex", MutexParams { flag: IpcFlag::Fifo }, Allocation::Dynamic)
            .map(|_| ()),
        provision::thread(&kernel, "worker", thread_params(512), Allocation::Dynamic).map(|_| ()),
        provision::event(&kernel, "event", EventParams { flag: IpcFlag::Fifo }, Allocation::Dynamic)
            .map(|_| ()),
        provision::mailbox(
            &kernel,
            "mail",
            MailboxParams { capacity: 4, flag: IpcFlag::Fifo },
            Allocation::Dynamic,
        )
        .map(|_| ()),
        provision::message_queue(
            &kernel,
            "queue",
            MessageQueueParams { msg_size: 8, max_msgs: 4, flag: IpcFlag::Fifo },
            Allocation::Dynamic,
        )
        .map(|_| ()),
    ];

    for result in results {
        assert_eq!(result, Err(Error::NoMemory));
    }
    assert_eq!(kernel.create_calls(), 6);
    assert_eq!(kernel.live_objects(), 0);

    let records = RECORDS.with(|r| r.take());
    assert_eq!(records.len(), 6);
    assert!(records.iter().all(|(level, _, _)| *level == Level::Error));
}

#[test]
fn static_all_kinds() {
    kobj_define! {
        static SEM: StaticSemaphore;
        static EVENT: StaticEvent;
        static THREAD: StaticThread;
        static STACK: StaticThreadStack<2048>;
        static MAILBOX: StaticMailbox;
        static MAIL_POOL: StaticMailboxPool<8>;
        static QUEUE: StaticMessageQueue;
        static QUEUE_POOL: StaticMessagePool<{ MessagePool::bytes_for(16, 4) }>;
    }

    capture();
    let kernel = SimKernel::new();

    let sem = provision::semaphore(
        &kernel,
        "sem",
        SemaphoreParams { value: 2, flag: IpcFlag::Fifo },
        Allocation::Static(&SEM),
    )
    .unwrap();
    assert_eq!(sem.as_ptr(), SEM.as_ptr());

    let event =
        provision::event(&kernel, "event", EventParams { flag: IpcFlag::Prio }, Allocation::Static(&EVENT))
            .unwrap();
    assert_eq!(event.as_ptr(), EVENT.as_ptr());

    let stack = STACK.stack();
    let stack_base = stack.base();
    let thread = provision::thread(
        &kernel,
        "worker",
        thread_params(2048),
        Allocation::Static(ThreadStorage { thread: &THREAD, stack }),
    )
    .unwrap();
    assert_eq!(thread.as_ptr(), THREAD.as_ptr());
    assert_eq!(
        unsafe { (*THREAD.as_ptr()).stack_addr },
        stack_base.as_ptr() as *mut c_void
    );

    let mailbox = provision::mailbox(
        &kernel,
        "mail",
        MailboxParams { capacity: 8, flag: IpcFlag::Fifo },
        Allocation::Static(MailboxStorage { mailbox: &MAILBOX, pool: MAIL_POOL.pool() }),
    )
    .unwrap();
    assert_eq!(mailbox.as_ptr(), MAILBOX.as_ptr());

    let queue = provision::message_queue(
        &kernel,
        "queue",
        MessageQueueParams { msg_size: 16, max_msgs: 4, flag: IpcFlag::Fifo },
        Allocation::Static(MessageQueueStorage { queue: &QUEUE, pool: QUEUE_POOL.pool() }),
    )
    .unwrap();
    assert_eq!(queue.as_ptr(), QUEUE.as_ptr());
    assert_eq!(unsafe { (*QUEUE.as_ptr()).max_msgs }, 4);

    for class in [
        class_of(SEM.as_ptr()),
        class_of(EVENT.as_ptr()),
        class_of(THREAD.as_ptr()),
        class_of(MAILBOX.as_ptr()),
        class_of(QUEUE.as_ptr()),
    ] {
        assert_ne!(class & RT_Object_Class_Static, 0);
    }

    assert_eq!(kernel.live_objects(), 0);
    assert_eq!(kernel.init_calls(), 5);
    assert_eq!(RECORDS.with(|r| r.take()).len(), 5);
}

#[test]
fn kernel_init_failure_is_verbatim() {
    kobj_define! {
        static SEM: StaticSemaphore;
        static MUTEX: StaticMutex;
        static THREAD: StaticThread;
        static STACK: StaticThreadStack<512>;
        static EVENT: StaticEvent;
        static MAILBOX: StaticMailbox;
        static MAIL_POOL: StaticMailboxPool<4>;
        static QUEUE: StaticMessageQueue;
        static QUEUE_POOL: StaticMessagePool<{ MessagePool::bytes_for(8, 4) }>;
    }

    capture();
    let kernel = SimKernel::new();
    let flag = IpcFlag::Fifo;

    // Any code the kernel gives comes back unchanged, even ones it doesn't define.
    let codes = [-raw::RT_ERROR, -raw::RT_EFULL, -raw::RT_EBUSY, -raw::RT_EIO, -42, -1000];
    let mut outcomes: Vec<(Kind, Result<(), Error>, bool)> = Vec::new();

    kernel.fail_next_init(codes[0]);
    let result = provision::semaphore(
        &kernel,
        "sem",
        SemaphoreParams { value: 0, flag },
        Allocation::Static(&SEM),
    );
    outcomes.push((Kind::Semaphore, result.map(|_| ()), SEM.is_initialized()));

    kernel.fail_next_init(codes[1]);
    let result = provision::mutex(&kernel, "lock", MutexParams { flag }, Allocation::Static(&MUTEX));
    outcomes.push((Kind::Mutex, result.map(|_| ()), MUTEX.is_initialized()));

    kernel.fail_next_init(codes[2]);
    let result = provision::thread(
        &kernel,
        "worker",
        thread_params(512),
        Allocation::Static(ThreadStorage { thread: &THREAD, stack: STACK.stack() }),
    );
    outcomes.push((Kind::Thread, result.map(|_| ()), THREAD.is_initialized()));

    kernel.fail_next_init(codes[3]);
    let result = provision::event(&kernel, "ev", EventParams { flag }, Allocation::Static(&EVENT));
    outcomes.push((Kind::Event, result.map(|_| ()), EVENT.is_initialized()));

    kernel.fail_next_init(codes[4]);
    let result = provision::mailbox(
        &kernel,
        "mb",
        MailboxParams { capacity: 4, flag },
        Allocation::Static(MailboxStorage { mailbox: &MAILBOX, pool: MAIL_POOL.pool() }),
    );
    outcomes.push((Kind::Mailbox, result.map(|_| ()), MAILBOX.is_initialized()));

    kernel.fail_next_init(codes[5]);
    let result = provision::message_queue(
        &kernel,
        "mq",
        MessageQueueParams { msg_size: 8, max_msgs: 4, flag },
        Allocation::Static(MessageQueueStorage { queue: &QUEUE, pool: QUEUE_POOL.pool() }),
    );
    outcomes.push((Kind::MessageQueue, result.map(|_| ()), QUEUE.is_initialized()));

    let records = RECORDS.with(|r| r.take());
    assert_eq!(outcomes.len(), Kind::ALL.len());
    assert_eq!(records.len(), Kind::ALL.len());
    for (((kind, result, initialized), code), record) in outcomes.into_iter().zip(codes).zip(records)
    {
        let err = result.unwrap_err();
        assert_eq!(err, Error::Kernel(code), "{}", kind);
        assert_eq!(err.code(), code);
        assert!(!initialized, "{}", kind);
        assert_eq!(record.0, Level::Error);
        assert!(record.2.starts_with(&kind.to_string()), "{}", record.2);
    }
    assert_eq!(kernel.init_calls(), Kind::ALL.len());

    // A failed init hands the stack and pools back as well.
    assert!(!STACK.is_in_use());
    assert!(!MAIL_POOL.is_in_use());
    assert!(!QUEUE_POOL.is_in_use());
    provision::thread(
        &kernel,
        "worker",
        thread_params(512),
        Allocation::Static(ThreadStorage { thread: &THREAD, stack: STACK.stack() }),
    )
    .unwrap();
    assert!(THREAD.is_initialized());
    assert!(STACK.is_in_use());
}

#[test]
fn stack_and_pools_serve_one_object() {
    kobj_define! {
        static FIRST: StaticThread;
        static SECOND: StaticThread;
        static STACK: StaticThreadStack<512>;
        static MB_FIRST: StaticMailbox;
        static MB_SECOND: StaticMailbox;
        static MAIL_POOL: StaticMailboxPool<4>;
        static MQ_FIRST: StaticMessageQueue;
        static MQ_SECOND: StaticMessageQueue;
        static QUEUE_POOL: StaticMessagePool<{ MessagePool::bytes_for(8, 4) }>;
    }

    capture();
    let kernel = SimKernel::new();

    provision::thread(
        &kernel,
        "first",
        thread_params(512),
        Allocation::Static(ThreadStorage { thread: &FIRST, stack: STACK.stack() }),
    )
    .unwrap();
    assert_eq!(one_record().0, Level::Info);

    let err = provision::thread(
        &kernel,
        "second",
        thread_params(512),
        Allocation::Static(ThreadStorage { thread: &SECOND, stack: STACK.stack() }),
    )
    .unwrap_err();
    assert_eq!(err, Error::Invalid(Invalid::BufferInUse));
    assert_eq!(one_record().0, Level::Error);
    // The second control block is released for use with another stack.
    assert!(!SECOND.is_initialized());

    let params = MailboxParams { capacity: 4, flag: IpcFlag::Fifo };
    provision::mailbox(
        &kernel,
        "mb1",
        params,
        Allocation::Static(MailboxStorage { mailbox: &MB_FIRST, pool: MAIL_POOL.pool() }),
    )
    .unwrap();
    let err = provision::mailbox(
        &kernel,
        "mb2",
        params,
        Allocation::Static(MailboxStorage { mailbox: &MB_SECOND, pool: MAIL_POOL.pool() }),
    )
    .unwrap_err();
    assert_eq!(err, Error::Invalid(Invalid::BufferInUse));
    assert!(!MB_SECOND.is_initialized());

    let params = MessageQueueParams { msg_size: 8, max_msgs: 4, flag: IpcFlag::Fifo };
    provision::message_queue(
        &kernel,
        "mq1",
        params,
        Allocation::Static(MessageQueueStorage { queue: &MQ_FIRST, pool: QUEUE_POOL.pool() }),
    )
    .unwrap();
    let err = provision::message_queue(
        &kernel,
        "mq2",
        params,
        Allocation::Static(MessageQueueStorage { queue: &MQ_SECOND, pool: QUEUE_POOL.pool() }),
    )
    .unwrap_err();
    assert_eq!(err, Error::Invalid(Invalid::BufferInUse));
    assert!(!MQ_SECOND.is_initialized());

    // Only the first of each pair reached the kernel.
    assert_eq!(kernel.init_calls(), 3);
    assert_eq!(RECORDS.with(|r| r.take()).len(), 4);
}

#[test]
fn aligned_message_size_must_fit() {
    capture();
    let kernel = SimKernel::new();
    let flag = IpcFlag::Fifo;

    // Rounded up, a 65535 byte message no longer fits the kernel's 16 bit size.
    let err = provision::message_queue(
        &kernel,
        "mq",
        MessageQueueParams { msg_size: u16::MAX as usize, max_msgs: 1, flag },
        Allocation::Dynamic,
    )
    .unwrap_err();
    assert_eq!(err, Error::Invalid(Invalid::MessageTooLarge));
    assert_eq!(one_record().0, Level::Error);
    assert_eq!(kernel.create_calls(), 0);

    let largest = u16::MAX as usize + 1 - rtthread::align::RT_ALIGN;
    let mq = provision::message_queue(
        &kernel,
        "mq",
        MessageQueueParams { msg_size: largest, max_msgs: 1, flag },
        Allocation::Dynamic,
    )
    .unwrap();
    assert_eq!(unsafe { (*mq.as_ptr()).msg_size } as usize, largest);
    assert_eq!(one_record().0, Level::Info);
}

#[test]
fn reprovision_is_rejected() {
    kobj_define! {
        static EVENT: StaticEvent;
    }

    capture();
    let kernel = SimKernel::new();
    let params = EventParams { flag: IpcFlag::Fifo };

    provision::event(&kernel, "first", params, Allocation::Static(&EVENT)).unwrap();
    assert_eq!(one_record().0, Level::Info);

    let err = provision::event(&kernel, "second", params, Allocation::Static(&EVENT)).unwrap_err();
    assert_eq!(err, Error::Invalid(Invalid::AlreadyInitialized));
    assert_eq!(one_record().0, Level::Error);

    // The kernel's object was left alone.
    assert_eq!(kernel.init_calls(), 1);
    assert_eq!(name_of(EVENT.as_ptr()), "first");
}

#[test]
fn preconditions_make_no_kernel_calls() {
    kobj_define! {
        static THREAD: StaticThread;
        static STACK: StaticThreadStack<256>;
        static MAILBOX: StaticMailbox;
        static MAIL_POOL: StaticMailboxPool<2>;
        static QUEUE: StaticMessageQueue;
        static EMPTY: StaticMessagePool<0>;
    }

    capture();
    let kernel = SimKernel::new();
    let sem = SemaphoreParams { value: 1, flag: IpcFlag::Fifo };

    let cases = [
        provision::semaphore(&kernel, "", sem, Allocation::Dynamic).map(|_| ()),
        provision::semaphore(&kernel, "a\0b", sem, Allocation::Dynamic).map(|_| ()),
        provision::semaphore(
            &kernel,
            "big",
            SemaphoreParams { value: 1 << 16, flag: IpcFlag::Fifo },
            Allocation::Dynamic,
        )
        .map(|_| ()),
        provision::thread(&kernel, "t", thread_params(0), Allocation::Dynamic).map(|_| ()),
        provision::thread(
            &kernel,
            "t",
            thread_params(1024),
            Allocation::Static(ThreadStorage { thread: &THREAD, stack: STACK.stack() }),
        )
        .map(|_| ()),
        provision::mailbox(
            &kernel,
            "mb",
            MailboxParams { capacity: 0, flag: IpcFlag::Fifo },
            Allocation::Dynamic,
        )
        .map(|_| ()),
        provision::mailbox(
            &kernel,
            "mb",
            MailboxParams { capacity: 4, flag: IpcFlag::Fifo },
            Allocation::Static(MailboxStorage { mailbox: &MAILBOX, pool: MAIL_POOL.pool() }),
        )
        .map(|_| ()),
        provision::message_queue(
            &kernel,
            "mq",
            MessageQueueParams { msg_size: 0, max_msgs: 4, flag: IpcFlag::Fifo },
            Allocation::Dynamic,
        )
        .map(|_| ()),
        provision::message_queue(
            &kernel,
            "mq",
            MessageQueueParams { msg_size: 4, max_msgs: 4, flag: IpcFlag::Fifo },
            Allocation::Static(MessageQueueStorage { queue: &QUEUE, pool: EMPTY.pool() }),
        )
        .map(|_| ()),
    ];

    let expected = [
        Invalid::EmptyName,
        Invalid::NameHasNul,
        Invalid::CountTooLarge,
        Invalid::ZeroStackSize,
        Invalid::StackTooSmall,
        Invalid::ZeroCapacity,
        Invalid::PoolTooSmall,
        Invalid::ZeroMessageSize,
        Invalid::PoolTooSmall,
    ];

    for (result, invalid) in cases.into_iter().zip(expected) {
        let err = result.unwrap_err();
        assert_eq!(err, Error::Invalid(invalid));
        assert_eq!(err.code(), -raw::RT_EINVAL);
    }

    assert_eq!(kernel.create_calls(), 0);
    assert_eq!(kernel.init_calls(), 0);
    assert_eq!(RECORDS.with(|r| r.take()).len(), expected.len());

    // Rejected requests don't claim the storage.
    assert!(!THREAD.is_initialized());
    assert!(!MAILBOX.is_initialized());
    assert!(!QUEUE.is_initialized());
}

#[test]
fn long_names_are_truncated() {
    capture();
    let kernel = SimKernel::new();
    let long = "a_rather_long_object_name";
    let event =
        provision::event(&kernel, long, EventParams { flag: IpcFlag::Fifo }, Allocation::Dynamic)
            .unwrap();
    assert_eq!(name_of(event.as_ptr()), &long[..raw::RT_NAME_MAX - 1]);

    // The record names what the caller asked for.
    let (_, msg) = one_record();
    assert!(msg.contains(long), "{}", msg);
}

#[test]
fn concurrent_static_provisioning() {
    const UNINIT: StaticSemaphore = StaticSemaphore::new();
    static SEMS: [StaticSemaphore; 8] = [UNINIT; 8];

    let kernel = SimKernel::new();
    std::thread::scope(|s| {
        for (i, sem) in SEMS.iter().enumerate() {
            let kernel = &kernel;
            s.spawn(move || {
                capture();
                let name = format!("sem{}", i);
                let handle = provision::semaphore(
                    kernel,
                    &name,
                    SemaphoreParams { value: i as u32, flag: IpcFlag::Fifo },
                    Allocation::Static(sem),
                )
                .unwrap();
                assert_eq!(handle.as_ptr(), sem.as_ptr());
                assert_eq!(one_record().0, Level::Info);
            });
        }
    });

    for (i, sem) in SEMS.iter().enumerate() {
        assert!(sem.is_initialized());
        assert_eq!(name_of(sem.as_ptr()), format!("sem{}", i));
    }
    assert_eq!(kernel.init_calls(), 8);
}

#[test]
fn racing_on_one_block() {
    kobj_define! {
        static SHARED: StaticMutex;
    }

    let kernel = SimKernel::new();
    let wins: usize = std::thread::scope(|s| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let kernel = &kernel;
                s.spawn(move || {
                    provision::mutex(
                        kernel,
                        "shared",
                        MutexParams { flag: IpcFlag::Fifo },
                        Allocation::Static(&SHARED),
                    )
                    .is_ok() as usize
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).sum()
    });

    assert_eq!(wins, 1);
    assert_eq!(kernel.init_calls(), 1);
    assert!(SHARED.is_initialized());
}
