// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! RT-Thread kernel bindings for Rust
//!
//! Raw types, constants and `extern "C"` declarations for the parts of the RT-Thread kernel API
//! used to create and initialize kernel objects.  Everything here mirrors `rtdef.h` and
//! `rtthread.h` directly, and all of the functions are unsafe.
//!
//! The control block layouts follow RT-Thread 4.1.1 with its default kernel options.  The IPC
//! objects are spelled out in full.  For `rt_thread` only the leading fields are, and the rest is
//! reserved space, checked at build time to cover the 4.1.1 thread.  The sizes depend on
//! `RT_NAME_MAX`, which comes from the same `rtconfig.h` the kernel was built with (see
//! [`kconfig`]).

#![cfg_attr(not(test), no_std)]
// Allow rust naming convention violations.
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
// `rtconfig.h` defines become cfgs at build time.
#![allow(unexpected_cfgs)]

use core::ffi::{c_char, c_long, c_ulong, c_void};
use core::mem::size_of;

pub mod kconfig {
    //! RT-Thread `rtconfig.h` values.
    //!
    //! This module contains an auto-generated set of constants corresponding to the valued
    //! defines in `rtconfig.h` during the build.

    include!(concat!(env!("OUT_DIR"), "/kconfig.rs"));
}

pub type rt_int8_t = i8;
pub type rt_int16_t = i16;
pub type rt_int32_t = i32;
pub type rt_uint8_t = u8;
pub type rt_uint16_t = u16;
pub type rt_uint32_t = u32;
pub type rt_base_t = c_long;
pub type rt_ubase_t = c_ulong;
pub type rt_err_t = rt_base_t;
pub type rt_size_t = rt_ubase_t;
pub type rt_tick_t = rt_uint32_t;

// Error codes.  Kernel calls return these negated.
pub const RT_EOK: rt_err_t = 0;
pub const RT_ERROR: rt_err_t = 1;
pub const RT_ETIMEOUT: rt_err_t = 2;
pub const RT_EFULL: rt_err_t = 3;
pub const RT_EEMPTY: rt_err_t = 4;
pub const RT_ENOMEM: rt_err_t = 5;
pub const RT_ENOSYS: rt_err_t = 6;
pub const RT_EBUSY: rt_err_t = 7;
pub const RT_EIO: rt_err_t = 8;
pub const RT_EINTR: rt_err_t = 9;
pub const RT_EINVAL: rt_err_t = 10;

// Wait queue ordering of IPC objects.
pub const RT_IPC_FLAG_FIFO: rt_uint8_t = 0x00;
pub const RT_IPC_FLAG_PRIO: rt_uint8_t = 0x01;

// `enum rt_object_class_type`.
pub const RT_Object_Class_Null: rt_uint8_t = 0x00;
pub const RT_Object_Class_Thread: rt_uint8_t = 0x01;
pub const RT_Object_Class_Semaphore: rt_uint8_t = 0x02;
pub const RT_Object_Class_Mutex: rt_uint8_t = 0x03;
pub const RT_Object_Class_Event: rt_uint8_t = 0x04;
pub const RT_Object_Class_MailBox: rt_uint8_t = 0x05;
pub const RT_Object_Class_MessageQueue: rt_uint8_t = 0x06;
pub const RT_Object_Class_Static: rt_uint8_t = 0x80;

/// Length of object names, including the terminating NUL.
pub const RT_NAME_MAX: usize = kconfig::RT_NAME_MAX;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rt_list_node {
    pub next: *mut rt_list_node,
    pub prev: *mut rt_list_node,
}
pub type rt_list_t = rt_list_node;

/// Base of every kernel object.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rt_object {
    pub name: [c_char; RT_NAME_MAX],
    pub type_: rt_uint8_t,
    pub flag: rt_uint8_t,
    pub list: rt_list_t,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rt_ipc_object {
    pub parent: rt_object,
    pub suspend_thread: rt_list_t,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rt_semaphore {
    pub parent: rt_ipc_object,
    pub value: rt_uint16_t,
    pub reserved: rt_uint16_t,
}
pub type rt_sem_t = *mut rt_semaphore;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rt_mutex {
    pub parent: rt_ipc_object,
    pub value: rt_uint16_t,
    pub original_priority: rt_uint8_t,
    pub hold: rt_uint8_t,
    pub owner: *mut rt_thread,
}
pub type rt_mutex_t = *mut rt_mutex;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rt_event {
    pub parent: rt_ipc_object,
    pub set: rt_uint32_t,
}
pub type rt_event_t = *mut rt_event;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rt_mailbox {
    pub parent: rt_ipc_object,
    pub msg_pool: *mut rt_ubase_t,
    pub size: rt_uint16_t,
    pub entry: rt_uint16_t,
    pub in_offset: rt_uint16_t,
    pub out_offset: rt_uint16_t,
    pub suspend_sender_thread: rt_list_t,
}
pub type rt_mailbox_t = *mut rt_mailbox;

/// Header the kernel places in front of every message in a queue's pool.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rt_mq_message {
    pub next: *mut rt_mq_message,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rt_messagequeue {
    pub parent: rt_ipc_object,
    pub msg_pool: *mut c_void,
    pub msg_size: rt_uint16_t,
    pub max_msgs: rt_uint16_t,
    pub entry: rt_uint16_t,
    pub msg_queue_head: *mut c_void,
    pub msg_queue_tail: *mut c_void,
    pub msg_queue_free: *mut c_void,
    pub suspend_sender_thread: rt_list_t,
}
pub type rt_mq_t = *mut rt_messagequeue;

/// Thread entry point.
pub type rt_thread_entry_t = Option<unsafe extern "C" fn(parameter: *mut c_void)>;

/// Words reserved for the timer and cleanup state at the tail of `rt_thread`.
///
/// Checked at build time against the 4.1.1 tail.
pub const RT_THREAD_RESERVED_WORDS: usize = 24;

/// Skip list levels of a timer, `RT_TIMER_SKIP_LIST_LEVEL`.
pub const RT_TIMER_SKIP_LIST_LEVEL: usize = 1;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rt_timer {
    pub parent: rt_object,
    pub row: [rt_list_t; RT_TIMER_SKIP_LIST_LEVEL],
    pub timeout_func: Option<unsafe extern "C" fn(parameter: *mut c_void)>,
    pub parameter: *mut c_void,
    pub init_tick: rt_tick_t,
    pub timeout_tick: rt_tick_t,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rt_thread {
    /// The object header.  In `rtdef.h` these fields are spelled out inline, with the same
    /// layout.
    pub parent: rt_object,
    pub tlist: rt_list_t,
    pub sp: *mut c_void,
    pub entry: *mut c_void,
    pub parameter: *mut c_void,
    pub stack_addr: *mut c_void,
    pub stack_size: rt_uint32_t,
    pub error: rt_err_t,
    pub stat: rt_uint8_t,
    pub current_priority: rt_uint8_t,
    pub init_priority: rt_uint8_t,
    #[cfg(RT_THREAD_PRIORITY_256)]
    pub number: rt_uint8_t,
    #[cfg(RT_THREAD_PRIORITY_256)]
    pub high_mask: rt_uint8_t,
    pub number_mask: rt_uint32_t,
    #[cfg(RT_USING_EVENT)]
    pub event_set: rt_uint32_t,
    #[cfg(RT_USING_EVENT)]
    pub event_info: rt_uint8_t,
    pub init_tick: rt_ubase_t,
    pub remaining_tick: rt_ubase_t,
    pub reserved: [rt_ubase_t; RT_THREAD_RESERVED_WORDS],
}
pub type rt_thread_t = *mut rt_thread;

/// What follows `remaining_tick` in the 4.1.1 `struct rt_thread`, without SMP, signals, LWP or
/// CPU usage accounting.
#[repr(C)]
#[allow(dead_code)]
struct rt_thread_tail {
    thread_timer: rt_timer,
    cleanup: Option<unsafe extern "C" fn(thread: *mut rt_thread)>,
    user_data: rt_ubase_t,
}

// The kernel writes all of its thread, so the reserved words must cover the tail.
const _: () =
    assert!(RT_THREAD_RESERVED_WORDS * size_of::<rt_ubase_t>() >= size_of::<rt_thread_tail>());

extern "C" {
    pub fn rt_sem_create(name: *const c_char, value: rt_uint32_t, flag: rt_uint8_t) -> rt_sem_t;
    pub fn rt_sem_init(
        sem: rt_sem_t,
        name: *const c_char,
        value: rt_uint32_t,
        flag: rt_uint8_t,
    ) -> rt_err_t;

    pub fn rt_mutex_create(name: *const c_char, flag: rt_uint8_t) -> rt_mutex_t;
    pub fn rt_mutex_init(mutex: rt_mutex_t, name: *const c_char, flag: rt_uint8_t) -> rt_err_t;

    pub fn rt_thread_create(
        name: *const c_char,
        entry: rt_thread_entry_t,
        parameter: *mut c_void,
        stack_size: rt_uint32_t,
        priority: rt_uint8_t,
        tick: rt_uint32_t,
    ) -> rt_thread_t;
    pub fn rt_thread_init(
        thread: rt_thread_t,
        name: *const c_char,
        entry: rt_thread_entry_t,
        parameter: *mut c_void,
        stack_start: *mut c_void,
        stack_size: rt_uint32_t,
        priority: rt_uint8_t,
        tick: rt_uint32_t,
    ) -> rt_err_t;

    pub fn rt_event_create(name: *const c_char, flag: rt_uint8_t) -> rt_event_t;
    pub fn rt_event_init(event: rt_event_t, name: *const c_char, flag: rt_uint8_t) -> rt_err_t;

    pub fn rt_mb_create(name: *const c_char, size: rt_size_t, flag: rt_uint8_t) -> rt_mailbox_t;
    pub fn rt_mb_init(
        mb: rt_mailbox_t,
        name: *const c_char,
        msgpool: *mut c_void,
        size: rt_size_t,
        flag: rt_uint8_t,
    ) -> rt_err_t;

    pub fn rt_mq_create(
        name: *const c_char,
        msg_size: rt_size_t,
        max_msgs: rt_size_t,
        flag: rt_uint8_t,
    ) -> rt_mq_t;
    pub fn rt_mq_init(
        mq: rt_mq_t,
        name: *const c_char,
        msgpool: *mut c_void,
        msg_size: rt_size_t,
        pool_size: rt_size_t,
        flag: rt_uint8_t,
    ) -> rt_err_t;

    pub fn rt_kprintf(fmt: *const c_char, ...);

    pub fn rt_hw_interrupt_disable() -> rt_base_t;
    pub fn rt_hw_interrupt_enable(level: rt_base_t);
}
