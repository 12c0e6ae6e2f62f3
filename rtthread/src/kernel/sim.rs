// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! A simulated kernel, for running provisioning code on the host.
//!
//! [`SimKernel`] does what the RT-Thread object calls do to a control block, without a scheduler
//! behind it.  Creates allocate a zeroed control block (and the stack or message pool the kernel
//! would allocate alongside it), and fill it in.  Inits fill in the caller's block in place, and
//! mark the object static, as the kernel does.
//!
//! It also keeps enough books for tests to check what happened: the number of objects still
//! allocated, the number of calls made, and ways of making the next call fail.

extern crate alloc;

use alloc::alloc::{alloc_zeroed, dealloc, Layout};
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::ffi::{c_char, c_void};
use core::mem;
use core::ptr::{self, addr_of_mut, NonNull};

use critical_section::Mutex;

use crate::kconfig;
use crate::kernel::{Kernel, ObjectName};
use crate::object::{ControlBlock, MailboxPool, MessagePool, ThreadStack};
use crate::provision::{
    EventParams, MailboxParams, MessageQueueParams, MutexParams, SemaphoreParams, ThreadParams,
};
use crate::raw::{
    rt_err_t, rt_event, rt_ipc_object, rt_list_t, rt_mailbox, rt_messagequeue, rt_mq_message,
    rt_mutex, rt_object, rt_semaphore, rt_thread, rt_ubase_t, RT_EINVAL, RT_EOK,
    RT_Object_Class_Event, RT_Object_Class_MailBox, RT_Object_Class_MessageQueue,
    RT_Object_Class_Mutex, RT_Object_Class_Semaphore, RT_Object_Class_Static,
    RT_Object_Class_Thread,
};

/// `RT_THREAD_INIT`, the state of a thread that has not been started.
pub const RT_THREAD_INIT: u8 = 0x00;

/// A kernel allocation: a control block, and the buffer that came with it.
struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
    // Stack or message pool.  Kept here only so it lives as long as the object.
    _buffer: Vec<rt_ubase_t>,
}

// Blocks are only reached through the state lock.
unsafe impl Send for Block {}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: Allocated in `SimKernel::allocate` with this layout.
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

#[derive(Default)]
struct State {
    blocks: Vec<Block>,
    heap_limit: Option<usize>,
    fail_next_init: Option<rt_err_t>,
    create_calls: usize,
    init_calls: usize,
}

/// The simulated kernel.
///
/// Can be shared between threads.  Everything still allocated is freed when the kernel is
/// dropped, which leaves any handles to dynamic objects dangling.
pub struct SimKernel {
    state: Mutex<RefCell<State>>,
}

impl Default for SimKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl SimKernel {
    /// A kernel with an unlimited heap.
    pub fn new() -> SimKernel {
        SimKernel {
            state: Mutex::new(RefCell::new(State::default())),
        }
    }

    /// Limit the number of objects that can be allocated at once.  `None` removes the limit.
    pub fn set_heap_limit(&self, limit: Option<usize>) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).heap_limit = limit);
    }

    /// Make every following create fail, as if the heap were used up.
    pub fn exhaust(&self) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.heap_limit = Some(state.blocks.len());
        });
    }

    /// Make the next init call return `code` without touching its control block.
    pub fn fail_next_init(&self, code: rt_err_t) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).fail_next_init = Some(code));
    }

    /// Number of objects allocated and not yet deleted.
    pub fn live_objects(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).blocks.len())
    }

    /// Number of create calls made, successful or not.
    pub fn create_calls(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).create_calls)
    }

    /// Number of init calls made, successful or not.
    pub fn init_calls(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).init_calls)
    }

    /// Delete a dynamic object, the `rt_xxx_delete` calls.
    ///
    /// Returns false, and does nothing, if `obj` isn't an object this kernel allocated.  Static
    /// objects are never deleted.
    ///
    /// # Safety
    ///
    /// Nothing may use the object afterwards.
    pub unsafe fn delete<T>(&self, obj: NonNull<T>) -> bool {
        let addr = obj.as_ptr() as *mut u8;
        let block = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let pos = state.blocks.iter().position(|b| b.ptr.as_ptr() == addr)?;
            Some(state.blocks.swap_remove(pos))
        });
        // Freed outside of the critical section.
        block.is_some()
    }

    /// Allocate a zeroed control block, with a zeroed buffer of `words` words alongside it.
    fn allocate<T: ControlBlock>(&self, words: usize) -> Option<(NonNull<T>, *mut rt_ubase_t)> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.create_calls += 1;
            if let Some(limit) = state.heap_limit {
                if state.blocks.len() >= limit {
                    return None;
                }
            }

            let layout = Layout::new::<T>();
            // SAFETY: No control block is zero sized.
            let ptr = NonNull::new(unsafe { alloc_zeroed(layout) })?;
            let mut buffer = vec![0; words];
            let base = buffer.as_mut_ptr();
            state.blocks.push(Block {
                ptr,
                layout,
                _buffer: buffer,
            });
            Some((ptr.cast(), base))
        })
    }

    /// Count a create call that is refused before anything is allocated.
    fn refuse_create<T>(&self) -> Option<NonNull<T>> {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).create_calls += 1);
        None
    }

    /// Count an init call, and take any failure queued up for it.
    fn begin_init(&self) -> Option<rt_err_t> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.init_calls += 1;
            state.fail_next_init.take()
        })
    }
}

/// The object header that every control block starts with.
///
/// # Safety
///
/// `obj` must point to a live control block.
pub unsafe fn header<'a, T: ControlBlock>(obj: *const T) -> &'a rt_object {
    &*(obj as *const rt_object)
}

/// The name stored in an object header.
pub fn header_name(header: &rt_object) -> &str {
    // SAFETY: c_char and u8 have the same layout.
    let bytes: &[u8] =
        unsafe { core::slice::from_raw_parts(header.name.as_ptr() as *const u8, header.name.len()) };
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    core::str::from_utf8(&bytes[..len]).unwrap_or("")
}

unsafe fn list_init(node: *mut rt_list_t) {
    (*node).next = node;
    (*node).prev = node;
}

unsafe fn object_init(obj: *mut rt_object, name: &ObjectName, class: u8, flag: u8) {
    let dst = addr_of_mut!((*obj).name) as *mut c_char;
    for (i, &b) in name.as_bytes_with_nul().iter().enumerate() {
        *dst.add(i) = b as c_char;
    }
    (*obj).type_ = class;
    (*obj).flag = flag;
    list_init(addr_of_mut!((*obj).list));
}

unsafe fn ipc_init(ipc: *mut rt_ipc_object, name: &ObjectName, class: u8, flag: u8) {
    object_init(addr_of_mut!((*ipc).parent), name, class, flag);
    list_init(addr_of_mut!((*ipc).suspend_thread));
}

fn class(base: u8, is_static: bool) -> u8 {
    if is_static {
        base | RT_Object_Class_Static
    } else {
        base
    }
}

fn words_for(bytes: usize) -> usize {
    bytes.div_ceil(mem::size_of::<rt_ubase_t>())
}

unsafe fn sem_fill(sem: *mut rt_semaphore, name: &ObjectName, params: &SemaphoreParams, is_static: bool) {
    let class = class(RT_Object_Class_Semaphore, is_static);
    ipc_init(addr_of_mut!((*sem).parent), name, class, params.flag.raw());
    (*sem).value = params.value as u16;
    (*sem).reserved = 0;
}

unsafe fn mutex_fill(mutex: *mut rt_mutex, name: &ObjectName, params: &MutexParams, is_static: bool) {
    let class = class(RT_Object_Class_Mutex, is_static);
    ipc_init(addr_of_mut!((*mutex).parent), name, class, params.flag.raw());
    (*mutex).value = 1;
    (*mutex).original_priority = 0xff;
    (*mutex).hold = 0;
    (*mutex).owner = ptr::null_mut();
}

unsafe fn event_fill(event: *mut rt_event, name: &ObjectName, params: &EventParams, is_static: bool) {
    let class = class(RT_Object_Class_Event, is_static);
    ipc_init(addr_of_mut!((*event).parent), name, class, params.flag.raw());
    (*event).set = 0;
}

unsafe fn thread_fill(
    thread: *mut rt_thread,
    name: &ObjectName,
    params: &ThreadParams,
    stack: *mut u8,
    is_static: bool,
) {
    let class = class(RT_Object_Class_Thread, is_static);
    object_init(addr_of_mut!((*thread).parent), name, class, 0);
    list_init(addr_of_mut!((*thread).tlist));
    (*thread).entry = params.entry as *mut c_void;
    (*thread).parameter = params.parameter;
    (*thread).stack_addr = stack as *mut c_void;
    (*thread).stack_size = params.stack_size;
    // Only recorded, never dereferenced.  A stack smaller than a word puts it below the base.
    (*thread).sp = stack
        .wrapping_add(params.stack_size as usize)
        .wrapping_sub(mem::size_of::<rt_ubase_t>()) as *mut c_void;
    (*thread).error = RT_EOK;
    (*thread).stat = RT_THREAD_INIT;
    (*thread).current_priority = params.priority;
    (*thread).init_priority = params.priority;
    (*thread).init_tick = params.time_slice.ticks() as rt_ubase_t;
    (*thread).remaining_tick = params.time_slice.ticks() as rt_ubase_t;
}

unsafe fn mb_fill(
    mb: *mut rt_mailbox,
    name: &ObjectName,
    params: &MailboxParams,
    pool: *mut rt_ubase_t,
    is_static: bool,
) {
    let class = class(RT_Object_Class_MailBox, is_static);
    ipc_init(addr_of_mut!((*mb).parent), name, class, params.flag.raw());
    (*mb).msg_pool = pool;
    (*mb).size = params.capacity as u16;
    (*mb).entry = 0;
    (*mb).in_offset = 0;
    (*mb).out_offset = 0;
    list_init(addr_of_mut!((*mb).suspend_sender_thread));
}

/// Lay out a queue over `pool_size` bytes at `pool`.  Returns false if not even one message fits.
unsafe fn mq_fill(
    mq: *mut rt_messagequeue,
    name: &ObjectName,
    params: &MessageQueueParams,
    pool: *mut u8,
    pool_size: usize,
    is_static: bool,
) -> bool {
    let slot = MessagePool::slot_size(params.msg_size);
    let max_msgs = (pool_size / slot).min(u16::MAX as usize);
    if max_msgs == 0 {
        return false;
    }

    let class = class(RT_Object_Class_MessageQueue, is_static);
    ipc_init(addr_of_mut!((*mq).parent), name, class, params.flag.raw());
    (*mq).msg_pool = pool as *mut c_void;
    (*mq).msg_size = crate::align::align_up(params.msg_size) as u16;
    (*mq).max_msgs = max_msgs as u16;
    (*mq).entry = 0;
    (*mq).msg_queue_head = ptr::null_mut();
    (*mq).msg_queue_tail = ptr::null_mut();

    let mut free: *mut rt_mq_message = ptr::null_mut();
    for i in 0..max_msgs {
        let head = pool.add(i * slot) as *mut rt_mq_message;
        (*head).next = free;
        free = head;
    }
    (*mq).msg_queue_free = free as *mut c_void;
    list_init(addr_of_mut!((*mq).suspend_sender_thread));
    true
}

fn priority_ok(priority: u8) -> bool {
    (priority as usize) < kconfig::RT_THREAD_PRIORITY_MAX
}

unsafe impl Kernel for SimKernel {
    fn sem_create(&self, name: &ObjectName, params: &SemaphoreParams) -> Option<NonNull<rt_semaphore>> {
        let (sem, _) = self.allocate::<rt_semaphore>(0)?;
        // SAFETY: Freshly allocated, and not yet shared.
        unsafe { sem_fill(sem.as_ptr(), name, params, false) };
        Some(sem)
    }

    unsafe fn sem_init(
        &self,
        sem: NonNull<rt_semaphore>,
        name: &ObjectName,
        params: &SemaphoreParams,
    ) -> rt_err_t {
        if let Some(code) = self.begin_init() {
            return code;
        }
        sem_fill(sem.as_ptr(), name, params, true);
        RT_EOK
    }

    fn mutex_create(&self, name: &ObjectName, params: &MutexParams) -> Option<NonNull<rt_mutex>> {
        let (mutex, _) = self.allocate::<rt_mutex>(0)?;
        // SAFETY: Freshly allocated, and not yet shared.
        unsafe { mutex_fill(mutex.as_ptr(), name, params, false) };
        Some(mutex)
    }

    unsafe fn mutex_init(
        &self,
        mutex: NonNull<rt_mutex>,
        name: &ObjectName,
        params: &MutexParams,
    ) -> rt_err_t {
        if let Some(code) = self.begin_init() {
            return code;
        }
        mutex_fill(mutex.as_ptr(), name, params, true);
        RT_EOK
    }

    fn thread_create(&self, name: &ObjectName, params: &ThreadParams) -> Option<NonNull<rt_thread>> {
        if !priority_ok(params.priority) || params.stack_size == 0 {
            return self.refuse_create();
        }
        let (thread, stack) = self.allocate::<rt_thread>(words_for(params.stack_size as usize))?;
        // SAFETY: Freshly allocated, and the stack is at least `stack_size` bytes.
        unsafe { thread_fill(thread.as_ptr(), name, params, stack as *mut u8, false) };
        Some(thread)
    }

    unsafe fn thread_init(
        &self,
        thread: NonNull<rt_thread>,
        name: &ObjectName,
        params: &ThreadParams,
        stack: &ThreadStack,
    ) -> rt_err_t {
        if let Some(code) = self.begin_init() {
            return code;
        }
        if !priority_ok(params.priority)
            || params.stack_size == 0
            || params.stack_size as usize > stack.size()
        {
            return -RT_EINVAL;
        }
        thread_fill(thread.as_ptr(), name, params, stack.base().as_ptr(), true);
        RT_EOK
    }

    fn event_create(&self, name: &ObjectName, params: &EventParams) -> Option<NonNull<rt_event>> {
        let (event, _) = self.allocate::<rt_event>(0)?;
        // SAFETY: Freshly allocated, and not yet shared.
        unsafe { event_fill(event.as_ptr(), name, params, false) };
        Some(event)
    }

    unsafe fn event_init(
        &self,
        event: NonNull<rt_event>,
        name: &ObjectName,
        params: &EventParams,
    ) -> rt_err_t {
        if let Some(code) = self.begin_init() {
            return code;
        }
        event_fill(event.as_ptr(), name, params, true);
        RT_EOK
    }

    fn mb_create(&self, name: &ObjectName, params: &MailboxParams) -> Option<NonNull<rt_mailbox>> {
        if params.capacity == 0 || params.capacity > u16::MAX as usize {
            return self.refuse_create();
        }
        let (mb, pool) = self.allocate::<rt_mailbox>(params.capacity)?;
        // SAFETY: Freshly allocated, with `capacity` words of pool.
        unsafe { mb_fill(mb.as_ptr(), name, params, pool, false) };
        Some(mb)
    }

    unsafe fn mb_init(
        &self,
        mb: NonNull<rt_mailbox>,
        name: &ObjectName,
        params: &MailboxParams,
        pool: &MailboxPool,
    ) -> rt_err_t {
        if let Some(code) = self.begin_init() {
            return code;
        }
        if params.capacity == 0 || params.capacity > pool.len() {
            return -RT_EINVAL;
        }
        mb_fill(mb.as_ptr(), name, params, pool.base().as_ptr(), true);
        RT_EOK
    }

    fn mq_create(
        &self,
        name: &ObjectName,
        params: &MessageQueueParams,
    ) -> Option<NonNull<rt_messagequeue>> {
        if params.msg_size == 0 || params.max_msgs == 0 || params.max_msgs > u16::MAX as usize {
            return self.refuse_create();
        }
        let bytes = MessagePool::bytes_for(params.msg_size, params.max_msgs);
        let (mq, pool) = self.allocate::<rt_messagequeue>(words_for(bytes))?;
        // SAFETY: Freshly allocated, with a pool of `bytes`.  That holds `max_msgs` messages, so
        // the layout can't fail.
        let filled = unsafe { mq_fill(mq.as_ptr(), name, params, pool as *mut u8, bytes, false) };
        debug_assert!(filled);
        Some(mq)
    }

    unsafe fn mq_init(
        &self,
        mq: NonNull<rt_messagequeue>,
        name: &ObjectName,
        params: &MessageQueueParams,
        pool: &MessagePool,
    ) -> rt_err_t {
        if let Some(code) = self.begin_init() {
            return code;
        }
        if params.msg_size == 0 {
            return -RT_EINVAL;
        }
        if mq_fill(mq.as_ptr(), name, params, pool.base().as_ptr(), pool.len(), true) {
            RT_EOK
        } else {
            -RT_EINVAL
        }
    }
}
