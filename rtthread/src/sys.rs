// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! RT-Thread 'sys' module.
//!
//! The `rtthread-sys` crate holds the direct C bindings to the kernel, all of them unsafe.  This
//! module has the few thin wrappers over them that other crates need.

#[cfg(feature = "rtthread")]
pub mod critical {
    //! RT-Thread implementation of critical sections.
    //!
    //! A critical section masks interrupts, with `rt_hw_interrupt_disable`, and restores the
    //! previous level when done.  That also keeps the scheduler from switching threads.  Nesting
    //! works, as each section restores the level it found.
    //!
    //! This provides the implementation behind the `critical-section` crate, for the benefit of
    //! crates that use that interface.

    use critical_section::RawRestoreState;
    use rtthread_sys::{rt_base_t, rt_hw_interrupt_disable, rt_hw_interrupt_enable};

    struct RtThreadCriticalSection;
    critical_section::set_impl!(RtThreadCriticalSection);

    unsafe impl critical_section::Impl for RtThreadCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            rt_hw_interrupt_disable() as RawRestoreState
        }

        unsafe fn release(token: RawRestoreState) {
            rt_hw_interrupt_enable(token as rt_base_t);
        }
    }
}
