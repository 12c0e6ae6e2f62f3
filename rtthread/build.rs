// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

// Pre-build code for the rtthread crate.

// Makes the bare `rtconfig.h` defines (`RT_USING_HEAP`, `RT_USING_MUTEX`, ...) available as
// conditional compilation within this crate.  The valued defines come from `rtthread-sys`.

fn main() {
    rtthread_build::export_bool_kconfig();
}
