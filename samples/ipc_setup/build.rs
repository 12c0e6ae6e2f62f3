// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

// The sample checks `RT_USING_HEAP` to decide which objects it can create dynamically.

fn main() {
    rtthread_build::export_bool_kconfig();
}
