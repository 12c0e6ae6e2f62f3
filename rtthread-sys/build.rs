// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

// Pre-build code for the rtthread-sys crate.

// The structure layouts in this crate depend on a few of the `rtconfig.h` values (the name length
// in particular), so the configuration is turned into a `kconfig` module here, and re-exported by
// the higher level crate.

fn main() -> anyhow::Result<()> {
    rtthread_build::export_bool_kconfig();
    rtthread_build::build_kconfig_mod();
    Ok(())
}
