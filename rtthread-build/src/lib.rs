// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

// Pre-build code for the rtthread crates.

// RT-Thread's configuration lives in `rtconfig.h`, generated by menuconfig/scons.  This module
// makes the values from that header available to Rust: bare defines become conditional compilation
// flags, and valued defines become constants in a generated `kconfig` module.  The header is found
// through the `RTCONFIG_H` environment variable.  When that is not set (host builds, tests), a
// bundled default configuration is used.

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

/// Configuration used when `RTCONFIG_H` is not given.
pub const DEFAULT_RTCONFIG: &str = include_str!("../rtconfig.default.h");

/// A single valued define from `rtconfig.h`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A hex literal, taken to be unsigned.
    Hex(String),
    /// A decimal literal.
    Int(i64),
    /// A quoted string, quotes included.
    Str(String),
}

/// The parsed contents of an `rtconfig.h`.
#[derive(Debug, Default)]
pub struct RtConfig {
    /// Defines without a value, such as `RT_USING_HEAP`.
    pub bools: Vec<String>,
    /// Defines with a value, in header order.
    pub values: Vec<(String, Value)>,
}

impl RtConfig {
    /// Is the given bare define present?
    pub fn is_set(&self, name: &str) -> bool {
        self.bools.iter().any(|b| b == name)
    }

    /// Look up a valued define.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Parse the text of an `rtconfig.h`.
///
/// Only simple single line `#define`s are understood.  Anything else (include guards aside, which
/// come through as bare defines) is ignored, as are function-like macros.
pub fn parse_rtconfig(text: &str) -> Result<RtConfig> {
    let define_bool = Regex::new(r"^\s*#define\s+([A-Za-z_][A-Za-z0-9_]*)\s*$")?;
    let define_hex = Regex::new(r"^\s*#define\s+([A-Za-z_][A-Za-z0-9_]*)\s+(0[xX][0-9a-fA-F]+)\s*$")?;
    let define_int = Regex::new(r"^\s*#define\s+([A-Za-z_][A-Za-z0-9_]*)\s+(-?[0-9]+)\s*$")?;
    // It is unclear what escaping might be used in the header, so take the quoted text as-is.
    let define_str = Regex::new(r#"^\s*#define\s+([A-Za-z_][A-Za-z0-9_]*)\s+(".*")\s*$"#)?;

    let mut config = RtConfig::default();
    for line in text.lines() {
        if let Some(caps) = define_bool.captures(line) {
            config.bools.push(caps[1].to_string());
        } else if let Some(caps) = define_hex.captures(line) {
            config.values.push((caps[1].to_string(), Value::Hex(caps[2].to_string())));
        } else if let Some(caps) = define_int.captures(line) {
            let value = caps[2]
                .parse()
                .with_context(|| format!("parsing value of {}", &caps[1]))?;
            config.values.push((caps[1].to_string(), Value::Int(value)));
        } else if let Some(caps) = define_str.captures(line) {
            config.values.push((caps[1].to_string(), Value::Str(caps[2].to_string())));
        }
    }
    Ok(config)
}

/// Write the valued defines as Rust constants.
///
/// Hex values become `usize`, non-negative decimal values `usize`, negative ones `isize`, and
/// strings `&'static str`.
pub fn write_kconfig_mod<W: Write>(config: &RtConfig, out: &mut W) -> Result<()> {
    for (name, value) in &config.values {
        writeln!(out, "#[allow(dead_code)]")?;
        match value {
            Value::Hex(v) => writeln!(out, "pub const {}: usize = {};", name, v)?,
            Value::Int(v) if *v < 0 => writeln!(out, "pub const {}: isize = {};", name, v)?,
            Value::Int(v) => writeln!(out, "pub const {}: usize = {};", name, v)?,
            Value::Str(v) => writeln!(out, "pub const {}: &'static str = {};", name, v)?,
        }
    }
    Ok(())
}

/// Read the configuration named by `RTCONFIG_H`, or the default one.
///
/// Also tells cargo when to rerun the build script.
fn load_rtconfig() -> Result<RtConfig> {
    println!("cargo:rerun-if-env-changed=RTCONFIG_H");
    let text = match env::var("RTCONFIG_H") {
        Ok(path) => {
            println!("cargo:rerun-if-changed={}", path);
            fs::read_to_string(&path).with_context(|| format!("reading {}", path))?
        }
        Err(_) => DEFAULT_RTCONFIG.to_string(),
    };
    parse_rtconfig(&text)
}

/// Export bare `rtconfig.h` defines as cfg flags.  This must happen in any crate that wishes to
/// access the configuration settings.
pub fn export_bool_kconfig() {
    let config = load_rtconfig().expect("Unable to load rtconfig.h");
    for name in &config.bools {
        println!("cargo:rustc-cfg={}", name);
    }
}

/// Capture numeric and string `rtconfig.h` values in `$OUT_DIR/kconfig.rs`.
pub fn build_kconfig_mod() {
    let outdir = env::var("OUT_DIR").expect("OUT_DIR must be set");
    let config = load_rtconfig().expect("Unable to load rtconfig.h");

    let gen_path = Path::new(&outdir).join("kconfig.rs");
    let mut f = File::create(&gen_path).expect("Unable to create kconfig.rs");
    write_kconfig_mod(&config, &mut f).expect("Writing kconfig.rs");
}
