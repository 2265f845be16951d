//! Build script for knob-drive.

use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rustc-check-cfg=cfg(rust_analyzer)");

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let target = env::var("TARGET").expect("TARGET is set by cargo");

    // Pick the memory layout matching the target and expose it as memory.x
    let memory_file = if target.starts_with("thumbv8m") {
        Some("memory-pico2.x")
    } else if target.starts_with("riscv32imac") {
        Some("memory-pico2-riscv.x")
    } else if target.starts_with("thumbv6m") {
        Some("memory-pico1.x")
    } else {
        None // host
    };

    let Some(memory_file) = memory_file else {
        return;
    };

    let memory_x = fs::read_to_string(memory_file)
        .unwrap_or_else(|_| panic!("Failed to read {memory_file}"));
    fs::write(out_dir.join("memory.x"), memory_x).expect("Failed to write memory.x");
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed={memory_file}");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    if target.starts_with("thumbv6m") {
        println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    }
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
