//! Build script for servo-envoy: places the board's memory layout on the link path.

use std::{env, error::Error, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn Error>> {
    let target = env::var("TARGET")?;
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    let (layout, rp_script) = if target.starts_with("thumbv8m") {
        // Pico 2 ARM
        ("memory-pico2.x", false)
    } else if target.starts_with("thumbv6m") {
        // Pico 1W (RP2040 needs link-rp.x for its boot2 stage)
        ("memory-pico1w.x", true)
    } else {
        // Host builds link normally.
        return Ok(());
    };

    let memory_x = fs::read_to_string(layout)?;
    fs::write(out_dir.join("memory.x"), memory_x)?;
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed={layout}");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    if rp_script {
        println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    }
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    Ok(())
}
