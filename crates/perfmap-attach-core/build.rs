//! Build script for perfmap-attach-core
//!
//! This script checks build requirements before compilation:
//! - Minimum Rust version (1.70.0, for `Option::is_ok_and` and let-else)
//! - Target platform (the HotSpot backend needs Linux `/proc`)

use std::env;

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");

    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::new(1, 70, 0);

        if rustc_version < min_rust_version {
            panic!(
                "perfmap-attach-core requires Rust {} or newer, found {}",
                min_rust_version, rustc_version
            );
        }
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }

    // cfg!(target_os) in a build script describes the host, so ask cargo about the target
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_family = env::var("CARGO_CFG_TARGET_FAMILY").unwrap_or_default();

    if !target_family.split(',').any(|family| family == "unix") {
        panic!("perfmap-attach-core only supports Unix targets, found {target_os}");
    }

    if target_os != "linux" {
        println!("cargo:warning=dynamic attach is only implemented for Linux; create_attacher() will return Unsupported on {target_os}");
    }
}
