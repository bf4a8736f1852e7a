fn main() {
    // Set target triple, shown by `--version`
    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=TARGET_TRIPLE={}", target);

    // Set Rust package version
    let version = env!("CARGO_PKG_VERSION");
    println!("cargo:rustc-env=MEDIAQUEUE_VERSION={}", version);

    // Tell Cargo to rerun this script if anything changes
    println!("cargo:rerun-if-changed=build.rs");
}
