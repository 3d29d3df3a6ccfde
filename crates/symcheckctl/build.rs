// Build script for symcheckctl - embeds version at compile time

fn main() {
    // Release pipelines may set SYMCHECK_VERSION; otherwise use Cargo.toml
    let version = std::env::var("SYMCHECK_VERSION")
        .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=SYMCHECK_VERSION={}", version);
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=SYMCHECK_VERSION");
}
