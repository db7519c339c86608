use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=HARTBOOT_PAYLOAD");
    println!("cargo:rerun-if-env-changed=HARTBOOT_HART_COUNT");
    println!("cargo:rerun-if-env-changed=HARTBOOT_PAYLOAD_DEST");
    println!("cargo:rerun-if-env-changed=HARTBOOT_BOOT_HART");
    println!("cargo:rerun-if-changed=linker.ld");
    println!("cargo:rerun-if-changed=src/arch/riscv64/payload.S");

    if env::var("CARGO_CFG_TARGET_ARCH").as_deref() != Ok("riscv64") {
        return;
    }

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let payload = match env::var_os("HARTBOOT_PAYLOAD") {
        Some(path) => {
            let path = PathBuf::from(path);
            println!("cargo:rerun-if-changed={}", path.display());
            path
        }
        None => {
            let empty = out_dir.join("empty_payload.bin");
            fs::write(&empty, []).expect("should be able to write empty payload");
            empty
        }
    };

    let payload_path = format!("\"{}\"", payload.display());
    cc::Build::new()
        .file("src/arch/riscv64/payload.S")
        .define("PAYLOAD_PATH", Some(payload_path.as_str()))
        .compile("payload");

    println!(
        "cargo:rustc-link-arg-bins=-T{}",
        manifest_dir.join("linker.ld").display()
    );
}
