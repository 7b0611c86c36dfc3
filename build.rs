use std::{env, fs, path::Path};

fn main() {
    // `protoc` is unavailable in this build environment, so instead of running
    // `tonic_build::compile_protos` we ship the generated code under
    // `proto/dispatch.rs` and copy it to where `tonic::include_proto!("dispatch")`
    // expects it (`$OUT_DIR/dispatch.rs`).
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let dest = Path::new(&out_dir).join("dispatch.rs");
    fs::copy("proto/dispatch.rs", &dest).expect("failed to stage generated dispatch.rs");
    println!("cargo:rerun-if-changed=proto/dispatch.rs");
    println!("cargo:rerun-if-changed=proto/dispatch.proto");
}
