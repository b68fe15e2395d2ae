fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_prost_build::configure().compile_protos(&["proto/greet.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/greet.proto");

    Ok(())
}
