fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds (simulation, tests) do not link against ESP-IDF.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
