fn main() {
    println!("cargo:rerun-if-changed=config.json");

    // ESP-IDF builds need the toolchain environment exported to rustc;
    // host builds have nothing to do here.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
