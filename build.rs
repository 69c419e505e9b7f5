fn main() {
    // embuild emits ESP-IDF link arguments only for device builds; host
    // builds (tests, clippy) must not require an ESP-IDF environment.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
