fn main() {
    // N-API link setup is only needed when the bridge feature is compiled in.
    if std::env::var("CARGO_FEATURE_NAPI").is_ok() {
        napi_build::setup();
    }
}
