use env_logger::Env;

/// Initialize logging using env_logger.
/// Defaults to Info so the progress lines land in scheduler logs;
/// RUST_LOG still overrides, e.g. `RUST_LOG=gtx_keepalive=debug`.
pub fn init_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
