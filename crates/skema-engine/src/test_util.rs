//! Shared test plumbing.

use once_cell::sync::Lazy;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

/// Install the test tracing subscriber once. Run tests with
/// `RUST_LOG=skema_engine=trace` to see evaluation traces.
pub fn init_tracing() {
    Lazy::force(&TRACING);
}
