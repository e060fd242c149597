pub mod failing;
pub mod fixtures;
pub mod postgres;
pub mod rebuilder;
pub mod redis;

use std::sync::Once;

pub use failing::{UnavailableCache, UnavailableChannel};
pub use fixtures::*;
pub use postgres::TestPostgresContainer;
pub use rebuilder::RecordingRebuilder;
pub use redis::TestRedisContainer;

static TRACING: Once = Once::new();

/// Routes `tracing` output through the test harness. Honors `RUST_LOG`.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
}
