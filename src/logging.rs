use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber at `level` for this crate.
/// Other crates (wgpu, iced) only report warnings.
pub fn init(level: &str) {
    let filter = EnvFilter::try_new(format!("warn,parking_monitor={}", level))
        .unwrap_or_else(|_| EnvFilter::new("warn,parking_monitor=info"));

    let fmt_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
