use prometheus::register_counter_vec;
use prometheus::CounterVec;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use lazy_static::lazy_static;

lazy_static! {
    pub static ref ACTIONS_CNTR: CounterVec = register_counter_vec!(
        "event_manager_actions_total",
        "Number of successful mutations, by kind",
        &["action"]
    )
    .expect("metric can be registered");
}

pub fn record_action(action: &str) {
    ACTIONS_CNTR.with_label_values(&[action]).inc();
}

/// Directives from `var`, or `info` when it is unset or does not parse.
fn env_filter(var: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init_tracing() {
    let mut fmt_layer = fmt::layer();
    if std::env::var("INCLUDE_SPAN_EVENTS").is_ok_and(|value| value.eq_ignore_ascii_case("true")) {
        fmt_layer = fmt_layer.with_span_events(FmtSpan::ENTER | FmtSpan::EXIT);
    }
    let filter_layer = env_filter("LOG_LEVEL");

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
