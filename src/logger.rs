use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

// Diagnostics go to stderr so they never interleave with the progress line
pub fn init() {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

  let fmt_layer = fmt::layer()
    .with_target(false)
    .with_writer(std::io::stderr)
    .with_timer(fmt::time::uptime());

  let _ = tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init();
}
