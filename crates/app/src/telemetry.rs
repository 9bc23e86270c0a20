//! Tracing setup for the terminal front-end.
//!
//! - `TOEIC_LOG` holds the filter directives (default `info`).
//! - `TOEIC_LOG_FORMAT=json` switches to JSON lines.
//!
//! Logs go to stderr so they never interleave with quiz output on stdout.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("TOEIC_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,reqwest=warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match std::env::var("TOEIC_LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
