// Stderr logging. `RUST_LOG` overrides the default filter, e.g.
// `RUST_LOG=slate_editor=debug` to trace every history step.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "slate_editor=info";

pub fn init() {
    let filter: EnvFilter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
    }
}
