use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// Honors `RUST_LOG` (default `info`). Output goes to stderr so stdout stays
/// reserved for payloads; it is human-readable on a terminal and JSON otherwise.
pub fn setup_logging() {
    let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if is_terminal {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(true)
            .init();
    }
}
