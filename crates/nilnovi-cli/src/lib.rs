//! Shared pieces of the `nnp-comp` and `nnp-exec` binaries.

pub mod board;

/// Set up logging to stderr. `debug` lowers the default level from `info`
/// to `debug`; `RUST_LOG` still overrides either.
pub fn init_tracing(debug: bool) {
    let default = if debug { "nilnovi=debug" } else { "nilnovi=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default.parse().expect("valid logging directive")),
        )
        .with_writer(std::io::stderr)
        .init();
}
