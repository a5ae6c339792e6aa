use std::sync::Once;

/// Filter directive that turns on per-node traversal output.
const TRAVERSAL_TRACE: &str = "tessera_engine::playback=trace";

/// Logger setup.
///
/// `env_filter` uses `env_logger` directive syntax, e.g.
/// `"warn,tessera_engine::scene=debug"`. When unset, `RUST_LOG` applies,
/// then `info`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Adds `trace` output for the playback walk on top of the filter.
    pub trace_traversal: bool,
    /// Routes output through the test harness capture.
    pub is_test: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            trace_traversal: false,
            is_test: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self { env_filter: Some(filter.into()), ..Self::default() }
    }

    /// Captured, uncolored, and verbose enough to show traversal.
    pub fn for_tests() -> Self {
        Self {
            env_filter: Some("debug".into()),
            write_style: env_logger::WriteStyle::Never,
            trace_traversal: true,
            is_test: true,
        }
    }

    fn directives(&self) -> String {
        let base = self
            .env_filter
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| "info".to_owned());
        if self.trace_traversal {
            format!("{base},{TRAVERSAL_TRACE}")
        } else {
            base
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger on first call; later calls do nothing.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let directives = config.directives();
        let mut builder = env_logger::Builder::new();
        builder
            .parse_filters(&directives)
            .write_style(config.write_style)
            .format_timestamp(None)
            .is_test(config.is_test);

        // Another logger may already be installed (e.g. by the host binary).
        if builder.try_init().is_err() {
            return;
        }
        log::debug!("logging initialized ({directives})");
    });
}
