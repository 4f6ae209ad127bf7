use anyhow::Result;
use kipesa_core::tracing::{InstrumentationConfig, LogFormat, init_tracing};
use tracing::Level;

/// Initialize logging for the CLI
///
/// Logs go to stderr so command output on stdout stays machine readable.
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: Level, json: bool) -> Result<()> {
    let config = InstrumentationConfig {
        service_name: "kipesa-cli".to_string(),
        log_level: level.as_str().to_lowercase(),
        format: if json { LogFormat::Json } else { LogFormat::Pretty },
        ..InstrumentationConfig::default()
    };
    init_tracing(&config)
}
