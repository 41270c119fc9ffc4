//! # ShelfPick
//!
//! Serial control client for a single-axis shelf-picking carriage.
//!
//! ## Architecture
//!
//! ShelfPick is organized as a workspace with multiple crates:
//!
//! 1. **shelfpick-core** - Catalog and resolver, motion state, session log, errors
//! 2. **shelfpick-communication** - Serial link, reader thread, carriage protocol, session
//! 3. **shelfpick-settings** - Configuration files
//! 4. **shelfpick** - Operator console binary that integrates all crates

pub mod console;

pub use shelfpick_communication::{
    list_ports, simulated_controller, CarriageCommand, Connector, LoopbackConnector,
    PickerSession, SerialConnector, SerialPortInfo, SessionOptions,
};
pub use shelfpick_core::{
    standard_catalog, Catalog, ConnectionError, Error, Location, LogDirection, LogEvent,
    MotionState, ResolveError, Result,
};
pub use shelfpick_settings::{CatalogSettings, Config, ConnectionSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Output on stderr, so it never mixes with console output
/// - RUST_LOG environment variable support (default level: warn)
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
