/*
 * Batch file renaming built around token trees: each file name is split into fragments
 * that can be edited, reordered, discarded and transformed before a new name is
 * reconstructed and applied.
 */
pub mod core;

use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Installs the terminal logger at debug level. Later calls do nothing.
pub fn initialize_logging() {
    initialize_logging_with_level(LevelFilter::Debug);
}

pub fn initialize_logging_with_level(level: LevelFilter) {
    LOGGING_INIT.call_once(|| {
        let config = ConfigBuilder::new()
            .set_thread_level(LevelFilter::Off)
            .set_target_level(LevelFilter::Off)
            .set_location_level(LevelFilter::Off)
            .build();
        if let Err(e) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto) {
            eprintln!("Failed to initialize logger: {e}");
        }
    });
}
