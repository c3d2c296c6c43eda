// In: src/observability.rs

//! Process-wide logging setup.
//!
//! The library itself only talks to the `log` facade. This installs the
//! `env_logger` backend once, for binaries, tests and the Python module alike.

use std::fs::OpenOptions;
use std::sync::Once;

use log::LevelFilter;

use crate::error::CellcastError;

static INIT_LOGGER: Once = Once::new();

fn build_logger(
    level: LevelFilter,
    log_file: Option<&str>,
) -> Result<env_logger::Builder, CellcastError> {
    let mut builder = env_logger::Builder::new();
    builder.is_test(false);
    builder.filter_level(level);

    // Just the level and the message.
    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(buf, "[{}] {}", record.level(), record.args())?;
        buf.flush()?;
        Ok(())
    });

    if let Some(filename) = log_file {
        let file = OpenOptions::new().append(true).create(true).open(filename)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    Ok(builder)
}

/// Installs the logger at `level`, appending to `log_file` when given.
///
/// Only the first call has any effect. A logger installed by someone else is
/// left in place.
pub fn init_logging(level: LevelFilter, log_file: Option<&str>) -> Result<(), CellcastError> {
    let mut result = Ok(());
    INIT_LOGGER.call_once(|| {
        result = build_logger(level, log_file).map(|mut builder| {
            let _ = builder.try_init();
        });
    });
    result
}
