use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE: &str = "wcal.log";
pub const LOG_ENV: &str = "WCAL_LOG";

/// Route tracing output to `<data_dir>/wcal.log`; the TUI owns stdout.
/// Level comes from `WCAL_LOG` and defaults to `info`.
pub fn init(data_dir: &Path) -> color_eyre::Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| color_eyre::eyre::eyre!("failed to install logger: {err}"))
}
