//! Sample settings file generation.

use std::io::Write;
use std::path::{Path, PathBuf};

use relink::ClientSettings;

use crate::cli::DEFAULT_ENDPOINT;
use crate::error::CliError;

const HEADER: &str = "\
# relink client settings
#
# endpoint: ws:// or wss:// URL to keep a connection to.
# reconnect.should_reconnect: retry after the connection closes.
# reconnect.reconnect_interval_ms: fixed delay before each retry.
# reconnect.max_reconnect_attempts: retries allowed since the last open.

";

/// Init-config command executor.
pub struct InitConfigCommand {
    path: PathBuf,
    force: bool,
}

impl InitConfigCommand {
    /// Create a new init-config command.
    #[must_use]
    pub fn new(path: impl AsRef<Path>, force: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            force,
        }
    }

    /// Write the sample file.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::FileExists`] if the file exists and `force` is not
    /// set, or an error if writing fails.
    pub fn execute<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.path.exists() && !self.force {
            return Err(CliError::FileExists(self.path.clone()));
        }

        let body = ClientSettings::new(DEFAULT_ENDPOINT).to_toml()?;
        std::fs::write(&self.path, format!("{HEADER}{body}"))?;

        writeln!(writer, "wrote {}", self.path.display())?;
        Ok(())
    }
}
