// Re-export modules
pub mod candidate;
pub mod config;
pub mod dom;
pub mod driver;
pub mod protocol;
pub mod session;

// Re-export commonly used types for convenience
pub use candidate::Candidate;
pub use driver::{DocumentSource, DriverHandle};
pub use session::NavigationSession;

use std::error::Error;
use std::path::PathBuf;

/// Kinds of rendered documents the scanner can watch
#[derive(Debug, Clone)]
pub enum SourceType {
    /// HTML file on disk, re-read on every tick
    File(PathBuf),
    /// HTML held in memory
    Inline(String),
}

/// Builder for a scan driver over a document source
pub struct Scanner {
    source: SourceType,
    config: config::ScanConfig,
}

impl Scanner {
    /// Create a new Scanner builder for the given source
    pub fn new(source: SourceType) -> Self {
        Self {
            source,
            config: config::ScanConfig::default(),
        }
    }

    /// Replace the whole scan configuration
    pub fn with_config(mut self, config: config::ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the scan configuration from a JSON file
    pub fn with_config_file(
        self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, Box<dyn Error>> {
        let config = config::ScanConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load the scan configuration from a JSON string
    pub fn with_config_str(self, config_str: &str) -> Result<Self, Box<dyn Error>> {
        let config = serde_json::from_str(config_str)?;
        Ok(self.with_config(config))
    }

    /// Override the poll interval
    pub fn with_poll_interval(mut self, interval_ms: u64) -> Self {
        self.config.poll_interval_ms = interval_ms;
        self
    }

    /// Override the base URL used to resolve relative links
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    /// Spawn the scan driver task and get its handle
    ///
    /// The driver starts idle; call `start()` on the handle to begin
    /// polling.
    pub fn spawn(self) -> DriverHandle {
        match self.source {
            SourceType::File(path) => driver::spawn(driver::FileSource::new(path), self.config),
            SourceType::Inline(html) => driver::spawn(driver::InlineSource::new(html), self.config),
        }
    }
}
