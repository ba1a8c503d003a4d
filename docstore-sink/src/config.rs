use std::env;

use crate::Result;
use crate::error::Error;

const DEFAULT_NAME: &str = "docstoreSink";
const DEFAULT_LOCAL_PARALLELISM: usize = 2;

const ENV_SINK_NAME: &str = "DOCSTORE_SINK_NAME";
const ENV_SINK_LOCAL_PARALLELISM: &str = "DOCSTORE_SINK_LOCAL_PARALLELISM";

/// Static settings the host framework reads from the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSettings {
    pub name: String,
    /// Number of workers, and therefore client connections, per member.
    pub local_parallelism: usize,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            local_parallelism: DEFAULT_LOCAL_PARALLELISM,
        }
    }
}

impl SinkSettings {
    /// Defaults, overridden by `DOCSTORE_SINK_NAME` and `DOCSTORE_SINK_LOCAL_PARALLELISM`.
    pub fn load() -> Result<Self> {
        Self::load_from(|key| env::var(key).ok())
    }

    fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(name) = lookup(ENV_SINK_NAME) {
            settings.name = name;
        }

        if let Some(parallelism) = lookup(ENV_SINK_LOCAL_PARALLELISM) {
            settings.local_parallelism = parallelism.trim().parse().map_err(|e| {
                Error::Config(format!(
                    "{ENV_SINK_LOCAL_PARALLELISM} must be a positive integer, got {parallelism:?}: {e}"
                ))
            })?;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Config("sink name must not be empty".to_string()));
        }
        if self.local_parallelism == 0 {
            return Err(Error::Config(
                "local parallelism must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
