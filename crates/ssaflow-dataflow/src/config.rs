use crate::error::{FlowError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_RECURSION_LIMIT: usize = 10_000;
pub const RELAXED_RECURSION_LIMIT: usize = 100_000;

/// Overrides the recursion ceiling for every traversal in the process.
pub const RECURSION_LIMIT_ENV: &str = "SSAFLOW_RECURSION_LIMIT";
/// When set, the relaxed ceiling replaces the default one.
pub const CI_ENV: &str = "CI";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Hard ceiling on visited nodes per top-level call, counted across all branches.
    pub recursion_limit: usize,
    pub relaxed_recursion_limit: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            relaxed_recursion_limit: RELAXED_RECURSION_LIMIT,
        }
    }
}

impl TraversalConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Defaults, then the JSON file if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.with_env_overrides()
    }

    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`, in the order CI relaxation then explicit limit.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if lookup(CI_ENV).is_some() {
            self.recursion_limit = self.relaxed_recursion_limit;
        }
        if let Some(raw) = lookup(RECURSION_LIMIT_ENV) {
            self.recursion_limit = raw.trim().parse().map_err(|_| {
                FlowError::Config(format!("{} is not a valid limit: {:?}", RECURSION_LIMIT_ENV, raw))
            })?;
        }
        self.validate()
    }

    /// Process-wide defaults, read from the environment once.
    pub fn global() -> &'static TraversalConfig {
        static GLOBAL: OnceLock<TraversalConfig> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            Self::from_env().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "ignoring invalid traversal environment");
                Self::default()
            })
        })
    }

    fn validate(self) -> Result<Self> {
        if self.recursion_limit == 0 {
            return Err(FlowError::Config(
                "recursion_limit must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}
