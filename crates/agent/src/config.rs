use sqlagent_core::{DEFAULT_MAX_RETRIES, DEFAULT_TOP_K, env_parse_with_default};

/// Orchestrator tunables, built once at process start and injected.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Additional generation attempts after the first. Zero means exactly
    /// one attempt and any failure is immediately terminal.
    pub max_retries: u32,
    /// Similar examples injected into each generation prompt.
    pub top_k: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_retries: DEFAULT_MAX_RETRIES, top_k: DEFAULT_TOP_K }
    }
}

impl AgentConfig {
    /// Read the config from `SQLAGENT_MAX_RETRIES` and `SQLAGENT_TOP_K`,
    /// falling back to defaults on missing or invalid values.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            max_retries: env_parse_with_default("SQLAGENT_MAX_RETRIES", DEFAULT_MAX_RETRIES),
            top_k: env_parse_with_default("SQLAGENT_TOP_K", DEFAULT_TOP_K),
        }
    }

    /// Total attempt bound: first attempt plus retries. Saturates so an
    /// absurd `SQLAGENT_MAX_RETRIES` cannot wrap the bound to zero.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let config = AgentConfig::default();
        assert_eq!(config.max_attempts(), DEFAULT_MAX_RETRIES + 1);
    }

    #[test]
    fn test_zero_retries_means_one_attempt() {
        let config = AgentConfig { max_retries: 0, top_k: 3 };
        assert_eq!(config.max_attempts(), 1);
    }

    #[test]
    fn test_max_retries_at_limit_does_not_wrap() {
        let config = AgentConfig { max_retries: u32::MAX, top_k: 3 };
        assert_eq!(config.max_attempts(), u32::MAX);
    }
}
