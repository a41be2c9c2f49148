use serde::Deserialize;

/// Expansion rounds per `step()` call when nothing else is configured.
pub const DEFAULT_EXPANSIONS_PER_STEP: usize = 1;

/// Search tuning. Affects how often control returns to the caller, never
/// which path is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Expansion rounds per `step()`. Values below 1 are treated as 1; there
    /// is no upper bound.
    pub expansions_per_step: usize,
}

impl SearchConfig {
    pub fn new(expansions_per_step: usize) -> Self {
        Self {
            expansions_per_step: clamp_expansions(expansions_per_step),
        }
    }

    /// The configured batch size with the lower bound applied.
    pub fn effective_expansions(&self) -> usize {
        clamp_expansions(self.expansions_per_step)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            expansions_per_step: DEFAULT_EXPANSIONS_PER_STEP,
        }
    }
}

pub(crate) fn clamp_expansions(n: usize) -> usize {
    n.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_one() {
        assert_eq!(SearchConfig::default().expansions_per_step, 1);
    }

    #[test]
    fn test_zero_clamped() {
        assert_eq!(SearchConfig::new(0).expansions_per_step, 1);
        assert_eq!(SearchConfig::new(500).expansions_per_step, 500);
    }

    #[test]
    fn test_deserialize_missing_field_uses_default() {
        let cfg: SearchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, SearchConfig::default());
    }

    #[test]
    fn test_deserialized_zero_clamped_on_use() {
        let cfg: SearchConfig = serde_json::from_str(r#"{"expansions_per_step": 0}"#).unwrap();
        assert_eq!(cfg.expansions_per_step, 0);
        assert_eq!(cfg.effective_expansions(), 1);
    }
}
