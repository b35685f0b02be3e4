//! Engine configuration loaded from the environment.

/// Tunable knobs for the engine. Everything has a sensible default so the
/// engine runs from a bare environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Display name of the kingdom seeded at startup.
    pub kingdom_name: String,
    /// Fame paid up front for a reroll, refunded if the reroll never resolves.
    pub reroll_fame_cost: i64,
    /// Flat DC for aid-another checks.
    pub aid_dc: i32,
    /// Fame the seeded kingdom starts with.
    pub starting_fame: i64,
    /// Capacity of the committed-change broadcast channel.
    pub event_capacity: usize,
}

impl EngineConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let kingdom_name =
            std::env::var("REGENT_KINGDOM_NAME").unwrap_or_else(|_| defaults.kingdom_name.clone());
        let reroll_fame_cost =
            parse_var("REGENT_REROLL_FAME_COST", defaults.reroll_fame_cost);
        let aid_dc = parse_var("REGENT_AID_DC", defaults.aid_dc);
        let starting_fame = parse_var("REGENT_STARTING_FAME", defaults.starting_fame);
        let event_capacity = parse_var("REGENT_EVENT_CAPACITY", defaults.event_capacity);

        Self {
            kingdom_name,
            reroll_fame_cost,
            aid_dc,
            starting_fame,
            event_capacity,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kingdom_name: "New Kingdom".into(),
            reroll_fame_cost: 1,
            aid_dc: 15,
            starting_fame: 1,
            event_capacity: 64,
        }
    }
}

fn parse_var<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, "Unparsable value, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.reroll_fame_cost, 1);
        assert_eq!(config.aid_dc, 15);
        assert_eq!(config.starting_fame, 1);
        assert_eq!(config.event_capacity, 64);
    }
}
