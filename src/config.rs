use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,

    // Audio
    pub default_volume: f32,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            discord_token: std::env::var("DISCORD_TOKEN")?,
            default_volume: std::env::var("DEFAULT_VOLUME")
                .unwrap_or_else(|_| "0.5".to_string())
                .parse()?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Discord token must not be empty
    /// - Volume must be between 0.0 and 2.0
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("DISCORD_TOKEN no puede estar vacío");
        }

        if !(0.0..=2.0).contains(&self.default_volume) {
            anyhow::bail!(
                "Default volume must be between 0.0 and 2.0, got: {}",
                self.default_volume
            );
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// The Discord token is never included.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Audio: {}% vol",
            (self.default_volume * 100.0).round() as u32,
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no defaults - must be provided)
            discord_token: String::new(),

            default_volume: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_token() -> Config {
        Config {
            discord_token: "token-secreto".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_requires_token() {
        assert!(Config::default().validate().is_err());
        assert!(with_token().validate().is_ok());
    }

    #[test]
    fn test_volume_out_of_range_is_rejected() {
        let mut config = with_token();
        config.default_volume = 2.5;
        assert!(config.validate().is_err());

        config.default_volume = -0.1;
        assert!(config.validate().is_err());

        config.default_volume = 2.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_summary_hides_token() {
        let summary = with_token().summary();
        assert!(!summary.contains("token-secreto"));
        assert!(summary.contains("50% vol"));
    }
}
