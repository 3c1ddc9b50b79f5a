use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::rating::types::Rating;

/// Numeric policy of the rating engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSettings {
    /// Rating gap at which the favourite's odds are 10:1
    pub scale_factor: f64,
    pub initial_rating: Rating,
    pub minimum_rating: Rating,
    pub k_factor: f64,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            scale_factor: 40.0,
            initial_rating: 250,
            minimum_rating: 200,
            k_factor: 80.0,
        }
    }
}

impl RatingSettings {
    /// K-factor applied to a team whose first player is rated `_rating`.
    /// Constant for now.
    pub fn k_factor_for(&self, _rating: Rating) -> f64 {
        self.k_factor
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rating settings from {}", path.display()))?;
        let settings = serde_json::from_str(&json).context("Failed to parse rating settings")?;
        info!("Loaded rating settings from {}", path.display());
        Ok(settings)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rating: RatingSettings,
    pub database_path: String,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database_path = std::env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "pickleball_rating.db".to_string());

        let rating = match std::env::var("RATING_SETTINGS_PATH") {
            Ok(path) => RatingSettings::load(path)?,
            Err(_) => RatingSettings::default(),
        };

        Ok(Self {
            rating,
            database_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fall_back_to_defaults() {
        let settings: RatingSettings = serde_json::from_str(r#"{ "k_factor": 40.0 }"#).unwrap();

        assert_eq!(settings.k_factor, 40.0);
        assert_eq!(settings.scale_factor, 40.0);
        assert_eq!(settings.initial_rating, 250);
        assert_eq!(settings.minimum_rating, 200);
    }

    #[test]
    fn k_factor_does_not_depend_on_rating_yet() {
        let settings = RatingSettings::default();
        for rating in [200, 250, 1000] {
            assert_eq!(settings.k_factor_for(rating), 80.0);
        }
    }
}
