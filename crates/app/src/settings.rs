//! Handles settings for the application.
//!
//! Values come from an optional TOML file (`stockroom.toml` unless `--config`
//! says otherwise) overlaid with `STOCKROOM__`-prefixed environment variables,
//! e.g. `STOCKROOM__APP__LEVEL=debug` or `STOCKROOM__DATABASE__SQLITE=./shop.db`.
use config::{Config, Environment, File};
use engine::LedgerConfig;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "stockroom.toml";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("./stockroom.db".to_string())
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Self::Memory => String::from("sqlite::memory:"),
            Self::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub ledger: LedgerConfig,
}

impl Settings {
    pub fn load(path: Option<&str>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(false))
            .add_source(
                Environment::with_prefix("STOCKROOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;
    use engine::LowStockPolicy;

    use super::*;

    fn from_toml(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let settings = from_toml("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.database, Database::Sqlite("./stockroom.db".to_string()));
        assert_eq!(settings.ledger, LedgerConfig::default());
    }

    #[test]
    fn ledger_section_overrides_defaults() {
        let settings = from_toml(
            r#"
            database = "memory"

            [ledger]
            expiry_horizon_days = 7

            [ledger.low_stock]
            policy = "per_item"
            default_threshold = 3
            "#,
        );
        assert_eq!(settings.database, Database::Memory);
        assert_eq!(settings.ledger.expiry_horizon_days, 7);
        assert_eq!(settings.ledger.recent_activity_limit, 10);
        assert_eq!(
            settings.ledger.low_stock,
            LowStockPolicy::PerItem {
                default_threshold: 3
            }
        );
    }

    #[test]
    fn database_urls() {
        assert_eq!(Database::Memory.url(), "sqlite::memory:");
        assert_eq!(
            Database::Sqlite("shop.db".to_string()).url(),
            "sqlite:shop.db?mode=rwc"
        );
    }
}
