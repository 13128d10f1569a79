//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger engine settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger engine settings.
///
/// Every field has a SYSCOHADA-flavoured default so the section may be
/// omitted entirely.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Base (functional) currency code.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// Rounding tolerance for equilibrium checks.
    #[serde(default = "default_tolerance")]
    pub tolerance: Decimal,
    /// Account receiving the net result on annual closing.
    #[serde(default = "default_net_result_account")]
    pub net_result_account: String,
    /// Journal code used for generated closing entries.
    #[serde(default = "default_closing_journal")]
    pub closing_journal: String,
    /// Journal code used for generated carry-forward entries.
    #[serde(default = "default_carry_forward_journal")]
    pub carry_forward_journal: String,
    /// Account number prefix identifying bank accounts.
    #[serde(default = "default_bank_account_prefix")]
    pub bank_account_prefix: String,
}

fn default_base_currency() -> String {
    "XOF".to_string()
}

fn default_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

fn default_net_result_account() -> String {
    "131".to_string()
}

fn default_closing_journal() -> String {
    "CLO".to_string()
}

fn default_carry_forward_journal() -> String {
    "AN".to_string()
}

fn default_bank_account_prefix() -> String {
    "52".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            tolerance: default_tolerance(),
            net_result_account: default_net_result_account(),
            closing_journal: default_closing_journal(),
            carry_forward_journal: default_carry_forward_journal(),
            bank_account_prefix: default_bank_account_prefix(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones:
    /// `config/default`, `config/{RUN_MODE}`, then `COMPTABLE__*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("COMPTABLE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
