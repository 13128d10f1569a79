//! Engine settings.

use comptable_shared::LedgerConfig;
use rust_decimal::Decimal;

/// Ledger rules the engine applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Base (functional) currency code.
    pub base_currency: String,
    /// Equilibrium tolerance.
    pub tolerance: Decimal,
    /// Account receiving the net result on annual closing.
    pub net_result_account: String,
    /// Journal of generated closing entries.
    pub closing_journal: String,
    /// Journal of generated carry-forward entries.
    pub carry_forward_journal: String,
    /// Prefix identifying bank accounts.
    pub bank_account_prefix: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for LedgerSettings {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            base_currency: config.base_currency.clone(),
            tolerance: config.tolerance,
            net_result_account: config.net_result_account.clone(),
            closing_journal: config.closing_journal.clone(),
            carry_forward_journal: config.carry_forward_journal.clone(),
            bank_account_prefix: config.bank_account_prefix.clone(),
        }
    }
}
