//! Anomaly and validation report types.

use chrono::{DateTime, Utc};
use comptable_shared::types::{AnomalyId, ExerciseId, JournalEntryId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Refuses the operation.
    Blocking,
    /// Refuses the operation.
    Error,
    /// Reported only.
    Warning,
    /// Reported only.
    Info,
}

impl Severity {
    /// Returns the string representation of the severity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocking => "BLOCKING",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }

    /// Parses a severity from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BLOCKING" => Some(Self::Blocking),
            "ERROR" => Some(Self::Error),
            "WARNING" => Some(Self::Warning),
            "INFO" => Some(Self::Info),
            _ => None,
        }
    }

    /// BLOCKING and ERROR findings refuse the operation.
    #[must_use]
    pub fn is_failing(&self) -> bool {
        matches!(self, Self::Blocking | Self::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyCategory {
    /// Debit/credit equality.
    Equilibrium,
    /// Data agrees with the chart and with itself.
    Consistency,
    /// Expected data is present.
    Completeness,
}

impl AnomalyCategory {
    /// Returns the string representation of the category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equilibrium => "EQUILIBRIUM",
            Self::Consistency => "CONSISTENCY",
            Self::Completeness => "COMPLETENESS",
        }
    }

    /// Parses a category from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EQUILIBRIUM" => Some(Self::Equilibrium),
            "CONSISTENCY" => Some(Self::Consistency),
            "COMPLETENESS" => Some(Self::Completeness),
            _ => None,
        }
    }
}

/// Rule that produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyRule {
    /// Σ debit vs Σ credit of an entry.
    Equilibrium,
    /// Line account exists in the chart.
    AccountExistence,
    /// Document date not after entry date.
    DateCoherence,
    /// Line amount strictly positive.
    PositiveAmount,
    /// Entry and line labels present.
    RequiredLabel,
    /// Foreign lines carry a consistent rate.
    MultiCurrency,
    /// Trial balance column pairs balance.
    BalanceEquilibrium,
    /// Closing balance on the expected side for the class.
    BalanceSign,
    /// Lettrable lines carry a lettering tag.
    Lettering,
    /// Bank lines carry a reconciliation tag.
    BankReconciliation,
}

impl AnomalyRule {
    /// Returns the string representation of the rule.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equilibrium => "EQUILIBRIUM",
            Self::AccountExistence => "ACCOUNT_EXISTENCE",
            Self::DateCoherence => "DATE_COHERENCE",
            Self::PositiveAmount => "POSITIVE_AMOUNT",
            Self::RequiredLabel => "REQUIRED_LABEL",
            Self::MultiCurrency => "MULTI_CURRENCY",
            Self::BalanceEquilibrium => "BALANCE_EQUILIBRIUM",
            Self::BalanceSign => "BALANCE_SIGN",
            Self::Lettering => "LETTERING",
            Self::BankReconciliation => "BANK_RECONCILIATION",
        }
    }

    /// Parses a rule from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EQUILIBRIUM" => Some(Self::Equilibrium),
            "ACCOUNT_EXISTENCE" => Some(Self::AccountExistence),
            "DATE_COHERENCE" => Some(Self::DateCoherence),
            "POSITIVE_AMOUNT" => Some(Self::PositiveAmount),
            "REQUIRED_LABEL" => Some(Self::RequiredLabel),
            "MULTI_CURRENCY" => Some(Self::MultiCurrency),
            "BALANCE_EQUILIBRIUM" => Some(Self::BalanceEquilibrium),
            "BALANCE_SIGN" => Some(Self::BalanceSign),
            "LETTERING" => Some(Self::Lettering),
            "BANK_RECONCILIATION" => Some(Self::BankReconciliation),
            _ => None,
        }
    }

    /// Category the rule belongs to.
    #[must_use]
    pub fn category(&self) -> AnomalyCategory {
        match self {
            Self::Equilibrium | Self::BalanceEquilibrium => AnomalyCategory::Equilibrium,
            Self::AccountExistence
            | Self::DateCoherence
            | Self::PositiveAmount
            | Self::MultiCurrency
            | Self::BalanceSign => AnomalyCategory::Consistency,
            Self::RequiredLabel | Self::Lettering | Self::BankReconciliation => {
                AnomalyCategory::Completeness
            }
        }
    }
}

impl fmt::Display for AnomalyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follow-up state of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    /// Not handled yet.
    Open,
    /// Fixed.
    Resolved,
    /// Accepted as is.
    Ignored,
}

impl ResolutionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Resolved => "RESOLVED",
            Self::Ignored => "IGNORED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OPEN" => Some(Self::Open),
            "RESOLVED" => Some(Self::Resolved),
            "IGNORED" => Some(Self::Ignored),
            _ => None,
        }
    }
}

/// A recorded finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Unique identifier.
    pub id: AnomalyId,
    /// Exercise the finding belongs to.
    pub exercise_id: ExerciseId,
    /// Entry concerned, if any.
    pub entry_id: Option<JournalEntryId>,
    /// Rule.
    pub rule: AnomalyRule,
    /// Category derived from the rule.
    pub category: AnomalyCategory,
    /// Severity.
    pub severity: Severity,
    /// Human-readable description.
    pub description: String,
    /// Structured details.
    pub details: serde_json::Value,
    /// Detection time.
    pub detected_at: DateTime<Utc>,
    /// Follow-up state.
    pub resolution: ResolutionStatus,
}

impl Anomaly {
    /// Creates an open finding.
    pub fn new(
        exercise_id: ExerciseId,
        entry_id: Option<JournalEntryId>,
        rule: AnomalyRule,
        severity: Severity,
        description: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: AnomalyId::new(),
            exercise_id,
            entry_id,
            rule,
            category: rule.category(),
            severity,
            description: description.into(),
            details,
            detected_at: Utc::now(),
            resolution: ResolutionStatus::Open,
        }
    }
}

/// Aggregated findings of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Every finding, in detection order.
    pub anomalies: Vec<Anomaly>,
}

impl ValidationReport {
    /// Empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a finding.
    pub fn push(&mut self, anomaly: Anomaly) {
        self.anomalies.push(anomaly);
    }

    /// Appends another report's findings.
    pub fn merge(&mut self, other: Self) {
        self.anomalies.extend(other.anomalies);
    }

    /// Valid iff no BLOCKING or ERROR finding.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.anomalies.iter().any(|a| a.severity.is_failing())
    }

    /// BLOCKING and ERROR findings.
    pub fn failing(&self) -> impl Iterator<Item = &Anomaly> {
        self.anomalies.iter().filter(|a| a.severity.is_failing())
    }

    /// Number of findings with `severity`.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.anomalies.iter().filter(|a| a.severity == severity).count()
    }

    /// Findings produced by `rule`.
    pub fn by_rule(&self, rule: AnomalyRule) -> impl Iterator<Item = &Anomaly> {
        self.anomalies.iter().filter(move |a| a.rule == rule)
    }

    /// Total number of findings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.anomalies.len()
    }

    /// Returns true if nothing was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }
}
