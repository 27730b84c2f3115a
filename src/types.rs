use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityStatus {
    #[default]
    Active,
    Executed,
    Expired,
    Insufficient,
}

impl OpportunityStatus {
    pub const ALL: [OpportunityStatus; 4] = [
        OpportunityStatus::Active,
        OpportunityStatus::Executed,
        OpportunityStatus::Expired,
        OpportunityStatus::Insufficient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityStatus::Active => "active",
            OpportunityStatus::Executed => "executed",
            OpportunityStatus::Expired => "expired",
            OpportunityStatus::Insufficient => "insufficient",
        }
    }
}

impl fmt::Display for OpportunityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpportunityStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OpportunityStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ServiceError::validation(format!("Unknown opportunity status: {}", s)))
    }
}

/// A mock arbitrage record: a hypothetical buy/sell spread between two DEXes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    #[serde(default = "generate_id")]
    pub id: String,
    pub token_pair: String,
    pub dex_buy: String,
    pub dex_sell: String,
    pub price_buy: f64,
    pub price_sell: f64,
    pub spread_percentage: f64,
    pub potential_profit: f64,
    pub loan_amount: f64,
    pub gas_cost: f64,
    pub net_profit: f64,
    #[serde(default)]
    pub status: OpportunityStatus,
    /// Seconds the opportunity stays actionable.
    pub execution_window: f64,
    /// 0-100
    pub confidence_score: f64,
    #[serde(default = "Utc::now")]
    pub created_date: DateTime<Utc>,
}

impl Opportunity {
    pub fn is_active(&self) -> bool {
        self.status == OpportunityStatus::Active
    }

    pub fn validate(&self) -> ServiceResult<()> {
        for (name, value) in [
            ("token_pair", &self.token_pair),
            ("dex_buy", &self.dex_buy),
            ("dex_sell", &self.dex_sell),
        ] {
            if value.trim().is_empty() {
                return Err(ServiceError::validation(format!("{} must not be empty", name)));
            }
        }

        for (name, value) in [
            ("price_buy", self.price_buy),
            ("price_sell", self.price_sell),
            ("spread_percentage", self.spread_percentage),
            ("potential_profit", self.potential_profit),
            ("loan_amount", self.loan_amount),
            ("gas_cost", self.gas_cost),
            ("net_profit", self.net_profit),
            ("execution_window", self.execution_window),
            ("confidence_score", self.confidence_score),
        ] {
            if !value.is_finite() {
                return Err(ServiceError::validation(format!("{} must be a finite number", name)));
            }
        }

        if self.execution_window <= 0.0 {
            return Err(ServiceError::validation(format!(
                "execution_window must be positive, got {}",
                self.execution_window
            )));
        }

        if !(0.0..=100.0).contains(&self.confidence_score) {
            return Err(ServiceError::validation(format!(
                "confidence_score must be within 0-100, got {}",
                self.confidence_score
            )));
        }

        Ok(())
    }
}

/// Per-token monitoring rule controlling which DEXes and thresholds are watched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "generate_id")]
    pub id: String,
    pub token_symbol: String,
    pub token_address: String,
    pub min_spread: f64,
    pub min_profit: f64,
    pub max_loan_amount: f64,
    pub enabled_dexs: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl MonitoringConfig {
    pub fn validate(&self) -> ServiceResult<()> {
        if self.token_symbol.trim().is_empty() {
            return Err(ServiceError::validation("token_symbol must not be empty"));
        }

        if self.enabled_dexs.is_empty() {
            return Err(ServiceError::validation(format!(
                "Config for {} must enable at least one DEX",
                self.token_symbol
            )));
        }

        if self.enabled_dexs.iter().any(|dex| dex.trim().is_empty()) {
            return Err(ServiceError::validation("enabled_dexs must not contain blank names"));
        }

        for (name, value) in [
            ("min_spread", self.min_spread),
            ("min_profit", self.min_profit),
            ("max_loan_amount", self.max_loan_amount),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ServiceError::validation(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// Running counters updated by executions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStats {
    pub total_executed: u64,
    pub total_profit: f64,
    // Never incremented; kept so the wire shape matches the dashboard.
    pub active_monitors: u64,
}
