use chrono::{DateTime, Utc};
use std::{cmp::Ordering, fmt, str::FromStr};

use crate::{error::ServiceError, types::Opportunity};

/// Opportunity fields that can be used to order query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    TokenPair,
    DexBuy,
    DexSell,
    PriceBuy,
    PriceSell,
    SpreadPercentage,
    PotentialProfit,
    LoanAmount,
    GasCost,
    NetProfit,
    Status,
    ExecutionWindow,
    ConfidenceScore,
    CreatedDate,
}

enum SortKey<'a> {
    Text(&'a str),
    Number(f64),
    Timestamp(DateTime<Utc>),
}

impl SortKey<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Timestamp(a), SortKey::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl SortField {
    const NAMES: [(&'static str, SortField); 15] = [
        ("id", SortField::Id),
        ("token_pair", SortField::TokenPair),
        ("dex_buy", SortField::DexBuy),
        ("dex_sell", SortField::DexSell),
        ("price_buy", SortField::PriceBuy),
        ("price_sell", SortField::PriceSell),
        ("spread_percentage", SortField::SpreadPercentage),
        ("potential_profit", SortField::PotentialProfit),
        ("loan_amount", SortField::LoanAmount),
        ("gas_cost", SortField::GasCost),
        ("net_profit", SortField::NetProfit),
        ("status", SortField::Status),
        ("execution_window", SortField::ExecutionWindow),
        ("confidence_score", SortField::ConfidenceScore),
        ("created_date", SortField::CreatedDate),
    ];

    pub fn name(&self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, field)| field == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }

    fn key<'a>(&self, opportunity: &'a Opportunity) -> SortKey<'a> {
        match self {
            SortField::Id => SortKey::Text(&opportunity.id),
            SortField::TokenPair => SortKey::Text(&opportunity.token_pair),
            SortField::DexBuy => SortKey::Text(&opportunity.dex_buy),
            SortField::DexSell => SortKey::Text(&opportunity.dex_sell),
            SortField::PriceBuy => SortKey::Number(opportunity.price_buy),
            SortField::PriceSell => SortKey::Number(opportunity.price_sell),
            SortField::SpreadPercentage => SortKey::Number(opportunity.spread_percentage),
            SortField::PotentialProfit => SortKey::Number(opportunity.potential_profit),
            SortField::LoanAmount => SortKey::Number(opportunity.loan_amount),
            SortField::GasCost => SortKey::Number(opportunity.gas_cost),
            SortField::NetProfit => SortKey::Number(opportunity.net_profit),
            SortField::Status => SortKey::Text(opportunity.status.as_str()),
            SortField::ExecutionWindow => SortKey::Number(opportunity.execution_window),
            SortField::ConfidenceScore => SortKey::Number(opportunity.confidence_score),
            SortField::CreatedDate => SortKey::Timestamp(opportunity.created_date),
        }
    }

    pub fn compare(&self, a: &Opportunity, b: &Opportunity) -> Ordering {
        self.key(a).compare(&self.key(b))
    }
}

impl FromStr for SortField {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, field)| *field)
            .ok_or_else(|| ServiceError::validation(format!("Unknown sort field: {}", s)))
    }
}

/// A sort field plus direction, written `field` or `-field` (descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSpec {
    pub field: SortField,
    pub descending: bool,
}

impl OrderSpec {
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            descending: true,
        }
    }

    /// Stable: records with equal keys keep their relative order in both directions.
    pub fn sort(&self, opportunities: &mut [Opportunity]) {
        if self.descending {
            opportunities.sort_by(|a, b| self.field.compare(b, a));
        } else {
            opportunities.sort_by(|a, b| self.field.compare(a, b));
        }
    }
}

impl Default for OrderSpec {
    fn default() -> Self {
        Self::descending(SortField::CreatedDate)
    }
}

impl FromStr for OrderSpec {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix('-') {
            Some(field) => Ok(Self::descending(field.parse()?)),
            None => Ok(Self::ascending(s.parse()?)),
        }
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field.name())
        } else {
            f.write_str(self.field.name())
        }
    }
}
