use chrono::{Duration, Utc};
use rand::{seq::SliceRandom, Rng};

use crate::types::{MonitoringConfig, Opportunity, OpportunityStatus};

const TOKEN_PAIRS: [&str; 6] = ["ETH/USDT", "BTC/USDT", "MATIC/USDT", "LINK/USDT", "UNI/USDT", "AAVE/USDT"];
const DEXES: [&str; 6] = ["Uniswap", "SushiSwap", "PancakeSwap", "QuickSwap", "1inch", "Balancer"];

/// The first opportunities generated are always active; the rest get a random status.
const GUARANTEED_ACTIVE: usize = 8;
const MINUTES_BETWEEN_OPPORTUNITIES: i64 = 5;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn generate_opportunities<R: Rng>(rng: &mut R, count: usize) -> Vec<Opportunity> {
    let now = Utc::now();

    (0..count)
        .map(|i| {
            let token_pair = TOKEN_PAIRS.choose(rng).copied().unwrap_or(TOKEN_PAIRS[0]);
            let dex_buy = DEXES.choose(rng).copied().unwrap_or(DEXES[0]);
            let sell_candidates: Vec<&str> = DEXES.iter().copied().filter(|dex| *dex != dex_buy).collect();
            let dex_sell = sell_candidates.choose(rng).copied().unwrap_or(DEXES[1]);

            let price_buy = round_to(1000.0 + rng.gen::<f64>() * 500.0, 2);
            let spread_percentage = round_to(0.5 + rng.gen::<f64>() * 3.0, 2);
            let price_sell = round_to(price_buy * (1.0 + spread_percentage / 100.0), 2);
            let loan_amount = round_to(10000.0 + rng.gen::<f64>() * 40000.0, 0);
            let gas_cost = round_to(50.0 + rng.gen::<f64>() * 200.0, 0);
            let potential_profit = round_to(loan_amount * spread_percentage / 100.0, 2);
            let net_profit = round_to(potential_profit - gas_cost, 2);

            let status = if i < GUARANTEED_ACTIVE {
                OpportunityStatus::Active
            } else {
                OpportunityStatus::ALL
                    .choose(rng)
                    .copied()
                    .unwrap_or(OpportunityStatus::Active)
            };

            Opportunity {
                id: format!("opp_{}", i + 1),
                token_pair: token_pair.to_string(),
                dex_buy: dex_buy.to_string(),
                dex_sell: dex_sell.to_string(),
                price_buy,
                price_sell,
                spread_percentage,
                potential_profit,
                loan_amount,
                gas_cost,
                net_profit,
                status,
                execution_window: round_to(30.0 + rng.gen::<f64>() * 120.0, 0),
                confidence_score: round_to(60.0 + rng.gen::<f64>() * 40.0, 1),
                created_date: now - Duration::minutes(i as i64 * MINUTES_BETWEEN_OPPORTUNITIES),
            }
        })
        .collect()
}

pub fn default_configs() -> Vec<MonitoringConfig> {
    vec![
        MonitoringConfig {
            id: "config_1".to_string(),
            token_symbol: "ETH".to_string(),
            token_address: "0x...".to_string(),
            min_spread: 0.5,
            min_profit: 100.0,
            max_loan_amount: 50000.0,
            enabled_dexs: vec!["Uniswap".to_string(), "SushiSwap".to_string(), "1inch".to_string()],
            is_active: true,
        },
        MonitoringConfig {
            id: "config_2".to_string(),
            token_symbol: "USDT".to_string(),
            token_address: "0x...".to_string(),
            min_spread: 0.3,
            min_profit: 50.0,
            max_loan_amount: 100000.0,
            enabled_dexs: vec!["Uniswap".to_string(), "PancakeSwap".to_string(), "QuickSwap".to_string()],
            is_active: true,
        },
    ]
}
