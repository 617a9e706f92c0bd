use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Investment,
    Secondary,
    // Declared for consumers that switch on all three phase strings; the
    // engine currently never assigns it.
    Completed,
}

#[derive(Debug, Clone)]
pub struct ProjectionParams {
    pub payment_term: u32,
    pub payout_start: u32,
    pub payout_end: u32,
    pub payout_amount: f64,
    pub lumpsum: f64,
    pub lumpsum_year: u32,
    pub nps_investment: f64,
    pub total_investment_per_year: Option<f64>,
    pub years: u32,
    pub annual_return: f64,
    pub per_year_payouts: Option<BTreeMap<u32, f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearResult {
    pub year: u32,
    pub value: i64,
    pub phase: Phase,
    pub investment: f64,
    pub payout: f64,
    pub returns: i64,
    pub returns_rate: f64,
    pub previous_value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub total_invested: f64,
    pub final_value: i64,
    pub absolute_returns: f64,
    pub annualised_return_pct: f64,
}
