use super::types::{Phase, ProjectionParams, ProjectionSummary, YearResult};

pub fn project(params: &ProjectionParams) -> Vec<YearResult> {
    let mut results = Vec::with_capacity(params.years as usize + 1);

    // Year 0 seeds the balance with one contribution already applied.
    let mut balance = params.nps_investment;
    results.push(YearResult {
        year: 0,
        value: round_unit(balance),
        phase: Phase::Investment,
        investment: params.nps_investment,
        payout: 0.0,
        returns: 0,
        returns_rate: 0.0,
        previous_value: 0,
    });

    for i in 0..params.years {
        let previous_value = balance;
        let returns_earned = previous_value * params.annual_return;
        balance = previous_value * (1.0 + params.annual_return);

        let mut investment = 0.0;
        if i < params.payment_term {
            investment = params.nps_investment;
            balance += params.nps_investment;
        }

        let year_number = i + 1;
        let mut payout = 0.0;

        // A present non-zero scheduled entry replaces the flat window for
        // this year; a zero entry falls through to the window.
        let scheduled = params
            .per_year_payouts
            .as_ref()
            .and_then(|schedule| schedule.get(&year_number))
            .copied()
            .filter(|amount| *amount != 0.0);
        if let Some(amount) = scheduled {
            payout += amount;
            balance += amount;
        } else if year_number >= params.payout_start && year_number <= params.payout_end {
            payout += params.payout_amount;
            balance += params.payout_amount;
        }

        // Lumpsum stacks on top of whichever payout applied this year.
        if year_number == params.lumpsum_year && params.lumpsum > 0.0 {
            payout += params.lumpsum;
            balance += params.lumpsum;
        }

        let phase = if i < params.payment_term {
            Phase::Investment
        } else {
            Phase::Secondary
        };

        let returns_rate = if previous_value > 0.0 {
            round_one_decimal((returns_earned / previous_value) * 100.0)
        } else {
            0.0
        };

        results.push(YearResult {
            year: year_number,
            value: round_unit(balance),
            phase,
            investment,
            payout,
            returns: round_unit(returns_earned),
            returns_rate,
            previous_value: round_unit(previous_value),
        });
    }

    results
}

pub fn summarize(params: &ProjectionParams, results: &[YearResult]) -> ProjectionSummary {
    let per_year = params
        .total_investment_per_year
        .unwrap_or(params.nps_investment);
    let total_invested = params.payment_term as f64 * per_year;
    let final_value = results.last().map(|r| r.value).unwrap_or(0);
    let absolute_returns = final_value as f64 - total_invested;

    let annualised_return_pct =
        if total_invested > 0.0 && params.years > 0 && final_value > 0 {
            let cagr = ((final_value as f64 / total_invested).powf(1.0 / params.years as f64)
                - 1.0)
                * 100.0;
            if cagr.is_finite() { cagr } else { 0.0 }
        } else {
            0.0
        };

    ProjectionSummary {
        total_invested,
        final_value,
        absolute_returns,
        annualised_return_pct,
    }
}

fn round_unit(value: f64) -> i64 {
    value.round() as i64
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
