use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Trade;

/// Aggregate performance statistics for one trader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub total_trades: i64,
    pub wins: i64,
    pub losses: i64,
    pub total_profit: Decimal,
    pub total_loss: Decimal,
    pub win_probability: Decimal,
    pub loss_probability: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub expectancy: Decimal,
    pub capital: Decimal,
}

/// Compute the report for a set of trades that is already filtered to one
/// owner and stripped of cancelled entries.
pub fn build_report(trades: &[Trade], starting_capital: Decimal) -> Report {
    let results: Vec<Decimal> = trades.iter().map(Trade::pnl).collect();
    summarize(&results, starting_capital)
}

/// Same as [`build_report`] over bare P/L values.
pub fn summarize(results: &[Decimal], starting_capital: Decimal) -> Report {
    let wins: Vec<Decimal> = results.iter().copied().filter(|p| *p > Decimal::ZERO).collect();
    let losses: Vec<Decimal> = results.iter().copied().filter(|p| *p < Decimal::ZERO).collect();
    let total = results.len() as i64;

    let total_profit = saturating_sum(&wins);
    let total_loss = saturating_sum(&losses);

    let win_probability = percentage(wins.len() as i64, total);
    let loss_probability = percentage(losses.len() as i64, total);

    let avg_win = mean(total_profit, wins.len());
    let avg_loss = mean(total_loss, losses.len());

    Report {
        total_trades: total,
        wins: wins.len() as i64,
        losses: losses.len() as i64,
        total_profit,
        total_loss,
        win_probability,
        loss_probability,
        avg_win,
        avg_loss,
        expectancy: expectancy(avg_win, win_probability, avg_loss, loss_probability),
        capital: starting_capital.saturating_add(saturating_sum(results)),
    }
}

/// Probability-weighted mean outcome:
/// `avg_win × P(win) + avg_loss × P(loss)`, probabilities given in percent.
///
/// This is not the loss-normalized expectancy from trading literature. Reports
/// already issued use this definition, so it must not change.
///
/// Probabilities are scaled to fractions before multiplying, so each term is
/// bounded by its average; the final sum saturates at the `Decimal` range.
pub fn expectancy(
    avg_win: Decimal,
    win_probability: Decimal,
    avg_loss: Decimal,
    loss_probability: Decimal,
) -> Decimal {
    let win_term = avg_win.saturating_mul(win_probability / Decimal::ONE_HUNDRED);
    let loss_term = avg_loss.saturating_mul(loss_probability / Decimal::ONE_HUNDRED);
    win_term.saturating_add(loss_term)
}

/// Sum that clamps to `Decimal::MAX` / `Decimal::MIN` instead of overflowing.
fn saturating_sum(values: &[Decimal]) -> Decimal {
    values
        .iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v))
}

fn percentage(count: i64, total: i64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(count) * Decimal::ONE_HUNDRED / Decimal::from(total)
}

fn mean(sum: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    sum / Decimal::from(count as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn test_empty_report() {
        let report = summarize(&[], d(1_000));
        assert_eq!(report.total_trades, 0);
        assert_eq!(report.total_profit, Decimal::ZERO);
        assert_eq!(report.total_loss, Decimal::ZERO);
        assert_eq!(report.win_probability, Decimal::ZERO);
        assert_eq!(report.loss_probability, Decimal::ZERO);
        assert_eq!(report.avg_win, Decimal::ZERO);
        assert_eq!(report.avg_loss, Decimal::ZERO);
        assert_eq!(report.expectancy, Decimal::ZERO);
        assert_eq!(report.capital, d(1_000));
    }

    #[test]
    fn test_mixed_results() {
        // wins: 100, 50 ; losses: -30 ; flat: 0
        let report = summarize(&[d(100), d(-30), d(0), d(50)], d(1_000));

        assert_eq!(report.total_trades, 4);
        assert_eq!(report.wins, 2);
        assert_eq!(report.losses, 1);
        assert_eq!(report.total_profit, d(150));
        assert_eq!(report.total_loss, d(-30));
        assert_eq!(report.win_probability, d(50));
        assert_eq!(report.loss_probability, d(25));
        assert_eq!(report.avg_win, d(75));
        assert_eq!(report.avg_loss, d(-30));
        // 75 × 0.5 + (-30) × 0.25 = 37.5 - 7.5 = 30
        assert_eq!(report.expectancy, d(30));
        assert_eq!(report.capital, d(1_120));
    }

    #[test]
    fn test_flat_trades_count_toward_total_only() {
        let report = summarize(&[d(0), d(0), d(10), d(-10)], d(500));
        assert_eq!(report.total_trades, 4);
        assert_eq!(report.win_probability + report.loss_probability, d(50));
        assert_eq!(report.capital, d(500));
    }

    #[test]
    fn test_probabilities_sum_to_hundred_without_flat_trades() {
        let report = summarize(&[d(5), d(-2), d(7), d(-1)], Decimal::ZERO);
        assert_eq!(report.win_probability + report.loss_probability, d(100));
    }

    #[test]
    fn test_buckets_partition_total_pnl() {
        let results = [d(12), d(-4), d(0), d(-8), d(3), d(0)];
        let report = summarize(&results, Decimal::ZERO);
        let total: Decimal = results.iter().copied().sum();
        assert_eq!(report.total_profit + report.total_loss, total);
        assert!(report.total_profit >= Decimal::ZERO);
        assert!(report.total_loss <= Decimal::ZERO);
    }

    #[test]
    fn test_expectancy_is_probability_weighted_mean() {
        // 1 win of 300, 2 losses of -100 each
        let report = summarize(&[d(300), d(-100), d(-100)], Decimal::ZERO);
        // mean outcome (300 - 200) / 3
        let expected = d(100) / d(3);
        assert!((report.expectancy - expected).abs() < Decimal::new(1, 20));
    }

    #[test]
    fn test_huge_single_win_does_not_overflow() {
        let huge = Decimal::from_str("1000000000000000000000000000").unwrap();
        let report = summarize(&[huge], Decimal::ZERO);

        assert_eq!(report.win_probability, d(100));
        assert_eq!(report.avg_win, huge);
        assert_eq!(report.expectancy, huge);
        assert_eq!(report.capital, huge);
    }

    #[test]
    fn test_totals_saturate_beyond_decimal_range() {
        let big = Decimal::from_str("50000000000000000000000000000").unwrap();

        let gains = summarize(&[big, big], d(1_000));
        assert_eq!(gains.total_profit, Decimal::MAX);
        assert_eq!(gains.capital, Decimal::MAX);
        assert!(gains.expectancy > Decimal::ZERO);

        let drawdown = summarize(&[-big, -big, d(10)], Decimal::ZERO);
        assert_eq!(drawdown.total_loss, Decimal::MIN);
        assert_eq!(drawdown.capital, Decimal::MIN + d(10));
        assert!(drawdown.expectancy < Decimal::ZERO);
    }

    #[test]
    fn test_report_is_deterministic() {
        let results = [d(42), d(-17), d(0), d(9)];
        assert_eq!(summarize(&results, d(250)), summarize(&results, d(250)));
    }

    #[test]
    fn test_unrecorded_pnl_counts_as_flat() {
        let trade = Trade {
            id: uuid::Uuid::new_v4(),
            owner_id: uuid::Uuid::new_v4(),
            date: None,
            pair: None,
            system: None,
            action: None,
            risk: None,
            risk_percent: None,
            lots: None,
            entry: None,
            sl1_pips: None,
            tp1_pips: None,
            sl2_pips: None,
            tp2_pips: None,
            cancelled: false,
            profit_or_loss: None,
            comments: None,
            instrument_name: None,
            isin: None,
            currency: None,
            operation_type: None,
            sign: None,
            quantity: None,
            exchange_rate: None,
            gross_amount: None,
            commission_fund: None,
            commission_bank: None,
            commission_sgr: None,
            commission_admin: None,
            created_at: None,
        };
        let report = build_report(&[trade], d(1_000));
        assert_eq!(report.total_trades, 1);
        assert_eq!(report.wins + report.losses, 0);
        assert_eq!(report.capital, d(1_000));
    }
}
