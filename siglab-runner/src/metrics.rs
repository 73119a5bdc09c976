//! Metrics aggregator: risk/return statistics, breakdowns, and the equity
//! curve for one simulated trade set.
//!
//! Every statistic defaults to zero or empty on an empty trade set; the
//! aggregator never fails. `profit_factor` is the one value that can be
//! infinite (wins with zero losing value); it serializes as JSON null.

use chrono::{Datelike, DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use siglab_core::domain::Side;

use crate::backtest::{BacktestParams, SimulatedTrade};

// ─── Small numeric helpers ───────────────────────────────────────────

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Quantile with linear interpolation between order statistics; `q` in [0, 1].
pub(crate) fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            if lo == hi {
                sorted[lo]
            } else {
                sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
            }
        }
    }
}

// ─── Report pieces ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideSummary {
    pub trades: usize,
    pub net_return_sum: f64,
    pub hit_rate: f64,
    pub avg_return: f64,
    pub avg_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideBreakdown {
    pub buy: SideSummary,
    pub sell: SideSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdaySummary {
    pub day: String,
    pub trades: usize,
    pub net_return_sum: f64,
    pub hit_rate: f64,
    pub avg_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeSummary {
    pub vol_regime: String,
    pub trend_regime: String,
    pub trades: usize,
    pub net_return_sum: f64,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBucket {
    pub bucket: String,
    pub trades: usize,
    pub net_return_avg: f64,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streaks {
    pub longest_win: usize,
    pub longest_loss: usize,
}

/// Time in market, assuming 15-minute base bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Exposure {
    pub bars: usize,
    pub minutes: f64,
    pub hours: f64,
    pub days: f64,
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnQuantiles {
    pub p05: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

/// Additive equity curve point (running sum of net_value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub time: DateTime<Utc>,
    pub net_value: f64,
}

/// Recent-trade snapshot kept on the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSnapshot {
    pub time: DateTime<Utc>,
    pub side: Side,
    pub score: f64,
    pub fwd_return: f64,
    pub gross_return: f64,
    pub net_return: f64,
    pub gross_value: f64,
    pub net_value: f64,
}

/// Bootstrap confidence interval over hit_rate and expectancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BootstrapInterval {
    pub samples: usize,
    pub hit_rate_low: f64,
    pub hit_rate_high: f64,
    pub expectancy_low: f64,
    pub expectancy_high: f64,
}

/// Full backtest report for one (symbol, parameter set) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Content hash of the run inputs, for artifact naming and dedup.
    pub run_id: String,
    pub symbol: String,
    pub threshold: f64,
    pub limit: usize,
    pub horizon: usize,
    pub commission_bps: f64,
    pub slippage_bps: f64,
    pub position_size: f64,
    pub mode: crate::backtest::ExecutionMode,
    pub tie_break: crate::backtest::TieBreak,
    pub cost_return: f64,

    pub trades: usize,
    pub gross_value_sum: f64,
    pub net_value_sum: f64,
    pub gross_return_sum: f64,
    pub net_return_sum: f64,
    pub hit_rate: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub expectancy: f64,
    pub profit_factor: f64,
    pub win_loss_ratio: f64,
    pub median_return: f64,
    pub return_std: f64,
    pub return_quantiles: ReturnQuantiles,

    pub side_breakdown: SideBreakdown,
    pub weekday_breakdown: Vec<WeekdaySummary>,
    pub regime_metrics: Vec<RegimeSummary>,
    pub score_buckets: Vec<ScoreBucket>,
    pub streaks: Streaks,
    pub exposure: Exposure,

    pub history: Vec<TradeSnapshot>,
    pub equity_curve: Vec<EquityPoint>,
    pub bootstrap: Option<BootstrapInterval>,
}

// ─── Bucketing ───────────────────────────────────────────────────────

fn vol_regime(atr_pct: Option<f64>) -> &'static str {
    match atr_pct {
        Some(p) if p <= 0.01 => "low",
        Some(p) if p <= 0.02 => "medium",
        Some(_) => "high",
        None => "unknown",
    }
}

fn trend_regime(adx: Option<f64>) -> &'static str {
    if adx.map(|a| a >= 20.0).unwrap_or(false) {
        "strong"
    } else {
        "weak"
    }
}

/// 0.1-wide score bins from 0.3 to 1.0; left-closed on the first bin,
/// right-closed elsewhere. Scores outside the range fall in "unknown".
fn score_bucket(score: f64) -> String {
    for i in 0..7 {
        let lo = 0.3 + 0.1 * i as f64;
        let hi = lo + 0.1;
        let in_bin = if i == 0 {
            score >= lo && score <= hi
        } else {
            score > lo && score <= hi
        };
        if in_bin {
            return format!("{lo:.1}-{hi:.1}");
        }
    }
    "unknown".to_string()
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

const WEEKDAY_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn group_hit_rate(group: &[&SimulatedTrade]) -> f64 {
    if group.is_empty() {
        0.0
    } else {
        group.iter().filter(|t| t.net_value > 0.0).count() as f64 / group.len() as f64
    }
}

// ─── Aggregation ─────────────────────────────────────────────────────

impl BacktestReport {
    /// Aggregate a simulated trade set into a report. `limit` is the number
    /// of requested base bars, used for the exposure ratio.
    pub fn compute(
        symbol: &str,
        params: &BacktestParams,
        limit: usize,
        trades: &[SimulatedTrade],
    ) -> Self {
        let n = trades.len();
        let net_returns: Vec<f64> = trades.iter().map(|t| t.net_return).collect();

        let hit_rate = if n > 0 {
            trades.iter().filter(|t| t.net_value > 0.0).count() as f64 / n as f64
        } else {
            0.0
        };

        let ret_std = std_dev(&net_returns);
        let sharpe = if n > 0 && ret_std > 1e-8 {
            (n as f64).sqrt() * mean(&net_returns) / ret_std
        } else {
            0.0
        };

        let downside: Vec<f64> = net_returns.iter().copied().filter(|r| *r < 0.0).collect();
        let downside_std = std_dev(&downside);
        let sortino = if !downside.is_empty() && downside_std > 1e-8 {
            mean(&net_returns) / downside_std
        } else {
            0.0
        };

        let wins: Vec<f64> = net_returns.iter().copied().filter(|r| *r > 0.0).collect();
        let losses: Vec<f64> = net_returns.iter().copied().filter(|r| *r < 0.0).collect();
        let avg_win = if wins.is_empty() { 0.0 } else { mean(&wins) };
        let avg_loss = if losses.is_empty() { 0.0 } else { mean(&losses) };

        // Compounded equity for drawdown, unlike the additive curve series
        let mut max_drawdown = 0.0f64;
        let mut equity = 1.0;
        let mut running_max = f64::NEG_INFINITY;
        for r in &net_returns {
            equity *= 1.0 + r;
            running_max = running_max.max(equity);
            max_drawdown = max_drawdown.min((equity - running_max) / running_max);
        }

        let wins_value: f64 = trades
            .iter()
            .map(|t| t.net_value)
            .filter(|v| *v > 0.0)
            .sum();
        let losses_value: f64 = trades
            .iter()
            .map(|t| t.net_value)
            .filter(|v| *v < 0.0)
            .sum();
        let profit_factor = if losses_value.abs() > 1e-12 {
            wins_value.abs() / losses_value.abs()
        } else if wins_value > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let win_loss_ratio = if avg_loss < -1e-12 && avg_win != 0.0 {
            (avg_win / avg_loss).abs()
        } else {
            0.0
        };

        let mut sorted = net_returns.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let return_quantiles = ReturnQuantiles {
            p05: percentile(&sorted, 0.05),
            p25: percentile(&sorted, 0.25),
            p50: percentile(&sorted, 0.50),
            p75: percentile(&sorted, 0.75),
            p95: percentile(&sorted, 0.95),
        };

        let side_breakdown = SideBreakdown {
            buy: Self::side_summary(trades, Side::Buy),
            sell: Self::side_summary(trades, Side::Sell),
        };

        let mut weekday_breakdown = Vec::new();
        for day in WEEKDAY_ORDER {
            let group: Vec<&SimulatedTrade> =
                trades.iter().filter(|t| t.ts.weekday() == day).collect();
            if group.is_empty() {
                continue;
            }
            let returns: Vec<f64> = group.iter().map(|t| t.net_return).collect();
            weekday_breakdown.push(WeekdaySummary {
                day: weekday_name(day).to_string(),
                trades: group.len(),
                net_return_sum: returns.iter().sum(),
                hit_rate: group_hit_rate(&group),
                avg_return: mean(&returns),
            });
        }

        let mut regime_metrics = Vec::new();
        for vol in ["low", "medium", "high", "unknown"] {
            for trend in ["strong", "weak"] {
                let group: Vec<&SimulatedTrade> = trades
                    .iter()
                    .filter(|t| vol_regime(t.atr_pct) == vol && trend_regime(t.adx) == trend)
                    .collect();
                if group.is_empty() {
                    continue;
                }
                regime_metrics.push(RegimeSummary {
                    vol_regime: vol.to_string(),
                    trend_regime: trend.to_string(),
                    trades: group.len(),
                    net_return_sum: group.iter().map(|t| t.net_return).sum(),
                    hit_rate: group_hit_rate(&group),
                });
            }
        }

        let mut bucket_labels: Vec<String> = (0..7)
            .map(|i| {
                let lo = 0.3 + 0.1 * i as f64;
                format!("{lo:.1}-{:.1}", lo + 0.1)
            })
            .collect();
        bucket_labels.push("unknown".to_string());
        let mut score_buckets = Vec::new();
        for label in bucket_labels {
            let group: Vec<&SimulatedTrade> = trades
                .iter()
                .filter(|t| score_bucket(t.score) == label)
                .collect();
            if group.is_empty() {
                continue;
            }
            let returns: Vec<f64> = group.iter().map(|t| t.net_return).collect();
            score_buckets.push(ScoreBucket {
                bucket: label,
                trades: group.len(),
                net_return_avg: mean(&returns),
                hit_rate: group_hit_rate(&group),
            });
        }

        let mut streaks = Streaks::default();
        let mut current_win = 0usize;
        let mut current_loss = 0usize;
        for t in trades {
            if t.net_value > 0.0 {
                current_win += 1;
                current_loss = 0;
                streaks.longest_win = streaks.longest_win.max(current_win);
            } else if t.net_value < 0.0 {
                current_loss += 1;
                current_win = 0;
                streaks.longest_loss = streaks.longest_loss.max(current_loss);
            } else {
                current_win = 0;
                current_loss = 0;
            }
        }

        let exposure_bars = n * params.horizon;
        let exposure_minutes = (exposure_bars * 15) as f64;
        let exposure = Exposure {
            bars: exposure_bars,
            minutes: exposure_minutes,
            hours: exposure_minutes / 60.0,
            days: exposure_minutes / 1440.0,
            ratio: if limit > 0 {
                exposure_bars as f64 / limit as f64
            } else {
                0.0
            },
        };

        let history = trades
            .iter()
            .rev()
            .take(100)
            .rev()
            .map(|t| TradeSnapshot {
                time: t.ts,
                side: t.side,
                score: t.score,
                fwd_return: t.fwd_return,
                gross_return: t.gross_return,
                net_return: t.net_return,
                gross_value: t.gross_value,
                net_value: t.net_value,
            })
            .collect();

        let equity_curve = trades
            .iter()
            .map(|t| EquityPoint {
                time: t.ts,
                net_value: t.cum_net_value,
            })
            .collect();

        let run_id = Self::run_id(symbol, params, limit);

        BacktestReport {
            run_id,
            symbol: symbol.to_string(),
            threshold: params.threshold,
            limit,
            horizon: params.horizon,
            commission_bps: params.commission_bps,
            slippage_bps: params.slippage_bps,
            position_size: params.position_size,
            mode: params.mode,
            tie_break: params.tie_break,
            cost_return: params.cost_return(),
            trades: n,
            gross_value_sum: trades.iter().map(|t| t.gross_value).sum(),
            net_value_sum: trades.iter().map(|t| t.net_value).sum(),
            gross_return_sum: trades.iter().map(|t| t.gross_return).sum(),
            net_return_sum: net_returns.iter().sum(),
            hit_rate,
            sharpe,
            sortino,
            max_drawdown,
            avg_win,
            avg_loss,
            expectancy: mean(&net_returns),
            profit_factor,
            win_loss_ratio,
            median_return: percentile(&sorted, 0.50),
            return_std: ret_std,
            return_quantiles,
            side_breakdown,
            weekday_breakdown,
            regime_metrics,
            score_buckets,
            streaks,
            exposure,
            history,
            equity_curve,
            bootstrap: None,
        }
    }

    fn side_summary(trades: &[SimulatedTrade], side: Side) -> SideSummary {
        let group: Vec<&SimulatedTrade> = trades.iter().filter(|t| t.side == side).collect();
        if group.is_empty() {
            return SideSummary::default();
        }
        let returns: Vec<f64> = group.iter().map(|t| t.net_return).collect();
        let scores: Vec<f64> = group.iter().map(|t| t.score).collect();
        SideSummary {
            trades: group.len(),
            net_return_sum: returns.iter().sum(),
            hit_rate: group_hit_rate(&group),
            avg_return: mean(&returns),
            avg_score: mean(&scores),
        }
    }

    /// Deterministic content hash of the run inputs.
    fn run_id(symbol: &str, params: &BacktestParams, limit: usize) -> String {
        let payload = serde_json::json!({
            "symbol": symbol,
            "params": params,
            "limit": limit,
        });
        blake3::hash(payload.to_string().as_bytes()).to_hex().to_string()
    }
}
