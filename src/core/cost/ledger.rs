//! Per-caller spend ledger

use super::types::{CostPeriod, PeriodUsage};
use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use std::collections::HashMap;

/// Start of the period containing `now`
pub(super) fn period_start(period: CostPeriod, now: DateTime<Utc>) -> DateTime<Utc> {
    let start = match period {
        CostPeriod::Hourly => Utc.with_ymd_and_hms(now.year(), now.month(), now.day(), now.hour(), 0, 0),
        CostPeriod::Daily => Utc.with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0),
        CostPeriod::Monthly => Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0),
    };
    start.single().unwrap_or(now)
}

/// Running totals within one period
#[derive(Debug, Clone)]
pub(super) struct PeriodTotals {
    pub(super) started: DateTime<Utc>,
    pub(super) cost: f64,
    pub(super) tokens: u64,
    pub(super) requests: u64,
}

impl PeriodTotals {
    fn new(started: DateTime<Utc>) -> Self {
        Self {
            started,
            cost: 0.0,
            tokens: 0,
            requests: 0,
        }
    }

    pub(super) fn usage(&self, limit: f64) -> PeriodUsage {
        PeriodUsage {
            cost: self.cost,
            tokens: self.tokens,
            requests: self.requests,
            limit,
        }
    }
}

/// Hourly, daily and monthly totals of one caller
#[derive(Debug, Clone)]
pub(super) struct CallerLedger {
    hourly: PeriodTotals,
    daily: PeriodTotals,
    monthly: PeriodTotals,
    /// Last firing time per (period, threshold ratio in basis points)
    pub(super) alerts_fired: HashMap<(CostPeriod, u32), DateTime<Utc>>,
}

impl CallerLedger {
    pub(super) fn new(now: DateTime<Utc>) -> Self {
        Self {
            hourly: PeriodTotals::new(period_start(CostPeriod::Hourly, now)),
            daily: PeriodTotals::new(period_start(CostPeriod::Daily, now)),
            monthly: PeriodTotals::new(period_start(CostPeriod::Monthly, now)),
            alerts_fired: HashMap::new(),
        }
    }

    pub(super) fn totals(&self, period: CostPeriod) -> &PeriodTotals {
        match period {
            CostPeriod::Hourly => &self.hourly,
            CostPeriod::Daily => &self.daily,
            CostPeriod::Monthly => &self.monthly,
        }
    }

    fn totals_mut(&mut self, period: CostPeriod) -> &mut PeriodTotals {
        match period {
            CostPeriod::Hourly => &mut self.hourly,
            CostPeriod::Daily => &mut self.daily,
            CostPeriod::Monthly => &mut self.monthly,
        }
    }

    /// Reset every period whose wall-clock boundary has been crossed
    pub(super) fn roll(&mut self, now: DateTime<Utc>) {
        for period in CostPeriod::ALL {
            let start = period_start(period, now);
            let totals = self.totals_mut(period);
            if totals.started != start {
                *totals = PeriodTotals::new(start);
            }
        }
    }

    /// Totals for `period` as of `now`, treating a stale period as empty
    pub(super) fn current(&self, period: CostPeriod, now: DateTime<Utc>) -> PeriodTotals {
        let totals = self.totals(period);
        if totals.started == period_start(period, now) {
            totals.clone()
        } else {
            PeriodTotals::new(period_start(period, now))
        }
    }

    pub(super) fn add(&mut self, cost: f64, tokens: u64) {
        for period in CostPeriod::ALL {
            let totals = self.totals_mut(period);
            totals.cost += cost;
            totals.tokens += tokens;
            totals.requests += 1;
        }
    }

    /// Apply a correction to the periods still containing `booked_at`
    pub(super) fn adjust(&mut self, booked_at: DateTime<Utc>, cost_delta: f64, token_delta: i64) {
        for period in CostPeriod::ALL {
            let start = period_start(period, booked_at);
            let totals = self.totals_mut(period);
            if totals.started == start {
                totals.cost = (totals.cost + cost_delta).max(0.0);
                totals.tokens = totals.tokens.saturating_add_signed(token_delta);
            }
        }
    }

    /// Undo a whole booking made at `booked_at`
    pub(super) fn refund(&mut self, booked_at: DateTime<Utc>, cost: f64, tokens: u64) {
        for period in CostPeriod::ALL {
            let start = period_start(period, booked_at);
            let totals = self.totals_mut(period);
            if totals.started == start {
                totals.cost = (totals.cost - cost).max(0.0);
                totals.tokens = totals.tokens.saturating_sub(tokens);
                totals.requests = totals.requests.saturating_sub(1);
            }
        }
    }

    /// Idle once every period is empty
    pub(super) fn is_idle(&self, now: DateTime<Utc>) -> bool {
        CostPeriod::ALL
            .iter()
            .all(|p| self.current(*p, now).requests == 0)
    }
}
