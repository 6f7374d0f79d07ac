//! Cost tracker: reservation, settlement, alerts and reports

use super::ledger::CallerLedger;
use super::pricing::PriceTable;
use super::sink::{NoopUsageSink, UsageSink};
use super::types::{
    CostAlert, CostDenial, CostPeriod, CostReservation, CustomerReport, PeriodUsage, UsageRecord,
};
use crate::config::{CostConfig, CostLimits};
use crate::core::providers::ProviderId;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, warn};

const MAX_RECENT_ALERTS: usize = 256;

/// Per-caller cost budget tracker
///
/// The ledger map is sharded, so concurrent requests only contend on the
/// caller they book against.
pub struct CostTracker {
    config: CostConfig,
    prices: PriceTable,
    ledgers: DashMap<String, CallerLedger>,
    alerts: Mutex<VecDeque<CostAlert>>,
    sink: Arc<dyn UsageSink>,
}

impl std::fmt::Debug for CostTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostTracker")
            .field("enabled", &self.config.enabled)
            .field("callers", &self.ledgers.len())
            .finish_non_exhaustive()
    }
}

impl CostTracker {
    pub fn new(config: CostConfig) -> Self {
        Self::with_sink(config, Arc::new(NoopUsageSink))
    }

    pub fn with_sink(config: CostConfig, sink: Arc<dyn UsageSink>) -> Self {
        Self {
            prices: PriceTable::from_config(&config),
            config,
            ledgers: DashMap::new(),
            alerts: Mutex::new(VecDeque::new()),
            sink,
        }
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn limits_for(&self, caller: &str) -> CostLimits {
        self.config.limits_for(caller)
    }

    /// Book the estimated cost of a call, or refuse it
    ///
    /// Alerts fired by this booking are returned alongside the reservation.
    pub fn reserve(
        &self,
        caller: &str,
        provider: ProviderId,
        model: &str,
        estimated_tokens: u64,
    ) -> Result<(CostReservation, Vec<CostAlert>), CostDenial> {
        self.reserve_at(caller, provider, model, estimated_tokens, Utc::now())
    }

    pub fn reserve_at(
        &self,
        caller: &str,
        provider: ProviderId,
        model: &str,
        estimated_tokens: u64,
        now: DateTime<Utc>,
    ) -> Result<(CostReservation, Vec<CostAlert>), CostDenial> {
        let estimated_cost = self.prices.cost(model, estimated_tokens);
        let limits = self.config.limits_for(caller);

        let mut ledger = match self.ledgers.get_mut(caller) {
            Some(l) => l,
            None => self
                .ledgers
                .entry(caller.to_string())
                .or_insert_with(|| CallerLedger::new(now)),
        };
        ledger.roll(now);

        if self.config.enabled {
            for period in CostPeriod::ALL {
                let spent = ledger.totals(period).cost;
                let limit = limit_of(&limits, period);
                if spent + estimated_cost > limit {
                    debug!(
                        caller,
                        %period,
                        spent,
                        requested = estimated_cost,
                        limit,
                        "Cost reservation denied"
                    );
                    return Err(CostDenial {
                        period,
                        spent,
                        requested: estimated_cost,
                        limit,
                    });
                }
            }
        }

        ledger.add(estimated_cost, estimated_tokens);
        let alerts = if self.config.enabled {
            self.collect_alerts(caller, &mut ledger, &limits, now)
        } else {
            Vec::new()
        };
        drop(ledger);

        for alert in &alerts {
            warn!(
                caller = %alert.caller,
                period = %alert.period,
                spent = alert.spent,
                limit = alert.limit,
                "Cost threshold of {:.0}% reached",
                alert.threshold_ratio * 100.0
            );
        }
        if !alerts.is_empty() {
            let mut recent = self.alerts.lock();
            for alert in &alerts {
                if recent.len() == MAX_RECENT_ALERTS {
                    recent.pop_front();
                }
                recent.push_back(alert.clone());
            }
        }

        Ok((
            CostReservation {
                caller: caller.to_string(),
                provider,
                model: model.to_string(),
                estimated_tokens,
                estimated_cost,
                reserved_at: now,
            },
            alerts,
        ))
    }

    fn collect_alerts(
        &self,
        caller: &str,
        ledger: &mut CallerLedger,
        limits: &CostLimits,
        now: DateTime<Utc>,
    ) -> Vec<CostAlert> {
        let ratio = self.config.alert_ratio;
        let ratio_key = (ratio * 10_000.0).round() as u32;
        let mut alerts = Vec::new();

        for period in CostPeriod::ALL {
            let spent = ledger.totals(period).cost;
            let limit = limit_of(limits, period);
            if spent < limit * ratio {
                continue;
            }
            let key = (period, ratio_key);
            let recently_fired = ledger
                .alerts_fired
                .get(&key)
                .is_some_and(|last| now - *last < ChronoDuration::hours(1));
            if recently_fired {
                continue;
            }
            ledger.alerts_fired.insert(key, now);
            alerts.push(CostAlert {
                caller: caller.to_string(),
                period,
                threshold_ratio: ratio,
                spent,
                limit,
                at: now,
            });
        }
        alerts
    }

    /// Replace the estimate with actual usage and write the usage record
    ///
    /// With no reported token count the estimate stands.
    pub async fn settle(&self, reservation: CostReservation, actual_tokens: Option<u64>) {
        let (tokens, cost, estimated) = match actual_tokens {
            Some(tokens) => (tokens, self.prices.cost(&reservation.model, tokens), false),
            None => (
                reservation.estimated_tokens,
                reservation.estimated_cost,
                true,
            ),
        };

        if !estimated {
            if let Some(mut ledger) = self.ledgers.get_mut(&reservation.caller) {
                ledger.adjust(
                    reservation.reserved_at,
                    cost - reservation.estimated_cost,
                    tokens as i64 - reservation.estimated_tokens as i64,
                );
            }
        }

        let record = UsageRecord {
            caller: reservation.caller,
            provider: reservation.provider,
            model: reservation.model,
            tokens,
            cost,
            estimated,
            at: Utc::now(),
        };
        if let Err(e) = self.sink.record(&record).await {
            error!("Failed to write usage record for {}: {}", record.caller, e);
        }
    }

    /// Return a reservation whose call never produced billable output
    pub fn release(&self, reservation: CostReservation) {
        if let Some(mut ledger) = self.ledgers.get_mut(&reservation.caller) {
            ledger.refund(
                reservation.reserved_at,
                reservation.estimated_cost,
                reservation.estimated_tokens,
            );
        }
    }

    pub fn customer_report(&self, caller: &str) -> CustomerReport {
        self.customer_report_at(caller, Utc::now())
    }

    pub fn customer_report_at(&self, caller: &str, now: DateTime<Utc>) -> CustomerReport {
        let limits = self.config.limits_for(caller);
        let usage = |period: CostPeriod| {
            self.ledgers
                .get(caller)
                .map(|l| l.current(period, now).usage(limit_of(&limits, period)))
                .unwrap_or_else(|| PeriodUsage {
                    limit: limit_of(&limits, period),
                    ..Default::default()
                })
        };

        CustomerReport {
            caller: caller.to_string(),
            hourly: usage(CostPeriod::Hourly),
            daily: usage(CostPeriod::Daily),
            monthly: usage(CostPeriod::Monthly),
            generated_at: now,
        }
    }

    /// Alerts fired recently, oldest first
    pub fn recent_alerts(&self) -> Vec<CostAlert> {
        self.alerts.lock().iter().cloned().collect()
    }

    /// Drop ledgers with nothing booked in any current period
    pub fn cleanup(&self) -> usize {
        let now = Utc::now();
        let before = self.ledgers.len();
        self.ledgers.retain(|_, ledger| !ledger.is_idle(now));
        before.saturating_sub(self.ledgers.len())
    }

    pub async fn flush(&self) {
        if let Err(e) = self.sink.flush().await {
            error!("Failed to flush usage sink: {}", e);
        }
    }
}

fn limit_of(limits: &CostLimits, period: CostPeriod) -> f64 {
    match period {
        CostPeriod::Hourly => limits.hourly,
        CostPeriod::Daily => limits.daily,
        CostPeriod::Monthly => limits.monthly,
    }
}
