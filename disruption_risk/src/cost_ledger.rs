use crate::{Event, Stats, TrialResult};
use des::{Agent, Response};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Each disruption costs the baseline scaled by a factor drawn from this range
pub const COST_MULTIPLIER: Range<f64> = 0.5..2.0;

/// Counts disruptions within the horizon and accrues their cost
pub struct CostLedger {
    baseline_cost: f64,
    rng: StdRng,
    disruption_count: usize,
    total_cost: f64,
}

impl CostLedger {
    pub fn new(baseline_cost: f64, seed: u64) -> Self {
        Self {
            baseline_cost,
            rng: StdRng::seed_from_u64(seed),
            disruption_count: 0,
            total_cost: 0.0,
        }
    }
}

impl Agent<Event, Stats> for CostLedger {
    fn act(&mut self, _current_t: f64, data: &Event) -> Response<Event, Stats> {
        if let Event::DisruptionOccurred = data {
            let multiplier = self.rng.random_range(COST_MULTIPLIER);
            self.disruption_count += 1;
            self.total_cost += self.baseline_cost * multiplier;
        }
        Response::new()
    }

    fn stats(&self) -> Stats {
        Stats::Ledger(TrialResult {
            disruption_count: self.disruption_count,
            total_cost: self.total_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_result(ledger: &CostLedger) -> TrialResult {
        match ledger.stats() {
            Stats::Ledger(result) => result,
            _ => panic!("Expected ledger stats"),
        }
    }

    #[test]
    fn test_trial_start_costs_nothing() {
        let mut ledger = CostLedger::new(150.0, 12345);
        let response = ledger.act(0.0, &Event::TrialStart);

        assert!(response.events.is_empty());
        assert_eq!(
            ledger_result(&ledger),
            TrialResult {
                disruption_count: 0,
                total_cost: 0.0
            }
        );
    }

    #[test]
    fn test_costs_stay_within_multiplier_bounds() {
        let mut ledger = CostLedger::new(100.0, 12345);

        for i in 0..1000 {
            let before = ledger_result(&ledger).total_cost;
            ledger.act(i as f64, &Event::DisruptionOccurred);
            let added = ledger_result(&ledger).total_cost - before;
            assert!((50.0 - 1e-9..=200.0 + 1e-9).contains(&added), "added {added}");
        }
        assert_eq!(ledger_result(&ledger).disruption_count, 1000);
    }

    #[test]
    fn test_average_multiplier_near_midpoint() {
        let mut ledger = CostLedger::new(1.0, 42);
        let n = 20_000;
        for _ in 0..n {
            ledger.act(0.0, &Event::DisruptionOccurred);
        }
        let mean_multiplier = ledger_result(&ledger).total_cost / n as f64;
        assert!((mean_multiplier - 1.25).abs() < 0.02);
    }

    #[test]
    fn test_zero_baseline_counts_without_cost() {
        let mut ledger = CostLedger::new(0.0, 1);
        ledger.act(1.0, &Event::DisruptionOccurred);
        ledger.act(2.0, &Event::DisruptionOccurred);

        let result = ledger_result(&ledger);
        assert_eq!(result.disruption_count, 2);
        assert_eq!(result.total_cost, 0.0);
    }
}
