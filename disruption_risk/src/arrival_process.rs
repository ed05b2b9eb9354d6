use crate::{ArrivalStats, Event, FittedDistribution, Stats};
use des::{Agent, Response};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Distribution;

/// Renewal process that schedules the next disruption
///
/// On trial start and after every disruption it draws the next gap and
/// schedules another disruption, as long as the current time is still short
/// of the horizon. The event loop only delivers disruptions at or before the
/// horizon, so the first arrival past it ends the trial.
pub struct ArrivalProcess {
    distribution: FittedDistribution,
    horizon_days: f64,
    rng: StdRng,
    draws: usize,
    last_scheduled_t: f64,
}

impl ArrivalProcess {
    pub fn new(distribution: FittedDistribution, horizon_days: f64, seed: u64) -> Self {
        Self {
            distribution,
            horizon_days,
            rng: StdRng::seed_from_u64(seed),
            draws: 0,
            last_scheduled_t: 0.0,
        }
    }

    fn schedule_next(&mut self, current_t: f64) -> Response<Event, Stats> {
        if current_t >= self.horizon_days {
            return Response::new();
        }
        let interval = self.distribution.sample(&mut self.rng);
        let next_t = current_t + interval;
        self.draws += 1;
        self.last_scheduled_t = next_t;
        Response::event(next_t, Event::DisruptionOccurred)
    }
}

impl Agent<Event, Stats> for ArrivalProcess {
    fn act(&mut self, current_t: f64, data: &Event) -> Response<Event, Stats> {
        match data {
            Event::TrialStart | Event::DisruptionOccurred => self.schedule_next(current_t),
        }
    }

    fn stats(&self) -> Stats {
        Stats::Arrivals(ArrivalStats {
            draws: self.draws,
            last_scheduled_t: self.last_scheduled_t,
        })
    }
}
