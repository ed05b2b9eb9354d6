//! Minimal discrete-event engine.
//!
//! Events carry a real-valued timestamp (days, hours, whatever the model
//! uses). Agents react to each event in time order and may schedule further
//! events or spawn new agents. Events with equal timestamps are delivered in
//! the order they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub mod parallel;

struct Event<T> {
    t: f64,
    seq: u64,
    data: T,
}

impl<T> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Event<T> {}

impl<T> Ord for Event<T> {
    // Reversed so that BinaryHeap pops the earliest event first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .t
            .total_cmp(&self.t)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Event<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// What an agent hands back to the loop after reacting to an event
pub struct Response<T, S> {
    pub events: Vec<(f64, T)>,
    pub agents: Vec<Box<dyn Agent<T, S>>>,
}

impl<T, S> Response<T, S> {
    pub fn new() -> Response<T, S> {
        Response {
            events: Vec::new(),
            agents: Vec::new(),
        }
    }

    pub fn event(t: f64, data: T) -> Response<T, S> {
        Response {
            events: vec![(t, data)],
            agents: Vec::new(),
        }
    }
}

impl<T, S> Default for Response<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Agent<T, S> {
    fn act(&mut self, _current_t: f64, _data: &T) -> Response<T, S> {
        Response::new()
    }

    fn stats(&self) -> S;
}

pub struct EventLoop<T, S> {
    queue: BinaryHeap<Event<T>>,
    current_t: f64,
    next_seq: u64,
    agents: Vec<Box<dyn Agent<T, S>>>,
}

impl<T, S> EventLoop<T, S> {
    pub fn new(events: Vec<(f64, T)>, agents: Vec<Box<dyn Agent<T, S>>>) -> EventLoop<T, S> {
        let mut event_loop = EventLoop {
            queue: BinaryHeap::with_capacity(events.len()),
            current_t: 0.0,
            next_seq: 0,
            agents,
        };
        for (t, data) in events {
            event_loop.schedule(t, data);
        }
        event_loop
    }

    /// Time of the most recently delivered event
    pub fn current_t(&self) -> f64 {
        self.current_t
    }

    /// Number of events still waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn schedule(&mut self, t: f64, data: T) {
        // Nothing may be scheduled in the past.
        let t = if t < self.current_t { self.current_t } else { t };
        self.queue.push(Event {
            t,
            seq: self.next_seq,
            data,
        });
        self.next_seq += 1;
    }

    fn broadcast(&mut self) {
        if let Some(event) = self.queue.pop() {
            self.current_t = event.t;
            let mut new_events = Vec::new();
            let mut new_agents = Vec::new();
            for agent in &mut self.agents {
                let response = agent.act(self.current_t, &event.data);
                new_events.extend(response.events);
                new_agents.extend(response.agents);
            }
            for (t, data) in new_events {
                self.schedule(t, data);
            }
            self.agents.extend(new_agents);
        }
    }

    /// Deliver events in time order until the queue is empty or the next
    /// event lies strictly after `until`.
    pub fn run(&mut self, until: f64) {
        while let Some(next) = self.queue.peek() {
            if next.t > until || next.t.is_nan() {
                break;
            }
            self.broadcast();
        }
    }

    pub fn stats(&self) -> Vec<S> {
        self.agents.iter().map(|agent| agent.stats()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoddyAgent {}

    impl Agent<u8, usize> for NoddyAgent {
        fn stats(&self) -> usize {
            0
        }
    }

    /// Counts every event it sees
    struct Counter {
        seen: Vec<u8>,
    }

    impl Agent<u8, usize> for Counter {
        fn act(&mut self, _current_t: f64, data: &u8) -> Response<u8, usize> {
            self.seen.push(*data);
            Response::new()
        }

        fn stats(&self) -> usize {
            self.seen.len()
        }
    }

    #[test]
    fn min_queue() {
        let mut queue = BinaryHeap::<Event<u8>>::new();
        queue.push(Event {
            t: 2.5,
            seq: 0,
            data: 2,
        });
        queue.push(Event {
            t: 1.5,
            seq: 1,
            data: 1,
        });
        assert_eq!(queue.peek().map(|e| e.data), Some(1));
    }

    #[test]
    fn equal_times_pop_in_schedule_order() {
        let mut queue = BinaryHeap::<Event<u8>>::new();
        queue.push(Event {
            t: 1.0,
            seq: 0,
            data: 10,
        });
        queue.push(Event {
            t: 1.0,
            seq: 1,
            data: 11,
        });
        assert_eq!(queue.pop().map(|e| e.data), Some(10));
        assert_eq!(queue.pop().map(|e| e.data), Some(11));
    }

    #[test]
    fn noddy_run() {
        let agents: Vec<Box<dyn Agent<u8, usize>>> = vec![Box::new(NoddyAgent {})];
        let mut event_loop = EventLoop::new(vec![(1.0, 1), (2.0, 2)], agents);

        event_loop.run(10.0);

        assert_eq!(event_loop.current_t(), 2.0);
        assert_eq!(event_loop.pending(), 0);
    }

    #[test]
    fn run_stops_at_horizon() {
        let agents: Vec<Box<dyn Agent<u8, usize>>> = vec![Box::new(Counter { seen: vec![] })];
        let mut event_loop = EventLoop::new(vec![(1.0, 1), (2.0, 2), (2.5, 3)], agents);

        event_loop.run(2.0);

        // Event exactly on the horizon is delivered, the later one is not
        assert_eq!(event_loop.stats(), vec![2]);
        assert_eq!(event_loop.pending(), 1);
    }

    #[test]
    fn new_agent() {
        struct Spawner {}
        impl Agent<u8, usize> for Spawner {
            fn act(&mut self, _current_t: f64, _data: &u8) -> Response<u8, usize> {
                Response {
                    events: Vec::new(),
                    agents: vec![Box::new(Spawner {})],
                }
            }

            fn stats(&self) -> usize {
                1
            }
        }

        let agents: Vec<Box<dyn Agent<u8, usize>>> = vec![Box::new(Spawner {})];
        let mut event_loop = EventLoop::new(vec![(1.0, 1), (2.0, 2)], agents);

        event_loop.run(f64::INFINITY);

        // First event: 1 new agent
        // Second event: 2 new agents
        assert_eq!(event_loop.stats().len(), 4);
    }

    #[test]
    fn agents_can_chain_events() {
        struct Ticker {
            ticks: usize,
        }
        impl Agent<u8, usize> for Ticker {
            fn act(&mut self, current_t: f64, _data: &u8) -> Response<u8, usize> {
                self.ticks += 1;
                Response::event(current_t + 1.0, 0)
            }

            fn stats(&self) -> usize {
                self.ticks
            }
        }

        let agents: Vec<Box<dyn Agent<u8, usize>>> = vec![Box::new(Ticker { ticks: 0 })];
        let mut event_loop = EventLoop::new(vec![(0.0, 0)], agents);

        event_loop.run(4.5);

        // t = 0, 1, 2, 3, 4
        assert_eq!(event_loop.stats(), vec![5]);
        assert_eq!(event_loop.current_t(), 4.0);
    }

    #[test]
    fn past_events_are_clamped_to_now() {
        struct Backwards {
            times: Vec<f64>,
        }
        impl Agent<u8, Vec<f64>> for Backwards {
            fn act(&mut self, current_t: f64, data: &u8) -> Response<u8, Vec<f64>> {
                self.times.push(current_t);
                if *data == 0 {
                    Response::event(current_t - 5.0, 1)
                } else {
                    Response::new()
                }
            }

            fn stats(&self) -> Vec<f64> {
                self.times.clone()
            }
        }

        let agents: Vec<Box<dyn Agent<u8, Vec<f64>>>> = vec![Box::new(Backwards { times: vec![] })];
        let mut event_loop = EventLoop::new(vec![(3.0, 0)], agents);
        event_loop.run(10.0);

        assert_eq!(event_loop.stats(), vec![vec![3.0, 3.0]]);
    }
}
