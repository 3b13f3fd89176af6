//! Forwarder-wide packet counters, built on the shared metrics primitives
//! (spec.md §4.8 pipelines reference `nInInterests` etc. throughout).

use rust_udcn_common::metrics::Counter;

#[derive(Default)]
pub struct ForwarderCounters {
    pub n_in_interests: Counter,
    pub n_out_interests: Counter,
    pub n_in_data: Counter,
    pub n_out_data: Counter,
    pub n_in_nacks: Counter,
    pub n_out_nacks: Counter,
    pub n_satisfied_interests: Counter,
    pub n_unsatisfied_interests: Counter,
}

impl ForwarderCounters {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForwarderCounterSnapshot {
    pub n_in_interests: u64,
    pub n_out_interests: u64,
    pub n_in_data: u64,
    pub n_out_data: u64,
    pub n_in_nacks: u64,
    pub n_out_nacks: u64,
    pub n_satisfied_interests: u64,
    pub n_unsatisfied_interests: u64,
}

impl ForwarderCounters {
    pub fn snapshot(&self) -> ForwarderCounterSnapshot {
        ForwarderCounterSnapshot {
            n_in_interests: self.n_in_interests.value(),
            n_out_interests: self.n_out_interests.value(),
            n_in_data: self.n_in_data.value(),
            n_out_data: self.n_out_data.value(),
            n_in_nacks: self.n_in_nacks.value(),
            n_out_nacks: self.n_out_nacks.value(),
            n_satisfied_interests: self.n_satisfied_interests.value(),
            n_unsatisfied_interests: self.n_unsatisfied_interests.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_increment() {
        let counters = ForwarderCounters::new();
        counters.n_in_interests.increment();
        counters.n_in_interests.increment();
        assert_eq!(counters.snapshot().n_in_interests, 2);
    }
}
