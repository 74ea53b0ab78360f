//! Run the same scenario once per policy.
//!
//! Runs are fully independent: each builds its own scheduler and controller
//! from the shared read-only [`Scenario`].  With the `parallel` feature they
//! execute on Rayon's thread pool; results come back in `policies` order
//! either way, and are identical between the two modes for the same seed.

use mc_carpark::Policy;
use mc_core::CarparkConfig;

use crate::{ArrivalSchedule, Sim, SimBuilder, SimConfig, SimObserver, SimResult, SimSummary, StaySampler};

/// Everything a run needs except the policy.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub sim:      SimConfig,
    pub layout:   CarparkConfig,
    /// Layout used for [`Policy::Cache`] runs.  `None` uses `layout`.
    pub cache_layout: Option<CarparkConfig>,
    pub arrivals: ArrivalSchedule,
    pub stay:     StaySampler,
}

impl Scenario {
    pub fn layout_for(&self, policy: Policy) -> &CarparkConfig {
        match (&self.cache_layout, policy) {
            (Some(cache), Policy::Cache) => cache,
            _ => &self.layout,
        }
    }

    pub fn build(&self, policy: Policy) -> SimResult<Sim> {
        SimBuilder::new(self.sim.clone(), self.layout_for(policy).clone(), policy)
            .arrivals(self.arrivals.clone())
            .stay(self.stay.clone())
            .build()
    }

    /// Build and run one policy with a fresh observer.
    pub fn run<O: SimObserver>(&self, policy: Policy, mut observer: O) -> SimResult<(SimSummary, O)> {
        let mut sim = self.build(policy)?;
        let summary = sim.run(&mut observer)?;
        Ok((summary, observer))
    }
}

/// Outcome of one policy's run.
#[derive(Debug)]
pub struct PolicyRun<O> {
    pub policy: Policy,
    pub result: SimResult<(SimSummary, O)>,
}

/// Run `scenario` once for each policy, giving each run the observer
/// `make_observer` returns for it.
#[cfg(not(feature = "parallel"))]
pub fn compare<O, F>(scenario: &Scenario, policies: &[Policy], make_observer: F) -> Vec<PolicyRun<O>>
where
    O: SimObserver,
    F: Fn(Policy) -> O,
{
    policies
        .iter()
        .map(|&policy| PolicyRun { policy, result: scenario.run(policy, make_observer(policy)) })
        .collect()
}

/// Run `scenario` once for each policy, giving each run the observer
/// `make_observer` returns for it.
#[cfg(feature = "parallel")]
pub fn compare<O, F>(scenario: &Scenario, policies: &[Policy], make_observer: F) -> Vec<PolicyRun<O>>
where
    O: SimObserver + Send,
    F: Fn(Policy) -> O + Sync,
{
    use rayon::prelude::*;

    policies
        .par_iter()
        .map(|&policy| PolicyRun { policy, result: scenario.run(policy, make_observer(policy)) })
        .collect()
}
