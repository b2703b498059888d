//! ThresholdMonitor - decides when a sample warrants an out-of-cadence reduction

use crate::population::sampler::SampleResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdDecision {
    WithinLimit,
    Breach { count: usize, limit: usize },
}

/// Acts on a breach: cancel the reduction schedule, reduce immediately, re-arm.
pub trait BreachResponder {
    fn respond_to_breach(&self, count: usize, limit: usize);
}

/// Stateless: the only rate limit is the sampling cadence itself, because a
/// breach is re-evaluated only when the next sample arrives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdMonitor;

impl ThresholdMonitor {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, sample: &SampleResult, ceiling: usize) -> ThresholdDecision {
        if sample.count > ceiling {
            ThresholdDecision::Breach {
                count: sample.count,
                limit: ceiling,
            }
        } else {
            ThresholdDecision::WithinLimit
        }
    }

    /// Evaluate a sample and trigger the responder at most once on breach
    pub fn on_sample(
        &self,
        sample: &SampleResult,
        ceiling: usize,
        responder: &dyn BreachResponder,
    ) -> ThresholdDecision {
        let decision = self.evaluate(sample, ceiling);
        if let ThresholdDecision::Breach { count, limit } = decision {
            tracing::warn!(count, limit, "Entity count exceeded limit, triggering immediate cleanup");
            responder.respond_to_breach(count, limit);
        }
        decision
    }
}
