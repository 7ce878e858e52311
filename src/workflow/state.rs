//! Run State
//!
//! Transient bookkeeping for one execution: the plan, how far the cursor has
//! advanced, and the outcome recorded for every node visited so far. A new
//! run always starts from a fresh state; nothing here is persisted.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use super::model::StepOutcome;

/// Per-run execution state owned by the engine.
#[derive(Debug, Clone)]
pub struct RunState {
    plan: Vec<String>,
    cursor: usize,
    outcomes: HashMap<String, StepOutcome>,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl RunState {
    /// Creates a state positioned before the first planned node.
    pub fn new(plan: Vec<String>) -> Self {
        Self {
            plan,
            cursor: 0,
            outcomes: HashMap::new(),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// The ordered node ids of this run.
    pub fn plan(&self) -> &[String] {
        &self.plan
    }

    /// Index of the next node to execute.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Id of the node under the cursor, if any remain.
    pub fn current(&self) -> Option<&str> {
        self.plan.get(self.cursor).map(String::as_str)
    }

    /// Records the outcome of the node under the cursor and advances.
    ///
    /// Returns `false` (and records nothing) once the plan is exhausted, so
    /// outcomes only ever exist for visited nodes.
    pub fn record(&mut self, outcome: StepOutcome) -> bool {
        let Some(node_id) = self.plan.get(self.cursor) else {
            return false;
        };

        self.outcomes.insert(node_id.clone(), outcome);
        self.cursor += 1;
        true
    }

    /// Outcome of a visited node.
    pub fn outcome(&self, node_id: &str) -> Option<&StepOutcome> {
        self.outcomes.get(node_id)
    }

    /// All recorded outcomes keyed by node id.
    pub fn outcomes(&self) -> &HashMap<String, StepOutcome> {
        &self.outcomes
    }

    /// Consumes the state, returning the recorded outcomes.
    pub fn into_outcomes(self) -> HashMap<String, StepOutcome> {
        self.outcomes
    }

    /// Returns true once every planned node has been visited.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.plan.len()
    }

    /// Percentage of planned nodes visited so far.
    pub fn progress(&self) -> f64 {
        if self.plan.is_empty() {
            return 100.0;
        }
        (self.cursor as f64 / self.plan.len() as f64) * 100.0
    }

    /// Wall-clock time the run started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time elapsed since the run started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
