//! The reaper loop: delete targeted deployments one at a time.
//!
//! Deletions are strictly sequential with a fixed pause between them, which
//! keeps the request rate under the API's limits without a token bucket.
//! A failed deletion is final for the run; re-running re-lists the project
//! and picks up whatever survived.

use std::thread;
use std::time::Duration;

use crate::api::DeleteDeployment;
use crate::console::Console;
use crate::model::{DeploymentId, Outcome};

/// Running counts for one pass of the loop.
#[derive(Debug, Default)]
pub struct Tally {
    pub deleted: usize,
    pub failed: usize,
    pub outcomes: Vec<(DeploymentId, Outcome)>,
}

impl Tally {
    fn record(&mut self, id: &DeploymentId, outcome: Outcome) {
        if outcome.is_deleted() {
            self.deleted += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push((id.clone(), outcome));
    }

    pub fn processed(&self) -> usize {
        self.deleted + self.failed
    }
}

pub struct Reaper<'a, D> {
    api: &'a D,
    pause: Duration,
    progress_every: usize,
}

impl<'a, D: DeleteDeployment> Reaper<'a, D> {
    /// `progress_every` of zero is treated as one.
    pub fn new(api: &'a D, pause: Duration, progress_every: usize) -> Self {
        Self {
            api,
            pause,
            progress_every: progress_every.max(1),
        }
    }

    /// Delete each target exactly once, in order.
    pub fn run(&self, targets: &[DeploymentId], console: &mut Console) -> Tally {
        let total = targets.len();
        let mut tally = Tally::default();

        for (i, id) in targets.iter().enumerate() {
            if i > 0 {
                thread::sleep(self.pause);
            }

            let outcome = match self.api.delete(id) {
                Ok(()) => {
                    console.say(format!("✓ Deleted {id}"));
                    Outcome::Deleted
                }
                Err(e) => {
                    console.say(format!("✗ Failed to delete {id}"));
                    console.warn(format!("error: failed to delete {id}: {e}"));
                    Outcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            tracing::debug!(deployment = %id, deleted = outcome.is_deleted(), "deployment processed");
            tally.record(id, outcome);

            let processed = tally.processed();
            if processed % self.progress_every == 0 {
                console.say(format!(
                    "Progress: {processed}/{total} processed ({} deleted, {} failed)",
                    tally.deleted, tally.failed
                ));
            }
        }

        tally
    }
}
