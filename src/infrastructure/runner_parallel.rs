use std::sync::Arc;

use log::{error, info, warn};

use crate::{ProviderUpdater, StdResult, UpdateError};

/// A runner that executes provider updaters concurrently, one task per
/// updater, starting all of them before joining any.
pub struct ParallelRunner {
    /// Whether an unhandled fault in one updater terminates the whole run.
    fail_fast: bool,
}

impl ParallelRunner {
    /// Creates a new `ParallelRunner` instance.
    pub fn new(fail_fast: bool) -> Self {
        Self { fail_fast }
    }

    /// Runs all updaters to completion.
    ///
    /// With fail-fast mode on, the first updater error aborts the run. With
    /// fail-fast mode off, updater errors are confined to their unit and
    /// siblings continue, except authentication failures which are re-raised
    /// once every unit has finished.
    pub async fn run(&self, updaters: Vec<Arc<dyn ProviderUpdater>>) -> StdResult<()> {
        let mut handles = Vec::new();
        for updater in updaters {
            let handle = tokio::spawn(async move { (updater.provider(), updater.update().await) });
            handles.push(handle);
        }
        info!("Started {} provider updaters", handles.len());

        let mut fatal_error = None;
        for handle in handles {
            let (provider, result) = handle.await?;
            match result {
                Ok(()) => info!("Updated {provider} cache"),
                Err(e) => {
                    if self.fail_fast {
                        return Err(e);
                    }
                    let is_fatal = e
                        .downcast_ref::<UpdateError>()
                        .is_some_and(UpdateError::is_fatal);
                    if is_fatal {
                        error!("Fatal error updating {provider}: {e}");
                        fatal_error = Some(e);
                    } else {
                        warn!("Failed to update {provider}, skipping: {e}");
                    }
                }
            }
        }

        match fatal_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
