/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::debug;
use std::sync::Arc;
use std::thread::Builder;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::ElevatorConfig;
use crate::dispatcher::Dispatcher;
use crate::elevator::fsm::{ElevatorWorker, WorkerSummary};
use crate::shared::Error;

/**
 * The elevator threads of one run.
 *
 * Every worker reports its outcome on `result_rx` when its loop ends, so a
 * halted elevator is seen at once even while the others are still blocked
 * waiting for work that will never finish.
 *
 * # Fields
 * - `n_workers`:   Number of elevator threads started.
 * - `result_rx`:   One `Result` per worker, in the order they stop.
 */
pub struct ElevatorPool {
    n_workers: usize,
    result_rx: cbc::Receiver<Result<WorkerSummary, Error>>,
}

impl ElevatorPool {
    /// Starts `config.n_elevators` named worker threads on `dispatcher`.
    pub fn spawn(config: &ElevatorConfig, dispatcher: &Arc<Dispatcher>) -> Result<ElevatorPool, Error> {
        let (result_tx, result_rx) = cbc::unbounded::<Result<WorkerSummary, Error>>();

        for id in 0..config.n_elevators {
            let worker = ElevatorWorker::new(id, config, Arc::clone(dispatcher));
            let result_tx = result_tx.clone();
            Builder::new()
                .name(format!("elevator_{}", id))
                .spawn(move || {
                    let _ = result_tx.send(worker.run());
                })
                .map_err(|e| Error::Worker(format!("failed to start elevator {}: {}", id, e)))?;
        }

        Ok(ElevatorPool {
            n_workers: config.n_elevators,
            result_rx,
        })
    }

    /**
     * Waits for every worker to stop, sorted by worker id.
     *
     * Returns the first error reported without waiting for the rest; the
     * remaining threads are left blocked and the caller is expected to exit.
     */
    pub fn join(self) -> Result<Vec<WorkerSummary>, Error> {
        let mut summaries = Vec::with_capacity(self.n_workers);
        while summaries.len() < self.n_workers {
            match self.result_rx.recv() {
                Ok(Ok(summary)) => {
                    debug!("Elevator {} stopped after {} requests", summary.worker, summary.completed);
                    summaries.push(summary);
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    return Err(Error::Worker(format!(
                        "{} elevator(s) stopped without reporting",
                        self.n_workers - summaries.len()
                    )))
                }
            }
        }
        summaries.sort_by_key(|s| s.worker);
        Ok(summaries)
    }
}
