//! Background save writer
//!
//! Gateway calls run on a thread owned by one instance, so a slow store
//! holds up that thread and never the tick. At most one batch is in flight;
//! its outcomes come back over a channel and are collected by polling.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use tracing::{debug, error};

use super::{Pending, PersistenceGateway, WriteOutcome, write_batch};
use crate::world::PersistError;

/// Handle on an instance's save thread
#[derive(Debug)]
pub struct SaveWriter {
    jobs: Option<Sender<Vec<Pending>>>,
    results: Receiver<Vec<WriteOutcome>>,
    in_flight: Option<Vec<Pending>>,
}

impl SaveWriter {
    /// Start the writer thread. It exits once the handle is dropped and the
    /// batch it is working on is done.
    pub fn spawn(name: &str, gateway: Arc<dyn PersistenceGateway>) -> std::io::Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<Vec<Pending>>();
        let (result_tx, result_rx) = mpsc::channel();
        let thread_name = format!("{name}-saves");
        thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                for batch in job_rx {
                    let outcomes = write_batch(gateway.as_ref(), batch);
                    if result_tx.send(outcomes).is_err() {
                        break;
                    }
                }
                debug!(thread = %thread_name, "save writer stopped");
            })?;
        Ok(Self {
            jobs: Some(job_tx),
            results: result_rx,
            in_flight: None,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Operations handed over and not yet collected.
    pub fn in_flight(&self) -> usize {
        self.in_flight.as_ref().map_or(0, Vec::len)
    }

    /// Hand a batch to the thread. If the thread is gone the batch comes
    /// straight back as failures.
    pub(crate) fn submit(&mut self, batch: Vec<Pending>) -> Option<Vec<WriteOutcome>> {
        let Some(jobs) = &self.jobs else {
            return Some(failed(batch, "save writer closed"));
        };
        match jobs.send(batch.clone()) {
            Ok(()) => {
                self.in_flight = Some(batch);
                None
            }
            Err(mpsc::SendError(batch)) => {
                error!("save writer thread is gone");
                self.jobs = None;
                Some(failed(batch, "save writer stopped"))
            }
        }
    }

    /// Outcomes of the batch in flight, if it has finished.
    pub(crate) fn poll(&mut self) -> Option<Vec<WriteOutcome>> {
        self.in_flight.as_ref()?;
        match self.results.try_recv() {
            Ok(outcomes) => {
                self.in_flight = None;
                Some(outcomes)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => self.lost(),
        }
    }

    /// Like [`poll`](Self::poll) but waits up to `timeout`.
    pub(crate) fn wait(&mut self, timeout: Duration) -> Option<Vec<WriteOutcome>> {
        self.in_flight.as_ref()?;
        match self.results.recv_timeout(timeout) {
            Ok(outcomes) => {
                self.in_flight = None;
                Some(outcomes)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => self.lost(),
        }
    }

    /// Stop taking work and report the batch in flight as failed. Whatever
    /// the thread still finishes is ignored.
    pub(crate) fn abandon(&mut self) -> Vec<WriteOutcome> {
        self.jobs = None;
        self.in_flight
            .take()
            .map(|batch| failed(batch, "save writer timed out"))
            .unwrap_or_default()
    }

    fn lost(&mut self) -> Option<Vec<WriteOutcome>> {
        error!("save writer thread exited with a batch in flight");
        self.jobs = None;
        self.in_flight
            .take()
            .map(|batch| failed(batch, "save writer stopped"))
    }
}

fn failed(batch: Vec<Pending>, reason: &str) -> Vec<WriteOutcome> {
    batch
        .into_iter()
        .map(|pending| WriteOutcome {
            pending,
            result: Err(PersistError::Unavailable(reason.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{MemoryGateway, PersistOp, StatsRecord};
    use crate::player::PlayerId;

    const WAIT: Duration = Duration::from_secs(5);

    fn batch(level: u32) -> Vec<Pending> {
        vec![Pending {
            op: PersistOp::Stats(
                PlayerId(1),
                StatsRecord {
                    level,
                    xp: 0,
                    strength: 1,
                    dexterity: 1,
                    intelligence: 1,
                    vitality: 1,
                    skill_points: 0,
                },
            ),
            attempts: 0,
        }]
    }

    #[test]
    fn test_batch_round_trip() {
        let gw = Arc::new(MemoryGateway::new());
        let mut writer = SaveWriter::spawn("t", gw.clone()).unwrap();
        assert!(writer.poll().is_none());

        assert!(writer.submit(batch(2)).is_none());
        assert!(writer.is_busy());
        assert_eq!(writer.in_flight(), 1);

        let outcomes = writer.wait(WAIT).unwrap();
        assert!(outcomes[0].result.is_ok());
        assert!(!writer.is_busy());
        assert_eq!(gw.record(PlayerId(1)).unwrap().stats.unwrap().level, 2);
    }

    #[test]
    fn test_abandon_fails_the_batch_and_closes() {
        let gw = Arc::new(MemoryGateway::new());
        let mut writer = SaveWriter::spawn("t", gw).unwrap();
        writer.submit(batch(1));
        let outcomes = writer.abandon();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0].result, Err(PersistError::Unavailable(_))));

        let refused = writer.submit(batch(2)).unwrap();
        assert!(refused[0].result.is_err());
        assert!(!writer.is_busy());
    }
}
