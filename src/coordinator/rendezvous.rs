//! Abortable generation barrier.
//!
//! `std::sync::Barrier` cannot be released early, so a worker that fails
//! between two collectives would leave every other worker parked forever.
//! `Rendezvous` behaves like a barrier until `abort` is called; from then on
//! every pending and future `wait` returns `SimError::Aborted`.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::{Result, SimError};

#[derive(Debug, Default)]
struct Phase {
    arrived: usize,
    generation: u64,
    aborted_by: Option<usize>,
}

#[derive(Debug)]
pub struct Rendezvous {
    parties: usize,
    phase: Mutex<Phase>,
    cvar: Condvar,
}

impl Rendezvous {
    pub fn new(parties: usize) -> Self {
        assert!(parties > 0, "rendezvous needs at least one party");
        Self {
            parties,
            phase: Mutex::new(Phase::default()),
            cvar: Condvar::new(),
        }
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until all parties have arrived, or until the run is aborted.
    pub fn wait(&self) -> Result<()> {
        let mut phase = self.lock();
        if let Some(by) = phase.aborted_by {
            return Err(SimError::Aborted { by });
        }

        let generation = phase.generation;
        phase.arrived += 1;
        if phase.arrived == self.parties {
            phase.arrived = 0;
            phase.generation = phase.generation.wrapping_add(1);
            self.cvar.notify_all();
            return Ok(());
        }

        while phase.generation == generation && phase.aborted_by.is_none() {
            phase = self.cvar.wait(phase).unwrap_or_else(PoisonError::into_inner);
        }

        // a completed generation wins over an abort that landed afterwards
        match phase.aborted_by {
            Some(by) if phase.generation == generation => Err(SimError::Aborted { by }),
            _ => Ok(()),
        }
    }

    /// Release every waiter with an error. The first aborting rank is kept.
    pub fn abort(&self, rank: usize) {
        let mut phase = self.lock();
        if phase.aborted_by.is_none() {
            phase.aborted_by = Some(rank);
        }
        self.cvar.notify_all();
    }

    pub fn aborted_by(&self) -> Option<usize> {
        self.lock().aborted_by
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn single_party_never_blocks() {
        let r = Rendezvous::new(1);
        for _ in 0..3 {
            r.wait().unwrap();
        }
    }

    #[test]
    fn nobody_passes_before_everyone_arrives() {
        let r = Rendezvous::new(4);
        let arrived = AtomicUsize::new(0);

        crossbeam::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|_| {
                    for round in 1..=5 {
                        arrived.fetch_add(1, Ordering::SeqCst);
                        r.wait().unwrap();
                        assert!(arrived.load(Ordering::SeqCst) >= 4 * round);
                        r.wait().unwrap();
                    }
                });
            }
        })
        .unwrap();

        assert_eq!(arrived.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn abort_releases_waiters() {
        let r = Rendezvous::new(3);

        crossbeam::thread::scope(|s| {
            let waiters: Vec<_> = (0..2).map(|_| s.spawn(|_| r.wait())).collect();
            r.abort(2);
            for w in waiters {
                match w.join().unwrap() {
                    Err(SimError::Aborted { by }) => assert_eq!(by, 2),
                    other => panic!("expected abort, got {other:?}"),
                }
            }
        })
        .unwrap();

        assert!(matches!(r.wait(), Err(SimError::Aborted { by: 2 })));
    }

    #[test]
    fn first_abort_wins() {
        let r = Rendezvous::new(2);
        r.abort(1);
        r.abort(0);
        assert_eq!(r.aborted_by(), Some(1));
    }
}
