//! Reusable, abortable two-party barrier with phase tags.
//!
//! Each `wait` names the [`Phase`] it closes. Both parties must name the
//! same phase; arriving at different phases means the two loops went out of
//! step, which aborts the barrier instead of silently pairing unrelated
//! waits.
//!
//! Once [`PhaseBarrier::abort`] is called every pending and future `wait`
//! returns [`BarrierError::Aborted`], so a thread that fails never leaves
//! its peer blocked.
//!
//! Completing a generation happens under the mutex, which gives every
//! write made before `wait` a happens-before edge to every read made after
//! the other party's `wait` returns.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Rendezvous points of one frame, plus the final one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Frame captured (barrier A).
    Captured,
    /// Both grayscale halves written (barrier B).
    GrayscaleDone,
    /// Both gradient halves written (barrier C).
    GradientDone,
    /// Display done and termination decided (barrier D).
    Reported,
    /// Both threads left the frame loop.
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Captured => "captured",
            Phase::GrayscaleDone => "grayscale-done",
            Phase::GradientDone => "gradient-done",
            Phase::Reported => "reported",
            Phase::Finished => "finished",
        })
    }
}

/// Barrier failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BarrierError {
    /// The barrier was aborted by a failing thread.
    #[error("barrier aborted by peer thread")]
    Aborted,

    /// The two parties arrived at different phases.
    #[error("phase mismatch: peer waiting at {waiting}, arrived at {arrived}")]
    PhaseMismatch {
        /// Phase the first party is waiting at
        waiting: Phase,
        /// Phase the second party arrived at
        arrived: Phase,
    },
}

#[derive(Debug)]
struct State {
    arrived: usize,
    generation: u64,
    waiting_at: Option<Phase>,
    aborted: bool,
}

/// Barrier for a fixed number of parties.
#[derive(Debug)]
pub struct PhaseBarrier {
    parties: usize,
    state: Mutex<State>,
    cvar: Condvar,
}

impl PhaseBarrier {
    /// Creates a barrier for `parties` threads (at least 1).
    pub fn new(parties: usize) -> Self {
        Self {
            parties: parties.max(1),
            state: Mutex::new(State {
                arrived: 0,
                generation: 0,
                waiting_at: None,
                aborted: false,
            }),
            cvar: Condvar::new(),
        }
    }

    /// Number of parties.
    pub fn parties(&self) -> usize {
        self.parties
    }

    // No code panics while holding the lock, so a poisoned state is still
    // consistent.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until every party has called `wait` with the same `phase`.
    ///
    /// # Errors
    ///
    /// [`BarrierError::Aborted`] if the barrier is or becomes aborted before
    /// this generation completes; [`BarrierError::PhaseMismatch`] if a party
    /// is already waiting at a different phase (this also aborts the barrier).
    pub fn wait(&self, phase: Phase) -> Result<(), BarrierError> {
        let mut st = self.lock();
        if st.aborted {
            return Err(BarrierError::Aborted);
        }
        if let Some(waiting) = st.waiting_at {
            if waiting != phase {
                st.aborted = true;
                self.cvar.notify_all();
                return Err(BarrierError::PhaseMismatch {
                    waiting,
                    arrived: phase,
                });
            }
        }

        st.arrived += 1;
        if st.arrived == self.parties {
            st.arrived = 0;
            st.waiting_at = None;
            st.generation = st.generation.wrapping_add(1);
            trace!(%phase, generation = st.generation, "barrier released");
            self.cvar.notify_all();
            return Ok(());
        }

        st.waiting_at = Some(phase);
        let generation = st.generation;
        while st.generation == generation && !st.aborted {
            st = self.cvar.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
        if st.generation != generation {
            Ok(())
        } else {
            Err(BarrierError::Aborted)
        }
    }

    /// Aborts the barrier, waking every waiter. Idempotent.
    pub fn abort(&self) {
        let mut st = self.lock();
        if !st.aborted {
            debug!("barrier aborted");
            st.aborted = true;
            self.cvar.notify_all();
        }
    }

    /// True once [`abort`](Self::abort) has been called.
    pub fn is_aborted(&self) -> bool {
        self.lock().aborted
    }
}

/// Aborts the barrier if dropped during a panic.
pub(crate) struct AbortOnPanic<'a>(pub(crate) &'a PhaseBarrier);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_releases_both_parties_repeatedly() {
        let barrier = PhaseBarrier::new(2);
        let counter = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    for _ in 0..100 {
                        counter.fetch_add(1, Ordering::Relaxed);
                        barrier.wait(Phase::Captured).unwrap();
                        // both increments of this round are visible
                        assert!(counter.load(Ordering::Relaxed) % 2 == 0);
                        barrier.wait(Phase::Reported).unwrap();
                    }
                });
            }
        });
        assert_eq!(counter.load(Ordering::Relaxed), 200);
    }

    #[test]
    fn test_abort_wakes_waiter() {
        let barrier = PhaseBarrier::new(2);
        std::thread::scope(|s| {
            let waiter = s.spawn(|| barrier.wait(Phase::GrayscaleDone));
            std::thread::sleep(Duration::from_millis(20));
            barrier.abort();
            assert_eq!(waiter.join().unwrap(), Err(BarrierError::Aborted));
        });
        assert!(barrier.is_aborted());
        assert_eq!(barrier.wait(Phase::Captured), Err(BarrierError::Aborted));
    }

    #[test]
    fn test_phase_mismatch() {
        let barrier = PhaseBarrier::new(2);
        std::thread::scope(|s| {
            let waiter = s.spawn(|| barrier.wait(Phase::Captured));
            // make sure the first party is parked before arriving
            while barrier.lock().waiting_at.is_none() {
                std::thread::yield_now();
            }
            assert_eq!(
                barrier.wait(Phase::Reported),
                Err(BarrierError::PhaseMismatch {
                    waiting: Phase::Captured,
                    arrived: Phase::Reported,
                })
            );
            assert_eq!(waiter.join().unwrap(), Err(BarrierError::Aborted));
        });
    }

    #[test]
    fn test_single_party_never_blocks() {
        let barrier = PhaseBarrier::new(1);
        for _ in 0..3 {
            barrier.wait(Phase::Finished).unwrap();
        }
    }

    #[test]
    fn test_abort_on_panic_guard() {
        let barrier = PhaseBarrier::new(2);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = AbortOnPanic(&barrier);
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(barrier.is_aborted());

        let calm = PhaseBarrier::new(2);
        drop(AbortOnPanic(&calm));
        assert!(!calm.is_aborted());
    }
}
