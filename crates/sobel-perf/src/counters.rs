//! Counter sources.
//!
//! - [`HardwareCounters`] - `perf_event_open` group on Linux (cycles,
//!   instructions, L1D read misses) for the calling thread
//! - [`ClockCounters`] - monotonic clock, cycles estimated from a nominal
//!   frequency; instruction and miss counts stay zero
//!
//! Counters are per-thread: open them on the thread that will be measured.
//!
//! # Example
//!
//! ```rust
//! use sobel_perf::{open_counters, CounterMode, CounterSource};
//!
//! let mut counters = open_counters(CounterMode::Clock, 1.2e9).unwrap();
//! counters.start().unwrap();
//! let sample = counters.stop().unwrap();
//! assert_eq!(sample.instructions, 0);
//! ```

use crate::{PerfError, PerfResult, PerfSample};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, info, warn};

/// Source of per-phase counter deltas.
pub trait CounterSource {
    /// Short name for logs and the report.
    fn name(&self) -> &'static str;

    /// Zeroes and starts the counters.
    fn start(&mut self) -> PerfResult<()>;

    /// Stops the counters and returns the deltas since [`start`](Self::start).
    fn stop(&mut self) -> PerfResult<PerfSample>;

    /// Runs `f` between `start` and `stop`.
    fn measure<T, F>(&mut self, f: F) -> PerfResult<(T, PerfSample)>
    where
        Self: Sized,
        F: FnOnce() -> T,
    {
        self.start()?;
        let out = f();
        let sample = self.stop()?;
        Ok((out, sample))
    }
}

impl<C: CounterSource + ?Sized> CounterSource for Box<C> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn start(&mut self) -> PerfResult<()> {
        (**self).start()
    }

    fn stop(&mut self) -> PerfResult<PerfSample> {
        (**self).stop()
    }
}

/// Which counter source to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterMode {
    /// Hardware if available, clock otherwise.
    #[default]
    Auto,
    /// Hardware only; failing to open is an error.
    Hardware,
    /// Clock only.
    Clock,
}

impl fmt::Display for CounterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CounterMode::Auto => "auto",
            CounterMode::Hardware => "hardware",
            CounterMode::Clock => "clock",
        })
    }
}

impl FromStr for CounterMode {
    type Err = PerfError;

    fn from_str(s: &str) -> PerfResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(CounterMode::Auto),
            "hardware" | "hw" | "perf" => Ok(CounterMode::Hardware),
            "clock" | "time" => Ok(CounterMode::Clock),
            other => Err(PerfError::Parse(format!("unknown counter mode: {other}"))),
        }
    }
}

/// Opens a counter source for the calling thread.
///
/// `freq_hz` is only used by the clock source.
pub fn open_counters(mode: CounterMode, freq_hz: f64) -> PerfResult<Box<dyn CounterSource>> {
    match mode {
        CounterMode::Clock => Ok(Box::new(ClockCounters::new(freq_hz))),
        CounterMode::Hardware => open_hardware(),
        CounterMode::Auto => match open_hardware() {
            Ok(src) => Ok(src),
            Err(e) => {
                warn!("hardware counters unavailable, falling back to clock: {e}");
                Ok(Box::new(ClockCounters::new(freq_hz)))
            }
        },
    }
}

#[cfg(target_os = "linux")]
fn open_hardware() -> PerfResult<Box<dyn CounterSource>> {
    Ok(Box::new(HardwareCounters::open()?))
}

#[cfg(not(target_os = "linux"))]
fn open_hardware() -> PerfResult<Box<dyn CounterSource>> {
    Err(PerfError::Unavailable(format!(
        "perf_event_open is Linux only (running on {})",
        std::env::consts::OS
    )))
}

// ============================================================================
// Clock
// ============================================================================

/// Wall-clock timing converted to cycles at a nominal frequency.
#[derive(Debug, Clone)]
pub struct ClockCounters {
    freq_hz: f64,
    started: Option<Instant>,
}

impl ClockCounters {
    /// Creates a clock source that converts nanoseconds at `freq_hz`.
    pub fn new(freq_hz: f64) -> Self {
        Self {
            freq_hz,
            started: None,
        }
    }

    /// Nominal frequency.
    pub fn freq_hz(&self) -> f64 {
        self.freq_hz
    }
}

impl CounterSource for ClockCounters {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn start(&mut self) -> PerfResult<()> {
        self.started = Some(Instant::now());
        Ok(())
    }

    fn stop(&mut self) -> PerfResult<PerfSample> {
        let started = self.started.take().ok_or(PerfError::NotStarted("clock"))?;
        let ns = started.elapsed().as_nanos() as f64;
        let cycles = (ns * self.freq_hz / 1e9).round() as u64;
        Ok(PerfSample::new(cycles, 0, 0))
    }
}

// ============================================================================
// Hardware
// ============================================================================

#[cfg(target_os = "linux")]
pub use hw::HardwareCounters;

#[cfg(target_os = "linux")]
mod hw {
    use super::*;
    use perf_event::events::{Cache, CacheOp, CacheResult, Hardware, WhichCache};
    use perf_event::{Builder, Counter, Group};

    const L1D_READ_MISS: Cache = Cache {
        which: WhichCache::L1D,
        operation: CacheOp::READ,
        result: CacheResult::MISS,
    };

    /// `perf_event_open` group measuring the calling thread.
    pub struct HardwareCounters {
        group: Group,
        cycles: Counter,
        instructions: Counter,
        l1_misses: Counter,
        running: bool,
    }

    impl HardwareCounters {
        /// Opens cycles, instructions and L1D read misses as one group.
        ///
        /// Fails when the kernel refuses the events, e.g. under a
        /// restrictive `perf_event_paranoid` or inside a VM without a PMU.
        pub fn open() -> PerfResult<Self> {
            let mut group = Group::new().map_err(PerfError::Hardware)?;
            let cycles = Builder::new()
                .group(&mut group)
                .kind(Hardware::CPU_CYCLES)
                .build()
                .map_err(PerfError::Hardware)?;
            let instructions = Builder::new()
                .group(&mut group)
                .kind(Hardware::INSTRUCTIONS)
                .build()
                .map_err(PerfError::Hardware)?;
            let l1_misses = Builder::new()
                .group(&mut group)
                .kind(L1D_READ_MISS)
                .build()
                .map_err(PerfError::Hardware)?;

            info!("opened hardware counters: cycles, instructions, L1D read misses");
            Ok(Self {
                group,
                cycles,
                instructions,
                l1_misses,
                running: false,
            })
        }
    }

    impl fmt::Debug for HardwareCounters {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("HardwareCounters")
                .field("running", &self.running)
                .finish_non_exhaustive()
        }
    }

    impl CounterSource for HardwareCounters {
        fn name(&self) -> &'static str {
            "hardware"
        }

        fn start(&mut self) -> PerfResult<()> {
            self.group.reset().map_err(PerfError::Hardware)?;
            self.group.enable().map_err(PerfError::Hardware)?;
            self.running = true;
            Ok(())
        }

        fn stop(&mut self) -> PerfResult<PerfSample> {
            if !self.running {
                return Err(PerfError::NotStarted("hardware"));
            }
            self.group.disable().map_err(PerfError::Hardware)?;
            self.running = false;
            let counts = self.group.read().map_err(PerfError::Hardware)?;
            Ok(PerfSample::new(
                counts[&self.cycles],
                counts[&self.instructions],
                counts[&self.l1_misses],
            ))
        }
    }
}
