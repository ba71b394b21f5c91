//! Fixed-interval polling loop producing a `Collection`.
//!
//! The loop blocks the calling thread between polls. Time is read and slept
//! through the `Clock` capability so tests can drive it without real delays.

use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, trace};

use crate::collection::{Collection, Sample};
use crate::error::{PlotError, Result};
use crate::process::{ProcProcess, ProcessProbe};

/// Source of monotonic time and blocking sleeps.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time and `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Validated interval/duration pair for one sampling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPlan {
    interval: Duration,
    duration: Duration,
}

impl SamplingPlan {
    /// A zero `duration` means sample until the process exits.
    ///
    /// A bounded window must fit at least two whole intervals.
    pub fn new(interval: Duration, duration: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(PlotError::InvalidConfig(
                "sample interval must be greater than zero".into(),
            ));
        }

        let plan = Self { interval, duration };
        if let Some(n) = plan.implied_samples() {
            if n < 2 {
                return Err(PlotError::InvalidConfig(format!(
                    "sampling window too short: {:?} / {:?} yields {} sample(s), need at least 2",
                    duration, interval, n
                )));
            }
        }
        Ok(plan)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_unbounded(&self) -> bool {
        self.duration.is_zero()
    }

    /// Whole intervals in the window, or `None` when unbounded.
    pub fn implied_samples(&self) -> Option<u128> {
        if self.is_unbounded() {
            None
        } else {
            Some(self.duration.as_nanos() / self.interval.as_nanos())
        }
    }

    fn within(&self, elapsed: Duration) -> bool {
        self.is_unbounded() || elapsed <= self.duration
    }
}

/// Drives a `ProcessProbe` according to a `SamplingPlan`.
#[derive(Debug, Clone)]
pub struct Sampler<C = SystemClock> {
    plan: SamplingPlan,
    clock: C,
}

impl Sampler<SystemClock> {
    pub fn with_system_clock(plan: SamplingPlan) -> Self {
        Self::new(plan, SystemClock)
    }
}

impl<C: Clock> Sampler<C> {
    pub fn new(plan: SamplingPlan, clock: C) -> Self {
        Self { plan, clock }
    }

    /// Polls `probe` until the window closes or the process stops running.
    ///
    /// The first failed query aborts the run and the samples gathered so far
    /// are dropped.
    pub fn sample<P: ProcessProbe + ?Sized>(&self, probe: &P) -> Result<Collection> {
        let pid = probe.pid();
        let start = self.clock.now();
        let mut collection = Collection::new(pid, Utc::now(), self.plan.interval);

        debug!(
            "Sampling pid {} every {:?} for {}",
            pid,
            self.plan.interval,
            if self.plan.is_unbounded() {
                "the process lifetime".to_string()
            } else {
                format!("{:?}", self.plan.duration)
            }
        );

        let mut running = probe.is_running()?;
        loop {
            let elapsed = self.clock.now().duration_since(start);
            if !running || !self.plan.within(elapsed) {
                break;
            }

            let memory = probe.memory_info()?;
            let num_threads = probe.num_threads()?;
            trace!(
                "pid {} at {:?}: rss={} vms={} threads={}",
                pid,
                elapsed,
                memory.rss,
                memory.vms,
                num_threads
            );
            collection.push(Sample::new(memory, num_threads, elapsed));

            self.clock.sleep(self.plan.interval);
            running = probe.is_running()?;
        }

        debug!(
            "Collected {} samples from pid {} (still running: {})",
            collection.len(),
            pid,
            running
        );
        Ok(collection)
    }
}

/// Samples `pid` under /proc in real time.
///
/// The window is validated before the process is looked up.
pub fn sample_process(pid: u32, interval: Duration, duration: Duration) -> Result<Collection> {
    let plan = SamplingPlan::new(interval, duration)?;
    let probe = ProcProcess::open(pid)?;
    Sampler::with_system_clock(plan).sample(&probe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::MemoryInfo;
    use std::cell::Cell;
    use std::io;

    /// Clock that advances only when slept.
    struct FakeClock {
        base: Instant,
        offset: Cell<Duration>,
        jitter: Duration,
    }

    impl FakeClock {
        fn new() -> Self {
            Self::with_jitter(Duration::ZERO)
        }

        fn with_jitter(jitter: Duration) -> Self {
            Self {
                base: Instant::now(),
                offset: Cell::new(Duration::ZERO),
                jitter,
            }
        }
    }

    impl Clock for &FakeClock {
        fn now(&self) -> Instant {
            self.base + self.offset.get()
        }

        fn sleep(&self, duration: Duration) {
            self.offset.set(self.offset.get() + duration + self.jitter);
        }
    }

    /// Probe that stays alive for a fixed number of liveness checks.
    ///
    /// The `fail_*_on` knobs make the n-th call (0-based) of a query fail.
    struct ScriptedProbe {
        pid: u32,
        alive_checks: usize,
        fail_running_on: Option<usize>,
        fail_memory_on: Option<usize>,
        fail_threads_on: Option<usize>,
        running_calls: Cell<usize>,
        memory_calls: Cell<usize>,
        threads_calls: Cell<usize>,
    }

    impl ScriptedProbe {
        fn alive_for(alive_checks: usize) -> Self {
            Self {
                pid: 4242,
                alive_checks,
                fail_running_on: None,
                fail_memory_on: None,
                fail_threads_on: None,
                running_calls: Cell::new(0),
                memory_calls: Cell::new(0),
                threads_calls: Cell::new(0),
            }
        }

        fn vanished(&self) -> PlotError {
            PlotError::Introspection {
                pid: self.pid,
                source: io::Error::new(io::ErrorKind::NotFound, "exited"),
            }
        }

        fn forever() -> Self {
            Self::alive_for(usize::MAX)
        }
    }

    impl ProcessProbe for ScriptedProbe {
        fn pid(&self) -> u32 {
            self.pid
        }

        fn is_running(&self) -> Result<bool> {
            let n = self.running_calls.get();
            self.running_calls.set(n + 1);
            if self.fail_running_on == Some(n) {
                return Err(self.vanished());
            }
            Ok(n < self.alive_checks)
        }

        fn memory_info(&self) -> Result<MemoryInfo> {
            let n = self.memory_calls.get();
            self.memory_calls.set(n + 1);
            if self.fail_memory_on == Some(n) {
                return Err(self.vanished());
            }
            let n = n as u64;
            Ok(MemoryInfo {
                rss: 1024 * (n + 1),
                vms: 4096 * (n + 1),
            })
        }

        fn num_threads(&self) -> Result<u32> {
            let n = self.threads_calls.get();
            self.threads_calls.set(n + 1);
            if self.fail_threads_on == Some(n) {
                return Err(self.vanished());
            }
            Ok(2)
        }
    }

    #[test]
    fn test_plan_rejects_short_window() {
        for (interval_ms, duration_ms) in [(1000, 1000), (600, 1000), (1001, 1000), (5, 9)] {
            let err = SamplingPlan::new(
                Duration::from_millis(interval_ms),
                Duration::from_millis(duration_ms),
            )
            .unwrap_err();
            assert!(
                err.to_string().contains("sampling window too short"),
                "{interval_ms}ms/{duration_ms}ms: {err}"
            );
        }
    }

    #[test]
    fn test_plan_accepts_two_or_more_and_unbounded() {
        let plan = SamplingPlan::new(Duration::from_millis(500), Duration::from_secs(1)).unwrap();
        assert_eq!(plan.implied_samples(), Some(2));

        let plan = SamplingPlan::new(Duration::from_millis(100), Duration::ZERO).unwrap();
        assert!(plan.is_unbounded());
        assert_eq!(plan.implied_samples(), None);
    }

    #[test]
    fn test_plan_rejects_zero_interval() {
        let err = SamplingPlan::new(Duration::ZERO, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, PlotError::InvalidConfig(_)));
    }

    #[test]
    fn test_invalid_window_fails_before_process_lookup() {
        // A pid that cannot exist must still surface the config error first.
        let err = sample_process(u32::MAX, Duration::from_secs(1), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, PlotError::InvalidConfig(_)));
    }

    #[test]
    fn test_bounded_run_samples_whole_window() {
        let clock = FakeClock::new();
        let plan = SamplingPlan::new(Duration::from_millis(100), Duration::from_secs(1)).unwrap();
        let probe = ScriptedProbe::forever();

        let coll = Sampler::new(plan, &clock).sample(&probe).unwrap();

        // Elapsed 0ms..=1000ms inclusive.
        assert_eq!(coll.len(), 11);
        assert_eq!(coll.pid(), 4242);
        assert_eq!(coll.sample_interval(), Duration::from_millis(100));
        for (i, s) in coll.samples().iter().enumerate() {
            assert_eq!(s.elapsed(), Duration::from_millis(100 * i as u64));
            let n = i as u64 + 1;
            assert_eq!(
                s.memory(),
                MemoryInfo {
                    rss: 1024 * n,
                    vms: 4096 * n
                }
            );
            assert_eq!(s.num_threads(), 2);
        }
    }

    #[test]
    fn test_jitter_shortens_bounded_run() {
        let clock = FakeClock::with_jitter(Duration::from_millis(5));
        let plan = SamplingPlan::new(Duration::from_millis(100), Duration::from_secs(1)).unwrap();
        let coll = Sampler::new(plan, &clock)
            .sample(&ScriptedProbe::forever())
            .unwrap();

        assert_eq!(coll.len(), 10);
        let last = coll.samples().last().unwrap().elapsed();
        assert!(last <= Duration::from_millis(1100));
        assert!(coll.samples().windows(2).all(|w| w[0].elapsed() < w[1].elapsed()));
    }

    #[test]
    fn test_unbounded_run_stops_when_process_exits() {
        let clock = FakeClock::new();
        let plan = SamplingPlan::new(Duration::from_millis(100), Duration::ZERO).unwrap();
        // Alive for the initial check and two re-checks.
        let probe = ScriptedProbe::alive_for(3);

        let coll = Sampler::new(plan, &clock).sample(&probe).unwrap();

        assert_eq!(coll.len(), 3);
        assert_eq!(probe.running_calls.get(), 4);
    }

    #[test]
    fn test_dead_process_yields_empty_collection() {
        let clock = FakeClock::new();
        let plan = SamplingPlan::new(Duration::from_millis(100), Duration::from_secs(1)).unwrap();
        let probe = ScriptedProbe::alive_for(0);

        let coll = Sampler::new(plan, &clock).sample(&probe).unwrap();

        assert!(coll.is_empty());
        assert_eq!(probe.memory_calls.get(), 0);
        assert_eq!(clock.offset.get(), Duration::ZERO);
    }

    #[test]
    fn test_mid_run_failure_discards_samples() {
        let clock = FakeClock::new();
        let plan = SamplingPlan::new(Duration::from_millis(100), Duration::ZERO).unwrap();
        let mut probe = ScriptedProbe::forever();
        probe.fail_memory_on = Some(3);

        let err = Sampler::new(plan, &clock).sample(&probe).unwrap_err();

        assert!(matches!(err, PlotError::Introspection { pid: 4242, .. }));
        assert_eq!(probe.memory_calls.get(), 4);
    }

    #[test]
    fn test_failed_liveness_recheck_discards_samples() {
        let clock = FakeClock::new();
        let plan = SamplingPlan::new(Duration::from_millis(100), Duration::from_secs(1)).unwrap();
        let mut probe = ScriptedProbe::forever();
        // Initial check and first re-check succeed, the second re-check fails.
        probe.fail_running_on = Some(2);

        let err = Sampler::new(plan, &clock).sample(&probe).unwrap_err();

        assert!(matches!(err, PlotError::Introspection { pid: 4242, .. }));
        assert_eq!(probe.memory_calls.get(), 2);
        assert_eq!(probe.running_calls.get(), 3);
    }

    #[test]
    fn test_failed_thread_query_discards_samples() {
        let clock = FakeClock::new();
        let plan = SamplingPlan::new(Duration::from_millis(100), Duration::from_secs(1)).unwrap();
        let mut probe = ScriptedProbe::forever();
        probe.fail_threads_on = Some(1);

        let err = Sampler::new(plan, &clock).sample(&probe).unwrap_err();

        assert!(matches!(err, PlotError::Introspection { pid: 4242, .. }));
        assert_eq!(probe.memory_calls.get(), 2);
        assert_eq!(probe.threads_calls.get(), 2);
    }
}
