//! Sampled data model: one `Sample` per poll, gathered into a `Collection`.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::process::MemoryInfo;

/// One observation of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    memory: MemoryInfo,
    num_threads: u32,
    elapsed: Duration,
}

impl Sample {
    pub fn new(memory: MemoryInfo, num_threads: u32, elapsed: Duration) -> Self {
        Self {
            memory,
            num_threads,
            elapsed,
        }
    }

    pub fn memory(&self) -> MemoryInfo {
        self.memory
    }

    /// Resident set size in bytes.
    pub fn rss(&self) -> u64 {
        self.memory.rss
    }

    /// Virtual size in bytes.
    pub fn vms(&self) -> u64 {
        self.memory.vms
    }

    pub fn num_threads(&self) -> u32 {
        self.num_threads
    }

    /// Time since the sampling run began.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// All samples from one run plus the run's metadata.
///
/// Samples are kept in insertion order, which is also elapsed-time order.
#[derive(Debug, Clone)]
pub struct Collection {
    pid: u32,
    start_time: DateTime<Utc>,
    sample_interval: Duration,
    samples: Vec<Sample>,
}

impl Collection {
    pub fn new(pid: u32, start_time: DateTime<Utc>, sample_interval: Duration) -> Self {
        Self {
            pid,
            start_time,
            sample_interval,
            samples: Vec::new(),
        }
    }

    /// Builds a collection from already-gathered samples.
    ///
    /// Returns `None` if the samples are not ordered by elapsed time.
    pub fn from_samples(
        pid: u32,
        start_time: DateTime<Utc>,
        sample_interval: Duration,
        samples: Vec<Sample>,
    ) -> Option<Self> {
        let ordered = samples.windows(2).all(|w| w[0].elapsed <= w[1].elapsed);
        ordered.then_some(Self {
            pid,
            start_time,
            sample_interval,
            samples,
        })
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        debug_assert!(self
            .samples
            .last()
            .map_or(true, |last| last.elapsed <= sample.elapsed));
        self.samples.push(sample);
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn sample_interval(&self) -> Duration {
        self.sample_interval
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ms: u64) -> Sample {
        Sample::new(MemoryInfo { rss: 1, vms: 2 }, 1, Duration::from_millis(ms))
    }

    #[test]
    fn test_from_samples_requires_time_order() {
        let now = Utc::now();
        let ok = Collection::from_samples(
            1,
            now,
            Duration::from_millis(100),
            vec![sample(0), sample(100), sample(100), sample(250)],
        );
        assert_eq!(ok.map(|c| c.len()), Some(4));

        let bad = Collection::from_samples(
            1,
            now,
            Duration::from_millis(100),
            vec![sample(100), sample(0)],
        );
        assert!(bad.is_none());
    }

    #[test]
    fn test_push_keeps_metadata() {
        let now = Utc::now();
        let mut coll = Collection::new(77, now, Duration::from_millis(50));
        assert!(coll.is_empty());
        coll.push(sample(0));
        coll.push(sample(50));

        assert_eq!(coll.pid(), 77);
        assert_eq!(coll.start_time(), now);
        assert_eq!(coll.sample_interval(), Duration::from_millis(50));
        assert_eq!(coll.samples()[1].elapsed(), Duration::from_millis(50));
        assert_eq!(coll.samples()[1].memory(), MemoryInfo { rss: 1, vms: 2 });
        assert_eq!(coll.samples()[1].rss(), 1);
        assert_eq!(coll.samples()[1].vms(), 2);
    }
}
