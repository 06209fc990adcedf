use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::bail;
use buildo::dag::{Graph, WorkItem};
use buildo::exec::ActionRunner;

use crate::clock::MemoryClock;

/// A fake action runner that:
/// - records the order in which actions finished
/// - optionally "writes" each output into a [`MemoryClock`]
/// - fails for a configured set of vertices
/// - notices if the same vertex is ever run twice at once, or at all twice
pub struct FakeRunner {
    finished: Mutex<Vec<String>>,
    started: Mutex<Vec<String>>,
    in_flight: Mutex<HashSet<String>>,
    overlaps: AtomicUsize,
    running: AtomicUsize,
    max_running: AtomicUsize,
    failing: HashSet<String>,
    clock: Option<MemoryClock>,
    delay: Option<Duration>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            finished: Mutex::new(Vec::new()),
            started: Mutex::new(Vec::new()),
            in_flight: Mutex::new(HashSet::new()),
            overlaps: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
            failing: HashSet::new(),
            clock: None,
            delay: None,
        }
    }

    /// Touch every successfully built vertex in `clock`.
    pub fn with_clock(mut self, clock: MemoryClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    /// Sleep this long inside every action.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Vertices whose action succeeded, in completion order.
    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    /// Every vertex an action was started for, in start order.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Number of times an action started while the same vertex was in flight.
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    /// Highest number of actions observed running at the same time.
    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRunner for FakeRunner {
    fn run(&self, item: &WorkItem, _graph: &Graph) -> anyhow::Result<()> {
        self.started.lock().unwrap().push(item.id.clone());
        if !self.in_flight.lock().unwrap().insert(item.id.clone()) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        self.running.fetch_sub(1, Ordering::SeqCst);
        self.in_flight.lock().unwrap().remove(&item.id);

        if self.failing.contains(&item.id) {
            bail!("fake failure for '{}'", item.id);
        }
        if let Some(clock) = &self.clock {
            clock.touch(&item.id);
        }
        self.finished.lock().unwrap().push(item.id.clone());
        Ok(())
    }
}
