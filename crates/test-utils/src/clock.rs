#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use buildo::dag::{KindTag, Probe, ProbeTable, VertexKind};
use buildo::errors::{BuildError, Result};

/// In-memory stand-in for the filesystem: a map from vertex id to a
/// timestamp, counted in whole seconds since the epoch.
///
/// Cloning shares the underlying map, so a [`crate::fake_runner::FakeRunner`]
/// can "write" outputs that the next scheduler will probe.
#[derive(Debug, Clone, Default)]
pub struct MemoryClock {
    inner: Arc<ClockInner>,
}

#[derive(Debug, Default)]
struct ClockInner {
    times: Mutex<HashMap<String, SystemTime>>,
    wrong_kind: Mutex<Vec<String>>,
    probes: Mutex<HashMap<String, usize>>,
    total_probes: AtomicUsize,
    tick: AtomicU64,
}

/// First second handed out by [`MemoryClock::touch`]; fixtures set with
/// [`MemoryClock::set`] should stay below it.
pub const TOUCH_BASE: u64 = 1_000;

impl MemoryClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    /// Give `id` an explicit timestamp.
    pub fn set(&self, id: &str, secs: u64) {
        self.inner
            .times
            .lock()
            .unwrap()
            .insert(id.to_string(), Self::at(secs));
    }

    /// Give `id` a timestamp newer than anything touched before.
    pub fn touch(&self, id: &str) {
        let tick = self.inner.tick.fetch_add(1, Ordering::SeqCst);
        self.set(id, TOUCH_BASE + tick);
    }

    pub fn remove(&self, id: &str) {
        self.inner.times.lock().unwrap().remove(id);
    }

    /// Make the probe for `id` fail as if the path had the wrong kind.
    pub fn break_kind(&self, id: &str) {
        self.inner.wrong_kind.lock().unwrap().push(id.to_string());
    }

    pub fn get(&self, id: &str) -> Option<SystemTime> {
        self.inner.times.lock().unwrap().get(id).copied()
    }

    /// How often `id` was probed since the clock was created.
    pub fn probe_count(&self, id: &str) -> usize {
        self.inner
            .probes
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_probes(&self) -> usize {
        self.inner.total_probes.load(Ordering::SeqCst)
    }

    /// A probe table that answers every vertex kind from this clock.
    pub fn probe_table(&self) -> ProbeTable {
        KindTag::ALL
            .iter()
            .fold(ProbeTable::new(), |table, tag| table.with(*tag, self.clone()))
    }
}

impl Probe for MemoryClock {
    fn probe(&self, id: &str, _kind: &VertexKind) -> Result<Option<SystemTime>> {
        self.inner.total_probes.fetch_add(1, Ordering::SeqCst);
        *self
            .inner
            .probes
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_insert(0) += 1;

        if self.inner.wrong_kind.lock().unwrap().iter().any(|w| w == id) {
            return Err(BuildError::WrongKind {
                path: id.into(),
                expected: "regular file",
            });
        }
        Ok(self.get(id))
    }
}
