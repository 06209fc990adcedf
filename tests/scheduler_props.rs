// tests/scheduler_props.rs

mod common;
use crate::common::{FakeRunner, MemoryClock};

use std::collections::{BTreeSet, HashMap, HashSet};

use proptest::prelude::*;
use buildo::dag::{Graph, Scheduler, VertexKind};
use buildo::exec::run_workers;

/// A random acyclic project: vertex `i` may only depend on vertices `0..i`.
#[derive(Debug, Clone)]
struct Project {
    deps: Vec<Vec<usize>>,
    /// Seconds since the epoch; `None` means the vertex is missing.
    times: Vec<Option<u64>>,
    goals: Vec<usize>,
}

fn project_strategy(max_vertices: usize) -> impl Strategy<Value = Project> {
    (2..=max_vertices).prop_flat_map(|n| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..4),
            n,
        );
        let times_strat =
            proptest::collection::vec(proptest::option::weighted(0.8, 0..40u64), n);
        let goals_strat = proptest::collection::vec(0..n, 1..4);

        (deps_strat, times_strat, goals_strat).prop_map(move |(raw_deps, times, goals)| {
            let deps = raw_deps
                .into_iter()
                .enumerate()
                .map(|(i, raw)| {
                    // Sanitize: only allow deps < i, without repeats.
                    let mut seen = HashSet::new();
                    raw.into_iter()
                        .filter(|_| i > 0)
                        .map(|d| d % i.max(1))
                        .filter(|d| seen.insert(*d))
                        .collect()
                })
                .collect();
            Project { deps, times, goals }
        })
    })
}

fn id(i: usize) -> String {
    format!("v{i}")
}

impl Project {
    fn graph(&self) -> Graph {
        let mut graph = Graph::new();
        for (i, deps) in self.deps.iter().enumerate() {
            let kind = if deps.is_empty() {
                VertexKind::Source
            } else {
                VertexKind::Object {
                    variant: "default".to_string(),
                }
            };
            graph.add_vertex(id(i), kind).unwrap();
            for d in deps {
                graph.add_edge(&id(i), &id(*d)).unwrap();
            }
        }
        graph
    }

    fn clock(&self) -> MemoryClock {
        let clock = MemoryClock::new();
        for (i, t) in self.times.iter().enumerate() {
            if let Some(t) = t {
                clock.set(&id(i), *t);
            }
        }
        clock
    }

    fn reachable(&self) -> BTreeSet<usize> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<usize> = self.goals.clone();
        while let Some(v) = stack.pop() {
            if seen.insert(v) {
                stack.extend(self.deps[v].iter().copied());
            }
        }
        seen
    }

    /// Straightforward recursive staleness, independent of the scheduler.
    fn expected_stale(&self) -> BTreeSet<String> {
        fn stale(p: &Project, v: usize, memo: &mut HashMap<usize, bool>) -> bool {
            if let Some(s) = memo.get(&v) {
                return *s;
            }
            let mut s = p.times[v].is_none();
            for &d in &p.deps[v] {
                if stale(p, d, memo) {
                    s = true;
                }
                if let (Some(own), Some(dep)) = (p.times[v], p.times[d]) {
                    if own < dep {
                        s = true;
                    }
                }
            }
            memo.insert(v, s);
            s
        }

        let mut memo = HashMap::new();
        self.reachable()
            .into_iter()
            .filter(|v| stale(self, *v, &mut memo))
            .map(id)
            .collect()
    }

    fn goal_ids(&self) -> Vec<String> {
        self.goals.iter().map(|g| id(*g)).collect()
    }
}

fn schedule(p: &Project, clock: &MemoryClock) -> Scheduler {
    let s = Scheduler::new(p.graph(), clock.probe_table()).unwrap();
    for g in p.goal_ids() {
        s.activate(&g).unwrap();
    }
    s
}

/// Run the project with `jobs` workers; returns (updated, finished order).
fn run(p: &Project, jobs: usize) -> (Vec<String>, Vec<String>) {
    let clock = p.clock();
    let s = schedule(p, &clock);
    let updated = s.get_updated();

    let runner = FakeRunner::new();
    let report = run_workers(&s, &runner, jobs);
    assert!(report.success());
    assert!(s.done());
    assert_eq!(runner.overlaps(), 0);
    (updated, runner.finished())
}

proptest! {
    #[test]
    fn updated_matches_reference_staleness(p in project_strategy(12)) {
        let clock = p.clock();
        let s = schedule(&p, &clock);
        let updated: BTreeSet<String> = s.get_updated().into_iter().collect();
        prop_assert_eq!(updated, p.expected_stale());

        // Every reachable vertex probed exactly once.
        for v in p.reachable() {
            prop_assert_eq!(clock.probe_count(&id(v)), 1);
        }
    }

    #[test]
    fn updated_lists_dependencies_first(p in project_strategy(12)) {
        let clock = p.clock();
        let s = schedule(&p, &clock);
        let updated = s.get_updated();
        let pos: HashMap<&str, usize> =
            updated.iter().enumerate().map(|(i, v)| (v.as_str(), i)).collect();

        for (i, deps) in p.deps.iter().enumerate() {
            let Some(&vi) = pos.get(id(i).as_str()) else { continue };
            for d in deps {
                if let Some(&di) = pos.get(id(*d).as_str()) {
                    prop_assert!(di < vi, "v{} listed before its dependency v{}", i, d);
                }
            }
        }
    }

    #[test]
    fn workers_build_exactly_the_stale_set_in_order(
        p in project_strategy(12),
        jobs in 1..5usize,
    ) {
        let (updated, finished) = run(&p, jobs);

        let updated_set: BTreeSet<&String> = updated.iter().collect();
        let finished_set: BTreeSet<&String> = finished.iter().collect();
        prop_assert_eq!(finished.len(), finished_set.len(), "a vertex ran twice");
        prop_assert_eq!(&updated_set, &finished_set);

        let pos: HashMap<&str, usize> =
            finished.iter().enumerate().map(|(i, v)| (v.as_str(), i)).collect();
        for (i, deps) in p.deps.iter().enumerate() {
            let Some(&vi) = pos.get(id(i).as_str()) else { continue };
            for d in deps {
                if let Some(&di) = pos.get(id(*d).as_str()) {
                    prop_assert!(di < vi, "v{} finished before its dependency v{}", i, d);
                }
            }
        }
    }

    #[test]
    fn worker_count_does_not_change_the_outcome(p in project_strategy(10)) {
        let (updated_one, finished_one) = run(&p, 1);
        let (updated_many, finished_many) = run(&p, 4);

        prop_assert_eq!(&updated_one, &updated_many);
        let one: BTreeSet<String> = finished_one.into_iter().collect();
        let many: BTreeSet<String> = finished_many.into_iter().collect();
        prop_assert_eq!(one, many);
    }
}
