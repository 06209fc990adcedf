// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{Control, DfsEvent, depth_first_search};

use crate::dag::vertex::{VertexId, VertexKind};
use crate::errors::{BuildError, Result};

/// Internal node structure: stores the kind plus immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode {
    kind: VertexKind,
    /// Direct dependencies, in insertion order.
    deps: Vec<VertexId>,
    /// Direct dependents: vertices that list this one as a dependency.
    dependents: Vec<VertexId>,
}

/// In-memory build graph keyed by vertex id.
///
/// Edges point from a consumer to the dependency it needs. The graph is
/// built once per run during setup and then only read; there is no removal.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: HashMap<VertexId, DagNode>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vertex.
    ///
    /// Adding the same id with the same kind again is a no-op, since several
    /// sources may report the same header. Re-adding an id with a different
    /// kind is an error.
    pub fn add_vertex(&mut self, id: impl Into<VertexId>, kind: VertexKind) -> Result<()> {
        let id = id.into();
        if let Some(existing) = self.nodes.get(&id) {
            if existing.kind == kind {
                return Ok(());
            }
            return Err(BuildError::VertexConflict {
                id,
                existing: existing.kind.to_string(),
                requested: kind.to_string(),
            });
        }

        self.nodes.insert(
            id,
            DagNode {
                kind,
                deps: Vec::new(),
                dependents: Vec::new(),
            },
        );
        Ok(())
    }

    /// Record that `consumer` needs `dependency` to be built first.
    ///
    /// Both endpoints must already exist. Repeated edges are collapsed.
    pub fn add_edge(&mut self, consumer: &str, dependency: &str) -> Result<()> {
        if !self.nodes.contains_key(dependency) {
            return Err(BuildError::UnknownVertex(dependency.to_string()));
        }
        if consumer == dependency {
            return Err(BuildError::GraphCycle(format!(
                "'{consumer}' depends on itself"
            )));
        }

        let node = self
            .nodes
            .get_mut(consumer)
            .ok_or_else(|| BuildError::UnknownVertex(consumer.to_string()))?;
        if node.deps.iter().any(|d| d == dependency) {
            return Ok(());
        }
        node.deps.push(dependency.to_string());

        if let Some(dep_node) = self.nodes.get_mut(dependency) {
            dep_node.dependents.push(consumer.to_string());
        }
        Ok(())
    }

    pub fn add_edges<I, S>(&mut self, consumer: &str, dependencies: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for dep in dependencies {
            self.add_edge(consumer, dep.as_ref())?;
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn kind_of(&self, id: &str) -> Result<&VertexKind> {
        self.nodes
            .get(id)
            .map(|n| &n.kind)
            .ok_or_else(|| BuildError::UnknownVertex(id.to_string()))
    }

    /// Direct dependencies of `id`, in the order their edges were added.
    ///
    /// The returned iterator is lazy and can be cloned to restart it.
    pub fn get_direct_predecessors(&self, id: &str) -> Result<Predecessors<'_>> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| BuildError::UnknownVertex(id.to_string()))?;
        Ok(Predecessors {
            inner: node.deps.iter(),
        })
    }

    /// Direct dependents of `id` (vertices that list it as a dependency).
    pub fn dependents_of(&self, id: &str) -> &[VertexId] {
        self.nodes
            .get(id)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All vertices with their kinds, in no particular order.
    pub fn vertices(&self) -> impl Iterator<Item = (&str, &VertexKind)> {
        self.nodes.iter().map(|(id, n)| (id.as_str(), &n.kind))
    }

    /// Look for a cycle among the vertices reachable from `start`.
    ///
    /// Returns the cycle as a path `a -> b -> ... -> a`, or `None` when the
    /// reachable subgraph is acyclic.
    pub fn find_cycle_from(&self, start: &str) -> Option<Vec<VertexId>> {
        if !self.nodes.contains_key(start) {
            return None;
        }

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for (name, node) in self.nodes.iter() {
            graph.add_node(name.as_str());
            for dep in node.deps.iter() {
                graph.add_edge(name.as_str(), dep.as_str(), ());
            }
        }

        // Tree edges give us the discovery path, so a back edge u -> v can be
        // unwound into the full cycle v -> ... -> u -> v.
        let mut parent: HashMap<&str, &str> = HashMap::new();
        let found = depth_first_search(&graph, Some(start), |event| match event {
            DfsEvent::TreeEdge(u, v) => {
                parent.insert(v, u);
                Control::Continue
            }
            DfsEvent::BackEdge(u, v) => Control::Break((u, v)),
            _ => Control::Continue,
        });

        let (from, to) = found.break_value()?;
        let mut path = vec![from.to_string()];
        let mut cur = from;
        while cur != to {
            cur = *parent.get(cur)?;
            path.push(cur.to_string());
        }
        path.reverse();
        path.push(to.to_string());
        Some(path)
    }
}

/// Lazy, restartable view over a vertex's direct dependencies.
#[derive(Debug, Clone)]
pub struct Predecessors<'a> {
    inner: std::slice::Iter<'a, VertexId>,
}

impl<'a> Iterator for Predecessors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|s| s.as_str())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Predecessors<'_> {}
