use rustc_hash::{FxHashMap, FxHashSet};
use sheetcalc_common::CellKey;

use super::graph::{DependencyGraph, NodeId};

/// Evaluation plan for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecalcOrder {
    /// Acyclic cells, every precedent before its dependents.
    pub order: Vec<CellKey>,
    /// Strongly connected groups (more than one cell, or a cell reading
    /// itself). Their members are not in `order`.
    pub cycles: Vec<Vec<CellKey>>,
}

impl RecalcOrder {
    pub fn is_cyclic(&self, key: &CellKey) -> bool {
        self.cycles.iter().flatten().any(|k| k == key)
    }
}

pub struct Scheduler<'a> {
    graph: &'a DependencyGraph,
}

struct Frame {
    node: NodeId,
    successors: Vec<NodeId>,
    next: usize,
}

impl<'a> Scheduler<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        Self { graph }
    }

    /// Order `nodes`, considering only edges between members of the set.
    pub fn schedule(&self, nodes: &[NodeId]) -> RecalcOrder {
        let members: FxHashSet<NodeId> = nodes.iter().copied().collect();
        let mut plan = RecalcOrder::default();
        for scc in self.tarjan_scc(nodes, &members) {
            if scc.len() > 1 || self.graph.has_self_loop(scc[0]) {
                #[cfg(feature = "tracing")]
                tracing::debug!(cells = scc.len(), "cycle detected");
                let mut keys: Vec<CellKey> =
                    scc.iter().map(|id| self.graph.key(*id).clone()).collect();
                keys.sort();
                plan.cycles.push(keys);
            } else {
                plan.order.push(self.graph.key(scc[0]).clone());
            }
        }
        plan
    }

    /// Tarjan's algorithm with an explicit stack. Edges point from a cell to
    /// its precedents, so components come out precedents first.
    fn tarjan_scc(&self, roots: &[NodeId], members: &FxHashSet<NodeId>) -> Vec<Vec<NodeId>> {
        let mut counter = 0usize;
        let mut indices: FxHashMap<NodeId, usize> = FxHashMap::default();
        let mut lowlinks: FxHashMap<NodeId, usize> = FxHashMap::default();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut on_stack: FxHashSet<NodeId> = FxHashSet::default();
        let mut sccs = Vec::new();

        for &root in roots {
            if indices.contains_key(&root) {
                continue;
            }
            let mut frames = vec![self.open(
                root,
                members,
                &mut counter,
                &mut indices,
                &mut lowlinks,
                &mut stack,
                &mut on_stack,
            )];

            while let Some(frame) = frames.last_mut() {
                let node = frame.node;
                if let Some(&next) = frame.successors.get(frame.next) {
                    frame.next += 1;
                    if !indices.contains_key(&next) {
                        let child = self.open(
                            next,
                            members,
                            &mut counter,
                            &mut indices,
                            &mut lowlinks,
                            &mut stack,
                            &mut on_stack,
                        );
                        frames.push(child);
                    } else if on_stack.contains(&next) {
                        let low = lowlinks[&node].min(indices[&next]);
                        lowlinks.insert(node, low);
                    }
                    continue;
                }

                frames.pop();
                if let Some(parent) = frames.last() {
                    let low = lowlinks[&parent.node].min(lowlinks[&node]);
                    lowlinks.insert(parent.node, low);
                }
                if lowlinks[&node] == indices[&node] {
                    let mut scc = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack.remove(&w);
                        scc.push(w);
                        if w == node {
                            break;
                        }
                    }
                    sccs.push(scc);
                }
            }
        }
        sccs
    }

    fn open(
        &self,
        node: NodeId,
        members: &FxHashSet<NodeId>,
        counter: &mut usize,
        indices: &mut FxHashMap<NodeId, usize>,
        lowlinks: &mut FxHashMap<NodeId, usize>,
        stack: &mut Vec<NodeId>,
        on_stack: &mut FxHashSet<NodeId>,
    ) -> Frame {
        indices.insert(node, *counter);
        lowlinks.insert(node, *counter);
        *counter += 1;
        stack.push(node);
        on_stack.insert(node);
        let successors = self
            .graph
            .precedent_ids(node)
            .into_iter()
            .filter(|p| members.contains(p))
            .collect();
        Frame {
            node,
            successors,
            next: 0,
        }
    }
}
