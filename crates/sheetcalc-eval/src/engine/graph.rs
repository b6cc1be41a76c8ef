//! Precedent/dependent bookkeeping for formula cells.
//!
//! Every cell that a formula mentions, or that holds a formula, gets a node.
//! Nodes are never freed; a removed formula leaves a placeholder with no
//! edges. Range precedents are not expanded into per-cell edges: the
//! holder is indexed under the range's sheet and matched on demand.

use rustc_hash::{FxHashMap, FxHashSet};
use sheetcalc_common::{CellKey, RangeKey};
use sheetcalc_parse::{ASTNode, Reference};

use super::scheduler::{RecalcOrder, Scheduler};

/// Engine-internal node identity.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn as_index(self) -> usize {
        self.0 as usize
    }
}

/// Recalculation state of a cell.
///
/// `Evaluating` only exists while a pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    #[default]
    Clean,
    Dirty,
    Evaluating,
    Errored,
}

#[derive(Debug)]
struct Node {
    key: CellKey,
    has_formula: bool,
    volatile: bool,
    state: CellState,
    precedents: Vec<NodeId>,
    ranges: Vec<RangeKey>,
    dependents: FxHashSet<NodeId>,
}

impl Node {
    fn new(key: CellKey) -> Self {
        Self {
            key,
            has_formula: false,
            volatile: false,
            state: CellState::Clean,
            precedents: Vec::new(),
            ranges: Vec::new(),
            dependents: FxHashSet::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    ids: FxHashMap<CellKey, NodeId>,
    /// sheet → formula nodes holding a range on that sheet
    range_holders: FxHashMap<String, FxHashSet<NodeId>>,
    /// sheet → formula nodes located on that sheet
    formulas_by_sheet: FxHashMap<String, FxHashSet<NodeId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `key`'s precedents with the references of `ast`. References
    /// without a sheet resolve to `key`'s sheet.
    pub fn set_formula(&mut self, key: &CellKey, ast: &ASTNode) {
        let id = self.intern(key);
        self.detach(id);

        let mut cells = Vec::new();
        let mut ranges = Vec::new();
        for reference in ast.references() {
            let sheet = reference.sheet().unwrap_or(&key.sheet).to_string();
            match reference {
                Reference::Cell(c) => cells.push(CellKey::new(sheet, c.row, c.col)),
                Reference::Range(r) => {
                    let (top, left, bottom, right) = r.bounds();
                    ranges.push(RangeKey::new(sheet, top, left, bottom, right));
                }
            }
        }

        let mut precedents: Vec<NodeId> = cells.iter().map(|c| self.intern(c)).collect();
        precedents.sort_unstable();
        precedents.dedup();
        ranges.dedup();
        for &p in &precedents {
            self.nodes[p.as_index()].dependents.insert(id);
        }
        for range in &ranges {
            self.range_holders
                .entry(range.sheet.clone())
                .or_default()
                .insert(id);
        }
        self.formulas_by_sheet
            .entry(key.sheet.clone())
            .or_default()
            .insert(id);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            cell = %key,
            precedents = precedents.len(),
            ranges = ranges.len(),
            "rebuilt formula edges"
        );

        let node = &mut self.nodes[id.as_index()];
        node.has_formula = true;
        node.precedents = precedents;
        node.ranges = ranges;
        node.state = CellState::Dirty;
    }

    /// Drop `key`'s formula and its outgoing edges. Cells that read `key`
    /// keep their edges.
    pub fn remove_formula(&mut self, key: &CellKey) {
        if let Some(&id) = self.ids.get(key) {
            self.detach(id);
            let node = &mut self.nodes[id.as_index()];
            node.has_formula = false;
            node.volatile = false;
            node.state = CellState::Clean;
        }
    }

    pub fn set_volatile(&mut self, key: &CellKey, volatile: bool) {
        if let Some(&id) = self.ids.get(key) {
            self.nodes[id.as_index()].volatile = volatile;
        }
    }

    pub fn has_formula(&self, key: &CellKey) -> bool {
        self.ids
            .get(key)
            .is_some_and(|id| self.nodes[id.as_index()].has_formula)
    }

    pub fn formula_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.has_formula).count()
    }

    /// Cells `key` reads directly, ranges excluded.
    pub fn precedents(&self, key: &CellKey) -> Vec<CellKey> {
        self.ids.get(key).map_or_else(Vec::new, |id| {
            self.nodes[id.as_index()]
                .precedents
                .iter()
                .map(|p| self.key(*p).clone())
                .collect()
        })
    }

    pub fn range_precedents(&self, key: &CellKey) -> &[RangeKey] {
        self.ids
            .get(key)
            .map_or(&[][..], |id| self.nodes[id.as_index()].ranges.as_slice())
    }

    /// Formula cells that read `key` directly or through a range, sorted.
    pub fn dependents(&self, key: &CellKey) -> Vec<CellKey> {
        let mut out: Vec<CellKey> = self
            .dependents_of_key(key)
            .into_iter()
            .map(|id| self.key(id).clone())
            .collect();
        out.sort();
        out
    }

    pub fn state(&self, key: &CellKey) -> CellState {
        self.ids
            .get(key)
            .map_or(CellState::Clean, |id| self.nodes[id.as_index()].state)
    }

    pub fn set_state(&mut self, key: &CellKey, state: CellState) {
        if let Some(&id) = self.ids.get(key) {
            self.nodes[id.as_index()].state = state;
        }
    }

    /// `key` and everything downstream of it, precedents first.
    pub fn recalc_order(&self, key: &CellKey) -> RecalcOrder {
        self.recalc_order_many(std::slice::from_ref(key))
    }

    /// Union of the downstream closures of `keys`, precedents first.
    pub fn recalc_order_many(&self, keys: &[CellKey]) -> RecalcOrder {
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        let mut closure = Vec::new();
        let mut queue: Vec<(CellKey, Option<NodeId>)> = keys
            .iter()
            .map(|k| (k.clone(), self.ids.get(k).copied()))
            .collect();
        let mut roots_without_node = Vec::new();

        while let Some((key, id)) = queue.pop() {
            match id {
                Some(id) => {
                    if !seen.insert(id) {
                        continue;
                    }
                    closure.push(id);
                }
                None => roots_without_node.push(key.clone()),
            }
            for dep in self.dependents_of_key(&key) {
                if !seen.contains(&dep) {
                    queue.push((self.key(dep).clone(), Some(dep)));
                }
            }
        }

        let mut order = Scheduler::new(self).schedule(&closure);
        // A root nothing refers to yet has no node; it still leads the order.
        roots_without_node.dedup();
        for key in roots_without_node.into_iter().rev() {
            order.order.insert(0, key);
        }
        order
    }

    /// Every formula cell, precedents first.
    pub fn full_order(&self) -> RecalcOrder {
        let all: Vec<NodeId> = (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|id| self.nodes[id.as_index()].has_formula)
            .collect();
        Scheduler::new(self).schedule(&all)
    }

    /// Formula cells containing a volatile function.
    pub fn volatile_cells(&self) -> Vec<CellKey> {
        self.nodes
            .iter()
            .filter(|n| n.has_formula && n.volatile)
            .map(|n| n.key.clone())
            .collect()
    }

    /* ─── crate-internal node access for the scheduler ─── */

    pub(crate) fn key(&self, id: NodeId) -> &CellKey {
        &self.nodes[id.as_index()].key
    }

    /// Formula nodes `id` reads: direct cells plus formula cells inside its
    /// ranges.
    pub(crate) fn precedent_ids(&self, id: NodeId) -> Vec<NodeId> {
        let node = &self.nodes[id.as_index()];
        let mut out = node.precedents.clone();
        for range in &node.ranges {
            if let Some(formulas) = self.formulas_by_sheet.get(&range.sheet) {
                out.extend(
                    formulas
                        .iter()
                        .filter(|f| range.contains(self.key(**f))),
                );
            }
        }
        out
    }

    pub(crate) fn has_self_loop(&self, id: NodeId) -> bool {
        self.precedent_ids(id).contains(&id)
    }

    /* ─── internals ─── */

    fn intern(&mut self, key: &CellKey) -> NodeId {
        if let Some(&id) = self.ids.get(key) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(key.clone()));
        self.ids.insert(key.clone(), id);
        id
    }

    /// Remove `id`'s outgoing edges and index entries.
    fn detach(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.as_index()];
        let precedents = std::mem::take(&mut node.precedents);
        let ranges = std::mem::take(&mut node.ranges);
        let sheet = node.key.sheet.clone();
        for p in precedents {
            self.nodes[p.as_index()].dependents.remove(&id);
        }
        for range in ranges {
            if let Some(holders) = self.range_holders.get_mut(&range.sheet) {
                holders.remove(&id);
            }
        }
        if let Some(formulas) = self.formulas_by_sheet.get_mut(&sheet) {
            formulas.remove(&id);
        }
    }

    fn dependents_of_key(&self, key: &CellKey) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self
            .ids
            .get(key)
            .map(|id| self.nodes[id.as_index()].dependents.iter().copied().collect())
            .unwrap_or_default();
        if let Some(holders) = self.range_holders.get(&key.sheet) {
            for &h in holders {
                if self.nodes[h.as_index()].ranges.iter().any(|r| r.contains(key))
                    && !out.contains(&h)
                {
                    out.push(h);
                }
            }
        }
        out
    }
}
