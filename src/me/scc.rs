//! Strongly connected components of the basic block graph.
//!
//! The overlay partitions the live blocks into [`SccOfBbs`] and records the component DAG.
//! Members of cyclic components are flagged [`BbAttr::IS_IN_LOOP`] when the overlay is built.

use std::{collections::BTreeSet, fmt};

use crate::{
    me::{BbAttr, BbId, MeCfg},
    utils::{
        graph::{algorithms::strongly_connected_components, NodeId, Successors},
        Arena,
    },
    Error, Result,
};

index_type!(
    /// Index of a strongly connected component
    SccId, "scc"
);

/// A strongly connected component of basic blocks.
#[derive(Debug, Clone)]
pub struct SccOfBbs {
    id: SccId,
    entry: BbId,
    bbs: Vec<BbId>,
    pred_sccs: BTreeSet<SccId>,
    succ_sccs: BTreeSet<SccId>,
}

impl SccOfBbs {
    /// Id of this component.
    #[must_use]
    pub fn id(&self) -> SccId {
        self.id
    }

    /// The member control enters through: the function entry, else the first member with a
    /// predecessor outside the component.
    #[must_use]
    pub fn entry(&self) -> BbId {
        self.entry
    }

    /// Members, sorted by block id.
    #[must_use]
    pub fn bbs(&self) -> &[BbId] {
        &self.bbs
    }

    /// Components with an edge into this one.
    #[must_use]
    pub fn pred_sccs(&self) -> &BTreeSet<SccId> {
        &self.pred_sccs
    }

    /// Components this one has an edge into.
    #[must_use]
    pub fn succ_sccs(&self) -> &BTreeSet<SccId> {
        &self.succ_sccs
    }

    /// Returns `true` if some other component has an edge into this one.
    #[must_use]
    pub fn has_pred(&self) -> bool {
        !self.pred_sccs.is_empty()
    }

    /// Returns `true` if the component contains a cycle: more than one member, or one member
    /// with a self edge.
    #[must_use]
    pub fn has_cycle(&self, cfg: &MeCfg) -> bool {
        match self.bbs.as_slice() {
            [] => false,
            [single] => cfg.is_succ_bb(*single, *single),
            _ => true,
        }
    }

    /// Checks that the recorded successor and predecessor components are exactly the
    /// components reached by block edges leaving and entering this one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Verification`] listing every mismatch.
    pub fn verify(&self, topo: &SccTopology, cfg: &MeCfg) -> Result<()> {
        let mut problems = Vec::new();
        let mut reached = BTreeSet::new();
        let mut reached_from = BTreeSet::new();
        for &bb in &self.bbs {
            let block = cfg.bb(bb);
            for &succ in block.succs() {
                self.collect_edge(topo, bb, succ, "successor", &mut reached, &mut problems);
            }
            for &pred in block.preds() {
                self.collect_edge(topo, bb, pred, "predecessor", &mut reached_from, &mut problems);
            }
        }

        for missing in reached.difference(&self.succ_sccs) {
            problems.push(format!("{} -> {} is not recorded", self.id, missing));
        }
        for stale in self.succ_sccs.difference(&reached) {
            problems.push(format!("{} -> {} has no block edge", self.id, stale));
        }
        for missing in reached_from.difference(&self.pred_sccs) {
            problems.push(format!("{} <- {} is not recorded", self.id, missing));
        }
        for stale in self.pred_sccs.difference(&reached_from) {
            problems.push(format!("{} <- {} has no block edge", self.id, stale));
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Verification(problems))
        }
    }

    fn collect_edge(
        &self,
        topo: &SccTopology,
        bb: BbId,
        other: BbId,
        role: &str,
        sccs: &mut BTreeSet<SccId>,
        problems: &mut Vec<String>,
    ) {
        match topo.scc_of(other) {
            Some(scc) if scc != self.id => {
                sccs.insert(scc);
            }
            Some(_) => {}
            None => problems.push(format!(
                "{} of {} has {} {} outside the overlay",
                bb, self.id, role, other
            )),
        }
    }

    /// One-line rendering of the component.
    #[must_use]
    pub fn dump(&self) -> String {
        self.to_string()
    }
}

fn join<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for SccOfBbs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entry {} bbs [{}] preds [{}] succs [{}]",
            self.id,
            self.entry,
            join(&self.bbs),
            join(&self.pred_sccs),
            join(&self.succ_sccs)
        )
    }
}

/// The component partition of a function's live blocks, in topological order.
#[derive(Debug, Clone, Default)]
pub struct SccTopology {
    sccs: Arena<SccOfBbs, SccId>,
    bb_to_scc: Vec<Option<SccId>>,
}

impl SccTopology {
    /// Computes the components of `cfg` and flags members of cyclic ones as in a loop. The flag
    /// is cleared everywhere else, so a rebuild after edge edits leaves no stale loop tags.
    ///
    /// Removed blocks belong to no component. Components are numbered in topological order of
    /// the component DAG, so the entry's component comes first.
    pub fn build(cfg: &mut MeCfg) -> Self {
        let raw = strongly_connected_components(&*cfg);

        let mut live: Vec<Vec<BbId>> = raw
            .into_iter()
            .rev()
            .map(|component| {
                let mut bbs: Vec<BbId> = component
                    .into_iter()
                    .map(|n: NodeId| BbId::new(n.index() as u32))
                    .filter(|&bb| !cfg.bb(bb).is_deleted())
                    .collect();
                bbs.sort();
                bbs
            })
            .filter(|bbs| !bbs.is_empty())
            .collect();

        let mut topo = SccTopology {
            sccs: Arena::with_capacity(live.len()),
            bb_to_scc: vec![None; cfg.node_count()],
        };

        for bbs in live.drain(..) {
            let id = topo.sccs.next_id();
            for &bb in &bbs {
                topo.bb_to_scc[bb.index()] = Some(id);
            }
            let entry = Self::find_entry(cfg, &bbs, &topo.bb_to_scc, id);
            topo.sccs.alloc(SccOfBbs {
                id,
                entry,
                bbs,
                pred_sccs: BTreeSet::new(),
                succ_sccs: BTreeSet::new(),
            });
        }

        let ids: Vec<SccId> = topo.sccs.ids().collect();
        for &id in &ids {
            let members = topo.sccs[id].bbs.clone();
            for bb in members {
                for &succ in cfg.bb(bb).succs() {
                    let Some(target) = topo.bb_to_scc[succ.index()] else {
                        continue;
                    };
                    if target != id {
                        topo.sccs[id].succ_sccs.insert(target);
                        topo.sccs[target].pred_sccs.insert(id);
                    }
                }
            }
        }

        let all: Vec<BbId> = cfg.all_bbs().map(|b| b.id()).collect();
        for bb in all {
            cfg.bb_mut(bb).attrs.remove(BbAttr::IS_IN_LOOP);
        }
        let mut loops = 0;
        for &id in &ids {
            if topo.sccs[id].has_cycle(cfg) {
                loops += 1;
                for &bb in &topo.sccs[id].bbs {
                    cfg.bb_mut(bb).attrs.insert(BbAttr::IS_IN_LOOP);
                }
            }
        }
        log::debug!("{} components, {} cyclic", topo.sccs.len(), loops);
        topo
    }

    fn find_entry(cfg: &MeCfg, bbs: &[BbId], bb_to_scc: &[Option<SccId>], id: SccId) -> BbId {
        if let Some(entry) = cfg.try_entry().filter(|entry| bbs.contains(entry)) {
            return entry;
        }
        bbs.iter()
            .copied()
            .find(|&bb| {
                cfg.bb(bb)
                    .preds()
                    .iter()
                    .any(|p| bb_to_scc[p.index()] != Some(id))
            })
            .unwrap_or(bbs[0])
    }

    /// Component containing `bb`, `None` for removed blocks.
    #[must_use]
    pub fn scc_of(&self, bb: BbId) -> Option<SccId> {
        self.bb_to_scc.get(bb.index()).copied().flatten()
    }

    /// Component at `id`.
    #[must_use]
    pub fn scc(&self, id: SccId) -> &SccOfBbs {
        &self.sccs[id]
    }

    /// Components in topological order.
    pub fn iter(&self) -> impl Iterator<Item = &SccOfBbs> {
        self.sccs.iter().map(|(_, scc)| scc)
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sccs.len()
    }

    /// Returns `true` if there are no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sccs.is_empty()
    }

    /// Checks that the components partition the live blocks and that every component's edges
    /// match the block graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Verification`] listing every problem found.
    pub fn verify(&self, cfg: &MeCfg) -> Result<()> {
        let mut problems = Vec::new();
        let mut seen = vec![0usize; cfg.len()];
        for scc in self.iter() {
            for &bb in &scc.bbs {
                seen[bb.index()] += 1;
                if self.scc_of(bb) != Some(scc.id) {
                    problems.push(format!("{} lists {} but maps elsewhere", scc.id, bb));
                }
            }
            if let Err(Error::Verification(more)) = scc.verify(self, cfg) {
                problems.extend(more);
            }
        }
        for bb in cfg.all_bbs() {
            let count = seen[bb.id().index()];
            match (bb.is_deleted(), count) {
                (false, 1) | (true, 0) => {}
                (false, n) => problems.push(format!("{} is in {} components", bb.id(), n)),
                (true, _) => problems.push(format!("removed {} is in a component", bb.id())),
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Verification(problems))
        }
    }

    /// Renders every component, one per line.
    #[must_use]
    pub fn dump(&self) -> String {
        self.iter().map(|scc| format!("{scc}\n")).collect()
    }
}
