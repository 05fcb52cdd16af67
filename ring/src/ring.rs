use std::collections::BTreeMap;

use fnv::FnvHashMap;
use log::debug;
use smallvec::SmallVec;

use crate::error::{Result, RingError};
use crate::hash::position;

/// Construction-time knobs for [`HashRing`]. Both must be at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    /// Virtual nodes placed on the ring per unit of node weight. More
    /// vnodes means a smoother key distribution at the cost of a bigger
    /// ring; low hundreds is plenty.
    pub vnodes_per_weight_unit: usize,
    /// How many distinct physical nodes a replica lookup tries to collect.
    pub replication_factor: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            vnodes_per_weight_unit: 100,
            replication_factor: 3,
        }
    }
}

/// One occupied position on the ring.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    /// Physical node that owns this position.
    owner: String,
    /// The vnode label that hashed here, e.g. `"node-1#42"`. Kept so
    /// routing decisions can be explained back to a caller.
    label: String,
}

/// A weighted consistent-hash ring over named nodes.
///
/// The ring and the node registry always change together: positions are
/// created only by [`add_node`](Self::add_node) and destroyed only by
/// [`remove_node`](Self::remove_node), each as one whole-node batch.
pub struct HashRing {
    /// Relates ring positions to the vnodes sitting on them. Ascending,
    /// no duplicates; `BTreeMap::range` gives us the clockwise walk.
    ring: BTreeMap<u128, Slot>,
    /// Registered physical nodes and their weights.
    weights: FnvHashMap<String, u32>,
    config: RingConfig,
}

impl HashRing {
    pub fn new(config: RingConfig) -> Result<Self> {
        if config.vnodes_per_weight_unit == 0 {
            return Err(RingError::InvalidConfig(
                "vnodes_per_weight_unit must be at least 1",
            ));
        }
        if config.replication_factor == 0 {
            return Err(RingError::InvalidConfig(
                "replication_factor must be at least 1",
            ));
        }
        Ok(Self {
            ring: BTreeMap::new(),
            weights: FnvHashMap::default(),
            config,
        })
    }

    /// Build a ring pre-seeded with `(name, weight)` pairs.
    pub fn with_nodes<I, S>(config: RingConfig, nodes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let mut ring = Self::new(config)?;
        for (name, weight) in nodes {
            ring.add_node(name.as_ref(), weight)?;
        }
        Ok(ring)
    }

    /// Register a node and scatter `vnodes_per_weight_unit * weight`
    /// virtual nodes for it across the ring.
    ///
    /// Existing positions are never touched, so keys only move onto the
    /// newcomer. Re-adding a registered name is an error; remove it first.
    pub fn add_node(&mut self, name: &str, weight: u32) -> Result<()> {
        if name.is_empty() {
            return Err(RingError::EmptyNodeName);
        }
        if weight == 0 {
            return Err(RingError::InvalidWeight(weight));
        }
        if self.weights.contains_key(name) {
            return Err(RingError::DuplicateNode(name.to_owned()));
        }

        let vnodes = self.config.vnodes_per_weight_unit * weight as usize;
        for index in 0..vnodes {
            let (pos, label) = self.claim_position(name, index);
            self.ring.insert(
                pos,
                Slot {
                    owner: name.to_owned(),
                    label,
                },
            );
        }
        self.weights.insert(name.to_owned(), weight);
        debug!(
            "added node {name} (weight {weight}, {vnodes} vnodes, ring now {})",
            self.ring.len()
        );
        Ok(())
    }

    /// Unregister a node and delete every position it owns.
    ///
    /// Removing a name that was never added is a no-op, so callers can
    /// fire-and-forget removals.
    pub fn remove_node(&mut self, name: &str) {
        let Some(weight) = self.weights.remove(name) else {
            return;
        };
        let vnodes = self.config.vnodes_per_weight_unit * weight as usize;
        for index in 0..vnodes {
            self.release_position(name, index);
        }
        debug!("removed node {name} ({vnodes} vnodes, ring now {})", self.ring.len());
    }

    /// The node that owns `key`: the owner of the first ring position at
    /// or clockwise of the key's hash. `Ok(None)` iff the ring is empty.
    ///
    /// O(log V) in the total vnode count.
    pub fn get_node(&self, key: &str) -> Result<Option<&str>> {
        Ok(self.slot(key)?.map(|s| s.owner.as_str()))
    }

    /// Like [`get_node`](Self::get_node), but also reports which vnode
    /// label the key landed on. Handy for explaining routing decisions.
    pub fn get_node_with_vnode(&self, key: &str) -> Result<Option<(&str, &str)>> {
        Ok(self
            .slot(key)?
            .map(|s| (s.owner.as_str(), s.label.as_str())))
    }

    /// The replica set for `key`: distinct physical owners in clockwise
    /// order from the key's hash, at most
    /// `min(replication_factor, registered node count)` of them.
    ///
    /// Empty iff the ring is empty. The order is deterministic for a
    /// fixed ring state and the first entry equals `get_node(key)`.
    pub fn get_replicas(&self, key: &str) -> Result<SmallVec<[&str; 4]>> {
        if key.is_empty() {
            return Err(RingError::EmptyKey);
        }
        let mut group = SmallVec::new();
        if self.ring.is_empty() {
            return Ok(group);
        }

        let pos = position(key);
        let want = self.config.replication_factor.min(self.weights.len());
        // Consecutive positions usually share an owner, so dedup by
        // physical node. `want` is small; `contains` on the vec beats
        // hashing here.
        let clockwise = self.ring.range(pos..).chain(self.ring.range(..pos));
        for (_, slot) in clockwise {
            let owner = slot.owner.as_str();
            if !group.contains(&owner) {
                group.push(owner);
                if group.len() == want {
                    break;
                }
            }
        }
        Ok(group)
    }

    /// Number of registered physical nodes.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Total virtual nodes currently on the ring.
    pub fn vnode_count(&self) -> usize {
        self.ring.len()
    }

    /// Registered `(name, weight)` pairs, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, u32)> {
        self.weights.iter().map(|(name, w)| (name.as_str(), *w))
    }

    pub fn config(&self) -> RingConfig {
        self.config
    }

    /// Clockwise-nearest occupied position for a key, wrapping past the
    /// top of the hash space back to the smallest position.
    fn slot(&self, key: &str) -> Result<Option<&Slot>> {
        if key.is_empty() {
            return Err(RingError::EmptyKey);
        }
        let pos = position(key);
        Ok(self
            .ring
            .range(pos..)
            .next()
            .or_else(|| self.ring.iter().next())
            .map(|(_, slot)| slot))
    }

    /// First unoccupied position on this vnode's perturbation chain.
    ///
    /// The chain is a pure function of `(name, index, attempt)`, so
    /// removal can replay it and find the exact same position. A taken
    /// slot bumps `attempt`; with 128-bit positions that basically never
    /// happens, but "basically never" is not a deletion strategy.
    fn claim_position(&self, name: &str, index: usize) -> (u128, String) {
        for attempt in 0u32.. {
            let label = vnode_label(name, index, attempt);
            let pos = position(&label);
            if !self.ring.contains_key(&pos) {
                return (pos, label);
            }
        }
        unreachable!("every position on a sha1 perturbation chain was taken")
    }

    /// Replay the insertion-time perturbation walk for one vnode and
    /// delete the position it claimed. A chain slot owned by another node
    /// was occupied at insertion time too, so we step past it; a vacant
    /// slot means its occupant has since left the ring, and insertion
    /// stepped past it as well.
    fn release_position(&mut self, name: &str, index: usize) {
        for attempt in 0u32.. {
            let pos = position(&vnode_label(name, index, attempt));
            if self.ring.get(&pos).is_some_and(|s| s.owner == name) {
                self.ring.remove(&pos);
                return;
            }
        }
    }
}

/// Label for one virtual node of a physical node. `attempt` stays 0 unless
/// the hashed position was already taken; bumping it perturbs the label so
/// insertion and removal derive the same chain of candidates.
fn vnode_label(name: &str, index: usize, attempt: u32) -> String {
    if attempt == 0 {
        format!("{name}#{index}")
    } else {
        format!("{name}#{index}#{attempt}")
    }
}
