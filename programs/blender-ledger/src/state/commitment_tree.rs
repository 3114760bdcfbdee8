use std::collections::BTreeMap;

use crate::field::FieldElement;

/// Default height of the commitment merkle tree (2^20 = 1M leaves)
pub const COMMITMENT_TREE_HEIGHT: u8 = 20;

/// Largest supported tree height (2^32 leaves).
pub const MAX_TREE_HEIGHT: u8 = 32;

/// Number of prior roots accepted besides the current one.
/// Proofs built against any of the last 30 roots remain admissible.
pub const ROOT_HISTORY_WINDOW: u32 = 30;

/// Upper bound on the configurable root history window.
pub const MAX_ROOT_HISTORY_WINDOW: u32 = 1 << 16;

/// Value of an empty leaf: `keccak256("blender") mod r`.
/// = 1370249852395389490700185797340442620366735189419093909046557908847258978065
pub const ZERO_VALUE: FieldElement = FieldElement([
    0x03, 0x07, 0x88, 0xaf, 0xce, 0x09, 0xac, 0x50, 0x70, 0x0d, 0xf9, 0x71, 0xc8, 0x42, 0x1f, 0x89,
    0x36, 0xea, 0x07, 0x56, 0xb8, 0xe1, 0xd4, 0xf0, 0x93, 0xd7, 0x5f, 0x8e, 0x09, 0x03, 0x47, 0x11,
]);

/// Commitment merkle tree state.
///
/// This is a standard append-only merkle tree. It has no genesis sentinel
/// leaf, so `next_index` starts at 0 and the first commitment lands at index 0.
///
/// # Node Storage
///
/// `nodes[k][i]` holds the latest value of the level-`k` node at position `i`
/// for every node that covers at least one leaf (`nodes[0]` are the leaves,
/// `nodes[height][0]` is the root once the first leaf is in).
/// Nodes covering no leaf are the level's zero hash and are never stored.
/// A node whose subtree is completely filled never changes again, which is
/// what lets paths against older roots be rebuilt from the same storage.
///
/// # Root History
///
/// `root_history` is a ring of `root_history_size = window + 1` slots: the
/// current root plus the `window` roots before it. `root_index` is the ring
/// cursor pointing at the current root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitmentMerkleTree {
    /// Next index for insertion. Starts at 0.
    pub(crate) next_index: u64,
    /// Index into root_history (circular buffer cursor)
    pub(crate) root_index: u64,
    /// Tree height (constant after init)
    pub(crate) height: u8,
    /// Size of root history circular buffer
    pub(crate) root_history_size: u32,
    /// Current root of the tree
    pub(crate) root: FieldElement,
    /// Empty-subtree hash per level, `zeros[height]` is the empty root
    pub(crate) zeros: Vec<FieldElement>,
    /// Non-empty nodes per level, see type docs
    pub(crate) nodes: Vec<Vec<FieldElement>>,
    /// History of past roots for proof verification
    pub(crate) root_history: Vec<FieldElement>,
    /// Leaf value to leaf index
    pub(crate) positions: BTreeMap<FieldElement, u64>,
}

impl CommitmentMerkleTree {
    /// Allocate an uninitialized tree. Call `MerkleTree::initialize` before use.
    pub(crate) fn allocate(height: u8, root_history_window: u32) -> Self {
        let root_history_size = root_history_window.saturating_add(1);
        Self {
            next_index: 0,
            root_index: 0,
            height,
            root_history_size,
            root: FieldElement::ZERO,
            zeros: Vec::new(),
            nodes: vec![Vec::new(); height as usize + 1],
            root_history: vec![FieldElement::ZERO; root_history_size as usize],
            positions: BTreeMap::new(),
        }
    }

    /// Number of leaves inserted so far.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Tree height.
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Maximum number of leaves (`2^height`).
    pub fn capacity(&self) -> u64 {
        1u64 << self.height
    }

    /// Current root.
    pub fn root(&self) -> FieldElement {
        self.root
    }

    /// Number of roots retained, including the current one.
    pub fn root_history_size(&self) -> u32 {
        self.root_history_size
    }

    /// Empty-subtree hash at `level`.
    pub fn zero(&self, level: usize) -> Option<FieldElement> {
        self.zeros.get(level).copied()
    }

    /// Leaf stored at `index`.
    pub fn leaf(&self, index: u64) -> Option<FieldElement> {
        let index = usize::try_from(index).ok()?;
        self.nodes.first()?.get(index).copied()
    }

    /// All leaves in insertion order.
    pub fn leaves(&self) -> &[FieldElement] {
        self.nodes.first().map_or(&[], Vec::as_slice)
    }

    /// Index of `leaf`, if it was inserted.
    pub fn leaf_index(&self, leaf: &FieldElement) -> Option<u64> {
        self.positions.get(leaf).copied()
    }

    /// Whether `leaf` was inserted.
    pub fn contains(&self, leaf: &FieldElement) -> bool {
        self.positions.contains_key(leaf)
    }

    /// Stored node at `(level, position)`, if that subtree covers any leaf.
    pub(crate) fn node(&self, level: usize, position: u64) -> Option<FieldElement> {
        let position = usize::try_from(position).ok()?;
        self.nodes.get(level)?.get(position).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{hasher::Poseidon, merkle_tree::MerkleTree};

    #[test]
    fn test_leaf_lookup() {
        let mut tree = CommitmentMerkleTree::allocate(3, 4);
        MerkleTree::initialize::<Poseidon>(&mut tree, &ZERO_VALUE).unwrap();
        assert_eq!(tree.capacity(), 8);
        assert_eq!(tree.root_history_size(), 5);
        assert!(tree.leaves().is_empty());

        for value in [40, 41, 42] {
            MerkleTree::append::<Poseidon>(&mut tree, &FieldElement::from_u64(value)).unwrap();
        }

        assert_eq!(tree.next_index(), 3);
        assert_eq!(tree.leaf(1), Some(FieldElement::from_u64(41)));
        assert_eq!(tree.leaf(3), None);
        assert_eq!(tree.leaf_index(&FieldElement::from_u64(42)), Some(2));
        assert!(!tree.contains(&FieldElement::from_u64(43)));
        assert_eq!(tree.leaves().len(), 3);
    }
}
