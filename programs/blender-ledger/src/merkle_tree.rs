use crate::{
    errors::{LedgerError, LedgerResult},
    field::FieldElement,
    hasher::{FieldHasher, zero_hashes},
    state::CommitmentMerkleTree,
};
use tracing::warn;

/// Standard append-only merkle tree operations for the commitment tree.
///
/// The tree has no genesis sentinel leaf. The `next_index` field starts at 0
/// after initialization, and the first commitment is inserted at index 0.
///
/// Insertion is split into [`MerkleTree::prepare_append`], which computes every
/// new node without touching the tree, and [`MerkleTree::apply_append`], which
/// writes them and cannot fail. Callers that must stay atomic run every
/// fallible check (including the prepare step) before any mutation.
pub struct MerkleTree;

/// Nodes produced by inserting one leaf, ready to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAppend {
    leaf_index: u64,
    /// `path[k]` is the new level-`k` node on the leaf's path;
    /// `path[0]` is the leaf and `path[height]` the new root.
    path: Vec<FieldElement>,
}

impl PendingAppend {
    /// Index the leaf will occupy.
    pub fn leaf_index(&self) -> u64 {
        self.leaf_index
    }

    /// Root the tree will have once the append is applied.
    pub fn new_root(&self) -> FieldElement {
        self.path.last().copied().unwrap_or_default()
    }
}

/// Sibling hashes and directions from a leaf up to a root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticationPath {
    /// Index of the leaf this path authenticates
    pub leaf_index: u64,
    /// Sibling at each level, leaf level first
    pub siblings: Vec<FieldElement>,
    /// `directions[i]` is bit `i` of the leaf index: `true` means the node on
    /// the path is a right child and its sibling sits on the left
    pub directions: Vec<bool>,
}

impl AuthenticationPath {
    /// Recombine `leaf` with the siblings, following the directions.
    ///
    /// # Errors
    /// Returns `HashFailure` if any value is not canonical.
    pub fn compute_root<H: FieldHasher>(&self, leaf: &FieldElement) -> LedgerResult<FieldElement> {
        let mut current = *leaf;
        for (sibling, is_right) in self.siblings.iter().zip(self.directions.iter()) {
            current = if *is_right {
                H::hash_left_right(sibling, &current)?
            } else {
                H::hash_left_right(&current, sibling)?
            };
        }
        Ok(current)
    }

    /// Whether `leaf` recombines to `root` along this path.
    pub fn verifies<H: FieldHasher>(&self, leaf: &FieldElement, root: &FieldElement) -> bool {
        self.siblings.len() == self.directions.len()
            && matches!(self.compute_root::<H>(leaf), Ok(computed) if computed == *root)
    }
}

impl MerkleTree {
    /// Initialize the commitment merkle tree with zero values.
    ///
    /// After initialization:
    /// - `next_index = 0` (first insertion goes to index 0)
    /// - `root` = zero hash at tree height
    /// - `root_history[0]` = initial root
    ///
    /// # Errors
    /// Returns `HashFailure` if `zero_value` is not canonical.
    pub fn initialize<H: FieldHasher>(
        tree: &mut CommitmentMerkleTree,
        zero_value: &FieldElement,
    ) -> LedgerResult<()> {
        let height = tree.height as usize;

        tree.zeros = zero_hashes::<H>(zero_value, tree.height)?;
        let initial_root = tree.zeros[height];
        tree.root = initial_root;
        tree.root_index = 0;
        tree.root_history[0] = initial_root;

        Ok(())
    }

    /// Compute the nodes produced by appending `leaf`, without mutating.
    ///
    /// # Errors
    /// - `NonCanonicalFieldElement` if `leaf >= r`
    /// - `TreeFull` if all `2^height` leaves are taken
    pub fn prepare_append<H: FieldHasher>(
        tree: &CommitmentMerkleTree,
        leaf: &FieldElement,
    ) -> LedgerResult<PendingAppend> {
        if !leaf.is_canonical() {
            return Err(LedgerError::NonCanonicalFieldElement);
        }

        let height = tree.height as usize;
        if tree.next_index >= tree.capacity() {
            warn!(capacity = tree.capacity(), "merkle tree full");
            return Err(LedgerError::TreeFull);
        }

        let mut current_index = tree.next_index;
        let mut current_level_hash = *leaf;
        let mut path = Vec::with_capacity(height + 1);
        path.push(current_level_hash);

        for i in 0..height {
            let (left, right) = if current_index.is_multiple_of(2) {
                (current_level_hash, tree.zeros[i])
            } else {
                let left = tree
                    .node(i, current_index - 1)
                    .ok_or(LedgerError::LeafIndexOutOfRange)?;
                (left, current_level_hash)
            };
            current_level_hash = H::hash_left_right(&left, &right)?;
            path.push(current_level_hash);
            current_index /= 2;
        }

        Ok(PendingAppend {
            leaf_index: tree.next_index,
            path,
        })
    }

    /// Write a prepared append. Returns the leaf index.
    ///
    /// The pending append must come from `prepare_append` on this tree with
    /// no other append applied in between.
    pub fn apply_append(tree: &mut CommitmentMerkleTree, pending: PendingAppend) -> u64 {
        debug_assert_eq!(pending.leaf_index, tree.next_index, "stale pending append");
        let index = pending.leaf_index;

        for (level, value) in pending.path.iter().enumerate() {
            let position = (index >> level) as usize;
            let level_nodes = &mut tree.nodes[level];
            if position < level_nodes.len() {
                level_nodes[position] = *value;
            } else {
                level_nodes.push(*value);
            }
        }

        let new_root = pending.new_root();
        tree.root = new_root;
        tree.next_index = index + 1;

        let root_history_size = tree.root_history_size as u64;
        let new_root_index = (tree.root_index + 1) % root_history_size;
        tree.root_index = new_root_index;
        tree.root_history[new_root_index as usize] = new_root;

        if let Some(leaf) = pending.path.first() {
            tree.positions.entry(*leaf).or_insert(index);
        }

        index
    }

    /// Append `leaf` and return its index.
    ///
    /// # Errors
    /// See [`MerkleTree::prepare_append`].
    pub fn append<H: FieldHasher>(
        tree: &mut CommitmentMerkleTree,
        leaf: &FieldElement,
    ) -> LedgerResult<u64> {
        let pending = Self::prepare_append::<H>(tree, leaf)?;
        Ok(Self::apply_append(tree, pending))
    }

    /// Whether `root` is the current root or one of the retained prior roots.
    pub fn is_known_root(tree: &CommitmentMerkleTree, root: &FieldElement) -> bool {
        if root.is_zero() {
            return false;
        }

        let root_history_size = tree.root_history_size as usize;
        let current_root_index = tree.root_index as usize;

        // Search backwards through the circular root history buffer
        for offset in 0..root_history_size {
            let i = (current_root_index + root_history_size - offset) % root_history_size;
            if *root == tree.root_history[i] {
                return true;
            }
        }

        false
    }

    /// Authentication path for `index` against the current root.
    ///
    /// # Errors
    /// Returns `LeafIndexOutOfRange` if no leaf sits at `index`.
    pub fn auth_path<H: FieldHasher>(
        tree: &CommitmentMerkleTree,
        index: u64,
    ) -> LedgerResult<AuthenticationPath> {
        Self::auth_path_at::<H>(tree, index, tree.next_index)
    }

    /// Authentication path for `index` against the root the tree had when it
    /// held `leaf_count` leaves.
    ///
    /// # Errors
    /// Returns `LeafIndexOutOfRange` unless `index < leaf_count <= next_index`.
    pub fn auth_path_at<H: FieldHasher>(
        tree: &CommitmentMerkleTree,
        index: u64,
        leaf_count: u64,
    ) -> LedgerResult<AuthenticationPath> {
        if leaf_count > tree.next_index || index >= leaf_count {
            return Err(LedgerError::LeafIndexOutOfRange);
        }

        let height = tree.height as usize;
        let mut siblings = Vec::with_capacity(height);
        let mut directions = Vec::with_capacity(height);
        for level in 0..height {
            let position = index >> level;
            siblings.push(Self::node_at::<H>(tree, level, position ^ 1, leaf_count)?);
            directions.push(position & 1 == 1);
        }

        Ok(AuthenticationPath {
            leaf_index: index,
            siblings,
            directions,
        })
    }

    /// Root of the tree as it was when it held `leaf_count` leaves.
    ///
    /// # Errors
    /// Returns `LeafIndexOutOfRange` if `leaf_count > next_index`.
    pub fn root_at<H: FieldHasher>(
        tree: &CommitmentMerkleTree,
        leaf_count: u64,
    ) -> LedgerResult<FieldElement> {
        if leaf_count > tree.next_index {
            return Err(LedgerError::LeafIndexOutOfRange);
        }
        Self::node_at::<H>(tree, tree.height as usize, 0, leaf_count)
    }

    /// Value of node `(level, position)` when the tree held `leaf_count` leaves.
    fn node_at<H: FieldHasher>(
        tree: &CommitmentMerkleTree,
        level: usize,
        position: u64,
        leaf_count: u64,
    ) -> LedgerResult<FieldElement> {
        let start = position << level;
        let end = start + (1u64 << level);

        if start >= leaf_count {
            return Ok(tree.zeros[level]);
        }
        // Filled subtrees are final; everything stored is current at next_index.
        if end <= leaf_count || leaf_count == tree.next_index {
            return tree
                .node(level, position)
                .ok_or(LedgerError::LeafIndexOutOfRange);
        }

        let left = Self::node_at::<H>(tree, level - 1, position * 2, leaf_count)?;
        let right = Self::node_at::<H>(tree, level - 1, position * 2 + 1, leaf_count)?;
        H::hash_left_right(&left, &right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Poseidon;
    use crate::state::{COMMITMENT_TREE_HEIGHT, ROOT_HISTORY_WINDOW, ZERO_VALUE};

    fn create_test_tree(height: u8, window: u32) -> CommitmentMerkleTree {
        let mut tree = CommitmentMerkleTree::allocate(height, window);
        MerkleTree::initialize::<Poseidon>(&mut tree, &ZERO_VALUE).unwrap();
        tree
    }

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    #[test]
    fn test_initial_root_is_zero_hash_at_height() {
        let tree = create_test_tree(COMMITMENT_TREE_HEIGHT, ROOT_HISTORY_WINDOW);
        let zeros = zero_hashes::<Poseidon>(&ZERO_VALUE, COMMITMENT_TREE_HEIGHT).unwrap();

        assert_eq!(
            tree.root(),
            zeros[COMMITMENT_TREE_HEIGHT as usize],
            "Initial root should be the zero hash at height {}",
            COMMITMENT_TREE_HEIGHT
        );
        assert_eq!(tree.next_index(), 0);
    }

    #[test]
    fn test_initial_root_is_known() {
        let tree = create_test_tree(5, 4);
        assert!(
            MerkleTree::is_known_root(&tree, &tree.root()),
            "Initial root should be a known root"
        );
    }

    #[test]
    fn test_zero_root_is_not_known() {
        let tree = create_test_tree(5, 4);
        assert!(
            !MerkleTree::is_known_root(&tree, &FieldElement::ZERO),
            "Zero root should not be a known root"
        );
    }

    #[test]
    fn test_two_leaf_root_height_5() {
        let mut tree = create_test_tree(5, 30);
        MerkleTree::append::<Poseidon>(&mut tree, &fe(123)).unwrap();
        MerkleTree::append::<Poseidon>(&mut tree, &fe(456)).unwrap();

        // 123 and 456 are siblings; every level above pairs with an empty subtree.
        let zeros = zero_hashes::<Poseidon>(&ZERO_VALUE, 5).unwrap();
        let mut expected = Poseidon::hash_left_right(&fe(123), &fe(456)).unwrap();
        for zero in &zeros[1..5] {
            expected = Poseidon::hash_left_right(&expected, zero).unwrap();
        }

        assert_eq!(tree.root(), expected);
        assert_eq!(tree.next_index(), 2);
        assert_eq!(tree.leaf_index(&fe(456)), Some(1));
    }

    #[test]
    fn test_root_changes_after_every_insert() {
        let mut tree = create_test_tree(6, 30);
        let mut previous = tree.root();
        for i in 1..=20 {
            MerkleTree::append::<Poseidon>(&mut tree, &fe(i * 1000 + 7)).unwrap();
            assert_ne!(tree.root(), previous, "Root should change on insert {}", i);
            previous = tree.root();
        }
    }

    #[test]
    fn test_auth_paths_reproduce_roots() {
        let mut tree = create_test_tree(4, 30);
        let mut roots_after = Vec::new();
        for i in 0..11 {
            MerkleTree::append::<Poseidon>(&mut tree, &fe(50 + i)).unwrap();
            roots_after.push(tree.root());
        }

        for index in 0..11u64 {
            let leaf = fe(50 + index);

            let current = MerkleTree::auth_path::<Poseidon>(&tree, index).unwrap();
            assert!(current.verifies::<Poseidon>(&leaf, &tree.root()));

            // Against the root recorded right after this leaf went in.
            let historical =
                MerkleTree::auth_path_at::<Poseidon>(&tree, index, index + 1).unwrap();
            assert_eq!(
                historical.compute_root::<Poseidon>(&leaf).unwrap(),
                roots_after[index as usize],
                "Path for leaf {} should rebuild its insertion-time root",
                index
            );

            for (level, direction) in current.directions.iter().enumerate() {
                assert_eq!(*direction, (index >> level) & 1 == 1);
            }
        }
    }

    #[test]
    fn test_root_at_matches_history() {
        let mut tree = create_test_tree(3, 30);
        let mut roots = vec![tree.root()];
        for i in 0..8 {
            MerkleTree::append::<Poseidon>(&mut tree, &fe(900 + i)).unwrap();
            roots.push(tree.root());
        }
        for (count, root) in roots.iter().enumerate() {
            assert_eq!(
                MerkleTree::root_at::<Poseidon>(&tree, count as u64).unwrap(),
                *root,
                "root_at({}) mismatch",
                count
            );
        }
        assert_eq!(
            MerkleTree::root_at::<Poseidon>(&tree, 9),
            Err(LedgerError::LeafIndexOutOfRange)
        );
    }

    #[test]
    fn test_tree_full() {
        let mut tree = create_test_tree(2, 4);
        for i in 0..4 {
            assert_eq!(MerkleTree::append::<Poseidon>(&mut tree, &fe(i + 1)).unwrap(), i);
        }
        let before = tree.clone();
        assert_eq!(
            MerkleTree::append::<Poseidon>(&mut tree, &fe(99)),
            Err(LedgerError::TreeFull)
        );
        assert_eq!(tree, before, "Failed append should not mutate the tree");
    }

    #[test]
    fn test_non_canonical_leaf_rejected() {
        let mut tree = create_test_tree(3, 4);
        assert_eq!(
            MerkleTree::append::<Poseidon>(&mut tree, &FieldElement([0xff; 32])),
            Err(LedgerError::NonCanonicalFieldElement)
        );
        assert_eq!(tree.next_index(), 0);
    }

    #[test]
    fn test_prepare_does_not_mutate() {
        let mut tree = create_test_tree(4, 4);
        MerkleTree::append::<Poseidon>(&mut tree, &fe(1)).unwrap();
        let before = tree.clone();

        let pending = MerkleTree::prepare_append::<Poseidon>(&tree, &fe(2)).unwrap();
        assert_eq!(tree, before);
        assert_eq!(pending.leaf_index(), 1);

        let expected_root = pending.new_root();
        MerkleTree::apply_append(&mut tree, pending);
        assert_eq!(tree.root(), expected_root);
    }

    #[test]
    fn test_root_history_window() {
        let window = 3;
        let mut tree = create_test_tree(5, window);
        MerkleTree::append::<Poseidon>(&mut tree, &fe(1)).unwrap();
        let anchored = tree.root();

        // Known for `window` further inserts...
        for i in 0..window as u64 {
            MerkleTree::append::<Poseidon>(&mut tree, &fe(10 + i)).unwrap();
            assert!(
                MerkleTree::is_known_root(&tree, &anchored),
                "Root should still be known after {} inserts",
                i + 1
            );
        }

        // ...and evicted by the next one.
        MerkleTree::append::<Poseidon>(&mut tree, &fe(99)).unwrap();
        assert!(
            !MerkleTree::is_known_root(&tree, &anchored),
            "Root should be evicted after window + 1 inserts"
        );
    }

    #[test]
    fn test_auth_path_out_of_range() {
        let mut tree = create_test_tree(3, 4);
        MerkleTree::append::<Poseidon>(&mut tree, &fe(1)).unwrap();
        assert_eq!(
            MerkleTree::auth_path::<Poseidon>(&tree, 1),
            Err(LedgerError::LeafIndexOutOfRange)
        );
        assert_eq!(
            MerkleTree::auth_path_at::<Poseidon>(&tree, 0, 2),
            Err(LedgerError::LeafIndexOutOfRange)
        );
    }
}
