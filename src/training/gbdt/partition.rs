//! Row partitioning for tree growing.
//!
//! All sampled rows live in one index buffer. Every node owns a contiguous
//! range of it, and splitting a node rearranges its range in place so the
//! left child's rows come first. The partition is stable: rows stay
//! ascending inside every range, which keeps histogram sums in a fixed order.

use crate::repr::NodeId;

/// Owns the row index buffer and the node-to-range map.
#[derive(Debug, Clone)]
pub struct RowPartitioner {
    indices: Vec<u32>,
    scratch: Vec<u32>,
    /// `(start, end)` per node id; empty for nodes without rows.
    ranges: Vec<(usize, usize)>,
}

impl RowPartitioner {
    /// Root node 0 holds all of `rows`.
    pub fn new(rows: Vec<u32>) -> Self {
        let n = rows.len();
        Self {
            indices: rows,
            scratch: Vec::with_capacity(n),
            ranges: vec![(0, n)],
        }
    }

    /// Rows of a node.
    #[inline]
    pub fn rows(&self, node: NodeId) -> &[u32] {
        let (start, end) = self.ranges.get(node as usize).copied().unwrap_or((0, 0));
        &self.indices[start..end]
    }

    #[inline]
    pub fn n_rows(&self, node: NodeId) -> usize {
        self.rows(node).len()
    }

    /// Move `node`'s rows into `left` and `right`; returns the row counts.
    pub fn split(
        &mut self,
        node: NodeId,
        left: NodeId,
        right: NodeId,
        mut goes_left: impl FnMut(u32) -> bool,
    ) -> (usize, usize) {
        let (start, end) = self.ranges[node as usize];
        self.scratch.clear();
        let mut write = start;
        for read in start..end {
            let row = self.indices[read];
            if goes_left(row) {
                self.indices[write] = row;
                write += 1;
            } else {
                self.scratch.push(row);
            }
        }
        self.indices[write..end].copy_from_slice(&self.scratch);

        let needed = left.max(right) as usize + 1;
        if self.ranges.len() < needed {
            self.ranges.resize(needed, (0, 0));
        }
        self.ranges[left as usize] = (start, write);
        self.ranges[right as usize] = (write, end);
        (write - start, end - write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_is_stable() {
        let mut partitioner = RowPartitioner::new(vec![1, 2, 4, 5, 7, 8, 9]);
        let (nl, nr) = partitioner.split(0, 1, 2, |row| row % 2 == 0);
        assert_eq!((nl, nr), (3, 4));
        assert_eq!(partitioner.rows(1), &[2, 4, 8]);
        assert_eq!(partitioner.rows(2), &[1, 5, 7, 9]);

        partitioner.split(2, 3, 4, |row| row > 5);
        assert_eq!(partitioner.rows(3), &[7, 9]);
        assert_eq!(partitioner.rows(4), &[1, 5]);
        // Siblings are untouched.
        assert_eq!(partitioner.rows(1), &[2, 4, 8]);
    }

    #[test]
    fn test_empty_side() {
        let mut partitioner = RowPartitioner::new(vec![0, 1]);
        assert_eq!(partitioner.split(0, 1, 2, |_| true), (2, 0));
        assert!(partitioner.rows(2).is_empty());
        assert_eq!(partitioner.n_rows(1), 2);
    }
}
