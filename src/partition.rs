//! Partition refinement over a fixed universe `0..n`.
//!
//! All elements live in one pool of doubly linked lists, every block is a contiguous run in
//! that pool which is described by its head, tail and length. Refining a block relinks its
//! elements into fresh blocks, no element is ever copied, and merging blocks splices lists.

use itertools::Itertools;
use tracing::trace;

use crate::error::RefineError;

const NIL: usize = usize::MAX;

/// Handle of a block in a [`Partition`]. A handle becomes stale once its block is split
/// into several blocks or merged into another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(usize);

#[derive(Debug, Clone)]
struct Block {
    head: usize,
    tail: usize,
    len: usize,
    live: bool,
}

impl Block {
    fn empty() -> Self {
        Self {
            head: NIL,
            tail: NIL,
            len: 0,
            live: true,
        }
    }
}

/// A partition of the elements `0..n` into disjoint blocks.
#[derive(Debug, Clone)]
pub struct Partition {
    next: Vec<usize>,
    prev: Vec<usize>,
    block_of: Vec<usize>,
    blocks: Vec<Block>,
}

/// Iterator over the members of a block, in their relative order.
#[derive(Debug, Clone)]
pub struct Members<'a> {
    partition: &'a Partition,
    current: usize,
    remaining: usize,
}

impl Iterator for Members<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let element = self.current;
        self.current = self.partition.next[element];
        self.remaining -= 1;
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Members<'_> {}

impl Partition {
    /// Creates the coarsest partition of `0..size`, that is a single block which contains all
    /// elements in ascending order.
    pub fn new(size: usize) -> Self {
        let mut partition = Self {
            next: vec![NIL; size],
            prev: vec![NIL; size],
            block_of: vec![0; size],
            blocks: vec![Block::empty()],
        };
        for element in 0..size {
            partition.append(0, element);
        }
        partition
    }

    /// Returns the number of elements of the universe.
    pub fn universe_size(&self) -> usize {
        self.block_of.len()
    }

    /// Returns the number of blocks that are currently live.
    pub fn block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.live).count()
    }

    /// Iterates over the handles of all live blocks, in order of their creation.
    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.live)
            .map(|(i, _)| BlockId(i))
    }

    /// Returns the block that contains `element`.
    pub fn find(&self, element: usize) -> Result<BlockId, RefineError> {
        self.block_of
            .get(element)
            .map(|&b| BlockId(b))
            .ok_or(RefineError::UnknownElement {
                element,
                size: self.universe_size(),
            })
    }

    /// Returns the number of elements in `block`.
    pub fn len(&self, block: BlockId) -> Result<usize, RefineError> {
        Ok(self.live_block(block)?.len)
    }

    /// Iterates over the elements of `block`.
    pub fn members(&self, block: BlockId) -> Result<Members<'_>, RefineError> {
        let b = self.live_block(block)?;
        Ok(Members {
            partition: self,
            current: b.head,
            remaining: b.len,
        })
    }

    /// Splits `block` according to `classify`, which has to map every member to a code in
    /// `0..range`. There is one resulting block per code that actually occurs, and the blocks
    /// are ordered by the first occurrence of their code when scanning `block`. Within each
    /// of them, elements keep their relative order.
    ///
    /// If all members share the same code, the block stays as it is and its handle is
    /// returned. Otherwise the handle of `block` is retired. If a code is out of range, an
    /// error is returned and the partition is left untouched.
    pub fn refine<F>(
        &mut self,
        block: BlockId,
        mut classify: F,
        range: usize,
    ) -> Result<Vec<BlockId>, RefineError>
    where
        F: FnMut(usize) -> usize,
    {
        let classified: Vec<(usize, usize)> = self
            .members(block)?
            .map(|element| (element, classify(element)))
            .collect();
        if let Some(&(element, code)) = classified.iter().find(|(_, code)| *code >= range) {
            return Err(RefineError::CodeOutOfRange {
                element,
                code,
                range,
            });
        }

        if classified.iter().map(|(_, code)| code).all_equal() {
            return Ok(vec![block]);
        }

        self.blocks[block.0].live = false;
        let mut block_for_code = vec![NIL; range];
        let mut created = vec![];
        for (element, code) in classified {
            if block_for_code[code] == NIL {
                block_for_code[code] = self.blocks.len();
                created.push(BlockId(self.blocks.len()));
                self.blocks.push(Block::empty());
            }
            self.append(block_for_code[code], element);
        }
        trace!("refined {:?} into {:?}", block, created);
        Ok(created)
    }

    /// Appends the members of `others`, in the given order, to `target`. The handles of all
    /// blocks in `others` are retired, `target` stays valid.
    pub fn merge(&mut self, target: BlockId, others: &[BlockId]) -> Result<BlockId, RefineError> {
        self.live_block(target)?;
        for &b in others {
            self.live_block(b)?;
        }
        for &source in others.iter().filter(|&&b| b != target) {
            if !self.blocks[source.0].live {
                continue;
            }
            let moved: Vec<usize> = self.members(source)?.collect();
            for element in moved {
                self.block_of[element] = target.0;
            }
            let (head, tail, len) = {
                let s = &self.blocks[source.0];
                (s.head, s.tail, s.len)
            };
            if len > 0 {
                let t = &mut self.blocks[target.0];
                if t.len == 0 {
                    t.head = head;
                } else {
                    self.next[t.tail] = head;
                    self.prev[head] = t.tail;
                }
                t.tail = tail;
                t.len += len;
            }
            self.blocks[source.0].live = false;
        }
        Ok(target)
    }

    fn live_block(&self, block: BlockId) -> Result<&Block, RefineError> {
        match self.blocks.get(block.0) {
            Some(b) if b.live => Ok(b),
            _ => Err(RefineError::StaleBlock(block)),
        }
    }

    fn append(&mut self, block: usize, element: usize) {
        let b = &mut self.blocks[block];
        self.prev[element] = b.tail;
        self.next[element] = NIL;
        if b.len == 0 {
            b.head = element;
        } else {
            self.next[b.tail] = element;
        }
        b.tail = element;
        b.len += 1;
        self.block_of[element] = block;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(p: &Partition, blocks: &[BlockId]) -> Vec<Vec<usize>> {
        blocks
            .iter()
            .map(|&b| p.members(b).unwrap().collect())
            .collect()
    }

    fn assert_is_partition(p: &Partition) {
        let mut seen = vec![0; p.universe_size()];
        for block in p.blocks() {
            for element in p.members(block).unwrap() {
                seen[element] += 1;
                assert_eq!(p.find(element).unwrap(), block);
            }
        }
        assert!(seen.iter().all(|&count| count == 1), "{seen:?}");
    }

    #[test]
    fn blocks_are_ordered_by_first_occurrence() {
        let mut p = Partition::new(6);
        let root = p.find(0).unwrap();
        // codes: 2 1 2 0 1 0, so the blocks appear in order 2, 1, 0
        let codes = [2, 1, 2, 0, 1, 0];
        let blocks = p.refine(root, |e| codes[e], 3).unwrap();
        assert_eq!(
            contents(&p, &blocks),
            vec![vec![0, 2], vec![1, 4], vec![3, 5]]
        );
        assert_eq!(p.block_count(), 3);
        assert_is_partition(&p);
    }

    #[test]
    fn single_class_keeps_the_block() {
        let mut p = Partition::new(4);
        let root = p.find(0).unwrap();
        assert_eq!(p.refine(root, |_| 0, 1).unwrap(), vec![root]);
        assert_eq!(p.len(root).unwrap(), 4);
    }

    #[test]
    fn stale_handles_and_bad_codes_are_rejected() {
        let mut p = Partition::new(4);
        let root = p.find(0).unwrap();
        assert_eq!(
            p.refine(root, |e| e, 3),
            Err(RefineError::CodeOutOfRange {
                element: 3,
                code: 3,
                range: 3
            })
        );
        // nothing happened
        assert_eq!(p.members(root).unwrap().collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        p.refine(root, |e| e % 2, 2).unwrap();
        assert_eq!(p.len(root), Err(RefineError::StaleBlock(root)));
        assert!(p.refine(root, |_| 0, 1).is_err());
        assert!(p.find(17).is_err());
    }

    #[test]
    fn repeated_refinement_keeps_a_partition() {
        let mut p = Partition::new(50);
        for modulus in [1, 2, 3, 5, 7] {
            let block = p.find(0).unwrap();
            p.refine(block, |x| x % modulus, modulus).unwrap();
            assert_is_partition(&p);
        }
        // element 0 is now only grouped with multiples of 210
        assert_eq!(p.members(p.find(0).unwrap()).unwrap().collect::<Vec<_>>(), vec![0]);
        // refine every other block on some other criterion
        let all: Vec<_> = p.blocks().collect();
        for block in all {
            p.refine(block, |x| x % 4, 4).unwrap();
        }
        assert_is_partition(&p);
    }

    #[test]
    fn merging_concatenates() {
        let mut p = Partition::new(5);
        let root = p.find(0).unwrap();
        let blocks = p.refine(root, |e| e % 2, 2).unwrap();
        let merged = p.merge(blocks[1], &[blocks[0]]).unwrap();
        assert_eq!(merged, blocks[1]);
        assert_eq!(
            p.members(merged).unwrap().collect::<Vec<_>>(),
            vec![1, 3, 0, 2, 4]
        );
        assert_eq!(p.block_count(), 1);
        assert!(p.len(blocks[0]).is_err());
        assert_is_partition(&p);
    }
}
