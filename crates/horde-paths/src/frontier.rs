//! Indexed min-heap used as the A* open set.
//!
//! Entries are `(f, tile index)` pairs. The heap pops the lowest `f` first
//! and breaks ties by the lower tile index, i.e. the tile further up and then
//! further left. A slot map from tile index to heap position gives O(1)
//! membership tests and O(log n) decrease-key.

const ABSENT: usize = usize::MAX;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Entry {
    f: i32,
    index: usize,
}

impl Entry {
    #[inline]
    fn key(self) -> (i32, usize) {
        (self.f, self.index)
    }
}

/// Open set of a search: each tile at most once, keyed by total cost.
#[derive(Clone, Debug, Default)]
pub struct Frontier {
    heap: Vec<Entry>,
    slots: Vec<usize>,
}

impl Frontier {
    /// Create an empty frontier for a grid of `len` tiles.
    pub fn with_len(len: usize) -> Self {
        Self {
            heap: Vec::new(),
            slots: vec![ABSENT; len],
        }
    }

    /// Remove every entry and resize the slot map for `len` tiles.
    pub fn reset(&mut self, len: usize) {
        self.heap.clear();
        self.slots.clear();
        self.slots.resize(len, ABSENT);
    }

    /// Number of queued tiles.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether tile `index` is queued.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|&s| s != ABSENT)
    }

    /// Queue tile `index` with cost `f`, or move it to `f` if already queued.
    pub fn push(&mut self, index: usize, f: i32) {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, ABSENT);
        }
        match self.slots[index] {
            ABSENT => {
                let pos = self.heap.len();
                self.heap.push(Entry { f, index });
                self.slots[index] = pos;
                self.sift_up(pos);
            }
            pos => {
                let old = self.heap[pos].f;
                self.heap[pos].f = f;
                if f < old {
                    self.sift_up(pos);
                } else {
                    self.sift_down(pos);
                }
            }
        }
    }

    /// Remove and return the entry with the lowest `(f, index)`.
    pub fn pop(&mut self) -> Option<(i32, usize)> {
        let last = self.heap.len().checked_sub(1)?;
        self.swap(0, last);
        let top = self.heap.pop()?;
        self.slots[top.index] = ABSENT;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some((top.f, top.index))
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[pos].key() >= self.heap[parent].key() {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < n && self.heap[left].key() < self.heap[smallest].key() {
                smallest = left;
            }
            if right < n && self.heap[right].key() < self.heap[smallest].key() {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    #[inline]
    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.slots[self.heap[a].index] = a;
        self.slots[self.heap[b].index] = b;
    }
}
