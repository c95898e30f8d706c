/// Tiles from a search's goal back to, but excluding, its start.
///
/// Tiles are stored goal-first, so the next step toward the goal is the last
/// element and consuming the path is a cheap `pop`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    cells: Vec<usize>,
}

impl Path {
    /// A path from goal-first tile indices.
    pub fn from_goal_first(cells: Vec<usize>) -> Self {
        Self { cells }
    }

    /// Number of remaining steps.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The tile to move to next.
    #[inline]
    pub fn next_step(&self) -> Option<usize> {
        self.cells.last().copied()
    }

    /// Remove and return the tile to move to next.
    pub fn pop_next(&mut self) -> Option<usize> {
        self.cells.pop()
    }

    /// The final tile, if any steps remain.
    pub fn goal(&self) -> Option<usize> {
        self.cells.first().copied()
    }

    /// Raw goal-first storage.
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// Remaining tiles in walking order, next step first.
    pub fn iter_from_start(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.cells.iter().rev().copied()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
