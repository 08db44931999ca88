//! Splitting the output index space into disjoint work units.

use std::ops::Range;

/// Slice of the output matrix owned by exactly one work unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Region {
    Column(usize),
    Row(usize),
    Rows(Range<usize>),
}

impl Region {
    pub fn rows(&self, size: usize) -> Range<usize> {
        match self {
            Region::Column(_) => 0..size,
            Region::Row(row) => *row..row + 1,
            Region::Rows(rows) => rows.clone(),
        }
    }

    pub fn columns(&self, size: usize) -> Range<usize> {
        match self {
            Region::Column(column) => *column..column + 1,
            Region::Row(_) | Region::Rows(_) => 0..size,
        }
    }
}

/// Contiguous row blocks, one per available CPU.
///
/// Uses `min(size, parallelism)` blocks of `size / count` rows; the last
/// block also takes the remainder. Never produces an empty block.
///
/// ```
/// use matmul_pool::threaded::partition::cpu_blocks;
///
/// assert_eq!(cpu_blocks(101, 4), vec![0..25, 25..50, 50..75, 75..101]);
/// assert_eq!(cpu_blocks(3, 8), vec![0..1, 1..2, 2..3]);
/// ```
pub fn cpu_blocks(size: usize, parallelism: usize) -> Vec<Range<usize>> {
    if size == 0 {
        return Vec::new();
    }
    let count = parallelism.clamp(1, size);
    let block = size / count;

    (0..count)
        .map(|i| {
            let start = i * block;
            let end = if i + 1 == count { size } else { start + block };
            start..end
        })
        .collect()
}

/// True if `regions` cover every cell of a `size`×`size` output exactly once.
pub fn tiles(regions: &[Region], size: usize) -> bool {
    let mut counts = vec![0u32; size * size];
    for region in regions {
        let (rows, columns) = (region.rows(size), region.columns(size));
        if rows.end > size || columns.end > size {
            return false;
        }
        for row in rows {
            for column in columns.clone() {
                counts[row * size + column] += 1;
            }
        }
    }
    counts.iter().all(|&count| count == 1)
}
