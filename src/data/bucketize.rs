//! Bucket boundary construction and compact bucket index storage.
//!
//! A bucketized float feature stores one small integer per row plus a shared
//! [`BucketBoundaries`] table:
//!
//! ```text
//! bucket:       0      1      2      3     ...   B-1
//! bucket_max:  NaN    0.5    1.0    2.0    ...   f64::MAX
//! bucket_min:  NaN    0.1    0.7    1.5    ...   (lowest value seen)
//! ```
//!
//! Bucket 0 is reserved for missing (NaN) values. Bucket maxima are strictly
//! increasing, and the last bucket always has `f64::MAX` as its upper bound so
//! every finite value maps to some bucket.

use std::collections::BTreeMap;

/// Default number of buckets for a bucketized float column.
pub const DEFAULT_NUM_BUCKETS: usize = 256;

/// Bucket index of missing values.
pub const MISSING_BUCKET: u32 = 0;

// =============================================================================
// BucketBoundaries
// =============================================================================

/// Per-feature boundary table, fixed at bucketization time.
///
/// Shared (via `Arc`) between a column and every slice taken from it so that
/// bucket semantics stay comparable across training and later evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketBoundaries {
    maxs: Box<[f64]>,
    mins: Box<[f64]>,
}

impl BucketBoundaries {
    /// Build boundaries from raw values.
    ///
    /// `num_buckets` counts every bucket, the missing bucket and the
    /// `f64::MAX` bucket included, so the result never has more than
    /// `max(num_buckets, 3)` buckets. Any single value whose count reaches
    /// the average value bucket capacity gets its own bucket; the remaining
    /// values are binned uniformly by count. Bucket minima are filled in by
    /// [`observe`](Self::observe) while encoding.
    pub fn from_values(values: &[f64], num_buckets: usize) -> Self {
        let value_buckets = num_buckets.max(3) - 2;

        let mut counts: BTreeMap<OrderedF64, usize> = BTreeMap::new();
        let mut present = 0usize;
        for &v in values {
            if !v.is_nan() {
                *counts.entry(OrderedF64(v)).or_insert(0) += 1;
                present += 1;
            }
        }

        // Rounding capacities up keeps the bucket count within budget.
        let capacity = present.div_ceil(value_buckets).max(1);
        let mut maxs: Vec<f64> = Vec::new();
        let mut left_over = present;

        // Heavy values first: they always get a dedicated bucket.
        counts.retain(|value, count| {
            if *count >= capacity {
                maxs.push(value.0);
                left_over -= *count;
                false
            } else {
                true
            }
        });

        let remaining_buckets = value_buckets.saturating_sub(maxs.len()).max(1);
        let left_over_capacity = left_over.div_ceil(remaining_buckets).max(1);
        uniform_binning(&counts, left_over_capacity, &mut maxs);

        maxs.sort_by(f64::total_cmp);
        maxs.dedup();
        if maxs.last() != Some(&f64::MAX) {
            maxs.push(f64::MAX);
        }

        let mut all = Vec::with_capacity(maxs.len() + 1);
        all.push(f64::NAN);
        all.extend(maxs);

        Self {
            mins: all.clone().into_boxed_slice(),
            maxs: all.into_boxed_slice(),
        }
    }

    /// Number of buckets, including the missing bucket.
    #[inline]
    pub fn n_buckets(&self) -> usize {
        self.maxs.len()
    }

    /// Upper bound of a bucket.
    #[inline]
    pub fn bucket_max(&self, bucket: u32) -> f64 {
        self.maxs[bucket as usize]
    }

    /// Smallest value observed in a bucket (equals the max when the bucket
    /// never received a value).
    #[inline]
    pub fn bucket_min(&self, bucket: u32) -> f64 {
        self.mins[bucket as usize]
    }

    pub fn maxs(&self) -> &[f64] {
        &self.maxs
    }

    pub fn mins(&self) -> &[f64] {
        &self.mins
    }

    /// Bucket for a value: first bucket whose max is `>= value`; NaN maps to
    /// [`MISSING_BUCKET`].
    #[inline]
    pub fn bucket_of(&self, value: f64) -> u32 {
        if value.is_nan() {
            return MISSING_BUCKET;
        }
        let maxs = &self.maxs[1..];
        let pos = maxs.partition_point(|&m| m < value);
        // Values above f64::MAX (only +inf) land in the last bucket.
        (pos.min(maxs.len() - 1) + 1) as u32
    }

    /// Lower the recorded minimum of `bucket` to `value`.
    #[inline]
    fn observe(&mut self, bucket: u32, value: f64) {
        let slot = &mut self.mins[bucket as usize];
        if value < *slot {
            *slot = value;
        }
    }

    /// Encode values into bucket indices, lowering bucket minima as values
    /// are observed.
    pub(crate) fn encode_and_observe(&mut self, values: &[f64]) -> BucketIndices {
        let mut out = Vec::with_capacity(values.len());
        for &v in values {
            let bucket = self.bucket_of(v);
            if bucket != MISSING_BUCKET {
                self.observe(bucket, v);
            }
            out.push(bucket);
        }
        BucketIndices::from_u32(out, self.n_buckets())
    }

    /// Encode values without touching the boundary table.
    pub(crate) fn encode(&self, values: &[f64]) -> BucketIndices {
        let out: Vec<u32> = values.iter().map(|&v| self.bucket_of(v)).collect();
        BucketIndices::from_u32(out, self.n_buckets())
    }
}

/// Close a bucket each time the running count reaches `capacity`.
fn uniform_binning(counts: &BTreeMap<OrderedF64, usize>, capacity: usize, maxs: &mut Vec<f64>) {
    let mut running = 0usize;
    let mut upper = f64::NAN;
    for (value, &count) in counts {
        running += count;
        upper = value.0;
        if running >= capacity {
            maxs.push(upper);
            running = 0;
        }
    }
    if running > 0 {
        maxs.push(upper);
    }
}

/// Total-order wrapper so finite floats can key a `BTreeMap`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedF64(f64);

impl Eq for OrderedF64 {}

impl PartialOrd for OrderedF64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedF64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

// =============================================================================
// BucketIndices
// =============================================================================

/// Row-to-bucket indices stored at the narrowest sufficient width.
#[derive(Debug, Clone, PartialEq)]
pub enum BucketIndices {
    U8(Box<[u8]>),
    U16(Box<[u16]>),
    U32(Box<[u32]>),
}

impl BucketIndices {
    /// Pick a width from the bucket count and narrow the indices.
    pub fn from_u32(indices: Vec<u32>, n_buckets: usize) -> Self {
        if n_buckets <= 1 << 8 {
            Self::U8(indices.into_iter().map(|b| b as u8).collect())
        } else if n_buckets <= 1 << 16 {
            Self::U16(indices.into_iter().map(|b| b as u16).collect())
        } else {
            Self::U32(indices.into_boxed_slice())
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, row: usize) -> u32 {
        match self {
            Self::U8(v) => v[row] as u32,
            Self::U16(v) => v[row] as u32,
            Self::U32(v) => v[row],
        }
    }

    /// Width of one stored index in bytes.
    pub fn width_bytes(&self) -> usize {
        match self {
            Self::U8(_) => 1,
            Self::U16(_) => 2,
            Self::U32(_) => 4,
        }
    }

    /// Gather the given rows into a new index vector of the same width.
    pub fn select(&self, rows: &[usize]) -> Self {
        match self {
            Self::U8(v) => Self::U8(rows.iter().map(|&r| v[r]).collect()),
            Self::U16(v) => Self::U16(rows.iter().map(|&r| v[r]).collect()),
            Self::U32(v) => Self::U32(rows.iter().map(|&r| v[r]).collect()),
        }
    }
}

/// Integer types usable as histogram offsets.
///
/// Lets the histogram hot loop run monomorphized over the stored width
/// instead of matching on the width per row.
pub trait BinIndex: Copy + Send + Sync {
    fn index(self) -> usize;
}

impl BinIndex for u8 {
    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }
}

impl BinIndex for u16 {
    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }
}

impl BinIndex for u32 {
    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }
}
