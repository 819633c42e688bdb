//! Membership sets over dictionary codes.

/// Fixed set of category codes, one bit per code.
///
/// Categorical splits are compiled into a `CodeSet` against the dictionary of
/// the column being scored (or trained on), so routing a row is a single bit
/// test instead of a string comparison.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeSet {
    words: Box<[u64]>,
}

impl CodeSet {
    /// Set holding exactly `codes`.
    pub fn from_codes(codes: impl IntoIterator<Item = u32>) -> Self {
        let mut words: Vec<u64> = Vec::new();
        for code in codes {
            let word = (code / 64) as usize;
            if word >= words.len() {
                words.resize(word + 1, 0);
            }
            words[word] |= 1u64 << (code % 64);
        }
        Self {
            words: words.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn contains(&self, code: u32) -> bool {
        self.words
            .get((code / 64) as usize)
            .is_some_and(|&w| (w >> (code % 64)) & 1 != 0)
    }

    /// Number of codes in the set.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }
}
