use rustc_hash::FxHashSet;

use crate::utils::single_substitutions;

///////////////////////////////
/// inDrop W1 spacer between barcode 1 and barcode 2
pub const W1_LINKER: &str = "GAGTGATTGCTTGTGACGCCTT";

///////////////////////////////
/// A fixed linker, accepted exactly or with one mismatch
#[derive(Clone, Debug)]
pub struct LinkerPattern {
    sequence: Vec<u8>,
    accepted: FxHashSet<Vec<u8>>,
}

impl LinkerPattern {
    pub fn new(sequence: &[u8]) -> LinkerPattern {
        let mut accepted: FxHashSet<Vec<u8>> = single_substitutions(sequence).collect();
        accepted.insert(sequence.to_vec());
        LinkerPattern {
            sequence: sequence.to_vec(),
            accepted,
        }
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    #[inline(always)]
    pub fn matches(&self, window: &[u8]) -> bool {
        self.accepted.contains(window)
    }

    ///////////////////////////////
    /// First offset, in the order given, where the linker starts.
    /// Offsets that would run past the end of the read are skipped
    #[inline(always)]
    pub fn find(&self, read_seq: &[u8], offsets: &[usize]) -> Option<usize> {
        offsets.iter().copied().find(|&offset| {
            read_seq
                .get(offset..offset + self.len())
                .is_some_and(|window| self.matches(window))
        })
    }
}

impl Default for LinkerPattern {
    fn default() -> Self {
        LinkerPattern::new(W1_LINKER.as_bytes())
    }
}
