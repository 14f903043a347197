use itertools::Itertools;

use crate::utils::NUCLEOTIDES;

pub const DEFAULT_UMI_LEN: usize = 6;
pub const MAX_UMI_LEN: usize = 10;

///////////////////////////////
/// Every ACGT string of length `len`, in lexicographic order.
/// Call again to restart the enumeration
pub fn kmers(len: usize) -> impl Iterator<Item = Vec<u8>> {
    itertools::repeat_n(NUCLEOTIDES.iter().copied(), len).multi_cartesian_product()
}

#[inline(always)]
fn nucleotide_rank(b: u8) -> Option<u32> {
    match b {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

///////////////////////////////
/// Fixed numbering of all UMIs of one length. The number of a UMI is its
/// position in the lexicographic enumeration, so AAAAAA is 0 and TTTTTT is 4^6-1.
/// That position is the UMI read as a base-4 number, A=0 C=1 G=2 T=3, so nothing
/// is stored per UMI
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UmiRegistry {
    len: usize,
}

impl UmiRegistry {
    pub fn new(len: usize) -> UmiRegistry {
        assert!(
            (1..=MAX_UMI_LEN).contains(&len),
            "UMI length must be between 1 and {MAX_UMI_LEN}, got {len}"
        );
        UmiRegistry { len }
    }

    pub fn umi_len(&self) -> usize {
        self.len
    }

    pub fn num_umis(&self) -> usize {
        1 << (2 * self.len)
    }

    /// None for anything that is not an ACGT string of the registry length
    #[inline(always)]
    pub fn number(&self, umi: &[u8]) -> Option<u32> {
        if umi.len() != self.len {
            return None;
        }
        umi.iter()
            .try_fold(0u32, |acc, &b| Some((acc << 2) | nucleotide_rank(b)?))
    }

    /// All UMIs in numbering order
    pub fn sequences(&self) -> impl Iterator<Item = Vec<u8>> {
        kmers(self.len)
    }

    pub fn sequence(&self, number: u32) -> Option<Vec<u8>> {
        if number as usize >= self.num_umis() {
            return None;
        }
        let seq = (0..self.len)
            .rev()
            .map(|pos| NUCLEOTIDES[((number >> (2 * pos)) & 3) as usize])
            .collect();
        Some(seq)
    }
}

impl Default for UmiRegistry {
    fn default() -> Self {
        UmiRegistry::new(DEFAULT_UMI_LEN)
    }
}
