use itertools::Itertools;

///////////////////////////////
/// Nucleotides in lexicographic order. Enumerations over this alphabet rely on the order
pub const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];

#[inline(always)]
pub fn is_acgt(b: u8) -> bool {
    matches!(b, b'A' | b'C' | b'G' | b'T')
}

#[inline(always)]
fn complement(b: u8) -> u8 {
    match b {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        other => other,
    }
}

///////////////////////////////
/// Reverse complement; anything outside ACGT (e.g. N) is kept as is
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

///////////////////////////////
/// All sequences at Hamming distance exactly 1: three substitutions per position,
/// position by position, substitutes in alphabet order
pub fn single_substitutions(seq: &[u8]) -> impl Iterator<Item = Vec<u8>> + '_ {
    (0..seq.len())
        .cartesian_product(NUCLEOTIDES)
        .filter(move |&(pos, b)| seq[pos] != b)
        .map(move |(pos, b)| {
            let mut variant = seq.to_vec();
            variant[pos] = b;
            variant
        })
}
