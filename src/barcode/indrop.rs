use std::path::Path;

use log::{info, warn};

use super::linker::{LinkerPattern, W1_LINKER};
use super::whitelist::{BarcodeHit, BarcodeIndex};
use super::Chemistry;
use crate::runtime::Error;
use crate::umi::{UmiRegistry, DEFAULT_UMI_LEN, MAX_UMI_LEN};
use crate::utils::is_acgt;

pub const DEFAULT_LINKER_OFFSETS: [usize; 4] = [8, 9, 10, 11];
pub const DEFAULT_BARCODE2_LEN: usize = 8;
pub const DEFAULT_MIN_READ_LEN: usize = 48;

///////////////////////////////
/// Where things sit in the inDrop barcode read:
///
/// [barcode 1, length = linker offset][linker][barcode 2][UMI][...]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndropLayout {
    pub linker: Vec<u8>,
    pub linker_offsets: Vec<usize>,
    pub barcode2_len: usize,
    pub umi_len: usize,
    pub min_read_len: usize,
}

impl Default for IndropLayout {
    fn default() -> Self {
        IndropLayout {
            linker: W1_LINKER.as_bytes().to_vec(),
            linker_offsets: DEFAULT_LINKER_OFFSETS.to_vec(),
            barcode2_len: DEFAULT_BARCODE2_LEN,
            umi_len: DEFAULT_UMI_LEN,
            min_read_len: DEFAULT_MIN_READ_LEN,
        }
    }
}

impl IndropLayout {
    /// Shortest read that still holds every segment at the largest offset.
    /// None if that length does not fit in a usize
    pub fn required_read_len(&self) -> Option<usize> {
        self.linker_offsets
            .iter()
            .max()
            .copied()
            .unwrap_or(0)
            .checked_add(self.linker.len())?
            .checked_add(self.barcode2_len)?
            .checked_add(self.umi_len)
    }

    ///////////////////////////////
    /// Check the layout. Offsets come back sorted ascending, without duplicates
    pub fn validate(mut self) -> Result<IndropLayout, Error> {
        if self.linker.is_empty() || !self.linker.iter().all(|&b| is_acgt(b)) {
            return Err(Error::invalid_layout(format!(
                "linker {:?} must be a non-empty ACGT sequence",
                String::from_utf8_lossy(&self.linker)
            )));
        }
        if self.linker_offsets.is_empty() {
            return Err(Error::invalid_layout("at least one linker offset is needed"));
        }
        if self.linker_offsets.contains(&0) {
            return Err(Error::invalid_layout(
                "linker offset 0 leaves no room for barcode 1",
            ));
        }
        if self.barcode2_len == 0 {
            return Err(Error::invalid_layout("barcode 2 length must be at least 1"));
        }
        if !(1..=MAX_UMI_LEN).contains(&self.umi_len) {
            return Err(Error::invalid_layout(format!(
                "UMI length must be between 1 and {}",
                MAX_UMI_LEN
            )));
        }
        self.linker_offsets.sort_unstable();
        self.linker_offsets.dedup();

        let Some(required) = self.required_read_len() else {
            return Err(Error::invalid_layout(format!(
                "linker offsets {:?} are too large",
                self.linker_offsets
            )));
        };
        if self.min_read_len < required {
            return Err(Error::invalid_layout(format!(
                "minimum read length {} is below the {} bases the layout needs",
                self.min_read_len, required
            )));
        }
        Ok(self)
    }
}

///////////////////////////////
/// A usable read pair
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcceptedRead {
    pub linker_offset: usize,
    pub barcode1: BarcodeHit,
    pub barcode2: BarcodeHit,
    pub umi: u32,
}

///////////////////////////////
/// Outcome of classifying one barcode read
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadClass {
    /// Shorter than the layout minimum; not scanned
    TooShort,
    LinkerNotFound,
    /// Linker found but at least one of barcode 1, barcode 2 or the UMI is unusable
    Rejected {
        linker_offset: usize,
        barcode1: Option<BarcodeHit>,
        barcode2: Option<BarcodeHit>,
        umi: Option<u32>,
    },
    Accepted(AcceptedRead),
}

///////////////////////////////
/// The inDrop chemistry: two barcode whitelists, the W1 linker, a fixed-length UMI
#[derive(Clone, Debug)]
pub struct IndropChemistry {
    layout: IndropLayout,
    linker: LinkerPattern,
    barcode1: BarcodeIndex,
    barcode2: BarcodeIndex,
    umis: UmiRegistry,
}

impl IndropChemistry {
    pub fn new(
        layout: IndropLayout,
        barcode1: BarcodeIndex,
        barcode2: BarcodeIndex,
    ) -> Result<IndropChemistry, Error> {
        let layout = layout.validate()?;

        let wrong_len = count_other_lengths(barcode2.names(), &[layout.barcode2_len]);
        if wrong_len > 0 {
            return Err(Error::invalid_layout(format!(
                "{} of the barcode 2 whitelist entries in {} are not {} bp long and could never match",
                wrong_len,
                barcode2.whitelist.path.display(),
                layout.barcode2_len
            )));
        }
        let wrong_len = count_other_lengths(barcode1.names(), &layout.linker_offsets);
        if wrong_len > 0 {
            warn!(
                "{} of the barcode 1 whitelist entries in {} have a length outside the linker offsets {:?} and will never match",
                wrong_len,
                barcode1.whitelist.path.display(),
                layout.linker_offsets
            );
        }

        Ok(IndropChemistry {
            linker: LinkerPattern::new(&layout.linker),
            umis: UmiRegistry::new(layout.umi_len),
            layout,
            barcode1,
            barcode2,
        })
    }

    pub fn from_files(
        layout: IndropLayout,
        path_barcode1: &Path,
        path_barcode2: &Path,
    ) -> Result<IndropChemistry, Error> {
        let barcode1 = BarcodeIndex::read_file(path_barcode1)?;
        barcode1.log_diagnostics("Barcode 1");
        let barcode2 = BarcodeIndex::read_file(path_barcode2)?;
        barcode2.log_diagnostics("Barcode 2");

        let chemistry = IndropChemistry::new(layout, barcode1, barcode2)?;
        info!(
            "Linker {} at offsets {:?}; barcode 2 {} bp, UMI {} bp, reads of at least {} bp",
            String::from_utf8_lossy(chemistry.linker.sequence()),
            chemistry.layout.linker_offsets,
            chemistry.layout.barcode2_len,
            chemistry.layout.umi_len,
            chemistry.layout.min_read_len
        );
        Ok(chemistry)
    }

    pub fn layout(&self) -> &IndropLayout {
        &self.layout
    }

    pub fn umis(&self) -> &UmiRegistry {
        &self.umis
    }
}

/// Number of barcodes whose length is not one of `lengths`
fn count_other_lengths(names: &[String], lengths: &[usize]) -> usize {
    names
        .iter()
        .filter(|name| !lengths.contains(&name.len()))
        .count()
}

impl Chemistry for IndropChemistry {
    #[inline(always)]
    fn classify(&self, barcode_read: &[u8]) -> ReadClass {
        let layout = &self.layout;
        if barcode_read.len() < layout.min_read_len {
            return ReadClass::TooShort;
        }

        let Some(linker_offset) = self.linker.find(barcode_read, &layout.linker_offsets) else {
            return ReadClass::LinkerNotFound;
        };

        // min_read_len covers the largest offset, so these slices are in range
        let bc2_from = linker_offset + self.linker.len();
        let umi_from = bc2_from + layout.barcode2_len;
        let umi_seq = &barcode_read[umi_from..(umi_from + layout.umi_len)];

        let barcode1 = self.barcode1.resolve(&barcode_read[..linker_offset]);
        let barcode2 = self.barcode2.resolve(&barcode_read[bc2_from..umi_from]);
        let umi = if umi_seq.contains(&b'N') {
            None
        } else {
            self.umis.number(umi_seq)
        };

        match (barcode1, barcode2, umi) {
            (Some(barcode1), Some(barcode2), Some(umi)) => ReadClass::Accepted(AcceptedRead {
                linker_offset,
                barcode1,
                barcode2,
                umi,
            }),
            _ => ReadClass::Rejected {
                linker_offset,
                barcode1,
                barcode2,
                umi,
            },
        }
    }

    fn barcode1_names(&self) -> &[String] {
        self.barcode1.names()
    }

    fn barcode2_names(&self) -> &[String] {
        self.barcode2.names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::BarcodeWhitelist;

    fn index(src: &str) -> BarcodeIndex {
        BarcodeIndex::new(BarcodeWhitelist::parse(src.as_bytes(), Path::new("bc.txt")).unwrap())
    }

    fn chemistry() -> IndropChemistry {
        IndropChemistry::new(
            IndropLayout::default(),
            index("AAAAAAAA\nCCCCCCCC\nACGTACGTAC\n"),
            index("GGGGGGGG\nTTTTTTTT\n"),
        )
        .unwrap()
    }

    /// bc1 and bc2 given in read orientation
    fn barcode_read(bc1: &str, bc2: &str, umi: &str) -> Vec<u8> {
        let mut read = format!("{}{}{}{}", bc1, W1_LINKER, bc2, umi).into_bytes();
        read.resize(60, b'T');
        read
    }

    #[test]
    fn test_accept_exact() {
        let chem = chemistry();
        let class = chem.classify(&barcode_read("TTTTTTTT", "AAAAAAAA", "ACGTAC"));
        assert_eq!(
            class,
            ReadClass::Accepted(AcceptedRead {
                linker_offset: 8,
                barcode1: BarcodeHit {
                    index: 0,
                    exact: true
                },
                barcode2: BarcodeHit {
                    index: 1,
                    exact: true
                },
                umi: 433,
            })
        );
    }

    #[test]
    fn test_accept_long_barcode1_with_mismatch() {
        let chem = chemistry();
        // revcomp of ACGTACGTAC is GTACGTACGT; one substitution at the end
        let class = chem.classify(&barcode_read("GTACGTACGA", "CCCCCCCC", "AAAAAA"));
        match class {
            ReadClass::Accepted(read) => {
                assert_eq!(read.linker_offset, 10);
                assert_eq!(
                    read.barcode1,
                    BarcodeHit {
                        index: 2,
                        exact: false
                    }
                );
                assert_eq!(read.barcode2.index, 0);
                assert_eq!(read.umi, 0);
            }
            other => panic!("unexpected class {:?}", other),
        }
    }

    #[test]
    fn test_umi_with_n_is_rejected() {
        let chem = chemistry();
        let class = chem.classify(&barcode_read("TTTTTTTT", "AAAAAAAA", "ACNTAC"));
        assert_eq!(
            class,
            ReadClass::Rejected {
                linker_offset: 8,
                barcode1: Some(BarcodeHit {
                    index: 0,
                    exact: true
                }),
                barcode2: Some(BarcodeHit {
                    index: 1,
                    exact: true
                }),
                umi: None,
            }
        );
    }

    #[test]
    fn test_unknown_barcode2_is_rejected() {
        let chem = chemistry();
        let class = chem.classify(&barcode_read("TTTTTTTT", "ACACACAC", "ACGTAC"));
        assert!(matches!(
            class,
            ReadClass::Rejected {
                barcode1: Some(_),
                barcode2: None,
                umi: Some(433),
                ..
            }
        ));
    }

    #[test]
    fn test_linker_not_found() {
        let chem = chemistry();
        let read = vec![b'A'; 60];
        assert_eq!(chem.classify(&read), ReadClass::LinkerNotFound);
    }

    #[test]
    fn test_too_short() {
        let chem = chemistry();
        let mut read = barcode_read("TTTTTTTT", "AAAAAAAA", "ACGTAC");
        read.truncate(47);
        assert_eq!(chem.classify(&read), ReadClass::TooShort);
    }

    #[test]
    fn test_layout_validation() {
        let layout = IndropLayout {
            linker_offsets: vec![11, 8, 9, 8],
            ..IndropLayout::default()
        }
        .validate()
        .unwrap();
        assert_eq!(layout.linker_offsets, vec![8, 9, 11]);
        assert_eq!(layout.required_read_len(), Some(47));

        let too_short = IndropLayout {
            min_read_len: 40,
            ..IndropLayout::default()
        };
        assert!(matches!(
            too_short.validate(),
            Err(Error::InvalidLayout { .. })
        ));

        let huge_offset = IndropLayout {
            linker_offsets: vec![usize::MAX],
            ..IndropLayout::default()
        };
        assert_eq!(huge_offset.required_read_len(), None);
        assert!(matches!(
            huge_offset.validate(),
            Err(Error::InvalidLayout { .. })
        ));

        let no_offsets = IndropLayout {
            linker_offsets: vec![],
            ..IndropLayout::default()
        };
        assert!(no_offsets.validate().is_err());
    }

    #[test]
    fn test_barcode2_length_must_match_layout() {
        let res = IndropChemistry::new(
            IndropLayout::default(),
            index("AAAAAAAA\n"),
            index("GGGGGGGG\nTTTTTTT\n"),
        );
        assert!(matches!(res, Err(Error::InvalidLayout { .. })));
    }

    #[test]
    fn test_count_other_lengths() {
        let names: Vec<String> = ["AAAAAAAA", "AAAAAAA", "AAAAAAAAAAAA"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(count_other_lengths(&names, &DEFAULT_LINKER_OFFSETS), 2);
        assert_eq!(count_other_lengths(&names, &[7, 8, 12]), 0);
    }
}
