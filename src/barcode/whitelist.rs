use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::runtime::Error;
use crate::utils::{is_acgt, reverse_complement, single_substitutions};

///////////////////////////////
/// Barcodes in file order. The index of a barcode is its position in the file.
/// The reverse complement of each entry is kept as well, since reads carry the
/// barcodes in that orientation
#[derive(Clone, Debug)]
pub struct BarcodeWhitelist {
    pub path: PathBuf,
    sequences: Vec<String>,
    revcomp: Vec<Vec<u8>>,
}

impl BarcodeWhitelist {
    ///////////////////////////////
    /// Read a whitelist: one barcode per line, tab separated fields are taken as
    /// further barcodes. Blank lines are skipped
    pub fn read_file(path: &Path) -> Result<BarcodeWhitelist, Error> {
        let file = File::open(path).map_err(|_| Error::file_not_found(path))?;
        BarcodeWhitelist::parse(file, path)
    }

    pub fn parse(src: impl Read, path: &Path) -> Result<BarcodeWhitelist, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(src);

        let mut sequences: Vec<String> = Vec::new();
        let mut revcomp: Vec<Vec<u8>> = Vec::new();
        let mut seen: FxHashMap<Vec<u8>, usize> = FxHashMap::default();

        for result in reader.records() {
            let record = result.map_err(|e| Error::file_not_valid(path, Some(e.to_string())))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            for field in record.iter() {
                if field.is_empty() || !field.bytes().all(is_acgt) {
                    return Err(Error::invalid_barcode(path, line, field));
                }

                let rc = reverse_complement(field.as_bytes());
                let index = sequences.len();
                if let Some(&first) = seen.get(&rc) {
                    // reported 1-based, like line numbers
                    return Err(Error::duplicate_barcode(path, field, first + 1, index + 1));
                }
                seen.insert(rc.clone(), index);
                sequences.push(field.to_string());
                revcomp.push(rc);
            }
        }

        if sequences.is_empty() {
            return Err(Error::empty_whitelist(path));
        }

        Ok(BarcodeWhitelist {
            path: path.to_path_buf(),
            sequences,
            revcomp,
        })
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Barcodes as given in the file
    pub fn sequences(&self) -> &[String] {
        &self.sequences
    }

    /// Barcodes in read orientation
    pub fn revcomp_sequences(&self) -> &[Vec<u8>] {
        &self.revcomp
    }
}

///////////////////////////////
/// Reverse-complemented barcode => whitelist index
#[derive(Clone, Debug)]
pub struct ExactMatchIndex {
    seq2barcode: FxHashMap<Vec<u8>, usize>,
}

impl ExactMatchIndex {
    pub fn build(whitelist: &BarcodeWhitelist) -> ExactMatchIndex {
        let seq2barcode = whitelist
            .revcomp_sequences()
            .iter()
            .enumerate()
            .map(|(i, seq)| (seq.clone(), i))
            .collect();
        ExactMatchIndex { seq2barcode }
    }

    #[inline(always)]
    pub fn get(&self, seq: &[u8]) -> Option<usize> {
        self.seq2barcode.get(seq).copied()
    }

    pub fn len(&self) -> usize {
        self.seq2barcode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq2barcode.is_empty()
    }
}

///////////////////////////////
/// What happened to the single-substitution variants while building a MismatchIndex
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MismatchDiagnostics {
    /// Variants generated in total, 3 per position per barcode
    pub num_generated: usize,
    /// Variants dropped because they are an exact barcode
    pub num_exact_collisions: usize,
    /// Number of generating barcodes => number of distinct variants
    pub generators_histogram: BTreeMap<usize, usize>,
}

impl MismatchDiagnostics {
    pub fn num_ambiguous(&self) -> usize {
        self.generators_histogram
            .iter()
            .filter(|(generators, _)| **generators > 1)
            .map(|(_, n)| *n)
            .sum()
    }
}

///////////////////////////////
/// Sequence at Hamming distance 1 from exactly one barcode => that barcode's index.
/// Variants that are exact barcodes, or that can be reached from several barcodes,
/// are left out
#[derive(Clone, Debug)]
pub struct MismatchIndex {
    seq2barcode: FxHashMap<Vec<u8>, usize>,
    pub diagnostics: MismatchDiagnostics,
}

impl MismatchIndex {
    pub fn build(whitelist: &BarcodeWhitelist, exact: &ExactMatchIndex) -> MismatchIndex {
        let mut diagnostics = MismatchDiagnostics::default();

        // Pass 1: every variant and the barcodes producing it, across the whole whitelist
        let mut generators: FxHashMap<Vec<u8>, Vec<usize>> = FxHashMap::default();
        for (index, seq) in whitelist.revcomp_sequences().iter().enumerate() {
            for variant in single_substitutions(seq) {
                diagnostics.num_generated += 1;
                if exact.get(&variant).is_some() {
                    diagnostics.num_exact_collisions += 1;
                    continue;
                }
                let sources = generators.entry(variant).or_default();
                if sources.last() != Some(&index) {
                    sources.push(index);
                }
            }
        }

        // Pass 2: keep only the unambiguous ones
        let mut seq2barcode = FxHashMap::default();
        for (variant, sources) in generators {
            *diagnostics
                .generators_histogram
                .entry(sources.len())
                .or_insert(0) += 1;
            if let [index] = sources.as_slice() {
                seq2barcode.insert(variant, *index);
            }
        }

        MismatchIndex {
            seq2barcode,
            diagnostics,
        }
    }

    #[inline(always)]
    pub fn get(&self, seq: &[u8]) -> Option<usize> {
        self.seq2barcode.get(seq).copied()
    }

    pub fn len(&self) -> usize {
        self.seq2barcode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq2barcode.is_empty()
    }
}

///////////////////////////////
/// A resolved barcode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarcodeHit {
    pub index: usize,
    pub exact: bool,
}

///////////////////////////////
/// One barcode position: whitelist plus both lookup tables
#[derive(Clone, Debug)]
pub struct BarcodeIndex {
    pub whitelist: BarcodeWhitelist,
    pub exact: ExactMatchIndex,
    pub mismatch: MismatchIndex,
}

impl BarcodeIndex {
    pub fn new(whitelist: BarcodeWhitelist) -> BarcodeIndex {
        let exact = ExactMatchIndex::build(&whitelist);
        let mismatch = MismatchIndex::build(&whitelist, &exact);
        BarcodeIndex {
            whitelist,
            exact,
            mismatch,
        }
    }

    pub fn read_file(path: &Path) -> Result<BarcodeIndex, Error> {
        let whitelist = BarcodeWhitelist::read_file(path)?;
        debug!("Read {} barcodes from {}", whitelist.len(), path.display());
        Ok(BarcodeIndex::new(whitelist))
    }

    /// Exact match first, then single mismatch
    #[inline(always)]
    pub fn resolve(&self, seq: &[u8]) -> Option<BarcodeHit> {
        if let Some(index) = self.exact.get(seq) {
            return Some(BarcodeHit { index, exact: true });
        }
        self.mismatch
            .get(seq)
            .map(|index| BarcodeHit { index, exact: false })
    }

    pub fn names(&self) -> &[String] {
        self.whitelist.sequences()
    }

    pub fn log_diagnostics(&self, label: &str) {
        let diag = &self.mismatch.diagnostics;
        info!(
            "{}: {} barcodes from {}",
            label,
            self.whitelist.len(),
            self.whitelist.path.display()
        );
        info!(
            "{}: {} mismatch variants generated, {} dropped as exact barcodes, {} ambiguous, {} kept",
            label,
            diag.num_generated,
            diag.num_exact_collisions,
            diag.num_ambiguous(),
            self.mismatch.len()
        );
        for (generators, count) in diag.generators_histogram.iter() {
            info!(
                "{}: {} mismatch sequences reachable from {} barcode(s)",
                label, count, generators
            );
        }
    }
}
