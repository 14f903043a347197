use std::io::Write;
use std::path::Path;

use anyhow::Context;
use log::info;

use crate::barcode::AcceptedRead;
use crate::fileformat::{CountMatrix, ProcessedFastqWriter};

///////////////////////////////
/// Collects accepted read pairs: joint and marginal barcode counts, plus the relabeled mRNA reads
pub struct Aggregator<W: Write> {
    matrix: CountMatrix,
    barcode1_counts: Vec<u64>,
    barcode2_counts: Vec<u64>,
    writer: ProcessedFastqWriter<W>,
}

impl<W: Write> Aggregator<W> {
    pub fn new(
        barcode1_names: &[String],
        barcode2_names: &[String],
        writer: W,
    ) -> Aggregator<W> {
        Aggregator {
            matrix: CountMatrix::new(barcode1_names.to_vec(), barcode2_names.to_vec()),
            barcode1_counts: vec![0; barcode1_names.len()],
            barcode2_counts: vec![0; barcode2_names.len()],
            writer: ProcessedFastqWriter::new(writer),
        }
    }

    /// Count the read and write its mRNA read under the synthesized name
    pub fn accept(
        &mut self,
        read: &AcceptedRead,
        mrna_head: &[u8],
        mrna_seq: &[u8],
        mrna_qual: &[u8],
    ) -> anyhow::Result<()> {
        let bc1 = read.barcode1.index;
        let bc2 = read.barcode2.index;
        self.matrix.inc(bc1, bc2);
        self.barcode1_counts[bc1] += 1;
        self.barcode2_counts[bc2] += 1;
        self.writer
            .write_read(bc1, bc2, read.umi, mrna_head, mrna_seq, mrna_qual)
            .context("Failed to write processed read")?;
        Ok(())
    }

    pub fn num_written(&self) -> u64 {
        self.writer.num_written()
    }

    pub fn barcode1_counts(&self) -> &[u64] {
        &self.barcode1_counts
    }

    pub fn barcode2_counts(&self) -> &[u64] {
        &self.barcode2_counts
    }

    pub fn matrix(&self) -> &CountMatrix {
        &self.matrix
    }

    ///////////////////////////////
    /// Flush the reads and write the count matrix
    pub fn finish(mut self, path_counts: &Path) -> anyhow::Result<CountMatrix> {
        self.writer
            .flush()
            .context("Failed to flush processed reads")?;
        self.matrix.write_tsv(path_counts)?;

        let observed1 = self.barcode1_counts.iter().filter(|&&c| c > 0).count();
        let observed2 = self.barcode2_counts.iter().filter(|&&c| c > 0).count();
        info!(
            "Wrote {} processed reads; observed {} of {} barcode 1 and {} of {} barcode 2 sequences",
            self.writer.num_written(),
            observed1,
            self.barcode1_counts.len(),
            observed2,
            self.barcode2_counts.len()
        );
        Ok(self.matrix)
    }
}
