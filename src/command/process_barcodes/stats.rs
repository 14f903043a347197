use log::info;

use crate::barcode::{BarcodeHit, ReadClass};

///////////////////////////////
/// Counters for one pass over the input. Every read pair lands in `total`;
/// the rest follow the classification of its barcode read
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub total: u64,
    pub too_short: u64,
    pub linker_found: u64,
    pub barcode1_found: u64,
    pub barcode2_found: u64,
    /// Both barcodes resolved, whatever the UMI
    pub barcodes_found: u64,
    pub barcode1_mismatch: u64,
    pub barcode2_mismatch: u64,
    /// Both barcodes resolved but the UMI had an N
    pub umi_rejected: u64,
    pub accepted: u64,
}

impl RunStatistics {
    pub fn record(&mut self, class: &ReadClass) {
        self.total += 1;
        match class {
            ReadClass::TooShort => self.too_short += 1,
            ReadClass::LinkerNotFound => {}
            ReadClass::Rejected {
                barcode1,
                barcode2,
                umi,
                ..
            } => {
                self.record_barcodes(*barcode1, *barcode2);
                if barcode1.is_some() && barcode2.is_some() && umi.is_none() {
                    self.umi_rejected += 1;
                }
            }
            ReadClass::Accepted(read) => {
                self.record_barcodes(Some(read.barcode1), Some(read.barcode2));
                self.accepted += 1;
            }
        }
    }

    fn record_barcodes(&mut self, barcode1: Option<BarcodeHit>, barcode2: Option<BarcodeHit>) {
        self.linker_found += 1;
        if let Some(hit) = barcode1 {
            self.barcode1_found += 1;
            if !hit.exact {
                self.barcode1_mismatch += 1;
            }
        }
        if let Some(hit) = barcode2 {
            self.barcode2_found += 1;
            if !hit.exact {
                self.barcode2_mismatch += 1;
            }
        }
        if barcode1.is_some() && barcode2.is_some() {
            self.barcodes_found += 1;
        }
    }

    /// Percentage of all read pairs; 0 when nothing was read
    pub fn percent(&self, count: u64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.total as f64
        }
    }

    pub fn log_summary(&self) {
        info!("Processed {} read pairs", self.total);
        info!(
            "Linker found: {} ({:.2}%), {} reads too short",
            self.linker_found,
            self.percent(self.linker_found),
            self.too_short
        );
        info!(
            "Barcode 1 found: {} ({} by mismatch); barcode 2 found: {} ({} by mismatch)",
            self.barcode1_found,
            self.barcode1_mismatch,
            self.barcode2_found,
            self.barcode2_mismatch
        );
        info!(
            "Both barcodes found: {} ({:.2}%)",
            self.barcodes_found,
            self.percent(self.barcodes_found)
        );
        info!(
            "Accepted with valid UMI: {} ({:.2}%); {} rejected for N in UMI",
            self.accepted,
            self.percent(self.accepted),
            self.umi_rejected
        );
    }
}
