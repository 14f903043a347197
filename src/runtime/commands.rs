use clap::Subcommand;

use crate::command;

///////////////////////////////
/// Possible subcommands to parse
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve inDrop barcodes and UMIs, write relabeled mRNA reads and a barcode count matrix
    ProcessBarcodes(command::ProcessBarcodesCMD),
}
