pub mod process_barcodes;

pub use process_barcodes::ProcessBarcodes;
pub use process_barcodes::ProcessBarcodesCMD;
pub use process_barcodes::RunStatistics;
