use crate::barcode::indrop::ReadClass;

///////////////////////////////
/// This trait defines a "single cell chemistry": where the barcodes and the UMI
/// sit in the barcode read, and how they are resolved
pub trait Chemistry {
    ///////////////////////////////
    /// Classify one barcode read. Never fails; a read that cannot be used is a ReadClass too
    fn classify(&self, barcode_read: &[u8]) -> ReadClass;

    /// Names of the barcode 1 whitelist entries, in whitelist order
    fn barcode1_names(&self) -> &[String];

    /// Names of the barcode 2 whitelist entries, in whitelist order
    fn barcode2_names(&self) -> &[String];
}
