pub mod barcode;
pub mod command;
pub mod fileformat;
pub mod runtime;
pub mod umi;
pub mod utils;
