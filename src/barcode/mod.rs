pub mod chemistry;
pub mod indrop;
pub mod linker;
pub mod whitelist;

pub use chemistry::Chemistry;

pub use indrop::AcceptedRead;
pub use indrop::IndropChemistry;
pub use indrop::IndropLayout;
pub use indrop::ReadClass;

pub use linker::LinkerPattern;
pub use linker::W1_LINKER;

pub use whitelist::BarcodeHit;
pub use whitelist::BarcodeIndex;
pub use whitelist::BarcodeWhitelist;
pub use whitelist::ExactMatchIndex;
pub use whitelist::MismatchIndex;
