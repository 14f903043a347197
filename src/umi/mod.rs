pub mod registry;

pub use registry::UmiRegistry;
pub use registry::DEFAULT_UMI_LEN;
pub use registry::MAX_UMI_LEN;
