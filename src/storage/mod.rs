pub mod local;
pub mod provider;
pub mod staging;

pub use local::*;
pub use provider::*;
pub use staging::{StagedBlob, StagingArea, StagingWriter};
