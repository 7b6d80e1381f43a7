pub mod constants;
pub mod partition;
pub mod progress;

pub use constants::*;
pub use partition::PartitionKey;
pub use progress::ProgressReporter;
