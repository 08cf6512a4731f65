pub mod indexer;
pub mod retry;

mod error;

pub use error::{Error, Result};
pub use indexer::IndexerClient;
pub use retry::RetryPolicy;
