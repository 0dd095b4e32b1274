pub mod error;
pub mod provider;
pub mod repo;
pub mod types;

pub use error::HistoryError;
pub use provider::HistoryProvider;
pub use repo::GitHistoryProvider;
pub use types::{Commit, Release};
