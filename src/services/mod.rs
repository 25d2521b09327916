// Service exports
pub mod appwrite;
pub mod cache;
pub mod postgres;

pub use appwrite::{AppwriteClient, AppwriteCollections, AppwriteError};
pub use cache::{CacheManager, CacheKey, CacheError, CacheStats};
pub use postgres::{PostgresClient, PostgresError, LedgerStatus, TrainerBookingStats};
