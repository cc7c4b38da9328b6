pub mod board;
pub mod client;
pub mod config;
pub mod error;
pub mod session;

pub use board::LeadBoard;
pub use client::{lead_list_path, ApiClient, LeadFetcher};
pub use config::ClientConfig;
pub use error::{ApiOutcome, ClientError};
pub use session::{FileSessionStore, MemorySession, SessionProvider, StoredSession};
