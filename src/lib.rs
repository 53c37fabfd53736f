// Library interface for testing

// Declare all modules
pub mod config;
pub mod constants;
pub mod credentials;
pub mod db;
pub mod flash;
pub mod pages;
pub mod queries;
pub mod quota;
pub mod schema;
pub mod serve;
pub mod session;
pub mod speech;
pub mod upload;

// Re-export the upload size limit for convenience
pub use constants::MAX_UPLOAD_BYTES;
