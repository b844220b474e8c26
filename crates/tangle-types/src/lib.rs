pub mod message;
pub mod session;
pub mod persona;
pub mod config;
pub mod event;
pub mod error;
pub mod usage;

#[cfg(test)]
mod tests;

pub use error::ChatError;
pub type Result<T> = std::result::Result<T, ChatError>;
