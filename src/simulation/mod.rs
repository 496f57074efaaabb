pub mod engine;
pub mod projection;
pub mod summary;
