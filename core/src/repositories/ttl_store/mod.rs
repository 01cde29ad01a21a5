//! Key/value store with per-entry expiry

mod r#trait;
pub use r#trait::TtlStore;

mod memory;
pub use memory::MemoryTtlStore;

#[cfg(test)]
mod tests;
