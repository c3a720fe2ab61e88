use anyhow::Result;
use async_trait::async_trait;

pub mod memory;
pub mod s3;

/// The three object-store operations the pipeline depends on. A store is
/// bound to one bucket at construction; keys are bucket-relative.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// All keys under `prefix`, in lexicographic order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Full contents of one object.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Write `bytes` at `key`, replacing any prior object there.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()>;
}
