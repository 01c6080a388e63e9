mod chroma;
mod driver;
mod manager;
mod pinecone;
mod qdrant;
#[cfg(test)]
pub(crate) mod testing;
mod upstash;

pub use chroma::{ChromaConfig, ChromaDriver};
pub use driver::{VectorStoreDriver, STORE_TIMEOUT};
pub use manager::StoreManager;
pub use pinecone::{PineconeConfig, PineconeDriver};
pub use qdrant::{point_id, QdrantConfig, QdrantDriver, VECTOR_ID_KEY};
pub use upstash::{UpstashConfig, UpstashDriver};

#[cfg(test)]
pub(crate) use driver::MockVectorStoreDriver;
