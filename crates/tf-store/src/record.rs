use async_trait::async_trait;
use tf_core::error::Result;
use tf_core::types::{RoutingRule, TestScenario};

/// A record keyed by an integer id assigned by the store.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Entity kind, used in `NotFound` errors.
    const KIND: &'static str;

    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
}

/// Generic CRUD over one entity type.
#[async_trait]
pub trait RecordStore<T: Entity>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>>;
    async fn get(&self, id: u64) -> Result<T>;
    /// Insert with a freshly assigned id; any id on `record` is ignored.
    async fn create(&self, record: T) -> Result<T>;
    /// Replace an existing record, keeping `id`.
    async fn update(&self, id: u64, record: T) -> Result<T>;
    async fn delete(&self, id: u64) -> Result<()>;
}

impl Entity for RoutingRule {
    const KIND: &'static str = "routing_rule";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

impl Entity for TestScenario {
    const KIND: &'static str = "sandbox_scenario";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}
