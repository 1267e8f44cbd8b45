use crate::memory::MemoryStore;
use crate::record::RecordStore;
use std::sync::Arc;
use tf_core::error::Result;
use tf_core::types::TestScenario;

/// Validating front for a scenario [`RecordStore`].
#[derive(Clone)]
pub struct ScenarioStore {
    inner: Arc<dyn RecordStore<TestScenario>>,
}

impl ScenarioStore {
    pub fn new(inner: Arc<dyn RecordStore<TestScenario>>) -> Self {
        Self { inner }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::<TestScenario>::new()))
    }

    /// Create each scenario in order, stopping at the first invalid one.
    pub async fn seed(&self, scenarios: impl IntoIterator<Item = TestScenario>) -> Result<usize> {
        let mut count = 0;
        for scenario in scenarios {
            self.create(scenario).await?;
            count += 1;
        }
        Ok(count)
    }

    pub async fn list(&self) -> Result<Vec<TestScenario>> {
        self.inner.list().await
    }

    pub async fn get(&self, id: u64) -> Result<TestScenario> {
        self.inner.get(id).await
    }

    pub async fn create(&self, scenario: TestScenario) -> Result<TestScenario> {
        scenario.validate()?;
        self.inner.create(scenario).await
    }

    pub async fn update(&self, id: u64, scenario: TestScenario) -> Result<TestScenario> {
        scenario.validate()?;
        self.inner.update(id, scenario).await
    }

    pub async fn delete(&self, id: u64) -> Result<()> {
        self.inner.delete(id).await
    }
}
