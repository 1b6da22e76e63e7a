use crate::error::StoreError;
use crate::types::UpdateCommand;

/// A catalog store that can apply reclassification commands.
///
/// Implementations must treat a command that matches the stored row as a
/// no-op so a batch can be re-applied safely.
#[async_trait::async_trait]
pub trait CatalogWriter: Send + Sync {
    fn name(&self) -> &str;

    /// Apply one update. Errors are per item; callers keep going.
    async fn apply_update(&self, command: &UpdateCommand) -> Result<(), StoreError>;
}
