//! Seams the widget models depend on

use async_trait::async_trait;

#[async_trait]
pub trait Replier: Send + Sync {
    /// Produces the reply to one user message.
    ///
    /// Never fails; a replier that can fail must turn the failure into reply text.
    async fn reply(&self, message: &str) -> String;
}
