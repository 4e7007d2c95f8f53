use async_trait::async_trait;

use crate::core::models::ProbeResult;

/// A single reachability check against one URL.
#[async_trait]
pub trait HttpCheck: Send + Sync {
    fn name(&self) -> &'static str;
    async fn check(&self, url: &str) -> ProbeResult;
}
