//! The query seam between the cycle controller and the A2S client.

use a2s::{A2sClient, QueryError};
use async_trait::async_trait;
use shared::ServerInfo;
use std::time::Duration;

/// Fetches live information about one game server.
///
/// Implementations must honour `timeout`; the cycle controller additionally
/// wraps every call in its own deadline.
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn query(
        &self,
        address: &str,
        timeout: Duration,
        buffer_size: u16,
    ) -> Result<ServerInfo, QueryError>;
}

#[async_trait]
impl QueryClient for A2sClient {
    async fn query(
        &self,
        address: &str,
        timeout: Duration,
        buffer_size: u16,
    ) -> Result<ServerInfo, QueryError> {
        self.query_info(address, timeout, buffer_size).await
    }
}
