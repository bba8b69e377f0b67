//! Small helpers shared by the network-facing components

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Run `fut`, failing with [`Error::Timeout`] if it takes longer than `timeout`
///
/// `None` waits for as long as the future needs.
pub async fn with_timeout<F, T>(timeout: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout(limit))?,
        None => fut.await,
    }
}
