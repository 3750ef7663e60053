use crate::{
    bridge::{Bridge, NativeSdk},
    error::Error,
    value::RawValue,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::{Semaphore, TryAcquireError};
use tracing::{debug, warn};

/// Default number of sends allowed in flight at once.
pub const DEFAULT_BUFFER_LIMIT: usize = 30;

/// Application-side transport handing events over to the [`Bridge`].
///
/// Holds at most `limit` sends in flight. It does no batching or retrying;
/// once an event reaches the SDK, delivery is the SDK's job.
#[derive(Debug)]
pub struct NativeTransport<S> {
    bridge: Arc<Bridge<S>>,
    buffer: Arc<Semaphore>,
    limit: usize,
}

impl<S: NativeSdk + 'static> NativeTransport<S> {
    pub fn new(bridge: Arc<Bridge<S>>) -> Self {
        Self::with_limit(bridge, DEFAULT_BUFFER_LIMIT)
    }

    pub fn with_limit(bridge: Arc<Bridge<S>>, limit: usize) -> Self {
        Self {
            bridge,
            buffer: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of sends currently in flight.
    pub fn pending(&self) -> usize {
        self.limit - self.buffer.available_permits()
    }

    /// Sends an event through the bridge.
    ///
    /// Fails immediately when the buffer is full instead of waiting for room.
    pub async fn send_event(&self, event: RawValue) -> Result<bool, Error> {
        let permit = self
            .buffer
            .clone()
            .try_acquire_owned()
            .map_err(|e| match e {
                TryAcquireError::NoPermits => {
                    warn!(limit = self.limit, "Transport buffer is full, dropping event");
                    Error::BufferFull(self.limit)
                }
                TryAcquireError::Closed => Error::TransportClosed,
            })?;

        let bridge = self.bridge.clone();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            bridge.send_event(&event)
        })
        .await?
    }

    /// Waits up to `timeout` for in-flight sends, then stops accepting new ones.
    ///
    /// Returns true if everything drained in time.
    pub async fn close(&self, timeout: Duration) -> bool {
        let permits = u32::try_from(self.limit).unwrap_or(u32::MAX);
        let drained = matches!(
            tokio::time::timeout(timeout, self.buffer.acquire_many(permits)).await,
            Ok(Ok(_))
        );
        self.buffer.close();
        debug!(drained, "Closed native transport");
        drained
    }
}
