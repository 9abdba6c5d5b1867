//! Event source abstraction for viewer input streams.

use crate::error::EnvError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A stream of events delivered into the viewer.
///
/// # Implementations
///
/// - **Simulation**: tick sources and scripted feeds (`mura_sim`)
/// - **Adapters**: `ChannelSource`, fed by whatever glue wraps a remote
///   subscription callback
///
/// # Delivery
///
/// ```text
/// Subscription            Source                     Driver
///   |-- callback(data) --->|                           |
///   |                      |-- recv() -> Ok(Some(e)) ->|
///   |-- on_error(msg) ---->|                           |
///   |                      |-- recv() -> Err(..) ----->|  (source stays open)
///   |-- unsubscribe ------>|                           |
///   |                      |-- recv() -> Ok(None) ---->|  (source is done)
/// ```
#[async_trait]
pub trait EventSource<E: Send + 'static>: Send + 'static {
    /// Waits for the next event.
    ///
    /// # Returns
    /// * `Ok(Some(event))` - An event arrived
    /// * `Ok(None)` - The source is exhausted or unsubscribed
    /// * `Err(EnvError::SourceUnavailable)` - A transient upstream error;
    ///   callers may keep polling
    async fn recv(&mut self) -> Result<Option<E>, EnvError>;

    /// Short name used in logs.
    fn label(&self) -> &str;
}

/// Source backed by a bounded tokio channel.
///
/// The sending half is handed to adapter code; errors are delivered
/// in-band as `Err` items.
pub struct ChannelSource<E> {
    label: String,
    rx: mpsc::Receiver<Result<E, EnvError>>,
}

impl<E: Send + 'static> ChannelSource<E> {
    /// Creates a channel source and its feeding half.
    pub fn new(
        label: impl Into<String>,
        capacity: usize,
    ) -> (mpsc::Sender<Result<E, EnvError>>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            tx,
            Self {
                label: label.into(),
                rx,
            },
        )
    }
}

#[async_trait]
impl<E: Send + 'static> EventSource<E> for ChannelSource<E> {
    async fn recv(&mut self) -> Result<Option<E>, EnvError> {
        match self.rx.recv().await {
            Some(Ok(event)) => Ok(Some(event)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_source_delivers_in_order() {
        let (tx, mut source) = ChannelSource::<u32>::new("snapshot", 8);
        tx.send(Ok(1)).await.unwrap();
        tx.send(Err(EnvError::unavailable("offline"))).await.unwrap();
        tx.send(Ok(2)).await.unwrap();
        drop(tx);

        assert_eq!(source.recv().await, Ok(Some(1)));
        assert_eq!(
            source.recv().await,
            Err(EnvError::SourceUnavailable("offline".to_string()))
        );
        assert_eq!(source.recv().await, Ok(Some(2)));
        assert_eq!(source.recv().await, Ok(None));
        assert_eq!(source.label(), "snapshot");
    }
}
