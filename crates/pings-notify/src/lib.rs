pub mod hub;
pub mod relay;

use anyhow::Result;
use futures_util::future::BoxFuture;

use pings_types::events::Publication;

pub use hub::Hub;
pub use relay::HttpRelay;

/// Notifier gateway: hands one publication to the pub/sub transport.
///
/// An `Ok` means the transport accepted the message, not that any
/// subscriber has seen it yet.
pub trait Notifier: Send + Sync {
    fn publish(&self, publication: Publication) -> BoxFuture<'_, Result<()>>;
}
