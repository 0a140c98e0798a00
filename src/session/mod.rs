// Media session providers
//
// A provider answers one question: what is the host playing right now?
// All failure modes are absorbed into the returned snapshot, so callers
// never have to handle an Err from a poll.

pub mod script;

use async_trait::async_trait;

use crate::data::MediaSnapshot;

/// Abstract interface for querying the OS "now playing" session.
///
/// `fetch` may suspend while the underlying query runs. It is not safe
/// to issue two concurrent fetches against the same session handle, so
/// the publish loop keeps at most one call in flight.
#[async_trait]
pub trait MediaSessionProvider: Send + Sync {
    /// Query the current media session.
    ///
    /// Never fails to the caller: a failed or timed-out query is
    /// returned as a snapshot with `status = error`.
    async fn fetch(&self) -> MediaSnapshot;

    /// Short identifier for this provider, used in log output
    fn name(&self) -> &str;
}

pub use script::ScriptSessionProvider;
