//! Local and remote derivation dispatch
//!
//! - [`LocalExecutor`]: derive in-process against the configured stores
//! - [`RemoteDispatcher`]: forward instructions to a remote endpoint

mod local;
mod remote;

pub use local::LocalExecutor;
pub use remote::RemoteDispatcher;
