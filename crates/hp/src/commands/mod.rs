//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod serve;
pub(crate) mod watch;

pub(crate) use build::BuildArgs;
pub(crate) use serve::ServeArgs;
pub(crate) use watch::WatchArgs;
