//! A small Wayland client that discovers the compositor's globals, carves frames out of one
//! shared-memory pool and keeps a toplevel window throbbing from frame callbacks.

use wayland_client::{Interface, Proxy};

pub mod app;
pub mod config;
pub mod draw;
pub mod error;
pub mod globals;
pub mod logging;
pub mod nullable;
pub mod pool;
pub mod prelude;
pub mod present;
pub mod window;

pub use app::Stage;
pub use error::{Error, Result};

/// Requests on a dead connection hand back dead proxies instead of failing outright.
pub(crate) fn is_alive<I>(proxy: &I) -> bool
where
    I: Interface + AsRef<Proxy<I>> + From<Proxy<I>>,
{
    proxy.as_ref().is_alive()
}

pub(crate) fn proxy_id<I>(proxy: &I) -> u32
where
    I: Interface + AsRef<Proxy<I>> + From<Proxy<I>>,
{
    proxy.as_ref().id()
}
