use std::fmt;

use tracing::{debug, trace};
use wayland_client::protocol::{
    wl_compositor::WlCompositor, wl_registry::WlRegistry, wl_shm::WlShm,
};
use wayland_client::{Attached, GlobalEvent, Main};
use wayland_protocols::xdg_shell::client::xdg_wm_base::{self, XdgWmBase};

use crate::prelude::*;

/// Every global is bound at this version, the oldest one carrying what we use.
pub const BIND_VERSION: u32 = 1;

/// The globals this client cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Compositor,
    Shm,
    WmBase,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::Compositor, Capability::Shm, Capability::WmBase];

    pub fn interface(self) -> &'static str {
        match self {
            Capability::Compositor => "wl_compositor",
            Capability::Shm => "wl_shm",
            Capability::WmBase => "xdg_wm_base",
        }
    }

    pub fn from_interface(interface: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cap| cap.interface() == interface)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Compositor => "compositor",
            Capability::Shm => "shm",
            Capability::WmBase => "XDG shell",
        })
    }
}

/// Turns an advertised global name into a live handle.
pub trait Binder {
    type Compositor;
    type Shm;
    type WmBase: ShellBase;
    fn bind_compositor(&self, name: u32) -> Self::Compositor;
    fn bind_shm(&self, name: u32) -> Self::Shm;
    fn bind_wm_base(&self, name: u32) -> Self::WmBase;
}

impl Binder for Attached<WlRegistry> {
    type Compositor = Main<WlCompositor>;
    type Shm = Main<WlShm>;
    type WmBase = Main<XdgWmBase>;
    fn bind_compositor(&self, name: u32) -> Self::Compositor {
        self.bind::<WlCompositor>(BIND_VERSION, name)
    }
    fn bind_shm(&self, name: u32) -> Self::Shm {
        self.bind::<WlShm>(BIND_VERSION, name)
    }
    fn bind_wm_base(&self, name: u32) -> Self::WmBase {
        self.bind::<XdgWmBase>(BIND_VERSION, name)
    }
}

/// Globals as they trickle in from the registry. Any slot may still be empty.
pub struct Globals<B: Binder> {
    pub compositor: Nullable<B::Compositor>,
    pub shm: Nullable<B::Shm>,
    pub wm_base: Nullable<B::WmBase>,
}

impl<B: Binder> Default for Globals<B> {
    fn default() -> Self {
        Self {
            compositor: null(),
            shm: null(),
            wm_base: null(),
        }
    }
}

impl<B: Binder> Globals<B> {
    pub fn handle_event(&mut self, binder: &B, event: GlobalEvent) {
        match event {
            GlobalEvent::New {
                id,
                interface,
                version,
            } => {
                println!("new '{}' instance (version {}) bound at {}", interface, version, id);
                match Capability::from_interface(&interface) {
                    Some(Capability::Compositor) => self.compositor.put(binder.bind_compositor(id)),
                    Some(Capability::Shm) => self.shm.put(binder.bind_shm(id)),
                    Some(Capability::WmBase) => self.wm_base.put(binder.bind_wm_base(id)),
                    None => trace!(%interface, "not interested"),
                }
            }
            // Handles stay in place: nothing we bind is expected to go away.
            GlobalEvent::Removed { id, interface } => {
                println!("instance {} removed", id);
                debug!(%interface, id, "global removed");
            }
        }
    }

    /// Hands out every required global, or names the first one the compositor never offered.
    pub fn take_bound(&mut self) -> Result<BoundGlobals<B::Compositor, B::Shm, B::WmBase>> {
        Ok(BoundGlobals {
            compositor: self.compositor.take_or(Error::MissingGlobal(Capability::Compositor))?,
            shm: self.shm.take_or(Error::MissingGlobal(Capability::Shm))?,
            wm_base: self.wm_base.take_or(Error::MissingGlobal(Capability::WmBase))?,
        })
    }
}

pub struct BoundGlobals<C, S, W: ShellBase> {
    pub compositor: C,
    pub shm: S,
    pub wm_base: W,
}

pub type WaylandGlobals = BoundGlobals<Main<WlCompositor>, Main<WlShm>, Main<XdgWmBase>>;

impl WaylandGlobals {
    pub fn listen_for_pings(&self) {
        self.wm_base.quick_assign(|wm_base: Main<XdgWmBase>, event: xdg_wm_base::Event, _| {
            if let xdg_wm_base::Event::Ping { serial } = event {
                handle_ping(&**wm_base, serial);
            }
        });
    }
}

impl<C, S, W: ShellBase> Drop for BoundGlobals<C, S, W> {
    fn drop(&mut self) {
        // wl_compositor and wl_shm v1 have no destructor request.
        self.wm_base.destroy();
    }
}

/// The shell-base side of the liveness check.
pub trait ShellBase {
    fn pong(&self, serial: u32);
    fn destroy(&self);
}

impl ShellBase for XdgWmBase {
    fn pong(&self, serial: u32) {
        XdgWmBase::pong(self, serial)
    }
    fn destroy(&self) {
        XdgWmBase::destroy(self)
    }
}

impl ShellBase for Main<XdgWmBase> {
    fn pong(&self, serial: u32) {
        XdgWmBase::pong(self, serial)
    }
    fn destroy(&self) {
        XdgWmBase::destroy(self)
    }
}

pub fn handle_ping(wm_base: &impl ShellBase, serial: u32) {
    trace!(serial, "ping");
    wm_base.pong(serial);
}
