use memmap2::MmapMut;
use tracing::{debug, trace};
use wayland_client::protocol::wl_callback::{self, WlCallback};
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{EventQueue, Main};
use wayland_protocols::xdg_shell::client::{
    xdg_surface::{self, XdgSurface},
    xdg_toplevel::{self, XdgToplevel},
};

use crate::config::{pack, WindowConfig};
use crate::draw::Painter;
use crate::globals::WaylandGlobals;
use crate::pool::SharedPool;
use crate::prelude::*;
use crate::present::{FrameState, Presenter, WaylandTarget};

pub type FramePresenter = Presenter<WaylandTarget, MmapMut>;

#[derive(Debug, Default)]
struct WindowStatus {
    closed: bool,
    failure: Option<Error>,
}

impl WindowStatus {
    /// Keeps the first failure; listeners cannot return errors to the dispatch loop themselves.
    fn fail(&mut self, err: Error) {
        if self.failure.is_none() {
            self.failure = Some(err);
        }
    }

    fn take_failure(&mut self) -> Result<()> {
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn create_surface(globals: &WaylandGlobals) -> Result<Main<WlSurface>> {
    let surface = globals.compositor.create_surface();
    if !crate::is_alive(&**surface) {
        return Err(Error::Surface);
    }
    Ok(surface)
}

/// A toplevel xdg window whose content comes from the shared pool.
pub struct Window {
    pub xdg_toplevel: Main<XdgToplevel>,
    pub xdg_surface: Main<XdgSurface>,
    pub surface: Main<WlSurface>,
    presenter: RcCell<FramePresenter>,
    status: RcCell<WindowStatus>,
}

impl Drop for Window {
    fn drop(&mut self) {
        self.xdg_toplevel.destroy();
        self.xdg_surface.destroy();
        self.surface.destroy();
    }
}

impl Window {
    /// Sets up the surface and its toplevel role, and waits for the first configure.
    /// `animated` picks the throbbing, frame-callback driven presenter over one static fill.
    pub fn new(
        globals: &WaylandGlobals,
        pool: &SharedPool,
        mapping: MmapMut,
        queue: &mut EventQueue,
        config: &WindowConfig,
        animated: bool,
    ) -> Result<Self> {
        let surface = create_surface(globals)?;
        let xdg_surface = globals.wm_base.get_xdg_surface(&surface);
        if !crate::is_alive(&**xdg_surface) {
            return Err(Error::XdgSurface);
        }
        let xdg_toplevel = xdg_surface.get_toplevel();
        if !crate::is_alive(&**xdg_toplevel) {
            return Err(Error::Toplevel);
        }
        xdg_toplevel.set_title(config.title.clone());

        let target = WaylandTarget {
            surface: surface.clone(),
            pool: pool.wl_pool.clone(),
        };
        let presenter = if animated {
            let painter = Painter::Throb {
                period_ms: config.throb_period_ms,
                base: pack(config.throb_base),
            };
            Presenter::new(target, mapping, pool.layout, painter)
                .continuous()
                .with_frame_limit(config.frame_limit)
        } else {
            Presenter::new(target, mapping, pool.layout, Painter::Solid(pack(config.fill)))
        };

        let window = Self {
            xdg_toplevel,
            xdg_surface,
            surface,
            presenter: presenter.into(),
            status: RcCell::default(),
        };
        window.register_callbacks();

        // The role is only usable once its first configure has been acked.
        window.surface.commit();
        queue
            .sync_roundtrip(&mut (), |_, _, _| {})
            .map_err(Error::Dispatch)?;
        Ok(window)
    }

    fn register_callbacks(&self) {
        self.xdg_surface.quick_assign(
            |xdg_surface: Main<XdgSurface>, event: xdg_surface::Event, _| {
                if let xdg_surface::Event::Configure { serial } = event {
                    trace!(serial, "ack configure");
                    xdg_surface.ack_configure(serial);
                }
            },
        );

        self.xdg_toplevel.quick_assign({
            let status = self.status.clone();
            move |_toplevel: Main<XdgToplevel>, event: xdg_toplevel::Event, _| match event {
                xdg_toplevel::Event::Close => {
                    debug!("toplevel closed");
                    status.borrow_mut().closed = true;
                }
                xdg_toplevel::Event::Configure { width, height, .. } => {
                    trace!(width, height, "toplevel configure")
                }
                _ => (),
            }
        });
    }

    /// Draws the first frame by hand; frame callbacks only start once something was committed.
    pub fn present_first(&self, frame_time_ms: u32) -> Result<()> {
        let frame = self.presenter.borrow_mut().present(frame_time_ms)?;
        arm_frame_callback(&self.presenter, &self.status, frame);
        Ok(())
    }

    pub fn should_close(&self) -> bool {
        self.status.borrow().closed || self.presenter.borrow().state() == FrameState::Finished
    }

    /// Surfaces an error raised inside a listener since the last check.
    pub fn check(&self) -> Result<()> {
        self.status.borrow_mut().take_failure()
    }

    pub fn frames_presented(&self) -> u32 {
        self.presenter.borrow().presented()
    }
}

fn arm_frame_callback(
    presenter: &RcCell<FramePresenter>,
    status: &RcCell<WindowStatus>,
    frame: Option<Main<WlCallback>>,
) {
    let Some(frame) = frame else {
        return;
    };
    let presenter = presenter.weak();
    let status = status.clone();
    frame.quick_assign(move |_callback: Main<WlCallback>, event: wl_callback::Event, _| {
        if let wl_callback::Event::Done { callback_data } = event {
            let Some(presenter) = presenter.try_strong() else {
                return;
            };
            let next = presenter.borrow_mut().on_frame_done(callback_data);
            match next {
                Ok(frame) => arm_frame_callback(&presenter, &status, frame),
                Err(err) => status.borrow_mut().fail(err),
            }
        }
    });
}
