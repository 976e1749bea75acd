use std::process::ExitCode;

use tracing::{debug, info};
use wayland_client::protocol::wl_registry::WlRegistry;
use wayland_client::{Attached, Display, EventQueue, GlobalManager};

use crate::config::WindowConfig;
use crate::globals::Globals;
use crate::pool::{Buffering, PoolLayout, SharedPool};
use crate::prelude::*;
use crate::window::{create_surface, Window};

/// How far a program gets before it stops. Each stage does everything the previous one does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Connect,
    Registry,
    ShmPool,
    Surface,
    Toplevel,
    Animated,
}

impl Stage {
    pub fn buffering(self) -> Buffering {
        match self {
            Stage::Animated => Buffering::Double,
            _ => Buffering::Single,
        }
    }
}

pub fn main(stage: Stage) -> ExitCode {
    crate::logging::init();
    match run(stage, &WindowConfig::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("{}", err);
            debug!(error = ?err, "fatal");
            err.exit_code()
        }
    }
}

pub fn run(stage: Stage, config: &WindowConfig) -> Result<()> {
    let display = Display::connect_to_env().map_err(Error::Connect)?;
    let mut queue = display.create_event_queue();
    let result = run_stage(stage, config, &display, &mut queue);
    // Destructors queued while the stage unwound still need to go out before disconnecting.
    if let Err(err) = display.flush() {
        debug!(%err, "final flush failed");
    }
    result
}

fn run_stage(
    stage: Stage,
    config: &WindowConfig,
    display: &Display,
    queue: &mut EventQueue,
) -> Result<()> {
    if stage == Stage::Connect {
        info!("connected");
        return Ok(());
    }

    let discovered: RcCell<Globals<Attached<WlRegistry>>> = RcCell::default();
    let _registry = GlobalManager::new_with_cb(&display.attach(queue.token()), {
        let discovered = discovered.clone();
        move |event, registry, _| discovered.borrow_mut().handle_event(&registry, event)
    });
    // Wait for every global that exists right now to be announced.
    queue
        .sync_roundtrip(&mut (), |_, _, _| {})
        .map_err(Error::Discovery)?;
    let globals = discovered.borrow_mut().take_bound()?;
    globals.listen_for_pings();
    if stage == Stage::Registry {
        return Ok(());
    }

    let layout = PoolLayout::new(config.width, config.height, stage.buffering());
    let (pool, mapping) = SharedPool::new(&globals.shm, layout)?;
    if stage == Stage::ShmPool {
        info!(size = pool.size(), "pool mapped");
        queue
            .sync_roundtrip(&mut (), |_, _, _| {})
            .map_err(Error::Dispatch)?;
        return Ok(());
    }

    if stage == Stage::Surface {
        let surface = create_surface(&globals)?;
        surface.commit();
        queue
            .sync_roundtrip(&mut (), |_, _, _| {})
            .map_err(Error::Dispatch)?;
        surface.destroy();
        return Ok(());
    }

    let window = Window::new(&globals, &pool, mapping, queue, config, stage == Stage::Animated)?;
    window.present_first(config.first_frame_ms)?;
    dispatch_loop(display, queue, &window)?;
    info!(frames = window.frames_presented(), "shutting down");
    Ok(())
}

/// Blocks on the connection until the window goes away or something breaks.
fn dispatch_loop(display: &Display, queue: &mut EventQueue, window: &Window) -> Result<()> {
    loop {
        let dispatched = queue.dispatch(&mut (), |_, _, _| {});
        if let Some(err) = display.protocol_error() {
            return Err(err.into());
        }
        dispatched.map_err(Error::Dispatch)?;
        window.check()?;
        if window.should_close() {
            return Ok(());
        }
    }
}
