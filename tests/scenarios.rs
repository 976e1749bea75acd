use std::cell::RefCell;
use std::rc::Rc;

use wayland_client::GlobalEvent;
use wayland_thing::config::{pack, WindowConfig, STATIC_FILL};
use wayland_thing::draw::{throb_color, throb_level, Painter};
use wayland_thing::globals::{handle_ping, Binder, Capability, Globals, ShellBase};
use wayland_thing::pool::{Buffering, PoolLayout};
use wayland_thing::present::{FrameState, PresentTarget, Presenter};
use wayland_thing::{Error, Result};

/// Every outgoing request, in the order it was issued.
type Log = Rc<RefCell<Vec<String>>>;

struct FakeRegistry(Log);

struct FakeShell(Log);

impl ShellBase for FakeShell {
    fn pong(&self, serial: u32) {
        self.0.borrow_mut().push(format!("pong {}", serial));
    }
    fn destroy(&self) {
        self.0.borrow_mut().push("destroy xdg_wm_base".to_owned());
    }
}

impl Binder for FakeRegistry {
    type Compositor = ();
    type Shm = ();
    type WmBase = FakeShell;
    fn bind_compositor(&self, name: u32) {
        self.0.borrow_mut().push(format!("bind wl_compositor {}", name));
    }
    fn bind_shm(&self, name: u32) {
        self.0.borrow_mut().push(format!("bind wl_shm {}", name));
    }
    fn bind_wm_base(&self, name: u32) -> FakeShell {
        self.0.borrow_mut().push(format!("bind xdg_wm_base {}", name));
        FakeShell(self.0.clone())
    }
}

fn discover(interfaces: &[&str]) -> (Log, Result<()>) {
    let log = Log::default();
    let registry = FakeRegistry(log.clone());
    let mut globals = Globals::default();
    for (id, interface) in interfaces.iter().enumerate() {
        globals.handle_event(
            &registry,
            GlobalEvent::New {
                id: id as u32 + 1,
                interface: interface.to_string(),
                version: 1,
            },
        );
    }
    let result = globals.take_bound().map(drop);
    (log, result)
}

#[test]
fn startup_needs_every_required_global() {
    let all = ["wl_compositor", "wl_shm", "xdg_wm_base", "wl_seat"];
    let (log, result) = discover(&all);
    assert!(result.is_ok());
    assert_eq!(
        *log.borrow(),
        [
            "bind wl_compositor 1",
            "bind wl_shm 2",
            "bind xdg_wm_base 3",
            "destroy xdg_wm_base",
        ]
    );

    for missing in Capability::ALL {
        let offered: Vec<_> = all.iter().copied().filter(|i| *i != missing.interface()).collect();
        let (_, result) = discover(&offered);
        let err = result.unwrap_err();
        assert!(matches!(err, Error::MissingGlobal(cap) if cap == missing));
        let expected = match missing {
            Capability::Compositor => "failed to get compositor object",
            Capability::Shm => "failed to get shm object",
            Capability::WmBase => "failed to get XDG shell object",
        };
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn ping_is_answered_before_anything_else() {
    let log = Log::default();
    let shell = FakeShell(log.clone());
    handle_ping(&shell, 0xc0ffee);
    assert_eq!(*log.borrow(), [format!("pong {}", 0xc0ffee)]);
}

#[derive(Default)]
struct Surface {
    attached: Vec<usize>,
    commits: u32,
}

impl PresentTarget for Surface {
    type Buffer = usize;
    type Frame = ();
    fn create_buffer(&mut self, offset: usize, _layout: &PoolLayout) -> Result<usize> {
        Ok(offset)
    }
    fn request_frame(&mut self) -> Result<()> {
        Ok(())
    }
    fn attach(&mut self, buffer: &usize) {
        self.attached.push(*buffer);
    }
    fn damage(&mut self, _width: u32, _height: u32) {}
    fn commit(&mut self) {
        self.commits += 1;
    }
}

#[test]
fn static_window_is_solid_blue() {
    let config = WindowConfig::default();
    let layout = PoolLayout::new(config.width, config.height, Buffering::Single);
    let framebuffer = vec![0u32; layout.pool_size() / 4];
    let mut presenter = Presenter::new(
        Surface::default(),
        framebuffer,
        layout,
        Painter::Solid(pack(STATIC_FILL)),
    );
    presenter.present(config.first_frame_ms).unwrap();

    let stride = 500;
    let fb = presenter.framebuffer_mut();
    for row in 0..500 {
        for col in 0..500 {
            assert_eq!(fb[stride * row + col], 0xFF0000FF, "pixel {},{}", row, col);
        }
    }
    assert_eq!(presenter.target().attached, [0]);
    assert_eq!(presenter.target().commits, 1);
}

#[test]
fn throb_starts_at_half_level() {
    let t = (1.0 + (2.0 * std::f64::consts::PI * 0.0 / 2000.0).sin()) / 2.0;
    assert_eq!(t, 0.5);
    assert_eq!(throb_level(0, 2000), t);
    let reference = (t.powf(0.4545) * 0x0000ff as f64) as u32;
    assert_eq!(throb_color(0, 2000, 0x0000ff), reference);
    assert_eq!(reference, 186);
}

#[test]
fn animated_window_alternates_halves_until_limit() {
    let layout = PoolLayout::new(500, 500, Buffering::Double);
    let framebuffer = vec![0u32; layout.pool_size() / 4];
    let mut presenter = Presenter::new(
        Surface::default(),
        framebuffer,
        layout,
        Painter::Throb {
            period_ms: 2000,
            base: 0xff,
        },
    )
    .continuous()
    .with_frame_limit(Some(4));

    presenter.present(200).unwrap();
    let mut time = 200;
    while presenter.on_frame_done(time).unwrap().is_some() {
        time += 16;
    }
    assert_eq!(presenter.state(), FrameState::Finished);
    assert_eq!(presenter.target().attached, [0, 1_000_000, 0, 1_000_000]);
}
