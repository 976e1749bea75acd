use std::process::ExitCode;

use wayland_thing::Stage;

fn main() -> ExitCode {
    wayland_thing::app::main(Stage::Connect)
}
