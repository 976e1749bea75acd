use std::io;
use std::process::ExitCode;

use thiserror::Error;
use wayland_client::{ConnectError, ProtocolError};

use crate::globals::Capability;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way the client can fail. Each site owns its own diagnostic line.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to connect")]
    Connect(#[source] ConnectError),
    #[error("failed to discover globals")]
    Discovery(#[source] io::Error),
    #[error("failed to get {0} object")]
    MissingGlobal(Capability),
    #[error("failed to create pool fd")]
    PoolFd(#[source] nix::Error),
    #[error("failed to allocate pool backing memory")]
    PoolGrow(#[source] io::Error),
    #[error("failed to create pool")]
    Pool,
    #[error("failed to map pool")]
    PoolMap(#[source] io::Error),
    #[error("failed to create buffer")]
    Buffer,
    #[error("failed to request new frame callback")]
    FrameCallback,
    #[error("failed to create surface")]
    Surface,
    #[error("failed to get XDG surface")]
    XdgSurface,
    #[error("failed to set surface as toplevel")]
    Toplevel,
    #[error("wayland error: {0}")]
    Dispatch(#[source] io::Error),
    #[error("wayland protocol error: {interface}@{object_id} code {code}: {message}")]
    Protocol {
        interface: &'static str,
        object_id: u32,
        code: u32,
        message: String,
    },
}

impl Error {
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::FAILURE
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        Error::Protocol {
            interface: err.object_interface,
            object_id: err.object_id,
            code: err.code,
            message: err.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_globals_have_distinct_lines() {
        let lines = [Capability::Compositor, Capability::Shm, Capability::WmBase]
            .map(|cap| Error::MissingGlobal(cap).to_string());
        assert_eq!(lines[0], "failed to get compositor object");
        assert_eq!(lines[1], "failed to get shm object");
        assert_eq!(lines[2], "failed to get XDG shell object");
    }

    #[test]
    fn dispatch_error_names_the_cause() {
        let err = Error::Dispatch(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(err.to_string().starts_with("wayland error: "));
    }
}
