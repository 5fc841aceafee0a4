use std::io;

use crate::error::{Error, Result};

/// Which side of `background` we are on.
#[derive(Debug, PartialEq, Eq)]
pub enum Fork {
    /// The original process; it should exit right away.
    Parent { child: libc::pid_t },
    /// The detached copy that carries on.
    Child,
}

/// Continues in a forked copy of the process. Must be called while the process is
/// still single-threaded.
pub fn background() -> Result<Fork> {
    match unsafe { libc::fork() } {
        -1 => Err(Error::Fork(io::Error::last_os_error())),
        0 => Ok(Fork::Child),
        child => Ok(Fork::Parent { child }),
    }
}
