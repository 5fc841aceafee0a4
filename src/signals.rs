use std::io;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

/// Raised by SIGINT, SIGTERM or SIGHUP.
pub static QUIT: AtomicBool = AtomicBool::new(false);

extern "C" fn raise_quit(_: libc::c_int) {
    QUIT.store(true, Ordering::SeqCst);
}

/// Points the termination signals at `QUIT`. Signals that were ignored when the
/// process started (e.g. SIGHUP under `nohup`) stay ignored.
pub fn install() -> io::Result<()> {
    for &signal in &[libc::SIGTERM, libc::SIGINT, libc::SIGHUP] {
        unsafe {
            let mut old: libc::sigaction = mem::zeroed();
            if libc::sigaction(signal, ptr::null(), &mut old) != 0 {
                return Err(io::Error::last_os_error());
            }
            if old.sa_sigaction == libc::SIG_IGN {
                debug!("signal {} is ignored, leaving it alone", signal);
                continue;
            }

            let mut action: libc::sigaction = mem::zeroed();
            action.sa_sigaction = raise_quit as extern "C" fn(libc::c_int) as libc::sighandler_t;
            libc::sigemptyset(&mut action.sa_mask);
            action.sa_flags = 0;
            if libc::sigaction(signal, &action, ptr::null_mut()) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
    }
    Ok(())
}
