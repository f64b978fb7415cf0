//! Signal bridge.
//!
//! The handlers only flip an atomic flag; the shell's main loop consumes the
//! flags between commands, so no registry state is touched from a handler.

use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::errors::{Result, ResultExt};

/// Broadcast to background jobs on `exit`; the shell itself only reports it.
pub const SHUTDOWN_SIGNAL: Signal = Signal::SIGUSR2;

static REAP_REQUESTED: AtomicBool = AtomicBool::new(false);
static TERMINATE_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_child_changed(_: libc::c_int) {
    REAP_REQUESTED.store(true, Ordering::SeqCst);
}

extern "C" fn handle_shutdown_broadcast(_: libc::c_int) {
    TERMINATE_REQUESTED.store(true, Ordering::SeqCst);
}

/// Installs the SIGCHLD and SIGUSR2 handlers.
///
/// `SA_RESTART` keeps a foreground `waitpid` from failing with `EINTR` when a
/// background child terminates while we are blocked.
pub fn install_handlers() -> Result<()> {
    let flags = SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP;
    let child_changed = SigAction::new(
        SigHandler::Handler(handle_child_changed),
        flags,
        SigSet::empty(),
    );
    let shutdown_broadcast = SigAction::new(
        SigHandler::Handler(handle_shutdown_broadcast),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );

    // Both handlers only store to an AtomicBool, which is async-signal-safe.
    unsafe {
        signal::sigaction(Signal::SIGCHLD, &child_changed)
            .chain_err(|| "failed to install SIGCHLD handler")?;
        signal::sigaction(SHUTDOWN_SIGNAL, &shutdown_broadcast)
            .chain_err(|| "failed to install SIGUSR2 handler")?;
    }

    debug!("installed SIGCHLD and {:?} handlers", SHUTDOWN_SIGNAL);
    Ok(())
}

/// Clears the reap flag, returning whether it was set.
pub fn take_reap_request() -> bool {
    REAP_REQUESTED.swap(false, Ordering::SeqCst)
}

/// Clears the terminate flag, returning whether it was set.
pub fn take_terminate_request() -> bool {
    TERMINATE_REQUESTED.swap(false, Ordering::SeqCst)
}

/// Sets the reap flag as if a child had changed state.
pub fn request_reap() {
    REAP_REQUESTED.store(true, Ordering::SeqCst);
}
