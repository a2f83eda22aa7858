use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared interrupt state for one backup session.
///
/// The copy engine checks [`CancelToken::is_interrupted`] before each file, so an interrupt
/// stops the run between files and never leaves a half-written destination file.
#[derive(Clone, Default)]
pub struct CancelToken {
    interrupted: Arc<AtomicBool>,
    copying: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an interrupt has been requested
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    /// Whether a copy run is currently in progress
    pub fn is_copying(&self) -> bool {
        self.copying.load(Ordering::SeqCst)
    }

    /// Mark a copy run as active until the returned guard is dropped
    pub fn begin_copy(&self) -> CopyGuard {
        self.copying.store(true, Ordering::SeqCst);
        CopyGuard {
            token: self.clone(),
        }
    }
}

/// RAII guard that clears the copying flag on drop
pub struct CopyGuard {
    token: CancelToken,
}

impl Drop for CopyGuard {
    fn drop(&mut self) {
        self.token.copying.store(false, Ordering::SeqCst);
    }
}

/// Install the Ctrl-C handler.
///
/// During a copy the handler only requests a stop after the current file. Anywhere else
/// (at a prompt) there is nothing to finish, so the process exits right away.
pub fn install_handler(token: &CancelToken) -> Result<(), ctrlc::Error> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        if token.is_copying() {
            if !token.is_interrupted() {
                eprintln!("\nInterrupted by user. Stopping after the current file...");
            }
            token.interrupt();
        } else {
            eprintln!("\nInterrupted by user.");
            std::process::exit(130);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_interrupted());

        token.interrupt();
        assert!(clone.is_interrupted());
    }

    #[test]
    fn test_copy_guard_clears_flag() {
        let token = CancelToken::new();
        assert!(!token.is_copying());

        {
            let _guard = token.begin_copy();
            assert!(token.is_copying());
        }

        assert!(!token.is_copying());
    }
}
