use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use vrlab_runtime::CancelToken;

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);
static TOKEN: OnceLock<CancelToken> = OnceLock::new();

/// Route Ctrl-C to `token`.
///
/// The first signal cancels the token so in-flight runtime calls stop at
/// their next check; a second one exits immediately. Only the first install
/// takes effect.
pub fn install_signal_handler(token: CancelToken) {
    if TOKEN.set(token).is_err() {
        return;
    }
    let _ = ctrlc::set_handler(move || {
        if SHUTDOWN_REQUESTED.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        if let Some(token) = TOKEN.get() {
            token.cancel();
        }
        eprintln!("\ninterrupt received, cancelling current operation...");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_ignored() {
        let first = CancelToken::new();
        install_signal_handler(first.clone());
        install_signal_handler(CancelToken::new());
        assert!(TOKEN.get().unwrap().same_as(&first));
        assert!(!SHUTDOWN_REQUESTED.load(Ordering::SeqCst));
    }
}
