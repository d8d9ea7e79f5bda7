//! Process-wide error-log hook (§7, SPEC_FULL.md §2). Separate from the
//! `log` crate sink: a module author may want the structured `log` record
//! *and* a dedicated operator-facing callback with a `fatal` escalation flag,
//! the same split `dv-sdk/log.hpp` makes between its leveled sink and fatal
//! abort path.

use parking_lot::RwLock;

pub type ErrorLogHook = Box<dyn Fn(&str, bool) + Send + Sync>;

static HOOK: RwLock<Option<ErrorLogHook>> = RwLock::new(None);

/// Installs the process-wide error-log hook, replacing any previous one.
pub fn set_error_log_hook(hook: Option<ErrorLogHook>) {
    *HOOK.write() = hook;
}

/// Reports a diagnostic to the installed hook, if any, and always to the
/// `log` facade (`error!` when `fatal`, `warn!` otherwise) so a log sink
/// catches it even without a hook installed.
pub fn report(message: &str, fatal: bool) {
    if fatal {
        log::error!("{message}");
    } else {
        log::warn!("{message}");
    }
    if let Some(hook) = HOOK.read().as_ref() {
        hook(message, fatal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn hook_receives_reports() {
        let seen = Arc::new(AtomicBool::new(false));
        let seen2 = seen.clone();
        set_error_log_hook(Some(Box::new(move |_msg, fatal| {
            if fatal {
                seen2.store(true, Ordering::SeqCst);
            }
        })));
        report("boom", true);
        assert!(seen.load(Ordering::SeqCst));
        set_error_log_hook(None);
    }
}
