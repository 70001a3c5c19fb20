/// Logs at ERROR with a `[CRITICAL]` marker. The `log` facade has no level
/// above ERROR, so failures that abort a whole run are tagged instead.
#[macro_export]
macro_rules! critical {
    ($($arg:tt)+) => {
        $crate::log::error!("[CRITICAL] {}", format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! debug_or_trace {
    (($($debug:tt)+), ($($trace:tt)+)) => {
        if $crate::log::log_enabled!($crate::log::Level::Trace) {
            $crate::log::trace!($($trace)*);
        } else {
            $crate::log::debug!($($debug)*);
        }
    }
}
