//! Per-module switchable logging for the background loops.
//!
//! The position watch and the photo upload log on every reading or progress
//! tick. A module using these macros declares `const ENABLE_LOGS: bool` and
//! can be silenced by flipping it, independent of `RUST_LOG`.
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_debug, log_info};
//!
//! log_info!("position watch {} started", subscription);
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __log_gated {
    ($level:ident, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::$level!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__log_gated!(debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__log_gated!(info, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__log_gated!(warn, $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__log_gated!(error, $($arg)*) };
}
