//! Console-style logging macros.
//!
//! The runtime logs the way a browser console would: development builds
//! print, release builds compile the calls away entirely. `debug_log!`
//! additionally requires the `debug-hooks` feature, keeping internal
//! machinery quiet unless explicitly asked for.
//!
//! | Macro | Debug assertions | Feature required |
//! |-------|------------------|------------------|
//! | `debug_log!` | Required | `debug-hooks` |
//! | `info_log!` | Required | None |
//! | `warn_log!` | Required | None |
//! | `error_log!` | Required | None |

/// Logs internal-machinery detail (requires the `debug-hooks` feature).
///
/// # Example
///
/// ```ignore
/// debug_log!("pending traps: {}", count);
/// ```
#[macro_export]
#[cfg(all(debug_assertions, feature = "debug-hooks"))]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		eprintln!("[DEBUG] {}", format!($($arg)*));
	}};
}

/// No-op debug_log when conditions are not met
#[macro_export]
#[cfg(not(all(debug_assertions, feature = "debug-hooks")))]
macro_rules! debug_log {
	($($arg:tt)*) => {{}};
}

/// Logs an informational message (development builds only).
#[macro_export]
#[cfg(debug_assertions)]
macro_rules! info_log {
	($($arg:tt)*) => {{
		eprintln!("[INFO] {}", format!($($arg)*));
	}};
}

/// No-op info_log in release builds
#[macro_export]
#[cfg(not(debug_assertions))]
macro_rules! info_log {
	($($arg:tt)*) => {{}};
}

/// Logs a warning (development builds only).
///
/// # Example
///
/// ```ignore
/// warn_log!("no component owns this subtree; event swallowed");
/// ```
#[macro_export]
#[cfg(debug_assertions)]
macro_rules! warn_log {
	($($arg:tt)*) => {{
		eprintln!("[WARN] {}", format!($($arg)*));
	}};
}

/// No-op warn_log in release builds
#[macro_export]
#[cfg(not(debug_assertions))]
macro_rules! warn_log {
	($($arg:tt)*) => {{}};
}

/// Logs an error (development builds only).
#[macro_export]
#[cfg(debug_assertions)]
macro_rules! error_log {
	($($arg:tt)*) => {{
		eprintln!("[ERROR] {}", format!($($arg)*));
	}};
}

/// No-op error_log in release builds
#[macro_export]
#[cfg(not(debug_assertions))]
macro_rules! error_log {
	($($arg:tt)*) => {{}};
}

#[cfg(test)]
mod tests {
	#[test]
	fn test_logging_macros_compile() {
		crate::debug_log!("debug: {}", 42);
		crate::info_log!("info: {}", "test");
		crate::warn_log!("warn: {:?}", vec![1, 2, 3]);
		crate::error_log!("error: {}", "boom");
	}

	#[test]
	fn test_logging_macros_no_args() {
		crate::debug_log!("plain debug");
		crate::info_log!("plain info");
		crate::warn_log!("plain warning");
		crate::error_log!("plain error");
	}
}
