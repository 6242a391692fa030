pub mod daemon;
pub mod pidfile;
pub mod session_check;
pub mod signals;

pub use pidfile::PidFile;
pub use signals::ShutdownSignals;

// ✅ Макросы условного логирования для горячего цикла опроса
#[macro_export]
macro_rules! debug_if_enabled {
    ($($arg:tt)*) => {
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!($($arg)*);
        }
    };
}
