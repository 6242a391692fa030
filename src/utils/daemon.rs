use crate::error::Result;
use nix::unistd::{fork, setsid, ForkResult};

/// Уйти в фон: родитель завершается, потомок становится лидером новой сессии.
///
/// Вызывать только до запуска runtime и любых потоков.
pub fn daemonize() -> Result<()> {
    // SAFETY: процесс ещё однопоточный, runtime tokio не создан
    match unsafe { fork() }? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {
            setsid()?;
            Ok(())
        }
    }
}
