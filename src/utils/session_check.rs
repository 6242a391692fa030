use crate::error::{DispadError, Result};
use tracing::{info, warn};

/// Проверить, что есть X-дисплей, к которому можно подключиться
pub fn check_session(display_name: Option<&str>) -> Result<()> {
    info!("Проверка графической сессии...");

    check_display(display_name, std::env::var("DISPLAY").ok().as_deref())?;
    check_session_type(std::env::var("XDG_SESSION_TYPE").ok().as_deref());

    Ok(())
}

fn check_display(explicit: Option<&str>, env_display: Option<&str>) -> Result<()> {
    match explicit.or(env_display) {
        Some(name) if !name.is_empty() => {
            info!("Используется дисплей {}", name);
            Ok(())
        }
        _ => Err(DispadError::ServiceUnavailable(
            "Переменная DISPLAY не задана. Запустите dispad внутри X-сессии или укажите --display"
                .to_string(),
        )),
    }
}

fn check_session_type(session_type: Option<&str>) {
    if session_type == Some("wayland") {
        warn!("⚠️  Обнаружена Wayland-сессия!");
        warn!("   Свойства XInput под XWayland не управляют реальными устройствами,");
        warn!("   тачпад, скорее всего, не будет отключаться.");
    }
}
