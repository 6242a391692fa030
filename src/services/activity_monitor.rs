use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{key_name, KeyBits, KeyStateSnapshot, ModifierMask};
use crate::services::InputHost;
use std::time::Duration;
use tracing::info;

/// Параметры детектора активности
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySettings {
    /// Считать ли нажатия модификаторов набором текста
    pub modifiers: bool,
    pub idle_threshold: Duration,
    pub poll_interval: Duration,
}

impl ActivitySettings {
    pub fn from_millis(modifiers: bool, idle_ms: u64, poll_ms: u64) -> Self {
        Self {
            modifiers,
            idle_threshold: Duration::from_millis(idle_ms),
            poll_interval: Duration::from_millis(poll_ms),
        }
    }
}

pub struct ActivityMonitor {
    settings: ActivitySettings,
    mask: ModifierMask,
    current: KeyStateSnapshot,
    previous: KeyStateSnapshot,
}

impl ActivityMonitor {
    pub fn new<H: InputHost>(host: &mut H, settings: ActivitySettings) -> Result<Self> {
        info!("Инициализация ActivityMonitor (модификаторы: {})", settings.modifiers);

        let mut mask = KeyBits::full();
        if !settings.modifiers {
            for keycode in host.modifier_keycodes()?.into_iter().filter(|kc| *kc != 0) {
                mask.clear(keycode);
            }
            debug_if_enabled!("Модификаторы исключены из учёта: {:?}", excluded(&mask));
        }

        let initial = host.query_keymap()?;

        Ok(Self {
            settings,
            mask,
            current: initial,
            previous: initial,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.settings.poll_interval
    }

    /// Снять состояние клавиатуры и определить, был ли набор текста с прошлого опроса
    pub fn sample_activity<H: InputHost>(&mut self, host: &mut H) -> Result<bool> {
        let snapshot = host.query_keymap()?;
        Ok(self.classify(snapshot))
    }

    /// Классифицировать снимок относительно предыдущего
    pub fn classify(&mut self, snapshot: KeyStateSnapshot) -> bool {
        self.current = snapshot;

        let fresh = self.current.first_fresh_press(&self.previous, &self.mask);
        let mut active = fresh.is_some();

        // Удерживаемый модификатор превращает нажатие в сочетание клавиш, а не в набор
        if active && !self.settings.modifiers && self.current.holds_excluded(&self.mask) {
            debug_if_enabled!("Нажатие с удерживаемым модификатором не считается набором");
            active = false;
        }

        if active {
            if let Some(keycode) = fresh {
                debug_if_enabled!("Активность клавиатуры: {}", key_name(keycode));
            }
        }

        self.previous = self.current;
        active
    }
}

fn excluded(mask: &ModifierMask) -> Vec<String> {
    (0..=u8::MAX)
        .filter(|keycode| !mask.contains(*keycode))
        .map(key_name)
        .collect()
}
