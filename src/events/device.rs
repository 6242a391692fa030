use std::fmt;

/// Атом X11 (идентификатор имени свойства или класса устройства)
pub type Atom = u32;

/// Идентификатор устройства XInput
pub type DeviceId = u8;

/// Устройство ввода, как его перечисляет X-сервер
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,
    /// Атом класса устройства (`TOUCHPAD`, `KEYBOARD`, ...) или 0
    pub device_type: Atom,
}

impl DeviceInfo {
    pub fn new(id: DeviceId, name: impl Into<String>, device_type: Atom) -> Self {
        Self {
            id,
            name: name.into(),
            device_type,
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" (id {})", self.name, self.id)
    }
}

/// Асинхронная ошибка, о которой сообщил X-сервер вне обычного цикла запросов
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostFault {
    /// Устройство исчезло (XInput BadDevice): требуется повторный поиск
    DeviceRemoved(String),
    /// Любая другая ошибка протокола считается неустранимой
    Fatal(String),
}

impl fmt::Display for HostFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostFault::DeviceRemoved(detail) => write!(f, "устройство отключено: {}", detail),
            HostFault::Fatal(detail) => write!(f, "{}", detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_display() {
        let info = DeviceInfo::new(12, "SynPS/2 Synaptics TouchPad", 77);
        assert_eq!(info.to_string(), "\"SynPS/2 Synaptics TouchPad\" (id 12)");
    }

    #[test]
    fn test_host_fault_display() {
        let fault = HostFault::DeviceRemoved("BadDevice".to_string());
        assert!(fault.to_string().contains("BadDevice"));
    }
}
