use crate::debug_if_enabled;
use crate::error::{DispadError, Result};
use crate::events::{Atom, DeviceId, DeviceInfo};
use crate::services::InputHost;
use smallvec::SmallVec;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Максимальное число одновременно управляемых устройств
pub const MAX_DEVICES: usize = 4;

/// Пауза между попытками найти тачпад
pub const DISCOVERY_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Имя атома класса тачпадов в XInput
const XI_TOUCHPAD: &str = "TOUCHPAD";

/// Свойство, через которое включается/отключается устройство
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    pub name: String,
    pub enable_value: u8,
    pub disable_value: u8,
}

impl PropertySpec {
    pub fn new(name: impl Into<String>, enable_value: u8, disable_value: u8) -> Self {
        Self {
            name: name.into(),
            enable_value,
            disable_value,
        }
    }

    pub fn value_for(&self, enable: bool) -> u8 {
        if enable {
            self.enable_value
        } else {
            self.disable_value
        }
    }
}

#[derive(Debug)]
struct ControlledDevice {
    id: DeviceId,
    name: String,
    /// Значение свойства на момент обнаружения, восстанавливается при завершении
    start_value: Option<u8>,
}

pub struct DeviceController {
    spec: PropertySpec,
    property: Atom,
    devices: SmallVec<[ControlledDevice; MAX_DEVICES]>,
    /// Исходные значения устройств, сброшенных `invalidate`: текущее значение
    /// пережившего устройства уже изменено нами и исходным не является
    remembered: SmallVec<[(DeviceId, u8); MAX_DEVICES]>,
    retry_delay: Duration,
}

impl DeviceController {
    pub fn new<H: InputHost>(host: &mut H, spec: PropertySpec) -> Result<Self> {
        info!("Инициализация DeviceController для свойства \"{}\"", spec.name);

        let property = match host.lookup_atom(&spec.name)? {
            Some(atom) => atom,
            None => return DispadError::property_not_found(spec.name),
        };
        debug!("Свойство \"{}\" = атом {}", spec.name, property);

        Ok(Self {
            spec,
            property,
            devices: SmallVec::new(),
            remembered: SmallVec::new(),
            retry_delay: DISCOVERY_RETRY_DELAY,
        })
    }

    #[cfg(test)]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    #[cfg(test)]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    #[cfg(test)]
    pub fn device_ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.devices.iter().map(|device| device.id)
    }

    /// Найти управляемые устройства. Блокирует, пока не найдётся хотя бы одно.
    pub async fn discover_devices<H: InputHost>(&mut self, host: &mut H) -> Result<()> {
        if !self.devices.is_empty() {
            self.release(host);
        }

        loop {
            if self.load_devices(host)? > 0 {
                self.remembered.clear();
                info!("Найдено управляемых устройств: {}", self.devices.len());
                self.toggle(host, true);
                return Ok(());
            }

            debug!(
                "Управляемые устройства не найдены, повтор через {:?}",
                self.retry_delay
            );
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    /// Один проход перечисления. Возвращает число устройств в наборе.
    fn load_devices<H: InputHost>(&mut self, host: &mut H) -> Result<usize> {
        self.devices.clear();

        let touchpad_type = host.lookup_atom(XI_TOUCHPAD)?;
        let devices = host.list_input_devices()?;
        debug!("Поиск свойства \"{}\" среди {} устройств", self.spec.name, devices.len());

        let Some(touchpad_type) = touchpad_type else {
            debug!("Атом {} ещё не зарегистрирован X-сервером", XI_TOUCHPAD);
            return Ok(0);
        };

        for info in devices {
            if self.devices.len() == MAX_DEVICES {
                break;
            }

            if info.device_type != touchpad_type {
                debug!("Не тачпад: {}", info);
                continue;
            }

            debug!("Найден тачпад {}", info);
            if self.try_adopt(host, &info) {
                debug!("Свойство найдено на устройстве {}", info);
                self.devices.push(ControlledDevice {
                    id: info.id,
                    name: info.name,
                    start_value: None,
                });
            }
        }

        for device in self.devices.iter_mut() {
            if let Some((_, value)) = self.remembered.iter().find(|(id, _)| *id == device.id) {
                debug!("Исходное значение {} для \"{}\" сохранено с прошлого поиска", value, device.name);
                device.start_value = Some(*value);
                continue;
            }

            match host.get_device_property(device.id, self.property) {
                Ok(value) => device.start_value = value,
                Err(e) => debug!("Не удалось прочитать исходное значение \"{}\": {}", device.name, e),
            }
        }

        Ok(self.devices.len())
    }

    /// Открыть устройство и проверить наличие свойства. Неподходящее закрывается.
    fn try_adopt<H: InputHost>(&self, host: &mut H, info: &DeviceInfo) -> bool {
        if let Err(e) = host.open_device(info.id) {
            warn!("Не удалось открыть устройство {}: {}", info, e);
            return false;
        }

        let has_property = match host.list_device_properties(info.id) {
            Ok(properties) if properties.is_empty() => {
                debug!("У устройства {} нет свойств", info);
                false
            }
            Ok(properties) => properties.contains(&self.property),
            Err(e) => {
                debug!("Не удалось получить свойства {}: {}", info, e);
                false
            }
        };

        if !has_property {
            if let Err(e) = host.close_device(info.id) {
                debug!("Не удалось закрыть устройство {}: {}", info, e);
            }
        }

        has_property
    }

    /// Включить или отключить устройства. Пишет только отличающиеся значения.
    pub fn toggle<H: InputHost>(&self, host: &mut H, enable: bool) {
        let target = self.spec.value_for(enable);

        for (index, device) in self.devices.iter().enumerate() {
            match host.get_device_property(device.id, self.property) {
                Ok(Some(current)) if current == target => {}
                Ok(Some(_)) => {
                    debug!(
                        "Установка значения {} для устройства #{} \"{}\"",
                        target, index, device.name
                    );
                    if let Err(e) = host.set_device_property(device.id, self.property, target) {
                        warn!("Не удалось изменить свойство \"{}\": {}", device.name, e);
                    }
                }
                Ok(None) => {
                    debug_if_enabled!(
                        "Устройство \"{}\" не сообщает значение свойства {}",
                        device.name,
                        self.spec.name
                    );
                }
                Err(e) => {
                    debug_if_enabled!(
                        "Не удалось прочитать свойство {} устройства \"{}\": {}",
                        self.spec.name,
                        device.name,
                        e
                    );
                }
            }
        }
    }

    /// Устройства исчезли: забыть их, не закрывая (X-сервер уже освободил их).
    /// Исходные значения сохраняются для устройств, которые найдутся снова.
    pub fn invalidate(&mut self) {
        if !self.devices.is_empty() {
            debug!("Сброс {} недействительных устройств", self.devices.len());
        }
        for device in self.devices.drain(..) {
            if let Some(value) = device.start_value {
                if !self.remembered.iter().any(|(id, _)| *id == device.id) {
                    self.remembered.push((device.id, value));
                }
            }
        }
    }

    /// Восстановить исходные значения и закрыть устройства
    pub fn release<H: InputHost>(&mut self, host: &mut H) {
        for device in self.devices.drain(..) {
            match device.start_value {
                Some(value) => {
                    debug!("Восстановление значения {} для \"{}\"", value, device.name);
                    if let Err(e) = host.set_device_property(device.id, self.property, value) {
                        warn!("Не удалось восстановить свойство \"{}\": {}", device.name, e);
                    }
                }
                None => debug!(
                    "Исходное значение \"{}\" неизвестно, восстановление пропущено",
                    device.name
                ),
            }

            if let Err(e) = host.close_device(device.id) {
                warn!("Не удалось закрыть устройство \"{}\": {}", device.name, e);
            }
        }
    }
}
