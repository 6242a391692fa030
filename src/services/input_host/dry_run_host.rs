use crate::error::Result;
use crate::events::{Atom, DeviceId, DeviceInfo, HostFault, KeyStateSnapshot};
use std::collections::HashMap;
use tracing::info;

use super::r#trait::InputHost;

/// Обёртка для режима сухого запуска: всё читается с настоящего хоста,
/// но запись свойств только логируется и запоминается.
pub struct DryRunHost<H> {
    inner: H,
    values: HashMap<(DeviceId, Atom), u8>,
}

impl<H: InputHost> DryRunHost<H> {
    pub fn new(inner: H) -> Self {
        info!("Инициализация DryRunHost - свойства устройств изменяться не будут");
        Self {
            inner,
            values: HashMap::new(),
        }
    }
}

impl<H: InputHost> InputHost for DryRunHost<H> {
    fn lookup_atom(&mut self, name: &str) -> Result<Option<Atom>> {
        self.inner.lookup_atom(name)
    }

    fn list_input_devices(&mut self) -> Result<Vec<DeviceInfo>> {
        self.inner.list_input_devices()
    }

    fn open_device(&mut self, id: DeviceId) -> Result<()> {
        self.inner.open_device(id)
    }

    fn close_device(&mut self, id: DeviceId) -> Result<()> {
        self.inner.close_device(id)
    }

    fn list_device_properties(&mut self, id: DeviceId) -> Result<Vec<Atom>> {
        self.inner.list_device_properties(id)
    }

    fn get_device_property(&mut self, id: DeviceId, property: Atom) -> Result<Option<u8>> {
        let real = self.inner.get_device_property(id, property)?;
        // Без реального значения устройство всё равно пропускается вызывающим
        Ok(real.map(|value| *self.values.get(&(id, property)).unwrap_or(&value)))
    }

    fn set_device_property(&mut self, id: DeviceId, property: Atom, value: u8) -> Result<()> {
        info!("[DRY RUN] Устройство {}: свойство {} = {}", id, property, value);
        self.values.insert((id, property), value);
        Ok(())
    }

    fn query_keymap(&mut self) -> Result<KeyStateSnapshot> {
        self.inner.query_keymap()
    }

    fn modifier_keycodes(&mut self) -> Result<Vec<u8>> {
        self.inner.modifier_keycodes()
    }

    fn poll_fault(&mut self) -> Result<Option<HostFault>> {
        self.inner.poll_fault()
    }
}
