//! Scripted in-memory host for unit tests.

use crate::dispad_error;
use crate::error::Result;
use crate::events::{Atom, DeviceId, DeviceInfo, HostFault, KeyBits, KeyStateSnapshot};
use std::collections::{HashMap, VecDeque};

use super::r#trait::InputHost;

struct FakeDevice {
    info: DeviceInfo,
    properties: HashMap<Atom, u8>,
    open_fails: bool,
    vanishes_on_open: bool,
    read_fails: bool,
}

pub struct FakeHost {
    atoms: HashMap<String, Atom>,
    next_atom: Atom,
    devices: Vec<FakeDevice>,
    empty_passes: usize,
    list_calls: usize,
    writes: Vec<(DeviceId, Atom, u8)>,
    opened: Vec<DeviceId>,
    closed: Vec<DeviceId>,
    keymaps: VecDeque<KeyBits>,
    keymap: KeyBits,
    modifier_keycodes: Vec<u8>,
    faults: VecDeque<HostFault>,
}

impl FakeHost {
    pub fn new() -> Self {
        let mut host = Self {
            atoms: HashMap::new(),
            next_atom: 100,
            devices: Vec::new(),
            empty_passes: 0,
            list_calls: 0,
            writes: Vec::new(),
            opened: Vec::new(),
            closed: Vec::new(),
            keymaps: VecDeque::new(),
            keymap: KeyBits::empty(),
            modifier_keycodes: Vec::new(),
            faults: VecDeque::new(),
        };
        host.register_property("TOUCHPAD");
        host.register_property("KEYBOARD");
        host
    }

    pub fn register_property(&mut self, name: &str) -> Atom {
        if let Some(atom) = self.atoms.get(name) {
            return *atom;
        }
        let atom = self.next_atom;
        self.next_atom += 1;
        self.atoms.insert(name.to_string(), atom);
        atom
    }

    pub fn forget_atom(&mut self, name: &str) {
        self.atoms.remove(name);
    }

    pub fn add_device(&mut self, id: DeviceId, name: &str, class: &str, properties: &[(Atom, u8)]) {
        let device_type = self.register_property(class);
        self.devices.push(FakeDevice {
            info: DeviceInfo::new(id, name, device_type),
            properties: properties.iter().copied().collect(),
            open_fails: false,
            vanishes_on_open: false,
            read_fails: false,
        });
    }

    pub fn add_touchpad(&mut self, id: DeviceId, name: &str, properties: &[(Atom, u8)]) {
        self.add_device(id, name, "TOUCHPAD", properties);
    }

    pub fn remove_device(&mut self, id: DeviceId) {
        self.devices.retain(|device| device.info.id != id);
    }

    pub fn fail_open(&mut self, id: DeviceId) {
        self.device_mut(id).open_fails = true;
    }

    /// Устройство пропадает в момент открытия: ошибка в ответе и BadDevice в очереди,
    /// как у настоящего X-сервера
    pub fn vanish_on_open(&mut self, id: DeviceId) {
        self.device_mut(id).vanishes_on_open = true;
    }

    pub fn fail_read(&mut self, id: DeviceId, fails: bool) {
        self.device_mut(id).read_fails = fails;
    }

    /// Первые `passes` перечислений вернут пустой список устройств
    pub fn hide_devices_for(&mut self, passes: usize) {
        self.empty_passes = passes;
    }

    pub fn queue_keymap(&mut self, keymap: KeyBits) {
        self.keymaps.push_back(keymap);
    }

    pub fn press(&mut self, keycodes: &[u8]) {
        let mut keymap = KeyBits::empty();
        keycodes.iter().for_each(|keycode| keymap.set(*keycode));
        self.queue_keymap(keymap);
    }

    pub fn set_modifier_keycodes(&mut self, keycodes: &[u8]) {
        self.modifier_keycodes = keycodes.to_vec();
    }

    pub fn push_fault(&mut self, fault: HostFault) {
        self.faults.push_back(fault);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls
    }

    pub fn writes(&self) -> &[(DeviceId, Atom, u8)] {
        &self.writes
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    pub fn opened(&self) -> &[DeviceId] {
        &self.opened
    }

    pub fn closed(&self) -> &[DeviceId] {
        &self.closed
    }

    pub fn value(&self, id: DeviceId, property: Atom) -> Option<u8> {
        self.device(id)
            .and_then(|device| device.properties.get(&property).copied())
    }

    fn device(&self, id: DeviceId) -> Option<&FakeDevice> {
        self.devices.iter().find(|device| device.info.id == id)
    }

    fn device_mut(&mut self, id: DeviceId) -> &mut FakeDevice {
        self.devices
            .iter_mut()
            .find(|device| device.info.id == id)
            .expect("unknown fake device")
    }
}

impl InputHost for FakeHost {
    fn lookup_atom(&mut self, name: &str) -> Result<Option<Atom>> {
        Ok(self.atoms.get(name).copied())
    }

    fn list_input_devices(&mut self) -> Result<Vec<DeviceInfo>> {
        self.list_calls += 1;
        if self.empty_passes > 0 {
            self.empty_passes -= 1;
            return Ok(Vec::new());
        }
        Ok(self.devices.iter().map(|device| device.info.clone()).collect())
    }

    fn open_device(&mut self, id: DeviceId) -> Result<()> {
        if self.device(id).is_some_and(|device| device.vanishes_on_open) {
            self.remove_device(id);
            self.faults
                .push_back(HostFault::DeviceRemoved(format!("BadDevice в запросе OpenDevice ({})", id)));
        }

        match self.device(id) {
            Some(device) if !device.open_fails => {
                self.opened.push(id);
                Ok(())
            }
            _ => Err(dispad_error!(protocol, "BadDevice в запросе OpenDevice ({})", id)),
        }
    }

    fn close_device(&mut self, id: DeviceId) -> Result<()> {
        self.closed.push(id);
        Ok(())
    }

    fn list_device_properties(&mut self, id: DeviceId) -> Result<Vec<Atom>> {
        let device = self
            .device(id)
            .ok_or_else(|| dispad_error!(protocol, "BadDevice ({})", id))?;
        let mut atoms: Vec<Atom> = device.properties.keys().copied().collect();
        atoms.sort_unstable();
        Ok(atoms)
    }

    fn get_device_property(&mut self, id: DeviceId, property: Atom) -> Result<Option<u8>> {
        match self.device(id) {
            Some(device) if device.read_fails => {
                Err(dispad_error!(protocol, "BadValue в запросе GetDeviceProperty"))
            }
            Some(device) => Ok(device.properties.get(&property).copied()),
            None => Err(dispad_error!(protocol, "BadDevice ({})", id)),
        }
    }

    fn set_device_property(&mut self, id: DeviceId, property: Atom, value: u8) -> Result<()> {
        self.writes.push((id, property, value));
        if let Some(device) = self.devices.iter_mut().find(|device| device.info.id == id) {
            device.properties.insert(property, value);
        }
        Ok(())
    }

    fn query_keymap(&mut self) -> Result<KeyStateSnapshot> {
        if let Some(keymap) = self.keymaps.pop_front() {
            self.keymap = keymap;
        }
        Ok(self.keymap)
    }

    fn modifier_keycodes(&mut self) -> Result<Vec<u8>> {
        Ok(self.modifier_keycodes.clone())
    }

    fn poll_fault(&mut self) -> Result<Option<HostFault>> {
        Ok(self.faults.pop_front())
    }
}

/// Позволяет отдать хост сессии по ссылке и проверить его после `teardown`
impl InputHost for &mut FakeHost {
    fn lookup_atom(&mut self, name: &str) -> Result<Option<Atom>> {
        (**self).lookup_atom(name)
    }

    fn list_input_devices(&mut self) -> Result<Vec<DeviceInfo>> {
        (**self).list_input_devices()
    }

    fn open_device(&mut self, id: DeviceId) -> Result<()> {
        (**self).open_device(id)
    }

    fn close_device(&mut self, id: DeviceId) -> Result<()> {
        (**self).close_device(id)
    }

    fn list_device_properties(&mut self, id: DeviceId) -> Result<Vec<Atom>> {
        (**self).list_device_properties(id)
    }

    fn get_device_property(&mut self, id: DeviceId, property: Atom) -> Result<Option<u8>> {
        (**self).get_device_property(id, property)
    }

    fn set_device_property(&mut self, id: DeviceId, property: Atom, value: u8) -> Result<()> {
        (**self).set_device_property(id, property, value)
    }

    fn query_keymap(&mut self) -> Result<KeyStateSnapshot> {
        (**self).query_keymap()
    }

    fn modifier_keycodes(&mut self) -> Result<Vec<u8>> {
        (**self).modifier_keycodes()
    }

    fn poll_fault(&mut self) -> Result<Option<HostFault>> {
        (**self).poll_fault()
    }
}
