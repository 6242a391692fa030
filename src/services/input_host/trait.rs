use crate::error::Result;
use crate::events::{Atom, DeviceId, DeviceInfo, HostFault, KeyStateSnapshot};

/// Access to the host input subsystem (X server + XInput device properties).
///
/// All calls are synchronous and must come from a single owner: the
/// underlying protocol is not reentrant.
pub trait InputHost {
    /// Resolve an atom by name without creating it. `None` if it does not exist.
    fn lookup_atom(&mut self, name: &str) -> Result<Option<Atom>>;

    /// Enumerate all input devices visible to the session, in server order.
    fn list_input_devices(&mut self) -> Result<Vec<DeviceInfo>>;

    fn open_device(&mut self, id: DeviceId) -> Result<()>;

    fn close_device(&mut self, id: DeviceId) -> Result<()>;

    fn list_device_properties(&mut self, id: DeviceId) -> Result<Vec<Atom>>;

    /// Read the first 8-bit item of an integer property. `None` if the device
    /// does not report the property.
    fn get_device_property(&mut self, id: DeviceId, property: Atom) -> Result<Option<u8>>;

    fn set_device_property(&mut self, id: DeviceId, property: Atom, value: u8) -> Result<()>;

    /// Global keyboard state, one bit per keycode.
    fn query_keymap(&mut self) -> Result<KeyStateSnapshot>;

    /// Every keycode bound to any modifier group.
    fn modifier_keycodes(&mut self) -> Result<Vec<u8>>;

    /// Take the next asynchronous error reported by the host, if any.
    fn poll_fault(&mut self) -> Result<Option<HostFault>>;
}
