pub mod device;
pub mod keymap;

pub use device::{Atom, DeviceId, DeviceInfo, HostFault};
pub use keymap::{key_name, KeyBits, KeyStateSnapshot, ModifierMask};
