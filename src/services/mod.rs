pub mod activity_monitor;
pub mod device_controller;
pub mod idle_timer;
pub mod input_host;
pub mod session;

pub use activity_monitor::{ActivityMonitor, ActivitySettings};
pub use device_controller::{DeviceController, PropertySpec};
pub use idle_timer::IdleTimer;
pub use input_host::{DryRunHost, InputHost, X11Host};
pub use session::Session;
