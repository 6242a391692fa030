mod dry_run_host;
#[cfg(test)]
pub mod fake_host;
mod r#trait;
mod x11_host;

pub use self::dry_run_host::DryRunHost;
pub use self::r#trait::InputHost;
pub use self::x11_host::X11Host;
