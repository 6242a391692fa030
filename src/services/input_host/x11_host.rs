use crate::dispad_error;
use crate::error::{DispadError, Result};
use crate::events::{Atom, DeviceId, DeviceInfo, HostFault, KeyBits, KeyStateSnapshot};
use std::collections::VecDeque;
use tracing::{debug, info};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::errors::ReplyError;
use x11rb::protocol::xinput::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt as _, PropMode};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::x11_utils::X11Error;

use super::r#trait::InputHost;

/// Номер ошибки BadDevice относительно first_error расширения XInput
const XI_BAD_DEVICE: u8 = 0;

/// Хост на основе X11 + XInput 1.x (свойства устройств)
pub struct X11Host {
    conn: RustConnection,
    xi_major_opcode: u8,
    xi_first_error: u8,
    // Ошибки BadDevice, полученные в ответах на запросы: разбираются в начале цикла
    pending: VecDeque<HostFault>,
}

impl X11Host {
    pub fn connect(display_name: Option<&str>) -> Result<Self> {
        let target = display_name.unwrap_or("$DISPLAY");
        info!("Подключение к X-серверу {}", target);

        let (conn, _screen) = x11rb::connect(display_name)?;

        let xi = conn
            .extension_information(xinput::X11_EXTENSION_NAME)?
            .ok_or_else(|| {
                dispad_error!(
                    service_unavailable,
                    "X-сервер не поддерживает {}",
                    xinput::X11_EXTENSION_NAME
                )
            })?;

        let version = conn
            .xinput_get_extension_version(xinput::X11_EXTENSION_NAME.as_bytes())?
            .reply()?;
        debug!(
            "XInput {}.{} (opcode {}, first_error {})",
            version.server_major, version.server_minor, xi.major_opcode, xi.first_error
        );

        Ok(Self {
            conn,
            xi_major_opcode: xi.major_opcode,
            xi_first_error: xi.first_error,
            pending: VecDeque::new(),
        })
    }

    fn classify(&self, error: &X11Error) -> HostFault {
        classify(error, self.xi_major_opcode, self.xi_first_error)
    }

    /// Ошибка в ответе возвращается вызывающему; BadDevice дополнительно
    /// ставится в очередь, чтобы цикл запустил повторный поиск устройств.
    fn check<T>(&mut self, result: std::result::Result<T, ReplyError>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(ReplyError::X11Error(error)) => {
                let fault = self.classify(&error);
                if matches!(fault, HostFault::DeviceRemoved(_)) {
                    self.pending.push_back(fault);
                }
                Err(DispadError::Protocol(describe(&error)))
            }
            Err(ReplyError::ConnectionError(error)) => Err(error.into()),
        }
    }
}

/// BadDevice от XInput означает, что устройство отключено; всё остальное фатально
fn classify(error: &X11Error, xi_major_opcode: u8, xi_first_error: u8) -> HostFault {
    let detail = describe(error);
    if error.major_opcode == xi_major_opcode
        && error.error_code == xi_first_error.wrapping_add(XI_BAD_DEVICE)
    {
        HostFault::DeviceRemoved(detail)
    } else {
        HostFault::Fatal(detail)
    }
}

fn describe(error: &X11Error) -> String {
    format!(
        "{:?} в запросе {} (значение {})",
        error.error_kind,
        error.request_name.unwrap_or("<неизвестно>"),
        error.bad_value
    )
}

impl InputHost for X11Host {
    fn lookup_atom(&mut self, name: &str) -> Result<Option<Atom>> {
        let reply = self.conn.intern_atom(true, name.as_bytes())?.reply();
        let atom = self.check(reply)?.atom;
        Ok((atom != x11rb::NONE).then_some(atom))
    }

    fn list_input_devices(&mut self) -> Result<Vec<DeviceInfo>> {
        let reply = self.conn.xinput_list_input_devices()?.reply();
        let reply = self.check(reply)?;

        Ok(reply
            .devices
            .iter()
            .zip(reply.names.iter())
            .map(|(device, name)| {
                DeviceInfo::new(
                    device.device_id,
                    String::from_utf8_lossy(&name.name),
                    device.device_type,
                )
            })
            .collect())
    }

    fn open_device(&mut self, id: DeviceId) -> Result<()> {
        let reply = self.conn.xinput_open_device(id)?.reply();
        self.check(reply).map(|_| ())
    }

    fn close_device(&mut self, id: DeviceId) -> Result<()> {
        self.conn.xinput_close_device(id)?;
        self.conn.flush()?;
        Ok(())
    }

    fn list_device_properties(&mut self, id: DeviceId) -> Result<Vec<Atom>> {
        let reply = self.conn.xinput_list_device_properties(id)?.reply();
        Ok(self.check(reply)?.atoms)
    }

    fn get_device_property(&mut self, id: DeviceId, property: Atom) -> Result<Option<u8>> {
        let reply = self
            .conn
            .xinput_get_device_property(property, u32::from(AtomEnum::INTEGER), 0, 1, id, false)?
            .reply();
        let reply = self.check(reply)?;

        if reply.type_ == x11rb::NONE {
            return Ok(None);
        }

        let value = match reply.items {
            xinput::GetDevicePropertyItems::Data8(data) => data.first().copied(),
            xinput::GetDevicePropertyItems::Data16(data) => data.first().map(|v| *v as u8),
            xinput::GetDevicePropertyItems::Data32(data) => data.first().map(|v| *v as u8),
            _ => None,
        };
        Ok(value)
    }

    fn set_device_property(&mut self, id: DeviceId, property: Atom, value: u8) -> Result<()> {
        // Запрос без проверки: ошибка придёт асинхронно через poll_fault
        let items = xinput::ChangeDevicePropertyAux::Data8(vec![value]);
        self.conn.xinput_change_device_property(
            property,
            u32::from(AtomEnum::INTEGER),
            id,
            PropMode::REPLACE,
            1,
            &items,
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn query_keymap(&mut self) -> Result<KeyStateSnapshot> {
        let reply = self.conn.query_keymap()?.reply();
        Ok(KeyBits::from_bytes(self.check(reply)?.keys))
    }

    fn modifier_keycodes(&mut self) -> Result<Vec<u8>> {
        let reply = self.conn.get_modifier_mapping()?.reply();
        Ok(self.check(reply)?.keycodes)
    }

    fn poll_fault(&mut self) -> Result<Option<HostFault>> {
        if let Some(fault) = self.pending.pop_front() {
            return Ok(Some(fault));
        }

        while let Some(event) = self.conn.poll_for_event()? {
            if let Event::Error(error) = event {
                return Ok(Some(self.classify(&error)));
            }
        }

        Ok(None)
    }
}

impl Drop for X11Host {
    fn drop(&mut self) {
        debug!("Закрытие соединения с X-сервером");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x11rb::protocol::ErrorKind;

    const XI_MAJOR: u8 = 131;
    const XI_FIRST_ERROR: u8 = 129;

    fn x11_error(major_opcode: u8, error_code: u8) -> X11Error {
        X11Error {
            error_kind: ErrorKind::Unknown(error_code),
            error_code,
            sequence: 42,
            bad_value: 11,
            minor_opcode: 3,
            major_opcode,
            extension_name: None,
            request_name: Some("OpenDevice"),
        }
    }

    #[test]
    fn test_xinput_bad_device_means_removed() {
        let fault = classify(&x11_error(XI_MAJOR, XI_FIRST_ERROR), XI_MAJOR, XI_FIRST_ERROR);
        assert!(matches!(fault, HostFault::DeviceRemoved(detail) if detail.contains("OpenDevice")));
    }

    #[test]
    fn test_other_xinput_error_is_fatal() {
        // first_error + 2 = BadMode
        let fault = classify(&x11_error(XI_MAJOR, XI_FIRST_ERROR + 2), XI_MAJOR, XI_FIRST_ERROR);
        assert!(matches!(fault, HostFault::Fatal(_)));
    }

    #[test]
    fn test_core_error_with_same_code_is_fatal() {
        // Тот же код ошибки, но от запроса основного протокола (ChangeProperty = 18)
        let fault = classify(&x11_error(18, XI_FIRST_ERROR), XI_MAJOR, XI_FIRST_ERROR);
        assert!(matches!(fault, HostFault::Fatal(_)));
    }
}
