use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispadError {
    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Системная ошибка: {0}")]
    Os(#[from] nix::Error),

    #[error("Не удалось подключиться к X-серверу: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),

    #[error("Соединение с X-сервером потеряно: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    #[error("Ошибка ответа X-сервера: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),

    #[error("Свойство не найдено: {0}")]
    PropertyNotFound(String),

    #[error("Ошибка протокола X11: {0}")]
    Protocol(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),
}

impl DispadError {
    pub fn property_not_found<T>(name: impl Into<String>) -> Result<T> {
        Err(DispadError::PropertyNotFound(name.into()))
    }
}

pub type Result<T> = std::result::Result<T, DispadError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! dispad_error {
    (protocol, $($arg:tt)*) => {
        $crate::error::DispadError::Protocol(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::DispadError::ServiceUnavailable(format!($($arg)*))
    };
}
