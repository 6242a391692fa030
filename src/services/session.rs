use crate::error::{DispadError, Result};
use crate::events::HostFault;
use crate::services::{
    ActivityMonitor, ActivitySettings, DeviceController, IdleTimer, InputHost, PropertySpec,
};
use std::future::Future;
use std::pin::Pin;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Контекст работающего демона: соединение с хостом, контроллер устройств,
/// детектор активности и таймер простоя. Всё живёт в одном потоке.
pub struct Session<H: InputHost> {
    host: H,
    controller: DeviceController,
    monitor: ActivityMonitor,
    idle: IdleTimer,
}

impl<H: InputHost> Session<H> {
    pub fn new(mut host: H, spec: PropertySpec, settings: ActivitySettings) -> Result<Self> {
        let controller = DeviceController::new(&mut host, spec)?;
        debug!("DeviceController инициализирован");

        let monitor = ActivityMonitor::new(&mut host, settings)?;
        debug!("ActivityMonitor инициализирован");

        Ok(Self {
            host,
            controller,
            monitor,
            idle: IdleTimer::new(settings.idle_threshold),
        })
    }

    #[cfg(test)]
    pub fn controller(&self) -> &DeviceController {
        &self.controller
    }

    /// Основной цикл опроса. Возвращает `Ok(())`, когда сработал `shutdown`,
    /// и ошибку при неустранимом сбое хоста. Очистку выполняет [`Session::teardown`].
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        debug!("Поиск тачпадов");
        if !self.discover(shutdown.as_mut()).await? {
            return Ok(());
        }

        info!("Слушатель клавиатуры запущен");
        loop {
            if !self.recover_from_faults(shutdown.as_mut()).await? {
                return Ok(());
            }

            self.tick(Instant::now())?;

            tokio::select! {
                _ = tokio::time::sleep(self.monitor.poll_interval()) => {}
                _ = &mut shutdown => {
                    info!("Получен сигнал завершения");
                    return Ok(());
                }
            }
        }
    }

    /// Один цикл опроса: активность -> решение -> переключение устройств.
    /// Возвращает принятое решение (`true` - устройства включены).
    pub fn tick(&mut self, now: Instant) -> Result<bool> {
        let active = self.monitor.sample_activity(&mut self.host)?;
        let enable = self.idle.update(active, now);
        self.controller.toggle(&mut self.host, enable);
        Ok(enable)
    }

    /// `false`, если поиск прерван сигналом завершения
    async fn discover<F>(&mut self, shutdown: Pin<&mut F>) -> Result<bool>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.controller.discover_devices(&mut self.host) => {
                result?;
                self.discard_stale_faults()?;
                Ok(true)
            }
            _ = shutdown => {
                info!("Получен сигнал завершения во время поиска устройств");
                Ok(false)
            }
        }
    }

    /// BadDevice, полученные во время поиска, относятся к пропущенным или
    /// уже сброшенным устройствам. Фатальные ошибки не теряются.
    fn discard_stale_faults(&mut self) -> Result<()> {
        while let Some(fault) = self.host.poll_fault()? {
            match fault {
                HostFault::DeviceRemoved(detail) => {
                    debug!("Устаревшая ошибка после поиска устройств: {}", detail);
                }
                HostFault::Fatal(detail) => {
                    error!("{}", detail);
                    return Err(DispadError::Protocol(detail));
                }
            }
        }
        Ok(())
    }

    /// Разобрать асинхронные ошибки хоста, накопившиеся с прошлого цикла
    async fn recover_from_faults<F>(&mut self, shutdown: Pin<&mut F>) -> Result<bool>
    where
        F: Future<Output = ()>,
    {
        let mut device_removed = false;

        while let Some(fault) = self.host.poll_fault()? {
            match fault {
                HostFault::DeviceRemoved(detail) => {
                    warn!("{}", detail);
                    device_removed = true;
                }
                HostFault::Fatal(detail) => {
                    error!("{}", detail);
                    return Err(DispadError::Protocol(detail));
                }
            }
        }

        if !device_removed {
            return Ok(true);
        }

        warn!("Устройство пропало, повторный поиск тачпадов");
        self.controller.invalidate();
        self.discover(shutdown).await
    }

    /// Восстановить и закрыть устройства, затем закрыть соединение с хостом
    pub fn teardown(self) {
        let Session {
            mut host,
            mut controller,
            ..
        } = self;

        info!("Восстановление состояния устройств");
        controller.release(&mut host);
        drop(host);
    }
}
