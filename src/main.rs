use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::{Config, ConfigOverrides};
use services::{DryRunHost, InputHost, Session, X11Host};
use utils::{PidFile, ShutdownSignals};

#[derive(Parser, Debug)]
#[command(name = "dispad", version)]
#[command(about = "Демон, отключающий тачпад во время набора текста")]
struct Args {
    /// Файл конфигурации (по умолчанию ~/.dispad)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Имя свойства, которым включается/отключается тачпад
    #[arg(short, long)]
    property: Option<String>,

    /// Значение свойства для включения (0-255)
    #[arg(short, long)]
    enable: Option<u8>,

    /// Значение свойства для отключения (0-255)
    #[arg(short, long)]
    disable: Option<u8>,

    /// Отключать тачпад и при нажатии модификаторов
    #[arg(short, long)]
    modifiers: bool,

    /// Пауза между опросами клавиатуры, мс
    #[arg(short = 's', long)]
    poll: Option<u64>,

    /// Сколько держать тачпад отключённым после нажатия, мс
    #[arg(short = 'i', long)]
    delay: Option<u64>,

    /// Записать PID процесса в файл
    #[arg(long)]
    pidfile: Option<PathBuf>,

    /// Не уходить в фон
    #[arg(short = 'F', long)]
    foreground: bool,

    /// Отладочный вывод (имеет смысл вместе с -F)
    #[arg(short = 'D', long)]
    debug: bool,

    /// X-дисплей (по умолчанию $DISPLAY)
    #[arg(long)]
    display: Option<String>,

    /// Режим сухого запуска (без изменения свойств устройств)
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            property: self.property.clone(),
            enable: self.enable,
            disable: self.disable,
            modifiers: self.modifiers.then_some(true),
            poll: self.poll,
            delay: self.delay,
            pidfile: self.pidfile.clone(),
        }
    }

    fn log_level(&self) -> &'static str {
        match (self.foreground, self.debug) {
            (false, _) => "off",
            (true, true) => "debug",
            (true, false) => "info",
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_path) = Config::load(args.config.as_deref(), args.overrides())?;

    if !args.foreground {
        utils::daemon::daemonize().context("Не удалось уйти в фон")?;
    }

    // Инициализация системы логирования
    init_tracing(args.log_level())?;

    info!("Запуск dispad v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {:?}", config_path);
    log_config(&config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Не удалось создать runtime")?;

    runtime.block_on(run(&args, &config))
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    utils::session_check::check_session(args.display.as_deref())?;

    let host = X11Host::connect(args.display.as_deref())?;

    if args.dry_run {
        warn!("Режим сухого запуска - свойства устройств не изменяются");
        run_session(DryRunHost::new(host), config).await
    } else {
        run_session(host, config).await
    }
}

async fn run_session<H: InputHost>(host: H, config: &Config) -> Result<()> {
    let signals = ShutdownSignals::install().context("Не удалось установить обработчики сигналов")?;

    let mut session = Session::new(host, config.property_spec(), config.activity_settings())
        .context("Не удалось инициализировать dispad")?;
    info!("Все компоненты инициализированы");

    let pidfile = match config.pidfile.as_deref().map(PidFile::create).transpose() {
        Ok(pidfile) => pidfile,
        Err(e) => {
            session.teardown();
            return Err(e).context("Не удалось создать PID-файл");
        }
    };

    let result = session.run(signals.recv()).await;
    if let Err(e) = &result {
        error!("Неустранимая ошибка: {}", e);
    }

    info!("Завершение работы...");

    // Порядок важен: сначала устройства и соединение с X, затем PID-файл
    session.teardown();
    if let Some(pidfile) = pidfile {
        pidfile.remove();
    }

    info!("dispad завершил работу");
    result.map_err(Into::into)
}

fn log_config(config: &Config) {
    info!("Параметры:");
    info!("  property = {}", config.property);
    info!("  enable = {}", config.enable);
    info!("  disable = {}", config.disable);
    info!("  modifiers = {}", config.modifiers);
    info!("  poll = {}", config.poll);
    info!("  delay = {}", config.delay);
    info!(
        "  pidfile = {}",
        config
            .pidfile
            .as_ref()
            .map_or_else(|| "<none>".to_string(), |path| path.display().to_string())
    );
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
