use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::services::{ActivitySettings, PropertySpec};

/// Имя файла конфигурации в домашнем каталоге
pub const DEFAULT_CONFIG_FILE: &str = ".dispad";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Имя свойства XInput, которым включается/отключается тачпад
    pub property: String,
    /// Значение свойства для включения
    pub enable: u8,
    /// Значение свойства для отключения
    pub disable: u8,
    /// Отключать тачпад и при нажатии модификаторов
    pub modifiers: bool,
    /// Пауза между опросами клавиатуры, мс
    pub poll: u64,
    /// Сколько держать тачпад отключённым после нажатия, мс
    pub delay: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pidfile: Option<PathBuf>,
}

/// Параметры командной строки, перекрывающие файл конфигурации
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pidfile: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            property: "Trackpad Disable Input".to_string(),
            enable: 0,
            disable: 1,
            modifiers: false,
            poll: 100,
            delay: 1000,
            pidfile: None,
        }
    }
}

impl Config {
    /// Загрузить конфигурацию: умолчания -> файл -> переменные DISPAD_* -> командная строка.
    ///
    /// Без явного пути используется `~/.dispad`, который создаётся при отсутствии.
    pub fn load(config_path: Option<&Path>, overrides: ConfigOverrides) -> Result<(Self, PathBuf)> {
        let config_path = match config_path {
            Some(path) => {
                anyhow::ensure!(path.exists(), "Файл конфигурации не найден: {:?}", path);
                path.to_path_buf()
            }
            None => {
                let path = Self::default_path()?;
                if !path.exists() {
                    Self::write_default(&path).with_context(|| {
                        format!("Не удалось создать файл конфигурации по умолчанию {:?}", path)
                    })?;
                }
                path
            }
        };

        let config = Self::from_figment(Self::figment(&config_path, overrides))
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        Ok((config, config_path))
    }

    fn figment(config_path: &Path, overrides: ConfigOverrides) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("DISPAD_"))
            .merge(Serialized::defaults(overrides))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Не удалось определить домашний каталог")?;
        Ok(home.join(DEFAULT_CONFIG_FILE))
    }

    /// Записать файл конфигурации с настройками по умолчанию и комментариями
    pub fn write_default(path: &Path) -> Result<()> {
        let defaults = Config::default();
        let contents = format!(
            "# default dispad config file\n\n\
             # name of the property used to enable/disable the trackpad\n\
             property = \"{}\"\n\n\
             # the value used to enable the trackpad\n\
             enable = {}\n\n\
             # the value used to disable the trackpad\n\
             disable = {}\n\n\
             # whether or not modifier keys disable the trackpad\n\
             modifiers = {}\n\n\
             # how long (in ms) to sleep between keyboard polls\n\
             poll = {}\n\n\
             # how long (in ms) to disable the trackpad after a keystroke\n\
             delay = {}\n",
            defaults.property,
            defaults.enable,
            defaults.disable,
            defaults.modifiers,
            defaults.poll,
            defaults.delay,
        );
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.property.is_empty() {
            anyhow::bail!("Имя свойства не может быть пустым");
        }

        if self.poll == 0 {
            anyhow::bail!("poll должно быть больше 0");
        }

        if self.delay == 0 {
            anyhow::bail!("delay должно быть больше 0");
        }

        Ok(())
    }

    pub fn property_spec(&self) -> PropertySpec {
        PropertySpec::new(self.property.clone(), self.enable, self.disable)
    }

    pub fn activity_settings(&self) -> ActivitySettings {
        ActivitySettings::from_millis(self.modifiers, self.delay, self.poll)
    }
}
