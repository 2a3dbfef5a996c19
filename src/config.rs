use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

const QUALIFIER: &str = "net.roblillack";
const ORGANIZATION: &str = "Piki";
const APPLICATION: &str = "piki-link";
const CONFIG_FILE_NAME: &str = "config.toml";

/// User-visible strings of the link popover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dictionary {
    pub search_or_paste_link: String,
    pub find_or_create_doc: String,
    pub create_new_doc: String,
    pub open_link: String,
    pub remove_link: String,
    pub create_link_error: String,
}

impl Default for Dictionary {
    fn default() -> Self {
        Dictionary {
            search_or_paste_link: "Search or paste a link…".to_string(),
            find_or_create_doc: "Find or create a doc…".to_string(),
            create_new_doc: "Create a new doc".to_string(),
            open_link: "Open link".to_string(),
            remove_link: "Remove link".to_string(),
            create_link_error: "Sorry, an error occurred creating the link".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Enable debug logging
    pub debug: bool,
    pub dictionary: Dictionary,
}

#[derive(Debug)]
pub enum ConfigError {
    Read(PathBuf, io::Error),
    Parse(PathBuf, toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(path, err) => {
                write!(f, "failed to read config file {}: {err}", path.display())
            }
            ConfigError::Parse(path, err) => {
                write!(f, "failed to parse config file {}: {err}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Load the config file; a missing file gives the defaults
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Config::default()),
        Err(err) => return Err(ConfigError::Read(path.to_path_buf(), err)),
    };
    toml::from_str::<Config>(&contents).map_err(|err| ConfigError::Parse(path.to_path_buf(), err))
}

pub fn save_config(path: &Path, config: &Config) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let toml = toml::to_string_pretty(config)
        .map_err(|err| io::Error::other(format!("toml serialization error: {err}")))?;

    fs::write(path, toml)
}
