use std::env;
use std::path::PathBuf;

pub struct Config {
    pub name: String,
    pub logger_level: String,
    pub logger_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: String::from("lavash"),
            logger_level: String::from("off"),
            logger_dir: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(level) = lookup("LAVASH_LOG") {
            config.logger_level = level;
        }

        if let Some(dir) = lookup("LAVASH_LOG_DIR").filter(|dir| !dir.is_empty()) {
            config.logger_dir = Some(PathBuf::from(dir));
        }

        config
    }

    /// Prefix of every diagnostic line, e.g. `lavash: line 1: foo: command not found`.
    pub fn diagnostic_prefix(&self) -> String {
        format!("{}: line 1", self.name)
    }
}
