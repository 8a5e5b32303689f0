#[cfg(test)]
use std::path::PathBuf;

#[cfg(test)]
use crate::app::state::App;
#[cfg(test)]
use crate::config::{load_config, Config};

/// Config built from an empty override file, so the user's real
/// config files never leak into tests.
#[cfg(test)]
pub fn default_config() -> Config {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "").expect("write config");
    load_config(None, Some(&path))
}

#[cfg(test)]
pub fn config_from(contents: &str) -> Config {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).expect("write config");
    load_config(None, Some(&path))
}

#[cfg(test)]
pub fn test_app() -> App {
    App::new(default_config(), PathBuf::from("."), 80, 24)
}

#[cfg(test)]
pub fn test_app_with(config: Config) -> App {
    App::new(config, PathBuf::from("."), 80, 24)
}
