use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub server_url: String,
    pub log_level: String,
    pub blocks_per_load: usize,
    pub data_path: PathBuf,
}

#[derive(Debug, Default)]
pub struct AppConfigOverrides {
    pub server_url: Option<String>,
    pub log_level: Option<String>,
    pub blocks_per_load: Option<usize>,
}

fn default_data_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fotolenta")
}

impl AppConfig {
    pub fn load_from(path: Option<PathBuf>) -> Self {
        let mut builder = config::Config::builder();
        let path = match path {
            Some(p) => p,
            None => default_data_path().join("config"),
        };
        builder = builder.add_source(config::File::from(path).required(false));
        let cfg = builder.build().unwrap_or_default();

        let server_url = cfg
            .get_string("server_url")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let log_level = cfg
            .get_string("log_level")
            .unwrap_or_else(|_| "info".to_string());
        let blocks_per_load = cfg.get_int("blocks_per_load").unwrap_or(4).max(1) as usize;
        let data_path = cfg
            .get_string("data_path")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_path());

        Self {
            server_url,
            log_level,
            blocks_per_load,
            data_path,
        }
    }

    pub fn apply_overrides(mut self, ov: &AppConfigOverrides) -> Self {
        if let Some(url) = &ov.server_url {
            self.server_url = url.clone();
        }
        if let Some(level) = &ov.log_level {
            self.log_level = level.clone();
        }
        if let Some(count) = ov.blocks_per_load {
            self.blocks_per_load = count.max(1);
        }
        self
    }

    pub fn save_to(&self, path: Option<PathBuf>) -> std::io::Result<()> {
        let path = match path {
            Some(p) => p,
            None => default_data_path().join("config"),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = toml::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_yields_defaults() {
        let cfg = AppConfig::load_from(Some(PathBuf::from("/nonexistent/config")));
        assert_eq!(cfg.server_url, "http://localhost:8080");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.blocks_per_load, 4);
    }

    #[test]
    fn saved_config_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        let cfg = AppConfig {
            server_url: "https://photos.example.org".into(),
            log_level: "debug".into(),
            blocks_per_load: 8,
            data_path: dir.path().to_path_buf(),
        };
        cfg.save_to(Some(path.clone())).unwrap();

        let loaded = AppConfig::load_from(Some(path));
        assert_eq!(loaded.server_url, "https://photos.example.org");
        assert_eq!(loaded.log_level, "debug");
        assert_eq!(loaded.blocks_per_load, 8);
    }

    #[test]
    fn overrides_take_precedence() {
        let cfg = AppConfig::load_from(Some(PathBuf::from("/nonexistent/config")))
            .apply_overrides(&AppConfigOverrides {
                server_url: Some("https://other.example.org".into()),
                log_level: None,
                blocks_per_load: Some(0),
            });
        assert_eq!(cfg.server_url, "https://other.example.org");
        assert_eq!(cfg.log_level, "info");
        // zero is not a usable page size
        assert_eq!(cfg.blocks_per_load, 1);
    }
}
