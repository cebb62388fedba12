use super::ContainerConfig;
use crate::errors::ConfigError;
use std::{collections::HashMap, env, fs, path::Path};

const ENV_MAX_DEPTH: &str = "IOC_MAX_DEPTH";
const ENV_ARGUMENT_CACHE_CAPACITY: &str = "IOC_ARGUMENT_CACHE_CAPACITY";

/// Configuration loader: TOML file or string, then environment overrides
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Overrides used instead of the process environment (for testing)
    env_override: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { env_override: None }
    }

    /// Use the given variables instead of reading the process environment
    pub fn with_env(vars: HashMap<String, String>) -> Self {
        Self {
            env_override: Some(vars),
        }
    }

    /// Load configuration from a TOML file; a missing file yields defaults
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ContainerConfig, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("配置文件 {:?} 不存在，使用默认配置", path);
            return self.finish(ContainerConfig::default());
        }

        let source = path.to_string_lossy().to_string();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileRead(source.clone(), e))?;
        let config = self.parse(&source, &content)?;
        tracing::debug!("已加载容器配置: {:?}", path);
        self.finish(config)
    }

    /// Load configuration from TOML text
    pub fn load_str(&self, content: &str) -> Result<ContainerConfig, ConfigError> {
        let config = self.parse("<string>", content)?;
        self.finish(config)
    }

    fn parse(&self, source: &str, content: &str) -> Result<ContainerConfig, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlParse(source.to_string(), e))
    }

    fn finish(&self, mut config: ContainerConfig) -> Result<ContainerConfig, ConfigError> {
        let env_map = self.collect_env_vars();
        if let Some(value) = env_map.get(ENV_MAX_DEPTH) {
            config.max_depth = parse_usize(ENV_MAX_DEPTH, value)?;
        }
        if let Some(value) = env_map.get(ENV_ARGUMENT_CACHE_CAPACITY) {
            config.argument_cache_capacity = parse_usize(ENV_ARGUMENT_CACHE_CAPACITY, value)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Collect relevant environment variables
    fn collect_env_vars(&self) -> HashMap<String, String> {
        if let Some(vars) = &self.env_override {
            return vars.clone();
        }

        let mut env_map = HashMap::new();
        for key in [ENV_MAX_DEPTH, ENV_ARGUMENT_CACHE_CAPACITY] {
            if let Ok(value) = env::var(key) {
                env_map.insert(key.to_string(), value);
            }
        }
        env_map
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: format!("expected a positive integer, got '{}'", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ServiceLifetime;
    use tempfile::TempDir;

    fn loader() -> ConfigLoader {
        ConfigLoader::with_env(HashMap::new())
    }

    #[test]
    fn test_load_str_with_services() {
        let config = loader()
            .load_str(
                r#"
                max_depth = 12
                singletons = ["App\\Clock"]
                lazy = ["App\\Mailer", "App\\Logger"]
                eager = ["App\\Logger"]

                [[services]]
                identifier = "App\\Mailer"
                lifetime = "singleton"
                alias = "mailer"
                "#,
            )
            .unwrap();

        assert_eq!(config.max_depth, 12);
        assert_eq!(config.argument_cache_capacity, 256);
        assert_eq!(config.singletons, vec!["App\\Clock"]);
        assert_eq!(config.eager, vec!["App\\Logger"]);
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.services[0].lifetime, Some(ServiceLifetime::Singleton));
        assert_eq!(config.services[0].alias.as_deref(), Some("mailer"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = loader().load_file(temp_dir.path().join("container.toml")).unwrap();
        assert_eq!(config, ContainerConfig::default());
    }

    #[test]
    fn test_load_file_and_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("container.toml");
        fs::write(&path, "argument_cache_capacity = 8\n").unwrap();
        assert_eq!(loader().load_file(&path).unwrap().argument_cache_capacity, 8);

        fs::write(&path, "max_depth = \"deep\"\n").unwrap();
        assert!(matches!(loader().load_file(&path), Err(ConfigError::TomlParse(..))));
    }

    #[test]
    fn test_env_overrides() {
        let vars = HashMap::from([
            (ENV_MAX_DEPTH.to_string(), "7".to_string()),
            (ENV_ARGUMENT_CACHE_CAPACITY.to_string(), " 16 ".to_string()),
        ]);
        let config = ConfigLoader::with_env(vars).load_str("max_depth = 30").unwrap();
        assert_eq!(config.max_depth, 7);
        assert_eq!(config.argument_cache_capacity, 16);

        let vars = HashMap::from([(ENV_MAX_DEPTH.to_string(), "many".to_string())]);
        let err = ConfigLoader::with_env(vars).load_str("").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_MAX_DEPTH));
    }
}
