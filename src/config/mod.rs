pub mod loader;

pub use loader::ConfigLoader;

use crate::container::{DEFAULT_MAX_DEPTH, DEFAULT_PLAN_CACHE_CAPACITY};
use crate::errors::ConfigError;
use crate::scanner::ServiceDefinition;
use serde::{Deserialize, Serialize};

/// 容器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 单次解析的最大嵌套深度
    pub max_depth: usize,
    /// 参数方案缓存容量
    pub argument_cache_capacity: usize,
    /// 声明为单例的标识符（`bind` 时生效）
    pub singletons: Vec<String>,
    /// 声明为作用域的标识符
    pub scoped: Vec<String>,
    /// 延迟构造的标识符
    pub lazy: Vec<String>,
    /// 排除出延迟构造的标识符，优先于 `lazy`
    pub eager: Vec<String>,
    pub services: Vec<ServiceDefinition>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            argument_cache_capacity: DEFAULT_PLAN_CACHE_CAPACITY,
            singletons: Vec::new(),
            scoped: Vec::new(),
            lazy: Vec::new(),
            eager: Vec::new(),
            services: Vec::new(),
        }
    }
}

impl ContainerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_depth".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.argument_cache_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "argument_cache_capacity".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(id) = self.singletons.iter().find(|id| self.scoped.contains(id)) {
            return Err(ConfigError::InvalidValue {
                key: id.clone(),
                reason: "declared both singleton and scoped".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_container_defaults() {
        let config = ContainerConfig::default();
        assert_eq!(config.max_depth, 50);
        assert_eq!(config.argument_cache_capacity, DEFAULT_PLAN_CACHE_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_conflicting_lifetimes() {
        let config = ContainerConfig {
            singletons: vec!["cache".into()],
            scoped: vec!["cache".into()],
            ..ContainerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cache"));

        let config = ContainerConfig {
            max_depth: 0,
            ..ContainerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "max_depth"
        ));
    }
}
