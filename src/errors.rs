use thiserror::Error;

/// 容器错误（基础错误类型）
///
/// 所有变体都从 `get` / `make_with` 同步返回，容器内部不会吞掉任何错误。
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 标识符没有绑定，且不是可实例化的具体类
    #[error("No binding or instantiable class found for '{identifier}'{}", suggestion_suffix(.suggestion))]
    NotFound {
        identifier: String,
        suggestion: Option<String>,
    },
    #[error(transparent)]
    BindingResolution(#[from] BindingResolutionError),
    /// 实例存在，但不是调用方期望的类型
    #[error("Type cast failed for '{identifier}': expected '{expected}'")]
    TypeMismatch {
        identifier: String,
        expected: &'static str,
    },
    /// 工厂或构造函数自身返回的错误
    #[error("Failed to create '{identifier}': {source}")]
    CreationFailed {
        identifier: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Scoped binding '{identifier}' resolved outside of any scope")]
    ScopeRequired { identifier: String },
    #[error("Scope {scope_id} is not active")]
    ScopeNotActive { scope_id: uuid::Uuid },
    #[error("Container was dropped before '{identifier}' could be resolved")]
    Disposed { identifier: String },
}

/// 具体构造过程失败，永远不会被静默重试
#[derive(Debug, Error)]
pub enum BindingResolutionError {
    #[error("Unresolvable dependency resolving [${parameter}] in class {class}")]
    UnresolvableParameter { class: String, parameter: String },
    #[error("Target [{class}] is not instantiable")]
    NotInstantiable { class: String },
    #[error(
        "Maximum resolution depth of {max_depth} exceeded while resolving '{identifier}', probable circular dependency: {}",
        .chain.join(" -> ")
    )]
    DepthExceeded {
        identifier: String,
        max_depth: usize,
        chain: Vec<String>,
    },
    #[error("Circular dependency detected: {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean '{}'?", s),
        None => String::new(),
    }
}

impl ContainerError {
    pub fn not_found(identifier: impl Into<String>) -> Self {
        ContainerError::NotFound {
            identifier: identifier.into(),
            suggestion: None,
        }
    }

    /// 包装工厂或构造函数返回的任意错误
    pub fn creation_failed<E>(identifier: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        ContainerError::CreationFailed {
            identifier: identifier.into(),
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ContainerError::NotFound { .. })
    }

    pub fn is_binding_resolution(&self) -> bool {
        matches!(self, ContainerError::BindingResolution(_))
    }
}
