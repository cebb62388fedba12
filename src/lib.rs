//! 控制反转运行时
//!
//! 按标识符注册绑定，按类描述自动装配构造参数，管理瞬态 / 单例 / 作用域
//! 三种生命周期，并支持首次访问时才构造的延迟代理。

pub mod config;
pub mod container;
pub mod errors;
pub mod logging;
pub mod scanner;

// Re-export commonly used items for convenience
pub use config::{ConfigLoader, ContainerConfig};
pub use container::{
    Arguments, ClassDescriptor, Container, ContainerBuilder, ContainerStats, Injectable, Instance, Lazy,
    ParameterDescriptor, Parameters, Resolution, Scope, ServiceLifetime, Strategy,
};
pub use errors::{BindingResolutionError, ConfigError, ContainerError};
pub use scanner::ServiceDefinition;
