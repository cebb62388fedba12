//! 绑定注册表
//!
//! 标识符到构造策略与生命周期的映射。重复注册直接覆盖，任何时刻每个标识符
//! 最多只有一个有效绑定。
//!
//! 注册预期发生在启动阶段。注册表本身是并发安全的，但在解析进行中修改绑定，
//! 解析看到的是旧绑定还是新绑定由调用方自行负责。

use super::descriptor::Parameters;
use super::frame::Resolution;
use super::lifetime::ServiceLifetime;
use super::Instance;
use crate::errors::ContainerError;
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 工厂对象，以（解析上下文，显式参数）调用
pub trait Factory: Send + Sync {
    fn create(&self, resolution: &mut Resolution<'_>, parameters: &Parameters) -> Result<Instance, ContainerError>;

    /// 用于日志与错误信息
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// 函数式工厂
pub struct FnFactory<F, T> {
    factory_fn: F,
    _phantom: PhantomData<fn() -> T>,
}

impl<F, T> FnFactory<F, T>
where
    F: Fn(&mut Resolution<'_>, &Parameters) -> Result<T, ContainerError> + Send + Sync + 'static,
    T: Any + Send + Sync,
{
    pub fn new(factory_fn: F) -> Self {
        Self {
            factory_fn,
            _phantom: PhantomData,
        }
    }
}

impl<F, T> Factory for FnFactory<F, T>
where
    F: Fn(&mut Resolution<'_>, &Parameters) -> Result<T, ContainerError> + Send + Sync + 'static,
    T: Any + Send + Sync,
{
    fn create(&self, resolution: &mut Resolution<'_>, parameters: &Parameters) -> Result<Instance, ContainerError> {
        let service = (self.factory_fn)(resolution, parameters)?;
        Ok(Arc::new(service))
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// 构造策略
#[derive(Clone)]
pub enum Strategy {
    /// 预先构造好的值，原样返回
    Value(Instance),
    Factory(Arc<dyn Factory>),
    /// 按类名解析；与标识符相同时直接自动装配
    Class(String),
}

impl Strategy {
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Strategy::Value(Arc::new(value))
    }

    pub fn class(name: impl Into<String>) -> Self {
        Strategy::Class(name.into())
    }

    pub fn class_of<T: ?Sized + 'static>() -> Self {
        Strategy::Class(std::any::type_name::<T>().to_string())
    }

    pub fn factory<F, T>(factory_fn: F) -> Self
    where
        F: Fn(&mut Resolution<'_>, &Parameters) -> Result<T, ContainerError> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        Strategy::Factory(Arc::new(FnFactory::new(factory_fn)))
    }

    pub fn from_factory(factory: impl Factory + 'static) -> Self {
        Strategy::Factory(Arc::new(factory))
    }
}

impl From<&str> for Strategy {
    fn from(class: &str) -> Self {
        Strategy::Class(class.to_string())
    }
}

impl From<String> for Strategy {
    fn from(class: String) -> Self {
        Strategy::Class(class)
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Value(_) => write!(f, "Value(..)"),
            Strategy::Factory(factory) => write!(f, "Factory({})", factory.type_name()),
            Strategy::Class(class) => write!(f, "Class({})", class),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub identifier: String,
    pub strategy: Strategy,
    pub lifetime: ServiceLifetime,
    /// 解析时返回延迟代理而不是真实实例
    pub lazy: bool,
}

#[derive(Default)]
pub(crate) struct BindingRegistry {
    bindings: DashMap<String, Binding>,
}

impl BindingRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 返回被覆盖的旧绑定
    pub(crate) fn register(&self, binding: Binding) -> Option<Binding> {
        self.bindings.insert(binding.identifier.clone(), binding)
    }

    pub(crate) fn lookup(&self, identifier: &str) -> Option<Binding> {
        self.bindings.get(identifier).map(|binding| binding.value().clone())
    }

    pub(crate) fn contains(&self, identifier: &str) -> bool {
        self.bindings.contains_key(identifier)
    }

    pub(crate) fn remove(&self, identifier: &str) -> Option<Binding> {
        self.bindings.remove(identifier).map(|(_, binding)| binding)
    }

    /// 返回标记是否生效（标识符已绑定）
    pub(crate) fn mark_lazy(&self, identifier: &str, lazy: bool) -> bool {
        match self.bindings.get_mut(identifier) {
            Some(mut binding) => {
                binding.lazy = lazy;
                true
            }
            None => false,
        }
    }

    pub(crate) fn identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = self.bindings.iter().map(|entry| entry.key().clone()).collect();
        identifiers.sort();
        identifiers
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }
}
