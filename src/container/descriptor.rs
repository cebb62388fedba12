//! 类描述表
//!
//! 运行时反射的替代品：每个可自动装配的类在启动时登记一份
//! [`ClassDescriptor`]，描述构造函数的参数列表（声明顺序）以及
//! 如何用解析好的位置参数构造实例。

use super::lazy::{downcast_instance, Lazy, LazyService};
use super::Instance;
use crate::errors::{BindingResolutionError, ContainerError};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 构造函数：接收按声明顺序排列的参数，返回实例
pub type Constructor = Arc<dyn Fn(&Arguments) -> Result<Instance, ContainerError> + Send + Sync>;

/// 参数声明类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    /// 类或接口类型，按标识符递归解析
    Class(String),
    /// 内置标量类型（int、string 等），不会递归解析
    Builtin(&'static str),
}

/// 构造函数参数描述
#[derive(Clone)]
pub struct ParameterDescriptor {
    name: String,
    declared_type: Option<DeclaredType>,
    nullable: bool,
    default: Option<Instance>,
}

impl ParameterDescriptor {
    /// 类类型参数
    pub fn class(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self::with_type(name, Some(DeclaredType::Class(class.into())))
    }

    /// 以 Rust 类型名作为类标识符的参数
    pub fn of<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::class(name, std::any::type_name::<T>())
    }

    pub fn builtin(name: impl Into<String>, type_name: &'static str) -> Self {
        Self::with_type(name, Some(DeclaredType::Builtin(type_name)))
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self::with_type(name, None)
    }

    fn with_type(name: impl Into<String>, declared_type: Option<DeclaredType>) -> Self {
        Self {
            name: name.into(),
            declared_type,
            nullable: false,
            default: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// 默认值在所有构造之间共享，应当是不可变值
    pub fn default_value<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.default = Some(Arc::new(value));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> Option<&DeclaredType> {
        self.declared_type.as_ref()
    }

    /// 声明为类类型时返回其标识符
    pub fn class_type(&self) -> Option<&str> {
        match &self.declared_type {
            Some(DeclaredType::Class(class)) => Some(class),
            _ => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn default(&self) -> Option<&Instance> {
        self.default.as_ref()
    }
}

impl fmt::Debug for ParameterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("nullable", &self.nullable)
            .field("has_default", &self.has_default())
            .finish()
    }
}

/// 类描述
#[derive(Clone)]
pub struct ClassDescriptor {
    name: String,
    instantiable: bool,
    /// `None` 表示类没有构造函数
    parameters: Option<Vec<ParameterDescriptor>>,
    constructor: Option<Constructor>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instantiable: true,
            parameters: None,
            constructor: None,
        }
    }

    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    /// 接口或抽象类：可以被绑定，但不能被自动装配
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            instantiable: false,
            ..Self::new(name)
        }
    }

    /// 追加一个构造函数参数（按声明顺序）
    pub fn param(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.get_or_insert_with(Vec::new).push(parameter);
        self
    }

    /// 声明一个无参构造函数
    pub fn no_params(mut self) -> Self {
        self.parameters.get_or_insert_with(Vec::new);
        self
    }

    pub fn construct<T, F>(mut self, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(move |args: &Arguments| {
            let instance: Instance = Arc::new(build(args)?);
            Ok(instance)
        }));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_instantiable(&self) -> bool {
        self.instantiable && self.constructor.is_some()
    }

    pub fn has_constructor(&self) -> bool {
        self.parameters.is_some()
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        self.parameters.as_deref().unwrap_or(&[])
    }

    pub(crate) fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("instantiable", &self.instantiable)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// 可被自动装配的类型
pub trait Injectable: Any + Send + Sync + Sized {
    fn descriptor() -> ClassDescriptor;

    fn identifier() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// 调用方显式提供的构造参数
#[derive(Clone, Default)]
pub struct Parameters {
    values: HashMap<String, Option<Instance>>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.values.insert(name.into(), Some(Arc::new(value)));
        self
    }

    pub fn with_instance(mut self, name: impl Into<String>, instance: Instance) -> Self {
        self.values.insert(name.into(), Some(instance));
        self
    }

    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.values.insert(name.into(), None);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// 显式值；外层 `None` 表示未提供，内层 `None` 表示显式的 null
    pub fn get(&self, name: &str) -> Option<Option<Instance>> {
        self.values.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 参数名集合的指纹，值是不透明的 `Any`，不参与计算
    pub fn fingerprint(&self) -> String {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        format!("{:x}", md5::compute(names.join("\u{0}").as_bytes()))
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();
        f.debug_struct("Parameters").field("names", &names).finish()
    }
}

/// 解析完成的构造参数，按声明顺序排列
pub struct Arguments {
    class: String,
    slots: Vec<(String, Option<Instance>)>,
}

impl Arguments {
    pub(crate) fn new(class: impl Into<String>, slots: Vec<(String, Option<Instance>)>) -> Self {
        Self {
            class: class.into(),
            slots,
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(name, _)| name.as_str())
    }

    /// 按位置取原始值，`None` 为 null
    pub fn at(&self, index: usize) -> Option<&Instance> {
        self.slots.get(index).and_then(|(_, value)| value.as_ref())
    }

    fn slot(&self, name: &str) -> Result<&Option<Instance>, ContainerError> {
        self.slots
            .iter()
            .find(|(slot_name, _)| slot_name == name)
            .map(|(_, value)| value)
            .ok_or_else(|| {
                BindingResolutionError::UnresolvableParameter {
                    class: self.class.clone(),
                    parameter: name.to_string(),
                }
                .into()
            })
    }

    fn label(&self, name: &str) -> String {
        format!("{}::${}", self.class, name)
    }

    /// 取非空参数；延迟代理会在这里被透明地加载
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ContainerError> {
        match self.slot(name)? {
            Some(instance) => downcast_instance::<T>(&self.label(name), instance.clone()),
            None => Err(ContainerError::TypeMismatch {
                identifier: self.label(name),
                expected: std::any::type_name::<T>(),
            }),
        }
    }

    pub fn optional<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>, ContainerError> {
        match self.slot(name)? {
            Some(instance) => downcast_instance::<T>(&self.label(name), instance.clone()).map(Some),
            None => Ok(None),
        }
    }

    /// 标量参数的便捷读取
    pub fn value<T: Any + Send + Sync + Clone>(&self, name: &str) -> Result<T, ContainerError> {
        self.get::<T>(name).map(|value| (*value).clone())
    }

    /// 保持延迟：参数是代理时不触发构造
    pub fn lazy<T: Any + Send + Sync>(&self, name: &str) -> Result<Lazy<T>, ContainerError> {
        match self.slot(name)? {
            Some(instance) => match instance.clone().downcast::<LazyService>() {
                Ok(service) => Ok(Lazy::from_service(service)),
                Err(instance) => Lazy::preloaded(self.label(name), instance),
            },
            None => Err(ContainerError::TypeMismatch {
                identifier: self.label(name),
                expected: std::any::type_name::<Lazy<T>>(),
            }),
        }
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("class", &self.class)
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Transport;

    #[test]
    fn parameter_builders_record_shape() {
        let param = ParameterDescriptor::of::<Transport>("transport")
            .nullable()
            .default_value(7u32);
        assert_eq!(param.name(), "transport");
        assert_eq!(param.class_type(), Some(std::any::type_name::<Transport>()));
        assert!(param.is_nullable());
        assert!(param.has_default());

        let port = ParameterDescriptor::builtin("port", "int");
        assert_eq!(port.declared_type(), Some(&DeclaredType::Builtin("int")));
        assert_eq!(port.class_type(), None);
    }

    #[test]
    fn descriptor_without_constructor_is_not_instantiable() {
        let descriptor = ClassDescriptor::new("App\\Bare");
        assert!(!descriptor.is_instantiable());
        assert!(!descriptor.has_constructor());

        let descriptor = descriptor.construct(|_| Ok(Transport));
        assert!(descriptor.is_instantiable());
        assert!(descriptor.parameters().is_empty());

        assert!(!ClassDescriptor::interface("App\\Contract")
            .construct(|_| Ok(Transport))
            .is_instantiable());
    }

    #[test]
    fn fingerprint_depends_only_on_names() {
        let a = Parameters::new().with("host", "a").with("port", 1u16);
        let b = Parameters::new().with("port", 9u16).with("host", "b");
        let c = Parameters::new().with("host", "a");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_ne!(Parameters::new().fingerprint(), c.fingerprint());
    }

    #[test]
    fn arguments_downcast_by_name() {
        let args = Arguments::new(
            "App\\Mailer",
            vec![
                ("retries".to_string(), Some(Arc::new(3u32) as Instance)),
                ("logger".to_string(), None),
            ],
        );
        assert_eq!(args.value::<u32>("retries").unwrap(), 3);
        assert!(args.optional::<Transport>("logger").unwrap().is_none());
        assert!(matches!(
            args.get::<Transport>("logger"),
            Err(ContainerError::TypeMismatch { .. })
        ));
        assert!(matches!(
            args.get::<String>("retries"),
            Err(ContainerError::TypeMismatch { .. })
        ));
        assert!(args.get::<u32>("missing").is_err());
    }
}
