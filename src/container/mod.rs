//! 依赖注入容器
//!
//! 对外的唯一入口，组合以下组件：
//! - 绑定注册表：标识符 → 构造策略 + 生命周期
//! - 反射解析器：按类描述自动装配构造参数
//! - 生命周期管理：瞬态 / 单例 / 作用域缓存
//! - 延迟代理：首次使用时才真正构造
//!
//! 解析流程：`get(identifier)` 先查注册表，命中则交给生命周期管理
//! （缓存命中直接返回，未命中调用工厂或解析器）；未命中则尝试按类描述
//! 自动装配。构造参数的递归解析始终回到容器，因此显式绑定可以覆盖自动装配。
//!
//! 容器在进程启动时构造一次，通过参数显式传递，不存在全局实例。

pub mod descriptor;
pub mod frame;
pub mod lazy;
pub mod lifetime;
pub mod registry;
pub mod resolver;
pub mod scope;
pub mod stats;

pub use descriptor::{Arguments, ClassDescriptor, Constructor, DeclaredType, Injectable, ParameterDescriptor, Parameters};
pub use frame::{Resolution, DEFAULT_MAX_DEPTH};
pub use lazy::{Lazy, LazyService};
pub use lifetime::{ScopeInfo, ServiceLifetime};
pub use registry::{Binding, Factory, FnFactory, Strategy};
pub use resolver::{PlanCacheStats, DEFAULT_PLAN_CACHE_CAPACITY};
pub use scope::Scope;
pub use stats::ContainerStats;

use crate::config::ContainerConfig;
use crate::errors::ContainerError;
use crate::scanner::ServiceDefinition;
use dashmap::DashMap;
use lazy::downcast_instance;
use lifetime::{LifetimeManager, Outcome, SlotKey};
use registry::BindingRegistry;
use resolver::{ReflectionResolver, Subject};
use stats::InnerStats;
use std::any::Any;
use std::sync::{Arc, Weak};

/// 容器中的实例
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 作用域标识，每个并发请求各自独有
pub type ScopeId = uuid::Uuid;

pub(crate) struct ContainerInner {
    registry: BindingRegistry,
    resolver: ReflectionResolver,
    lifetimes: LifetimeManager,
    /// 来自配置的生命周期元数据，`bind` / `factory` 注册时参考
    lifetime_hints: DashMap<String, ServiceLifetime>,
    /// true = 延迟，false = 显式排除延迟
    lazy_hints: DashMap<String, bool>,
    max_depth: usize,
    stats: InnerStats,
}

/// 依赖注入容器
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    pub fn new() -> Self {
        ContainerBuilder::new().build()
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn from_config(config: &ContainerConfig) -> Self {
        ContainerBuilder::new().config(config).build()
    }

    pub(crate) fn from_inner(inner: Arc<ContainerInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ContainerInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.inner.max_depth
    }

    pub(crate) fn counters(&self) -> &InnerStats {
        &self.inner.stats
    }

    // ===== 注册 =====

    /// 注册绑定，覆盖同一标识符的旧绑定及其缓存的单例
    pub fn register(&self, identifier: impl Into<String>, strategy: impl Into<Strategy>, lifetime: ServiceLifetime) {
        let identifier = identifier.into();
        let strategy = strategy.into();
        let lazy = match self.inner.lazy_hints.get(&identifier) {
            Some(hint) => *hint.value(),
            None => self
                .inner
                .registry
                .lookup(&identifier)
                .map(|previous| previous.lazy)
                .unwrap_or(false),
        };

        tracing::debug!(identifier = %identifier, ?strategy, ?lifetime, lazy, "binding registered");
        let replaced = self.inner.registry.register(Binding {
            identifier: identifier.clone(),
            strategy,
            lifetime,
            lazy,
        });
        if replaced.is_some() {
            self.inner.lifetimes.forget(&identifier);
        }
    }

    /// 瞬态绑定；配置元数据声明为单例或作用域时以元数据为准
    pub fn bind(&self, identifier: impl Into<String>, strategy: impl Into<Strategy>) {
        let identifier = identifier.into();
        let lifetime = self.hinted_lifetime(&identifier);
        self.register(identifier, strategy, lifetime);
    }

    pub fn singleton(&self, identifier: impl Into<String>, strategy: impl Into<Strategy>) {
        self.register(identifier, strategy, ServiceLifetime::Singleton);
    }

    /// 单例，标识符本身作为类名自动装配
    pub fn singleton_self(&self, identifier: impl Into<String>) {
        let identifier = identifier.into();
        self.register(identifier.clone(), Strategy::Class(identifier), ServiceLifetime::Singleton);
    }

    pub fn scoped(&self, identifier: impl Into<String>, strategy: impl Into<Strategy>) {
        self.register(identifier, strategy, ServiceLifetime::Scoped);
    }

    pub fn scoped_self(&self, identifier: impl Into<String>) {
        let identifier = identifier.into();
        self.register(identifier.clone(), Strategy::Class(identifier), ServiceLifetime::Scoped);
    }

    /// 工厂绑定，工厂以（解析上下文，显式参数）调用
    pub fn factory(&self, identifier: impl Into<String>, factory: impl Factory + 'static) {
        let identifier = identifier.into();
        let lifetime = self.hinted_lifetime(&identifier);
        self.register(identifier, Strategy::from_factory(factory), lifetime);
    }

    /// 注册一个已经构造好的单例值
    pub fn instance<T: Any + Send + Sync>(&self, identifier: impl Into<String>, value: T) {
        self.register(identifier, Strategy::value(value), ServiceLifetime::Singleton);
    }

    /// 登记类描述，使该类可以被自动装配
    pub fn describe(&self, descriptor: ClassDescriptor) {
        tracing::debug!(class = descriptor.name(), "class described");
        self.inner.resolver.describe(descriptor);
    }

    pub fn autowire<T: Injectable>(&self) {
        self.inner.resolver.describe_deferred(T::identifier(), T::descriptor);
    }

    pub fn singleton_type<T: Injectable>(&self) {
        self.autowire::<T>();
        self.singleton_self(T::identifier());
    }

    pub fn scoped_type<T: Injectable>(&self) {
        self.autowire::<T>();
        self.scoped_self(T::identifier());
    }

    /// 标记为延迟构造；之后的同名注册同样延迟
    pub fn lazy(&self, identifier: impl Into<String>) {
        let identifier = identifier.into();
        self.inner.registry.mark_lazy(&identifier, true);
        self.inner.lazy_hints.insert(identifier, true);
    }

    /// 排除出延迟构造
    pub fn eager(&self, identifier: impl Into<String>) {
        let identifier = identifier.into();
        self.inner.registry.mark_lazy(&identifier, false);
        self.inner.lazy_hints.insert(identifier, false);
    }

    pub fn unbind(&self, identifier: &str) -> bool {
        let removed = self.inner.registry.remove(identifier).is_some();
        if removed {
            self.inner.lifetimes.forget(identifier);
        }
        removed
    }

    /// 接收服务扫描器给出的定义，返回注册的绑定数量（含别名）
    pub fn register_scanned<I>(&self, definitions: I) -> usize
    where
        I: IntoIterator<Item = ServiceDefinition>,
    {
        definitions
            .into_iter()
            .map(|definition| definition.register_into(self))
            .sum()
    }

    fn hinted_lifetime(&self, identifier: &str) -> ServiceLifetime {
        self.inner
            .lifetime_hints
            .get(identifier)
            .map(|hint| *hint.value())
            .unwrap_or(ServiceLifetime::Transient)
    }

    // ===== 解析 =====

    pub fn get(&self, identifier: &str) -> Result<Instance, ContainerError> {
        let mut resolution = Resolution::new(self, None);
        self.resolve_in(identifier, &mut resolution, None, true)
    }

    pub fn get_as<T: Any + Send + Sync>(&self, identifier: &str) -> Result<Arc<T>, ContainerError> {
        let instance = self.get(identifier)?;
        downcast_instance::<T>(identifier, instance)
    }

    /// 是否存在显式绑定；只能自动装配的类返回 false
    pub fn has(&self, identifier: &str) -> bool {
        self.inner.registry.contains(identifier)
    }

    /// 绕过单例/作用域缓存，用显式参数构造一个新实例
    pub fn make_with(&self, identifier: &str, parameters: &Parameters) -> Result<Instance, ContainerError> {
        let mut resolution = Resolution::new(self, None);
        self.resolve_in(identifier, &mut resolution, Some(parameters), false)
    }

    pub fn make_with_as<T: Any + Send + Sync>(
        &self,
        identifier: &str,
        parameters: &Parameters,
    ) -> Result<Arc<T>, ContainerError> {
        let instance = self.make_with(identifier, parameters)?;
        downcast_instance::<T>(identifier, instance)
    }

    /// 取得保持延迟的句柄：延迟绑定返回其（共享的）代理，其余标识符返回新代理
    pub fn get_lazy<T: Any + Send + Sync>(&self, identifier: &str) -> Result<Lazy<T>, ContainerError> {
        let lazy_binding = self
            .inner
            .registry
            .lookup(identifier)
            .map(|binding| binding.lazy)
            .unwrap_or(false);
        if !lazy_binding {
            return Ok(self.create_proxy(identifier));
        }
        match self.get(identifier)?.downcast::<LazyService>() {
            Ok(service) => Ok(Lazy::from_service(service)),
            Err(instance) => Lazy::preloaded(identifier, instance),
        }
    }

    /// 创建延迟代理，不做任何构造工作
    pub fn create_proxy<T: Any + Send + Sync>(&self, identifier: &str) -> Lazy<T> {
        self.inner.stats.record_proxy_created();
        Lazy::from_service(Arc::new(LazyService::new(identifier, None, self.downgrade())))
    }

    // ===== 作用域 =====

    pub fn begin_scope(&self) -> Scope {
        self.begin_scope_named("default")
    }

    pub fn begin_scope_named(&self, name: impl Into<String>) -> Scope {
        let id = self.inner.lifetimes.begin_scope(name);
        tracing::debug!(scope = %id, "scope started");
        Scope::new(self.clone(), id)
    }

    /// 结束作用域并丢弃其实例，返回被丢弃的实例数量
    pub fn end_scope(&self, scope_id: ScopeId) -> Result<usize, ContainerError> {
        let dropped = self.inner.lifetimes.end_scope(scope_id)?;
        tracing::debug!(scope = %scope_id, dropped, "scope ended");
        Ok(dropped)
    }

    pub fn scope_info(&self, scope_id: ScopeId) -> Option<ScopeInfo> {
        self.inner.lifetimes.scope_info(scope_id)
    }

    pub fn is_scope_active(&self, scope_id: ScopeId) -> bool {
        self.inner.lifetimes.is_scope_active(scope_id)
    }

    // ===== 诊断 =====

    pub fn binding(&self, identifier: &str) -> Option<Binding> {
        self.inner.registry.lookup(identifier)
    }

    /// 单例是否已经构造完成
    pub fn has_singleton(&self, identifier: &str) -> bool {
        self.inner.lifetimes.has_singleton(identifier)
    }

    /// 是否存在该类的描述（不论能否实例化）
    pub fn is_described(&self, class: &str) -> bool {
        self.inner.resolver.is_described(class)
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.inner.registry.identifiers()
    }

    pub fn stats(&self) -> ContainerStats {
        let plans = self.inner.resolver.plan_stats();
        ContainerStats {
            registered_bindings: self.inner.registry.len(),
            active_singletons: self.inner.lifetimes.singleton_count(),
            active_scopes: self.inner.lifetimes.active_scopes(),
            cached_descriptors: self.inner.resolver.cached_descriptors(),
            cached_argument_plans: self.inner.resolver.cached_plans(),
            argument_plan_hits: plans.hits,
            argument_plan_misses: plans.misses,
            argument_plan_evictions: plans.evictions,
            ..self.inner.stats.snapshot()
        }
    }

    pub fn reset_stats(&self) {
        self.inner.stats.reset();
    }

    /// 丢弃全部已缓存的单例（绑定保留）
    pub fn flush_singletons(&self) {
        self.inner.lifetimes.clear_singletons();
    }

    // ===== 内部解析流程 =====

    pub(crate) fn resolve_in(
        &self,
        identifier: &str,
        resolution: &mut Resolution<'_>,
        parameters: Option<&Parameters>,
        honor_lazy: bool,
    ) -> Result<Instance, ContainerError> {
        resolution.frame_mut().enter(identifier)?;
        self.inner.stats.record_resolution();

        let result = match self.inner.registry.lookup(identifier) {
            Some(binding) => self.resolve_binding(&binding, resolution, parameters, honor_lazy),
            None => self.autowire_unbound(identifier, resolution, parameters),
        };

        resolution.frame_mut().exit(identifier);
        if result.is_err() && resolution.depth() == 0 {
            self.inner.stats.record_failure();
        }
        result
    }

    /// 代理首次被访问时调用：与普通 `get` 相同，只是不再返回代理本身
    pub(crate) fn resolve_deferred(&self, identifier: &str, scope: Option<ScopeId>) -> Result<Instance, ContainerError> {
        let mut resolution = Resolution::new(self, scope);
        self.resolve_in(identifier, &mut resolution, None, false)
    }

    fn resolve_binding(
        &self,
        binding: &Binding,
        resolution: &mut Resolution<'_>,
        parameters: Option<&Parameters>,
        honor_lazy: bool,
    ) -> Result<Instance, ContainerError> {
        if parameters.is_some() {
            self.inner.stats.record_transient_creation();
            return self.build(binding, resolution, parameters);
        }
        if binding.lazy && honor_lazy {
            return self.proxy_for(binding, resolution.scope());
        }

        let scope = resolution.scope();
        let (instance, outcome) = self.inner.lifetimes.get_or_create(
            SlotKey::instance(&binding.identifier),
            binding.lifetime,
            scope,
            || self.build(binding, resolution, None),
        )?;
        self.record_outcome(binding, outcome);
        Ok(instance)
    }

    fn record_outcome(&self, binding: &Binding, outcome: Outcome) {
        let stats = &self.inner.stats;
        match (binding.lifetime, outcome) {
            (ServiceLifetime::Transient, _) => stats.record_transient_creation(),
            (ServiceLifetime::Singleton, Outcome::Cached) => {
                tracing::trace!(identifier = %binding.identifier, "singleton cache hit");
                stats.record_singleton_hit()
            }
            (ServiceLifetime::Singleton, Outcome::Constructed) => stats.record_singleton_miss(),
            (ServiceLifetime::Scoped, Outcome::Cached) => stats.record_scoped_hit(),
            (ServiceLifetime::Scoped, Outcome::Constructed) => stats.record_scoped_creation(),
        }
    }

    /// 按绑定策略构造；`parameters` 为 `None` 表示普通解析（别名目标走缓存）
    fn build(
        &self,
        binding: &Binding,
        resolution: &mut Resolution<'_>,
        parameters: Option<&Parameters>,
    ) -> Result<Instance, ContainerError> {
        let empty = Parameters::new();
        let identifier = binding.identifier.as_str();
        match &binding.strategy {
            Strategy::Value(instance) => self.inner.resolver.resolve(
                Subject::Instance(instance),
                parameters.unwrap_or(&empty),
                resolution,
            ),
            Strategy::Factory(factory) => {
                tracing::debug!(identifier, factory = factory.type_name(), "invoking factory");
                factory.create(resolution, parameters.unwrap_or(&empty))
            }
            Strategy::Class(class) if class == identifier => {
                tracing::debug!(identifier, "autowiring bound class");
                self.inner
                    .resolver
                    .resolve(Subject::Class(class), parameters.unwrap_or(&empty), resolution)
            }
            Strategy::Class(class) => self.resolve_in(class, resolution, parameters, true),
        }
    }

    fn proxy_for(&self, binding: &Binding, scope: Option<ScopeId>) -> Result<Instance, ContainerError> {
        // 单例代理不绑定作用域，作用域结束后仍可加载
        let scope = match binding.lifetime {
            ServiceLifetime::Singleton => None,
            _ => scope,
        };
        let make_proxy = || -> Result<Instance, ContainerError> {
            self.inner.stats.record_proxy_created();
            tracing::debug!(identifier = %binding.identifier, "lazy proxy created");
            let proxy: Instance = Arc::new(LazyService::new(&binding.identifier, scope, self.downgrade()));
            Ok(proxy)
        };

        match binding.lifetime {
            ServiceLifetime::Transient => make_proxy(),
            lifetime => self
                .inner
                .lifetimes
                .get_or_create(SlotKey::proxy(&binding.identifier), lifetime, scope, make_proxy)
                .map(|(proxy, _)| proxy),
        }
    }

    fn autowire_unbound(
        &self,
        identifier: &str,
        resolution: &mut Resolution<'_>,
        parameters: Option<&Parameters>,
    ) -> Result<Instance, ContainerError> {
        if !self.inner.resolver.can_autowire(identifier) {
            return Err(ContainerError::NotFound {
                identifier: identifier.to_string(),
                suggestion: self.suggest(identifier),
            });
        }

        let empty = Parameters::new();
        let instance = self.inner.resolver.resolve(
            Subject::Class(identifier),
            parameters.unwrap_or(&empty),
            resolution,
        )?;
        self.inner.stats.record_autowired_creation();
        Ok(instance)
    }

    /// 短名相同（忽略大小写与命名空间）的已知标识符
    fn suggest(&self, identifier: &str) -> Option<String> {
        let wanted = short_name(identifier).to_ascii_lowercase();
        self.inner
            .registry
            .identifiers()
            .into_iter()
            .chain(self.inner.resolver.class_names())
            .filter(|candidate| candidate != identifier)
            .find(|candidate| short_name(candidate).to_ascii_lowercase() == wanted)
    }
}

fn short_name(identifier: &str) -> &str {
    identifier
        .rsplit(|c: char| matches!(c, '\\' | ':' | '.'))
        .next()
        .unwrap_or(identifier)
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.inner.registry.len())
            .field("max_depth", &self.inner.max_depth)
            .finish()
    }
}

/// 容器构建器
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    max_depth: usize,
    plan_capacity: usize,
    lifetime_hints: Vec<(String, ServiceLifetime)>,
    lazy_hints: Vec<(String, bool)>,
    services: Vec<ServiceDefinition>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            plan_capacity: DEFAULT_PLAN_CACHE_CAPACITY,
            lifetime_hints: Vec::new(),
            lazy_hints: Vec::new(),
            services: Vec::new(),
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn argument_cache_capacity(mut self, capacity: usize) -> Self {
        self.plan_capacity = capacity;
        self
    }

    pub fn lifetime_hint(mut self, identifier: impl Into<String>, lifetime: ServiceLifetime) -> Self {
        self.lifetime_hints.push((identifier.into(), lifetime));
        self
    }

    pub fn lazy(mut self, identifier: impl Into<String>) -> Self {
        self.lazy_hints.push((identifier.into(), true));
        self
    }

    pub fn eager(mut self, identifier: impl Into<String>) -> Self {
        self.lazy_hints.push((identifier.into(), false));
        self
    }

    pub fn service(mut self, definition: ServiceDefinition) -> Self {
        self.services.push(definition);
        self
    }

    /// 应用配置：深度上限、缓存容量、生命周期/延迟元数据和服务定义
    pub fn config(mut self, config: &ContainerConfig) -> Self {
        self.max_depth = config.max_depth;
        self.plan_capacity = config.argument_cache_capacity;
        self.lifetime_hints.extend(
            config
                .singletons
                .iter()
                .map(|id| (id.clone(), ServiceLifetime::Singleton)),
        );
        self.lifetime_hints
            .extend(config.scoped.iter().map(|id| (id.clone(), ServiceLifetime::Scoped)));
        self.lazy_hints.extend(config.lazy.iter().map(|id| (id.clone(), true)));
        // 排除项后应用，同时出现时以排除为准
        self.lazy_hints.extend(config.eager.iter().map(|id| (id.clone(), false)));
        self.services.extend(config.services.iter().cloned());
        self
    }

    pub fn build(self) -> Container {
        let container = Container {
            inner: Arc::new(ContainerInner {
                registry: BindingRegistry::new(),
                resolver: ReflectionResolver::new(self.plan_capacity),
                lifetimes: LifetimeManager::new(),
                lifetime_hints: self.lifetime_hints.into_iter().collect(),
                lazy_hints: self.lazy_hints.into_iter().collect(),
                max_depth: self.max_depth,
                stats: InnerStats::default(),
            }),
        };
        let registered = container.register_scanned(self.services);
        tracing::debug!(
            max_depth = container.inner.max_depth,
            registered,
            "container built"
        );
        container
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Clock;

    #[derive(Debug)]
    struct Mailer {
        clock: Arc<Clock>,
        retries: u32,
    }

    fn describe_mail(container: &Container) {
        container.describe(ClassDescriptor::new("Clock").no_params().construct(|_| Ok(Clock)));
        container.describe(
            ClassDescriptor::new("Mailer")
                .param(ParameterDescriptor::class("clock", "Clock"))
                .param(ParameterDescriptor::builtin("retries", "int").default_value(3u32))
                .construct(|args| {
                    Ok(Mailer {
                        clock: args.get("clock")?,
                        retries: args.value("retries")?,
                    })
                }),
        );
    }

    #[test]
    fn value_bindings_return_the_same_instance() {
        let container = Container::new();
        container.bind("config.name", Strategy::value("app".to_string()));
        let a = container.get("config.name").unwrap();
        let b = container.get("config.name").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*container.get_as::<String>("config.name").unwrap(), "app");
    }

    #[test]
    fn bind_respects_lifetime_metadata() {
        let container = Container::builder()
            .lifetime_hint("Clock", ServiceLifetime::Singleton)
            .build();
        describe_mail(&container);
        container.bind("Clock", "Clock");
        assert_eq!(container.binding("Clock").unwrap().lifetime, ServiceLifetime::Singleton);

        let a = container.get("Clock").unwrap();
        let b = container.get("Clock").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn explicit_binding_overrides_autowiring_of_dependencies() {
        let container = Container::new();
        describe_mail(&container);
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        container.singleton(
            "Clock",
            Strategy::factory(move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(Clock)
            }),
        );

        let first = container.get_as::<Mailer>("Mailer").unwrap();
        let second = container.get_as::<Mailer>("Mailer").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first.clock, &second.clock));
        assert_eq!(first.retries, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn alias_resolves_through_target_binding() {
        let container = Container::new();
        describe_mail(&container);
        container.singleton_self("Clock");
        container.bind("clock.alias", "Clock");

        let via_alias = container.get("clock.alias").unwrap();
        let direct = container.get("Clock").unwrap();
        assert!(Arc::ptr_eq(&via_alias, &direct));
    }

    #[test]
    fn rebinding_drops_cached_singleton() {
        let container = Container::new();
        container.instance("n", 1u32);
        assert_eq!(*container.get_as::<u32>("n").unwrap(), 1);
        container.instance("n", 2u32);
        assert_eq!(*container.get_as::<u32>("n").unwrap(), 2);
        assert!(container.has_singleton("n"));
        container.flush_singletons();
        assert!(!container.has_singleton("n"));
        assert_eq!(*container.get_as::<u32>("n").unwrap(), 2);
        assert!(container.unbind("n"));
        assert!(!container.has("n"));
        assert!(!container.unbind("n"));
    }

    #[test]
    fn not_found_suggests_known_identifier() {
        let container = Container::new();
        describe_mail(&container);
        container.singleton_self("App\\Clock");
        match container.get("clock") {
            Err(ContainerError::NotFound { identifier, suggestion }) => {
                assert_eq!(identifier, "clock");
                assert!(suggestion.is_some());
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
        let stats = container.stats();
        assert_eq!(stats.failed_resolutions, 1);
    }

    #[test]
    fn short_name_strips_namespaces() {
        assert_eq!(short_name("App\\Service\\Mailer"), "Mailer");
        assert_eq!(short_name("crate::mail::Mailer"), "Mailer");
        assert_eq!(short_name("mailer"), "mailer");
    }
}
