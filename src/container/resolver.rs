//! 反射解析器
//!
//! 没有显式绑定的标识符按类描述自动装配：逐个解析构造参数
//! （显式值 → 通过容器递归解析 → 默认值 → null），再按声明顺序调用构造函数。
//!
//! 两层缓存：
//! - 类描述缓存：按类名首次解析时从类描述表填充，进程内永不失效；
//! - 参数方案缓存：记录每个参数走哪条分支，键为（类名，显式参数名指纹），
//!   容量有限，按 LRU 淘汰。只缓存方案而不缓存实例，瞬态语义不受影响。

use super::descriptor::{ClassDescriptor, Parameters};
use super::frame::Resolution;
use super::Instance;
use crate::errors::{BindingResolutionError, ContainerError};
use dashmap::DashMap;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 参数方案缓存的默认容量
pub const DEFAULT_PLAN_CACHE_CAPACITY: usize = 256;

/// 待解析的对象：已经构造好的实例，或需要自动装配的类名
pub(crate) enum Subject<'a> {
    Instance(&'a Instance),
    Class(&'a str),
}

enum DescriptorSource {
    Described(Arc<ClassDescriptor>),
    Deferred(fn() -> ClassDescriptor),
}

/// 单个参数的取值来源
#[derive(Debug, Clone, PartialEq, Eq)]
enum ArgumentSource {
    Explicit,
    Autowire { class: String, fallback_to_default: bool },
    Default,
    Null,
}

#[derive(Debug)]
struct ArgumentPlan {
    sources: Vec<ArgumentSource>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct PlanKey {
    class: String,
    fingerprint: String,
}

impl PlanKey {
    fn new(class: &str, parameters: &Parameters) -> Self {
        Self {
            class: class.to_string(),
            fingerprint: parameters.fingerprint(),
        }
    }
}

/// 参数方案缓存统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

pub(crate) struct ReflectionResolver {
    table: DashMap<String, DescriptorSource>,
    descriptors: DashMap<String, Arc<ClassDescriptor>>,
    plans: Mutex<LruCache<PlanKey, Arc<ArgumentPlan>>>,
    plan_hits: AtomicU64,
    plan_misses: AtomicU64,
    plan_evictions: AtomicU64,
}

impl ReflectionResolver {
    pub(crate) fn new(plan_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(plan_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            table: DashMap::new(),
            descriptors: DashMap::new(),
            plans: Mutex::new(LruCache::new(capacity)),
            plan_hits: AtomicU64::new(0),
            plan_misses: AtomicU64::new(0),
            plan_evictions: AtomicU64::new(0),
        }
    }

    /// 登记类描述；同名类被重新描述时丢弃旧的缓存
    pub(crate) fn describe(&self, descriptor: ClassDescriptor) {
        let name = descriptor.name().to_string();
        self.table
            .insert(name.clone(), DescriptorSource::Described(Arc::new(descriptor)));
        self.invalidate(&name);
    }

    /// 登记类描述的生成函数，首次解析该类时才调用
    pub(crate) fn describe_deferred(&self, name: &str, source: fn() -> ClassDescriptor) {
        self.table
            .insert(name.to_string(), DescriptorSource::Deferred(source));
        self.invalidate(name);
    }

    fn invalidate(&self, class: &str) {
        if self.descriptors.remove(class).is_none() {
            return;
        }
        let mut plans = self.plans.lock();
        let stale: Vec<PlanKey> = plans
            .iter()
            .filter(|(key, _)| key.class == class)
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            plans.pop(&key);
        }
    }

    pub(crate) fn is_described(&self, class: &str) -> bool {
        self.table.contains_key(class)
    }

    /// 类存在描述且可以被实例化
    pub(crate) fn can_autowire(&self, class: &str) -> bool {
        self.introspect(class)
            .map(|descriptor| descriptor.is_instantiable())
            .unwrap_or(false)
    }

    pub(crate) fn class_names(&self) -> Vec<String> {
        self.table.iter().map(|entry| entry.key().clone()).collect()
    }

    /// 取类描述，首次访问时填充缓存
    pub(crate) fn introspect(&self, class: &str) -> Option<Arc<ClassDescriptor>> {
        if let Some(descriptor) = self.descriptors.get(class) {
            return Some(descriptor.value().clone());
        }

        let descriptor = match self.table.get(class)?.value() {
            DescriptorSource::Described(descriptor) => descriptor.clone(),
            DescriptorSource::Deferred(source) => Arc::new(source()),
        };
        tracing::trace!(class, "class descriptor cached");
        Some(
            self.descriptors
                .entry(class.to_string())
                .or_insert(descriptor)
                .value()
                .clone(),
        )
    }

    pub(crate) fn resolve(
        &self,
        subject: Subject<'_>,
        parameters: &Parameters,
        resolution: &mut Resolution<'_>,
    ) -> Result<Instance, ContainerError> {
        let class = match subject {
            Subject::Instance(instance) => return Ok(instance.clone()),
            Subject::Class(class) => class,
        };

        let descriptor = self
            .introspect(class)
            .filter(|descriptor| descriptor.is_instantiable())
            .ok_or_else(|| BindingResolutionError::NotInstantiable {
                class: class.to_string(),
            })?;
        let constructor = descriptor
            .constructor()
            .cloned()
            .ok_or_else(|| BindingResolutionError::NotInstantiable {
                class: class.to_string(),
            })?;

        if !descriptor.has_constructor() {
            return constructor(&super::Arguments::new(class, Vec::new()));
        }

        let plan = self.plan_for(&descriptor, parameters)?;
        let mut slots = Vec::with_capacity(plan.sources.len());
        for (parameter, source) in descriptor.parameters().iter().zip(&plan.sources) {
            let value = match source {
                ArgumentSource::Explicit => parameters.get(parameter.name()).flatten(),
                ArgumentSource::Autowire {
                    class: dependency,
                    fallback_to_default,
                } => match resolution.get(dependency) {
                    Ok(instance) => Some(instance),
                    Err(err) if *fallback_to_default && is_recoverable(&err) => {
                        tracing::debug!(
                            class,
                            parameter = parameter.name(),
                            error = %err,
                            "dependency unresolved, using default value"
                        );
                        parameter.default().cloned()
                    }
                    Err(err) => return Err(err),
                },
                ArgumentSource::Default => parameter.default().cloned(),
                ArgumentSource::Null => None,
            };
            slots.push((parameter.name().to_string(), value));
        }

        constructor(&super::Arguments::new(class, slots))
    }

    /// 计算或复用参数方案
    fn plan_for(
        &self,
        descriptor: &ClassDescriptor,
        parameters: &Parameters,
    ) -> Result<Arc<ArgumentPlan>, BindingResolutionError> {
        let key = PlanKey::new(descriptor.name(), parameters);
        if let Some(plan) = self.plans.lock().get(&key) {
            self.plan_hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("argument plan cache hit: {}", descriptor.name());
            return Ok(plan.clone());
        }
        self.plan_misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("argument plan cache miss: {}", descriptor.name());

        let mut sources = Vec::with_capacity(descriptor.parameters().len());
        for parameter in descriptor.parameters() {
            let source = if parameters.contains(parameter.name()) {
                ArgumentSource::Explicit
            } else if let Some(class) = parameter.class_type() {
                ArgumentSource::Autowire {
                    class: class.to_string(),
                    fallback_to_default: parameter.has_default(),
                }
            } else if parameter.has_default() {
                ArgumentSource::Default
            } else if parameter.is_nullable() {
                ArgumentSource::Null
            } else {
                return Err(BindingResolutionError::UnresolvableParameter {
                    class: descriptor.name().to_string(),
                    parameter: parameter.name().to_string(),
                });
            };
            sources.push(source);
        }

        let plan = Arc::new(ArgumentPlan { sources });
        if let Some((evicted, _)) = self.plans.lock().push(key.clone(), plan.clone()) {
            if evicted != key {
                self.plan_evictions.fetch_add(1, Ordering::Relaxed);
                log::debug!("argument plan evicted: {}", evicted.class);
            }
        }
        Ok(plan)
    }

    #[cfg(test)]
    pub(crate) fn has_cached_plan(&self, class: &str, parameters: &Parameters) -> bool {
        self.plans.lock().contains(&PlanKey::new(class, parameters))
    }

    pub(crate) fn cached_plans(&self) -> usize {
        self.plans.lock().len()
    }

    pub(crate) fn cached_descriptors(&self) -> usize {
        self.descriptors.len()
    }

    pub(crate) fn plan_stats(&self) -> PlanCacheStats {
        PlanCacheStats {
            hits: self.plan_hits.load(Ordering::Relaxed),
            misses: self.plan_misses.load(Ordering::Relaxed),
            evictions: self.plan_evictions.load(Ordering::Relaxed),
        }
    }
}

/// 深度上限与循环依赖是保护性错误，不能被默认值掩盖
fn is_recoverable(err: &ContainerError) -> bool {
    !matches!(
        err,
        ContainerError::BindingResolution(
            BindingResolutionError::DepthExceeded { .. }
                | BindingResolutionError::CircularDependency { .. }
        )
    )
}
