//! 延迟代理
//!
//! 代理在第一次被访问前不做任何构造工作。首次访问时通过容器普通的
//! `get` 路径拿到真实实例，缓存在代理内部，之后的访问全部转发给它。
//! 状态只会从 Unloaded 变为 Loaded，不会重置。
//!
//! 代理只持有容器的弱引用：单例里保存的代理不会让容器永远无法释放。

use super::{Container, ContainerInner, Instance, ScopeId};
use crate::errors::ContainerError;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock, Weak};

/// 类型擦除的代理，延迟绑定解析出的就是它
pub struct LazyService {
    identifier: String,
    scope: Option<ScopeId>,
    container: Weak<ContainerInner>,
    instance: OnceLock<Instance>,
    init: Mutex<()>,
}

impl LazyService {
    pub(crate) fn new(identifier: impl Into<String>, scope: Option<ScopeId>, container: Weak<ContainerInner>) -> Self {
        Self {
            identifier: identifier.into(),
            scope,
            container,
            instance: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    fn loaded(identifier: impl Into<String>, instance: Instance) -> Self {
        let service = Self::new(identifier, None, Weak::new());
        let _ = service.instance.set(instance);
        service
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn scope(&self) -> Option<ScopeId> {
        self.scope
    }

    pub fn is_loaded(&self) -> bool {
        self.instance.get().is_some()
    }

    /// 取得真实实例，必要时触发构造
    ///
    /// 构造失败时返回与立即解析完全相同的错误，代理保持未加载状态。
    pub fn force(&self) -> Result<Instance, ContainerError> {
        if let Some(instance) = self.instance.get() {
            return Ok(instance.clone());
        }

        let _guard = self.init.lock();
        if let Some(instance) = self.instance.get() {
            return Ok(instance.clone());
        }

        let container = self
            .container
            .upgrade()
            .map(Container::from_inner)
            .ok_or_else(|| ContainerError::Disposed {
                identifier: self.identifier.clone(),
            })?;

        tracing::debug!(identifier = %self.identifier, "loading lazy proxy target");
        let instance = container.resolve_deferred(&self.identifier, self.scope)?;
        let _ = self.instance.set(instance.clone());
        container.counters().record_proxy_loaded();
        Ok(instance)
    }
}

impl fmt::Debug for LazyService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyService")
            .field("identifier", &self.identifier)
            .field("scope", &self.scope)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// 类型化的延迟代理
///
/// 需要对调用方透明时，为 `Lazy<T>` 实现调用方依赖的 trait，
/// 在每个方法里通过 [`Lazy::with`] 或 [`Lazy::instance`] 转发。
pub struct Lazy<T> {
    service: Arc<LazyService>,
    typed: OnceLock<Arc<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Lazy<T> {
    pub(crate) fn from_service(service: Arc<LazyService>) -> Self {
        Self {
            service,
            typed: OnceLock::new(),
            _marker: PhantomData,
        }
    }

    /// 用已经构造好的实例包装成代理
    pub(crate) fn preloaded(identifier: impl Into<String>, instance: Instance) -> Result<Self, ContainerError> {
        let identifier = identifier.into();
        let typed = instance
            .clone()
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                identifier: identifier.clone(),
                expected: std::any::type_name::<T>(),
            })?;
        let lazy = Self::from_service(Arc::new(LazyService::loaded(identifier, instance)));
        let _ = lazy.typed.set(typed);
        Ok(lazy)
    }

    pub fn identifier(&self) -> &str {
        self.service.identifier()
    }

    pub fn is_loaded(&self) -> bool {
        self.service.is_loaded()
    }

    pub fn instance(&self) -> Result<Arc<T>, ContainerError> {
        if let Some(typed) = self.typed.get() {
            return Ok(typed.clone());
        }
        let instance = self.service.force()?;
        let typed = downcast_instance::<T>(self.service.identifier(), instance)?;
        Ok(self.typed.get_or_init(|| typed).clone())
    }

    /// 把一次调用转发给真实实例
    pub fn with<R>(&self, call: impl FnOnce(&T) -> R) -> Result<R, ContainerError> {
        let instance = self.instance()?;
        Ok(call(&instance))
    }

    pub fn service(&self) -> &Arc<LazyService> {
        &self.service
    }
}

impl<T> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            typed: self.typed.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("target", &std::any::type_name::<T>())
            .field("service", &self.service)
            .finish()
    }
}

/// 向下转型；遇到类型擦除的代理时先加载真实实例
pub(crate) fn downcast_instance<T: Any + Send + Sync>(
    identifier: &str,
    instance: Instance,
) -> Result<Arc<T>, ContainerError> {
    let instance = match instance.downcast::<T>() {
        Ok(typed) => return Ok(typed),
        Err(instance) => instance,
    };

    let real = match instance.downcast::<LazyService>() {
        Ok(proxy) => proxy.force()?,
        Err(_) => {
            return Err(ContainerError::TypeMismatch {
                identifier: identifier.to_string(),
                expected: std::any::type_name::<T>(),
            })
        }
    };

    real.downcast::<T>().map_err(|_| ContainerError::TypeMismatch {
        identifier: identifier.to_string(),
        expected: std::any::type_name::<T>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preloaded_proxy_is_already_loaded() {
        let lazy = Lazy::<u32>::preloaded("answer", Arc::new(42u32)).unwrap();
        assert!(lazy.is_loaded());
        assert_eq!(lazy.with(|v| *v + 1).unwrap(), 43);
    }

    #[test]
    fn preloaded_proxy_rejects_wrong_type() {
        let result = Lazy::<String>::preloaded("answer", Arc::new(42u32));
        assert!(matches!(result, Err(ContainerError::TypeMismatch { .. })));
    }

    #[test]
    fn orphaned_proxy_reports_disposed() {
        let service = LazyService::new("db", None, Weak::new());
        assert!(!service.is_loaded());
        assert!(matches!(service.force(), Err(ContainerError::Disposed { .. })));
        assert!(!service.is_loaded());
    }

    #[test]
    fn downcast_rejects_foreign_types() {
        let instance: Instance = Arc::new("text");
        assert!(downcast_instance::<u8>("x", instance.clone()).is_err());
        assert_eq!(*downcast_instance::<&str>("x", instance).unwrap(), "text");
    }
}
