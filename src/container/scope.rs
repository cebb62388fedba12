//! 作用域句柄
//!
//! 一个作用域对应一个有边界的工作单元（例如一次请求）。作用域内的
//! Scoped 实例共享，作用域结束时全部丢弃。结束由拥有者显式触发：
//! 调用 [`Scope::end`]，或者丢弃句柄。

use super::lazy::{downcast_instance, Lazy, LazyService};
use super::lifetime::ScopeInfo;
use super::{Container, Instance, Parameters, Resolution, ScopeId};
use crate::errors::ContainerError;
use std::any::Any;
use std::sync::Arc;

pub struct Scope {
    container: Container,
    id: ScopeId,
    ended: bool,
}

impl Scope {
    pub(crate) fn new(container: Container, id: ScopeId) -> Self {
        Self {
            container,
            id,
            ended: false,
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn info(&self) -> Option<ScopeInfo> {
        self.container.scope_info(self.id)
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn get(&self, identifier: &str) -> Result<Instance, ContainerError> {
        let mut resolution = Resolution::new(&self.container, Some(self.id));
        self.container.resolve_in(identifier, &mut resolution, None, true)
    }

    pub fn get_as<T: Any + Send + Sync>(&self, identifier: &str) -> Result<Arc<T>, ContainerError> {
        let instance = self.get(identifier)?;
        downcast_instance::<T>(identifier, instance)
    }

    pub fn make_with(&self, identifier: &str, parameters: &Parameters) -> Result<Instance, ContainerError> {
        let mut resolution = Resolution::new(&self.container, Some(self.id));
        self.container
            .resolve_in(identifier, &mut resolution, Some(parameters), false)
    }

    /// 绑定到本作用域的延迟代理
    pub fn create_proxy<T: Any + Send + Sync>(&self, identifier: &str) -> Lazy<T> {
        self.container.counters().record_proxy_created();
        Lazy::from_service(Arc::new(LazyService::new(
            identifier,
            Some(self.id),
            self.container.downgrade(),
        )))
    }

    /// 结束作用域，返回被丢弃的实例数量
    pub fn end(mut self) -> Result<usize, ContainerError> {
        self.ended = true;
        self.container.end_scope(self.id)
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !self.ended {
            if let Err(err) = self.container.end_scope(self.id) {
                tracing::debug!(scope = %self.id, error = %err, "scope already ended");
            }
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("ended", &self.ended)
            .finish()
    }
}
