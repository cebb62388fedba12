//! 解析帧
//!
//! 一次顶层 `get` / `make_with` 调用期间的临时记录：当前深度、
//! 正在解析的标识符集合，以及可选的作用域。解析完成或失败后即丢弃。

use super::lazy::downcast_instance;
use super::{Container, Instance, Parameters, ScopeId};
use crate::errors::{BindingResolutionError, ContainerError};
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

/// 默认递归深度上限
pub const DEFAULT_MAX_DEPTH: usize = 50;

#[derive(Debug)]
pub(crate) struct Frame {
    max_depth: usize,
    chain: Vec<String>,
    in_flight: HashSet<String>,
    scope: Option<ScopeId>,
}

impl Frame {
    pub(crate) fn new(max_depth: usize, scope: Option<ScopeId>) -> Self {
        Self {
            max_depth,
            chain: Vec::new(),
            in_flight: HashSet::new(),
            scope,
        }
    }

    pub(crate) fn enter(&mut self, identifier: &str) -> Result<(), BindingResolutionError> {
        if self.in_flight.contains(identifier) {
            let mut chain = self.chain.clone();
            chain.push(identifier.to_string());
            tracing::warn!(chain = %chain.join(" -> "), "circular dependency detected");
            return Err(BindingResolutionError::CircularDependency { chain });
        }
        if self.chain.len() >= self.max_depth {
            let mut chain = self.chain.clone();
            chain.push(identifier.to_string());
            tracing::warn!(
                identifier,
                max_depth = self.max_depth,
                "resolution depth ceiling exceeded"
            );
            return Err(BindingResolutionError::DepthExceeded {
                identifier: identifier.to_string(),
                max_depth: self.max_depth,
                chain,
            });
        }
        self.in_flight.insert(identifier.to_string());
        self.chain.push(identifier.to_string());
        Ok(())
    }

    pub(crate) fn exit(&mut self, identifier: &str) {
        if let Some(last) = self.chain.pop() {
            debug_assert_eq!(last, identifier);
        }
        self.in_flight.remove(identifier);
    }

    pub(crate) fn depth(&self) -> usize {
        self.chain.len()
    }
}

/// 正在进行中的解析
///
/// 工厂与构造过程通过它回调容器，嵌套解析共享同一个帧，
/// 因此深度上限和循环检测覆盖整条依赖链。
pub struct Resolution<'c> {
    container: &'c Container,
    frame: Frame,
}

impl<'c> Resolution<'c> {
    pub(crate) fn new(container: &'c Container, scope: Option<ScopeId>) -> Self {
        Self {
            frame: Frame::new(container.max_depth(), scope),
            container,
        }
    }

    pub fn container(&self) -> &'c Container {
        self.container
    }

    pub fn scope(&self) -> Option<ScopeId> {
        self.frame.scope
    }

    pub fn depth(&self) -> usize {
        self.frame.depth()
    }

    pub fn get(&mut self, identifier: &str) -> Result<Instance, ContainerError> {
        let container = self.container;
        container.resolve_in(identifier, self, None, true)
    }

    pub fn get_as<T: Any + Send + Sync>(&mut self, identifier: &str) -> Result<Arc<T>, ContainerError> {
        let instance = self.get(identifier)?;
        downcast_instance::<T>(identifier, instance)
    }

    pub fn make_with(&mut self, identifier: &str, parameters: &Parameters) -> Result<Instance, ContainerError> {
        let container = self.container;
        container.resolve_in(identifier, self, Some(parameters), false)
    }

    pub fn has(&self, identifier: &str) -> bool {
        self.container.has(identifier)
    }

    pub(crate) fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }
}
