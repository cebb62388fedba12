//! 生命周期管理
//!
//! 决定一个已解析的标识符是返回缓存实例（单例/作用域）还是重新构造（瞬态）。
//! 单例与作用域缓存的每个键都有一个槽位，记录实例以及正在构造它的线程。
//! 并发的首次访问中，后到的调用方在槽位上等待，直到第一个调用方构造完成，
//! 然后拿到同一个实例。槽位锁只在读写状态时短暂持有，构造期间不持有。
//!
//! 等待关系记录在一张等待图里：线程 → 它等待的槽位 → 槽位的构造者。
//! 如果一次等待会让图成环（两个线程各自构造环上的一个单例并互相等待），
//! 这次等待直接以 `CircularDependency` 失败，而不是永久阻塞。

use super::{Instance, ScopeId};
use crate::errors::{BindingResolutionError, ContainerError};
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Instant;

/// 服务生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLifetime {
    /// 每次解析都创建新实例
    Transient,
    /// 容器生命周期内只有一个实例
    Singleton,
    /// 每个作用域一个实例，作用域结束时丢弃
    Scoped,
}

impl Default for ServiceLifetime {
    fn default() -> Self {
        ServiceLifetime::Transient
    }
}

/// 缓存槽的种类：真实实例，或延迟绑定的代理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SlotKind {
    Instance,
    Proxy,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SlotKey {
    identifier: String,
    kind: SlotKind,
}

impl SlotKey {
    pub(crate) fn instance(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            kind: SlotKind::Instance,
        }
    }

    pub(crate) fn proxy(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            kind: SlotKind::Proxy,
        }
    }
}

#[derive(Default)]
struct SlotState {
    instance: Option<Instance>,
    owner: Option<ThreadId>,
}

#[derive(Default)]
struct SlotCell {
    state: Mutex<SlotState>,
    ready: Condvar,
}

type Slot = Arc<SlotCell>;

fn slot_id(slot: &Slot) -> usize {
    Arc::as_ptr(slot) as usize
}

/// 槽位 → 构造者，线程 → (等待的槽位, 标识符)
#[derive(Default)]
struct WaitGraph {
    owners: HashMap<usize, ThreadId>,
    waiting: HashMap<ThreadId, (usize, String)>,
}

impl WaitGraph {
    /// 登记 `me` 等待 `slot`；若会闭合一个环则返回环上的标识符链
    fn wait(&mut self, me: ThreadId, slot: usize, identifier: &str, owner: ThreadId) -> Result<(), Vec<String>> {
        let mut chain = vec![identifier.to_string()];
        let mut current = owner;
        while current != me {
            let next = self
                .waiting
                .get(&current)
                .and_then(|(waited, name)| self.owners.get(waited).map(|next| (*next, name)));
            match next {
                Some((next, name)) => {
                    chain.push(name.clone());
                    current = next;
                }
                None => {
                    self.waiting.insert(me, (slot, identifier.to_string()));
                    return Ok(());
                }
            }
        }
        chain.push(identifier.to_string());
        Err(chain)
    }
}

/// 构造结束（成功、失败或 panic）时释放槽位并唤醒等待者
struct Construction<'a> {
    graph: &'a Mutex<WaitGraph>,
    slot: &'a Slot,
}

impl Drop for Construction<'_> {
    fn drop(&mut self) {
        let mut state = self.slot.state.lock();
        state.owner = None;
        self.graph.lock().owners.remove(&slot_id(self.slot));
        self.slot.ready.notify_all();
    }
}

/// 一次 `get_or_create` 的结果来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Cached,
    Constructed,
}

/// 作用域信息
#[derive(Debug, Clone)]
pub struct ScopeInfo {
    pub id: ScopeId,
    pub name: String,
    pub created_at: Instant,
    pub instance_count: usize,
}

impl ScopeInfo {
    pub fn duration(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

struct ScopeCache {
    name: String,
    created_at: Instant,
    slots: DashMap<SlotKey, Slot>,
}

#[derive(Default)]
pub(crate) struct LifetimeManager {
    singletons: DashMap<SlotKey, Slot>,
    scopes: DashMap<ScopeId, Arc<ScopeCache>>,
    waits: Mutex<WaitGraph>,
}

impl LifetimeManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get_or_create<F>(
        &self,
        key: SlotKey,
        lifetime: ServiceLifetime,
        scope: Option<ScopeId>,
        construct: F,
    ) -> Result<(Instance, Outcome), ContainerError>
    where
        F: FnOnce() -> Result<Instance, ContainerError>,
    {
        match lifetime {
            ServiceLifetime::Transient => Ok((construct()?, Outcome::Constructed)),
            ServiceLifetime::Singleton => {
                // 克隆出槽位后立即释放分片锁，构造过程可能递归访问同一张表
                let slot = self.singletons.entry(key.clone()).or_insert_with(Default::default).clone();
                self.fill(&key.identifier, &slot, construct)
            }
            ServiceLifetime::Scoped => {
                let scope_id = scope.ok_or_else(|| ContainerError::ScopeRequired {
                    identifier: key.identifier.clone(),
                })?;
                let cache = self
                    .scopes
                    .get(&scope_id)
                    .map(|cache| cache.value().clone())
                    .ok_or(ContainerError::ScopeNotActive { scope_id })?;
                let slot = cache.slots.entry(key.clone()).or_insert_with(Default::default).clone();
                self.fill(&key.identifier, &slot, construct)
            }
        }
    }

    fn fill<F>(&self, identifier: &str, slot: &Slot, construct: F) -> Result<(Instance, Outcome), ContainerError>
    where
        F: FnOnce() -> Result<Instance, ContainerError>,
    {
        let me = thread::current().id();
        let mut state = slot.state.lock();
        loop {
            if let Some(instance) = state.instance.as_ref() {
                return Ok((instance.clone(), Outcome::Cached));
            }
            let Some(owner) = state.owner else { break };

            self.waits
                .lock()
                .wait(me, slot_id(slot), identifier, owner)
                .map_err(|chain| {
                    tracing::warn!(chain = %chain.join(" -> "), "circular dependency across concurrent constructions");
                    BindingResolutionError::CircularDependency { chain }
                })?;
            slot.ready.wait(&mut state);
            self.waits.lock().waiting.remove(&me);
        }

        state.owner = Some(me);
        self.waits.lock().owners.insert(slot_id(slot), me);
        drop(state);

        // 构造失败时槽位保持为空，下一次解析会重新尝试
        let _construction = Construction {
            graph: &self.waits,
            slot,
        };
        let instance = construct()?;
        slot.state.lock().instance = Some(instance.clone());
        Ok((instance, Outcome::Constructed))
    }

    pub(crate) fn begin_scope(&self, name: impl Into<String>) -> ScopeId {
        let id = uuid::Uuid::new_v4();
        self.scopes.insert(
            id,
            Arc::new(ScopeCache {
                name: name.into(),
                created_at: Instant::now(),
                slots: DashMap::new(),
            }),
        );
        id
    }

    /// 结束作用域并丢弃其全部实例
    pub(crate) fn end_scope(&self, scope_id: ScopeId) -> Result<usize, ContainerError> {
        let (_, cache) = self
            .scopes
            .remove(&scope_id)
            .ok_or(ContainerError::ScopeNotActive { scope_id })?;
        Ok(Self::filled(&cache.slots))
    }

    pub(crate) fn is_scope_active(&self, scope_id: ScopeId) -> bool {
        self.scopes.contains_key(&scope_id)
    }

    pub(crate) fn scope_info(&self, scope_id: ScopeId) -> Option<ScopeInfo> {
        self.scopes.get(&scope_id).map(|cache| ScopeInfo {
            id: scope_id,
            name: cache.name.clone(),
            created_at: cache.created_at,
            instance_count: Self::filled(&cache.slots),
        })
    }

    pub(crate) fn active_scopes(&self) -> usize {
        self.scopes.len()
    }

    /// 已构造的单例数量，不含延迟代理
    pub(crate) fn singleton_count(&self) -> usize {
        self.singletons
            .iter()
            .filter(|entry| entry.key().kind == SlotKind::Instance && is_filled(entry.value()))
            .count()
    }

    pub(crate) fn has_singleton(&self, identifier: &str) -> bool {
        self.singletons
            .get(&SlotKey::instance(identifier))
            .map(|slot| is_filled(slot.value()))
            .unwrap_or(false)
    }

    /// 丢弃某个标识符的单例（重新绑定时调用）
    pub(crate) fn forget(&self, identifier: &str) {
        self.singletons.remove(&SlotKey::instance(identifier));
        self.singletons.remove(&SlotKey::proxy(identifier));
    }

    pub(crate) fn clear_singletons(&self) {
        self.singletons.clear();
    }

    fn filled(slots: &DashMap<SlotKey, Slot>) -> usize {
        slots.iter().filter(|entry| is_filled(entry.value())).count()
    }
}

fn is_filled(slot: &Slot) -> bool {
    slot.state.lock().instance.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>) -> impl FnOnce() -> Result<Instance, ContainerError> + '_ {
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(n) as Instance)
        }
    }

    #[test]
    fn transient_always_constructs() {
        let manager = LifetimeManager::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let (_, outcome) = manager
                .get_or_create(SlotKey::instance("t"), ServiceLifetime::Transient, None, counting(&counter))
                .unwrap();
            assert_eq!(outcome, Outcome::Constructed);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(manager.singleton_count(), 0);
    }

    #[test]
    fn singleton_constructs_once() {
        let manager = LifetimeManager::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let (first, _) = manager
            .get_or_create(SlotKey::instance("s"), ServiceLifetime::Singleton, None, counting(&counter))
            .unwrap();
        let (second, outcome) = manager
            .get_or_create(SlotKey::instance("s"), ServiceLifetime::Singleton, None, counting(&counter))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(outcome, Outcome::Cached);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(manager.has_singleton("s"));

        manager.forget("s");
        assert!(!manager.has_singleton("s"));
    }

    #[test]
    fn failed_construction_is_retried() {
        let manager = LifetimeManager::new();
        let result = manager.get_or_create(SlotKey::instance("s"), ServiceLifetime::Singleton, None, || {
            Err(ContainerError::not_found("dep"))
        });
        assert!(result.is_err());
        assert!(!manager.has_singleton("s"));

        let counter = Arc::new(AtomicUsize::new(0));
        manager
            .get_or_create(SlotKey::instance("s"), ServiceLifetime::Singleton, None, counting(&counter))
            .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reentering_a_slot_under_construction_fails() {
        let manager = LifetimeManager::new();
        let result = manager.get_or_create(SlotKey::instance("s"), ServiceLifetime::Singleton, None, || {
            manager.get_or_create(SlotKey::instance("s"), ServiceLifetime::Singleton, None, || {
                Ok(Arc::new(()) as Instance)
            })?;
            Ok(Arc::new(()) as Instance)
        });
        match result {
            Err(ContainerError::BindingResolution(BindingResolutionError::CircularDependency { chain })) => {
                assert_eq!(chain, vec!["s", "s"]);
            }
            other => panic!("unexpected result: {:?}", other.map(|(_, outcome)| outcome)),
        }
        assert!(!manager.has_singleton("s"));
        assert!(manager.waits.lock().owners.is_empty());
    }

    #[test]
    fn scoped_instances_are_per_scope_and_dropped_on_end() {
        let manager = LifetimeManager::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let a = manager.begin_scope("request-a");
        let b = manager.begin_scope("request-b");

        let get = |scope| {
            manager
                .get_or_create(SlotKey::instance("r"), ServiceLifetime::Scoped, Some(scope), counting(&counter))
                .unwrap()
                .0
        };
        let a1 = get(a);
        let a2 = get(a);
        let b1 = get(b);
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b1));
        assert_eq!(manager.scope_info(a).unwrap().instance_count, 1);

        assert_eq!(manager.end_scope(a).unwrap(), 1);
        assert!(!manager.is_scope_active(a));
        assert!(matches!(
            manager.get_or_create(SlotKey::instance("r"), ServiceLifetime::Scoped, Some(a), counting(&counter)),
            Err(ContainerError::ScopeNotActive { .. })
        ));
        assert!(matches!(manager.end_scope(a), Err(ContainerError::ScopeNotActive { .. })));
        assert_eq!(manager.active_scopes(), 1);
    }

    #[test]
    fn scoped_without_scope_is_rejected() {
        let manager = LifetimeManager::new();
        let result = manager.get_or_create(SlotKey::instance("r"), ServiceLifetime::Scoped, None, || {
            Ok(Arc::new(()) as Instance)
        });
        assert!(matches!(result, Err(ContainerError::ScopeRequired { .. })));
    }

    #[test]
    fn concurrent_first_access_constructs_once() {
        let manager = Arc::new(LifetimeManager::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = manager.clone();
                let counter = counter.clone();
                std::thread::spawn(move || {
                    manager
                        .get_or_create(SlotKey::instance("shared"), ServiceLifetime::Singleton, None, || {
                            std::thread::sleep(std::time::Duration::from_millis(5));
                            counter.fetch_add(1, Ordering::SeqCst);
                            Ok(Arc::new(()) as Instance)
                        })
                        .unwrap()
                        .0
                })
            })
            .collect();

        let instances: Vec<Instance> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
