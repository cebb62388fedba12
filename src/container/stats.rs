use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// 内部容器统计信息（原子计数器）
#[derive(Default)]
pub(crate) struct InnerStats {
    total_resolutions: AtomicU64,
    singleton_cache_hits: AtomicU64,
    singleton_cache_misses: AtomicU64,
    scoped_cache_hits: AtomicU64,
    scoped_creations: AtomicU64,
    transient_creations: AtomicU64,
    autowired_creations: AtomicU64,
    proxies_created: AtomicU64,
    proxies_loaded: AtomicU64,
    failed_resolutions: AtomicU64,
}

macro_rules! bump {
    ($($name:ident => $field:ident),* $(,)?) => {
        $(
            pub(crate) fn $name(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl InnerStats {
    bump! {
        record_resolution => total_resolutions,
        record_singleton_hit => singleton_cache_hits,
        record_singleton_miss => singleton_cache_misses,
        record_scoped_hit => scoped_cache_hits,
        record_scoped_creation => scoped_creations,
        record_transient_creation => transient_creations,
        record_autowired_creation => autowired_creations,
        record_proxy_created => proxies_created,
        record_proxy_loaded => proxies_loaded,
        record_failure => failed_resolutions,
    }

    pub(crate) fn snapshot(&self) -> ContainerStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        ContainerStats {
            total_resolutions: load(&self.total_resolutions),
            singleton_cache_hits: load(&self.singleton_cache_hits),
            singleton_cache_misses: load(&self.singleton_cache_misses),
            scoped_cache_hits: load(&self.scoped_cache_hits),
            scoped_creations: load(&self.scoped_creations),
            transient_creations: load(&self.transient_creations),
            autowired_creations: load(&self.autowired_creations),
            proxies_created: load(&self.proxies_created),
            proxies_loaded: load(&self.proxies_loaded),
            failed_resolutions: load(&self.failed_resolutions),
            ..ContainerStats::default()
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.total_resolutions,
            &self.singleton_cache_hits,
            &self.singleton_cache_misses,
            &self.scoped_cache_hits,
            &self.scoped_creations,
            &self.transient_creations,
            &self.autowired_creations,
            &self.proxies_created,
            &self.proxies_loaded,
            &self.failed_resolutions,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContainerStats {
    /// 顶层与嵌套解析的总次数
    pub total_resolutions: u64,
    pub singleton_cache_hits: u64,
    pub singleton_cache_misses: u64,
    pub scoped_cache_hits: u64,
    pub scoped_creations: u64,
    pub transient_creations: u64,
    /// 没有绑定、直接按类描述构造的次数
    pub autowired_creations: u64,
    pub proxies_created: u64,
    pub proxies_loaded: u64,
    pub failed_resolutions: u64,
    pub registered_bindings: usize,
    pub active_singletons: usize,
    pub active_scopes: usize,
    pub cached_descriptors: usize,
    pub cached_argument_plans: usize,
    pub argument_plan_hits: u64,
    pub argument_plan_misses: u64,
    pub argument_plan_evictions: u64,
}

impl ContainerStats {
    /// 单例缓存命中率（小数形式）
    pub fn hit_rate(&self) -> f64 {
        let total = self.singleton_cache_hits + self.singleton_cache_misses;
        if total == 0 {
            0.0
        } else {
            self.singleton_cache_hits as f64 / total as f64
        }
    }

    pub fn performance_summary(&self) -> String {
        format!(
            "Container Performance: {} total resolutions, {:.1}% cache hit rate, {} registered bindings, {} active singletons, {} active scopes",
            self.total_resolutions,
            self.hit_rate() * 100.0,
            self.registered_bindings,
            self.active_singletons,
            self.active_scopes
        )
    }
}
