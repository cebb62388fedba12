//! 服务扫描结果的接入
//!
//! 扫描器（或配置文件）产出一组服务定义，容器按定义注册绑定：
//! 有生命周期提示的按提示注册，没有的走 `bind`（参考配置元数据）。

use crate::container::{Container, ServiceLifetime, Strategy};
use serde::{Deserialize, Serialize};

/// 一条服务定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub identifier: String,
    /// 实现类；缺省时标识符本身就是类名
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub lifetime: Option<ServiceLifetime>,
    /// 别名，解析时转到 `identifier` 的绑定
    #[serde(default)]
    pub alias: Option<String>,
}

impl ServiceDefinition {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            class: None,
            lifetime: None,
            alias: None,
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn lifetime(mut self, lifetime: ServiceLifetime) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// 注册到容器，返回注册的绑定数量
    pub(crate) fn register_into(self, container: &Container) -> usize {
        let strategy = Strategy::class(self.class.as_deref().unwrap_or(&self.identifier));
        match self.lifetime {
            Some(lifetime) => container.register(self.identifier.clone(), strategy, lifetime),
            None => container.bind(self.identifier.clone(), strategy),
        }

        match self.alias {
            Some(alias) => {
                tracing::debug!(alias = %alias, target = %self.identifier, "service alias registered");
                container.bind(alias, Strategy::class(self.identifier));
                2
            }
            None => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ClassDescriptor;
    use std::sync::Arc;

    struct Repository;

    #[test]
    fn definitions_register_bindings_and_aliases() {
        let container = Container::new();
        container.describe(ClassDescriptor::new("App\\Repository").no_params().construct(|_| Ok(Repository)));

        let registered = container.register_scanned(vec![
            ServiceDefinition::new("App\\Repository")
                .lifetime(ServiceLifetime::Singleton)
                .alias("repository"),
            ServiceDefinition::new("App\\Contracts\\Repository").class("App\\Repository"),
        ]);
        assert_eq!(registered, 3);
        assert_eq!(
            container.identifiers(),
            vec!["App\\Contracts\\Repository", "App\\Repository", "repository"]
        );

        let direct = container.get("App\\Repository").unwrap();
        let aliased = container.get("repository").unwrap();
        let contract = container.get("App\\Contracts\\Repository").unwrap();
        assert!(Arc::ptr_eq(&direct, &aliased));
        assert!(Arc::ptr_eq(&direct, &contract));
        assert_eq!(
            container.binding("App\\Contracts\\Repository").unwrap().lifetime,
            ServiceLifetime::Transient
        );
    }

    #[test]
    fn definitions_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            services: Vec<ServiceDefinition>,
        }

        let wrapper: Wrapper = toml::from_str(
            r#"
            [[services]]
            identifier = "App\\Mailer"
            lifetime = "scoped"

            [[services]]
            identifier = "App\\Clock"
            alias = "clock"
            "#,
        )
        .unwrap();

        assert_eq!(
            wrapper.services[0],
            ServiceDefinition::new("App\\Mailer").lifetime(ServiceLifetime::Scoped)
        );
        assert_eq!(wrapper.services[1], ServiceDefinition::new("App\\Clock").alias("clock"));
    }
}
