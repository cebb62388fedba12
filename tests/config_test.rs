//! 从配置文件构建容器

use ioc_runtime::{ClassDescriptor, ConfigLoader, Container, ServiceLifetime};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const CONFIG: &str = r#"
max_depth = 8
argument_cache_capacity = 32
singletons = ["App\\Clock"]
lazy = ["App\\Mailer", "App\\Queue"]
eager = ["App\\Queue"]

[[services]]
identifier = "App\\Mailer"
lifetime = "singleton"
alias = "mailer"

[[services]]
identifier = "App\\Queue"
lifetime = "scoped"
"#;

struct Clock;
struct Mailer;
struct Queue;

fn describe(container: &Container) {
    container.describe(ClassDescriptor::new("App\\Clock").no_params().construct(|_| Ok(Clock)));
    container.describe(ClassDescriptor::new("App\\Mailer").no_params().construct(|_| Ok(Mailer)));
    container.describe(ClassDescriptor::new("App\\Queue").no_params().construct(|_| Ok(Queue)));
}

#[test]
fn test_container_from_config_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("container.toml");
    fs::write(&path, CONFIG)?;

    let config = ConfigLoader::with_env(HashMap::new()).load_file(&path)?;
    let container = Container::from_config(&config);
    describe(&container);

    assert_eq!(container.identifiers(), vec!["App\\Mailer", "App\\Queue", "mailer"]);

    // 服务定义带来的绑定
    let mailer = container.binding("App\\Mailer").unwrap();
    assert_eq!(mailer.lifetime, ServiceLifetime::Singleton);
    assert!(mailer.lazy);
    let queue = container.binding("App\\Queue").unwrap();
    assert_eq!(queue.lifetime, ServiceLifetime::Scoped);
    assert!(!queue.lazy);

    // 元数据声明为单例的标识符，bind 时按单例注册
    container.bind("App\\Clock", "App\\Clock");
    let first = container.get("App\\Clock")?;
    let second = container.get("App\\Clock")?;
    assert!(Arc::ptr_eq(&first, &second));

    let via_alias = container.get_as::<Mailer>("mailer")?;
    let direct = container.get_as::<Mailer>("App\\Mailer")?;
    assert!(Arc::ptr_eq(&via_alias, &direct));
    assert!(container.has_singleton("App\\Mailer"));

    let scope = container.begin_scope();
    scope.get_as::<Queue>("App\\Queue")?;
    assert_eq!(scope.end()?, 1);
    Ok(())
}

#[test]
fn test_environment_overrides_config() -> anyhow::Result<()> {
    let env = HashMap::from([("IOC_MAX_DEPTH".to_string(), "2".to_string())]);
    let config = ConfigLoader::with_env(env).load_str(CONFIG)?;
    assert_eq!(config.max_depth, 2);
    assert_eq!(config.argument_cache_capacity, 32);

    let container = Container::from_config(&config);
    container.describe(
        ClassDescriptor::new("A")
            .param(ioc_runtime::ParameterDescriptor::class("b", "B"))
            .construct(|_| Ok(())),
    );
    container.describe(
        ClassDescriptor::new("B")
            .param(ioc_runtime::ParameterDescriptor::class("c", "C"))
            .construct(|_| Ok(())),
    );
    container.describe(ClassDescriptor::new("C").no_params().construct(|_| Ok(())));

    let err = container.get("A").unwrap_err();
    assert!(err.is_binding_resolution());
    assert!(err.to_string().contains("Maximum resolution depth of 2"));
    Ok(())
}
