//! IoC 容器使用示例
//!
//! 演示类描述、单例、作用域、延迟代理以及显式参数构造。
//! 运行：`RUST_LOG=debug cargo run --example container_usage`

use ioc_runtime::logging::{init_logging, LoggingConfig};
use ioc_runtime::{
    measure_performance, ClassDescriptor, ConfigLoader, Container, Lazy, ParameterDescriptor, Parameters, Strategy,
};
use std::sync::Arc;

#[derive(Debug)]
struct Config {
    app_name: String,
}

#[derive(Debug)]
struct Logger {
    app_name: String,
}

impl Logger {
    fn log(&self, message: &str) {
        println!("[{}] {}", self.app_name, message);
    }
}

struct RequestContext {
    path: String,
}

struct ReportGenerator {
    logger: Arc<Logger>,
}

impl ReportGenerator {
    fn generate(&self) -> String {
        self.logger.log("Generating report");
        "monthly report".to_string()
    }
}

struct Controller {
    logger: Arc<Logger>,
    context: Arc<RequestContext>,
    reports: Lazy<ReportGenerator>,
}

fn describe_classes(container: &Container) {
    container.describe(
        ClassDescriptor::new("App\\Logger")
            .param(ParameterDescriptor::class("config", "App\\Config"))
            .construct(|args| {
                let config: Arc<Config> = args.get("config")?;
                Ok(Logger {
                    app_name: config.app_name.clone(),
                })
            }),
    );
    container.describe(
        ClassDescriptor::new("App\\RequestContext")
            .param(ParameterDescriptor::builtin("path", "string").default_value("/".to_string()))
            .construct(|args| Ok(RequestContext { path: args.value("path")? })),
    );
    container.describe(
        ClassDescriptor::new("App\\ReportGenerator")
            .param(ParameterDescriptor::class("logger", "App\\Logger"))
            .construct(|args| {
                let logger: Arc<Logger> = args.get("logger")?;
                logger.log("ReportGenerator constructed");
                Ok(ReportGenerator { logger })
            }),
    );
    container.describe(
        ClassDescriptor::new("App\\Controller")
            .param(ParameterDescriptor::class("logger", "App\\Logger"))
            .param(ParameterDescriptor::class("context", "App\\RequestContext"))
            .param(ParameterDescriptor::class("reports", "App\\ReportGenerator"))
            .construct(|args| {
                Ok(Controller {
                    logger: args.get("logger")?,
                    context: args.get("context")?,
                    reports: args.lazy("reports")?,
                })
            }),
    );
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::development());

    println!("1️⃣ 从配置构建容器");
    let config = ConfigLoader::new().load_str(
        r#"
        singletons = ["App\\Logger"]
        lazy = ["App\\ReportGenerator"]

        [[services]]
        identifier = "App\\ReportGenerator"
        lifetime = "singleton"
        "#,
    )?;
    let container = Container::from_config(&config);
    describe_classes(&container);

    println!("2️⃣ 注册配置值与日志服务");
    container.instance(
        "App\\Config",
        Config {
            app_name: "ioc-demo".to_string(),
        },
    );
    container.bind("App\\Logger", "App\\Logger");
    container.scoped_self("App\\RequestContext");
    container.bind("greeting", Strategy::factory(|resolution, _| {
        let config = resolution.get_as::<Config>("App\\Config")?;
        Ok(format!("Hello from {}", config.app_name))
    }));
    println!("   {}", container.get_as::<String>("greeting")?);

    println!("3️⃣ 在请求作用域内解析控制器");
    let scope = container.begin_scope_named("GET /reports");
    let controller = measure_performance!("resolve_controller", { scope.get_as::<Controller>("App\\Controller")? });
    controller.logger.log(&format!("Handling {}", controller.context.path));
    println!("   报表生成器已加载: {}", controller.reports.is_loaded());
    println!("   {}", controller.reports.with(|reports| reports.generate())?);
    println!("   报表生成器已加载: {}", controller.reports.is_loaded());
    println!("   作用域内实例数: {}", scope.end()?);

    println!("4️⃣ 显式参数构造");
    let context = container.make_with(
        "App\\RequestContext",
        &Parameters::new().with("path", "/admin".to_string()),
    )?;
    if let Ok(context) = context.downcast::<RequestContext>() {
        println!("   path = {}", context.path);
    }

    println!("5️⃣ 错误处理");
    match container.get("App\\Loger") {
        Ok(_) => println!("   unexpected success"),
        Err(err) => println!("   {}", err),
    }

    let stats = container.stats();
    println!("\n📊 {}", stats.performance_summary());
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
