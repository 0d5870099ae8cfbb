use std::sync::{Arc, OnceLock};

use rewire_config::ArrayLoader;
use rewire_di::{ClassDefinition, ClassRegistry, Container, DynError, Reflection};
use serde_json::json;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<(), DynError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let reflection: Arc<dyn Reflection> = Arc::new(registry());
    let loader = match std::env::args().nth(1) {
        Some(path) => ArrayLoader::from_path(path, reflection)?,
        None => ArrayLoader::new(default_document(), reflection),
    };

    let mut container = Container::new(&loader)?;
    if let Err(errors) = container.validate() {
        eprintln!("{errors}");
    }

    let names = container
        .configuration()
        .names()
        .map(str::to_string)
        .collect::<Vec<_>>();
    for name in names {
        match container.get(&name) {
            Ok(instance) => println!("{name}: {instance:?}"),
            Err(e) => eprintln!("{name}: {e}"),
        }
    }

    let mailer = container.get_as::<Mailer>("mailer")?;
    mailer.send("ops@example.org", "Container is up");

    let fallback = container.get_as::<Mailer>("fallbackMailer")?;
    fallback.send("ops@example.org", "Fallback mailer shares the transport");

    Ok(())
}

fn default_document() -> serde_json::Value {
    json!({
        "dependencies": {
            "logger": {
                "class": "Logger",
                "constructorInjection": {"prefix": "[mail]"}
            },
            "transport": {
                "class": "Transport",
                "constructorInjection": ["localhost", 25]
            },
            "mailer": {
                "class": "Mailer",
                "factory": {
                    "class": "MailerFactory",
                    "method": "create",
                    "methodArgs": ["@transport"]
                },
                "setterInjection": {"setLogger": ["@logger"]}
            },
            "fallbackMailer": {
                "class": "Mailer",
                "constructorInjection": {"transport": "@transport"}
            }
        }
    })
}

fn registry() -> ClassRegistry {
    ClassRegistry::new()
        .register(
            ClassDefinition::<Logger>::new("Logger").constructor(&["prefix"], |args| {
                Ok(Logger {
                    prefix: args.string(0)?,
                })
            }),
        )
        .register(
            ClassDefinition::<Transport>::new("Transport").constructor(
                &["host", "port"],
                |args| {
                    Ok(Transport {
                        host: args.string(0)?,
                        port: args.int(1)?,
                    })
                },
            ),
        )
        .register(
            ClassDefinition::<Mailer>::new("Mailer")
                .constructor(&["transport"], |args| Ok(Mailer::new(args.instance(0)?)))
                .method("setLogger", &["logger"], |mailer, args| {
                    // Ignoring a second logger keeps the first one
                    let _ = mailer.logger.set(args.instance(0)?);
                    Ok(())
                }),
        )
        .register(
            ClassDefinition::<MailerFactory>::with_default("MailerFactory").static_method(
                "create",
                &["transport"],
                |args| Ok(Mailer::new(args.instance(0)?)),
            ),
        )
}

#[derive(Debug)]
struct Logger {
    prefix: String,
}

#[derive(Debug)]
struct Transport {
    host: String,
    port: i64,
}

#[derive(Debug)]
struct Mailer {
    transport: Arc<Transport>,
    logger: OnceLock<Arc<Logger>>,
}

impl Mailer {
    fn new(transport: Arc<Transport>) -> Self {
        Self {
            transport,
            logger: OnceLock::new(),
        }
    }

    fn send(&self, to: &str, subject: &str) {
        let prefix = self.logger.get().map_or("", |logger| logger.prefix.as_str());
        println!(
            "{prefix} Sending '{subject}' to {to} via {}:{}",
            self.transport.host, self.transport.port
        );
    }
}

#[derive(Default)]
struct MailerFactory;
