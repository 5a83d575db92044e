use anyhow::Result;
use clap::Parser;
use log::info;
use log4rs::config::Deserializers;
use lurk_admin::config::LurkConfig;
use lurk_admin::server::LurkServer;

#[tokio::main]
async fn main() -> Result<()> {
    let config = LurkConfig::parse();

    // Initialize logging. Falls back to a permissive stderr logger when no
    // log4rs config file is present, so a fresh checkout still logs something.
    if log4rs::init_file(config.log4rs_config_path(), Deserializers::default()).is_err() {
        env_logger_fallback();
    }

    info!("lurk-admin starting: socks5={}, mng={}", config.socks5_bind_addr(), config.mng_bind_addr());

    let server = LurkServer::new(&config)?;
    server.run().await?;

    Ok(())
}

fn env_logger_fallback() {
    use log::LevelFilter;
    use log4rs::{
        append::console::ConsoleAppender,
        config::{Appender, Config, Root},
    };

    let stdout = ConsoleAppender::builder().build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .expect("default logging config should be valid");

    log4rs::init_config(config).expect("default logging config should initialize");
}
