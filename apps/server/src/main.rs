use rollcall::kernel::config;
use rollcall_logger::Logger;
use rollcall_server::Server;

#[allow(clippy::print_stderr)]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load();

    let logger = Logger::builder()
        .name(env!("CARGO_PKG_NAME"))
        .env_filter_opt(cfg.logging.filter.as_deref())
        .json(cfg.logging.json)
        .directory_opt(cfg.logging.directory.as_deref())
        .init();
    let _log = match logger {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        },
    };

    config::report(&cfg);

    Server::builder().config(cfg).build().run().await
}
