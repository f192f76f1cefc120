use anyhow::Result;
use clap::Parser;
use fish_flashcards::{logger, App, Cli, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    logger::init(cli.verbose || config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run(&cli.command).await?;

    Ok(())
}
