use std::path::PathBuf;

use clap::{Parser, Subcommand};

use barnacle_agent::{Agent, Config, init_logger_with_file, print_banner};

#[derive(Parser)]
#[command(name = "barnacle-agent", version, about = "Barnacle IoT gateway agent")]
struct Cli {
    /// Set the user config file path (TOML)
    #[arg(short = 'C', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the long-lived agent service (default)
    Run,
    /// Register a component with the cloud, then exit
    Register {
        /// Component name
        name: String,
        /// Mark the component as part of the domain catalog
        #[arg(long)]
        cataloged: bool,
    },
    /// Clear the local component catalog
    ResetComponents,
    /// Print the local component catalog
    Catalog,
}

#[tokio::main]
async fn main() {
    // 1. 设置环境 (dotenv)
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // 2. 加载配置 (坏的用户配置路径是一般性启动错误，退出码 1)
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("barnacle-agent: {e}");
            std::process::exit(e.exit_code());
        }
    };

    // 3. 初始化日志
    init_logger_with_file(config.log_level.as_deref(), config.log_dir.as_deref());

    let command = cli.command.unwrap_or(Command::Run);
    let agent = Agent::new(config);

    // 4. 分发: 常驻服务或一次性批处理
    let result = match command {
        Command::Run => {
            print_banner();
            tracing::info!("Barnacle agent starting...");
            agent.run_service().await
        }
        Command::Register { name, cataloged } => agent.run_register(&name, cataloged).await,
        Command::ResetComponents => agent.run_reset(),
        Command::Catalog => agent.run_catalog(),
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(e.exit_code());
    }
}
