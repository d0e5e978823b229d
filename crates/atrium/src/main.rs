mod builtin;

use clap::{Parser, Subcommand};
use log::{error, info};
use tokio_util::sync::CancellationToken;

use atrium_core::kernel::constants;
use atrium_core::PluginService;

/// Atrium: a plugin-hosting server core
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage plugins
    Plugin {
        #[command(subcommand)]
        command: PluginCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PluginCommand {
    /// List plugins known to the service and their state
    List {},
}

fn build_service() -> Result<PluginService, atrium_core::KernelError> {
    let host_version = constants::HOST_VERSION
        .parse()
        .map_err(|e| atrium_core::KernelError::Init(format!("bad HOST_VERSION constant: {}", e)))?;
    let service = PluginService::with_candidates(host_version, builtin::factory(), builtin::core_candidates())?;
    Ok(service)
}

#[tokio::main]
async fn main() {
    env_logger::init();
    println!("{} v{}", constants::APP_NAME, constants::APP_VERSION);

    let args = CliArgs::parse();

    let service = match build_service() {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Failed to construct the plugin service: {}", e);
            return;
        }
    };

    let cancel = CancellationToken::new();

    if let Err(e) = service.setup(&cancel).await {
        error!("Plugin setup failed: {}", e);
        eprintln!("Startup aborted: {}", e);
        return;
    }
    if let Err(e) = service.start(&cancel).await {
        error!("Plugin start failed: {}", e);
        eprintln!("Startup aborted: {}", e);
        return;
    }

    match args.command {
        Some(Commands::Plugin { command }) => match command {
            PluginCommand::List {} => {
                let mut plugins = service.get_plugins();
                plugins.sort_by(|a, b| a.id().cmp(b.id()));
                if plugins.is_empty() {
                    println!("  No plugins loaded.");
                } else {
                    for instance in plugins {
                        println!(
                            "  - {} v{} [{}]",
                            instance.id(),
                            instance.version().unwrap_or("?"),
                            instance.state()
                        );
                    }
                }
            }
        },
        None => {
            info!("All plugins enabled; running...");
            tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
        }
    }

    service.stop(&cancel).await;
    info!("Shutdown complete");
}
