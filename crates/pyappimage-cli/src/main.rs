mod commands;

use clap::{CommandFactory, Parser, Subcommand};

const LICENSE: &str = include_str!("../assets/LICENSE");

#[derive(Parser)]
#[command(
    name = "pyappimage",
    about = "PyAppImage: A command line interface to create Python AppImages"
)]
#[command(version)]
struct Cli {
    /// Print the license and exit
    #[arg(long, visible_alias = "lic")]
    license: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a Python AppImage from the project in the current directory
    Build {
        /// Overwrite existing build directories without asking
        #[arg(long, short = 'f', visible_alias = "always-confirm")]
        force: bool,
    },
    /// Write a starter pyappimage.json
    Init,
    /// Eject the desktop entry and AppRun templates for manual customization
    Eject,
    /// Check python, pip, PyInstaller, FUSE, and appimagetool
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.license {
        print!("{LICENSE}");
        return Ok(());
    }

    match cli.command {
        Some(Commands::Build { force }) => commands::build(force).await?,
        Some(Commands::Init) => commands::init_project().await?,
        Some(Commands::Eject) => commands::eject().await?,
        Some(Commands::Doctor) => commands::doctor().await?,
        None => {
            Cli::command().print_help()?;
            std::process::exit(2);
        }
    }

    Ok(())
}
