//! sharepoint-adapter command-line entry point

use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use sharepoint_adapter::adapter::SharepointAdapter;
use sharepoint_adapter::config::Config;
use sharepoint_adapter::connector::SharepointConnector;
use sharepoint_adapter::filesystem::{FilesystemAdapter, Options, StorageAttributes};

/// Print usage information
fn print_usage() {
    eprintln!("Usage: sharepoint-adapter <config.yaml> <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  ls [path] [--deep]           List a directory");
    eprintln!("  cat <path>                   Print a file to stdout");
    eprintln!("  put <local> <remote> [mime]  Upload a local file");
    eprintln!("  rm <path>                    Delete a file");
    eprintln!("  rmdir <path>                 Delete a directory and its contents");
    eprintln!("  mkdir <path>                 Create a directory and its parents");
    eprintln!("  mv <from> <to>               Move a file");
    eprintln!("  cp <from> <to>               Copy a file");
    eprintln!("  stat <path>                  Show file metadata");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  sharepoint-adapter /etc/sharepoint.yaml ls /reports --deep");
}

/// Parsed command line
enum Command {
    List { path: String, deep: bool },
    Cat { path: String },
    Put { local: PathBuf, remote: String, mime_type: Option<String> },
    Remove { path: String },
    RemoveDir { path: String },
    MakeDir { path: String },
    Move { from: String, to: String },
    Copy { from: String, to: String },
    Stat { path: String },
}

impl Command {
    fn parse(args: &[String]) -> Option<Self> {
        let (name, rest) = args.split_first()?;
        let arg = |i: usize| rest.get(i).cloned();

        let command = match (name.as_str(), rest.len()) {
            ("ls", 0..=2) => {
                let deep = rest.iter().any(|a| a == "--deep");
                let path = rest
                    .iter()
                    .find(|a| *a != "--deep")
                    .cloned()
                    .unwrap_or_else(|| "/".to_string());
                Command::List { path, deep }
            }
            ("cat", 1) => Command::Cat { path: arg(0)? },
            ("put", 2..=3) => Command::Put {
                local: PathBuf::from(arg(0)?),
                remote: arg(1)?,
                mime_type: arg(2),
            },
            ("rm", 1) => Command::Remove { path: arg(0)? },
            ("rmdir", 1) => Command::RemoveDir { path: arg(0)? },
            ("mkdir", 1) => Command::MakeDir { path: arg(0)? },
            ("mv", 2) => Command::Move { from: arg(0)?, to: arg(1)? },
            ("cp", 2) => Command::Copy { from: arg(0)?, to: arg(1)? },
            ("stat", 1) => Command::Stat { path: arg(0)? },
            _ => return None,
        };

        Some(command)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        print_usage();
        std::process::exit(1);
    }

    let config_path = PathBuf::from(&args[1]);
    let command = match Command::parse(&args[2..]) {
        Some(c) => c,
        None => {
            print_usage();
            std::process::exit(1);
        }
    };

    let config = match Config::from_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Loaded configuration from {:?}", config_path);

    let connector = SharepointConnector::connect(&config.connector).await?;
    let adapter = SharepointAdapter::new(Arc::new(connector), &config.prefix);
    debug!("adapter rooted at {}", adapter.prefix());

    run(&adapter, command).await
}

async fn run(adapter: &SharepointAdapter, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::List { path, deep } => {
            let mut listing = adapter.list_contents(&path, deep);
            while let Some(entry) = listing.next().await {
                print_entry(&entry?);
            }
        }
        Command::Cat { path } => {
            let mut stream = adapter.read_stream(&path).await?;
            let mut stdout = tokio::io::stdout();
            while let Some(chunk) = stream.next().await {
                stdout.write_all(&chunk?).await?;
            }
            stdout.flush().await?;
        }
        Command::Put { local, remote, mime_type } => {
            let contents = tokio::fs::read(&local).await?;
            let mut options = Options::new();
            if let Some(mime_type) = mime_type {
                options = options.with(Options::MIME_TYPE, mime_type);
            }
            adapter.write(&remote, &contents, &options).await?;
            info!("uploaded {:?} to {} ({} bytes)", local, remote, contents.len());
        }
        Command::Remove { path } => adapter.delete(&path).await?,
        Command::RemoveDir { path } => adapter.delete_directory(&path).await?,
        Command::MakeDir { path } => adapter.create_directory(&path, &Options::new()).await?,
        Command::Move { from, to } => adapter.move_file(&from, &to, &Options::new()).await?,
        Command::Copy { from, to } => adapter.copy_file(&from, &to, &Options::new()).await?,
        Command::Stat { path } => {
            if !adapter.file_exists(&path).await? {
                eprintln!("{}: no such file", path);
                std::process::exit(1);
            }
            let size = adapter.file_size(&path).await?;
            let mime = adapter.mime_type(&path).await?;
            let modified = adapter.last_modified(&path).await?;
            println!("path:          {}", path);
            println!("size:          {}", size.file_size.unwrap_or_default());
            println!("mime type:     {}", mime.mime_type.unwrap_or_default());
            println!("last modified: {}", format_timestamp(modified.last_modified));
        }
    }

    Ok(())
}

fn print_entry(entry: &StorageAttributes) {
    match entry {
        StorageAttributes::Directory(dir) => {
            println!("d {:>12} {} {}/", "-", format_timestamp(dir.last_modified), dir.path);
        }
        StorageAttributes::File(file) => {
            println!(
                "- {:>12} {} {}",
                file.file_size.unwrap_or_default(),
                format_timestamp(file.last_modified),
                file.path
            );
        }
    }
}

fn format_timestamp(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|t| chrono::DateTime::from_timestamp(t, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}
