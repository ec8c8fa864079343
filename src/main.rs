use std::path::PathBuf;

use clap::Parser;
use dnovo_db::{app::catalog, start_repl, Database, FileStore, MemoryStore};
use log::info;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optional name to show in the prompt
    name: Option<String>,

    /// Optionally, sets the directory the database is stored in
    #[arg(short, long, value_name = "DIR")]
    file: Option<PathBuf>,

    /// Keep everything in memory, nothing is written to disk
    #[arg(long, conflicts_with = "file")]
    memory: bool,

    /// Conversation to open on start, like following `chat.html?conversa=<ID>`
    #[arg(long, value_name = "ID")]
    conversa: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let name = cli.name.unwrap_or("db".into());

    if cli.memory {
        info!("using in-memory storage");
        let db = Database::open(MemoryStore::new(), catalog())?;
        start_repl(name, db, cli.conversa)?;
    } else {
        let path = cli.file.unwrap_or("/tmp/dnovo-db".into());
        info!("using storage directory {}", path.display());
        let db = Database::open(FileStore::open(path)?, catalog())?;
        start_repl(name, db, cli.conversa)?;
    }

    Ok(())
}
