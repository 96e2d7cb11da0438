use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(author, version, about = "Session-aware chat over uploaded documents", long_about = None)]
pub struct Cli {
    /// Session id; without one every call starts a fresh conversation
    #[arg(short = 's', long, global = true)]
    pub session: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a prompt
    Chat { prompt: String },

    /// Send a prompt with a file attached to this turn only
    ChatFile { prompt: String, file: PathBuf },

    /// Forget the session's conversation link
    Reset,

    /// Show the session's conversation link
    Status,

    /// Chat from stdin until EOF
    Interactive,

    /// Manage the vector store backing file search
    Index {
        #[command(subcommand)]
        action: IndexCommand,
    },
}

#[derive(Subcommand)]
pub enum IndexCommand {
    /// List indexed files
    List,

    /// Upload a file and add it to the index
    Add { file: PathBuf },

    /// Remove a file from the index
    Remove { file_id: String },

    /// Attach an already uploaded file (retry after a failed add)
    Attach { file_id: String },
}
