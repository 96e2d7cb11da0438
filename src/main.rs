use anyhow::Result;
use clap::Parser;
use docchat::cli::{Cli, Commands, IndexCommand};
use docchat::{utils, ChatResult, ChatService, FileSystemSessionStore, FileUpload, SessionContext, Settings};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::new()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let store = Arc::new(
        FileSystemSessionStore::new(PathBuf::from(&settings.sessions.storage_dir)).await?,
    );
    let service = match ChatService::from_settings(&settings, store) {
        Ok(service) => service,
        Err(e) => {
            utils::print_error(&e);
            std::process::exit(2);
        }
    };

    let session = cli.session.map(SessionContext::new).unwrap_or_default();

    let result = match cli.command {
        Commands::Chat { prompt } => handle_chat(&service, &session, &prompt).await,
        Commands::ChatFile { prompt, file } => {
            handle_chat_file(&service, &session, &prompt, &file).await
        }
        Commands::Reset => handle_reset(&service, &session).await,
        Commands::Status => handle_status(&service, &session).await,
        Commands::Interactive => handle_interactive(&service, session).await,
        Commands::Index { action } => handle_index(&service, action).await,
    };

    if let Err(e) = result {
        utils::print_error(&e);
        std::process::exit(1);
    }
    Ok(())
}

async fn read_upload(path: &Path) -> ChatResult<FileUpload> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        docchat::ChatError::Validation(format!("cannot read {}: {}", path.display(), e))
    })?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string);
    Ok(FileUpload::new(bytes, filename))
}

async fn handle_chat(service: &ChatService, session: &SessionContext, prompt: &str) -> ChatResult<()> {
    let answer = service.chat(session, prompt).await?;
    utils::print_answer(&answer);
    Ok(())
}

async fn handle_chat_file(
    service: &ChatService,
    session: &SessionContext,
    prompt: &str,
    file: &Path,
) -> ChatResult<()> {
    let upload = read_upload(file).await?;
    let answer = service.chat_with_file(session, prompt, &upload).await?;
    utils::print_answer(&answer);
    Ok(())
}

async fn handle_reset(service: &ChatService, session: &SessionContext) -> ChatResult<()> {
    service.reset_conversation(session).await?;
    utils::print_success("Conversation link cleared");
    Ok(())
}

async fn handle_status(service: &ChatService, session: &SessionContext) -> ChatResult<()> {
    let status = service.status(session).await?;
    utils::print_status(&status);
    Ok(())
}

async fn handle_interactive(service: &ChatService, session: SessionContext) -> ChatResult<()> {
    let session = if session.id().is_some() {
        session
    } else {
        SessionContext::new("interactive")
    };

    utils::print_header("Interactive Mode");
    utils::print_info(&format!(
        "Session: {} ({})",
        session.id().unwrap_or_default(),
        service.mode().as_str()
    ));
    utils::print_info("Commands: /reset, /status, /help. Ctrl+D to exit\n");

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        utils::print_prompt("You: ");
        let Ok(Some(line)) = lines.next_line().await else {
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let outcome = match input {
            "/reset" => handle_reset(service, &session).await,
            "/status" => handle_status(service, &session).await,
            "/help" => {
                println!("  /reset   - start a new conversation");
                println!("  /status  - show the conversation link");
                println!("  Ctrl+D   - exit\n");
                Ok(())
            }
            prompt => handle_chat(service, &session, prompt).await,
        };

        // keep the loop alive on per-turn failures
        if let Err(e) = outcome {
            utils::print_error(&e);
        }
    }

    Ok(())
}

async fn handle_index(service: &ChatService, action: IndexCommand) -> ChatResult<()> {
    match action {
        IndexCommand::List => {
            let entries = service.list_index_files().await?;
            utils::print_index_entries(&entries);
        }
        IndexCommand::Add { file } => {
            let upload = read_upload(&file).await?;
            let uploaded = service.add_index_file(&upload).await?;
            utils::print_success(&format!(
                "Indexed {} as {}",
                uploaded.filename, uploaded.file_id
            ));
        }
        IndexCommand::Remove { file_id } => {
            service.remove_index_file(&file_id).await?;
            utils::print_success(&format!("Removed {} from the index", file_id));
        }
        IndexCommand::Attach { file_id } => {
            service.attach_index_file(&file_id).await?;
            utils::print_success(&format!("Attached {} to the index", file_id));
        }
    }
    Ok(())
}
