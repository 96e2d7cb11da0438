use crate::continuity::ConversationStatus;
use crate::core::remote::IndexEntry;
use crate::error::ChatError;
use colored::*;
use std::io::Write;

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.len()).bright_cyan());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_prompt(text: &str) {
    print!("{}", text.yellow().bold());
    let _ = std::io::stdout().flush();
}

pub fn print_answer(answer: &str) {
    println!("{}\n", answer);
}

pub fn print_status(status: &ConversationStatus) {
    println!("{} {}", "strategy:".bold(), status.strategy.as_str());
    match &status.token {
        Some(token) => println!("{} {}", "linked:".bold(), token.green()),
        None => println!("{} {}", "linked:".bold(), "no".dimmed()),
    }
    if let Some(entries) = status.history_entries {
        println!("{} {} entries (shared by all sessions)", "history:".bold(), entries);
    }
}

pub fn print_index_entries(entries: &[IndexEntry]) {
    if entries.is_empty() {
        print_info("Index is empty");
        return;
    }
    for entry in entries {
        println!("{}  {}", entry.file_id.cyan(), entry.filename);
    }
}

pub fn print_error(err: &ChatError) {
    eprintln!(
        "{} {}",
        format!("[{:?}]", err.kind()).red().bold(),
        err.to_string().red()
    );
    if let Some(file_id) = err.orphaned_file_id() {
        eprintln!(
            "{}",
            format!("Retry the attach step with: docchat index attach {}", file_id).yellow()
        );
    }
}
