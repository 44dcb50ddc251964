//! Console output formatting

use colored::Colorize;

use conductor_domain::HistoryEntry;

/// Formats final answers and diagnostics for the terminal.
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn print_answer(answer: &str) {
        println!();
        println!("{}", answer);
        println!();
    }

    pub fn print_error(error: &dyn std::error::Error) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }

    /// One-line-per-subtask summary of the last query, shown with `-vv`
    /// style verbosity or the `/last` REPL command.
    pub fn print_entry_summary(entry: &HistoryEntry) {
        println!("{} {}", "Query:".bold(), entry.user_query);
        if entry.tasks.is_empty() {
            println!("  (direct response, no subtasks)");
        }
        for task in &entry.tasks {
            println!("  {} {}", "task:".cyan(), task.query);
            println!("    {} {}", "result:".dimmed(), task.result);
            for invocation in &task.tool_results {
                println!(
                    "    {} {}({}) -> {}",
                    "tool:".dimmed(),
                    invocation.tool,
                    invocation.args,
                    invocation.result
                );
            }
        }
    }
}
