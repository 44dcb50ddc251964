//! REPL (Read-Eval-Print Loop) for interactive chat

use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};

use conductor_application::Conductor;

use crate::ConsoleFormatter;

/// Interactive chat REPL over a [`Conductor`].
pub struct ChatRepl {
    conductor: Conductor,
    model_label: String,
}

impl ChatRepl {
    pub fn new(conductor: Conductor, model_label: impl Into<String>) -> Self {
        Self {
            conductor,
            model_label: model_label.into(),
        }
    }

    /// Run the interactive REPL until EOF or `/quit`.
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = dirs::data_dir().map(|p| p.join("conductor").join("repl_history.txt"));
        if let Some(path) = &history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline(">>> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    let _ = rl.add_history_entry(line);
                    self.process_query(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(path) = &history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    async fn process_query(&mut self, query: &str) {
        match self.conductor.ask(query).await {
            Ok(answer) => ConsoleFormatter::print_answer(&answer),
            Err(error) => ConsoleFormatter::print_error(&error),
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("Conductor chat — model: {}", self.model_label);
        println!("Type /help for commands, /quit to exit.");
        println!();
    }

    /// Handle slash commands. Returns true if the REPL should exit.
    fn handle_command(&self, cmd: &str) -> bool {
        match cmd {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                true
            }
            "/help" | "/h" | "/?" => {
                println!();
                println!("Commands:");
                println!("  /help, /h, /?   - Show this help");
                println!("  /tools          - List resolvable tools");
                println!("  /last           - Show the last query's subtasks");
                println!("  /quit, /q       - Exit chat");
                println!();
                false
            }
            "/tools" => {
                for name in self.conductor.symbols().names() {
                    println!("  {}", name);
                }
                false
            }
            "/last" => {
                match self.conductor.history().current() {
                    Some(entry) => ConsoleFormatter::print_entry_summary(entry),
                    None => println!("No queries yet."),
                }
                false
            }
            other => {
                println!("Unknown command: {} (try /help)", other);
                false
            }
        }
    }
}
