//! Status reporting for pipeline execution

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use conductor_application::ports::status::StatusSink;
use conductor_domain::{StatusUpdate, TaskState};

/// Reports task status with spinners, one per running task.
pub struct StatusReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl StatusReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap()
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for StatusReporter {
    fn on_status(&self, update: &StatusUpdate) {
        let mut bars = self.bars.lock().unwrap();
        match update.state {
            TaskState::Pending => {
                let label = match update.progress {
                    Some(progress) => format!("{} [{}%]", update.message, progress),
                    None => update.message.clone(),
                };
                self.multi
                    .println(format!("{} {} {}", "->".cyan(), update.task.bold(), label))
                    .ok();
            }
            TaskState::Running => {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(Self::spinner_style());
                bar.set_prefix(update.task.clone());
                bar.set_message(update.message.clone());
                bar.enable_steady_tick(Duration::from_millis(120));
                if let Some(old) = bars.insert(update.task.clone(), bar) {
                    old.finish_and_clear();
                }
            }
            TaskState::Completed => {
                if let Some(bar) = bars.remove(&update.task) {
                    bar.finish_with_message(format!("{}", "done".green()));
                }
            }
            TaskState::Failed => {
                if let Some(bar) = bars.remove(&update.task) {
                    bar.finish_with_message(format!("{} {}", "failed:".red(), update.message));
                } else {
                    self.multi
                        .println(format!("{} {} {}", "x".red(), update.task.bold(), update.message))
                        .ok();
                }
            }
        }
    }
}

/// Plain line-per-event status output (no spinners).
pub struct SimpleStatus;

impl StatusSink for SimpleStatus {
    fn on_status(&self, update: &StatusUpdate) {
        match update.state {
            TaskState::Pending => {
                println!("{} {} {}", "->".cyan(), update.task.bold(), update.message);
            }
            TaskState::Running => {
                println!("   {} {}", update.task.bold(), update.message);
            }
            TaskState::Completed => {
                println!("   {} {}", "v".green(), update.task);
            }
            TaskState::Failed => {
                println!("   {} {} {}", "x".red(), update.task, update.message);
            }
        }
    }
}
