use std::fmt;
use std::path::Path;

use anyhow::Context;

use crate::collection::indexed::Indexed;
use crate::collection::sparse_collection::{CollectionStats, SparseCollection};
use crate::script::ast::{Command, Entry};
use crate::script::parser::{load_script, parse_script};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Added { index: usize },
    Removed { index: usize, label: String },
    Found { index: usize, label: Option<String> },
    Packed { moves: Vec<(usize, usize)> },
    Cleared,
    Listing(Vec<(usize, String)>),
    Size { size: usize, live: usize },
    Stats(CollectionStats),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Added { index } => write!(f, "added at {}", index),
            Output::Removed { index, label } => write!(f, "removed {} from {}", label, index),
            Output::Found {
                index,
                label: Some(label),
            } => write!(f, "{}: {}", index, label),
            Output::Found { index, label: None } => write!(f, "{}: (empty)", index),
            Output::Packed { moves } if moves.is_empty() => write!(f, "packed (no moves)"),
            Output::Packed { moves } => {
                let moves: Vec<String> = moves
                    .iter()
                    .map(|(old, new)| format!("{} -> {}", old, new))
                    .collect();
                write!(f, "packed ({})", moves.join(", "))
            }
            Output::Cleared => write!(f, "cleared"),
            Output::Listing(entries) if entries.is_empty() => write!(f, "(no entries)"),
            Output::Listing(entries) => {
                let lines: Vec<String> = entries
                    .iter()
                    .map(|(index, label)| format!("{}: {}", index, label))
                    .collect();
                write!(f, "{}", lines.join("\n"))
            }
            Output::Size { size, live } => write!(f, "size {} ({} live)", size, live),
            Output::Stats(stats) => write!(
                f,
                "size {} live {} free {}",
                stats.size, stats.live, stats.free
            ),
        }
    }
}

/// Runs script commands against a collection of labelled entries. Invalid slot
/// indices are reported as errors instead of panicking.
#[derive(Debug, Default)]
pub struct ScriptExecutor {
    entries: SparseCollection<Entry>,
}

impl ScriptExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(&self) -> &SparseCollection<Entry> {
        &self.entries
    }

    pub fn execute(&mut self, command: Command) -> anyhow::Result<Output> {
        match command {
            Command::Add { label } => {
                let entry = self.entries.add_new(Entry::new(label));
                Ok(Output::Added {
                    index: entry.slot_index(),
                })
            }
            Command::Clone { index } => {
                let source = self
                    .entries
                    .checked_at(index)?
                    .cloned()
                    .with_context(|| format!("cannot clone empty slot {}", index))?;
                let entry = self.entries.clone_and_add(&source);
                Ok(Output::Added {
                    index: entry.slot_index(),
                })
            }
            Command::Remove { index } => {
                let entry = self.entries.checked_remove(index)?;
                Ok(Output::Removed {
                    index,
                    label: entry.label,
                })
            }
            Command::At { index } => {
                let label = self
                    .entries
                    .checked_at(index)?
                    .map(|entry| entry.label.clone());
                Ok(Output::Found { index, label })
            }
            Command::Pack => {
                let mut moves = Vec::new();
                self.entries
                    .pack_indices_with(|old, new| moves.push((old, new)));
                Ok(Output::Packed { moves })
            }
            Command::Clear => {
                self.entries.clear_all();
                Ok(Output::Cleared)
            }
            Command::List => Ok(Output::Listing(
                self.entries
                    .iter()
                    .map(|entry| (entry.index(), entry.label.clone()))
                    .collect(),
            )),
            Command::Size => Ok(Output::Size {
                size: self.entries.size(),
                live: self.entries.live_count(),
            }),
            Command::Stats => Ok(Output::Stats(self.entries.stats())),
        }
    }

    /// Executes `script` and collects every output. Stops at the first failing command;
    /// the commands before it stay applied. Use [`run_with`](Self::run_with) to see
    /// their outputs.
    pub fn run(&mut self, script: &str) -> anyhow::Result<Vec<Output>> {
        let mut outputs = Vec::new();
        self.run_with(script, |output| {
            outputs.push(output);
            Ok(())
        })?;
        Ok(outputs)
    }

    /// Executes `script`, handing each output to `on_output` as soon as its command
    /// completes.
    pub fn run_with<F>(&mut self, script: &str, on_output: F) -> anyhow::Result<()>
    where
        F: FnMut(Output) -> anyhow::Result<()>,
    {
        let commands = parse_script(script)?;
        self.execute_all(commands, on_output)
    }

    pub fn run_file<P: AsRef<Path>>(&mut self, path: P) -> anyhow::Result<Vec<Output>> {
        let mut outputs = Vec::new();
        let commands = load_script(path)?;
        self.execute_all(commands, |output| {
            outputs.push(output);
            Ok(())
        })?;
        Ok(outputs)
    }

    fn execute_all<F>(&mut self, commands: Vec<Command>, mut on_output: F) -> anyhow::Result<()>
    where
        F: FnMut(Output) -> anyhow::Result<()>,
    {
        let total = commands.len();
        for (done, command) in commands.into_iter().enumerate() {
            let rendered = format!("{:?}", command);
            let output = self.execute(command).with_context(|| {
                format!("executing {} ({} of {} commands completed)", rendered, done, total)
            })?;
            on_output(output)?;
        }
        Ok(())
    }
}
