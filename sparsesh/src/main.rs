use anyhow::Context;
use clap::{Parser, Subcommand};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use sparse::script::ast::Command;
use sparse::script::executor::{Output, ScriptExecutor};
use sparse::script::parser::{load_script, parse_command};
use std::io::Write;

#[derive(Parser)]
#[command(name = "sparsesh")]
#[command(about = "Interactive driver for the sparse node collection")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print stats as JSON
    #[arg(long)]
    json: bool,

    /// Echo each command and the collection stats after it
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    Exec { cmd: String },
    Run { path: Option<String> },
    Shell,
}

struct Session<O: Write, E: Write> {
    exec: ScriptExecutor,
    out: O,
    diag: E,
    json: bool,
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut session = Session::new(std::io::stdout(), std::io::stderr(), cli.json, cli.verbose);

    match cli.command {
        Some(Commands::Exec { cmd }) => {
            session.execute_line(&cmd)?;
        }
        Some(Commands::Run { path }) => {
            let path = path
                .or_else(|| std::env::var("SPARSESH_SCRIPT").ok())
                .ok_or_else(|| anyhow::anyhow!("no script given (pass a path or set SPARSESH_SCRIPT)"))?;
            session.run_file(&path)?;
        }
        Some(Commands::Shell) | None => {
            session.start_interactive_shell()?;
        }
    }

    Ok(())
}

impl<O: Write, E: Write> Session<O, E> {
    fn new(out: O, diag: E, json: bool, verbose: bool) -> Self {
        Self {
            exec: ScriptExecutor::new(),
            out,
            diag,
            json,
            verbose,
        }
    }

    fn execute_line(&mut self, line: &str) -> anyhow::Result<()> {
        let command = parse_command(line)?;
        self.execute(command)
    }

    fn execute(&mut self, command: Command) -> anyhow::Result<()> {
        if self.verbose {
            writeln!(self.diag, "> {:?}", command)?;
        }
        let output = self.exec.execute(command)?;
        self.display(&output)?;
        if self.verbose {
            let stats = self.exec.collection().stats();
            writeln!(
                self.diag,
                "  [size {} live {} free {}]",
                stats.size, stats.live, stats.free
            )?;
        }
        Ok(())
    }

    fn run_file(&mut self, path: &str) -> anyhow::Result<()> {
        if self.verbose {
            writeln!(self.diag, "running {}", path)?;
        }
        let commands = load_script(path)?;
        let total = commands.len();
        for (done, command) in commands.into_iter().enumerate() {
            self.execute(command)
                .with_context(|| format!("{} of {} commands completed", done, total))?;
        }
        Ok(())
    }

    fn display(&mut self, output: &Output) -> anyhow::Result<()> {
        match output {
            Output::Stats(stats) if self.json => {
                writeln!(self.out, "{}", serde_json::to_string(stats)?)?;
            }
            _ => writeln!(self.out, "{}", output)?,
        }
        Ok(())
    }

    fn start_interactive_shell(&mut self) -> anyhow::Result<()> {
        println!("sparse collection shell");
        println!("Type 'help' for help, 'exit' or 'quit' to quit\n");

        let mut rl = DefaultEditor::new()?;

        loop {
            let readline = rl.readline("sparse> ");
            match readline {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }

                    rl.add_history_entry(line)?;

                    match line.to_lowercase().as_str() {
                        "exit" | "quit" => {
                            println!("Goodbye!");
                            break;
                        }
                        "help" => {
                            print_help();
                        }
                        "cls" => {
                            clear_terminal()?;
                        }
                        _ => {
                            if let Err(e) = self.execute_line(line) {
                                println!("Error: {:#}", e);
                            }
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }

        Ok(())
    }
}

fn clear_terminal() -> anyhow::Result<()> {
    print!("\x1B[2J\x1B[1;1H");
    std::io::stdout().flush()?;
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("---------");
    println!("    add <label>     - Add an entry, prints its slot");
    println!("    clone <index>   - Add a copy of the entry at <index>");
    println!("    remove <index>  - Remove the entry at <index>");
    println!("    at <index>      - Show the entry at <index>");
    println!("    pack            - Compact indices");
    println!("    clear           - Drop every entry");
    println!("    list            - List live entries in slot order");
    println!("    size            - Backing size and live count");
    println!("    stats           - Size, live and free counts");
    println!();
    println!("  Shell:");
    println!("    help    - Show this help");
    println!("    cls     - Clear the terminal screen");
    println!("    exit    - Exit the shell");
    println!("    quit    - Exit the shell");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session(verbose: bool) -> Session<Vec<u8>, Vec<u8>> {
        Session::new(Vec::new(), Vec::new(), false, verbose)
    }

    #[test]
    fn run_file_echoes_every_command_when_verbose() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("ops.txt");
        std::fs::write(&path, "add a\nadd b\nremove 0\n")?;

        let mut s = session(true);
        s.run_file(path.to_str().unwrap())?;

        let diag = String::from_utf8(s.diag)?;
        assert_eq!(diag.matches("> ").count(), 3);
        assert_eq!(diag.matches("  [size").count(), 3);
        assert!(diag.contains("[size 2 live 1 free 1]"));

        let out = String::from_utf8(s.out)?;
        assert_eq!(out, "added at 0\nadded at 1\nremoved a from 0\n");
        Ok(())
    }

    #[test]
    fn run_file_shows_outputs_before_failing_command() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("ops.txt");
        std::fs::write(&path, "add a\nadd b\nremove 9\nadd c\n")?;

        let mut s = session(false);
        let err = s.run_file(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("2 of 4 commands completed"));
        assert_eq!(s.exec.collection().size(), 2);

        let out = String::from_utf8(s.out)?;
        assert_eq!(out, "added at 0\nadded at 1\n");
        assert!(s.diag.is_empty());
        Ok(())
    }

    #[test]
    fn stats_render_as_json_when_requested() -> anyhow::Result<()> {
        let mut s = Session::new(Vec::new(), Vec::new(), true, false);
        s.execute_line("add a")?;
        s.execute_line("stats")?;
        let out = String::from_utf8(s.out)?;
        assert!(out.ends_with("{\"size\":1,\"live\":1,\"free\":0}\n"));
        Ok(())
    }
}
