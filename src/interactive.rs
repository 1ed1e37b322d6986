use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::display;
use crate::engine::PatternEngine;
use crate::storage::FileStore;
use crate::types::{ModelKind, Outcome};

#[derive(Debug, PartialEq)]
pub enum InteractiveCommand {
    Add(Outcome),
    Bulk(Vec<String>),
    Undo,
    Clear,
    Model(String),
    Threshold(String),
    Length(String),
    Stats,
    Patterns,
    Matrix,
    Adaptive,
    History,
    Save(Option<String>),
    Load(String),
    Help,
    Quit,
}

pub fn parse_command(input: &str) -> Option<InteractiveCommand> {
    let mut parts = input.split_whitespace();
    let head = parts.next()?.to_lowercase();
    let rest: Vec<String> = parts.map(str::to_string).collect();
    let arg = rest.first().cloned();

    match head.as_str() {
        "w" | "win" => Some(InteractiveCommand::Add(Outcome::Win)),
        "l" | "loss" => Some(InteractiveCommand::Add(Outcome::Loss)),
        "bulk" | "b" if !rest.is_empty() => Some(InteractiveCommand::Bulk(rest)),
        "undo" | "u" => Some(InteractiveCommand::Undo),
        "clear" => Some(InteractiveCommand::Clear),
        "model" | "m" => arg.map(InteractiveCommand::Model),
        "threshold" | "t" => arg.map(InteractiveCommand::Threshold),
        "length" | "len" => arg.map(InteractiveCommand::Length),
        "stats" | "s" => Some(InteractiveCommand::Stats),
        "patterns" | "p" => Some(InteractiveCommand::Patterns),
        "matrix" => Some(InteractiveCommand::Matrix),
        "adaptive" => Some(InteractiveCommand::Adaptive),
        "history" | "hist" => Some(InteractiveCommand::History),
        "save" => Some(InteractiveCommand::Save(arg)),
        "load" => arg.map(InteractiveCommand::Load),
        "help" | "h" | "?" => Some(InteractiveCommand::Help),
        "quit" | "q" | "exit" => Some(InteractiveCommand::Quit),
        _ => None,
    }
}

fn help_text() -> String {
    [
        "Commands:",
        "  w | l               record a win or a loss",
        "  bulk W L W ...      record several results at once",
        "  undo                remove the last result",
        "  clear               remove all results",
        "  model <name>        pattern, matrix, adaptive or combined",
        "  threshold <n>       minimum samples (1-100)",
        "  length <n>          maximum pattern length (3-7)",
        "  stats | patterns | matrix | adaptive | history",
        "  save [path] | load <path>",
        "  quit",
    ]
    .join("\n")
}

/// A line-oriented session over any reader and writer.
pub struct Session<'a> {
    engine: &'a mut PatternEngine,
    default_path: Option<PathBuf>,
}

impl<'a> Session<'a> {
    pub fn new(engine: &'a mut PatternEngine, default_path: Option<PathBuf>) -> Self {
        Self {
            engine,
            default_path,
        }
    }

    /// Reads commands until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<()> {
        writeln!(output, "WL pattern analyzer. Type 'help' for commands.")?;
        writeln!(output, "{}", display::render_prediction(self.engine.prediction().as_ref()))?;

        loop {
            write!(output, "> ")?;
            output.flush()?;

            let mut line = String::new();
            let read = input.read_line(&mut line).context("Failed to read input")?;
            if read == 0 {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            match parse_command(&line) {
                Some(InteractiveCommand::Quit) => break,
                Some(command) => self.execute(command, &mut output)?,
                None => writeln!(output, "Unknown command: {}", line.trim())?,
            }
        }

        info!("Session ended with {} results", self.engine.len());
        Ok(())
    }

    fn execute<W: Write>(&mut self, command: InteractiveCommand, out: &mut W) -> Result<()> {
        match command {
            InteractiveCommand::Add(outcome) => {
                self.engine.add_result(outcome);
                self.print_progress(out)?;
            }
            InteractiveCommand::Bulk(tokens) => {
                let mut report = Vec::new();
                match self
                    .engine
                    .bulk_add_with_progress(&tokens, |done, total| report.push((done, total)))
                {
                    Ok(count) => {
                        for (done, total) in report {
                            writeln!(out, "Processing {}/{}", done, total)?;
                        }
                        writeln!(out, "Added {} results", count)?;
                        self.print_progress(out)?;
                    }
                    Err(e) => writeln!(out, "Error: {}", e)?,
                }
            }
            InteractiveCommand::Undo => match self.engine.delete_last() {
                Ok(outcome) => {
                    writeln!(out, "Removed {}", outcome)?;
                    self.print_progress(out)?;
                }
                Err(e) => writeln!(out, "Error: {}", e)?,
            },
            InteractiveCommand::Clear => {
                self.engine.clear_all();
                writeln!(out, "All results cleared")?;
            }
            InteractiveCommand::Model(name) => match name.parse::<ModelKind>() {
                Ok(model) => {
                    self.engine.set_active_model(model);
                    writeln!(out, "Model: {}", model.display_name())?;
                    self.print_prediction(out)?;
                }
                Err(e) => writeln!(out, "Error: {}", e)?,
            },
            InteractiveCommand::Threshold(value) => match value.parse::<u32>() {
                Ok(n) => match self.engine.set_significance_threshold(n) {
                    Ok(()) => writeln!(out, "Significance threshold: {}", n)?,
                    Err(e) => writeln!(out, "Error: {}", e)?,
                },
                Err(_) => writeln!(out, "Error: not a number: {}", value)?,
            },
            InteractiveCommand::Length(value) => match value.parse::<usize>() {
                Ok(n) => match self.engine.set_max_pattern_length(n) {
                    Ok(()) => writeln!(out, "Maximum pattern length: {}", n)?,
                    Err(e) => writeln!(out, "Error: {}", e)?,
                },
                Err(_) => writeln!(out, "Error: not a number: {}", value)?,
            },
            InteractiveCommand::Stats => {
                writeln!(out, "{}", display::render_summary(&self.engine.get_stats()))?;
            }
            InteractiveCommand::Patterns => {
                let threshold = self.engine.settings().significance_threshold;
                writeln!(
                    out,
                    "{}",
                    display::render_patterns(self.engine.pattern_stats(), threshold)
                )?;
            }
            InteractiveCommand::Matrix => {
                writeln!(out, "{}", display::render_matrix(self.engine.matrix_stats()))?;
            }
            InteractiveCommand::Adaptive => {
                writeln!(
                    out,
                    "{}",
                    display::render_adaptive(
                        self.engine.adaptive_stats(),
                        self.engine.sequence().as_slice()
                    )
                )?;
            }
            InteractiveCommand::History => {
                writeln!(out, "{}", display::render_history(self.engine.sequence().as_slice()))?;
            }
            InteractiveCommand::Save(path) => {
                match path.map(PathBuf::from).or_else(|| self.default_path.clone()) {
                    Some(path) => match self.engine.save(&FileStore::new(&path)) {
                        Ok(count) => writeln!(out, "Saved {} results to {}", count, path.display())?,
                        Err(e) => writeln!(out, "Error: {}", e)?,
                    },
                    None => writeln!(out, "Error: no file given")?,
                }
            }
            InteractiveCommand::Load(path) => {
                let path = Path::new(&path);
                match self.engine.load(&FileStore::new(path)) {
                    Ok(count) => {
                        writeln!(out, "Loaded {} results from {}", count, path.display())?;
                        self.default_path = Some(path.to_path_buf());
                        self.print_progress(out)?;
                    }
                    Err(e) => writeln!(out, "Error: {}", e)?,
                }
            }
            InteractiveCommand::Help => writeln!(out, "{}", help_text())?,
            InteractiveCommand::Quit => {}
        }
        Ok(())
    }

    fn print_prediction<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", display::render_prediction(self.engine.prediction().as_ref()))?;
        Ok(())
    }

    fn print_progress<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", display::render_recent(self.engine.sequence().as_slice()))?;
        self.print_prediction(out)
    }
}
