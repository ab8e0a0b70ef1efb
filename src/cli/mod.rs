use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::{LevelFilter, Log, Metadata, Record};

use crate::error::Error;
use crate::ir::DuplicatePolicy;
use crate::pipeline::{AllocatorKind, Config};
use crate::registers::{AVAILABLE_REGS, Palette};

#[derive(Parser)]
#[command(name = "regcolor")]
#[command(about = "Graph-coloring register allocation for small instruction trees")]
pub struct Cli {
    /// Built-in program to compile (original, scenario, pressure, undefined, pinned, shadowed)
    #[arg(default_value = "scenario")]
    pub program: String,

    /// Registers available to the allocator, in preference order
    #[arg(short, long, value_delimiter = ',', default_values_t = AVAILABLE_REGS.map(String::from))]
    pub registers: Vec<String>,

    #[arg(short, long, value_enum, default_value_t = AllocatorKind::Chaitin)]
    pub allocator: AllocatorKind,

    /// Print the tree walk and the ANF order before the allocation
    #[arg(long)]
    pub trace: bool,

    /// Write the interference graph as DOT source
    #[arg(long, value_name = "PATH")]
    pub dot: Option<PathBuf>,

    /// Render the interference graph with Graphviz `dot`
    #[arg(long, value_name = "PATH")]
    pub render: Option<PathBuf>,

    /// Fail when two assignments define the same name
    #[arg(long)]
    pub strict_definitions: bool,

    /// Let values share a register with the values that use them
    #[arg(long)]
    pub keep_ancestor_registers: bool,

    /// Execute the program through the allocation and print its output
    #[arg(long)]
    pub verify: bool,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn config(&self) -> Result<Config, Error> {
        Ok(Config {
            palette: Palette::new(self.registers.iter().cloned())?,
            allocator: self.allocator,
            duplicates: if self.strict_definitions {
                DuplicatePolicy::Reject
            } else {
                DuplicatePolicy::Shadow
            },
            avoid_ancestor_registers: !self.keep_ancestor_registers,
        })
    }
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Installs the stderr logger. Each `-v` raises the level one step from warn.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
