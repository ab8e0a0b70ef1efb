use std::process;

use regcolor::cli::{Cli, init_logging};
use regcolor::demos;
use regcolor::export::{DotSource, Graphviz};
use regcolor::pipeline::compile;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Pick one of the built-in trees
    let Some(tree) = demos::program(&cli.program) else {
        eprintln!(
            "Error compiling program: unknown program `{}` (expected one of {})",
            cli.program,
            demos::PROGRAMS.join(", ")
        );
        process::exit(1);
    };

    let compilation = match cli.config().and_then(|config| compile(tree, &config)) {
        Ok(compilation) => compilation,
        Err(err) => {
            eprintln!("Error compiling program: {}", err);
            process::exit(1);
        }
    };

    if cli.trace {
        for line in compilation.trace_lines() {
            println!("{}", line);
        }
    }

    for line in compilation.allocation_lines() {
        println!("{}", line);
    }
    println!("{} spilled", compilation.spill_count());

    if let Some(path) = &cli.dot {
        if let Err(err) = compilation.render(&DotSource, path) {
            log::warn!("could not write {}: {}", path.display(), err);
        }
    }

    if let Some(path) = &cli.render {
        let renderer = Graphviz {
            format: path
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("png")
                .to_string(),
            ..Graphviz::default()
        };
        if let Err(err) = compilation.render(&renderer, path) {
            log::warn!("{}", err);
        }
    }

    if cli.verify {
        match compilation.execute() {
            Ok(execution) => {
                for value in execution.output {
                    println!("output {}", value);
                }
                println!("{} cycles", execution.cycles);
            }
            Err(err) => {
                eprintln!("Error verifying allocation: {}", err);
                process::exit(1);
            }
        }
    }
}
