//! ALICE-FieldVM CLI
//!
//! Command-line interface for rasterizing field programs.
//!
//! Author: Moroya Sakamoto

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use alice_fieldvm::prelude::*;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "alice-fieldvm")]
#[command(author = "Moroya Sakamoto")]
#[command(version = alice_fieldvm::VERSION)]
#[command(about = "ALICE-FieldVM: 2D implicit field rasterizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Rasterize a field program to a PGM image
    Render {
        /// Input field program (text format)
        input: PathBuf,
        /// Output PGM file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Image width and height in pixels
        #[arg(short, long, default_value = "1024")]
        size: usize,
        /// Shard rows across all CPU cores
        #[arg(short, long)]
        parallel: bool,
    },

    /// Display program information
    Info {
        /// Input field program (text format)
        input: PathBuf,
    },

    /// Benchmark rasterization
    Bench {
        /// Input field program (text format)
        input: PathBuf,
        /// Image width and height in pixels
        #[arg(short, long, default_value = "1024")]
        size: usize,
        /// Repetitions per mode
        #[arg(short, long, default_value = "5")]
        iterations: usize,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            output,
            size,
            parallel,
        } => cmd_render(input, output, size, parallel),
        Commands::Info { input } => cmd_info(input),
        Commands::Bench {
            input,
            size,
            iterations,
        } => cmd_bench(input, size, iterations),
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI not enabled. Build with --features cli");
    std::process::exit(1);
}

#[cfg(feature = "cli")]
fn load_source(path: &PathBuf) -> Vec<SourceInst> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Read error: {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };
    match parse_source(&text) {
        Ok(insts) => insts,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "cli")]
fn cmd_render(input: PathBuf, output: Option<PathBuf>, size: usize, parallel: bool) {
    let insts = load_source(&input);
    let config = RenderConfig { size };

    let result = if parallel {
        render_image_parallel(&insts, &config)
    } else {
        render_image(&insts, &config)
    };

    let image = match result {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Render error: {}", e);
            std::process::exit(1);
        }
    };

    let written = match output {
        Some(path) => {
            let mut file = match std::fs::File::create(&path) {
                Ok(f) => std::io::BufWriter::new(f),
                Err(e) => {
                    eprintln!("Write error: {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            };
            write_pgm(&mut file, &image).map(|_| {
                eprintln!("Rendered {}x{} to {}", size, size, path.display());
            })
        }
        None => {
            let stdout = std::io::stdout();
            write_pgm(&mut stdout.lock(), &image)
        }
    };

    if let Err(e) = written {
        eprintln!("Write error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn cmd_info(input: PathBuf) {
    let insts = load_source(&input);

    // Lower with a throwaway grid to inspect the compiled shape
    let y_cell = UniformCell::default();
    let builder = match lower_source(&insts, 2.0 / 1023.0, &y_cell) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Lowering error: {}", e);
            std::process::exit(1);
        }
    };
    let built = builder.instruction_count();
    let program = Program::compile(builder);

    println!("Source instructions : {}", insts.len());
    println!("Built instructions  : {}", built);
    println!("Compiled (with end) : {}", program.instruction_count());
    println!("Invariant prefix    : {}", program.invariant_len());
    println!(
        "Varying suffix      : {}",
        program.instruction_count() - program.invariant_len()
    );
    println!("Program memory      : {} bytes", program.memory_size());
    println!("Lane width          : {}", LANES);
}

#[cfg(feature = "cli")]
fn cmd_bench(input: PathBuf, size: usize, iterations: usize) {
    let insts = load_source(&input);
    let config = RenderConfig { size };

    println!("=== FieldVM Rasterization Benchmark ===");
    println!("Image   : {}x{}", size, size);
    println!("Threads : {}", rayon::current_num_threads());
    println!();

    for (mode, parallel) in [("Sequential", false), ("Parallel", true)] {
        let mut best = f64::INFINITY;
        for _ in 0..iterations.max(1) {
            let start = std::time::Instant::now();
            let result = if parallel {
                render_image_parallel(&insts, &config)
            } else {
                render_image(&insts, &config)
            };
            if let Err(e) = result {
                eprintln!("Render error: {}", e);
                std::process::exit(1);
            }
            best = best.min(start.elapsed().as_secs_f64());
        }
        let pixels = (size * size) as f64;
        println!(
            "{:<12} {:>10.3}ms {:>10.2} Mpx/s",
            mode,
            best * 1000.0,
            pixels / best / 1_000_000.0
        );
    }
}
