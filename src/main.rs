//! MIC-1 Emulator - CLI Entry Point
//!
//! Commands:
//! - `mic1-emu run <program>` - Run an assembly or image file
//! - `mic1-emu debug <program>` - Interactive debugger
//! - `mic1-emu asm <source>` - Assemble to an image file
//! - `mic1-emu disasm <image>` - Disassemble an image file

use clap::{Parser, Subcommand};
use log::{error, info, LevelFilter};
use mic1::{assemble, load_image, Cpu, Word};
use simple_logger::SimpleLogger;

#[derive(Parser)]
#[command(name = "mic1-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of the MIC-1 accumulator machine")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the assembly (.asm/.txt) or image (.mic) file to execute
        program: String,
        /// Maximum number of instructions to run
        #[arg(short, long, default_value = "100000")]
        max_cycles: u64,
        /// Print every executed instruction
        #[arg(short, long)]
        trace: bool,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the assembly or image file to debug
        program: String,
    },
    /// Assemble source to an image file
    Asm {
        /// Path to the source file
        source: String,
        /// Output image file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble an image file to readable text
    Disasm {
        /// Path to the image file
        image: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run { program, max_cycles, trace, json } => {
            run_program(&program, max_cycles, trace, json);
        }
        Commands::Debug { program } => {
            debug_program(&program);
        }
        Commands::Asm { source, output } => {
            assemble_file(&source, output);
        }
        Commands::Disasm { image } => {
            disassemble_file(&image);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("❌ Failed to initialise logging: {}", e);
    }
}

/// Print an error and exit with status 1.
fn fail(message: String) -> ! {
    error!("{}", message);
    eprintln!("❌ {}", message);
    std::process::exit(1);
}

/// Load a program: assemble `.asm`/`.txt` sources, read anything else as an image.
fn load_words(path: &str) -> Vec<Word> {
    let words = if path.ends_with(".asm") || path.ends_with(".txt") {
        let source = std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("Failed to read file: {}", e)));

        let words = assemble(&source)
            .unwrap_or_else(|e| fail(format!("Assembly error: {}", e)));
        info!("assembled {} words from {}", words.len(), path);
        words
    } else {
        let image = load_image(path)
            .unwrap_or_else(|e| fail(format!("Failed to load image: {}", e)));
        info!("loaded {} words from {}", image.len(), path);
        image.words
    };

    if words.is_empty() {
        fail("No words to execute".to_string());
    }

    words
}

fn run_program(path: &str, max_cycles: u64, trace: bool, json: bool) {
    use mic1::asm::disasm::disassemble_instruction;

    let words = load_words(path);

    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load(&words) {
        fail(format!("Failed to load program: {}", e));
    }

    if !json {
        println!("🔧 Running: {} ({} words)", path, words.len());
        println!();
        println!("━━━ Execution ━━━");
    }

    // The engine has no loop of its own; drive it one step at a time.
    while cpu.is_running() && cpu.cycles < max_cycles {
        let pc = cpu.regs.pc;
        let before = cpu.cycles;
        let text = usize::try_from(pc)
            .map(|addr| disassemble_instruction(cpu.mem.cells(), addr).0)
            .unwrap_or_default();

        match cpu.step() {
            Ok(_) => {
                if trace && cpu.cycles > before {
                    println!("{:04}: {:<12} AC={} SP={} Z={} N={}",
                        pc, text, cpu.regs.ac, cpu.regs.sp,
                        u8::from(cpu.regs.flags.zero), u8::from(cpu.regs.flags.negative));
                }
            }
            Err(e) => {
                fail(format!("CPU error at PC={}: {}", pc, e));
            }
        }
    }

    let snapshot = cpu.snapshot();

    if json {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(text) => println!("{}", text),
            Err(e) => fail(format!("Failed to serialise state: {}", e)),
        }
    } else {
        println!();
        println!("━━━ Result ━━━");
        println!("Cycles: {}", snapshot.cycles);
        println!("State:  {:?}", cpu.state);
        println!("PC:  0x{:04X}", snapshot.pc);
        println!("AC:  0x{:04X} ({})", snapshot.ac & 0xFFFF, snapshot.ac);
        println!("SP:  0x{:04X}", snapshot.sp);
        println!("MAR: 0x{:04X}", snapshot.mar);
        println!("MBR: 0x{:04X}", snapshot.mbr & 0xFFFF);
        println!("IR:  0x{:02X}", snapshot.ir);
        println!("Flags: Z={} N={}", snapshot.zero, snapshot.negative);
        println!("Next: {}", snapshot.next_instruction.as_deref().unwrap_or("---"));
    }

    if cpu.is_running() {
        eprintln!();
        eprintln!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str) {
    use mic1::run_debugger;

    let words = load_words(path);

    if let Err(e) = run_debugger(words) {
        fail(format!("Debugger error: {}", e));
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str) {
    fail("This build has no debugger; rebuild with the `tui` feature".to_string());
}

fn assemble_file(source_path: &str, output: Option<String>) {
    use mic1::asm::disasm::listing;
    use mic1::{save_image, ImageFile};

    let out_path = output.unwrap_or_else(|| {
        match source_path.rsplit_once('.') {
            Some((stem, _)) => format!("{}.mic", stem),
            None => format!("{}.mic", source_path),
        }
    });

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let source = std::fs::read_to_string(source_path)
        .unwrap_or_else(|e| fail(format!("Failed to read file: {}", e)));

    let words = assemble(&source)
        .unwrap_or_else(|e| fail(format!("Assembly error: {}", e)));

    println!("✓ Assembled {} words", words.len());

    // Annotate each opcode word with its disassembly
    let mut image = ImageFile::from_words(&words);
    for (addr, text, _) in listing(&words) {
        image.comments[addr] = text;
    }

    if let Err(e) = save_image(&out_path, &image) {
        fail(format!("Failed to save image: {}", e));
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(image_path: &str) {
    use mic1::disassemble;

    let image = load_image(image_path)
        .unwrap_or_else(|e| fail(format!("Failed to load image: {}", e)));

    println!("{}", disassemble(&image.words));
}
