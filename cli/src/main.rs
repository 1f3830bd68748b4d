mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use serde::Deserialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use diaflow::{ParseError, Program, WriteOptions};

#[derive(Parser)]
#[command(name = "diaflow", version, about = "Inspect and maintain Diaflow program files")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log what the parser is doing (overridden by DIAFLOW_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that a program file opens
    Check(CheckArgs),

    /// Rewrite a program file in canonical layout
    Fmt(FmtArgs),

    /// Print the functions of a program
    Show(ShowArgs),

    /// Create a new program with one empty function
    New(NewArgs),

    /// Run .test.xml fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Program files to check
    #[arg(required = true)]
    files: Vec<String>,
}

#[derive(clap::Args)]
struct FmtArgs {
    /// Program file to format
    file: String,

    /// Write here instead of rewriting the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// diaflow.toml with a [write] table
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the formatted document to stdout
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Only report whether the file is already formatted (exit 1 if not)
    #[arg(long)]
    check: bool,
}

#[derive(clap::Args)]
struct ShowArgs {
    /// Program file to read
    file: String,

    /// Dump the parsed AST instead of a summary
    #[arg(long)]
    ast: bool,
}

#[derive(clap::Args)]
struct NewArgs {
    /// Where to write the program
    file: PathBuf,

    /// Name of the initial function
    #[arg(short, long, default_value = "main")]
    name: String,

    /// Replace the file if it exists
    #[arg(long)]
    force: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.xml file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

/// Layout of `diaflow.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    write: WriteOptions,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.command {
        Command::Check(args) => do_check(args, cli.no_color),
        Command::Fmt(args) => do_fmt(args, cli.no_color),
        Command::Show(args) => do_show(args, cli.no_color),
        Command::New(args) => do_new(args),
        Command::Test(args) => {
            let path = Path::new(&args.path);
            if args.list_categories {
                test_runner::list_categories(path);
                0
            } else {
                test_runner::run_tests(path, cli.no_color, &args.category)
            }
        }
    };
    process::exit(code);
}

fn init_logging(verbose: bool) {
    let default = if verbose { "diaflow=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("DIAFLOW_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn color_choice(no_color: bool) -> ColorChoice {
    if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

/// Read and parse `file`, reporting any problem on stderr.
/// Corrupted input is rendered as a source diagnostic. On success the source
/// text comes back alongside the program.
fn open(file: &str, no_color: bool) -> Option<(String, Program)> {
    // Read failures are printed without a source snippet, so the id is unused.
    let source = match Program::read_source(Path::new(file), 0) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: {}", e);
            return None;
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(file.to_string(), source.clone());

    match diaflow::Parser::new(source.clone(), file_id).parse() {
        Ok(program) => Some((source, program)),
        Err(error) => {
            emit_parse_error(&files, &error, no_color);
            None
        }
    }
}

fn emit_parse_error(files: &SimpleFiles<String, String>, error: &ParseError, no_color: bool) {
    let writer = StandardStream::stderr(color_choice(no_color));
    let config = term::Config::default();
    let diagnostic = error
        .to_diagnostic()
        .with_notes(vec!["the file cannot be opened".to_string()]);
    let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
}

fn do_check(args: CheckArgs, no_color: bool) -> i32 {
    let mut failed = 0;
    for file in &args.files {
        match open(file, no_color) {
            Some((_, program)) => eprintln!(
                "ok: {} ({} functions, {} statements)",
                file,
                program.len(),
                program.node_count()
            ),
            None => failed += 1,
        }
    }
    if failed > 0 { 1 } else { 0 }
}

fn load_config(path: &Path) -> Result<ConfigFile, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    toml::from_str(&text).map_err(|e| format!("invalid config '{}': {}", path.display(), e))
}

fn do_fmt(args: FmtArgs, no_color: bool) -> i32 {
    let options = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config.write,
            Err(e) => {
                eprintln!("error: {}", e);
                return 1;
            }
        },
        None => WriteOptions::default(),
    };
    debug!(?options, "formatting");

    let Some((current, program)) = open(&args.file, no_color) else {
        return 1;
    };
    let mut formatted = program.to_xml_string_with(&options);
    formatted.push('\n');

    if args.check {
        if current == formatted {
            return 0;
        }
        eprintln!("{} is not formatted", args.file);
        return 1;
    }

    if args.stdout {
        print!("{}", formatted);
        return 0;
    }

    let target = args.output.unwrap_or_else(|| PathBuf::from(&args.file));
    match std::fs::write(&target, formatted) {
        Ok(()) => {
            info!(path = %target.display(), "formatted");
            0
        }
        Err(e) => {
            eprintln!("error: cannot write '{}': {}", target.display(), e);
            1
        }
    }
}

fn do_show(args: ShowArgs, no_color: bool) -> i32 {
    let Some((_, program)) = open(&args.file, no_color) else {
        return 1;
    };

    if args.ast {
        println!("{:#?}", program);
        return 0;
    }

    if program.is_empty() {
        println!("(no functions)");
    }
    for (name, function) in program.iter() {
        println!(
            "{}({})  {} statements",
            name,
            function.params.join(", "),
            function.body.node_count()
        );
    }
    0
}

fn do_new(args: NewArgs) -> i32 {
    if args.file.exists() && !args.force {
        eprintln!(
            "error: '{}' already exists (use --force to replace it)",
            args.file.display()
        );
        return 1;
    }

    let mut program = Program::new();
    program.function(&args.name);
    match program.save(&args.file) {
        Ok(()) => {
            eprintln!("created {}", args.file.display());
            0
        }
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}
