mod sheet_source;
mod test_runner;
mod xlsx;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

use render::{Document, MediaStore, RenderConfig};

const SUBCOMMANDS: &[&str] = &["run", "test", "help"];

/// Flags that are valid before the subcommand.
const GLOBAL_FLAGS: &[&str] = &["--no-color", "--verbose"];

/// Looked up next to the sheet when `--config` is not given.
const CONFIG_FILE_NAME: &str = "xmlyze.toml";

#[derive(Parser)]
#[command(name = "xmlyze", version, about = "Spreadsheet markup to document compiler")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG also applies
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a sheet into a document outline
    Run(RunArgs),

    /// Run .test.toml fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Sheet file (.csv, .toml or .xlsx)
    file: PathBuf,

    /// Parse only, don't render (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump the token stream
    #[arg(long)]
    tokens: bool,

    /// Dump the assembled code blocks
    #[arg(long)]
    blocks: bool,

    /// List the resolved styles
    #[arg(long)]
    styles: bool,

    /// Render configuration file (defaults to xmlyze.toml next to the sheet, if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the document to this file instead of stdout; a .docx path writes a Word document
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Copy the pictures embedded in a workbook into this directory
    #[arg(long, value_name = "DIR")]
    extract_images: Option<PathBuf>,

    /// Suppress document output (just check for errors)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.toml file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let args = with_run_shorthand(std::env::args().collect());
    let cli = Cli::parse_from(&args);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(run_args) => do_run(run_args, cli.no_color),
        Command::Test(test_args) => {
            if test_args.list_categories {
                test_runner::list_categories(&test_args.path);
                return;
            }
            let exit_code =
                test_runner::run_tests(&test_args.path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

/// `xmlyze sheet.csv` is shorthand for `xmlyze run sheet.csv`. `run` goes
/// after any global flags, so options meant for `run` stay behind it.
fn with_run_shorthand(mut args: Vec<String>) -> Vec<String> {
    let first = args.iter().skip(1).position(|arg| !is_global_flag(arg));
    if let Some(pos) = first.map(|pos| pos + 1) {
        let arg = args[pos].as_str();
        let keeps_clap_meaning = SUBCOMMANDS.contains(&arg)
            || matches!(arg, "-h" | "--help" | "-V" | "--version");
        if !keeps_clap_meaning {
            args.insert(pos, "run".to_string());
        }
    }
    args
}

fn is_global_flag(arg: &str) -> bool {
    GLOBAL_FLAGS.contains(&arg)
        || arg
            .strip_prefix('-')
            .is_some_and(|flags| !flags.is_empty() && flags.chars().all(|c| c == 'v'))
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn do_run(args: RunArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    let sheet = match sheet_source::load_sheet(&args.file) {
        Ok(sheet) => sheet,
        Err(e) => {
            eprintln!("error: {}: {}", args.file.display(), e);
            process::exit(1);
        }
    };
    debug!(rows = sheet.rows.len(), file = %args.file.display(), "read sheet");

    if let Some(dir) = &args.extract_images {
        if let Err(e) = extract_images(&sheet.images, dir) {
            eprintln!("error: cannot extract images to '{}': {}", dir.display(), e);
            process::exit(1);
        }
    }

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.display().to_string(), sheet.source);
    let emit = |diagnostic: &Diagnostic<usize>| {
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, diagnostic);
    };

    let parser = xmlyze::parser::Parser::new(sheet.rows, file_id);

    // --tokens: dump the token stream
    if args.tokens {
        for token in parser.tokens() {
            println!("{}", token);
        }
        return;
    }

    let script = match parser.parse() {
        Ok(script) => script,
        Err(error) => {
            emit(&error.to_diagnostic(file_id));
            process::exit(1);
        }
    };

    if args.check {
        eprintln!("ok: {} parsed successfully", args.file.display());
        return;
    }

    // --blocks: dump the code blocks
    if args.blocks {
        for block in &script.blocks {
            print!("{}", block);
        }
        return;
    }

    let render_config = match load_config(args.config.as_deref(), &args.file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let rendered = match render::render(&script, &render_config) {
        Ok(rendered) => rendered,
        Err(error) => {
            emit(&error.to_diagnostic(file_id));
            process::exit(1);
        }
    };
    for warning in &rendered.warnings {
        emit(&warning.to_diagnostic(file_id));
    }

    // --styles: list resolved styles
    if args.styles {
        for style in &rendered.document.styles {
            println!("{} ({:?})", style.id, style.name);
        }
        return;
    }

    if let Some(output) = &args.output {
        let written = if is_docx(output) {
            let mut media = MediaStore::with_root(sheet_dir(&args.file));
            media.extend(sheet.images);
            write_docx(&rendered.document, &media, output)
        } else {
            std::fs::write(output, rendered.document.to_string()).map_err(|e| e.to_string())
        };
        if let Err(e) = written {
            eprintln!("error: cannot write '{}': {}", output.display(), e);
            process::exit(1);
        }
    } else if !args.quiet {
        print!("{}", rendered.document);
    }
}

fn is_docx(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"))
}

/// Image paths in text sheets are relative to the sheet.
fn sheet_dir(sheet: &Path) -> PathBuf {
    sheet
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn write_docx(document: &Document, media: &MediaStore, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let mut writer =
        render::write_docx(document, media, BufWriter::new(file)).map_err(|e| e.to_string())?;
    writer.flush().map_err(|e| e.to_string())?;
    info!(path = %path.display(), "wrote document");
    Ok(())
}

/// Write every embedded picture under `dir`, named after its file name in the workbook.
fn extract_images(images: &BTreeMap<String, Vec<u8>>, dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for (part, data) in images {
        let name = part.rsplit('/').next().unwrap_or(part);
        let path = dir.join(name);
        std::fs::write(&path, data)?;
        info!(path = %path.display(), "saved image");
    }
    Ok(())
}

/// An explicit `--config` must exist; the implicit one next to the sheet is optional.
fn load_config(
    explicit: Option<&Path>,
    sheet: &Path,
) -> Result<RenderConfig, render::ConfigError> {
    if let Some(path) = explicit {
        return RenderConfig::load(path);
    }
    let implicit = sheet
        .parent()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file());
    match implicit {
        Some(path) => {
            debug!(path = %path.display(), "using render config");
            RenderConfig::load(&path)
        }
        None => Ok(RenderConfig::default()),
    }
}
