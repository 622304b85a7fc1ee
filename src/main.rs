use std::path::PathBuf;

use cfgfill::io::excel_read::{HeaderMode, TableOptions};
use cfgfill::workflow;
use cfgfill::{Result, ToolError};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose).and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Form(args) => {
            let variables = workflow::create_form(&args.template, &args.output)?;
            println!(
                "wrote {} variable(s) to {}",
                variables.len(),
                args.output.display()
            );
            Ok(())
        }
        Command::Render(args) => {
            let options = args.table.options(usize::from(args.column));
            let report =
                workflow::render_to_file(&args.template, &args.table.table, &args.output, &options)?;
            if let Some(path) = &args.report {
                workflow::write_report(path, &report)?;
            }
            Ok(())
        }
        Command::Workbook(args) => {
            let options = args.table.options(1);
            let reports = workflow::render_to_workbook(
                &args.template,
                &args.table.table,
                &args.output,
                &options,
            )?;
            if let Some(path) = &args.report {
                workflow::write_reports(path, &reports)?;
            }
            Ok(())
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Fill $VARIABLE$ placeholders in configuration templates from a spreadsheet."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a spreadsheet listing the template's variables for filling in.
    Form(FormArgs),
    /// Render the template with one value column into a text file.
    Render(RenderArgs),
    /// Render the template once per value column into an Excel workbook.
    Workbook(WorkbookArgs),
}

#[derive(clap::Args)]
struct FormArgs {
    /// Configuration template containing $VARIABLE$ placeholders.
    #[arg(long)]
    template: PathBuf,

    /// Path of the spreadsheet form to create.
    #[arg(long)]
    output: PathBuf,
}

#[derive(clap::Args)]
struct TableArgs {
    /// Spreadsheet with variable names in column A and values from column B.
    #[arg(long)]
    table: PathBuf,

    /// Sheet to read; defaults to the first sheet.
    #[arg(long)]
    sheet: Option<String>,

    /// Whether the first row of the table is a header.
    #[arg(long, value_enum, default_value_t = HeaderArg::Auto)]
    header: HeaderArg,
}

impl TableArgs {
    fn options(&self, column: usize) -> TableOptions {
        TableOptions {
            sheet: self.sheet.clone(),
            header: self.header.into(),
            column,
        }
    }
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Configuration template containing $VARIABLE$ placeholders.
    #[arg(long)]
    template: PathBuf,

    #[command(flatten)]
    table: TableArgs,

    /// Value column to use; 1 is spreadsheet column B.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    column: u16,

    /// Path of the rendered configuration.
    #[arg(long)]
    output: PathBuf,

    /// Optional JSON report listing replacements and unresolved tokens.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(clap::Args)]
struct WorkbookArgs {
    /// Configuration template containing $VARIABLE$ placeholders.
    #[arg(long)]
    template: PathBuf,

    #[command(flatten)]
    table: TableArgs,

    /// Path of the output workbook.
    #[arg(long)]
    output: PathBuf,

    /// Optional JSON report listing replacements and unresolved tokens.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum HeaderArg {
    Auto,
    Present,
    Absent,
}

impl From<HeaderArg> for HeaderMode {
    fn from(arg: HeaderArg) -> Self {
        match arg {
            HeaderArg::Auto => HeaderMode::Auto,
            HeaderArg::Present => HeaderMode::Present,
            HeaderArg::Absent => HeaderMode::Absent,
        }
    }
}
