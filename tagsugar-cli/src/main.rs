use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tagsugar_cli::{BuildOptions, EmitMode, FileFilter, build_cmd, check_cmd};
use tagsugar_jsx::TransformOptions;

#[derive(Parser)]
#[command(name = "tagsugar", version, about = "Desugar $if/$for/$let markup tags")]
struct Cli {
    /// More logging (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Selection {
    /// Files or directories to process
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Glob of files to include (repeatable; default: **/*.mdx, **/*.jsx, **/*.tsx)
    #[arg(long)]
    include: Vec<String>,
    /// Glob of files to skip (repeatable)
    #[arg(long)]
    exclude: Vec<String>,
    /// Reject malformed `var` binding patterns instead of passing them through
    #[arg(long)]
    strict_patterns: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite pseudo-tags and write the printed result.
    Build {
        #[command(flatten)]
        selection: Selection,
        /// Output directory (default: target/tagsugar-gen)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// What to emit: printed code or the rewritten tree
        #[arg(long, value_enum, default_value_t = EmitMode::Code)]
        emit: EmitMode,
        /// Also write <file>.map.json next to each output
        #[arg(long)]
        source_map: bool,
    },
    /// Validate pseudo-tags without writing anything.
    Check {
        #[command(flatten)]
        selection: Selection,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Build {
            selection,
            out_dir,
            emit,
            source_map,
        } => {
            let opts = BuildOptions {
                out_dir,
                emit,
                source_map,
                transform: transform_options(&selection),
                filter: FileFilter::new(&selection.include, &selection.exclude)?,
            };
            build_cmd(&selection.inputs, &opts)?;
        }
        Commands::Check { selection } => {
            let filter = FileFilter::new(&selection.include, &selection.exclude)?;
            let n = check_cmd(&selection.inputs, &filter, &transform_options(&selection))?;
            println!("Checked {n} files");
        }
    }
    Ok(())
}

fn transform_options(selection: &Selection) -> TransformOptions {
    TransformOptions {
        strict_patterns: selection.strict_patterns,
    }
}
