use anyhow::{Context, Result};
use clap::ValueEnum;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tagsugar_jsx::TransformOptions;

pub const DEFAULT_INCLUDE: &[&str] = &["**/*.mdx", "**/*.jsx", "**/*.tsx"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EmitMode {
    /// Printed source with pseudo-tags desugared
    #[default]
    Code,
    /// Debug dump of the rewritten tree
    Tree,
}

/// Which files reach the transform at all.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl FileFilter {
    /// An empty `include` falls back to [`DEFAULT_INCLUDE`].
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = if include.is_empty() {
            glob_set(DEFAULT_INCLUDE.iter().copied())?
        } else {
            glob_set(include.iter().map(String::as_str))?
        };
        let exclude = glob_set(exclude.iter().map(String::as_str))?;
        Ok(Self { include, exclude })
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            include: glob_set(DEFAULT_INCLUDE.iter().copied()).unwrap_or_else(|_| GlobSet::empty()),
            exclude: GlobSet::empty(),
        }
    }
}

fn glob_set<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet> {
    let mut b = GlobSetBuilder::new();
    for p in patterns {
        b.add(Glob::new(p).with_context(|| format!("invalid glob pattern `{p}`"))?);
    }
    b.build().context("failed to build glob set")
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Output directory (default: target/tagsugar-gen)
    pub out_dir: Option<PathBuf>,
    pub emit: EmitMode,
    pub source_map: bool,
    pub transform: TransformOptions,
    pub filter: FileFilter,
}

/// A selected input and where its output goes, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path below the directory it was found in; just the file name for files
    /// passed directly.
    pub relative: PathBuf,
}

/// Expand directories and drop files the filter rejects.
pub fn collect_inputs(inputs: &[PathBuf], filter: &FileFilter) -> Result<Vec<SourceFile>> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<SourceFile>) -> Result<()> {
        let rd = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
        let mut entries = Vec::new();
        for entry in rd {
            let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
            entries.push(entry.path());
        }
        entries.sort();
        for path in entries {
            if path.is_dir() {
                walk(root, &path, out)?;
            } else {
                let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                out.push(SourceFile { path, relative });
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            walk(input, input, &mut files)?;
        } else {
            let relative = input
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| input.clone());
            files.push(SourceFile {
                path: input.clone(),
                relative,
            });
        }
    }
    files.retain(|f| {
        let keep = filter.matches(&f.path);
        if !keep {
            log::info!("skipping {} (filtered out)", f.path.display());
        }
        keep
    });
    Ok(files)
}

/// Transform every selected input into `out_dir`, mirroring each input's path
/// below the directory it came from. Files are independent: a failure is
/// reported and the rest still build, but the command fails.
pub fn build_cmd(inputs: &[PathBuf], opts: &BuildOptions) -> Result<Vec<PathBuf>> {
    let out_dir = opts
        .out_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("target/tagsugar-gen"));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let files = collect_inputs(inputs, &opts.filter)?;
    let mut claimed: HashMap<&Path, &Path> = HashMap::new();
    let mut written = Vec::new();
    let mut failed = 0usize;
    for file in &files {
        if let Some(first) = claimed.get(file.relative.as_path()) {
            eprintln!(
                "error: {} and {} both write {}",
                first.display(),
                file.path.display(),
                out_dir.join(&file.relative).display()
            );
            failed += 1;
            continue;
        }
        claimed.insert(&file.relative, &file.path);
        match build_file(&file.path, &out_dir.join(&file.relative), opts) {
            Ok(out_path) => {
                println!("Generated: {}", out_path.display());
                written.push(out_path);
            }
            Err(e) => {
                eprintln!("error: {e:#}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} files failed", files.len());
    }
    Ok(written)
}

/// Transform one file and write it to `out_path`; returns the written path.
pub fn build_file(input: &Path, out_path: &Path, opts: &BuildOptions) -> Result<PathBuf> {
    let src =
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    match opts.emit {
        EmitMode::Code => {
            let printed = tagsugar_jsx::transform(&src, &opts.transform)
                .with_context(|| format!("failed to transform {}", input.display()))?;
            fs::write(out_path, &printed.code)
                .with_context(|| format!("failed to write {}", out_path.display()))?;
            if opts.source_map {
                let mut map_path = out_path.as_os_str().to_owned();
                map_path.push(".map.json");
                let map_path = PathBuf::from(map_path);
                let json = serde_json::json!({
                    "source": input.display().to_string(),
                    "mappings": printed.map.mappings,
                });
                let text = serde_json::to_string_pretty(&json).context("serialize source map")?;
                fs::write(&map_path, text)
                    .with_context(|| format!("failed to write {}", map_path.display()))?;
            }
            Ok(out_path.to_path_buf())
        }
        EmitMode::Tree => {
            let doc = tagsugar_jsx::transform_tree(&src, &opts.transform)
                .with_context(|| format!("failed to transform {}", input.display()))?;
            let out_path = out_path.with_extension("tree.txt");
            fs::write(&out_path, format!("{doc:#?}\n"))
                .with_context(|| format!("failed to write {}", out_path.display()))?;
            Ok(out_path)
        }
    }
}

/// Parse and rewrite without writing; returns how many files were checked.
pub fn check_cmd(inputs: &[PathBuf], filter: &FileFilter, options: &TransformOptions) -> Result<usize> {
    let files = collect_inputs(inputs, filter)?;
    let mut failed = 0usize;
    for file in &files {
        let result = fs::read_to_string(&file.path)
            .map_err(anyhow::Error::from)
            .and_then(|src| Ok(tagsugar_jsx::transform_tree(&src, options)?));
        if let Err(e) = result {
            eprintln!("{}: {e}", file.path.display());
            failed += 1;
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} files failed", files.len());
    }
    Ok(files.len())
}
