use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};
use log::{debug, info, trace};
use serde::Serialize;

use depscope::analysis::{total_wasted, DuplicateGroup, SizeReport, UnusedDependency};
use depscope::graph::{CycleInfo, TreeNode};
use depscope::store::{format_size, DiscoveryProgress, Layout, Package};
use depscope::{AnalysisOptions, Project};

#[derive(Parser)]
#[command(name = "depscope")]
#[command(author = "Zachary Woods <143150513+zach-fau@users.noreply.github.com>")]
#[command(version)]
#[command(about = "Installed dependency analyzer for JavaScript projects", long_about = None)]
struct Cli {
    /// Project root (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    path: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Disk usage of installed packages
    Size {
        /// Number of largest packages to list
        #[arg(short, long, default_value_t = AnalysisOptions::default().top_n, value_parser = positive())]
        top: usize,
    },
    /// Packages installed at more than one version
    Duplicates {
        /// Number of groups to list
        #[arg(short, long, default_value_t = AnalysisOptions::default().top_n, value_parser = positive())]
        top: usize,
    },
    /// Dependency tree of the project or of one package
    Tree {
        /// Package to use as the root
        package: Option<String>,

        /// Deepest level to expand
        #[arg(short, long, default_value_t = AnalysisOptions::default().max_depth, value_parser = positive())]
        depth: usize,
    },
    /// Direct dependencies that no source file imports
    Unused,
    /// Circular dependencies among installed packages
    Cycles,
    /// Detected package manager layout
    Layout,
}

/// Limits are positive counts.
fn positive() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::<usize>::new().range(1..)
}

/// Reports discovery progress through the logger.
struct LogProgress;

impl DiscoveryProgress for LogProgress {
    fn candidates_located(&self, total: usize) {
        info!("Measuring {} installed packages", total);
    }

    fn package_measured(&self, package: &Package, completed: usize, total: usize) {
        trace!("[{}/{}] {} {}", completed, total, package, format_size(package.size));
    }
}

#[derive(Serialize)]
struct DuplicatesOutput<'a> {
    groups: &'a [DuplicateGroup],
    total_wasted: u64,
}

#[derive(Serialize)]
struct LayoutOutput<'a> {
    root: &'a std::path::Path,
    layout: Layout,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    let mut stdout = BufWriter::new(std::io::stdout());
    let start = Instant::now();

    let project = Project::open_with_progress(&cli.path, &LogProgress)
        .with_context(|| format!("Failed to analyze {}", cli.path.display()))?;
    info!(
        "Discovered {} packages in {}ms",
        project.index().len(),
        start.elapsed().as_millis()
    );

    match cli.command {
        Commands::Size { top } => {
            let report = project.size_report(top);
            if cli.json {
                write_json(&mut stdout, &report)?;
            } else {
                print_size(&mut stdout, &report)?;
            }
        }
        Commands::Duplicates { top } => {
            let groups = project.duplicates();
            let wasted = total_wasted(&groups);
            let shown = &groups[..groups.len().min(top)];
            if cli.json {
                write_json(
                    &mut stdout,
                    &DuplicatesOutput {
                        groups: shown,
                        total_wasted: wasted,
                    },
                )?;
            } else {
                print_duplicates(&mut stdout, shown, groups.len(), wasted)?;
            }
        }
        Commands::Tree { package, depth } => {
            let forest = project.tree(package.as_deref(), depth);
            if cli.json {
                write_json(&mut stdout, &forest)?;
            } else if forest.is_empty() {
                match package {
                    Some(name) => writeln!(stdout, "Package '{}' is not installed.", name)?,
                    None => writeln!(stdout, "No direct dependencies are installed.")?,
                }
            } else {
                print_forest(&mut stdout, &forest)?;
            }
        }
        Commands::Unused => {
            let unused = project.unused();
            if cli.json {
                write_json(&mut stdout, &unused)?;
            } else {
                print_unused(&mut stdout, &unused)?;
            }
        }
        Commands::Cycles => {
            let cycles = project.cycles();
            if cli.json {
                write_json(&mut stdout, &cycles)?;
            } else {
                print_cycles(&mut stdout, &cycles)?;
            }
        }
        Commands::Layout => {
            if cli.json {
                write_json(
                    &mut stdout,
                    &LayoutOutput {
                        root: project.root(),
                        layout: project.layout(),
                    },
                )?;
            } else {
                writeln!(
                    stdout,
                    "{}: {} ({} packages)",
                    project.root().display(),
                    project.layout(),
                    project.index().len()
                )?;
            }
        }
    }

    stdout.flush()?;
    debug!("Finished in {}ms", start.elapsed().as_millis());
    Ok(())
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    writeln!(out, "{}", json)?;
    Ok(())
}

fn print_size<W: Write>(out: &mut W, report: &SizeReport) -> Result<()> {
    writeln!(
        out,
        "{} packages, {} on disk",
        report.package_count,
        format_size(report.store_size)
    )?;
    for summary in &report.by_type {
        writeln!(
            out,
            "  {:<12} {:>6} packages {:>12}",
            summary.dep_type.to_string(),
            summary.count,
            format_size(summary.size)
        )?;
    }

    if !report.largest.is_empty() {
        writeln!(out, "\nLargest packages:")?;
        for pkg in &report.largest {
            writeln!(
                out,
                "  {:>12}  {}@{} [{}]",
                format_size(pkg.size),
                pkg.name,
                pkg.version,
                pkg.classification.label()
            )?;
        }
    }
    Ok(())
}

fn print_duplicates<W: Write>(
    out: &mut W,
    shown: &[DuplicateGroup],
    total: usize,
    wasted: u64,
) -> Result<()> {
    if total == 0 {
        writeln!(out, "No duplicate packages found.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{} packages installed at more than one version ({} reclaimable)",
        total,
        format_size(wasted)
    )?;
    for group in shown {
        writeln!(
            out,
            "  {} ({}): {}",
            group.name,
            format_size(group.total_size),
            group.version_list().join(", ")
        )?;
    }
    if shown.len() < total {
        writeln!(out, "  ... and {} more", total - shown.len())?;
    }
    Ok(())
}

fn print_forest<W: Write>(out: &mut W, forest: &[TreeNode]) -> Result<()> {
    for tree in forest {
        // Whether the ancestor at each depth was the last of its siblings.
        let mut last_at_depth: Vec<bool> = Vec::new();
        for row in tree.flatten() {
            last_at_depth.truncate(row.depth);
            let mut line = String::new();
            if row.depth > 0 {
                for &last in &last_at_depth[1..] {
                    line.push_str(if last { "    " } else { "│   " });
                }
                line.push_str(if row.is_last_child { "└── " } else { "├── " });
            }
            writeln!(
                out,
                "{}{}@{} ({})",
                line,
                row.name,
                row.version,
                format_size(row.size)
            )?;
            last_at_depth.push(row.is_last_child);
        }
    }
    Ok(())
}

fn print_unused<W: Write>(out: &mut W, unused: &[UnusedDependency]) -> Result<()> {
    if unused.is_empty() {
        writeln!(out, "No unused dependencies found.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{} possibly unused dependencies (candidates, verify before removing):",
        unused.len()
    )?;
    for dep in unused {
        writeln!(
            out,
            "  {}@{} [{}] {}",
            dep.name,
            dep.version,
            dep.classification.label(),
            format_size(dep.size)
        )?;
    }
    Ok(())
}

fn print_cycles<W: Write>(out: &mut W, cycles: &[CycleInfo]) -> Result<()> {
    if cycles.is_empty() {
        writeln!(out, "No circular dependencies found.")?;
        return Ok(());
    }

    writeln!(out, "{} circular dependencies:", cycles.len())?;
    for cycle in cycles {
        writeln!(out, "  {}", cycle.cycle_path())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_must_be_positive() {
        assert!(Cli::try_parse_from(["depscope", "size", "--top", "0"]).is_err());
        assert!(Cli::try_parse_from(["depscope", "duplicates", "--top", "0"]).is_err());
        assert!(Cli::try_parse_from(["depscope", "tree", "--depth", "0"]).is_err());
    }

    #[test]
    fn test_limit_defaults() {
        let cli = Cli::try_parse_from(["depscope", "tree", "react"]).unwrap();
        match cli.command {
            Commands::Tree { package, depth } => {
                assert_eq!(package.as_deref(), Some("react"));
                assert_eq!(depth, 3);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from(["depscope", "--json", "size", "-t", "5"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Size { top: 5 }));
    }
}
