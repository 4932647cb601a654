use anyhow::Result;
use ast_surgeon::imports::{add_imports, ImportRequest};
use ast_surgeon::query::{resolve_preset, Query, PRESETS};
use ast_surgeon::remove::{remove_targets, DeclCategory, RemoveTarget};
use ast_surgeon::search::{search, SearchOptions};
use ast_surgeon::transform::{run as run_transform, QuerySource, TransformRequest};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ast-surgeon")]
#[command(about = "Structure-aware code search and transformation for TypeScript", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the query comes from: inline JSON, a JSON file, or a named preset.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct QueryArgs {
    /// Inline query JSON
    #[arg(short, long)]
    query: Option<String>,

    /// Path to a query JSON file
    #[arg(long)]
    query_file: Option<PathBuf>,

    /// Named built-in preset (see `presets`)
    #[arg(short, long)]
    preset: Option<String>,
}

#[derive(Args)]
struct FilterArgs {
    /// Include glob, relative to the search root (repeatable)
    #[arg(long)]
    include: Vec<String>,

    /// Exclude glob, applied after includes (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Stop after this many matches across all files
    #[arg(short, long)]
    limit: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a file or directory for nodes matching a query
    Search {
        /// File or directory to search
        path: PathBuf,

        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Emit the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite matching nodes using a replacement template
    Rewrite {
        /// File or directory to rewrite
        path: PathBuf,

        #[command(flatten)]
        query: QueryArgs,

        /// Replacement template with ${label} placeholders
        #[arg(short, long)]
        replace: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Write changes to disk (default is a dry run)
        #[arg(short, long)]
        write: bool,

        /// Show a per-change diff
        #[arg(short, long)]
        diff: bool,

        /// Emit the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove declarations, statements, or call blocks from one file
    Remove {
        /// File to edit
        file: PathBuf,

        /// Remove a function declaration by name (repeatable)
        #[arg(long)]
        function: Vec<String>,

        /// Remove a class declaration by name (repeatable)
        #[arg(long)]
        class: Vec<String>,

        /// Remove an interface declaration by name (repeatable)
        #[arg(long)]
        interface: Vec<String>,

        /// Remove a type alias by name (repeatable)
        #[arg(long)]
        type_alias: Vec<String>,

        /// Remove a variable declaration by name (repeatable)
        #[arg(long)]
        variable: Vec<String>,

        /// Remove an enum declaration by name (repeatable)
        #[arg(long = "enum")]
        enum_name: Vec<String>,

        /// Remove the statement starting at this 1-based line (repeatable)
        #[arg(long)]
        line: Vec<usize>,

        /// Remove a call block by callee name (requires --arg or --arg-pattern)
        #[arg(long)]
        call: Option<String>,

        /// Exact first-argument match for --call
        #[arg(long, requires = "call")]
        arg: Option<String>,

        /// Regex first-argument match for --call
        #[arg(long, requires = "call", conflicts_with = "arg")]
        arg_pattern: Option<String>,

        /// Write changes to disk (default is a dry run)
        #[arg(short, long)]
        write: bool,

        /// Show a full-file diff
        #[arg(short, long)]
        diff: bool,

        /// Emit the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ensure an import exists, merging into an existing statement
    AddImport {
        /// File to edit
        file: PathBuf,

        /// Module specifier, e.g. "./util" or "node:path"
        #[arg(short, long)]
        from: String,

        /// Named specifier to ensure (repeatable)
        #[arg(short, long)]
        named: Vec<String>,

        /// Default binding to ensure, added only when none exists
        #[arg(long)]
        default: Option<String>,

        /// Write changes to disk (default is a dry run)
        #[arg(short, long)]
        write: bool,

        /// Emit the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List built-in query presets
    Presets,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            path,
            query,
            filters,
            json,
        } => cmd_search(&path, query, filters, json),

        Commands::Rewrite {
            path,
            query,
            replace,
            filters,
            write,
            diff,
            json,
        } => cmd_rewrite(&path, query, replace, filters, write, diff, json),

        Commands::Remove {
            file,
            function,
            class,
            interface,
            type_alias,
            variable,
            enum_name,
            line,
            call,
            arg,
            arg_pattern,
            write,
            diff,
            json,
        } => {
            let targets = build_remove_targets(
                function, class, interface, type_alias, variable, enum_name, line, call, arg,
                arg_pattern,
            )?;
            cmd_remove(&file, targets, write, diff, json)
        }

        Commands::AddImport {
            file,
            from,
            named,
            default,
            write,
            json,
        } => cmd_add_import(&file, from, named, default, write, json),

        Commands::Presets => cmd_presets(),
    }
}

fn load_query(args: &QueryArgs) -> Result<Query> {
    if let Some(json) = &args.query {
        return Ok(Query::from_json_str(json)?);
    }
    if let Some(path) = &args.query_file {
        return Ok(Query::from_json_path(path)?);
    }
    let name = args.preset.as_deref().expect("clap enforces the group");
    Ok(resolve_preset(name)?)
}

fn search_options(filters: &FilterArgs) -> SearchOptions {
    SearchOptions {
        include: filters.include.clone(),
        exclude: filters.exclude.clone(),
        limit: filters.limit,
    }
}

fn cmd_search(path: &Path, query: QueryArgs, filters: FilterArgs, json: bool) -> Result<()> {
    let compiled = load_query(&query)?.compile()?;
    let outcome = search(path, &compiled, &search_options(&filters))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    for m in &outcome.matches {
        println!(
            "{}:{}:{} {} {}",
            m.file.display(),
            m.line,
            m.column,
            m.kind.cyan(),
            m.preview.dimmed()
        );
        for (label, value) in &m.captures {
            println!("    {} = {}", label.yellow(), value.text);
        }
    }

    for failure in &outcome.failures {
        eprintln!(
            "{} {}: {}",
            "✗".red(),
            failure.file.display(),
            failure.reason
        );
    }

    println!();
    println!("{}", "Summary:".bold());
    println!(
        "  {} matches in {} of {} files",
        format!("{}", outcome.matches.len()).green(),
        outcome.files_with_matches,
        outcome.total_files
    );
    if outcome.truncated {
        println!("  {}", "result truncated by --limit".yellow());
    }
    if !outcome.failures.is_empty() {
        println!(
            "  {} files failed",
            format!("{}", outcome.failures.len()).red()
        );
    }

    if !outcome.failures.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_rewrite(
    path: &Path,
    query: QueryArgs,
    replace: String,
    filters: FilterArgs,
    write: bool,
    show_diff: bool,
    json: bool,
) -> Result<()> {
    let source = if let Some(name) = &query.preset {
        QuerySource::Preset(name.clone())
    } else {
        QuerySource::Inline(load_query(&query)?)
    };

    let request = TransformRequest {
        source,
        path: path.to_path_buf(),
        options: search_options(&filters),
        replacement: Some(replace),
        dry_run: !write,
    };
    let report = run_transform(&request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if !write {
            println!("{}", "[DRY RUN - no files were modified]".cyan());
        }

        for change in &report.changes {
            println!(
                "{} {}:{}",
                "✓".green(),
                change.file.display(),
                change.line
            );
            if show_diff {
                display_diff(&change.before, &change.after);
            } else {
                println!("    {} {}", "-".red(), change.before.red());
                println!("    {} {}", "+".green(), change.after.green());
            }
        }

        for failure in &report.failed {
            match failure.line {
                Some(line) => eprintln!(
                    "{} {}:{}: {}",
                    "✗".red(),
                    failure.file.display(),
                    line,
                    failure.reason
                ),
                None => eprintln!("{} {}: {}", "✗".red(), failure.file.display(), failure.reason),
            }
        }

        println!();
        println!("{}", "Summary:".bold());
        println!(
            "  {} changes in {} files",
            format!("{}", report.changes.len()).green(),
            report.files_modified
        );
        println!("  {} failed", format!("{}", report.failed_count()).red());
        if report.truncated {
            println!("  {}", "result truncated by --limit".yellow());
        }
    }

    if report.failed_count() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_remove_targets(
    function: Vec<String>,
    class: Vec<String>,
    interface: Vec<String>,
    type_alias: Vec<String>,
    variable: Vec<String>,
    enum_name: Vec<String>,
    line: Vec<usize>,
    call: Option<String>,
    arg: Option<String>,
    arg_pattern: Option<String>,
) -> Result<Vec<RemoveTarget>> {
    let mut targets = Vec::new();
    let declarations = [
        (DeclCategory::Function, function),
        (DeclCategory::Class, class),
        (DeclCategory::Interface, interface),
        (DeclCategory::TypeAlias, type_alias),
        (DeclCategory::Variable, variable),
        (DeclCategory::Enum, enum_name),
    ];
    for (category, names) in declarations {
        for name in names {
            targets.push(RemoveTarget::Declaration { category, name });
        }
    }
    for l in line {
        targets.push(RemoveTarget::Statement { line: l });
    }
    if let Some(callee) = call {
        targets.push(RemoveTarget::CallBlock {
            callee,
            arg,
            arg_pattern,
        });
    }
    if targets.is_empty() {
        anyhow::bail!("no removal targets given; see `ast-surgeon remove --help`");
    }
    Ok(targets)
}

fn cmd_remove(
    file: &Path,
    targets: Vec<RemoveTarget>,
    write: bool,
    show_diff: bool,
    json: bool,
) -> Result<()> {
    let before = if show_diff && write {
        fs::read_to_string(file).ok()
    } else {
        None
    };

    let report = remove_targets(file, &targets, !write)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if !write {
            println!("{}", "[DRY RUN - no files were modified]".cyan());
        }

        for item in &report.results {
            if item.removed {
                match item.line {
                    Some(line) => println!("{} line {}: removed {}", "✓".green(), line, item.target),
                    None => println!("{} removed {}", "✓".green(), item.target),
                }
            } else {
                let reason = item.reason.as_deref().unwrap_or("unknown");
                eprintln!("{} {}: {}", "✗".red(), item.target, reason);
            }
        }

        if let (Some(original), Ok(modified)) = (&before, fs::read_to_string(file)) {
            if original != &modified {
                println!("\n{}", format!("--- {} (original)", file.display()).dimmed());
                println!("{}", format!("+++ {} (edited)", file.display()).dimmed());
                display_diff(original, &modified);
            }
        }

        println!();
        println!("{}", "Summary:".bold());
        println!("  {} removed", format!("{}", report.removed_count).green());
        println!("  {} failed", format!("{}", report.failed_count).red());
    }

    if report.failed_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_add_import(
    file: &Path,
    from: String,
    named: Vec<String>,
    default: Option<String>,
    write: bool,
    json: bool,
) -> Result<()> {
    let request = ImportRequest {
        from,
        named,
        default,
    };
    let report = add_imports(file, &[request], !write)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !write {
        println!("{}", "[DRY RUN - no files were modified]".cyan());
    }

    for result in &report.results {
        if result.created {
            println!(
                "{} {}: added import from \"{}\"",
                "✓".green(),
                file.display(),
                result.from
            );
        } else if !result.added.is_empty() {
            println!(
                "{} {}: merged {} into \"{}\"",
                "✓".green(),
                file.display(),
                result.added.join(", "),
                result.from
            );
        }
        if !result.skipped.is_empty() {
            println!(
                "{} already present: {}",
                "⊙".yellow(),
                result.skipped.join(", ")
            );
        }
    }

    if report.modified {
        println!();
        println!("{}", "Summary:".bold());
        println!(
            "  {} bindings added",
            format!("{}", report.added_count()).green()
        );
    } else {
        println!("{}", "nothing to do".dimmed());
    }
    Ok(())
}

fn cmd_presets() -> Result<()> {
    println!("{}", "Available presets:".bold());
    for preset in PRESETS {
        println!("  {}  {}", preset.name.cyan(), preset.description.dimmed());
    }
    Ok(())
}

/// Show a line diff between two span texts.
fn display_diff(before: &str, after: &str) {
    let diff = TextDiff::from_lines(before, after);
    for change in diff.iter_all_changes() {
        let line = change.to_string();
        let line = line.strip_suffix('\n').unwrap_or(&line);
        match change.tag() {
            ChangeTag::Delete => println!("    {}", format!("-{line}").red()),
            ChangeTag::Insert => println!("    {}", format!("+{line}").green()),
            ChangeTag::Equal => println!("     {line}"),
        }
    }
}
