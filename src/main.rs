//! windlint CLI - command-line interface for convention enforcement
//!
//! CDD Principle: Application Layer - the CLI coordinates user interactions
//! - Translates user commands to domain operations
//! - Handles external concerns like file I/O, process exit codes, and terminal output
//! - Provides clean separation between user interface and lint logic

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use windlint::{
    AnalysisOptions, FileCache, LintConfig, LintError, LintOptions, LintResult, LintValidator,
    OutputFormat, ReportOptions, Severity,
};

const DEFAULT_CONFIGS: &[&str] = &["windlint.yaml", "windlint.yml", ".windlint.yaml"];
const DEFAULT_CACHE_FILE: &str = ".windlint/cache.json";

/// windlint - advisory linting for Tailwind CSS v4 and Next.js conventions
#[derive(Parser)]
#[command(name = "windlint")]
#[command(version)]
#[command(about = "Advisory linting for Tailwind CSS v4 and Next.js conventions")]
#[command(
    long_about = "windlint applies a team's Tailwind CSS v4 and Next.js styling conventions to source files and reports violations. Designed for editor loops, pre-commit hooks and CI integration."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files for convention violations
    Check {
        /// Paths to lint (files or directories)
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Minimum severity level to report
        #[arg(short, long, value_enum)]
        severity: Option<SeverityArg>,

        /// Maximum number of violations to report
        #[arg(long)]
        max_violations: Option<usize>,

        /// Additional exclude patterns
        #[arg(long, action = clap::ArgAction::Append)]
        exclude: Vec<String>,

        /// Ignore .windlintignore files
        #[arg(long)]
        no_ignore: bool,

        /// Disable parallel processing
        #[arg(long)]
        no_parallel: bool,

        /// Fail on first error
        #[arg(long)]
        fail_fast: bool,

        /// Enable caching for better performance
        #[arg(long)]
        cache: bool,

        /// Custom cache file path
        #[arg(long)]
        cache_file: Option<PathBuf>,
    },

    /// Watch for file changes and run checks automatically
    Watch {
        /// Path to watch (defaults to current directory)
        path: Option<PathBuf>,

        /// File patterns to watch (glob patterns)
        #[arg(short, long, action = clap::ArgAction::Append)]
        pattern: Vec<String>,

        /// Debounce delay in milliseconds
        #[arg(long, default_value = "500")]
        delay: u64,
    },

    /// Validate a configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },

    /// Explain what a specific rule does
    Explain {
        /// Rule id to explain
        rule_id: String,
    },

    /// Cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },

    /// List available rules
    Rules {
        /// Show only enabled rules
        #[arg(long)]
        enabled_only: bool,

        /// Filter by category
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show cache statistics
    Stats {
        /// Cache file path
        #[arg(long)]
        cache_file: Option<PathBuf>,
    },

    /// Clear the cache
    Clear {
        /// Cache file path
        #[arg(long)]
        cache_file: Option<PathBuf>,
    },

    /// Clean up stale cache entries
    Cleanup {
        /// Cache file path
        #[arg(long)]
        cache_file: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Junit,
    Sarif,
    Github,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Junit => OutputFormat::Junit,
            OutputFormatArg::Sarif => OutputFormat::Sarif,
            OutputFormatArg::Github => OutputFormat::GitHub,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum SeverityArg {
    Warning,
    Error,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Error => Severity::Error,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            // Exit code 2 marks an invalid invocation: unreadable path,
            // bad catalog, broken cache file
            eprintln!("Error: {e}");
            process::exit(2);
        }
    }
}

async fn run_command(cli: Cli) -> LintResult<i32> {
    match cli.command {
        Commands::Check {
            paths,
            format,
            severity,
            max_violations,
            exclude,
            no_ignore,
            no_parallel,
            fail_fast,
            cache,
            cache_file,
        } => {
            run_check(CheckArgs {
                config_path: cli.config,
                paths,
                format,
                severity,
                max_violations,
                exclude_patterns: exclude,
                no_ignore,
                no_parallel,
                fail_fast,
                use_cache: cache,
                cache_file,
                use_colors: !cli.no_color,
            })
            .await
        }
        Commands::Watch { path, pattern, delay } => run_watch(cli.config, path, pattern, delay).await,
        Commands::ValidateConfig { config_file } => run_validate_config(config_file.or(cli.config)),
        Commands::Explain { rule_id } => run_explain(cli.config, rule_id),
        Commands::Cache { action } => run_cache_command(action),
        Commands::Rules { enabled_only, category } => {
            run_list_rules(cli.config, enabled_only, category)
        }
    }
}

struct CheckArgs {
    config_path: Option<PathBuf>,
    paths: Vec<PathBuf>,
    format: OutputFormatArg,
    severity: Option<SeverityArg>,
    max_violations: Option<usize>,
    exclude_patterns: Vec<String>,
    no_ignore: bool,
    no_parallel: bool,
    fail_fast: bool,
    use_cache: bool,
    cache_file: Option<PathBuf>,
    use_colors: bool,
}

/// Load the configured catalog, falling back to default config file names
fn load_config(config_path: Option<PathBuf>) -> LintResult<LintConfig> {
    if let Some(config_path) = config_path {
        return LintConfig::load_from_file(config_path);
    }

    for config_name in DEFAULT_CONFIGS {
        if Path::new(config_name).exists() {
            return LintConfig::load_from_file(config_name);
        }
    }

    Ok(LintConfig::default())
}

async fn run_check(args: CheckArgs) -> LintResult<i32> {
    let config = load_config(args.config_path)?;

    // Missing inputs are an invocation error, not a lint result
    for path in &args.paths {
        if !path.exists() {
            return Err(LintError::config(format!("Path not found: {}", path.display())));
        }
    }

    let mut validator = LintValidator::new_with_config(config)?;

    if args.use_cache {
        let cache_path = args.cache_file.unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE));
        validator = validator.with_cache(cache_path)?;
    }

    let paths = if args.paths.is_empty() { vec![PathBuf::from(".")] } else { args.paths };

    let lint_options = LintOptions {
        use_cache: args.use_cache,
        output_format: args.format.into(),
        report_options: ReportOptions {
            use_colors: args.use_colors,
            max_violations: args.max_violations,
            min_severity: args.severity.map(|s| s.into()),
            ..Default::default()
        },
        analysis_options: AnalysisOptions {
            parallel: !args.no_parallel,
            fail_fast: args.fail_fast,
            exclude_patterns: args.exclude_patterns,
            ignore_ignore_files: args.no_ignore,
            ..Default::default()
        },
        ..Default::default()
    };

    let report = validator.check_with_options(paths, &lint_options).await?;

    let formatted = validator.format_report(&report, args.format.into())?;
    println!("{formatted}");

    if args.use_cache {
        if let Some(stats) = validator.cache_statistics() {
            if args.format == OutputFormatArg::Human {
                eprintln!("\nCache: {}", stats.format_display());
            }
        }
        validator.save_cache()?;
    }

    if report.has_errors() {
        Ok(1)
    } else {
        Ok(0)
    }
}

async fn run_watch(
    config_path: Option<PathBuf>,
    path: Option<PathBuf>,
    patterns: Vec<String>,
    delay_ms: u64,
) -> LintResult<i32> {
    use notify::{Event, RecursiveMode, Result as NotifyResult, Watcher};
    use std::sync::mpsc;
    use std::time::Duration;

    let watch_path = path.unwrap_or_else(|| PathBuf::from("."));
    if !watch_path.exists() {
        return Err(LintError::config(format!("Path not found: {}", watch_path.display())));
    }

    let watch_patterns = if patterns.is_empty() {
        vec![
            "**/*.tsx".to_string(),
            "**/*.jsx".to_string(),
            "**/*.ts".to_string(),
            "**/*.js".to_string(),
            "**/*.html".to_string(),
        ]
    } else {
        patterns
    };

    println!("🔍 Starting windlint watch mode...");
    println!("📂 Watching: {}", watch_path.display());
    println!("🎯 Patterns: {}", watch_patterns.join(", "));
    println!("⏱️  Debounce delay: {delay_ms}ms");
    println!("Press Ctrl+C to stop watching\n");

    let (tx, rx) = mpsc::channel();

    let mut watcher = notify::recommended_watcher(move |res: NotifyResult<Event>| match res {
        Ok(event) => {
            if let Err(e) = tx.send(event) {
                eprintln!("Error sending event: {e}");
            }
        }
        Err(e) => eprintln!("Watch error: {e}"),
    })
    .map_err(|e| LintError::config(format!("Failed to create file watcher: {e}")))?;

    watcher.watch(&watch_path, RecursiveMode::Recursive).map_err(|e| {
        LintError::config(format!("Failed to watch path '{}': {}", watch_path.display(), e))
    })?;

    let mut last_run = std::time::Instant::now();
    let debounce_duration = Duration::from_millis(delay_ms);

    println!("🚀 Running initial analysis...");
    run_watch_analysis(&watch_path, config_path.as_deref()).await;

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                if let Some(changed_config) = config_change(&event) {
                    println!("🔄 Configuration file changed: {}", changed_config.display());
                    run_watch_analysis(&watch_path, Some(changed_config.as_path())).await;
                    last_run = std::time::Instant::now();
                } else if should_trigger_analysis(&event, &watch_patterns) {
                    let now = std::time::Instant::now();
                    if now.duration_since(last_run) >= debounce_duration {
                        println!("📝 File changes detected, running analysis...");
                        run_watch_analysis(&watch_path, config_path.as_deref()).await;
                        last_run = now;
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                eprintln!("File watcher disconnected");
                break;
            }
        }
    }

    Ok(0)
}

/// Check if an event should trigger re-analysis
fn should_trigger_analysis(event: &notify::Event, patterns: &[String]) -> bool {
    use notify::EventKind;

    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
        _ => return false,
    }

    for path in &event.paths {
        let path_str = path.to_string_lossy();

        for pattern in patterns {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) {
                    return true;
                }
            }
        }
    }

    false
}

/// Check if an event indicates a config file change
fn config_change(event: &notify::Event) -> Option<PathBuf> {
    use notify::EventKind;

    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
        _ => return None,
    }

    for path in &event.paths {
        let file_name = path.file_name()?.to_str()?;
        if DEFAULT_CONFIGS.contains(&file_name) {
            return Some(path.clone());
        }
    }

    None
}

/// Run one analysis pass for watch mode, reporting errors without exiting
async fn run_watch_analysis(watch_path: &Path, config_path: Option<&Path>) {
    let config = match load_config(config_path.map(|p| p.to_path_buf())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("⚠️  Failed to load config: {e}");
            eprintln!("   Using default catalog instead...");
            LintConfig::default()
        }
    };

    let mut validator = match LintValidator::new_with_config(config) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("❌ Failed to build validator: {e}");
            return;
        }
    };

    match validator.check_paths(vec![watch_path]).await {
        Ok(report) => {
            match validator.format_report(&report, OutputFormat::Human) {
                Ok(formatted) => println!("{formatted}"),
                Err(e) => eprintln!("❌ Failed to format report: {e}"),
            }
            println!("⌚ Watching for changes... (Press Ctrl+C to stop)\n");
        }
        Err(e) => eprintln!("❌ Analysis error: {e}"),
    }
}

fn run_validate_config(config_path: Option<PathBuf>) -> LintResult<i32> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIGS[0]));

    println!("Validating configuration: {}", config_path.display());

    match LintConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("✅ Configuration is valid");

            let total_categories = config.rules.len();
            let enabled_categories = config.rules.values().filter(|c| c.enabled).count();
            let total_rules: usize = config.rules.values().map(|c| c.rules.len()).sum();
            let enabled_rules: usize = config
                .rules
                .values()
                .filter(|c| c.enabled)
                .map(|c| c.rules.iter().filter(|r| r.enabled).count())
                .sum();

            println!("📊 Configuration summary:");
            println!("  Categories: {total_categories} total, {enabled_categories} enabled");
            println!("  Rules: {total_rules} total, {enabled_rules} enabled");
            println!("  Path patterns: {}", config.paths.patterns.len());

            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {e}");
            Ok(2)
        }
    }
}

fn run_explain(config_path: Option<PathBuf>, rule_id: String) -> LintResult<i32> {
    let config = load_config(config_path)?;

    if let Some((category_name, category, rule)) = config.find_rule(&rule_id) {
        println!("📖 Rule: {}", rule.id);
        println!("📂 Category: {category_name}");
        println!("⚠️  Severity: {}", config.effective_severity(category, rule).as_str());
        println!("🔍 Type: {:?}", rule.kind);
        println!("✅ Enabled: {}", rule.enabled);
        println!();
        println!("📝 Description:");
        println!("   {}", rule.description);
        println!();
        println!("🔎 Pattern:");
        println!("   {}", rule.pattern);
        return Ok(0);
    }

    eprintln!("❌ Rule '{rule_id}' not found");
    println!();
    println!("Available rules:");

    for (category_name, category) in &config.rules {
        println!("  {category_name}:");
        for rule in &category.rules {
            println!("    - {}", rule.id);
        }
    }

    Ok(1)
}

fn run_cache_command(action: CacheCommands) -> LintResult<i32> {
    match action {
        CacheCommands::Stats { cache_file } => {
            let cache_path = cache_file.unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE));

            if !cache_path.exists() {
                println!("No cache file found at {}", cache_path.display());
                return Ok(1);
            }

            let mut cache = FileCache::new(&cache_path);
            cache.load()?;

            let stats = cache.statistics();
            println!("📊 Cache Statistics");
            println!("   File: {}", cache_path.display());
            println!("   {}", stats.format_display());
            println!("   Created: {}", format_timestamp(stats.created_at));
            println!("   Updated: {}", format_timestamp(stats.updated_at));

            Ok(0)
        }
        CacheCommands::Clear { cache_file } => {
            let cache_path = cache_file.unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE));

            let mut cache = FileCache::new(&cache_path);
            cache.load()?;
            cache.clear()?;

            println!("✅ Cache cleared: {}", cache_path.display());
            Ok(0)
        }
        CacheCommands::Cleanup { cache_file } => {
            let cache_path = cache_file.unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE));

            if !cache_path.exists() {
                println!("No cache file found at {}", cache_path.display());
                return Ok(1);
            }

            let mut cache = FileCache::new(&cache_path);
            cache.load()?;
            let removed = cache.cleanup()?;
            cache.save()?;

            println!("✅ Cleaned up {removed} stale cache entries");
            Ok(0)
        }
    }
}

fn run_list_rules(
    config_path: Option<PathBuf>,
    enabled_only: bool,
    category_filter: Option<String>,
) -> LintResult<i32> {
    let config = load_config(config_path)?;

    println!("📋 Available Rules\n");

    let mut categories: Vec<_> = config.rules.iter().collect();
    categories.sort_by_key(|(name, _)| name.as_str());

    for (category_name, category) in categories {
        if let Some(ref filter) = category_filter {
            if category_name != filter {
                continue;
            }
        }

        if enabled_only && !category.enabled {
            continue;
        }

        let status = if category.enabled { "✅" } else { "❌" };
        println!("{status} 📂 {} ({})", category_name, category.severity.as_str());

        for rule in &category.rules {
            if enabled_only && !rule.enabled {
                continue;
            }

            let rule_status = if rule.enabled { "✅" } else { "❌" };
            let severity = rule.severity.unwrap_or(category.severity);

            println!("  {rule_status} 🔍 {} [{}] - {}", rule.id, severity.as_str(), rule.description);
        }
        println!();
    }

    Ok(0)
}

fn init_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };

    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();
}

fn format_timestamp(timestamp: u64) -> String {
    use chrono::{TimeZone, Utc};

    let dt = Utc.timestamp_opt(timestamp as i64, 0).single().unwrap_or_else(Utc::now);

    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
