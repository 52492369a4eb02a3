// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use coursemart_api::Client;
use coursemart_app::{LayoutResolver, Screen, ShellCommand, ShellState};
use coursemart_routes::RouteTable;
use runtime::{ApiSources, CacheSettings, MarketplaceRuntime};
use std::env;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `coursemart --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let interactive =
        !options.check_only && options.layout_path.is_none() && options.export_path.is_none();
    init_logging(&config, interactive)?;

    let routes = config.route_table()?;
    tracing::debug!(
        routes = routes.len(),
        config = %options.config_path.display(),
        "config loaded"
    );

    if let Some(path) = &options.layout_path {
        print!("{}", describe_layout(&routes, path));
        return Ok(());
    }

    let start = match &options.open_path {
        Some(path) => screen_for_path(path)?,
        None => Screen::Catalog,
    };

    let export_dir = env::current_dir().context("resolve current directory for exports")?;
    let mut runtime = if options.demo {
        MarketplaceRuntime::demo(config.page_size(), export_dir)
    } else {
        let client = Client::new(config.api_base_url(), config.api_timeout()?).with_context(|| {
            format!(
                "invalid [api] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        })?;
        let cache = if config.cache_enabled() {
            let settings = CacheSettings {
                path: config.cache_path()?,
                ttl: config.cache_ttl()?,
            };
            runtime::evict_stale_pages(&settings).with_context(|| {
                format!(
                    "open page cache {} -- if this path is wrong, set [cache].path or COURSEMART_CACHE_PATH",
                    settings.path.display()
                )
            })?;
            Some(settings)
        } else {
            None
        };
        let sources = ApiSources::new(
            &client,
            |resource| config.api_resource(resource).to_owned(),
            cache.as_ref(),
        )?;
        MarketplaceRuntime::api(sources, config.page_size(), export_dir)
    };

    if options.check_only {
        println!(
            "config ok: {} routes, starting screen {}",
            routes.len(),
            start.path()
        );
        return Ok(());
    }

    if let Some(path) = &options.export_path {
        let csv = coursemart_tui::export_screen(&mut runtime, start)?;
        runtime::write_csv(path, &csv)?;
        println!("{}", path.display());
        return Ok(());
    }

    let mut shell = ShellState::default();
    shell.dispatch(ShellCommand::Open(start), &routes);
    tracing::info!(screen = start.label(), demo = options.demo, "starting shell");
    coursemart_tui::run_app(&mut shell, &routes, &mut runtime)
}

/// Logs go to `[log].file` when set. Otherwise the interactive shell logs to
/// a file under the cache directory, since the UI owns the terminal, and
/// one-shot commands log to stderr.
fn init_logging(config: &Config, interactive: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.log_filter())
            .with_context(|| format!("invalid log filter {:?}", config.log_filter()))?,
    };

    let log_file = match config.log_file() {
        Some(path) => Some(path),
        None if interactive => Some(default_log_path()?),
        None => None,
    };

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()
                .context("install log subscriber")?;
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .try_init()
                .context("install log subscriber")?;
        }
    }
    Ok(())
}

fn default_log_path() -> Result<PathBuf> {
    let cache_root = dirs::cache_dir().ok_or_else(|| {
        anyhow!("cannot resolve cache directory; set [log].file in the config")
    })?;
    Ok(cache_root.join("coursemart").join("coursemart.log"))
}

fn screen_for_path(path: &str) -> Result<Screen> {
    Screen::from_path(path).ok_or_else(|| {
        let known: Vec<&str> = Screen::ALL.iter().map(|screen| screen.path()).collect();
        anyhow!(
            "no table screen at {path:?}; choose one of: {}",
            known.join(", ")
        )
    })
}

fn describe_layout(routes: &RouteTable, path: &str) -> String {
    let layout = routes.layout_for(path);
    let mut lines = vec![format!("path     {path}")];
    match routes.resolve(path) {
        Some(matched) => {
            lines.push(format!("pattern  {}", matched.route.pattern));
            for (name, value) in &matched.params {
                lines.push(format!("param    {name}={value}"));
            }
        }
        None => lines.push("pattern  (none; fallback chrome)".to_owned()),
    }
    lines.push(format!("sidebar  {}", layout.sidebar.as_str()));
    lines.push(format!("header   {}", layout.header.as_str()));
    lines.push(format!("links    {}", layout.links.as_str()));
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    layout_path: Option<String>,
    open_path: Option<String>,
    export_path: Option<PathBuf>,
    demo: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        layout_path: None,
        open_path: None,
        export_path: None,
        demo: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--layout" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--layout requires a URL path such as /admin/orders"))?;
                options.layout_path = Some(value.as_ref().to_owned());
            }
            "--open" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--open requires a screen path such as /courses"))?;
                options.open_path = Some(value.as_ref().to_owned());
            }
            "--export" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--export requires an output file path"))?;
                options.export_path = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                bail!("unknown argument {unknown:?}; run with --help to see supported options");
            }
        }
    }

    if options.export_path.is_some() && options.check_only {
        bail!("--export and --check cannot be combined");
    }

    Ok(options)
}

fn print_help() {
    println!("coursemart");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --layout <path>          Print the chrome resolved for a URL path");
    println!("  --open <path>            Start on a table screen (default /courses)");
    println!("  --export <file>          Write the starting screen as CSV and exit");
    println!("  --demo                   Use seeded in-memory data instead of the API");
    println!("  --check                  Validate config, routes and the API client setup");
    println!("  --help                   Show this help");
}
