use crate::api::parse_profile;
use crate::config::{Config, load_config};
use crate::layout::container_height;
use crate::render::{WidgetKind, WidgetOptions, badge, format_date, render_widget};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info};

#[derive(Parser, Debug)]
#[command(name = "ftw", version, about = "Terminal-style SVG widgets for 42 student profiles")]
pub struct Args {
    /// Log at debug level
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render one widget from a profile JSON file
    Render(RenderArgs),
    /// Serve widgets over HTTP
    Serve(ServeArgs),
}

#[derive(ClapArgs, Debug)]
pub struct RenderArgs {
    #[arg(value_enum)]
    pub widget: WidgetArg,

    /// Profile JSON (upstream payload or exported profile) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// dark or light
    #[arg(short = 't', long = "theme")]
    pub theme: Option<String>,

    #[arg(short = 'w', long = "width")]
    pub width: Option<u32>,

    #[arg(long = "max-skills")]
    pub max_skills: Option<usize>,

    #[arg(long = "max-projects")]
    pub max_projects: Option<usize>,

    #[arg(long = "include-piscine")]
    pub include_piscine: bool,

    /// Level to show instead of the one resolved from the cursus records
    #[arg(long = "level")]
    pub level: Option<f64>,
}

#[derive(ClapArgs, Debug)]
pub struct ServeArgs {
    #[arg(long = "host")]
    pub host: Option<String>,

    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Directory of `<login>.json` profiles
    #[arg(long = "data-dir", conflicts_with = "mock")]
    pub data_dir: Option<PathBuf>,

    /// Serve the built-in demo profile for every login
    #[arg(long = "mock")]
    pub mock: bool,

    #[arg(long = "cache-dir")]
    pub cache_dir: Option<PathBuf>,

    #[arg(long = "workers")]
    pub workers: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetArg {
    Skills,
    Projects,
    Student,
    Badge,
}

impl From<WidgetArg> for WidgetKind {
    fn from(arg: WidgetArg) -> Self {
        match arg {
            WidgetArg::Skills => WidgetKind::Skills,
            WidgetArg::Projects => WidgetKind::Projects,
            WidgetArg::Student => WidgetKind::Student,
            WidgetArg::Badge => WidgetKind::Badge,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let config = load_config(args.config.as_deref())?;
    match args.command {
        Command::Render(render) => run_render(render, config),
        Command::Serve(serve) => run_serve(serve, config),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Command-line flags win over the config file.
fn merge_options(args: &RenderArgs, config: &Config) -> WidgetOptions {
    let now = Utc::now();
    let defaults = &config.widget;
    WidgetOptions {
        width: args.width.unwrap_or(defaults.width),
        max_skills: args.max_skills.unwrap_or(defaults.max_skills),
        max_projects: args.max_projects.unwrap_or(defaults.max_projects),
        include_piscine: args.include_piscine || defaults.include_piscine,
        level_override: args.level,
        as_of: Some(now),
        footer_note: Some(format!("updated {}", format_date(Some(&now)))),
    }
}

fn run_render(args: RenderArgs, config: Config) -> Result<()> {
    let input = read_input(args.input.as_deref())?;
    let profile = parse_profile(&input).context("failed to read student profile")?;
    let kind = WidgetKind::from(args.widget);
    let theme = config.theme(args.theme.as_deref());
    let options = merge_options(&args, &config);
    debug!(login = %profile.login, %kind, theme = %theme.name, "rendering");
    let svg = render_widget(kind, &profile, &theme, &options);

    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref()),
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            let (width, height) = match kind {
                WidgetKind::Badge => (badge::badge_width(&profile.login), badge::BADGE_HEIGHT),
                _ => (options.width, container_height(kind, &profile)),
            };
            write_output_png(&svg, &output, width, height, &config)
        }
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
            info!(path = %path.display(), "wrote svg");
        }
        None => print!("{svg}"),
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_output_png(svg: &str, output: &Path, width: u32, height: u32, config: &Config) -> Result<()> {
    let png = crate::raster::rasterize(svg, width, height, config.render.scale)?;
    std::fs::write(output, &png)?;
    info!(path = %output.display(), bytes = png.len(), "wrote png");
    Ok(())
}

#[cfg(not(feature = "png"))]
fn write_output_png(_svg: &str, _output: &Path, _width: u32, _height: u32, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the 'png' feature"))
}

#[cfg(feature = "serve")]
fn run_serve(args: ServeArgs, mut config: Config) -> Result<()> {
    use crate::serve::{AppState, bind_server};
    use crate::source::{CachedSource, DirectorySource, MockSource, StudentSource};

    let serve = &mut config.serve;
    if let Some(host) = args.host {
        serve.host = host;
    }
    if let Some(port) = args.port {
        serve.port = port;
    }
    if let Some(dir) = args.cache_dir {
        serve.cache_dir = dir;
    }
    if let Some(workers) = args.workers {
        serve.workers = workers;
    }
    if args.mock {
        serve.mock = true;
        serve.data_dir = None;
    } else if let Some(dir) = args.data_dir {
        serve.mock = false;
        serve.data_dir = Some(dir);
    }

    let ttl = serve.profile_ttl();
    let source: Box<dyn StudentSource> = match (&serve.data_dir, serve.mock) {
        (Some(dir), false) => {
            info!(dir = %dir.display(), "serving profiles from directory");
            Box::new(CachedSource::new(DirectorySource::new(dir), ttl))
        }
        _ => {
            info!("serving the demo profile");
            Box::new(MockSource)
        }
    };
    bind_server(AppState::new(config, source))?.run()
}

#[cfg(not(feature = "serve"))]
fn run_serve(_args: ServeArgs, _config: Config) -> Result<()> {
    Err(anyhow::anyhow!("the HTTP server requires the 'serve' feature"))
}
