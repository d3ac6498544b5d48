use clap::{Parser, Subcommand};
use pagesmith::backend::GeminiBackend;
use pagesmith::bundle::{self, Bundle};
use pagesmith::config::{self, GeneratorConfig};
use pagesmith::naming::slugify;
use pagesmith::pipeline::{self, GenerationSettings, Run};
use pagesmith::{output, preview};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "pagesmith")]
#[command(about = "Generate an illustrated one-page redirect site from a topic")]
#[command(long_about = "\
Generate an illustrated one-page redirect site from a topic

An AI service writes a Chinese article about the topic and draws up to three
illustrations. The result is packaged as <slug>.zip:

  ai-trends.zip
  ├── index.html        # Redirects to the target URL; article for crawlers
  ├── README.md         # Markdown mirror of the article
  ├── LICENSE           # MIT
  ├── .gitignore
  ├── robots.txt
  ├── sitemap.xml
  └── ai-trends-1.png   # One per image obtained

The API key is read from the environment variable named by api.api_key_env
(GEMINI_API_KEY by default).

Run 'pagesmith gen-config' to generate a documented pagesmith.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./pagesmith.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write an article and images for a topic, then package the site
    Generate {
        /// Topic or keyword the article is about
        topic: String,

        /// Where the page sends visitors (default: site.redirect_url)
        #[arg(long)]
        redirect: Option<String>,

        /// Directory the archive is written to
        #[arg(long, default_value = "dist")]
        output: PathBuf,

        /// Pause between image requests, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Number of image prompts to illustrate (0-3)
        #[arg(long)]
        images: Option<usize>,

        /// Also save the finished run as JSON for later packaging
        #[arg(long)]
        save_run: Option<PathBuf>,
    },
    /// Package a saved run without calling the AI service
    Package {
        /// Run file written by `generate --save-run`
        run: PathBuf,

        /// Directory the archive is written to
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },
    /// Render a saved run as a standalone HTML preview
    Preview {
        /// Run file written by `generate --save-run`
        run: PathBuf,

        /// Preview file (default: <slug>.preview.html)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a stock pagesmith.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("pagesmith=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Generate {
            topic,
            redirect,
            output,
            delay_ms,
            images,
            save_run,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(delay_ms) = delay_ms {
                config.images.delay_ms = delay_ms;
            }
            if let Some(images) = images {
                config.images.count = images;
            }
            config.validate()?;

            let redirect = redirect.unwrap_or_else(|| config.site.redirect_url.clone());
            check_redirect_url(&redirect)?;

            let backend = GeminiBackend::from_config(&config.api)?;
            let settings = GenerationSettings::from_config(&config);
            let mut run = Run::default();

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_run_event(&event);
                }
            });
            let result =
                pipeline::generate(&backend, &settings, &mut run, &topic, &redirect, Some(tx))
                    .await;
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            result?;

            match bundle::package_run(
                &run,
                &config.site,
                &output,
                save_run.as_deref(),
                bundle::current_year(),
            ) {
                Ok(packaged) => {
                    output::print_bundle_output(&packaged.bundle, &packaged.archive);
                }
                Err(e) => {
                    if let Some(saved) = &e.saved_run {
                        println!(
                            "Packaging failed; run saved to {} (retry with `pagesmith package`)",
                            saved.display()
                        );
                    }
                    return Err(e.into());
                }
            }
        }
        Command::Package { run, output } => {
            let config = load_config(cli.config.as_deref())?;
            let run = Run::load(&run)?;
            package(&run, &config, &output)?;
        }
        Command::Preview { run, output } => {
            let run = Run::load(&run)?;
            let markup = preview::render_run(&run).ok_or("run has no generated content")?;
            let path = output
                .unwrap_or_else(|| PathBuf::from(format!("{}.preview.html", slugify(&run.topic))));
            std::fs::write(&path, markup.into_string())?;
            println!("Preview \u{2192} {}", path.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Explicit `--config` file, else `./pagesmith.toml`, else stock defaults.
fn load_config(path: Option<&Path>) -> Result<GeneratorConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

/// Syntax check only; the target is never fetched.
fn check_redirect_url(redirect: &str) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = url::Url::parse(redirect.trim())
        .map_err(|e| format!("invalid redirect URL {redirect:?}: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("redirect URL must be http or https: {redirect}").into());
    }
    Ok(())
}

fn package(
    run: &Run,
    config: &GeneratorConfig,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let bundle: Bundle = bundle::assemble_run(run, &config.site, bundle::current_year())?;
    let path = bundle.write_zip(output_dir)?;
    output::print_bundle_output(&bundle, &path);
    Ok(())
}
