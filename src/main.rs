use clap::Parser;
use intra_card::{
  write_card, CardConfig, CardJob, CursusId, Error, IntraApi, IntraApiConfigBuilder,
  MetricsOptions, Result, API_URL,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

const MAX_COLUMNS: i64 = 8;

/// Renders a 42 intra progress card as SVG.
#[derive(Parser)]
#[command(name = "intra-card", version)]
struct Cli {
  /// Intra login of the user to render
  #[arg(env = "INTRA_LOGIN")]
  login: String,

  /// Output file
  #[arg(short, long, default_value = "progress.svg")]
  output: PathBuf,

  /// SVG template with %%PLACEHOLDER%% tokens instead of the built-in layout
  #[arg(short, long)]
  template: Option<PathBuf>,

  /// Cursus to read the level and skills from
  #[arg(long, default_value_t = CursusId::MAIN.0)]
  cursus_id: u64,

  /// Level shown as 100% on the target bar
  #[arg(long, default_value_t = 21.0)]
  target_level: f64,

  /// Label of the target bar
  #[arg(long, default_value = "RNCP 7")]
  target_label: String,

  /// Skill level drawn as a full bar
  #[arg(long, default_value_t = 20.0)]
  skill_max: f64,

  /// Number of skill columns
  #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=MAX_COLUMNS))]
  columns: u32,

  /// In-progress project to leave off the card
  #[arg(long)]
  exclude_project: Option<String>,

  /// Do not list in-progress projects
  #[arg(long)]
  no_activities: bool,

  /// Base url of the intra api
  #[arg(long, env = "INTRA_API_URL", default_value = API_URL)]
  api_url: String,
}

fn secret(name: &'static str) -> Result<String> {
  match dotenvy::var(name) {
    Ok(value) if !value.is_empty() => Ok(value),
    _ => Err(Error::MissingVariable(name)),
  }
}

async fn run(cli: Cli) -> Result<()> {
  let client_id = secret("API_UID")?;
  let client_secret = secret("API_SECRET")?;

  let config = IntraApiConfigBuilder::default()
    .client_id(client_id)
    .client_secret(client_secret)
    .api_url(cli.api_url)
    .build()?;

  let card = CardConfig {
    columns: cli.columns,
    skill_max: cli.skill_max,
    target_label: cli.target_label,
    show_activities: !cli.no_activities,
    ..CardConfig::default()
  };

  let job = CardJob {
    login: cli.login,
    metrics: MetricsOptions {
      cursus_id: CursusId(cli.cursus_id),
      target_level: cli.target_level,
      excluded_project: cli.exclude_project,
    },
    card,
    template: cli.template,
    output: cli.output,
  };

  let api = IntraApi::authenticate(config).await?;

  write_card(&api, &job).await
}

#[tokio::main]
async fn main() -> ExitCode {
  dotenvy::dotenv().ok();

  fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  match run(cli).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      error!("{err}");
      ExitCode::from(err.exit_code())
    }
  }
}
