// NextDiff: run from a window holding diff output with `file:addr c file:addr`
// headers, it selects the next header line and shows both changed regions in
// their own windows. Files already open are scrolled in place, so
// the mouse stays over NextDiff; files not yet open are plumbed.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::LevelFilter;
use nextdiff::acme::Acme;
use nextdiff::config::Settings;
use nextdiff::error::StartupError;
use nextdiff::pipeline::{self, Invocation};
use nextdiff::plumb::Plumber;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[arg(short, long, help = "Enables verbose logging")]
  verbose: bool
}

fn init_logging(verbose: bool) {
  let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
  if verbose {
    builder.filter_level(LevelFilter::Debug);
  }
  builder.format_target(false).format_timestamp(None).init();
}

fn run() -> Result<()> {
  let settings = Settings::load().context("Failed to load config")?;
  let invocation = Invocation::capture(settings)?;

  // A bad $winid is reported before touching acme.
  pipeline::window_id(invocation.winid.as_deref())?;

  let namespace = invocation.settings.namespace_dir().map_err(StartupError::Namespace)?;
  let acme = Acme::mount(&namespace).map_err(StartupError::Connect)?;
  let plumber = Plumber::new(namespace);

  let dispatched = pipeline::run(&invocation, &acme, &plumber)?;
  log::debug!("Done: {:?}", dispatched);
  Ok(())
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  match run() {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      log::error!("{:#}", err);
      ExitCode::FAILURE
    }
  }
}
