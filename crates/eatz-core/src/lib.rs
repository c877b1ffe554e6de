pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod error;
pub mod event;
pub mod fixture;
pub mod present;
pub mod session;
pub mod status;
pub mod text;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    mock = cli.mock,
    "starting eatz"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.eatzrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let tz = clock::resolve_timezone(&cfg);
  let opts = commands::RunOptions {
    tz,
    now: cli.now,
    mock: cli.mock,
    fixture: cli.fixture,
    json: cli.json,
    watch: cli.watch
  };

  let store = if opts.mock
    || opts.fixture.is_some()
  {
    debug!(
      "fixture mode; datastore not \
       opened"
    );
    None
  } else {
    let data_dir =
      config::resolve_data_dir(
        &cfg,
        cli.data.as_deref()
      )
      .context(
        "failed to resolve data \
         directory"
      )?;

    Some(
      datastore::DataStore::open(
        &data_dir
      )
      .with_context(|| {
        format!(
          "failed to open datastore \
           at {}",
          data_dir.display()
        )
      })?
    )
  };

  let painter =
    present::Painter::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    store.as_ref(),
    &cfg,
    &painter,
    &opts,
    inv
  )?;

  info!("done");
  Ok(())
}
