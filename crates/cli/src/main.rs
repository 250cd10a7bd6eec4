//! `proofdoc`: step documents through a proof kernel from the terminal.
//!
//! Every FILE becomes one container, in argument order. The kernel is spawned as a child process
//! speaking JSON lines on stdio; commands are read from stdin (see [`repl::ReplCommand`]).

mod cli;
mod console;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use console::ConsoleObserver;
use proofdoc_kernel::KernelConfig;
use proofdoc_protocol::Level;
use proofdoc_session::{BufferContainer, ChannelGateway, Session, SessionConfig};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	setup_tracing(cli.verbose);

	let config = match &cli.config {
		Some(path) => SessionConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
		None => SessionConfig::default(),
	};
	config.validate()?;

	let containers = cli
		.files
		.iter()
		.map(|path| {
			let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
			Ok(BufferContainer::new(path.display().to_string(), text))
		})
		.collect::<anyhow::Result<Vec<_>>>()?;

	info!(files = containers.len(), kernel = %cli.kernel, "starting proofdoc");

	let kernel_cfg = KernelConfig::new(&cli.kernel).args(&cli.kernel_args);
	let (kernel, events) = proofdoc_kernel::spawn(&kernel_cfg)?;

	let min_level = if cli.verbose { Level::Debug } else { Level::Notice };
	let observer = Arc::new(ConsoleObserver::stdout(min_level));
	let gateway = ChannelGateway::new(kernel.commands());
	let mut session = Session::new(config, containers, Box::new(gateway), observer);
	session.start();

	repl::run(&mut session, events).await?;

	kernel.shutdown().await?;
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_env("PROOFDOC_LOG")
			.or_else(|_| EnvFilter::try_from_default_env())
			.unwrap_or_else(|_| {
				if verbose {
					EnvFilter::new("proofdoc=trace,debug")
				} else {
					EnvFilter::new("proofdoc=info,warn")
				}
			})
	};

	if let Some(log_dir) = std::env::var("PROOFDOC_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("proofdoc.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);

			tracing_subscriber::registry().with(filter()).with(file_layer).init();

			tracing::info!(path = ?log_path, "proofdoc tracing initialized");
			return;
		}
	}

	// stdout carries the REPL; logs go to stderr.
	tracing_subscriber::fmt()
		.with_env_filter(filter())
		.with_writer(std::io::stderr)
		.init();
}
