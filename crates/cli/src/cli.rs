use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "proofdoc")]
#[command(about = "Step documents through a proof kernel from the terminal")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Documents to open, one container each, in order
	#[arg(required = true, value_name = "FILE")]
	pub files: Vec<PathBuf>,

	/// Kernel program to spawn
	#[arg(long, short = 'k', value_name = "CMD")]
	pub kernel: String,

	/// Argument passed to the kernel (repeatable)
	#[arg(long = "kernel-arg", value_name = "ARG", allow_hyphen_values = true)]
	pub kernel_args: Vec<String>,

	/// Session configuration (TOML)
	#[arg(long, short = 'c', value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,
}
