//! Library bundle loading.
//!
//! Startup asks the kernel for every configured bundle's metadata, loads the init bundles as their
//! metadata arrives, and initializes the kernel once the last init bundle is in. Bundles requested
//! later by a `pkgs` directive are tracked separately so editing can resume when they finish.

use std::collections::HashMap;

use proofdoc_protocol::{BundleInfo, Command};

use crate::SessionConfig;
use crate::gateway::CommandGateway;

/// What a `LibLoaded` notification completed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
	/// `Init` was just sent.
	pub initialized: bool,
	/// The last bundle of a directive request finished loading.
	pub requests_settled: bool,
}

/// Tracks bundle metadata and outstanding loads.
#[derive(Debug)]
pub struct PackageLoader {
	base_path: String,
	load_libs: Vec<Vec<String>>,
	all: Vec<String>,
	remaining_init: Vec<String>,
	loaded_init: Vec<String>,
	requested: Vec<String>,
	info: HashMap<String, BundleInfo>,
	initialized: bool,
}

impl PackageLoader {
	/// Create a loader from session configuration.
	pub fn new(config: &SessionConfig) -> Self {
		Self {
			base_path: config.package_path(),
			load_libs: config.load_libs(),
			all: config.all_pkgs.clone(),
			remaining_init: config.init_pkgs.clone(),
			loaded_init: Vec::new(),
			requested: Vec::new(),
			info: HashMap::new(),
			initialized: false,
		}
	}

	/// Request kernel information and bundle metadata.
	pub fn start(&mut self, gateway: &mut dyn CommandGateway) {
		gateway.send(Command::GetInfo);
		gateway.send(Command::InfoPkg {
			base_path: self.base_path.clone(),
			bundles: self.all.clone(),
		});
		if self.remaining_init.is_empty() {
			self.initialize(gateway);
		}
	}

	/// Metadata for a bundle arrived; load it if it is needed for init.
	pub fn on_info(&mut self, bundle: &str, info: BundleInfo, gateway: &mut dyn CommandGateway) {
		self.info.insert(bundle.to_owned(), info);
		if self.remaining_init.iter().any(|b| b == bundle) {
			tracing::debug!(bundle, "Loading init bundle");
			self.load(bundle, gateway);
		}
	}

	/// A bundle finished loading.
	pub fn on_loaded(&mut self, bundle: &str, gateway: &mut dyn CommandGateway) -> LoadOutcome {
		let mut outcome = LoadOutcome::default();

		if let Some(pos) = self.remaining_init.iter().position(|b| b == bundle) {
			let bundle = self.remaining_init.remove(pos);
			self.loaded_init.push(bundle);
			if self.remaining_init.is_empty() && !self.initialized {
				self.initialize(gateway);
				outcome.initialized = true;
			}
		}

		if let Some(pos) = self.requested.iter().position(|b| b == bundle) {
			self.requested.remove(pos);
			outcome.requests_settled = self.requested.is_empty();
		}

		outcome
	}

	/// Load bundles requested from the document.
	pub fn request(&mut self, bundles: &[String], gateway: &mut dyn CommandGateway) {
		for bundle in bundles {
			self.load(bundle, gateway);
			if !self.requested.contains(bundle) {
				self.requested.push(bundle.clone());
			}
		}
	}

	/// Returns true while directive-requested bundles are still loading.
	pub fn is_waiting(&self) -> bool {
		!self.requested.is_empty()
	}

	/// Returns true once `Init` was sent.
	pub fn is_initialized(&self) -> bool {
		self.initialized
	}

	/// Metadata received for a bundle.
	pub fn info(&self, bundle: &str) -> Option<&BundleInfo> {
		self.info.get(bundle)
	}

	fn load(&self, bundle: &str, gateway: &mut dyn CommandGateway) {
		gateway.send(Command::LoadPkg {
			base_path: self.base_path.clone(),
			bundle: bundle.to_owned(),
		});
	}

	fn initialize(&mut self, gateway: &mut dyn CommandGateway) {
		let load_paths = self
			.loaded_init
			.iter()
			.filter_map(|bundle| self.info.get(bundle))
			.flat_map(|info| info.pkgs.iter().map(|pkg| pkg.pkg_id.clone()))
			.collect();
		tracing::info!(bundles = ?self.loaded_init, "Initializing kernel");
		gateway.send(Command::Init {
			load_libs: self.load_libs.clone(),
			load_paths,
		});
		self.initialized = true;
	}
}
