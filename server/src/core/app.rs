//! App state type

use std::sync::Arc;

use collegio_types::directory_adapter::DirectoryAdapter;

use crate::core::{
	hierarchy::{HierarchyService, ResourceRegistry},
	perm::PermissionService,
	scope_resolver::ScopeResolver,
};
use crate::prelude::*;
use crate::routes;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
	pub opts: AppBuilderOpts,
	pub directory: Arc<dyn DirectoryAdapter>,
	pub perm: PermissionService,
	pub hierarchy: HierarchyService,
	pub scope_resolver: ScopeResolver,
	pub resources: Arc<ResourceRegistry>,
}

pub type App = Arc<AppState>;

#[derive(Debug)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	pub token_secret: Box<str>,
}

pub struct AppBuilder {
	opts: AppBuilderOpts,
	resources: Vec<Box<str>>,
	directory: Option<Arc<dyn DirectoryAdapter>>,
}

impl AppBuilder {
	pub fn new() -> Self {
		AppBuilder {
			opts: AppBuilderOpts {
				listen: "127.0.0.1:8080".into(),
				token_secret: "".into(),
			},
			resources: Vec::new(),
			directory: None,
		}
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self { self.opts.listen = listen.into(); self }
	pub fn token_secret(&mut self, token_secret: impl Into<Box<str>>) -> &mut Self { self.opts.token_secret = token_secret.into(); self }

	/// Registers a permission-resource category for hierarchy propagation.
	pub fn resource(&mut self, resource: impl Into<Box<str>>) -> &mut Self {
		self.resources.push(resource.into());
		self
	}

	// Adapters
	pub fn directory_adapter(&mut self, directory: Arc<dyn DirectoryAdapter>) -> &mut Self { self.directory = Some(directory); self }

	pub fn build(self) -> App {
		let directory = self.directory.expect("FATAL: No directory adapter");
		if self.opts.token_secret.is_empty() {
			panic!("FATAL: No token secret");
		}

		let resources = Arc::new(ResourceRegistry::new());
		for resource in &self.resources {
			resources.register(resource);
		}

		Arc::new(AppState {
			opts: self.opts,
			perm: PermissionService::new(directory.clone()),
			hierarchy: HierarchyService::new(directory.clone(), resources.clone()),
			scope_resolver: ScopeResolver::new(),
			resources,
			directory,
		})
	}

	pub async fn run(self) -> ClResult<()> {
		tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.init();
		info!("  ____      _ _            _");
		info!(" / ___|___ | | | ___  __ _(_) ___");
		info!("| |   / _ \\| | |/ _ \\/ _` | |/ _ \\");
		info!("| |__| (_) | | |  __/ (_| | | (_) |");
		info!(" \\____\\___/|_|_|\\___|\\__, |_|\\___/");
		info!("                     |___/  V{}", VERSION);
		info!("");

		let app = self.build();
		let router = routes::init(app.clone());

		let listener = tokio::net::TcpListener::bind(app.opts.listen.as_ref()).await?;
		info!("Listening on {}", app.opts.listen);
		axum::serve(listener, router).await?;

		Ok(())
	}
}

impl Default for AppBuilder {
	fn default() -> Self { Self::new() }
}

// vim: ts=4
