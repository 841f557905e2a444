// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operator CLI for Roster permissions.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod cli;
mod commands;

use crate::app::App;
use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let config = match &cli.config {
		Some(path) => roster_server_config::load_config_with_file(path)?,
		None => roster_server_config::load_config()?,
	};

	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);
	if config.logging.json {
		registry
			.with(
				tracing_subscriber::fmt::layer()
					.json()
					.with_writer(std::io::stderr),
			)
			.init();
	} else {
		registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init();
	}

	tracing::debug!(database = %config.database.url, "starting roster-permctl");

	let app = App::connect(&config).await?;
	let result = commands::run(cli, &app).await;
	app.shutdown().await;
	result
}
