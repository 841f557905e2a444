// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use anyhow::{bail, Context};
use roster_permissions_core::{
	CompanyId, EffectivePermission, ImpersonationState, PermissionCatalog, Role, UserId,
};
use roster_server_db::UserRecord;
use roster_server_permissions::{IdentityProvider, RequestContext};
use serde_json::json;
use tracing::{info, instrument};

use crate::app::App;
use crate::cli::{AddUserArgs, Cli, Command, ExplainArgs, SetRoleArgs, SetUserArgs};

pub async fn run(cli: Cli, app: &App) -> anyhow::Result<()> {
	let json = cli.json;
	match cli.command {
		Command::Catalog => catalog(json),
		Command::Explain(args) => explain(app, args, json).await,
		Command::AddUser(args) => add_user(app, cli.operator, args).await,
		command => {
			let ctx = operator_context(app, cli.operator).await?;
			administer(app, &ctx, command, json).await
		}
	}
}

async fn operator_context(app: &App, operator: Option<UserId>) -> anyhow::Result<RequestContext> {
	let Some(operator) = operator else {
		bail!("this command requires --operator <user-id> (or ROSTER_OPERATOR)");
	};
	let actor = app
		.identity
		.resolve_actor(operator)
		.await
		.with_context(|| format!("cannot resolve operator {operator}"))?;
	Ok(RequestContext::new(actor))
}

async fn administer(
	app: &App,
	ctx: &RequestContext,
	command: Command,
	json: bool,
) -> anyhow::Result<()> {
	match command {
		Command::SetRole(args) => set_role(app, ctx, args, json).await,
		Command::SetUser(args) => set_user(app, ctx, args, json).await,
		Command::ClearUser(args) => {
			let removed = app.admin.clear_user_permissions(ctx, args.user).await?;
			if json {
				println!("{}", json!({ "user_id": args.user, "removed": removed }));
			} else {
				println!("removed {removed} override(s) for {}", args.user);
			}
			Ok(())
		}
		Command::ResetDefaults(args) => {
			let previous = app.admin.reset_to_defaults(ctx, args.role).await?;
			if json {
				println!("{}", json!({ "role": args.role, "replaced": previous.len() }));
			} else {
				println!(
					"{} reset to defaults ({} grant(s) replaced)",
					args.role,
					previous.len()
				);
			}
			Ok(())
		}
		Command::SeedDefaults => {
			for role in Role::editable() {
				app.admin.reset_to_defaults(ctx, *role).await?;
				if !json {
					println!("{role} reset to defaults");
				}
			}
			if json {
				println!("{}", json!({ "roles": Role::editable() }));
			}
			Ok(())
		}
		Command::Effective(args) => {
			let effective = app.admin.list_effective_permissions(ctx, args.user).await?;
			print_effective(&effective, json)
		}
		Command::Catalog | Command::Explain(_) | Command::AddUser(_) => {
			bail!("not an administrative command")
		}
	}
}

fn catalog(json: bool) -> anyhow::Result<()> {
	let catalog = PermissionCatalog::global();
	if json {
		let rows: Vec<_> = catalog
			.permissions()
			.iter()
			.map(|p| {
				json!({
					"key": p.key(),
					"module": p.module,
					"action": p.action,
					"mutating": p.is_mutating(),
				})
			})
			.collect();
		println!("{}", serde_json::to_string_pretty(&rows)?);
		return Ok(());
	}

	for module in catalog.list_modules() {
		let actions: Vec<_> = catalog
			.list_actions(*module)
			.iter()
			.map(|a| {
				if a.is_mutating() {
					format!("{a}*")
				} else {
					a.to_string()
				}
			})
			.collect();
		println!("{:<12} {}", module.as_str(), actions.join(", "));
	}
	println!("\n* mutating: blocked while impersonating");
	Ok(())
}

#[instrument(skip(app, args), fields(user_id = %args.user))]
async fn explain(app: &App, args: ExplainArgs, json: bool) -> anyhow::Result<()> {
	let actor = app.identity.resolve_actor(args.user).await?;
	let session = if args.impersonating {
		ImpersonationState::started(actor.company_id.unwrap_or_else(CompanyId::generate))
	} else {
		ImpersonationState::inactive()
	};

	let (module, action) = (args.permission.module, args.permission.action);
	let decision = app
		.permissions
		.evaluate(&actor, &session, module, action)
		.await;

	if json {
		println!(
			"{}",
			json!({
				"user_id": actor.user_id,
				"module": module,
				"action": action,
				"impersonating": session.is_impersonating,
				"allowed": decision.allowed,
				"source": decision.source,
				"explanation": decision.describe(actor.role),
			})
		);
	} else {
		println!("{module}:{action}: {}", decision.describe(actor.role));
	}
	Ok(())
}

async fn set_role(
	app: &App,
	ctx: &RequestContext,
	args: SetRoleArgs,
	json: bool,
) -> anyhow::Result<()> {
	let (module, action) = (args.permission.module, args.permission.action);
	let previous = app
		.admin
		.set_role_permission(ctx, args.role, module, action, args.grant)
		.await?;

	if json {
		println!(
			"{}",
			json!({
				"role": args.role,
				"module": module,
				"action": action,
				"grant": args.grant,
				"previous": previous,
			})
		);
	} else {
		println!(
			"{} {module}:{action} = {} (was {})",
			args.role,
			args.grant,
			describe_value(previous)
		);
	}
	Ok(())
}

async fn set_user(
	app: &App,
	ctx: &RequestContext,
	args: SetUserArgs,
	json: bool,
) -> anyhow::Result<()> {
	let (module, action) = (args.permission.module, args.permission.action);
	let granted = args.granted.as_override();
	let previous = app
		.admin
		.set_user_permission(ctx, args.user, module, action, granted)
		.await?;

	if json {
		println!(
			"{}",
			json!({
				"user_id": args.user,
				"module": module,
				"action": action,
				"granted": granted,
				"previous": previous,
			})
		);
	} else {
		println!(
			"{} {module}:{action} = {} (was {})",
			args.user,
			describe_value(granted),
			describe_value(previous)
		);
	}
	Ok(())
}

/// Saves a directory entry as `--operator`. Without an operator only the
/// first platform administrator can be created.
#[instrument(skip(app, operator, args), fields(user_id = %args.id, role = %args.role))]
async fn add_user(app: &App, operator: Option<UserId>, args: AddUserArgs) -> anyhow::Result<()> {
	let mut record = UserRecord::new(args.id, args.name, args.role);
	record.company_id = args.company;
	record.is_super_admin = args.super_admin;

	match operator {
		Some(operator) => {
			let ctx = operator_context(app, Some(operator)).await?;
			app.admin.save_user(&ctx, record.clone()).await?;
		}
		None if record.is_super_admin => {
			app.admin
				.bootstrap_platform_admin(record.clone())
				.await
				.context("bootstrap without --operator is only possible before any platform administrator exists")?;
			info!("first platform administrator created");
		}
		None => bail!("this command requires --operator <user-id> (or ROSTER_OPERATOR)"),
	}

	println!("saved {} ({})", record.id, record.role);
	Ok(())
}

fn print_effective(effective: &[EffectivePermission], json: bool) -> anyhow::Result<()> {
	if json {
		println!("{}", serde_json::to_string_pretty(effective)?);
		return Ok(());
	}
	for entry in effective {
		let key = format!("{}:{}", entry.module, entry.action);
		println!(
			"{key:<32} {:<6} {}",
			if entry.decision.allowed { "allow" } else { "deny" },
			entry.decision.source
		);
	}
	Ok(())
}

fn describe_value(value: Option<bool>) -> &'static str {
	match value {
		Some(true) => "allow",
		Some(false) => "deny",
		None => "unset",
	}
}
