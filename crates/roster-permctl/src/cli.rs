// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use roster_permissions_core::{Action, CompanyId, Module, Role, UserId};

/// roster-permctl - inspect and administer Roster permissions.
#[derive(Parser, Debug)]
#[command(
	name = "roster-permctl",
	about = "Inspect and administer Roster permissions",
	version
)]
pub struct Cli {
	/// Platform administrator performing administrative commands
	#[arg(long, global = true, env = "ROSTER_OPERATOR")]
	pub operator: Option<UserId>,

	/// Config file, instead of /etc/roster/server.toml
	#[arg(long, global = true)]
	pub config: Option<PathBuf>,

	/// Print results as JSON
	#[arg(long, global = true)]
	pub json: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// List every valid module:action pair
	Catalog,
	/// Show the decision for one user and permission
	Explain(ExplainArgs),
	/// Set a role's default grant
	SetRole(SetRoleArgs),
	/// Set, or unset, an explicit override for one user
	SetUser(SetUserArgs),
	/// Remove every override of one user
	ClearUser(UserArgs),
	/// Replace a role's grants with the factory defaults
	ResetDefaults(RoleArgs),
	/// List the decision of every permission for one user
	Effective(UserArgs),
	/// Reset every editable role to the factory defaults
	SeedDefaults,
	/// Create or update a user directory entry
	AddUser(AddUserArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PermissionArgs {
	#[arg(long)]
	pub module: Module,
	#[arg(long)]
	pub action: Action,
}

#[derive(Args, Debug, Clone)]
pub struct ExplainArgs {
	#[arg(long)]
	pub user: UserId,
	#[command(flatten)]
	pub permission: PermissionArgs,
	/// Evaluate as if the session were impersonating the user's company
	#[arg(long)]
	pub impersonating: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SetRoleArgs {
	#[arg(long)]
	pub role: Role,
	#[command(flatten)]
	pub permission: PermissionArgs,
	#[arg(long, action = clap::ArgAction::Set)]
	pub grant: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SetUserArgs {
	#[arg(long)]
	pub user: UserId,
	#[command(flatten)]
	pub permission: PermissionArgs,
	#[arg(long, value_enum)]
	pub granted: Granted,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granted {
	Allow,
	Deny,
	/// Remove the override and defer to the role
	Unset,
}

impl Granted {
	pub fn as_override(self) -> Option<bool> {
		match self {
			Granted::Allow => Some(true),
			Granted::Deny => Some(false),
			Granted::Unset => None,
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct UserArgs {
	#[arg(long)]
	pub user: UserId,
}

#[derive(Args, Debug, Clone)]
pub struct RoleArgs {
	#[arg(long)]
	pub role: Role,
}

#[derive(Args, Debug, Clone)]
pub struct AddUserArgs {
	#[arg(long)]
	pub id: UserId,
	#[arg(long)]
	pub name: String,
	#[arg(long)]
	pub role: Role,
	#[arg(long)]
	pub company: Option<CompanyId>,
	/// Grant the platform administrator capability
	#[arg(long)]
	pub super_admin: bool,
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn test_cli_definition_is_valid() {
		Cli::command().debug_assert();
	}

	#[test]
	fn test_parse_set_user() {
		let user = UserId::generate();
		let cli = Cli::try_parse_from([
			"roster-permctl",
			"set-user",
			"--user",
			&user.to_string(),
			"--module",
			"leave",
			"--action",
			"approve",
			"--granted",
			"deny",
		])
		.unwrap();

		match cli.command {
			Command::SetUser(args) => {
				assert_eq!(args.user, user);
				assert_eq!(args.permission.module, Module::Leave);
				assert_eq!(args.permission.action, Action::Approve);
				assert_eq!(args.granted.as_override(), Some(false));
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn test_parse_set_role_requires_explicit_grant() {
		let cli = Cli::try_parse_from([
			"roster-permctl",
			"set-role",
			"--role",
			"manager",
			"--module",
			"payroll",
			"--action",
			"read",
			"--grant",
			"false",
		])
		.unwrap();
		match cli.command {
			Command::SetRole(args) => {
				assert_eq!(args.role, Role::Manager);
				assert!(!args.grant);
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn test_unknown_module_rejected() {
		let result = Cli::try_parse_from([
			"roster-permctl",
			"explain",
			"--user",
			&UserId::generate().to_string(),
			"--module",
			"timesheets",
			"--action",
			"read",
		]);
		assert!(result.is_err());
	}

	#[test]
	fn test_unset_defers_to_role() {
		assert_eq!(Granted::Unset.as_override(), None);
		assert_eq!(Granted::Allow.as_override(), Some(true));
	}
}
