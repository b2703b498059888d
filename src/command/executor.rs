//! Command execution - runs a parsed clearlag command against PopulationControl

use crate::command::parser::{ClearlagCommand, CommandSender};
use crate::control::PopulationControl;
use crate::notify::messages::{COMMAND_NO_PERMISSION, COMMAND_USAGE, RELOAD_SUCCESS};
use crate::notify::Outcome;

/// Executes commands on behalf of a sender
pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute a command, returning the lines to send back to the invoker
    pub async fn execute(
        control: &PopulationControl,
        sender: &CommandSender,
        command: &ClearlagCommand,
    ) -> ExecutionResult {
        let messages = control.messages();

        if !sender.has_permission(command.permission()) {
            tracing::info!(sender = %sender.name, "Denied clearlag command");
            return ExecutionResult::reply(messages.render(COMMAND_NO_PERMISSION, None, None));
        }

        match command {
            ClearlagCommand::Usage => {
                ExecutionResult::reply(messages.render(COMMAND_USAGE, None, None))
            }
            ClearlagCommand::Cleanup => {
                tracing::info!(sender = %sender.name, "Manual cleanup requested");
                let outcome = control.manual_cleanup().await;
                ExecutionResult {
                    replies: vec![messages.render_outcome(&outcome)],
                    outcome: Some(outcome),
                    error: None,
                }
            }
            ClearlagCommand::Reload => {
                control.reload();
                // Reply with the freshly loaded templates
                ExecutionResult::reply(control.messages().render(RELOAD_SUCCESS, None, None))
            }
            ClearlagCommand::Status => match control.status().await {
                Ok(report) => {
                    let mut replies = vec![report.summary()];
                    for failure in &report.failed_worlds {
                        replies.push(format!("  {} unavailable: {}", failure.world, failure.reason));
                    }
                    ExecutionResult {
                        replies,
                        outcome: None,
                        error: None,
                    }
                }
                Err(e) => ExecutionResult {
                    replies: Vec::new(),
                    outcome: None,
                    error: Some(e.to_string()),
                },
            },
        }
    }
}

/// Result of executing a command
#[derive(Debug, Default)]
pub struct ExecutionResult {
    pub replies: Vec<String>,
    /// Set when the command ran a reduction pass
    pub outcome: Option<Outcome>,
    pub error: Option<String>,
}

impl ExecutionResult {
    fn reply(text: String) -> Self {
        Self {
            replies: vec![text],
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{LoadedConfig, StaticConfig};
    use crate::ecs::world::Server;
    use crate::entity::category::EntityCategory;
    use crate::notify::messages::{strip_colour_codes, MessageCatalog, COMMAND_SUCCESS};
    use crate::notify::ChannelSink;
    use crate::simulation::domain::MutationDomain;
    use std::sync::Arc;

    fn control(server: Server) -> (MutationDomain, PopulationControl) {
        let domain = MutationDomain::spawn(server);
        let (sink, _rx) = ChannelSink::new();
        let loaded = LoadedConfig {
            messages: MessageCatalog::with_overrides([(COMMAND_SUCCESS, "&aremoved %count%")]),
            ..LoadedConfig::default()
        };
        let control =
            PopulationControl::new(domain.handle(), Arc::new(StaticConfig(loaded)), Arc::new(sink));
        (domain, control)
    }

    #[tokio::test]
    async fn test_execute_cleanup_replies_to_invoker() {
        let mut server = Server::with_worlds(["overworld"]);
        server.spawn(0, EntityCategory::ExperienceOrb);
        let (_domain, control) = control(server);

        let result =
            CommandExecutor::execute(&control, &CommandSender::console(), &ClearlagCommand::Cleanup)
                .await;

        assert_eq!(strip_colour_codes(&result.replies[0]), "removed 1");
        assert_eq!(
            result.outcome,
            Some(Outcome::CleanupDone { removed: 1, manual: true })
        );
    }

    #[tokio::test]
    async fn test_permission_checked_before_usage() {
        let mut server = Server::with_worlds(["overworld"]);
        server.spawn(0, EntityCategory::Arrow);
        let (domain, control) = control(server);
        let player = CommandSender::new("alex", Vec::<String>::new());

        for command in [ClearlagCommand::Cleanup, ClearlagCommand::Usage] {
            let result = CommandExecutor::execute(&control, &player, &command).await;
            assert!(result.outcome.is_none());
            assert!(strip_colour_codes(&result.replies[0]).contains("permission"));
        }

        let server = domain.shutdown().await.unwrap();
        assert_eq!(server.entity_count(), 1);
    }
}
