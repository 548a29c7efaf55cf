use crate::command_handler::context::{CommandContext, IncomingMessage};
use crate::command_handler::definition::GlobalState;
use crate::commands::COMMANDS;

pub async fn prefix_handler(message: &IncomingMessage, state: GlobalState) -> anyhow::Result<()> {
    if message.author_is_bot {
        return Ok(());
    }

    let configured_prefix = state.config.configured_prefix.as_str();
    let Some(parsed_command) = crate::prefix_parser::parse(&message.content, configured_prefix)
    else {
        return Ok(());
    };

    let command_name = parsed_command.command_name();
    let cmd_ctx = CommandContext {
        message,
        arguments: parsed_command.arguments(),
        prefix: configured_prefix,
        gateway: state.gateway.clone(),
    };

    if let Some(cmd_def) = COMMANDS.iter().find(|def| def.name == command_name) {
        tracing::debug!(command = cmd_def.name, user = %message.author_name, "Dispatching prefix command");
        return (cmd_def.prefix_executor)(state.clone(), cmd_ctx).await;
    }

    tracing::debug!(
        "Unknown prefix command: {} from user: {}",
        command_name,
        message.author_name
    );
    cmd_ctx
        .reply(format!(
            "❌ Unknown command! Use `{}help` to see available commands.",
            configured_prefix
        ))
        .await?;
    Ok(())
}
