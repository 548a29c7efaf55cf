use std::{future::Future, pin::Pin, sync::Arc};

use crate::command_handler::context::CommandContext;
use crate::prefix_parser::Arguments;
use crate::state::State;

pub type GlobalStateInner = State;
pub type GlobalState = Arc<GlobalStateInner>;

#[async_trait::async_trait]
pub trait Command: Sized {
    const NAME: &'static str;
    /// Shown in help after the prefix, e.g. `play [song/url]`.
    const USAGE: &'static str;
    const DESCRIPTION: &'static str;

    async fn execute<'ctx>(state: GlobalState, cmd_ctx: CommandContext<'ctx>) -> anyhow::Result<()>;

    /// Runs the command and turns any error it returns into a generic reply.
    /// Never propagates the command's own failure.
    async fn execute_prefix_command<'ctx>(
        state: GlobalState,
        cmd_ctx: CommandContext<'ctx>,
    ) -> anyhow::Result<()> {
        let message = cmd_ctx.message;
        let prefix = cmd_ctx.prefix;
        let gateway = cmd_ctx.gateway.clone();

        if let Err(e) = Self::execute(state, cmd_ctx).await {
            let error_cmd_ctx = CommandContext {
                message,
                arguments: Arguments::new(""),
                prefix,
                gateway,
            };
            if let Err(reply_err) = error_cmd_ctx
                .reply_error(&e, super::response::create_error_response)
                .await
            {
                tracing::error!(error = ?reply_err, command = Self::NAME, "Failed to send error reply");
            }
        }
        Ok(())
    }
}

pub type PrefixExecutor = for<'ctx> fn(
    GlobalState,
    CommandContext<'ctx>,
) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'ctx>>;

pub struct CommandDefinition {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub prefix_executor: PrefixExecutor,
}

#[macro_export]
macro_rules! command_def {
    ($command_type:ty) => {
        $crate::command_handler::CommandDefinition {
            name: <$command_type as $crate::command_handler::Command>::NAME,
            usage: <$command_type as $crate::command_handler::Command>::USAGE,
            description: <$command_type as $crate::command_handler::Command>::DESCRIPTION,
            prefix_executor: |state, cmd_ctx| {
                Box::pin(<$command_type as $crate::command_handler::Command>::execute_prefix_command(state, cmd_ctx))
            },
        }
    };
}
