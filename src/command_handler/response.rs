use twilight_model::channel::message::Embed;

pub const GENERIC_ERROR_MESSAGE: &str = "❌ An error occurred while executing the command!";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CommandResponse {
    pub embeds: Vec<Embed>,
    pub content: String,
}

impl From<&str> for CommandResponse {
    fn from(content: &str) -> Self {
        CommandResponseBuilder::new().content(content).build()
    }
}

impl From<String> for CommandResponse {
    fn from(content: String) -> Self {
        CommandResponseBuilder::new().content(content).build()
    }
}

#[derive(Default)]
pub struct CommandResponseBuilder {
    embeds: Vec<Embed>,
    content: String,
}

impl CommandResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = content.into();
        self
    }

    pub fn build(self) -> CommandResponse {
        CommandResponse {
            embeds: self.embeds,
            content: self.content,
        }
    }
}

pub fn create_error_response(error: &anyhow::Error) -> CommandResponse {
    tracing::debug!(error = %error, "Rendering generic error reply");
    CommandResponseBuilder::new()
        .content(GENERIC_ERROR_MESSAGE)
        .build()
}
