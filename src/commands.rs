use teloxide::utils::command::BotCommands;

#[derive(Debug, Clone, PartialEq, Eq, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "greet and explain how to play.")]
    Start,
    #[command(description = "start a new quiz.")]
    Quiz,
}

impl Command {
    /// Parses a plain message text. Anything that is not one of our commands,
    /// including `/cmd@OtherBot`, yields `None`.
    pub fn from_text(text: &str, bot_name: &str) -> Option<Self> {
        Self::parse(text, bot_name).ok()
    }
}
