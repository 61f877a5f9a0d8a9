use serenity::builder::CreateCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Stop,
    Weather,
    Briefing,
    Id,
    Love,
}

impl BotCommand {
    pub const ALL: [BotCommand; 6] = [
        BotCommand::Start,
        BotCommand::Stop,
        BotCommand::Weather,
        BotCommand::Briefing,
        BotCommand::Id,
        BotCommand::Love,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BotCommand::Start => "start",
            BotCommand::Stop => "stop",
            BotCommand::Weather => "weather",
            BotCommand::Briefing => "briefing",
            BotCommand::Id => "id",
            BotCommand::Love => "love",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BotCommand::Start => "Tägliches Briefing aktivieren und Chat neu starten",
            BotCommand::Stop => "Tägliches Briefing deaktivieren",
            BotCommand::Weather => "Aktuelles Wetter",
            BotCommand::Briefing => "Wetter und Termine für heute",
            BotCommand::Id => "Chat-ID anzeigen",
            BotCommand::Love => "Ein lieber Gruß",
        }
    }

    /// Accepts the registered name plus a few aliases, with or without a leading slash.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().trim_start_matches('/').to_lowercase();
        match name.as_str() {
            "start" => Some(BotCommand::Start),
            "stop" => Some(BotCommand::Stop),
            "weather" | "wetter" => Some(BotCommand::Weather),
            "briefing" => Some(BotCommand::Briefing),
            "id" => Some(BotCommand::Id),
            "love" => Some(BotCommand::Love),
            _ => None,
        }
    }

    pub fn definitions() -> Vec<CreateCommand> {
        Self::ALL
            .iter()
            .map(|command| CreateCommand::new(command.name()).description(command.description()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for command in BotCommand::ALL {
            assert_eq!(BotCommand::from_name(command.name()), Some(command));
        }
    }

    #[test]
    fn accepts_slash_and_alias() {
        assert_eq!(BotCommand::from_name("/Wetter"), Some(BotCommand::Weather));
        assert_eq!(BotCommand::from_name("remind"), None);
    }
}
