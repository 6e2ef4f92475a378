/// Topical context used to steer a generated pack. Stages cycle through the
/// three in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    DailyConversation,
    SocialInteraction,
    Leisure,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [
        Scenario::DailyConversation,
        Scenario::SocialInteraction,
        Scenario::Leisure,
    ];

    pub fn from_stage(stage: usize) -> Self {
        Self::ALL[stage % Self::ALL.len()]
    }

    /// Wording sent upstream as the `hard` parameter.
    pub fn prompt(self) -> &'static str {
        match self {
            Scenario::DailyConversation => "日常沟通",
            Scenario::SocialInteraction => "社交互动",
            Scenario::Leisure => "休闲娱乐",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scenario::DailyConversation => "Daily conversation",
            Scenario::SocialInteraction => "Social interaction",
            Scenario::Leisure => "Leisure",
        }
    }
}
