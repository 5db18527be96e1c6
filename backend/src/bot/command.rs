//! Registered commands

use serde::{Deserialize, Serialize};

/// Every command the bot answers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    History,
    Fitness,
    Dietary,
    Weight,
    BodyFat,
    TargetWeight,
    TargetBodyFat,
    Music,
    Hello,
}

impl CommandKind {
    pub const ALL: [CommandKind; 9] = [
        CommandKind::History,
        CommandKind::Fitness,
        CommandKind::Dietary,
        CommandKind::Weight,
        CommandKind::BodyFat,
        CommandKind::TargetWeight,
        CommandKind::TargetBodyFat,
        CommandKind::Music,
        CommandKind::Hello,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::History => "check_in.history",
            CommandKind::Fitness => "check_in.fitness",
            CommandKind::Dietary => "check_in.dietary",
            CommandKind::Weight => "check_in.weight",
            CommandKind::BodyFat => "check_in.body_fat",
            CommandKind::TargetWeight => "check_in.target_weight",
            CommandKind::TargetBodyFat => "check_in.target_body_fat",
            CommandKind::Music => "music",
            CommandKind::Hello => "hello",
        }
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CommandKind::History => &["打卡历史"],
            CommandKind::Fitness => &["健身打卡"],
            CommandKind::Dietary => &["饮食打卡"],
            CommandKind::Weight => &["体重打卡"],
            CommandKind::BodyFat => &["体脂打卡"],
            CommandKind::TargetWeight => &["目标体重"],
            CommandKind::TargetBodyFat => &["目标体脂"],
            CommandKind::Music => &["点歌"],
            CommandKind::Hello => &[],
        }
    }

    /// Question asked when the command arrives without an argument.
    /// `None` runs the handler with an empty argument instead.
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            CommandKind::History => Some(
                "请问你要查询什么历史呢？请输入 A：健身打卡记录 B：饮食打卡记录 C：体重和体脂历史",
            ),
            CommandKind::Fitness => Some("今天你做了什么运动呢？"),
            CommandKind::Dietary => Some("今天的饮食健康吗？请输入 A：健康 B：不健康"),
            CommandKind::Weight => Some("请输入你的体重（kg）"),
            CommandKind::BodyFat => Some("请输入你的体脂（%）"),
            CommandKind::TargetWeight => Some("请输入你的目标体重（kg）"),
            CommandKind::TargetBodyFat => Some("请输入你的目标体脂（%）"),
            CommandKind::Music => Some("你想听哪首歌呢？"),
            CommandKind::Hello => None,
        }
    }

    /// Resolve a command by name or alias
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| {
            command.name() == name || command.aliases().iter().any(|alias| *alias == name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("check_in.history", CommandKind::History)]
    #[case("打卡历史", CommandKind::History)]
    #[case("健身打卡", CommandKind::Fitness)]
    #[case("check_in.body_fat", CommandKind::BodyFat)]
    #[case("目标体脂", CommandKind::TargetBodyFat)]
    #[case("点歌", CommandKind::Music)]
    #[case("hello", CommandKind::Hello)]
    fn test_lookup(#[case] name: &str, #[case] expected: CommandKind) {
        assert_eq!(CommandKind::lookup(name), Some(expected));
    }

    #[test]
    fn test_lookup_unknown() {
        assert_eq!(CommandKind::lookup("打卡"), None);
        assert_eq!(CommandKind::lookup("History"), None);
    }

    #[test]
    fn test_names_and_aliases_are_unique() {
        let mut seen = HashSet::new();
        for command in CommandKind::ALL {
            assert!(seen.insert(command.name()));
            for alias in command.aliases() {
                assert!(seen.insert(*alias));
            }
        }
    }

    #[test]
    fn test_only_hello_has_no_prompt() {
        let without: Vec<_> = CommandKind::ALL
            .into_iter()
            .filter(|command| command.prompt().is_none())
            .collect();
        assert_eq!(without, vec![CommandKind::Hello]);
    }
}
