use serde::{Deserialize, Serialize};

use crate::model::BlockType;

/// One entry of the slash-command menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlashCommand {
    pub label: String,
    pub block_type: BlockType,
}

impl SlashCommand {
    pub fn new(label: &str, block_type: BlockType) -> Self {
        Self {
            label: label.to_string(),
            block_type,
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Text", BlockType::Text),
            Self::new("Heading", BlockType::Heading),
            Self::new("Short answer", BlockType::ShortAnswer),
            Self::new("Multiple choice", BlockType::MultipleChoice),
            Self::new("Multiselect", BlockType::Multiselect),
        ]
    }
}

/// Case-insensitive substring match against each label, in catalogue order
pub fn filter_commands<'a>(catalogue: &'a [SlashCommand], query: &str) -> Vec<&'a SlashCommand> {
    let needle = query.to_lowercase();
    catalogue
        .iter()
        .filter(|command| command.label.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", 5)]
    #[case("text", 1)]
    #[case("HEAD", 1)]
    #[case("multi", 2)]
    #[case("an", 1)]
    #[case("zzz", 0)]
    fn test_filter_matches_substring_case_insensitively(
        #[case] query: &str,
        #[case] expected: usize,
    ) {
        let catalogue = SlashCommand::defaults();
        assert_eq!(filter_commands(&catalogue, query).len(), expected);
    }

    #[test]
    fn test_filter_keeps_catalogue_order() {
        let catalogue = SlashCommand::defaults();
        let labels: Vec<_> = filter_commands(&catalogue, "multi")
            .iter()
            .map(|command| command.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Multiple choice", "Multiselect"]);
    }
}
