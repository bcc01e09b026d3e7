use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub trader: Option<NamedRef>,
    #[serde(default)]
    pub map: Option<NamedRef>,
    #[serde(default)]
    pub min_player_level: Option<u32>,
    #[serde(default)]
    pub experience: Option<u64>,
    #[serde(default)]
    pub kappa_required: Option<bool>,
    #[serde(default)]
    pub lightkeeper_required: Option<bool>,
    #[serde(default)]
    pub wiki_link: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub objectives: Vec<Objective>,
    #[serde(default)]
    pub finish_rewards: Option<FinishRewards>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub trader_requirements: Vec<TraderRequirement>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub task_requirements: Vec<TaskRequirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub normalized_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub optional: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishRewards {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub items: Vec<RewardItem>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub trader_standing: Vec<TraderStanding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardItem {
    #[serde(default)]
    pub item: Option<ItemRef>,
    #[serde(default)]
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraderStanding {
    #[serde(default)]
    pub trader: Option<NamedRef>,
    #[serde(default)]
    pub standing: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderRequirement {
    #[serde(default)]
    pub trader: Option<NamedRef>,
    #[serde(default)]
    pub level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequirement {
    #[serde(default)]
    pub task: Option<TaskRef>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub status: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Task {
    pub fn named(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            trader: None,
            map: None,
            min_player_level: None,
            experience: None,
            kappa_required: None,
            lightkeeper_required: None,
            wiki_link: None,
            objectives: Vec::new(),
            finish_rewards: None,
            trader_requirements: Vec::new(),
            task_requirements: Vec::new(),
        }
    }

    pub fn with_trader(mut self, trader: &str) -> Self {
        self.trader = Some(NamedRef {
            name: Some(trader.to_string()),
            normalized_name: Some(normalize_for_search(trader)),
        });
        self
    }

    pub fn with_min_level(mut self, level: u32) -> Self {
        self.min_player_level = Some(level);
        self
    }

    pub fn trader_name(&self) -> Option<&str> {
        self.trader.as_ref().and_then(|trader| trader.name.as_deref())
    }

    pub fn is_kappa_required(&self) -> bool {
        self.kappa_required.unwrap_or(false)
    }

    pub fn is_lightkeeper_required(&self) -> bool {
        self.lightkeeper_required.unwrap_or(false)
    }

    pub fn reward_items(&self) -> &[RewardItem] {
        self.finish_rewards
            .as_ref()
            .map(|rewards| rewards.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn trader_standing(&self) -> &[TraderStanding] {
        self.finish_rewards
            .as_ref()
            .map(|rewards| rewards.trader_standing.as_slice())
            .unwrap_or(&[])
    }
}

pub fn normalize_for_search(input: &str) -> String {
    input.trim().to_lowercase()
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
