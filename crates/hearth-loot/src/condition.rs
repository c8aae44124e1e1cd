use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    LootError,
    context::{LootContext, LootContextParam, LootContextParamSet},
    number::NumberProvider,
    range::IntRange,
};

/// Passes when a computed number falls inside a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCheckCondition {
    #[serde(rename = "value")]
    pub provider: NumberProvider,
    pub range: IntRange,
}

impl ValueCheckCondition {
    #[must_use]
    pub fn has_value(provider: NumberProvider, range: IntRange) -> ConditionBuilder {
        ConditionBuilder::new(LootItemCondition::ValueCheck(Self { provider, range }))
    }

    pub fn test(&self, context: &mut LootContext) -> bool {
        let value = self.provider.get_int(context);
        self.range.test(context, value)
    }

    #[must_use]
    pub fn referenced_params(&self) -> BTreeSet<LootContextParam> {
        let mut params = self.provider.referenced_params();
        params.extend(self.range.referenced_params());
        params
    }
}

/// A predicate gating a loot pool, entry or function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition")]
pub enum LootItemCondition {
    #[serde(rename = "minecraft:value_check", alias = "value_check")]
    ValueCheck(ValueCheckCondition),
    #[serde(rename = "minecraft:random_chance", alias = "random_chance")]
    RandomChance { chance: f32 },
    #[serde(rename = "minecraft:inverted", alias = "inverted")]
    Inverted { term: Box<LootItemCondition> },
    #[serde(rename = "minecraft:all_of", alias = "all_of")]
    AllOf { terms: Vec<LootItemCondition> },
    #[serde(rename = "minecraft:any_of", alias = "any_of")]
    AnyOf { terms: Vec<LootItemCondition> },
}

impl LootItemCondition {
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::ValueCheck(_) => "minecraft:value_check",
            Self::RandomChance { .. } => "minecraft:random_chance",
            Self::Inverted { .. } => "minecraft:inverted",
            Self::AllOf { .. } => "minecraft:all_of",
            Self::AnyOf { .. } => "minecraft:any_of",
        }
    }

    pub fn test(&self, context: &mut LootContext) -> bool {
        match self {
            Self::ValueCheck(condition) => condition.test(context),
            Self::RandomChance { chance } => context.random().f32() < *chance,
            Self::Inverted { term } => !term.test(context),
            Self::AllOf { terms } => terms.iter().all(|term| term.test(context)),
            Self::AnyOf { terms } => terms.iter().any(|term| term.test(context)),
        }
    }

    #[must_use]
    pub fn referenced_params(&self) -> BTreeSet<LootContextParam> {
        match self {
            Self::ValueCheck(condition) => condition.referenced_params(),
            Self::RandomChance { .. } => BTreeSet::new(),
            Self::Inverted { term } => term.referenced_params(),
            Self::AllOf { terms } | Self::AnyOf { terms } => terms
                .iter()
                .flat_map(Self::referenced_params)
                .collect(),
        }
    }

    /// Checks that every parameter this condition reads is available in `set`.
    pub fn validate(&self, set: &LootContextParamSet) -> Result<(), LootError> {
        if matches!(self, Self::AllOf { terms } | Self::AnyOf { terms } if terms.is_empty()) {
            tracing::debug!("{} has no terms", self.type_name());
        }

        set.validate_user(&self.referenced_params())
    }
}

/// Assembles a condition, mirroring how loot tables are written by hand.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ConditionBuilder {
    condition: LootItemCondition,
}

impl ConditionBuilder {
    pub const fn new(condition: LootItemCondition) -> Self {
        Self { condition }
    }

    pub fn invert(self) -> Self {
        Self::new(LootItemCondition::Inverted {
            term: Box::new(self.condition),
        })
    }

    pub fn or(self, other: Self) -> Self {
        match self.condition {
            LootItemCondition::AnyOf { mut terms } => {
                terms.push(other.build());
                Self::new(LootItemCondition::AnyOf { terms })
            }
            condition => Self::new(LootItemCondition::AnyOf {
                terms: vec![condition, other.build()],
            }),
        }
    }

    pub fn and(self, other: Self) -> Self {
        match self.condition {
            LootItemCondition::AllOf { mut terms } => {
                terms.push(other.build());
                Self::new(LootItemCondition::AllOf { terms })
            }
            condition => Self::new(LootItemCondition::AllOf {
                terms: vec![condition, other.build()],
            }),
        }
    }

    #[must_use]
    pub fn build(self) -> LootItemCondition {
        self.condition
    }
}

impl From<ConditionBuilder> for LootItemCondition {
    fn from(builder: ConditionBuilder) -> Self {
        builder.build()
    }
}

/// `random_chance` as a builder.
pub fn random_chance(chance: f32) -> ConditionBuilder {
    ConditionBuilder::new(LootItemCondition::RandomChance { chance })
}
