use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

use serde::{Deserialize, Serialize};

use crate::LootError;

/// A value a loot context may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LootContextParam {
    #[serde(rename = "minecraft:this_entity")]
    ThisEntity,
    #[serde(rename = "minecraft:last_damage_player")]
    LastDamagePlayer,
    #[serde(rename = "minecraft:damage_source")]
    DamageSource,
    #[serde(rename = "minecraft:killer_entity")]
    KillerEntity,
    #[serde(rename = "minecraft:direct_killer_entity")]
    DirectKillerEntity,
    #[serde(rename = "minecraft:origin")]
    Origin,
    #[serde(rename = "minecraft:block_state")]
    BlockState,
    #[serde(rename = "minecraft:block_entity")]
    BlockEntity,
    #[serde(rename = "minecraft:tool")]
    Tool,
    #[serde(rename = "minecraft:explosion_radius")]
    ExplosionRadius,
}

impl LootContextParam {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ThisEntity => "minecraft:this_entity",
            Self::LastDamagePlayer => "minecraft:last_damage_player",
            Self::DamageSource => "minecraft:damage_source",
            Self::KillerEntity => "minecraft:killer_entity",
            Self::DirectKillerEntity => "minecraft:direct_killer_entity",
            Self::Origin => "minecraft:origin",
            Self::BlockState => "minecraft:block_state",
            Self::BlockEntity => "minecraft:block_entity",
            Self::Tool => "minecraft:tool",
            Self::ExplosionRadius => "minecraft:explosion_radius",
        }
    }
}

impl fmt::Display for LootContextParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The entity slots a score lookup can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityTarget {
    This,
    Killer,
    DirectKiller,
    KillerPlayer,
}

impl EntityTarget {
    #[must_use]
    pub const fn param(self) -> LootContextParam {
        match self {
            Self::This => LootContextParam::ThisEntity,
            Self::Killer => LootContextParam::KillerEntity,
            Self::DirectKiller => LootContextParam::DirectKillerEntity,
            Self::KillerPlayer => LootContextParam::LastDamagePlayer,
        }
    }
}

/// The payload stored for a [`LootContextParam`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// An entity, identified by its score holder name.
    Entity(String),
    Position([f64; 3]),
    Float(f32),
    /// Anything identified by a resource name, such as a block state or tool.
    Named(String),
}

/// Which parameters a kind of loot table must and may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootContextParamSet {
    name: &'static str,
    required: BTreeSet<LootContextParam>,
    allowed: BTreeSet<LootContextParam>,
}

impl LootContextParamSet {
    #[must_use]
    pub fn new(
        name: &'static str,
        required: impl IntoIterator<Item = LootContextParam>,
        optional: impl IntoIterator<Item = LootContextParam>,
    ) -> Self {
        let required: BTreeSet<_> = required.into_iter().collect();
        let allowed = required.iter().copied().chain(optional).collect();
        Self {
            name,
            required,
            allowed,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new("empty", [], [])
    }

    #[must_use]
    pub fn chest() -> Self {
        Self::new("chest", [LootContextParam::Origin], [
            LootContextParam::ThisEntity,
        ])
    }

    #[must_use]
    pub fn entity() -> Self {
        use LootContextParam::{
            DamageSource, DirectKillerEntity, KillerEntity, LastDamagePlayer, Origin, ThisEntity,
        };
        Self::new("entity", [ThisEntity, Origin, DamageSource], [
            KillerEntity,
            DirectKillerEntity,
            LastDamagePlayer,
        ])
    }

    #[must_use]
    pub fn block() -> Self {
        use LootContextParam::{
            BlockEntity, BlockState, ExplosionRadius, Origin, ThisEntity, Tool,
        };
        Self::new("block", [BlockState, Origin, Tool], [
            ThisEntity,
            BlockEntity,
            ExplosionRadius,
        ])
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_allowed(&self, param: LootContextParam) -> bool {
        self.allowed.contains(&param)
    }

    pub fn required(&self) -> impl Iterator<Item = LootContextParam> + '_ {
        self.required.iter().copied()
    }

    /// Fails on the first referenced parameter the set does not allow.
    pub fn validate_user(&self, referenced: &BTreeSet<LootContextParam>) -> Result<(), LootError> {
        match referenced.iter().find(|param| !self.is_allowed(**param)) {
            Some(&param) => Err(LootError::ParamNotAllowed {
                param,
                set: self.name,
            }),
            None => Ok(()),
        }
    }
}

/// Everything a predicate or number provider can look at while a loot table is rolled.
#[derive(Debug)]
pub struct LootContext {
    rng: fastrand::Rng,
    params: HashMap<LootContextParam, ParamValue>,
    scores: HashMap<String, HashMap<String, i32>>,
    luck: f32,
}

impl LootContext {
    #[must_use]
    pub fn builder() -> LootContextBuilder {
        LootContextBuilder::default()
    }

    pub fn random(&mut self) -> &mut fastrand::Rng {
        &mut self.rng
    }

    #[must_use]
    pub fn has_param(&self, param: LootContextParam) -> bool {
        self.params.contains_key(&param)
    }

    #[must_use]
    pub fn param(&self, param: LootContextParam) -> Option<&ParamValue> {
        self.params.get(&param)
    }

    #[must_use]
    pub const fn luck(&self) -> f32 {
        self.luck
    }

    /// The score holder name of the entity in `target`, if the context has one.
    #[must_use]
    pub fn score_holder(&self, target: EntityTarget) -> Option<&str> {
        match self.params.get(&target.param())? {
            ParamValue::Entity(name) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn score(&self, holder: &str, objective: &str) -> Option<i32> {
        self.scores.get(holder)?.get(objective).copied()
    }
}

#[derive(Debug, Default)]
pub struct LootContextBuilder {
    seed: Option<u64>,
    params: HashMap<LootContextParam, ParamValue>,
    scores: HashMap<String, HashMap<String, i32>>,
    luck: f32,
}

impl LootContextBuilder {
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_param(mut self, param: LootContextParam, value: ParamValue) -> Self {
        self.params.insert(param, value);
        self
    }

    #[must_use]
    pub fn with_score(
        mut self,
        holder: impl Into<String>,
        objective: impl Into<String>,
        value: i32,
    ) -> Self {
        self.scores
            .entry(holder.into())
            .or_default()
            .insert(objective.into(), value);
        self
    }

    #[must_use]
    pub const fn luck(mut self, luck: f32) -> Self {
        self.luck = luck;
        self
    }

    /// Builds the context, checking that every parameter `set` requires is present and nothing
    /// outside it was supplied.
    pub fn create(self, set: &LootContextParamSet) -> Result<LootContext, LootError> {
        if let Some(missing) = set.required().find(|param| !self.params.contains_key(param)) {
            return Err(LootError::MissingParam {
                param: missing,
                set: set.name(),
            });
        }

        if let Some(&extra) = self.params.keys().find(|param| !set.is_allowed(**param)) {
            return Err(LootError::ParamNotAllowed {
                param: extra,
                set: set.name(),
            });
        }

        let rng = self.seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);

        Ok(LootContext {
            rng,
            params: self.params,
            scores: self.scores,
            luck: self.luck,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_missing_and_foreign_params() {
        let error = LootContext::builder()
            .create(&LootContextParamSet::chest())
            .unwrap_err();
        assert_eq!(error, LootError::MissingParam {
            param: LootContextParam::Origin,
            set: "chest",
        });

        let error = LootContext::builder()
            .with_param(LootContextParam::Origin, ParamValue::Position([0.0; 3]))
            .with_param(LootContextParam::Tool, ParamValue::Named("minecraft:stick".into()))
            .create(&LootContextParamSet::chest())
            .unwrap_err();
        assert_eq!(error, LootError::ParamNotAllowed {
            param: LootContextParam::Tool,
            set: "chest",
        });
    }

    #[test]
    fn score_holders_come_from_entity_params() {
        let context = LootContext::builder()
            .with_param(LootContextParam::ThisEntity, ParamValue::Entity("Steve".into()))
            .with_param(LootContextParam::Origin, ParamValue::Position([1.0, 2.0, 3.0]))
            .with_score("Steve", "kills", 7)
            .create(&LootContextParamSet::chest())
            .unwrap();

        assert_eq!(context.score_holder(EntityTarget::This), Some("Steve"));
        assert_eq!(context.score_holder(EntityTarget::Killer), None);
        assert_eq!(context.score("Steve", "kills"), Some(7));
        assert_eq!(context.score("Steve", "deaths"), None);
    }
}
