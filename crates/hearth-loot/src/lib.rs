//! Loot table predicates and the numbers they compare.

pub mod condition;
pub mod context;
pub mod number;
pub mod range;

pub use condition::{ConditionBuilder, LootItemCondition, ValueCheckCondition};
pub use context::{
    EntityTarget, LootContext, LootContextBuilder, LootContextParam, LootContextParamSet,
    ParamValue,
};
pub use number::{NumberProvider, ScoreTarget};
pub use range::IntRange;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LootError {
    #[error("parameter {param} is not provided in this context ({set})")]
    ParamNotAllowed {
        param: LootContextParam,
        set: &'static str,
    },
    #[error("missing required parameter {param} for context {set}")]
    MissingParam {
        param: LootContextParam,
        set: &'static str,
    },
}
