use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::context::{EntityTarget, LootContext, LootContextParam};

/// A number computed when a loot table is rolled.
///
/// Constants serialize as bare numbers; everything else as a table with a `type` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NumberProviderRepr", into = "NumberProviderRepr")]
pub enum NumberProvider {
    Constant(f32),
    /// Uniformly between `min` and `max`, both inclusive for integers.
    Uniform {
        min: Box<NumberProvider>,
        max: Box<NumberProvider>,
    },
    /// Successes out of `n` trials with probability `p`.
    Binomial {
        n: Box<NumberProvider>,
        p: Box<NumberProvider>,
    },
    /// A scoreboard value, multiplied by `scale`. Missing scores count as zero.
    Score {
        target: ScoreTarget,
        score: String,
        scale: f32,
    },
}

/// Whose score a [`NumberProvider::Score`] reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ScoreTargetRepr", into = "ScoreTargetRepr")]
pub enum ScoreTarget {
    Context(EntityTarget),
    Fixed(String),
}

impl ScoreTarget {
    fn holder<'a>(&'a self, context: &'a LootContext) -> Option<&'a str> {
        match self {
            Self::Context(target) => context.score_holder(*target),
            Self::Fixed(name) => Some(name),
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "rounding to the nearest integer is the point"
)]
fn round(value: f32) -> i32 {
    (value + 0.5).floor() as i32
}

impl NumberProvider {
    #[must_use]
    pub fn constant(value: f32) -> Self {
        Self::Constant(value)
    }

    #[must_use]
    pub fn uniform(min: f32, max: f32) -> Self {
        Self::Uniform {
            min: Box::new(Self::Constant(min)),
            max: Box::new(Self::Constant(max)),
        }
    }

    #[must_use]
    pub fn binomial(n: i32, p: f32) -> Self {
        let n = n as f32;
        Self::Binomial {
            n: Box::new(Self::Constant(n)),
            p: Box::new(Self::Constant(p)),
        }
    }

    #[must_use]
    pub fn score(target: EntityTarget, score: impl Into<String>) -> Self {
        Self::Score {
            target: ScoreTarget::Context(target),
            score: score.into(),
            scale: 1.0,
        }
    }

    pub fn get_float(&self, context: &mut LootContext) -> f32 {
        match self {
            Self::Constant(value) => *value,
            Self::Uniform { min, max } => {
                let min = min.get_float(context);
                let max = max.get_float(context);
                if min >= max {
                    return min;
                }
                min + context.random().f32() * (max - min)
            }
            Self::Binomial { .. } => self.get_int(context) as f32,
            Self::Score {
                target,
                score,
                scale,
            } => {
                let value = target
                    .holder(context)
                    .and_then(|holder| context.score(holder, score))
                    .unwrap_or_default();

                let value = value as f32;
                value * scale
            }
        }
    }

    pub fn get_int(&self, context: &mut LootContext) -> i32 {
        match self {
            Self::Uniform { min, max } => {
                let min = min.get_int(context);
                let max = max.get_int(context);
                if min >= max {
                    return min;
                }
                context.random().i32(min..=max)
            }
            Self::Binomial { n, p } => {
                let n = n.get_int(context);
                let p = p.get_float(context);
                let rng = context.random();
                (0..n).map(|_| i32::from(rng.f32() < p)).sum()
            }
            Self::Constant(_) | Self::Score { .. } => round(self.get_float(context)),
        }
    }

    /// Context parameters this provider reads.
    #[must_use]
    pub fn referenced_params(&self) -> BTreeSet<LootContextParam> {
        match self {
            Self::Constant(_) => BTreeSet::new(),
            Self::Uniform { min: a, max: b } | Self::Binomial { n: a, p: b } => {
                let mut params = a.referenced_params();
                params.extend(b.referenced_params());
                params
            }
            Self::Score { target, .. } => match target {
                ScoreTarget::Context(target) => BTreeSet::from([target.param()]),
                ScoreTarget::Fixed(_) => BTreeSet::new(),
            },
        }
    }
}

impl From<f32> for NumberProvider {
    fn from(value: f32) -> Self {
        Self::Constant(value)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum NumberProviderRepr {
    Constant(f32),
    Typed(TypedNumberProvider),
}

fn one() -> f32 {
    1.0
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum TypedNumberProvider {
    #[serde(rename = "minecraft:constant", alias = "constant")]
    Constant { value: f32 },
    #[serde(rename = "minecraft:uniform", alias = "uniform")]
    Uniform {
        min: NumberProvider,
        max: NumberProvider,
    },
    #[serde(rename = "minecraft:binomial", alias = "binomial")]
    Binomial { n: NumberProvider, p: NumberProvider },
    #[serde(rename = "minecraft:score", alias = "score")]
    Score {
        target: ScoreTarget,
        score: String,
        #[serde(default = "one")]
        scale: f32,
    },
}

impl From<NumberProviderRepr> for NumberProvider {
    fn from(repr: NumberProviderRepr) -> Self {
        match repr {
            NumberProviderRepr::Constant(value)
            | NumberProviderRepr::Typed(TypedNumberProvider::Constant { value }) => {
                Self::Constant(value)
            }
            NumberProviderRepr::Typed(TypedNumberProvider::Uniform { min, max }) => Self::Uniform {
                min: Box::new(min),
                max: Box::new(max),
            },
            NumberProviderRepr::Typed(TypedNumberProvider::Binomial { n, p }) => Self::Binomial {
                n: Box::new(n),
                p: Box::new(p),
            },
            NumberProviderRepr::Typed(TypedNumberProvider::Score {
                target,
                score,
                scale,
            }) => Self::Score {
                target,
                score,
                scale,
            },
        }
    }
}

impl From<NumberProvider> for NumberProviderRepr {
    fn from(provider: NumberProvider) -> Self {
        match provider {
            NumberProvider::Constant(value) => Self::Constant(value),
            NumberProvider::Uniform { min, max } => Self::Typed(TypedNumberProvider::Uniform {
                min: *min,
                max: *max,
            }),
            NumberProvider::Binomial { n, p } => {
                Self::Typed(TypedNumberProvider::Binomial { n: *n, p: *p })
            }
            NumberProvider::Score {
                target,
                score,
                scale,
            } => Self::Typed(TypedNumberProvider::Score {
                target,
                score,
                scale,
            }),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ScoreTargetRepr {
    Context(EntityTarget),
    Typed(TypedScoreTarget),
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum TypedScoreTarget {
    #[serde(rename = "minecraft:context", alias = "context")]
    Context { target: EntityTarget },
    #[serde(rename = "minecraft:fixed", alias = "fixed")]
    Fixed { name: String },
}

impl From<ScoreTargetRepr> for ScoreTarget {
    fn from(repr: ScoreTargetRepr) -> Self {
        match repr {
            ScoreTargetRepr::Context(target)
            | ScoreTargetRepr::Typed(TypedScoreTarget::Context { target }) => Self::Context(target),
            ScoreTargetRepr::Typed(TypedScoreTarget::Fixed { name }) => Self::Fixed(name),
        }
    }
}

impl From<ScoreTarget> for ScoreTargetRepr {
    fn from(target: ScoreTarget) -> Self {
        match target {
            ScoreTarget::Context(target) => Self::Context(target),
            ScoreTarget::Fixed(name) => Self::Typed(TypedScoreTarget::Fixed { name }),
        }
    }
}
