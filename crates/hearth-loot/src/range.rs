use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    context::{LootContext, LootContextParam},
    number::NumberProvider,
};

/// An integer range whose bounds are themselves computed. A missing bound is unbounded.
///
/// Serializes as a bare integer when both bounds are the same constant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "IntRangeRepr", into = "IntRangeRepr")]
pub struct IntRange {
    pub min: Option<NumberProvider>,
    pub max: Option<NumberProvider>,
}

impl IntRange {
    #[must_use]
    pub fn exact(value: i32) -> Self {
        let value = NumberProvider::constant(value as f32);
        Self {
            min: Some(value.clone()),
            max: Some(value),
        }
    }

    #[must_use]
    pub fn range(min: i32, max: i32) -> Self {
        Self::between(Self::bound(min), Self::bound(max))
    }

    #[must_use]
    pub const fn between(min: NumberProvider, max: NumberProvider) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    #[must_use]
    pub fn lower_bound(min: i32) -> Self {
        Self {
            min: Some(Self::bound(min)),
            max: None,
        }
    }

    #[must_use]
    pub fn upper_bound(max: i32) -> Self {
        Self {
            min: None,
            max: Some(Self::bound(max)),
        }
    }

    fn bound(value: i32) -> NumberProvider {
        NumberProvider::constant(value as f32)
    }

    /// Whether `value` lies within the bounds, both inclusive.
    pub fn test(&self, context: &mut LootContext, value: i32) -> bool {
        let above_min = self
            .min
            .as_ref()
            .is_none_or(|min| min.get_int(context) <= value);

        above_min
            && self
                .max
                .as_ref()
                .is_none_or(|max| max.get_int(context) >= value)
    }

    /// Clamps `value` into the bounds.
    pub fn clamp(&self, context: &mut LootContext, value: i32) -> i32 {
        let mut value = value;
        if let Some(min) = &self.min {
            value = value.max(min.get_int(context));
        }
        if let Some(max) = &self.max {
            value = value.min(max.get_int(context));
        }
        value
    }

    #[must_use]
    pub fn referenced_params(&self) -> BTreeSet<LootContextParam> {
        self.min
            .iter()
            .chain(&self.max)
            .flat_map(NumberProvider::referenced_params)
            .collect()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum IntRangeRepr {
    Exact(i32),
    Bounds {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<NumberProvider>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<NumberProvider>,
    },
}

impl From<IntRangeRepr> for IntRange {
    fn from(repr: IntRangeRepr) -> Self {
        match repr {
            IntRangeRepr::Exact(value) => Self::exact(value),
            IntRangeRepr::Bounds { min, max } => Self { min, max },
        }
    }
}

impl From<IntRange> for IntRangeRepr {
    fn from(range: IntRange) -> Self {
        let exact = match (&range.min, &range.max) {
            (Some(NumberProvider::Constant(min)), Some(NumberProvider::Constant(max)))
                if min == max && min.fract() == 0.0 =>
            {
                #[expect(clippy::cast_possible_truncation, reason = "checked to be integral")]
                let value = *min as i32;
                Some(value)
            }
            _ => None,
        };

        match exact {
            Some(value) => Self::Exact(value),
            None => Self::Bounds {
                min: range.min,
                max: range.max,
            },
        }
    }
}
