use serde::{Deserialize, Serialize};

use super::{ResourceLocation, generator::ChunkGenerator};

/// Blocks per section edge; vertical bounds must be aligned to it.
pub const SECTION_SIZE: i32 = 16;
pub const MIN_Y: i32 = -2032;
pub const MAX_Y: i32 = 2031;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DimensionTypeError {
    #[error("height has to be positive and a multiple of 16, got {0}")]
    Height(i32),
    #[error("min_y has to be a multiple of 16, got {0}")]
    MinY(i32),
    #[error("min_y + height cannot be higher than {max}, got {0}", max = MAX_Y + 1)]
    TooHigh(i32),
    #[error("min_y cannot be lower than {MIN_Y}, got {0}")]
    TooLow(i32),
    #[error("logical_height cannot be higher than height, got {logical} > {height}")]
    LogicalHeight { logical: i32, height: i32 },
}

/// Physical properties shared by every dimension of one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionType {
    pub min_y: i32,
    pub height: i32,
    pub logical_height: i32,
    #[serde(default = "one")]
    pub coordinate_scale: f64,
    #[serde(default)]
    pub has_skylight: bool,
    #[serde(default)]
    pub has_ceiling: bool,
    #[serde(default)]
    pub ultrawarm: bool,
    #[serde(default)]
    pub natural: bool,
    #[serde(default)]
    pub bed_works: bool,
    #[serde(default)]
    pub ambient_light: f32,
}

const fn one() -> f64 {
    1.0
}

impl DimensionType {
    pub fn validate(&self) -> Result<(), DimensionTypeError> {
        if self.height < SECTION_SIZE || self.height % SECTION_SIZE != 0 {
            return Err(DimensionTypeError::Height(self.height));
        }
        if self.min_y % SECTION_SIZE != 0 {
            return Err(DimensionTypeError::MinY(self.min_y));
        }
        if self.min_y < MIN_Y {
            return Err(DimensionTypeError::TooLow(self.min_y));
        }
        if self.min_y + self.height > MAX_Y + 1 {
            return Err(DimensionTypeError::TooHigh(self.min_y + self.height));
        }
        if self.logical_height > self.height {
            return Err(DimensionTypeError::LogicalHeight {
                logical: self.logical_height,
                height: self.height,
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn max_build_height(&self) -> i32 {
        self.min_y + self.height
    }

    #[must_use]
    pub const fn overworld() -> Self {
        Self {
            min_y: -64,
            height: 384,
            logical_height: 384,
            coordinate_scale: 1.0,
            has_skylight: true,
            has_ceiling: false,
            ultrawarm: false,
            natural: true,
            bed_works: true,
            ambient_light: 0.0,
        }
    }

    #[must_use]
    pub const fn overworld_caves() -> Self {
        Self {
            has_ceiling: true,
            ..Self::overworld()
        }
    }

    #[must_use]
    pub const fn nether() -> Self {
        Self {
            min_y: 0,
            height: 256,
            logical_height: 128,
            coordinate_scale: 8.0,
            has_skylight: false,
            has_ceiling: true,
            ultrawarm: true,
            natural: false,
            bed_works: false,
            ambient_light: 0.1,
        }
    }

    #[must_use]
    pub const fn end() -> Self {
        Self {
            min_y: 0,
            height: 256,
            logical_height: 256,
            coordinate_scale: 1.0,
            has_skylight: false,
            has_ceiling: false,
            ultrawarm: false,
            natural: false,
            bed_works: false,
            ambient_light: 0.0,
        }
    }

    /// The dimension types every server knows about.
    #[must_use]
    pub fn builtin() -> [(ResourceLocation, Self); 4] {
        [
            (ResourceLocation::minecraft("overworld"), Self::overworld()),
            (
                ResourceLocation::minecraft("overworld_caves"),
                Self::overworld_caves(),
            ),
            (ResourceLocation::minecraft("the_nether"), Self::nether()),
            (ResourceLocation::minecraft("the_end"), Self::end()),
        ]
    }
}

/// A dimension definition: which type it has and how its terrain is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelStem {
    #[serde(rename = "type")]
    pub dimension_type: ResourceLocation,
    pub generator: ChunkGenerator,
}

#[must_use]
pub fn overworld() -> ResourceLocation {
    ResourceLocation::minecraft("overworld")
}

#[must_use]
pub fn nether() -> ResourceLocation {
    ResourceLocation::minecraft("the_nether")
}

#[must_use]
pub fn end() -> ResourceLocation {
    ResourceLocation::minecraft("the_end")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_types_are_valid() {
        for (key, dimension_type) in DimensionType::builtin() {
            assert_eq!(dimension_type.validate(), Ok(()), "{key}");
        }
    }

    #[test]
    fn misaligned_bounds_are_rejected() {
        let mut dimension_type = DimensionType::overworld();
        dimension_type.height = 100;
        assert_eq!(
            dimension_type.validate(),
            Err(DimensionTypeError::Height(100))
        );

        let mut dimension_type = DimensionType::overworld();
        dimension_type.min_y = -63;
        assert_eq!(
            dimension_type.validate(),
            Err(DimensionTypeError::MinY(-63))
        );

        let mut dimension_type = DimensionType::overworld();
        dimension_type.height = 0;
        assert_eq!(dimension_type.validate(), Err(DimensionTypeError::Height(0)));
    }

    #[test]
    fn too_tall_types_name_the_limit() {
        let mut dimension_type = DimensionType::overworld();
        dimension_type.min_y = 0;
        dimension_type.height = 4096;

        let error = dimension_type.validate().unwrap_err();
        assert_eq!(error, DimensionTypeError::TooHigh(4096));
        assert_eq!(
            error.to_string(),
            "min_y + height cannot be higher than 2032, got 4096"
        );
    }
}
