//! Image orientation, matching EXIF orientation tag semantics.

use crate::error::{Error, Result};

/// How a decoded image's pixel data is rotated/mirrored relative to its
/// intended display orientation. Matches the eight EXIF orientation values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Normal,
    MirroredHorizontally,
    Rotated180,
    MirroredVertically,
    MirroredHorizontallyRotated90,
    Rotated90,
    MirroredHorizontallyRotated270,
    Rotated270,
}

impl Orientation {
    /// The EXIF orientation tag value (1-8) this variant corresponds to.
    pub fn exif_value(self) -> u8 {
        use Orientation::*;
        match self {
            Normal => 1,
            MirroredHorizontally => 2,
            Rotated180 => 3,
            MirroredVertically => 4,
            MirroredHorizontallyRotated90 => 5,
            Rotated90 => 6,
            MirroredHorizontallyRotated270 => 7,
            Rotated270 => 8,
        }
    }

    pub fn from_exif_value(value: u8) -> Result<Self> {
        use Orientation::*;
        Ok(match value {
            1 => Normal,
            2 => MirroredHorizontally,
            3 => Rotated180,
            4 => MirroredVertically,
            5 => MirroredHorizontallyRotated90,
            6 => Rotated90,
            7 => MirroredHorizontallyRotated270,
            8 => Rotated270,
            _ => {
                return Err(Error::UnsupportedImageProperty(
                    "EXIF orientation value must be in 1..=8",
                ))
            }
        })
    }

    /// Whether pixel width/height are swapped relative to the un-rotated image.
    pub fn swaps_dimensions(self) -> bool {
        use Orientation::*;
        matches!(
            self,
            MirroredHorizontallyRotated90
                | Rotated90
                | MirroredHorizontallyRotated270
                | Rotated270
        )
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Normal
    }
}
