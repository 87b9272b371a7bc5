//! Physical pixel density, as reported by codecs that track it (e.g. PNG pHYs).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionUnit {
    Unknown,
    Micrometer,
    Centimeter,
    Inch,
    Meter,
}

/// A pixel density in the given unit, along both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub x: f64,
    pub y: f64,
    pub unit: ResolutionUnit,
}

impl Resolution {
    pub fn new(x: f64, y: f64, unit: ResolutionUnit) -> Self {
        Resolution { x, y, unit }
    }
}
