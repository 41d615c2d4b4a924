use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Zoom, rotation and blur for the whole document view.
///
/// Rotation accumulates without wrapping; blur never drops below zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewState {
    pub zoom: f64,
    pub rotation: f64,
    pub blur: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self { zoom: 1.0, rotation: 0.0, blur: 0.0 }
    }
}

impl ViewState {
    pub fn transform(&self) -> Transform {
        Transform { rotation_degrees: self.rotation, blur_radius: self.blur }
    }
}

/// Style applied to every surface; never requires re-rasterizing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Transform {
    pub rotation_degrees: f64,
    pub blur_radius: f64,
}

impl Transform {
    pub fn css_transform(&self) -> String {
        format!("rotate({}deg)", self.rotation_degrees)
    }

    pub fn css_filter(&self) -> String {
        format!("blur({}px)", self.blur_radius)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomChange {
    /// Multiply the current zoom
    By(f64),
    /// Replace the current zoom
    To(f64),
}

impl ZoomChange {
    pub fn resolve(self, current: f64) -> f64 {
        match self {
            Self::By(factor) => current * factor,
            Self::To(zoom) => zoom,
        }
    }
}

/// One discrete user action on the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    ZoomIn,
    ZoomOut,
    RotateClockwise,
    RotateCounterClockwise,
    BlurMore,
    BlurLess,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::ZoomIn,
        Intent::ZoomOut,
        Intent::RotateClockwise,
        Intent::RotateCounterClockwise,
        Intent::BlurMore,
        Intent::BlurLess,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ZoomIn => "zoom-in",
            Self::ZoomOut => "zoom-out",
            Self::RotateClockwise => "rotate-cw",
            Self::RotateCounterClockwise => "rotate-ccw",
            Self::BlurMore => "blur-more",
            Self::BlurLess => "blur-less",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent `{0}` (expected one of zoom-in, zoom-out, rotate-cw, rotate-ccw, blur-more, blur-less)")]
pub struct UnknownIntent(pub String);

impl FromStr for Intent {
    type Err = UnknownIntent;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Intent::ALL
            .into_iter()
            .find(|intent| intent.name() == value)
            .ok_or_else(|| UnknownIntent(value.to_owned()))
    }
}
