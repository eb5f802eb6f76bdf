//! Compass-style label placement relative to an anchor box.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Size};

/// Where a label renders relative to its anchor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    Top,
    #[default]
    TopStart,
    TopEnd,
    Right,
    RightStart,
    RightEnd,
    Bottom,
    BottomStart,
    BottomEnd,
    Left,
    LeftStart,
    LeftEnd,
}

/// The anchor edge a label is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Alignment along the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Center,
    Start,
    End,
}

impl Placement {
    pub const ALL: [Placement; 12] = [
        Placement::Top,
        Placement::TopStart,
        Placement::TopEnd,
        Placement::Right,
        Placement::RightStart,
        Placement::RightEnd,
        Placement::Bottom,
        Placement::BottomStart,
        Placement::BottomEnd,
        Placement::Left,
        Placement::LeftStart,
        Placement::LeftEnd,
    ];

    pub fn side(self) -> Side {
        match self {
            Placement::Top | Placement::TopStart | Placement::TopEnd => Side::Top,
            Placement::Right | Placement::RightStart | Placement::RightEnd => Side::Right,
            Placement::Bottom | Placement::BottomStart | Placement::BottomEnd => Side::Bottom,
            Placement::Left | Placement::LeftStart | Placement::LeftEnd => Side::Left,
        }
    }

    pub fn alignment(self) -> Alignment {
        match self {
            Placement::Top | Placement::Right | Placement::Bottom | Placement::Left => {
                Alignment::Center
            }
            Placement::TopStart
            | Placement::RightStart
            | Placement::BottomStart
            | Placement::LeftStart => Alignment::Start,
            Placement::TopEnd | Placement::RightEnd | Placement::BottomEnd | Placement::LeftEnd => {
                Alignment::End
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Placement::Top => "top",
            Placement::TopStart => "top-start",
            Placement::TopEnd => "top-end",
            Placement::Right => "right",
            Placement::RightStart => "right-start",
            Placement::RightEnd => "right-end",
            Placement::Bottom => "bottom",
            Placement::BottomStart => "bottom-start",
            Placement::BottomEnd => "bottom-end",
            Placement::Left => "left",
            Placement::LeftStart => "left-start",
            Placement::LeftEnd => "left-end",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Placement::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown placement '{}'", s))
    }
}

/// Compute the top-left corner of a floating box placed against `reference`.
///
/// Both the reference and the result are in the same coordinate space.
pub fn compute_position(reference: Rect, floating: Size, placement: Placement) -> (f64, f64) {
    let center_x = reference.x + reference.width / 2.0 - floating.width / 2.0;
    let center_y = reference.y + reference.height / 2.0 - floating.height / 2.0;

    let (mut x, mut y) = match placement.side() {
        Side::Top => (center_x, reference.y - floating.height),
        Side::Bottom => (center_x, reference.bottom()),
        Side::Right => (reference.right(), center_y),
        Side::Left => (reference.x - floating.width, center_y),
    };

    match (placement.side(), placement.alignment()) {
        (_, Alignment::Center) => {}
        (Side::Top | Side::Bottom, Alignment::Start) => x = reference.x,
        (Side::Top | Side::Bottom, Alignment::End) => x = reference.right() - floating.width,
        (Side::Left | Side::Right, Alignment::Start) => y = reference.y,
        (Side::Left | Side::Right, Alignment::End) => y = reference.bottom() - floating.height,
    }

    (x, y)
}
