use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the four design workflows a session can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    SketchToRender,
    PerspectiveToFloorplan,
    LandToFloorplan,
    HomeRenovation,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::SketchToRender,
        Mode::PerspectiveToFloorplan,
        Mode::LandToFloorplan,
        Mode::HomeRenovation,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Mode::SketchToRender => "SKETCH_TO_RENDER",
            Mode::PerspectiveToFloorplan => "PERSPECTIVE_TO_FLOORPLAN",
            Mode::LandToFloorplan => "LAND_TO_FLOORPLAN",
            Mode::HomeRenovation => "HOME_RENOVATION",
        }
    }

    pub fn cli_name(self) -> &'static str {
        match self {
            Mode::SketchToRender => "sketch-to-render",
            Mode::PerspectiveToFloorplan => "perspective-to-floorplan",
            Mode::LandToFloorplan => "land-to-floorplan",
            Mode::HomeRenovation => "home-renovation",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Mode::SketchToRender => "Diễn Họa Phối Cảnh",
            Mode::PerspectiveToFloorplan => "Mặt Bằng Từ 3D",
            Mode::LandToFloorplan => "Thiết Kế Mặt Bằng Mới",
            Mode::HomeRenovation => "Cải Tạo Kiến Trúc",
        }
    }

    pub fn is_floorplan(self) -> bool {
        matches!(self, Mode::PerspectiveToFloorplan | Mode::LandToFloorplan)
    }

    /// Output aspect-ratio hint sent with every generation request.
    pub fn aspect_ratio(self) -> &'static str {
        if self.is_floorplan() {
            "1:1"
        } else {
            "16:9"
        }
    }

    /// Land planning is the only workflow that can start from text alone.
    pub fn accepts_text_only(self) -> bool {
        self == Mode::LandToFloorplan
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        Mode::ALL
            .into_iter()
            .find(|mode| mode.cli_name() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown mode '{}'. Expected one of: {}.",
                    raw.trim(),
                    Mode::ALL
                        .iter()
                        .map(|mode| mode.cli_name())
                        .collect::<Vec<&str>>()
                        .join(", ")
                )
            })
    }
}
