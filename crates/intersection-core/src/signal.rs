use crate::lane::Lane;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalColor {
    Red,
    Green,
}

impl fmt::Display for SignalColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalColor::Red => f.write_str("red"),
            SignalColor::Green => f.write_str("green"),
        }
    }
}

/// Light colour shown on every approach. Always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalState {
    green: Option<Lane>,
}

impl SignalState {
    pub fn project(active_lane: Option<Lane>) -> Self {
        Self { green: active_lane }
    }

    pub fn all_red() -> Self {
        Self { green: None }
    }

    pub fn color(&self, lane: Lane) -> SignalColor {
        if self.green == Some(lane) {
            SignalColor::Green
        } else {
            SignalColor::Red
        }
    }

    pub fn green_lane(&self) -> Option<Lane> {
        self.green
    }

    pub fn iter(&self) -> impl Iterator<Item = (Lane, SignalColor)> + '_ {
        Lane::all().iter().map(move |&l| (l, self.color(l)))
    }
}

impl Serialize for SignalState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Lane::COUNT))?;
        for (lane, color) in self.iter() {
            map.serialize_entry(&lane, &color)?;
        }
        map.end()
    }
}
