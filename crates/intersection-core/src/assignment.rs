use crate::error::{IntersectionError, Result};
use crate::lane::Lane;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// DurationAssignment
// ---------------------------------------------------------------------------

/// Green-light seconds for every lane, fixed for the lifetime of one run.
///
/// Only constructible with all four lanes present, so holders never have to
/// handle a missing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationAssignment {
    durations: [u32; Lane::COUNT],
}

impl DurationAssignment {
    /// Build from durations listed in North, East, South, West order.
    pub fn new(north: u32, east: u32, south: u32, west: u32) -> Self {
        Self {
            durations: [north, east, south, west],
        }
    }

    /// Build from a keyed map, rejecting any map that lacks a lane.
    pub fn from_map(map: &BTreeMap<Lane, u32>) -> Result<Self> {
        let missing: Vec<Lane> = Lane::all()
            .iter()
            .copied()
            .filter(|l| !map.contains_key(l))
            .collect();
        if !missing.is_empty() {
            return Err(IntersectionError::MalformedAssignment(format!(
                "missing durations for lanes: {}",
                lane_list(&missing)
            )));
        }
        let mut durations = [0; Lane::COUNT];
        for (lane, secs) in map {
            durations[lane.index()] = *secs;
        }
        Ok(Self { durations })
    }

    /// Validate the `lane_durations` object of a service response.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            IntersectionError::MalformedAssignment("lane_durations is not an object".into())
        })?;

        let mut map = BTreeMap::new();
        for (key, raw) in obj {
            let lane: Lane = key.parse().map_err(|_| {
                IntersectionError::MalformedAssignment(format!("unknown lane '{key}'"))
            })?;
            let secs = parse_duration(lane, raw)?;
            if map.insert(lane, secs).is_some() {
                return Err(IntersectionError::MalformedAssignment(format!(
                    "duplicate duration for lane {lane}"
                )));
            }
        }
        Self::from_map(&map)
    }

    pub fn get(&self, lane: Lane) -> u32 {
        self.durations[lane.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Lane, u32)> + '_ {
        Lane::all().iter().map(move |&l| (l, self.get(l)))
    }

    pub fn total(&self) -> u64 {
        self.durations.iter().map(|&d| u64::from(d)).sum()
    }

    /// All lanes by descending duration, ties broken by lane priority.
    pub fn ranking(&self) -> Vec<Lane> {
        let mut lanes = Lane::all().to_vec();
        // Stable sort keeps priority order among equal durations.
        lanes.sort_by(|a, b| self.get(*b).cmp(&self.get(*a)));
        lanes
    }

    /// Lanes that will actually be given a green, in activation order.
    pub fn activation_order(&self) -> Vec<Lane> {
        self.ranking()
            .into_iter()
            .filter(|&l| self.get(l) > 0)
            .collect()
    }
}

impl Serialize for DurationAssignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Lane::COUNT))?;
        for (lane, secs) in self.iter() {
            map.serialize_entry(&lane, &secs)?;
        }
        map.end()
    }
}

fn parse_duration(lane: Lane, raw: &Value) -> Result<u32> {
    let Value::Number(n) = raw else {
        return Err(IntersectionError::MalformedAssignment(format!(
            "non-numeric duration {raw} for lane {lane}"
        )));
    };
    if let Some(v) = n.as_u64() {
        return u32::try_from(v).map_err(|_| {
            IntersectionError::MalformedAssignment(format!(
                "duration {v} for lane {lane} is out of range"
            ))
        });
    }
    if n.as_i64().is_some_and(|v| v < 0) || n.as_f64().is_some_and(|v| v < 0.0) {
        return Err(IntersectionError::MalformedAssignment(format!(
            "negative duration {n} for lane {lane}"
        )));
    }
    Err(IntersectionError::MalformedAssignment(format!(
        "non-integer duration {n} for lane {lane}"
    )))
}

fn lane_list(lanes: &[Lane]) -> String {
    lanes
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// DensityReport
// ---------------------------------------------------------------------------

/// A validated density-service response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityReport {
    pub assignment: DurationAssignment,
    /// Served ordering hint; `None` when absent or unparsable.
    pub sorted_lanes: Option<Vec<Lane>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub lane_densities: BTreeMap<Lane, f64>,
}

impl DensityReport {
    /// Report with no served hint, as produced by local providers.
    pub fn from_assignment(assignment: DurationAssignment) -> Self {
        Self {
            assignment,
            sorted_lanes: None,
            lane_densities: BTreeMap::new(),
        }
    }

    /// Interpret a response given its HTTP status and decoded body.
    ///
    /// The service reports failures both through non-2xx statuses and through
    /// a `"status": "error"` field, so either one yields a `ServiceError`.
    pub fn from_response(status: u16, body: Value) -> Result<Self> {
        let flagged = body.get("status").and_then(Value::as_str) == Some("error");
        if !(200..300).contains(&status) || flagged {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string());
            return Err(IntersectionError::ServiceError { status, message });
        }
        Self::from_value(body)
    }

    pub fn from_value(body: Value) -> Result<Self> {
        if !body.is_object() {
            return Err(IntersectionError::MalformedAssignment(
                "response body is not a JSON object".into(),
            ));
        }
        let durations = body.get("lane_durations").ok_or_else(|| {
            IntersectionError::MalformedAssignment("response has no lane_durations".into())
        })?;
        let assignment = DurationAssignment::from_json(durations)?;

        let sorted_lanes = match body.get("sorted_lanes") {
            None | Some(Value::Null) => None,
            Some(hint) => parse_hint(hint),
        };

        let mut lane_densities = BTreeMap::new();
        if let Some(obj) = body.get("lane_densities").and_then(Value::as_object) {
            for (key, raw) in obj {
                match (key.parse::<Lane>(), raw.as_f64()) {
                    (Ok(lane), Some(d)) => {
                        lane_densities.insert(lane, d);
                    }
                    _ => tracing::debug!("ignoring density entry {key}={raw}"),
                }
            }
        }

        Ok(Self {
            assignment,
            sorted_lanes,
            lane_densities,
        })
    }

    /// Compare the served ordering hint against the order derived from
    /// durations. Tied lanes may appear in either order.
    pub fn ordering_check(&self) -> OrderingCheck {
        let Some(served) = &self.sorted_lanes else {
            return OrderingCheck::Absent;
        };
        let derived = self.assignment.ranking();

        let mut seen = served.clone();
        seen.sort();
        seen.dedup();
        let complete = served.len() == Lane::COUNT && seen.len() == Lane::COUNT;
        let non_increasing = served
            .windows(2)
            .all(|w| self.assignment.get(w[0]) >= self.assignment.get(w[1]));

        if complete && non_increasing {
            OrderingCheck::Agrees
        } else {
            OrderingCheck::Disagrees {
                served: served.clone(),
                derived,
            }
        }
    }
}

fn parse_hint(hint: &Value) -> Option<Vec<Lane>> {
    let items = hint.as_array()?;
    let mut lanes = Vec::with_capacity(items.len());
    for item in items {
        match item.as_str().map(str::parse::<Lane>) {
            Some(Ok(lane)) => lanes.push(lane),
            _ => {
                tracing::warn!("dropping sorted_lanes hint with unrecognised entry {item}");
                return None;
            }
        }
    }
    Some(lanes)
}

// ---------------------------------------------------------------------------
// OrderingCheck
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum OrderingCheck {
    Absent,
    Agrees,
    Disagrees { served: Vec<Lane>, derived: Vec<Lane> },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
