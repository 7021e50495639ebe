//! Stage geometry and the tolerant descriptor it is built from
//!
//! Stage data arrives from an external loader and may be hand-edited, so
//! every field is optional on the wire. Bad entries are repaired or dropped
//! with a warning; building a [`Stage`] never fails once the text is JSON.

use glam::Vec2;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::geometry::Rect;
use crate::error::SimError;

/// A static landing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Platform {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Platform {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }
}

/// Travel direction of a moving platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Heading {
    Left,
    Right,
}

impl Heading {
    /// -1 for left, +1 for right
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Heading::Left => -1.0,
            Heading::Right => 1.0,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
        }
    }
}

/// A platform that ping-pongs horizontally between `start_x` and `end_x`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingPlatform {
    pub surface: Platform,
    pub start_x: f32,
    pub end_x: f32,
    /// Pixels per nominal frame
    pub speed: f32,
    pub heading: Heading,
    /// Horizontal displacement applied during the latest advance
    #[serde(skip)]
    pub last_dx: f32,
}

impl MovingPlatform {
    /// Bounds are put in order and the surface is shifted into them, width
    /// kept. A negative speed counts as its magnitude.
    pub fn new(surface: Platform, start_x: f32, end_x: f32, speed: f32, heading: Heading) -> Self {
        let (start_x, end_x) = ordered(start_x, end_x);
        let width = surface.width();
        let x1 = surface.x1.max(start_x).min(end_x);
        Self {
            surface: Platform::new(x1, surface.y1, x1 + width, surface.y2),
            start_x,
            end_x,
            speed: speed.abs(),
            heading,
            last_dx: 0.0,
        }
    }

    /// Re-apply the construction rules to a platform whose public fields
    /// may have been edited directly
    pub fn normalized(self) -> Self {
        Self::new(self.surface, self.start_x, self.end_x, self.speed, self.heading)
    }
}

/// Immutable stage snapshot plus live moving-platform positions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage {
    pub name: String,
    pub platforms: Vec<Platform>,
    pub moving_platforms: Vec<MovingPlatform>,
    /// Hitboxes are rectangular even though spikes render as triangles
    pub spikes: Vec<Rect>,
    pub goal: Option<Rect>,
    /// Seconds on the clock
    pub time_limit: f32,
    pub spawn: Option<Vec2>,
}

impl Stage {
    /// Parse stage JSON; malformed fields fall back to defaults
    pub fn from_json(json: &str, default_time_limit: f32) -> Result<Self, SimError> {
        let descriptor: StageDescriptor = serde_json::from_str(json)?;
        Ok(Self::from_descriptor(descriptor, default_time_limit))
    }

    /// Re-apply the moving-platform construction rules to every entry.
    ///
    /// For stages assembled in code rather than parsed.
    pub fn normalized(mut self) -> Self {
        self.moving_platforms = self
            .moving_platforms
            .into_iter()
            .map(MovingPlatform::normalized)
            .collect();
        self
    }

    /// Build a stage, repairing or dropping invalid entries
    pub fn from_descriptor(desc: StageDescriptor, default_time_limit: f32) -> Self {
        let name = desc.name.unwrap_or_else(|| "untitled".to_string());

        let platforms: Vec<Platform> = desc
            .platforms
            .into_iter()
            .filter_map(|raw| {
                let platform = raw.build();
                if platform.is_none() {
                    log::warn!("stage {name}: dropping platform with missing coordinates");
                }
                platform
            })
            .collect();

        let moving_platforms: Vec<MovingPlatform> = desc
            .moving_platforms
            .into_iter()
            .filter_map(|raw| {
                let platform = raw.build();
                if platform.is_none() {
                    log::warn!("stage {name}: dropping moving platform with missing coordinates");
                }
                platform
            })
            .collect();

        let spikes: Vec<Rect> = desc
            .spikes
            .into_iter()
            .filter_map(|raw| {
                let spike = raw.build();
                if spike.is_none() {
                    log::warn!("stage {name}: dropping spike with missing bounds");
                }
                spike
            })
            .collect();

        let goal = desc.goal.and_then(|raw| raw.build());
        if goal.is_none() {
            log::warn!("stage {name}: no usable goal, stage cannot be cleared");
        }

        let time_limit = match desc.time_limit {
            Some(limit) if limit.is_finite() && limit > 0.0 => limit,
            Some(limit) => {
                log::warn!("stage {name}: invalid timeLimit {limit}, using {default_time_limit}");
                default_time_limit
            }
            None => default_time_limit,
        };

        let spawn = desc.start.and_then(|p| Some(Vec2::new(p.x?, p.y?)));

        Self {
            name,
            platforms,
            moving_platforms,
            spikes,
            goal,
            time_limit,
            spawn,
        }
    }
}

// === Wire format ===

/// Stage JSON as authored; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StageDescriptor {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub platforms: Vec<RawPlatform>,
    #[serde(deserialize_with = "lenient_list")]
    pub moving_platforms: Vec<RawMovingPlatform>,
    #[serde(deserialize_with = "lenient_list")]
    pub spikes: Vec<RawRect>,
    #[serde(deserialize_with = "lenient_item")]
    pub goal: Option<RawRect>,
    #[serde(deserialize_with = "lenient_number")]
    pub time_limit: Option<f32>,
    #[serde(deserialize_with = "lenient_item")]
    pub start: Option<RawPoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPlatform {
    #[serde(deserialize_with = "lenient_number")]
    pub x1: Option<f32>,
    #[serde(deserialize_with = "lenient_number")]
    pub y1: Option<f32>,
    #[serde(deserialize_with = "lenient_number")]
    pub x2: Option<f32>,
    #[serde(deserialize_with = "lenient_number")]
    pub y2: Option<f32>,
}

impl RawPlatform {
    fn build(&self) -> Option<Platform> {
        let (x1, x2) = ordered(self.x1?, self.x2?);
        let y1 = self.y1?;
        Some(Platform::new(x1, y1, x2, self.y2.unwrap_or(y1)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawMovingPlatform {
    #[serde(flatten)]
    pub surface: RawPlatform,
    #[serde(deserialize_with = "lenient_number")]
    pub start_x: Option<f32>,
    #[serde(deserialize_with = "lenient_number")]
    pub end_x: Option<f32>,
    #[serde(deserialize_with = "lenient_number")]
    pub speed: Option<f32>,
    #[serde(deserialize_with = "lenient_number")]
    pub direction: Option<f32>,
}

impl RawMovingPlatform {
    fn build(&self) -> Option<MovingPlatform> {
        let surface = self.surface.build()?;
        let start_x = self.start_x.unwrap_or(surface.x1);
        let end_x = self.end_x.unwrap_or(surface.x1);
        let speed = self.speed.unwrap_or(1.0);
        let heading = match self.direction {
            Some(d) if d < 0.0 => Heading::Left,
            _ => Heading::Right,
        };
        Some(MovingPlatform::new(surface, start_x, end_x, speed, heading))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRect {
    #[serde(deserialize_with = "lenient_number")]
    pub x: Option<f32>,
    #[serde(deserialize_with = "lenient_number")]
    pub y: Option<f32>,
    #[serde(deserialize_with = "lenient_number")]
    pub width: Option<f32>,
    #[serde(deserialize_with = "lenient_number")]
    pub height: Option<f32>,
}

impl RawRect {
    fn build(&self) -> Option<Rect> {
        Some(Rect::new(self.x?, self.y?, self.width?, self.height?).normalized())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPoint {
    #[serde(deserialize_with = "lenient_number")]
    pub x: Option<f32>,
    #[serde(deserialize_with = "lenient_number")]
    pub y: Option<f32>,
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Any finite JSON number, otherwise `None`
fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f32>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(value
        .as_f64()
        .map(|n| n as f32)
        .filter(|n| n.is_finite()))
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(value.as_str().map(str::to_owned))
}

/// An object that parses as `T`, otherwise `None`
fn lenient_item<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(d)?;
    Ok(serde_json::from_value(value).ok())
}

/// Array elements that parse as `T`; anything else is skipped
fn lenient_list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(d)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: f32 = 20.0;

    #[test]
    fn test_parse_full_stage() {
        let json = r#"{
            "id": 2,
            "name": "Stage 2",
            "platforms": [{"x1": -500, "y1": 500, "x2": 300, "y2": 500}],
            "movingPlatforms": [
                {"x1": 350, "y1": 480, "x2": 430, "y2": 480,
                 "startX": 350, "endX": 450, "speed": 0.8, "direction": 1}
            ],
            "spikes": [{"x": 600, "y": 480, "width": 30, "height": 20}],
            "goal": {"x": 2400, "y": 400, "width": 40, "height": 50},
            "timeLimit": 30,
            "startText": {"x": 50, "y": 450, "text": "STAGE 2"}
        }"#;
        let stage = Stage::from_json(json, LIMIT).unwrap();
        assert_eq!(stage.name, "Stage 2");
        assert_eq!(stage.platforms.len(), 1);
        assert_eq!(stage.moving_platforms.len(), 1);
        assert_eq!(stage.moving_platforms[0].heading, Heading::Right);
        assert_eq!(stage.moving_platforms[0].speed, 0.8);
        assert_eq!(stage.spikes[0], Rect::new(600.0, 480.0, 30.0, 20.0));
        assert_eq!(stage.goal, Some(Rect::new(2400.0, 400.0, 40.0, 50.0)));
        assert_eq!(stage.time_limit, 30.0);
    }

    #[test]
    fn test_missing_or_malformed_time_limit_defaults() {
        let stage = Stage::from_json("{}", LIMIT).unwrap();
        assert_eq!(stage.time_limit, LIMIT);
        let stage = Stage::from_json(r#"{"timeLimit": "soon"}"#, LIMIT).unwrap();
        assert_eq!(stage.time_limit, LIMIT);
        let stage = Stage::from_json(r#"{"timeLimit": -5}"#, LIMIT).unwrap();
        assert_eq!(stage.time_limit, LIMIT);
    }

    #[test]
    fn test_empty_stage_is_valid() {
        let stage = Stage::from_json("{}", LIMIT).unwrap();
        assert!(stage.platforms.is_empty());
        assert!(stage.moving_platforms.is_empty());
        assert!(stage.spikes.is_empty());
        assert!(stage.goal.is_none());
        assert!(stage.spawn.is_none());
    }

    #[test]
    fn test_bad_entries_dropped_not_fatal() {
        let json = r#"{
            "platforms": [{"x1": 0, "y1": 100, "x2": 50}, {"x1": "a"}, 7, null],
            "spikes": "none",
            "goal": {"x": 1, "y": 2}
        }"#;
        let stage = Stage::from_json(json, LIMIT).unwrap();
        assert_eq!(stage.platforms, vec![Platform::new(0.0, 100.0, 50.0, 100.0)]);
        assert!(stage.spikes.is_empty());
        assert!(stage.goal.is_none());
    }

    #[test]
    fn test_moving_platform_repairs() {
        let json = r#"{"movingPlatforms": [
            {"x1": 900, "y1": 300, "x2": 980, "y2": 300,
             "startX": 800, "endX": 400, "speed": -2, "direction": -7}
        ]}"#;
        let stage = Stage::from_json(json, LIMIT).unwrap();
        let mp = &stage.moving_platforms[0];
        assert_eq!((mp.start_x, mp.end_x), (400.0, 800.0));
        assert_eq!(mp.speed, 2.0);
        assert_eq!(mp.heading, Heading::Left);
        // Clamped into range with width kept
        assert_eq!(mp.surface.x1, 800.0);
        assert_eq!(mp.surface.width(), 80.0);
    }

    #[test]
    fn test_moving_platform_new_orders_bounds() {
        let mp = MovingPlatform::new(
            Platform::new(300.0, 300.0, 380.0, 300.0),
            400.0,
            100.0,
            -1.5,
            Heading::Right,
        );
        assert_eq!((mp.start_x, mp.end_x), (100.0, 400.0));
        assert_eq!(mp.surface.x1, 300.0);
        assert_eq!(mp.speed, 1.5);

        // Fields edited after construction are repaired again
        let mut edited = mp.clone();
        edited.start_x = 500.0;
        edited.end_x = 200.0;
        edited.surface.x1 = 50.0;
        edited.surface.x2 = 130.0;
        let stage = Stage {
            name: "code".into(),
            platforms: Vec::new(),
            moving_platforms: vec![edited],
            spikes: Vec::new(),
            goal: None,
            time_limit: LIMIT,
            spawn: None,
        }
        .normalized();
        let mp = &stage.moving_platforms[0];
        assert_eq!((mp.start_x, mp.end_x), (200.0, 500.0));
        assert_eq!(mp.surface.x1, 200.0);
        assert_eq!(mp.surface.width(), 80.0);
    }

    #[test]
    fn test_spawn_point() {
        let stage = Stage::from_json(r#"{"start": {"x": 40, "y": 300}}"#, LIMIT).unwrap();
        assert_eq!(stage.spawn, Some(Vec2::new(40.0, 300.0)));
    }

    #[test]
    fn test_not_json_is_an_error() {
        assert!(matches!(Stage::from_json("<html>", LIMIT), Err(SimError::Stage(_))));
    }
}
