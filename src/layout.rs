//! Venue layout: the immutable-during-a-run geometry a kernel simulates
//! inside. Grounded on the teacher's `game::map::MapData` — a versioned,
//! serde-serializable record with stable element ids — but persisted as
//! human-editable RON rather than a zlib/bincode blob, since venue authoring
//! tools (out of core scope, §1) need to read and write it by hand.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::geometry::{Rect, Vec2};

pub const LAYOUT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub id: String,
    pub rect: Rect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entrance {
    pub id: String,
    pub position: Vec2,
    pub width: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exit {
    pub id: String,
    pub position: Vec2,
    pub width: f64,
    pub capacity: f64,
}

impl Exit {
    /// Absorption radius from §4.6: `width/2 + radius + 0.3`.
    pub fn absorption_radius(&self, agent_radius: f64) -> f64 {
        self.width / 2.0 + agent_radius + 0.3
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attractor {
    pub id: String,
    pub label: String,
    pub center: Vec2,
    pub radius: f64,
    pub weight: f64,
    pub service_time_secs: f64,
    pub queueing: bool,
    pub queue_capacity: u32,
}

/// Among non-blocked exits, pick the one minimising squared distance to
/// `from`. Falls back to the full exit set if every exit is blocked (§4.6,
/// §7 "all exits blocked"). `None` only when `exits` is empty.
pub fn select_exit(exits: &[Exit], blocked: &std::collections::HashSet<String>, from: Vec2) -> Option<usize> {
    let open: Vec<usize> = (0..exits.len()).filter(|&i| !blocked.contains(&exits[i].id)).collect();
    let candidates: &[usize] = if open.is_empty() { &[] } else { &open };
    let pool: Vec<usize> = if candidates.is_empty() {
        (0..exits.len()).collect()
    } else {
        candidates.to_vec()
    };
    pool.into_iter()
        .min_by(|&a, &b| {
            let da = exits[a].position.distance_squared(from);
            let db = exits[b].position.distance_squared(from);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueLayout {
    pub version: u32,
    pub width: f64,
    pub height: f64,
    pub walls: Vec<Wall>,
    pub entrances: Vec<Entrance>,
    pub exits: Vec<Exit>,
    pub attractors: Vec<Attractor>,
}

impl VenueLayout {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(LayoutError::InvalidGeometry(format!(
                "venue dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        for wall in &self.walls {
            if wall.rect.min.x >= wall.rect.max.x || wall.rect.min.y >= wall.rect.max.y {
                return Err(LayoutError::InvalidGeometry(format!(
                    "wall {} has inverted or zero-area corners",
                    wall.id
                )));
            }
        }
        Ok(())
    }

    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let layout: VenueLayout = ron::from_str(&text)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), LayoutError> {
        let pretty = ron::ser::PrettyConfig::default();
        let text = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path.as_ref(), text).map_err(|source| LayoutError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VenueLayout {
        VenueLayout {
            version: LAYOUT_VERSION,
            width: 10.0,
            height: 10.0,
            walls: vec![Wall {
                id: "w0".into(),
                rect: Rect::new(Vec2::new(4.0, 0.0), Vec2::new(6.0, 3.0)),
            }],
            entrances: vec![Entrance {
                id: "e0".into(),
                position: Vec2::new(0.5, 5.0),
                width: 1.0,
            }],
            exits: vec![Exit {
                id: "x0".into(),
                position: Vec2::new(9.5, 5.0),
                width: 1.0,
                capacity: 2.0,
            }],
            attractors: vec![],
        }
    }

    #[test]
    fn round_trips_through_ron_text() {
        let layout = sample();
        let text = ron::ser::to_string_pretty(&layout, ron::ser::PrettyConfig::default())
            .expect("serialize");
        let back: VenueLayout = ron::from_str(&text).expect("deserialize");
        assert_eq!(back.walls.len(), layout.walls.len());
        assert_eq!(back.entrances[0].id, "e0");
        assert_eq!(back.version, LAYOUT_VERSION);
    }

    #[test]
    fn rejects_zero_area_venue() {
        let mut layout = sample();
        layout.width = 0.0;
        assert!(layout.validate().is_err());
    }

    #[test]
    fn rejects_inverted_wall() {
        let mut layout = sample();
        layout.walls[0].rect.max = Vec2::new(2.0, 2.0);
        assert!(layout.validate().is_err());
    }

    #[test]
    fn select_exit_picks_nearest_open_one() {
        let exits = vec![
            Exit { id: "near".into(), position: Vec2::new(1.0, 1.0), width: 1.0, capacity: 1.0 },
            Exit { id: "far".into(), position: Vec2::new(9.0, 9.0), width: 1.0, capacity: 1.0 },
        ];
        let blocked = std::collections::HashSet::new();
        let picked = select_exit(&exits, &blocked, Vec2::new(0.0, 0.0));
        assert_eq!(picked, Some(0));
    }

    #[test]
    fn select_exit_falls_back_to_full_set_when_all_blocked() {
        let exits = vec![Exit {
            id: "only".into(),
            position: Vec2::new(1.0, 1.0),
            width: 1.0,
            capacity: 1.0,
        }];
        let mut blocked = std::collections::HashSet::new();
        blocked.insert("only".to_string());
        let picked = select_exit(&exits, &blocked, Vec2::new(0.0, 0.0));
        assert_eq!(picked, Some(0));
    }
}
