// entities.rs — entity lump parsing and spawn point selection

use std::collections::HashMap;
use std::fmt;

use rand::Rng;

use crate::common::com_dprintf;
use crate::q_shared::Vec3;

/// Classnames a player may spawn at.
pub const SPAWN_CLASSNAMES: [&str; 2] = ["info_player_deathmatch", "info_player_start"];

/// One `{ "key" "value" ... }` block of the entity lump.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BspEntity {
    pairs: HashMap<String, String>,
}

/// A key the caller relies on was absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingKey {
    pub classname: String,
    pub key: String,
}

impl fmt::Display for MissingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} has no \"{}\" key", self.classname, self.key)
    }
}

impl std::error::Error for MissingKey {}

impl BspEntity {
    pub fn has_key(&self, key: &str) -> bool {
        self.pairs.contains_key(key)
    }

    /// Optional key lookup.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    /// Lookup for keys the caller cannot do without.
    pub fn required(&self, key: &str) -> Result<&str, MissingKey> {
        self.value(key).ok_or_else(|| MissingKey {
            classname: self.classname().unwrap_or("entity").to_string(),
            key: key.to_string(),
        })
    }

    pub fn classname(&self) -> Option<&str> {
        self.value("classname")
    }

    /// Parse a "x y z" value. Missing or malformed values give None.
    pub fn vector(&self, key: &str) -> Option<Vec3> {
        let mut it = self.value(key)?.split_whitespace().map(|s| s.parse::<f32>());
        let v = [it.next()?.ok()?, it.next()?.ok()?, it.next()?.ok()?];
        Some(v)
    }

    pub fn float(&self, key: &str) -> Option<f32> {
        self.value(key)?.trim().parse().ok()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.pairs.insert(key.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// ============================================================
// Entity text parsing
// ============================================================

/// Where the quote-toggled scanner is within a key/value pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    /// waiting for the opening quote of a key
    BeginKey,
    /// inside the key
    EndKey,
    /// waiting for the opening quote of the value
    BeginValue,
    /// inside the value
    EndValue,
}

/// Split the entity lump into key/value dictionaries. Braces inside quoted
/// strings are ordinary characters; text outside any block is ignored.
pub fn parse_entities(text: &str) -> Vec<BspEntity> {
    let mut entities = Vec::new();
    let mut current: Option<BspEntity> = None;
    let mut state = QuoteState::BeginKey;
    let mut key = String::new();
    let mut value = String::new();

    for ch in text.chars() {
        if ch == '"' {
            state = match state {
                QuoteState::BeginKey => QuoteState::EndKey,
                QuoteState::EndKey => QuoteState::BeginValue,
                QuoteState::BeginValue => QuoteState::EndValue,
                QuoteState::EndValue => {
                    if let Some(ent) = current.as_mut() {
                        ent.pairs.insert(std::mem::take(&mut key), std::mem::take(&mut value));
                    }
                    key.clear();
                    value.clear();
                    QuoteState::BeginKey
                }
            };
            continue;
        }

        match state {
            QuoteState::EndKey => key.push(ch),
            QuoteState::EndValue => value.push(ch),
            _ => match ch {
                '{' => {
                    if let Some(ent) = current.take() {
                        // unterminated block
                        if !ent.is_empty() {
                            entities.push(ent);
                        }
                    }
                    current = Some(BspEntity::default());
                    state = QuoteState::BeginKey;
                }
                '}' => {
                    if let Some(ent) = current.take() {
                        if !ent.is_empty() {
                            entities.push(ent);
                        }
                    }
                    state = QuoteState::BeginKey;
                    key.clear();
                }
                _ => {}
            },
        }
    }

    if let Some(ent) = current {
        if !ent.is_empty() {
            entities.push(ent);
        }
    }
    entities
}

// ============================================================
// Spawn points
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub origin: Vec3,
    /// degrees, 0 when the entity has no "angle" key
    pub yaw: f32,
}

/// Every usable spawn entity. `origin` is required; entities without a
/// parsable one are skipped.
pub fn spawn_points(entities: &[BspEntity]) -> Vec<SpawnPoint> {
    entities
        .iter()
        .filter(|e| e.classname().is_some_and(|c| SPAWN_CLASSNAMES.contains(&c)))
        .filter_map(|e| {
            let origin = match e.required("origin") {
                Ok(_) => e.vector("origin"),
                Err(err) => {
                    com_dprintf(&format!("spawn point skipped: {}\n", err));
                    return None;
                }
            };
            let Some(origin) = origin else {
                com_dprintf(&format!(
                    "spawn point skipped: bad origin \"{}\"\n",
                    e.value("origin").unwrap_or_default()
                ));
                return None;
            };
            Some(SpawnPoint {
                origin,
                yaw: e.float("angle").unwrap_or(0.0),
            })
        })
        .collect()
}

/// Pick a spawn point uniformly at random.
pub fn find_spawn_point<R: Rng + ?Sized>(entities: &[BspEntity], rng: &mut R) -> Option<SpawnPoint> {
    let points = spawn_points(entities);
    if points.is_empty() {
        return None;
    }
    Some(points[rng.gen_range(0..points.len())])
}
