use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::location::Location;

/// Every loaded location, in load order.
///
/// Building interiors are owned by their buildings, not by the world, but
/// [`World::find`] searches them too.
#[derive(Debug, Default)]
pub struct World {
    locations: Vec<Location>,
    index: HashMap<String, usize>,
}

impl World {
    /// An empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a location. Names are unique.
    pub fn add(&mut self, location: Location) -> CoreResult<()> {
        if self.index.contains_key(location.name()) {
            return Err(CoreError::DuplicateLocation(location.name().to_string()));
        }
        self.index
            .insert(location.name().to_string(), self.locations.len());
        self.locations.push(location);
        Ok(())
    }

    /// Unload a top-level location.
    pub fn remove(&mut self, name: &str) -> CoreResult<Location> {
        let idx = self
            .index
            .remove(name)
            .ok_or_else(|| CoreError::LocationNotFound(name.to_string()))?;
        let location = self.locations.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        Ok(location)
    }

    /// Location by name.
    pub fn get(&self, name: &str) -> Option<&Location> {
        self.index.get(name).map(|&i| &self.locations[i])
    }

    /// Mutable location by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Location> {
        self.index.get(name).map(|&i| &mut self.locations[i])
    }

    /// Look a location up by name, including building interiors.
    pub fn find(&self, name: &str) -> Option<&Location> {
        self.get(name)
            .or_else(|| self.locations.iter().find_map(|l| find_interior(l, name)))
    }

    /// Mutable form of [`World::find`].
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Location> {
        if let Some(&i) = self.index.get(name) {
            return Some(&mut self.locations[i]);
        }
        self.locations
            .iter_mut()
            .find_map(|l| find_interior_mut(l, name))
    }

    /// Like [`World::find_mut`] but an error when missing.
    pub fn require_mut(&mut self, name: &str) -> CoreResult<&mut Location> {
        self.find_mut(name)
            .ok_or_else(|| CoreError::LocationNotFound(name.to_string()))
    }

    /// Top-level locations in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    /// Top-level locations, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Location> {
        self.locations.iter_mut()
    }

    /// Names of top-level locations in load order.
    pub fn names(&self) -> Vec<String> {
        self.locations.iter().map(|l| l.name().to_string()).collect()
    }

    /// Number of top-level locations.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the world holds no locations.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

fn find_interior<'a>(location: &'a Location, name: &str) -> Option<&'a Location> {
    location.interiors().find_map(|inside| {
        if inside.name() == name {
            Some(inside)
        } else {
            find_interior(inside, name)
        }
    })
}

fn find_interior_mut<'a>(location: &'a mut Location, name: &str) -> Option<&'a mut Location> {
    location
        .buildings_mut()
        .iter_mut()
        .filter_map(|b| b.interior_mut())
        .find_map(|inside| {
            if inside.name() == name {
                Some(inside)
            } else {
                find_interior_mut(inside, name)
            }
        })
}
