use std::collections::BTreeMap;
use std::fmt;

use crate::event::LocationEvent;
use crate::geometry::TilePos;
use crate::location::Location;
use crate::occupant::OccupantId;
use crate::properties::{layer, name, split_action};
use crate::transient::LightSource;

/// One dispatch of an `Action` tile property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInvocation<'a> {
    /// First word of the property value.
    pub verb: &'a str,
    /// Remaining words.
    pub args: Vec<&'a str>,
    /// Tile the property was read from.
    pub tile: TilePos,
    /// Who triggered the action, if anyone in particular.
    pub actor: Option<OccupantId>,
}

/// Handler for one action verb. Returns `true` if the action did something.
pub type ActionHandler = Box<dyn Fn(&mut Location, &ActionInvocation<'_>) -> bool>;

/// Maps `Action` verbs to handlers.
///
/// Populated once at startup; new verbs can be registered by anyone holding
/// the registry.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: BTreeMap<String, ActionHandler>,
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("verbs", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ActionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in verbs:
    ///
    /// - `Lamp <radius>` toggles a light on the tile.
    /// - `AnimalDoor` opens or closes the animal door of the building there.
    pub fn standard() -> Self {
        Self::new()
            .with("Lamp", toggle_lamp)
            .with("AnimalDoor", toggle_animal_door)
    }

    /// Register a handler, replacing any previous one for the verb. Returns
    /// `true` if a handler was replaced.
    pub fn register(
        &mut self,
        verb: impl Into<String>,
        handler: impl Fn(&mut Location, &ActionInvocation<'_>) -> bool + 'static,
    ) -> bool {
        self.handlers.insert(verb.into(), Box::new(handler)).is_some()
    }

    /// Builder form of [`ActionRegistry::register`].
    pub fn with(
        mut self,
        verb: impl Into<String>,
        handler: impl Fn(&mut Location, &ActionInvocation<'_>) -> bool + 'static,
    ) -> Self {
        self.register(verb, handler);
        self
    }

    /// Whether a handler is registered for `verb`.
    pub fn contains(&self, verb: &str) -> bool {
        self.handlers.contains_key(verb)
    }

    /// Registered verbs in sorted order.
    pub fn verbs(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Run the action authored on a tile's structure layer.
    ///
    /// A missing property, an empty value or an unknown verb does nothing and
    /// returns `false`.
    pub fn perform(&self, location: &mut Location, tile: TilePos, actor: Option<OccupantId>) -> bool {
        let Some(raw) = location
            .grid()
            .tile_property(tile, name::ACTION, layer::BUILDINGS)
            .map(str::to_owned)
        else {
            return false;
        };
        let Some((verb, args)) = split_action(&raw) else {
            tracing::debug!(%tile, "empty_action_property");
            return false;
        };
        let Some(handler) = self.handlers.get(verb) else {
            tracing::debug!(%tile, verb, "unknown_action_verb");
            return false;
        };
        let invocation = ActionInvocation {
            verb,
            args,
            tile,
            actor,
        };
        let handled = handler(location, &invocation);
        if handled {
            location.push_event(LocationEvent::ActionPerformed {
                verb: verb.to_string(),
                tile,
            });
        }
        handled
    }
}

fn toggle_lamp(location: &mut Location, action: &ActionInvocation<'_>) -> bool {
    let key = format!("lamp:{},{}", action.tile.x, action.tile.y);
    if location.remove_light_source(&key).is_some() {
        return true;
    }
    let radius = action
        .args
        .first()
        .and_then(|r| r.parse::<u32>().ok())
        .unwrap_or(2);
    location.add_light_source(LightSource::new(key, action.tile, radius));
    true
}

fn toggle_animal_door(location: &mut Location, action: &ActionInvocation<'_>) -> bool {
    match location
        .buildings_mut()
        .iter_mut()
        .find(|b| b.animal_door_tile() == Some(action.tile))
    {
        Some(building) => {
            building.toggle_animal_door();
            true
        }
        None => false,
    }
}
