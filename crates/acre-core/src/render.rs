//! ASCII occupancy map for diagnostics.

use crate::geometry::{PixelRect, TilePos};
use crate::location::Location;
use crate::object::ObjectKind;
use crate::terrain::TerrainFeature;

/// Symbol legend for [`render_ascii`], in drawing order.
pub const LEGEND: &[(char, &str)] = &[
    ('.', "open ground"),
    ('#', "impassable ground"),
    ('~', "water"),
    (':', "tilled dirt"),
    ('c', "tilled dirt with crop"),
    ('"', "grass"),
    ('T', "tree"),
    ('Y', "fruit tree"),
    ('=', "flooring"),
    ('L', "bush"),
    ('R', "resource clump"),
    ('o', "object"),
    ('*', "forage"),
    ('f', "furniture"),
    ('B', "building"),
    ('D', "building door"),
    ('X', "fixture"),
    ('a', "animal"),
    ('@', "villager"),
    ('M', "monster"),
    ('F', "farmer"),
];

/// Draw one character per tile, later categories on top of earlier ones.
pub fn render_ascii(location: &Location) -> String {
    let grid = location.grid();
    let width = grid.width() as usize;
    let height = grid.height() as usize;
    let mut cells = vec!['.'; width * height];
    let mut put = |tile: TilePos, symbol: char| {
        if grid.is_tile_on_map(tile) {
            cells[tile.y as usize * width + tile.x as usize] = symbol;
        }
    };

    for tile in grid.positions() {
        if grid.is_water(tile) {
            put(tile, '~');
        } else if !grid.is_tile_passable(tile) {
            put(tile, '#');
        }
    }
    for (tile, feature) in location.terrain_features().iter() {
        let symbol = match feature {
            TerrainFeature::HoeDirt(d) if d.has_crop() => 'c',
            TerrainFeature::HoeDirt(_) => ':',
            TerrainFeature::Grass(_) => '"',
            TerrainFeature::Tree(_) => 'T',
            TerrainFeature::FruitTree(_) => 'Y',
            TerrainFeature::Flooring(_) => '=',
        };
        put(tile, symbol);
    }
    for bush in location.large_terrain_features() {
        fill(&mut put, &bush.bounding_box(), 'L');
    }
    for clump in location.resource_clumps() {
        fill(&mut put, &clump.bounding_box(), 'R');
    }
    for object in location.objects().values() {
        let symbol = if matches!(object.kind, ObjectKind::Forage) {
            '*'
        } else {
            'o'
        };
        put(object.tile, symbol);
    }
    for furniture in location.furniture().iter() {
        fill(&mut put, &furniture.bounding_box(), 'f');
    }
    for building in location.buildings() {
        fill(&mut put, &building.bounding_box(), 'B');
        if let Some(door) = building.human_door_tile() {
            put(door, 'D');
        }
    }
    for fixture in location.fixtures() {
        fill(&mut put, &fixture.bounding_box(), 'X');
    }
    for animal in location.animals() {
        put(center_tile(&animal.bounding_box()), 'a');
    }
    for character in location.characters() {
        let symbol = if character.is_monster() { 'M' } else { '@' };
        put(center_tile(&character.bounding_box()), symbol);
    }
    for farmer in location.farmers() {
        put(center_tile(&farmer.bounding_box()), 'F');
    }

    cells
        .chunks(width.max(1))
        .map(|row| row.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn fill(put: &mut impl FnMut(TilePos, char), rect: &PixelRect, symbol: char) {
    for tile in rect.covered_tiles() {
        put(tile, symbol);
    }
}

fn center_tile(rect: &PixelRect) -> TilePos {
    TilePos::from_pixel(rect.center_x(), rect.y + rect.height / 2)
}
