//! Supply model
//!
//! Units fighting far from friendly land fight badly. Effectiveness is 1.0
//! inside own territory and falls off with distance to the nearest friendly
//! cell or friendly city. Cut-off units keep a small non-zero floor.

use serde::{Deserialize, Serialize};

use crate::core::config::SupplyConfig;
use crate::core::types::{CityId, FactionId, GridCoord};
use crate::spatial::territory::TerritoryGrid;

/// A city on the map. It supplies whichever faction holds its cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub coord: GridCoord,
    pub capital: bool,
}

impl City {
    pub fn new(id: CityId, name: &str, coord: GridCoord) -> Self {
        Self {
            id,
            name: name.to_string(),
            coord,
            capital: false,
        }
    }

    pub fn as_capital(mut self) -> Self {
        self.capital = true;
        self
    }
}

/// Eased quadratic falloff: 1 at distance 0, 0 at `radius`
///
/// Equivalent to a quadratic ease-out of `1 - d/radius`.
pub fn eased_falloff(distance: f64, radius: f64) -> f64 {
    let u = (distance / radius).clamp(0.0, 1.0);
    1.0 - u * u
}

/// Cities and the supply calculation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplyNetwork {
    cities: Vec<City>,
    next_city_id: u32,
}

impl SupplyNetwork {
    pub fn new() -> Self {
        Self {
            cities: Vec::new(),
            next_city_id: 1,
        }
    }

    /// Found a city on a cell
    pub fn add_city(&mut self, name: &str, coord: GridCoord, capital: bool) -> CityId {
        let id = CityId(self.next_city_id.max(1));
        self.next_city_id = id.0 + 1;
        let city = City::new(id, name, coord);
        self.cities.push(if capital { city.as_capital() } else { city });
        id
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn city_at(&self, coord: GridCoord) -> Option<&City> {
        self.cities.iter().find(|c| c.coord == coord)
    }

    /// Cities currently held by a faction
    pub fn cities_of<'a>(
        &'a self,
        faction: FactionId,
        territory: &'a TerritoryGrid,
    ) -> impl Iterator<Item = &'a City> + 'a {
        self.cities
            .iter()
            .filter(move |c| territory.is_owned_by(c.coord, faction))
    }

    /// Supply effectiveness in [floor, 1] for a `faction` unit standing on `cell`
    ///
    /// Compute once per unit per tick; influence and attrition both reuse it.
    pub fn effectiveness(
        &self,
        faction: FactionId,
        cell: GridCoord,
        territory: &TerritoryGrid,
        config: &SupplyConfig,
    ) -> f64 {
        if territory.is_owned_by(cell, faction) {
            return 1.0;
        }

        let from_territory = nearest_owned_cell(faction, cell, territory, config.radius)
            .map(|d| eased_falloff(d, config.radius))
            .unwrap_or(0.0);

        let from_cities = self
            .cities_of(faction, territory)
            .map(|c| c.coord.distance(&cell))
            .filter(|d| *d <= config.city_radius)
            .map(|d| eased_falloff(d, config.city_radius))
            .fold(0.0, f64::max);

        from_territory.max(from_cities).max(config.floor).min(1.0)
    }
}

/// Euclidean distance to the closest cell owned by `faction` within `radius`
pub fn nearest_owned_cell(
    faction: FactionId,
    cell: GridCoord,
    territory: &TerritoryGrid,
    radius: f64,
) -> Option<f64> {
    let reach = radius.ceil() as i32;
    let mut nearest: Option<f64> = None;

    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let Some(neighbor) = cell.offset(dx, dy) else {
                continue;
            };
            if !territory.is_owned_by(neighbor, faction) {
                continue;
            }
            let distance = ((dx * dx + dy * dy) as f64).sqrt();
            if distance <= radius && nearest.map_or(true, |n| distance < n) {
                nearest = Some(distance);
            }
        }
    }
    nearest
}
