//! The menu: dish prices and cook-time ranges, fixed for a whole run.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

use crate::error::CatalogError;

/// One menu entry with its price and virtual cook-time range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dish {
    /// Menu name, also the key dishes are looked up by.
    pub name: String,
    /// Price charged per portion.
    pub price: u64,
    /// Cook time bounds in virtual time, inclusive.
    pub min_cook: Duration,
    /// Longest virtual cook time, inclusive.
    pub max_cook: Duration,
}

impl Dish {
    /// Construct a dish; ranges are checked by [`Catalog::new`].
    pub fn new(name: impl Into<String>, price: u64, min_cook: Duration, max_cook: Duration) -> Self {
        Self {
            name: name.into(),
            price,
            min_cook,
            max_cook,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    dish: Vec<DishEntry>,
}

#[derive(Debug, Deserialize)]
struct DishEntry {
    name: String,
    price: u64,
    min_cook_secs: u64,
    max_cook_secs: u64,
}

/// Read-only dish table shared by the generator, waiters, and chefs.
#[derive(Clone, Debug)]
pub struct Catalog {
    dishes: Vec<Dish>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    /// Validate and index a list of dishes.
    pub fn new(dishes: Vec<Dish>) -> Result<Self, CatalogError> {
        if dishes.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut by_name = HashMap::with_capacity(dishes.len());
        for (index, dish) in dishes.iter().enumerate() {
            if dish.min_cook > dish.max_cook {
                return Err(CatalogError::InvertedCookTime {
                    name: dish.name.clone(),
                    min: dish.min_cook,
                    max: dish.max_cook,
                });
            }
            if by_name.insert(dish.name.clone(), index).is_some() {
                return Err(CatalogError::Duplicate(dish.name.clone()));
            }
        }
        Ok(Self { dishes, by_name })
    }

    /// The house menu.
    pub fn standard() -> Self {
        let minutes = |m: u64| Duration::from_secs(m * 60);
        let dishes = vec![
            Dish::new("Soup", 100, minutes(3), minutes(5)),
            Dish::new("Steak", 250, minutes(10), minutes(15)),
            Dish::new("Pasta", 150, minutes(6), minutes(9)),
            Dish::new("Salad", 80, minutes(3), minutes(5)),
            Dish::new("Dessert", 90, minutes(4), minutes(6)),
        ];
        let by_name = dishes
            .iter()
            .enumerate()
            .map(|(index, dish)| (dish.name.clone(), index))
            .collect();
        Self { dishes, by_name }
    }

    /// Parse a TOML menu made of `[[dish]]` tables.
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text)?;
        let dishes = file
            .dish
            .into_iter()
            .map(|entry| {
                Dish::new(
                    entry.name,
                    entry.price,
                    Duration::from_secs(entry.min_cook_secs),
                    Duration::from_secs(entry.max_cook_secs),
                )
            })
            .collect();
        Self::new(dishes)
    }

    /// Read and validate a TOML menu file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Look up a dish by name.
    pub fn get(&self, name: &str) -> Result<&Dish, CatalogError> {
        self.by_name
            .get(name)
            .map(|&index| &self.dishes[index])
            .ok_or_else(|| CatalogError::UnknownDish(name.to_string()))
    }

    /// Price of one portion of `name`.
    pub fn price(&self, name: &str) -> Result<u64, CatalogError> {
        self.get(name).map(|dish| dish.price)
    }

    /// Sum of prices for an order's dish list.
    pub fn order_total(&self, dishes: &[String]) -> Result<u64, CatalogError> {
        dishes.iter().map(|name| self.price(name)).sum()
    }

    /// Pick a dish uniformly at random.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> &Dish {
        // Construction guarantees at least one dish.
        &self.dishes[rng.gen_range(0..self.dishes.len())]
    }

    /// Draw a virtual cook time uniformly from the dish's range.
    pub fn sample_cook_time<R: Rng>(
        &self,
        name: &str,
        rng: &mut R,
    ) -> Result<Duration, CatalogError> {
        let dish = self.get(name)?;
        let min = dish.min_cook.as_millis() as u64;
        let max = dish.max_cook.as_millis() as u64;
        Ok(Duration::from_millis(rng.gen_range(min..=max)))
    }

    /// Number of dishes on the menu (never zero).
    pub fn dish_count(&self) -> usize {
        self.dishes.len()
    }
}
