use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const CRITICAL_BELOW: i64 = 20;
const MEDIUM_BELOW: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RestockSeverity {
    Critical,
    Medium,
    Low,
}

impl RestockSeverity {
    pub fn from_quantity(quantity: Decimal) -> Self {
        if quantity < Decimal::from(CRITICAL_BELOW) {
            RestockSeverity::Critical
        } else if quantity < Decimal::from(MEDIUM_BELOW) {
            RestockSeverity::Medium
        } else {
            RestockSeverity::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct InventoryItem {
    pub id: i32,
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub severity: RestockSeverity,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetInventoryResponse {
    pub items: Vec<InventoryItem>,
}

/// Amount of one inventory item consumed by one unit of a menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecipeIngredient {
    pub inventory_id: i32,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MenuCategory {
    Meal,
    Drink,
    Entree,
    Side,
    Appetizer,
}

impl MenuCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuCategory::Meal => "meal",
            MenuCategory::Drink => "drink",
            MenuCategory::Entree => "entree",
            MenuCategory::Side => "side",
            MenuCategory::Appetizer => "appetizer",
        }
    }
}

impl FromStr for MenuCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meal" => Ok(Self::Meal),
            "drink" => Ok(Self::Drink),
            "entree" => Ok(Self::Entree),
            "side" => Ok(Self::Side),
            "appetizer" => Ok(Self::Appetizer),
            s => Err(format!("Invalid menu category: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct MenuEntry {
    pub name: String,
    pub category: MenuCategory,
    pub price: Decimal,
    pub calories: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetMenuResponse {
    pub items: Vec<MenuEntry>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct MenuParams {
    pub category: Option<MenuCategory>,
}
