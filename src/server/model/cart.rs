use derive_more::{Display, Error};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of entree slots on a meal.
pub(crate) const MEAL_ENTREE_SLOTS: usize = 3;

/// Checkout payload as posted by the kiosk or the cashier screen.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckoutRequest {
    pub order_list: Vec<CartEntry>,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckoutResponse {
    pub result: i64,
    pub success: bool,
}

/// One cart row, loosely typed the way clients send it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct CartEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub entrees: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MealSelection {
    pub entrees: [Option<String>; MEAL_ENTREE_SLOTS],
    pub side: String,
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DrinkSelection {
    pub name: String,
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AppetizerSelection {
    pub name: String,
}

/// The three line item variants a receipt can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub(crate) enum LineItemKind {
    Meal(MealSelection),
    Drink(DrinkSelection),
    Appetizer(AppetizerSelection),
}

impl LineItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            LineItemKind::Meal(_) => "Meal",
            LineItemKind::Drink(_) => "Drink",
            LineItemKind::Appetizer(_) => "Appetizer",
        }
    }

    /// Menu entries consumed by one unit of this item. Empty entree slots are skipped.
    pub fn menu_names(&self) -> Vec<&str> {
        match self {
            LineItemKind::Meal(meal) => meal
                .entrees
                .iter()
                .flatten()
                .map(String::as_str)
                .chain(std::iter::once(meal.side.as_str()))
                .collect(),
            LineItemKind::Drink(drink) => vec![drink.name.as_str()],
            LineItemKind::Appetizer(appetizer) => vec![appetizer.name.as_str()],
        }
    }
}

/// A validated cart entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OrderLine {
    pub kind: LineItemKind,
    pub price: Decimal,
    pub quantity: u32,
}

impl OrderLine {
    /// `None` when `price × quantity` does not fit a `Decimal`.
    pub fn subtotal(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Sum of every line's subtotal, `None` on overflow.
pub(crate) fn lines_total(lines: &[OrderLine]) -> Option<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| line.subtotal().and_then(|s| acc.checked_add(s)))
}

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub(crate) enum CartEntryError {
    #[display("unknown item type `{kind}`")]
    UnknownItemType { kind: String },
    #[display("{kind} entry is missing `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
    #[display("meal has {count} entrees, at most 3 allowed")]
    TooManyEntrees { count: usize },
    #[display("quantity must be positive, got {quantity}")]
    InvalidQuantity { quantity: i64 },
}

fn required(
    value: Option<String>,
    kind: &'static str,
    field: &'static str,
) -> Result<String, CartEntryError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CartEntryError::MissingField { kind, field }),
    }
}

impl TryFrom<CartEntry> for OrderLine {
    type Error = CartEntryError;

    fn try_from(entry: CartEntry) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(entry.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(CartEntryError::InvalidQuantity {
                quantity: entry.quantity,
            })?;

        let kind = match entry.kind.as_str() {
            "Meal" => {
                let mut picked: Vec<Option<String>> = entry
                    .entrees
                    .unwrap_or_default()
                    .into_iter()
                    .map(|name| name.filter(|n| !n.trim().is_empty()))
                    .collect();
                // clients pad the array with trailing nulls
                while matches!(picked.last(), Some(None)) {
                    picked.pop();
                }
                if picked.len() > MEAL_ENTREE_SLOTS {
                    return Err(CartEntryError::TooManyEntrees {
                        count: picked.len(),
                    });
                }
                let mut entrees: [Option<String>; MEAL_ENTREE_SLOTS] = Default::default();
                for (slot, name) in entrees.iter_mut().zip(picked) {
                    *slot = name;
                }
                LineItemKind::Meal(MealSelection {
                    entrees,
                    side: required(entry.side, "Meal", "side")?,
                    size: entry.size,
                })
            }
            "Drink" | "drink" => LineItemKind::Drink(DrinkSelection {
                name: required(entry.name, "Drink", "name")?,
                size: entry.size,
            }),
            "Appetizer" => LineItemKind::Appetizer(AppetizerSelection {
                name: required(entry.name, "Appetizer", "name")?,
            }),
            other => {
                return Err(CartEntryError::UnknownItemType {
                    kind: other.to_string(),
                })
            }
        };

        Ok(OrderLine {
            kind,
            price: entry.price,
            quantity,
        })
    }
}
