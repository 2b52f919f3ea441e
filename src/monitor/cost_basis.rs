//! Average holding cost after adding a purchase

use serde::Serialize;

use crate::oracle::round_half_up;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Holding {
    /// Total grams held
    pub grams: f64,
    /// Weighted average price, CNY per gram
    pub avg_price: f64,
}

/// Merge an existing holding with a new purchase. A non-positive total
/// weight gives an empty holding.
pub fn average_cost(held_grams: f64, held_price: f64, new_grams: f64, new_price: f64) -> Holding {
    let grams = held_grams + new_grams;
    if grams <= 0.0 {
        return Holding::default();
    }
    let cost = held_grams * held_price + new_grams * new_price;
    Holding {
        grams: round_half_up(grams, 2),
        avg_price: round_half_up(cost / grams, 2),
    }
}
