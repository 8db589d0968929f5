//! Read-time dish discounts.
//!
//! Discounts come from the same sheet as the catalog but are never stored:
//! each sync run swaps in a fresh map and dish payloads are rewritten on the
//! way out of the service.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::warn;
use uuid::Uuid;

use crate::application::sync::snapshot::{self, DISCOUNT_COLUMN, RowKind, Snapshot};
use crate::cache::lock::{rw_read, rw_write};
use crate::domain::entities::DishView;
use crate::domain::price::{apply_discount, parse_discount};

const SOURCE: &str = "application::discount";

#[derive(Debug, Default)]
pub struct DiscountOverlay {
    discounts: RwLock<Arc<HashMap<Uuid, u8>>>,
}

impl DiscountOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discounts(discounts: HashMap<Uuid, u8>) -> Self {
        Self {
            discounts: RwLock::new(Arc::new(discounts)),
        }
    }

    /// Collect `dish id -> percent` from every dish row carrying a discount.
    ///
    /// Works row by row without the parent cursor, so a dish the catalog sync
    /// rejects as an orphan still contributes its discount.
    pub fn scan(snapshot: &Snapshot) -> HashMap<Uuid, u8> {
        let mut discounts = HashMap::new();
        for row in snapshot.rows() {
            if snapshot::classify(row) != Some(RowKind::Dish) {
                continue;
            }
            let Some(id) = snapshot::dish_id(row) else {
                continue;
            };
            let Some(raw) = snapshot::cell(row, DISCOUNT_COLUMN) else {
                continue;
            };
            match parse_discount(raw) {
                Some(percent) => {
                    discounts.insert(id, percent);
                }
                None => {
                    warn!(
                        target = "tavola::discount",
                        dish_id = %id,
                        value = raw,
                        "Ignoring malformed discount cell"
                    );
                }
            }
        }
        discounts
    }

    /// Replace the whole map.
    pub fn replace(&self, discounts: HashMap<Uuid, u8>) {
        *rw_write(&self.discounts, SOURCE, "replace") = Arc::new(discounts);
    }

    #[cfg(test)]
    fn discount_for(&self, dish_id: Uuid) -> Option<u8> {
        rw_read(&self.discounts, SOURCE, "discount_for")
            .get(&dish_id)
            .copied()
    }

    /// Dishes currently discounted; reported after a one-shot sync.
    pub fn len(&self) -> usize {
        rw_read(&self.discounts, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn apply(&self, dish: DishView) -> DishView {
        let discounts = self.snapshot();
        render(&discounts, dish)
    }

    pub fn apply_all(&self, dishes: Vec<DishView>) -> Vec<DishView> {
        let discounts = self.snapshot();
        dishes
            .into_iter()
            .map(|dish| render(&discounts, dish))
            .collect()
    }

    fn snapshot(&self) -> Arc<HashMap<Uuid, u8>> {
        rw_read(&self.discounts, SOURCE, "snapshot").clone()
    }
}

fn render(discounts: &HashMap<Uuid, u8>, mut dish: DishView) -> DishView {
    let Some(&percent) = discounts.get(&dish.id) else {
        return dish;
    };
    match apply_discount(&dish.price, percent) {
        Some(price) => dish.price = price,
        None => {
            warn!(
                target = "tavola::discount",
                dish_id = %dish.id,
                price = %dish.price,
                "Stored price is not numeric; discount not applied"
            );
        }
    }
    dish
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dish(id: Uuid, price: &str) -> DishView {
        DishView {
            id,
            title: "Burger".into(),
            description: "desc".into(),
            price: price.into(),
        }
    }

    #[test]
    fn discounted_and_plain_dishes() {
        let (discounted, plain) = (Uuid::new_v4(), Uuid::new_v4());
        let overlay = DiscountOverlay::with_discounts(HashMap::from([(discounted, 10)]));

        let rendered = overlay.apply_all(vec![dish(discounted, "100"), dish(plain, "100")]);

        assert_eq!(rendered[0].price, "90.0");
        assert_eq!(rendered[1].price, "100");
    }

    #[test]
    fn non_numeric_price_is_left_alone() {
        let id = Uuid::new_v4();
        let overlay = DiscountOverlay::with_discounts(HashMap::from([(id, 10)]));
        assert_eq!(overlay.apply(dish(id, "market price")).price, "market price");
    }

    #[test]
    fn scan_reads_discount_column_of_dish_rows() {
        let (d1, d2, d3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let menu = Uuid::new_v4().to_string();
        let d1s = d1.to_string();
        let d2s = d2.to_string();
        let d3s = d3.to_string();
        let snapshot = Snapshot::from_text_rows(vec![
            vec![menu.as_str(), "Lunch", "desc", "", "", "", "50"],
            vec!["", "", d1s.as_str(), "Burger", "", "10.00", "20"],
            vec!["", "", d2s.as_str(), "Fries", "", "3", ""],
            vec!["", "", d3s.as_str(), "Soup", "", "4", "lots"],
        ]);

        let discounts = DiscountOverlay::scan(&snapshot);

        assert_eq!(discounts, HashMap::from([(d1, 20)]));
    }

    #[test]
    fn replace_swaps_the_whole_map() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let overlay = DiscountOverlay::with_discounts(HashMap::from([(a, 5)]));

        overlay.replace(HashMap::from([(b, 15)]));

        assert_eq!(overlay.discount_for(a), None);
        assert_eq!(overlay.discount_for(b), Some(15));
        assert_eq!(overlay.len(), 1);
    }
}
