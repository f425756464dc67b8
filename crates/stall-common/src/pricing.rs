//! Order pricing.
//!
//! A line costs its flavor's base price plus one surcharge per add-on. The
//! combo flavor is a fixed-price bundle: its "ingredients" are component
//! flavors and never add a surcharge.

use crate::menu::Menu;
use crate::types::{LineItem, Money};

/// Price of a single line.
pub fn line_total(menu: &Menu, item: &LineItem) -> Money {
    let base = menu.base_price(&item.flavor);

    if menu.is_combo(&item.flavor) {
        return base;
    }

    base + item
        .ingredients
        .iter()
        .map(|ingredient| menu.add_on_surcharge(ingredient))
        .sum::<Money>()
}

/// Total of an order, recomputed from its lines.
pub fn compute_total<'a, I>(menu: &Menu, items: I) -> Money
where
    I: IntoIterator<Item = &'a LineItem>,
{
    items.into_iter().map(|item| line_total(menu, item)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(flavor: &str, ingredients: &[&str]) -> LineItem {
        LineItem::new(flavor, ingredients.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_empty_order_is_zero() {
        let menu = Menu::default();
        assert_eq!(compute_total(&menu, &[] as &[LineItem]), Money::ZERO);
    }

    #[test]
    fn test_jerry_plus_jerry_with_mms() {
        let menu = Menu::default();
        let items = vec![item("Jerry", &[]), item("Jerry", &["M&Ms"])];
        // 8.00 + 8.00 + 3.00
        assert_eq!(compute_total(&menu, &items), Money::from_cents(1900));
        assert_eq!(compute_total(&menu, &items).to_string(), "19.00");
    }

    #[test]
    fn test_standard_add_ons() {
        let menu = Menu::default();
        let line = item("Bridgadeiton", &["Kit Kat", "Cobertura de Chocolate", "M&Ms"]);
        // 8.00 + 2.00 + 2.00 + 3.00
        assert_eq!(line_total(&menu, &line), Money::from_cents(1500));
    }

    #[test]
    fn test_combo_ignores_surcharge() {
        let menu = Menu::default();
        let combo = item("Especial", &["Jerry", "M&Ms", "Bacon"]);
        assert_eq!(line_total(&menu, &combo), Money::from_cents(2500));
    }

    #[test]
    fn test_fixed_bundles_still_take_add_ons() {
        let menu = Menu::default();
        let bundle = item("Jerry + João Frango + Bridgadeiton", &["Bacon"]);
        assert_eq!(line_total(&menu, &bundle), Money::from_cents(2400));
    }

    #[test]
    fn test_unknown_flavor_prices_at_zero_plus_add_ons() {
        let menu = Menu::default();
        assert_eq!(line_total(&menu, &item("Pizza", &[])), Money::ZERO);
        assert_eq!(line_total(&menu, &item("Pizza", &["Bacon"])), Money::from_cents(200));
    }

    #[test]
    fn test_many_lines_do_not_drift() {
        let menu = Menu::default();
        let items: Vec<LineItem> = (0..1000).map(|_| item("Jerry", &["Bacon"])).collect();
        assert_eq!(compute_total(&menu, &items), Money::from_cents(1_000_000));
    }
}
