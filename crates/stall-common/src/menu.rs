//! The stall menu: flavors, add-ons and surcharge levels.
//!
//! The built-in [`Menu::default`] is the stall's real menu. A kiosk can
//! replace it from the `[menu]` table of its TOML config via [`MenuSpec`].

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::types::Money;

/// Number of component flavors the combo flavor requires.
pub const COMBO_COMPONENTS: usize = 3;

/// Errors building a menu from config.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MenuError {
    #[error("price out of range for {0}")]
    PriceOutOfRange(String),

    #[error("combo flavor {0:?} is not on the menu")]
    UnknownCombo(String),

    #[error("duplicate flavor {0:?}")]
    DuplicateFlavor(String),
}

/// Menu section a flavor or add-on belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Savory,
    Sweet,
    Combo,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Savory => "savory",
            Category::Sweet => "sweet",
            Category::Combo => "combo",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flavor on the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flavor {
    pub name: String,
    pub price: Money,
    pub category: Category,
    pub description: Option<String>,
}

/// An add-on that can be toggled onto a non-combo flavor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOn {
    pub name: String,
    pub category: Category,
}

/// The full menu plus its pricing rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    flavors: Vec<Flavor>,
    add_ons: Vec<AddOn>,
    combo: String,
    premium_add_on: String,
    premium_surcharge: Money,
    standard_surcharge: Money,
}

impl Menu {
    /// All flavors in menu order.
    pub fn flavors(&self) -> &[Flavor] {
        &self.flavors
    }

    /// Look up a flavor by name.
    pub fn flavor(&self, name: &str) -> Option<&Flavor> {
        self.flavors.iter().find(|f| f.name == name)
    }

    /// Base price of a flavor. Unknown flavors cost nothing.
    pub fn base_price(&self, name: &str) -> Money {
        self.flavor(name).map(|f| f.price).unwrap_or(Money::ZERO)
    }

    /// Surcharge for a single add-on.
    pub fn add_on_surcharge(&self, add_on: &str) -> Money {
        if add_on == self.premium_add_on {
            self.premium_surcharge
        } else {
            self.standard_surcharge
        }
    }

    /// Name of the combo flavor.
    pub fn combo(&self) -> &str {
        &self.combo
    }

    pub fn is_combo(&self, name: &str) -> bool {
        name == self.combo
    }

    /// Display description, if the menu has one.
    pub fn description(&self, name: &str) -> Option<&str> {
        self.flavor(name).and_then(|f| f.description.as_deref())
    }

    /// What may be toggled once `flavor` is selected.
    ///
    /// The combo chooses among the single (non-combo) flavors; every other
    /// flavor chooses among the add-ons of its own category.
    pub fn options_for(&self, flavor: &str) -> Vec<&str> {
        if self.is_combo(flavor) {
            return self
                .flavors
                .iter()
                .filter(|f| f.category != Category::Combo)
                .map(|f| f.name.as_str())
                .collect();
        }

        match self.flavor(flavor) {
            Some(f) => self
                .add_ons
                .iter()
                .filter(|a| a.category == f.category)
                .map(|a| a.name.as_str())
                .collect(),
            None => Vec::new(),
        }
    }
}

impl Default for Menu {
    fn default() -> Self {
        let flavor = |name: &str, cents: i64, category: Category, description: Option<&str>| Flavor {
            name: name.to_string(),
            price: Money::from_cents(cents),
            category,
            description: description.map(str::to_string),
        };
        let add_on = |name: &str, category: Category| AddOn {
            name: name.to_string(),
            category,
        };

        Self {
            flavors: vec![
                flavor(
                    "Jerry",
                    800,
                    Category::Savory,
                    Some("Esse piranho é o melhor crepe de queijo muçarela que já provei."),
                ),
                flavor(
                    "Tom E Jerry",
                    800,
                    Category::Savory,
                    Some("A duplinha que se acha, presunto e queijo?? Delicioso até demais."),
                ),
                flavor(
                    "João Frango",
                    1000,
                    Category::Savory,
                    Some("Vou nem falar desse porpeta, recheado demais com frango e requeijão cremoso."),
                ),
                flavor(
                    "Bridgadeiton",
                    800,
                    Category::Sweet,
                    Some("Quem ele pensa que é para ser tão bom assim, brigadeiro melhore."),
                ),
                flavor(
                    "The Nutella Academy",
                    1000,
                    Category::Sweet,
                    Some("Até parece que essa nutella merece a fama que tem, só porque é ridiculamente gostosa."),
                ),
                flavor("Jerry + Tom e Jerry + Bridgadeiton", 2000, Category::Combo, None),
                flavor("Jerry + João Frango + Bridgadeiton", 2200, Category::Combo, None),
                flavor(
                    "Especial",
                    2500,
                    Category::Combo,
                    Some("Aqui você é a estrela, monte seu mean trio perfeito escolhendo qualquer um dos recheios."),
                ),
            ],
            add_ons: vec![
                add_on("Calabresa", Category::Savory),
                add_on("Bacon", Category::Savory),
                add_on("Kit Kat", Category::Sweet),
                add_on("M&Ms", Category::Sweet),
                add_on("Cobertura de Chocolate", Category::Sweet),
            ],
            combo: "Especial".to_string(),
            premium_add_on: "M&Ms".to_string(),
            premium_surcharge: Money::from_cents(300),
            standard_surcharge: Money::from_cents(200),
        }
    }
}

/// TOML shape of a menu.
#[derive(Debug, Clone, Deserialize)]
pub struct MenuSpec {
    pub flavors: Vec<FlavorSpec>,
    #[serde(default)]
    pub add_ons: Vec<AddOnSpec>,
    pub combo: String,
    pub premium_add_on: String,
    pub premium_surcharge: Decimal,
    pub standard_surcharge: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlavorSpec {
    pub name: String,
    pub price: Decimal,
    pub category: Category,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddOnSpec {
    pub name: String,
    pub category: Category,
}

impl TryFrom<MenuSpec> for Menu {
    type Error = MenuError;

    fn try_from(spec: MenuSpec) -> Result<Self, Self::Error> {
        let mut flavors: Vec<Flavor> = Vec::with_capacity(spec.flavors.len());
        for f in spec.flavors {
            if flavors.iter().any(|existing| existing.name == f.name) {
                return Err(MenuError::DuplicateFlavor(f.name));
            }
            let price =
                Money::from_decimal(f.price).ok_or_else(|| MenuError::PriceOutOfRange(f.name.clone()))?;
            flavors.push(Flavor {
                name: f.name,
                price,
                category: f.category,
                description: f.description,
            });
        }

        if !flavors.iter().any(|f| f.name == spec.combo) {
            return Err(MenuError::UnknownCombo(spec.combo));
        }

        let premium_surcharge = Money::from_decimal(spec.premium_surcharge)
            .ok_or_else(|| MenuError::PriceOutOfRange(spec.premium_add_on.clone()))?;
        let standard_surcharge = Money::from_decimal(spec.standard_surcharge)
            .ok_or_else(|| MenuError::PriceOutOfRange("standard add-on".to_string()))?;

        Ok(Self {
            flavors,
            add_ons: spec
                .add_ons
                .into_iter()
                .map(|a| AddOn {
                    name: a.name,
                    category: a.category,
                })
                .collect(),
            combo: spec.combo,
            premium_add_on: spec.premium_add_on,
            premium_surcharge,
            standard_surcharge,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_menu_prices() {
        let menu = Menu::default();
        assert_eq!(menu.base_price("Jerry"), Money::from_cents(800));
        assert_eq!(menu.base_price("João Frango"), Money::from_cents(1000));
        assert_eq!(menu.base_price("Especial"), Money::from_cents(2500));
        assert_eq!(menu.base_price("Pizza"), Money::ZERO);
    }

    #[test]
    fn test_surcharges() {
        let menu = Menu::default();
        assert_eq!(menu.add_on_surcharge("M&Ms"), Money::from_cents(300));
        assert_eq!(menu.add_on_surcharge("Bacon"), Money::from_cents(200));
        assert_eq!(menu.add_on_surcharge("anything"), Money::from_cents(200));
    }

    #[test]
    fn test_options_for_combo_are_single_flavors() {
        let menu = Menu::default();
        let options = menu.options_for("Especial");
        assert_eq!(
            options,
            vec!["Jerry", "Tom E Jerry", "João Frango", "Bridgadeiton", "The Nutella Academy"]
        );
    }

    #[test]
    fn test_options_follow_category() {
        let menu = Menu::default();
        assert_eq!(menu.options_for("Jerry"), vec!["Calabresa", "Bacon"]);
        assert_eq!(
            menu.options_for("Bridgadeiton"),
            vec!["Kit Kat", "M&Ms", "Cobertura de Chocolate"]
        );
        assert!(menu.options_for("Jerry + João Frango + Bridgadeiton").is_empty());
        assert!(menu.options_for("Pizza").is_empty());
    }

    #[test]
    fn test_menu_from_spec() {
        let spec = MenuSpec {
            flavors: vec![
                FlavorSpec {
                    name: "Queijo".into(),
                    price: dec!(7.50),
                    category: Category::Savory,
                    description: None,
                },
                FlavorSpec {
                    name: "Trio".into(),
                    price: dec!(21),
                    category: Category::Combo,
                    description: Some("três".into()),
                },
            ],
            add_ons: vec![AddOnSpec {
                name: "Oregano".into(),
                category: Category::Savory,
            }],
            combo: "Trio".into(),
            premium_add_on: "Oregano".into(),
            premium_surcharge: dec!(1.25),
            standard_surcharge: dec!(1),
        };

        let menu = Menu::try_from(spec).unwrap();
        assert_eq!(menu.base_price("Queijo"), Money::from_cents(750));
        assert_eq!(menu.add_on_surcharge("Oregano"), Money::from_cents(125));
        assert!(menu.is_combo("Trio"));
        assert_eq!(menu.description("Trio"), Some("três"));
    }

    #[test]
    fn test_menu_spec_rejects_unknown_combo() {
        let spec = MenuSpec {
            flavors: vec![],
            add_ons: vec![],
            combo: "Especial".into(),
            premium_add_on: "M&Ms".into(),
            premium_surcharge: dec!(3),
            standard_surcharge: dec!(2),
        };
        assert_eq!(
            Menu::try_from(spec),
            Err(MenuError::UnknownCombo("Especial".into()))
        );
    }

    #[test]
    fn test_menu_spec_rejects_price_out_of_range() {
        let spec = MenuSpec {
            flavors: vec![FlavorSpec {
                name: "Especial".into(),
                price: Decimal::MAX,
                category: Category::Combo,
                description: None,
            }],
            add_ons: vec![],
            combo: "Especial".into(),
            premium_add_on: "M&Ms".into(),
            premium_surcharge: dec!(3),
            standard_surcharge: dec!(2),
        };
        assert_eq!(
            Menu::try_from(spec),
            Err(MenuError::PriceOutOfRange("Especial".into()))
        );
    }
}
