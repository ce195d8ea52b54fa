use super::domain::{Gift, GiftId, Money};

/// Purchasable gifts, cheapest first.
#[derive(Debug, Clone)]
pub struct GiftCatalog {
    gifts: Vec<Gift>,
}

impl GiftCatalog {
    pub fn new(mut gifts: Vec<Gift>) -> Self {
        gifts.sort_by(|a, b| a.cost.cmp(&b.cost).then_with(|| a.id.0.cmp(&b.id.0)));
        Self { gifts }
    }

    pub fn standard() -> Self {
        let gift = |id: &str, name: &str, cost: u64, rating: i64, icon: &str| Gift {
            id: GiftId(id.to_string()),
            name: name.to_string(),
            cost: Money::from_minor(cost),
            rating,
            icon: icon.to_string(),
        };

        Self::new(vec![
            gift("gift-1", "Bouquet", 499, 5, "💐"),
            gift("gift-5", "Heart", 899, 10, "❤️"),
            gift("gift-4", "Rocket", 2299, 25, "🚀"),
            gift("gift-2", "Diamond", 4299, 50, "💎"),
            gift("gift-3", "Golden Crown", 8999, 100, "👑"),
            gift("gift-6", "Supernova", 12999, 200, "🌟"),
            gift("gift-7", "Galaxy", 19999, 500, "🌌"),
        ])
    }

    pub fn get(&self, id: &GiftId) -> Option<&Gift> {
        self.gifts.iter().find(|gift| &gift.id == id)
    }

    pub fn gifts(&self) -> &[Gift] {
        &self.gifts
    }
}

impl Default for GiftCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
