use serde::{Deserialize, Serialize};

/// Lookup failure for a category name that is not part of the tournament.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

/// A tournament division with its own entry cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub capacity: u32,
    pub requires_partner: bool,
}

/// Fixed table of divisions, loaded once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// The division table this tournament runs with. Doubles and Mixed
    /// divisions enter as pairs and therefore need a partner name.
    pub fn standard() -> Self {
        let table: [(&str, u32, bool); 10] = [
            ("Gentlemen's Amateur", 24, false),
            ("Gentlemen's Challenger", 12, false),
            ("Gentlemen's Master", 12, false),
            ("Ladies Amateur", 12, false),
            ("Ladies Challenger", 12, false),
            ("Ladies Master", 12, false),
            ("Mixed Amateur", 12, true),
            ("Mixed Master", 12, true),
            ("Gentlemen's Doubles", 12, true),
            ("Ladies' Doubles", 12, true),
        ];

        Self::new(
            table
                .into_iter()
                .map(|(name, capacity, requires_partner)| Category {
                    name: name.to_string(),
                    capacity,
                    requires_partner,
                })
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Result<&Category, UnknownCategory> {
        let wanted = name.trim();
        self.categories
            .iter()
            .find(|category| category.name == wanted)
            .ok_or_else(|| UnknownCategory(wanted.to_string()))
    }

    pub fn capacity_of(&self, name: &str) -> Result<u32, UnknownCategory> {
        self.get(name).map(|category| category.capacity)
    }

    pub fn requires_partner(&self, name: &str) -> Result<bool, UnknownCategory> {
        self.get(name).map(|category| category.requires_partner)
    }

    pub fn is_valid(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|category| category.name.as_str())
    }
}
