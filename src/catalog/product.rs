//! Product model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog product as held by the system-of-record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    pub description: Option<String>,
}

/// Fields for creating a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    pub description: Option<String>,
}

impl NewProduct {
    /// Materialize into a product with a fresh id
    pub fn into_product(self) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: self.name,
            price: self.price,
            quantity: self.quantity,
            description: self.description,
        }
    }
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<u32>,
    pub description: Option<String>,
}

impl ProductPatch {
    /// Apply this patch to a product
    pub fn apply(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_applies_only_set_fields() {
        let mut product = NewProduct {
            name: "widget".to_string(),
            price: 9.99,
            quantity: 5,
            description: None,
        }
        .into_product();

        let patch = ProductPatch {
            price: Some(12.50),
            ..Default::default()
        };
        patch.apply(&mut product);

        assert_eq!(product.name, "widget");
        assert_eq!(product.price, 12.50);
        assert_eq!(product.quantity, 5);
    }
}
