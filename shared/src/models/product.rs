//! Product Model

use crate::util::within_window;
use serde::{Deserialize, Serialize};

/// Product metadata the engines read
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Has variants; prices may come from the cheapest variant
    #[serde(default)]
    pub is_virtual: bool,
    /// Is a variant of a virtual product
    #[serde(default)]
    pub is_variant: bool,
    #[serde(default = "default_true")]
    pub taxable: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Sales discontinued from this instant on (Unix millis)
    #[serde(default)]
    pub sales_discontinuation_date: Option<i64>,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Active and not yet discontinued
    pub fn is_sellable_at(&self, as_of: i64) -> bool {
        self.is_active
            && self
                .sales_discontinuation_date
                .is_none_or(|discontinued| as_of < discontinued)
    }
}

/// Product category membership
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductCategoryMember {
    pub product_id: String,
    pub category_id: String,
    #[serde(default)]
    pub from_date: Option<i64>,
    #[serde(default)]
    pub thru_date: Option<i64>,
}

impl ProductCategoryMember {
    pub fn is_effective_at(&self, as_of: i64) -> bool {
        within_window(self.from_date, self.thru_date, as_of)
    }
}

/// Product feature application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductFeatureAppl {
    pub product_id: String,
    pub feature_id: String,
    #[serde(default)]
    pub from_date: Option<i64>,
    #[serde(default)]
    pub thru_date: Option<i64>,
}

impl ProductFeatureAppl {
    pub fn is_effective_at(&self, as_of: i64) -> bool {
        within_window(self.from_date, self.thru_date, as_of)
    }
}

/// Virtual product -> variant association
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantAssoc {
    pub virtual_id: String,
    pub variant_id: String,
    #[serde(default)]
    pub from_date: Option<i64>,
    #[serde(default)]
    pub thru_date: Option<i64>,
}

impl VariantAssoc {
    pub fn is_effective_at(&self, as_of: i64) -> bool {
        within_window(self.from_date, self.thru_date, as_of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sellable() {
        let mut product = Product {
            id: "P1".to_string(),
            name: "Widget".to_string(),
            is_virtual: false,
            is_variant: true,
            taxable: true,
            is_active: true,
            sales_discontinuation_date: Some(100),
        };
        assert!(product.is_sellable_at(99));
        assert!(!product.is_sellable_at(100));

        product.sales_discontinuation_date = None;
        product.is_active = false;
        assert!(!product.is_sellable_at(0));
    }

    #[test]
    fn test_defaults_on_deserialize() {
        let product: Product = serde_json::from_str(r#"{"id":"P1","name":"Widget"}"#).unwrap();
        assert!(product.taxable);
        assert!(product.is_active);
        assert!(!product.is_virtual);
    }
}
