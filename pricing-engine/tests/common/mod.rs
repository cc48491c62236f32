#![allow(dead_code)]

use pricing_engine::{EngineConfig, MemoryStore, PricingEngine, Snapshot, Sources, TaxEngine};
use rust_decimal::Decimal;
use shared::models::{
    ActionType, CondOperator, InputParam, PriceAction, PriceCondition, PriceRule, PriceType,
    Product, ProductPrice, ProductStore, STORE_GROUP_ANY, TaxAuthority, TaxRateRule,
};
use shared::util::parse_millis;
use std::sync::Arc;

// ========================================================================
// Time
// ========================================================================

pub fn as_of() -> i64 {
    parse_millis("2025-06-01T12:00:00Z").expect("valid timestamp")
}

// ========================================================================
// Catalog & prices
// ========================================================================

pub fn product(id: &str) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {}", id),
        is_virtual: false,
        is_variant: false,
        taxable: true,
        is_active: true,
        sales_discontinuation_date: None,
    }
}

pub fn price(product_id: &str, price_type: PriceType, amount: Decimal) -> ProductPrice {
    ProductPrice {
        product_id: product_id.to_string(),
        price_type,
        currency_id: "USD".to_string(),
        store_group_id: STORE_GROUP_ANY.to_string(),
        purpose_id: None,
        price: amount,
        from_date: 0,
        thru_date: None,
        tax_in_price: false,
        price_with_tax: None,
    }
}

pub fn vat_store(id: &str, authority: TaxAuthority) -> ProductStore {
    ProductStore {
        id: id.to_string(),
        name: Some(format!("Store {}", id)),
        show_prices_with_vat_tax: true,
        vat_tax_authority: Some(authority),
        pay_to_party_id: Some("ORG".to_string()),
        store_group_id: None,
    }
}

// ========================================================================
// Price rules
// ========================================================================

pub fn cond(input_param: InputParam, operator: CondOperator, value: &str) -> PriceCondition {
    PriceCondition {
        seq_id: "01".to_string(),
        input_param,
        operator,
        cond_value: value.to_string(),
    }
}

pub fn action(action_type: ActionType, amount: Option<Decimal>) -> PriceAction {
    PriceAction {
        seq_id: "01".to_string(),
        action_type,
        amount,
        rate_code: None,
    }
}

pub fn rule(id: &str, conditions: Vec<PriceCondition>, actions: Vec<PriceAction>) -> PriceRule {
    PriceRule {
        id: id.to_string(),
        name: format!("Rule {}", id),
        description: None,
        is_sale: false,
        from_date: None,
        thru_date: None,
        conditions,
        actions,
    }
}

/// Percent-of-list rule scoped to one product
pub fn product_rule(id: &str, product_id: &str, mut conditions: Vec<PriceCondition>, percent: Decimal) -> PriceRule {
    conditions.insert(0, cond(InputParam::ProductId, CondOperator::Eq, product_id));
    rule(id, conditions, vec![action(ActionType::PercentOfList, Some(percent))])
}

// ========================================================================
// Tax
// ========================================================================

pub fn ca() -> TaxAuthority {
    TaxAuthority::new("USA-CA", "CA_BOE")
}

pub fn uk() -> TaxAuthority {
    TaxAuthority::new("GBR", "HMRC")
}

pub fn tax_row(id: &str, authority: TaxAuthority, pct: Decimal) -> TaxRateRule {
    TaxRateRule {
        id: id.to_string(),
        authority,
        rate_type_id: "SALES_TAX".to_string(),
        product_store_id: None,
        product_category_id: None,
        min_item_price: None,
        min_purchase: None,
        tax_percentage: pct,
        tax_shipping: false,
        tax_promotions: false,
        from_date: None,
        thru_date: None,
        description: None,
    }
}

// ========================================================================
// Engines
// ========================================================================

pub fn sources(snapshot: Snapshot) -> Sources {
    let store = MemoryStore::new(snapshot).expect("valid snapshot");
    Sources::from_store(Arc::new(store))
}

pub fn pricing_engine(snapshot: Snapshot) -> PricingEngine {
    PricingEngine::new(sources(snapshot), EngineConfig::default())
}

pub fn tax_engine(snapshot: Snapshot) -> TaxEngine {
    TaxEngine::new(sources(snapshot), EngineConfig::default())
}
