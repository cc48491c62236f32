mod common;

use common::*;
use async_trait::async_trait;
use pricing_engine::source::{
    CurrencyConverter, ExchangeRate, MemoryStore, SourceError, SourceResult, TaxRateQuery, TaxSource,
};
use pricing_engine::{EngineConfig, EngineError, PriceRequest, PricingEngine, Snapshot, Sources};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::models::{
    ActionType, AgreementPrice, CondOperator, InputParam, PartyRelationship, PartyTaxExemption,
    PriceType, TaxAuthority, TaxRateRule, VariantAssoc,
};
use shared::order::{FlatOverrideSource, PriceNote};
use std::collections::BTreeSet;
use std::sync::Arc;

fn list_only(list: Decimal) -> Snapshot {
    Snapshot {
        products: vec![product("P1")],
        prices: vec![price("P1", PriceType::ListPrice, list)],
        ..Default::default()
    }
}

// ========================================================================
// Core rule evaluation
// ========================================================================

#[tokio::test]
async fn test_quantity_discount_applies() {
    let mut snapshot = list_only(dec!(100));
    snapshot.price_rules = vec![product_rule(
        "Q10",
        "P1",
        vec![cond(InputParam::Quantity, CondOperator::Gte, "10")],
        dec!(-10),
    )];
    let engine = pricing_engine(snapshot);

    let result = engine
        .calculate_price(&PriceRequest::new("P1").quantity(dec!(10)).at(as_of()))
        .await
        .unwrap();

    assert_eq!(result.price, dec!(90.00));
    assert!(result.valid_price_found);
    assert_eq!(result.applied_rules.len(), 1);
    assert_eq!(result.applied_rules[0].rule_id, "Q10");
    assert_eq!(result.applied_rules[0].modify_amount, dec!(-10));
    assert_eq!(result.base_price, dec!(100));
}

#[tokio::test]
async fn test_minimum_clamps_default_without_list() {
    let engine = pricing_engine(Snapshot {
        products: vec![product("P1")],
        prices: vec![
            price("P1", PriceType::DefaultPrice, dec!(50)),
            price("P1", PriceType::MinimumPrice, dec!(60)),
        ],
        ..Default::default()
    });

    let result = engine.calculate_price(&PriceRequest::new("P1").at(as_of())).await.unwrap();

    assert_eq!(result.price, dec!(60.00));
    assert!(result.valid_price_found);
    assert!(result.applied_rules.is_empty());
}

#[tokio::test]
async fn test_failing_condition_contributes_nothing() {
    let mut snapshot = list_only(dec!(100));
    snapshot.price_rules = vec![product_rule(
        "EUR_ONLY",
        "P1",
        vec![cond(InputParam::Currency, CondOperator::Eq, "EUR")],
        dec!(-50),
    )];
    let engine = pricing_engine(snapshot);

    let result = engine.calculate_price(&PriceRequest::new("P1").at(as_of())).await.unwrap();

    assert_eq!(result.price, dec!(100));
    assert!(!result.valid_price_found);
    assert!(result.applied_rules.is_empty());
}

#[tokio::test]
async fn test_flat_override_stops_later_rules() {
    let mut snapshot = list_only(dec!(100));
    snapshot.price_rules = vec![
        rule("FLAT", vec![], vec![action(ActionType::FlatOverride, Some(dec!(70)))]),
        product_rule("HALF", "P1", vec![], dec!(-50)),
    ];
    let engine = pricing_engine(snapshot);

    let result = engine.calculate_price(&PriceRequest::new("P1").at(as_of())).await.unwrap();

    assert_eq!(result.price, dec!(70));
    assert_eq!(result.applied_rules.len(), 1);
    assert_eq!(result.applied_rules[0].rule_id, "FLAT");
}

#[tokio::test]
async fn test_zero_flat_falls_back_to_default_and_clears_sale() {
    let mut snapshot = list_only(dec!(100));
    snapshot.prices.push(price("P1", PriceType::DefaultPrice, dec!(95)));
    let mut sale = rule("SALE", vec![], vec![action(ActionType::FlatOverride, Some(dec!(0)))]);
    sale.is_sale = true;
    snapshot.price_rules = vec![sale];
    let engine = pricing_engine(snapshot);

    let result = engine.calculate_price(&PriceRequest::new("P1").at(as_of())).await.unwrap();

    assert_eq!(result.price, dec!(95));
    assert!(!result.is_sale);
    assert!(!result.is_exact());
    assert!(result.notes.contains(&PriceNote::FlatOverrideFallback {
        rule_id: "SALE".to_string(),
        source: FlatOverrideSource::DefaultPrice,
    }));
}

#[tokio::test]
async fn test_price_stays_within_bounds() {
    let mut snapshot = list_only(dec!(100));
    snapshot.prices.push(price("P1", PriceType::MinimumPrice, dec!(30)));
    snapshot.prices.push(price("P1", PriceType::MaximumPrice, dec!(150)));
    snapshot.price_rules = vec![
        product_rule("DEEP", "P1", vec![cond(InputParam::Quantity, CondOperator::Gte, "100")], dec!(-80)),
        product_rule("MARKUP", "P1", vec![cond(InputParam::Quantity, CondOperator::Lt, "2")], dec!(90)),
    ];
    let engine = pricing_engine(snapshot);

    for quantity in [dec!(1), dec!(5), dec!(100)] {
        let result = engine
            .calculate_price(&PriceRequest::new("P1").quantity(quantity).at(as_of()))
            .await
            .unwrap();
        assert!(result.price >= dec!(30), "below minimum at {quantity}");
        assert!(result.price <= dec!(150), "above maximum at {quantity}");
    }

    let deep = engine
        .calculate_price(&PriceRequest::new("P1").quantity(dec!(100)).at(as_of()))
        .await
        .unwrap();
    assert_eq!(deep.price, dec!(30));
}

#[tokio::test]
async fn test_repeated_calls_are_identical() {
    let mut snapshot = list_only(dec!(100));
    snapshot.price_rules = vec![
        product_rule("A", "P1", vec![], dec!(-3)),
        product_rule("B", "P1", vec![cond(InputParam::Quantity, CondOperator::Gte, "2")], dec!(-7)),
    ];
    let engine = pricing_engine(snapshot);
    let request = PriceRequest::new("P1").quantity(dec!(3)).at(as_of()).with_quantity_breaks();

    let first = engine.calculate_price(&request).await.unwrap();
    for _ in 0..5 {
        assert_eq!(engine.calculate_price(&request).await.unwrap(), first);
    }
}

// ========================================================================
// Quantity breaks
// ========================================================================

#[tokio::test]
async fn test_quantity_breaks_listed_with_unit_price() {
    let mut snapshot = list_only(dec!(100));
    snapshot.price_rules = vec![
        rule(
            "Q10",
            vec![cond(InputParam::Quantity, CondOperator::Gte, "10")],
            vec![action(ActionType::PercentOfList, Some(dec!(-10)))],
        ),
        rule(
            "Q50",
            vec![cond(InputParam::Quantity, CondOperator::Gte, "50")],
            vec![action(ActionType::PercentOfList, Some(dec!(-25)))],
        ),
    ];
    let engine = pricing_engine(snapshot);

    let result = engine
        .calculate_price(&PriceRequest::new("P1").quantity(dec!(60)).at(as_of()).with_quantity_breaks())
        .await
        .unwrap();

    // 主价格按数量 1 计算
    assert_eq!(result.price, dec!(100));
    assert_eq!(result.quantity_breaks.len(), 2);
    assert_eq!(result.quantity_breaks[0].rule_id, "Q10");
    assert_eq!(result.quantity_breaks[0].price, dec!(90));
    assert_eq!(result.quantity_breaks[1].rule_id, "Q50");
    assert_eq!(result.quantity_breaks[1].price, dec!(75));
}

// ========================================================================
// Base price fallbacks
// ========================================================================

#[tokio::test]
async fn test_variant_takes_missing_prices_from_virtual() {
    let mut parent = product("TSHIRT");
    parent.is_virtual = true;
    let mut variant = product("TSHIRT-M");
    variant.is_variant = true;

    let engine = pricing_engine(Snapshot {
        products: vec![parent, variant],
        variant_assocs: vec![VariantAssoc {
            virtual_id: "TSHIRT".to_string(),
            variant_id: "TSHIRT-M".to_string(),
            from_date: None,
            thru_date: None,
        }],
        prices: vec![
            price("TSHIRT-M", PriceType::ListPrice, dec!(25)),
            price("TSHIRT", PriceType::ListPrice, dec!(30)),
            price("TSHIRT", PriceType::DefaultPrice, dec!(20)),
        ],
        ..Default::default()
    });

    let result = engine.calculate_price(&PriceRequest::new("TSHIRT-M").at(as_of())).await.unwrap();

    assert_eq!(result.list_price, Some(dec!(25)));
    assert_eq!(result.default_price, Some(dec!(20)));
    assert_eq!(result.price, dec!(20));
    assert_eq!(
        result.notes,
        vec![PriceNote::VirtualFallback {
            virtual_id: "TSHIRT".to_string(),
            price_type: PriceType::DefaultPrice,
        }]
    );
}

#[tokio::test]
async fn test_virtual_uses_cheapest_sellable_variant() {
    let mut parent = product("MUG");
    parent.is_virtual = true;
    let variants = ["MUG-RED", "MUG-BLUE", "MUG-OLD"].map(|id| {
        let mut v = product(id);
        v.is_variant = true;
        v
    });
    let mut products = vec![parent];
    products.extend(variants);
    products[3].is_active = false;

    let engine = pricing_engine(Snapshot {
        variant_assocs: ["MUG-RED", "MUG-BLUE", "MUG-OLD"]
            .into_iter()
            .map(|id| VariantAssoc {
                virtual_id: "MUG".to_string(),
                variant_id: id.to_string(),
                from_date: None,
                thru_date: None,
            })
            .collect(),
        products,
        prices: vec![
            price("MUG-RED", PriceType::ListPrice, dec!(14)),
            price("MUG-RED", PriceType::DefaultPrice, dec!(12)),
            price("MUG-BLUE", PriceType::ListPrice, dec!(13)),
            price("MUG-BLUE", PriceType::DefaultPrice, dec!(11)),
            price("MUG-OLD", PriceType::ListPrice, dec!(5)),
            price("MUG-OLD", PriceType::DefaultPrice, dec!(4)),
        ],
        ..Default::default()
    });

    let result = engine.calculate_price(&PriceRequest::new("MUG").at(as_of())).await.unwrap();

    assert_eq!(result.price, dec!(11));
    assert_eq!(result.list_price, Some(dec!(13)));
    assert_eq!(
        result.notes,
        vec![PriceNote::CheapestVariant {
            variant_id: "MUG-BLUE".to_string()
        }]
    );
}

#[tokio::test]
async fn test_agreement_price_replaces_default() {
    let mut snapshot = list_only(dec!(60));
    snapshot.prices.push(price("P1", PriceType::DefaultPrice, dec!(50)));
    snapshot.agreement_prices = vec![AgreementPrice {
        agreement_id: "AGR-1".to_string(),
        product_id: "P1".to_string(),
        currency_id: "USD".to_string(),
        price: dec!(45),
        from_date: None,
        thru_date: None,
    }];
    let engine = pricing_engine(snapshot);

    let result = engine
        .calculate_price(&PriceRequest::new("P1").agreement("AGR-1").at(as_of()))
        .await
        .unwrap();

    assert_eq!(result.price, dec!(45));
    assert!(result.is_exact());
}

#[tokio::test]
async fn test_store_group_falls_back_to_catch_all_records() {
    let engine = pricing_engine(list_only(dec!(100)));

    let result = engine
        .calculate_price(&PriceRequest::new("P1").store_group("OUTLET").at(as_of()))
        .await
        .unwrap();

    assert_eq!(result.price, dec!(100));
}

// ========================================================================
// Parties
// ========================================================================

#[tokio::test]
async fn test_transitive_group_member_discount() {
    let mut snapshot = list_only(dec!(100));
    snapshot.party_relationships = vec![
        PartyRelationship {
            group_id: "VIP".to_string(),
            member_id: "GOLD".to_string(),
            from_date: None,
            thru_date: None,
        },
        PartyRelationship {
            group_id: "GOLD".to_string(),
            member_id: "C1".to_string(),
            from_date: None,
            thru_date: None,
        },
    ];
    snapshot.price_rules = vec![rule(
        "VIP",
        vec![cond(InputParam::PartyGroupMember, CondOperator::Eq, "VIP")],
        vec![action(ActionType::PercentOfList, Some(dec!(-20)))],
    )];
    let engine = pricing_engine(snapshot);

    let member = engine
        .calculate_price(&PriceRequest::new("P1").party("C1").at(as_of()))
        .await
        .unwrap();
    let stranger = engine
        .calculate_price(&PriceRequest::new("P1").party("C2").at(as_of()))
        .await
        .unwrap();

    assert_eq!(member.price, dec!(80));
    assert_eq!(stranger.price, dec!(100));
}

// ========================================================================
// Failures
// ========================================================================

#[tokio::test]
async fn test_missing_prices_is_typed_failure() {
    let engine = pricing_engine(Snapshot {
        products: vec![product("P1")],
        ..Default::default()
    });

    let err = engine.calculate_price(&PriceRequest::new("P1").at(as_of())).await.unwrap_err();
    assert!(matches!(err, EngineError::PriceNotFound { ref product_id, .. } if product_id == "P1"));

    let err = engine.calculate_price(&PriceRequest::new("NOPE").at(as_of())).await.unwrap_err();
    assert!(matches!(err, EngineError::ProductNotFound(ref id) if id == "NOPE"));
}

// ========================================================================
// VAT display
// ========================================================================

#[tokio::test]
async fn test_vat_inclusive_display() {
    let mut snapshot = list_only(dec!(100));
    snapshot.prices.push(price("P1", PriceType::PromoPrice, dec!(80)));
    snapshot.product_stores = vec![vat_store("UK_WEB", uk())];
    snapshot.tax_rate_rules = vec![tax_row("UK_VAT", uk(), dec!(20))];
    let engine = pricing_engine(snapshot);

    let result = engine
        .calculate_price(&PriceRequest::new("P1").store("UK_WEB").including_vat().at(as_of()))
        .await
        .unwrap();

    assert_eq!(result.price, dec!(120.00));
    assert_eq!(result.price_with_tax, Some(dec!(120.00)));
    assert_eq!(result.tax_percentage, Some(dec!(20)));
    assert_eq!(result.list_price, Some(dec!(120.00)));
    assert_eq!(result.promo_price, Some(dec!(96.00)));
    assert!(result.notes.contains(&PriceNote::VatIncluded {
        tax_percentage: dec!(20)
    }));
}

#[tokio::test]
async fn test_vat_display_requires_authority() {
    let mut snapshot = list_only(dec!(100));
    let mut store = vat_store("UK_WEB", uk());
    store.vat_tax_authority = None;
    snapshot.product_stores = vec![store];
    let engine = pricing_engine(snapshot);

    let err = engine
        .calculate_price(&PriceRequest::new("P1").store("UK_WEB").including_vat().at(as_of()))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::MissingVatAuthority(ref id) if id == "UK_WEB"));
}

/// Tax store whose rate lookup is down
struct RatesDown(MemoryStore);

#[async_trait]
impl TaxSource for RatesDown {
    async fn tax_rate_rules(&self, _query: &TaxRateQuery) -> SourceResult<Vec<TaxRateRule>> {
        Err(SourceError::Unavailable("tax db down".to_string()))
    }

    async fn exemption(
        &self,
        party_ids: &BTreeSet<String>,
        authority: &TaxAuthority,
        as_of: i64,
    ) -> SourceResult<Option<PartyTaxExemption>> {
        self.0.exemption(party_ids, authority, as_of).await
    }

    async fn parent_authority(&self, authority: &TaxAuthority, as_of: i64) -> SourceResult<Option<TaxAuthority>> {
        self.0.parent_authority(authority, as_of).await
    }

    async fn gl_account_override(
        &self,
        authority: &TaxAuthority,
        organization_party_id: &str,
    ) -> SourceResult<Option<String>> {
        self.0.gl_account_override(authority, organization_party_id).await
    }

    async fn authorities_for_geos(&self, geo_ids: &BTreeSet<String>) -> SourceResult<Vec<TaxAuthority>> {
        self.0.authorities_for_geos(geo_ids).await
    }

    async fn geo_parents(&self, geo_id: &str) -> SourceResult<Vec<String>> {
        self.0.geo_parents(geo_id).await
    }
}

#[tokio::test]
async fn test_vat_lookup_failure_publishes_price_without_vat() {
    let mut snapshot = list_only(dec!(100));
    snapshot.product_stores = vec![vat_store("UK_WEB", uk())];
    snapshot.tax_rate_rules = vec![tax_row("UK_VAT", uk(), dec!(20))];
    let mut sources = common::sources(snapshot.clone());
    sources.tax = Arc::new(RatesDown(MemoryStore::new(snapshot).unwrap()));
    let engine = PricingEngine::new(sources, EngineConfig::default());

    let result = engine
        .calculate_price(&PriceRequest::new("P1").store("UK_WEB").including_vat().at(as_of()))
        .await
        .unwrap();

    assert_eq!(result.price, dec!(100));
    assert_eq!(result.list_price, Some(dec!(100)));
    assert!(result.price_with_tax.is_none());
    assert!(result.tax_percentage.is_none());
    assert_eq!(
        result.notes,
        vec![PriceNote::VatUnavailable {
            product_store_id: "UK_WEB".to_string()
        }]
    );
    assert!(!result.is_exact());
}

// ========================================================================
// Currency conversion
// ========================================================================

fn with_rate(mut snapshot: Snapshot) -> Snapshot {
    snapshot.exchange_rates = vec![ExchangeRate {
        from_currency: "USD".to_string(),
        to_currency: "EUR".to_string(),
        rate: dec!(0.9),
        from_date: None,
        thru_date: None,
    }];
    snapshot
}

#[tokio::test]
async fn test_converts_every_price_field() {
    let engine = pricing_engine(with_rate(list_only(dec!(100))));

    let result = engine
        .calculate_price(&PriceRequest::new("P1").convert_to("EUR").at(as_of()))
        .await
        .unwrap();

    assert_eq!(result.currency_id, "EUR");
    assert_eq!(result.price, dec!(90.00));
    assert_eq!(result.list_price, Some(dec!(90.00)));
    assert!(result.is_exact());
}

#[tokio::test]
async fn test_failed_conversion_keeps_original_values() {
    let engine = pricing_engine(with_rate(list_only(dec!(100))));

    let result = engine
        .calculate_price(&PriceRequest::new("P1").convert_to("JPY").at(as_of()))
        .await
        .unwrap();

    assert_eq!(result.currency_id, "USD");
    assert_eq!(result.price, dec!(100));
    assert!(result.notes.contains(&PriceNote::ConversionFailed {
        field: "price".to_string(),
        currency_id: "JPY".to_string(),
    }));
}

#[tokio::test]
async fn test_no_converter_configured() {
    let sources: Sources = common::sources(with_rate(list_only(dec!(100)))).with_converter(None);
    let engine = PricingEngine::new(sources, EngineConfig::default());

    let result = engine
        .calculate_price(&PriceRequest::new("P1").convert_to("EUR").at(as_of()))
        .await
        .unwrap();

    assert_eq!(result.price, dec!(100));
    assert_eq!(result.currency_id, "USD");
    assert_eq!(
        result
            .notes
            .iter()
            .filter(|n| matches!(n, PriceNote::ConversionFailed { .. }))
            .count(),
        3
    );
}

/// Converts amounts below a cap at 0.9, refuses the rest
struct CappedConverter {
    cap: Decimal,
}

#[async_trait]
impl CurrencyConverter for CappedConverter {
    async fn convert(&self, _from: &str, _to: &str, amount: Decimal, _as_of: i64) -> Option<Decimal> {
        (amount < self.cap).then(|| amount * dec!(0.9))
    }
}

#[tokio::test]
async fn test_partial_conversion_keeps_failed_fields_only() {
    let mut snapshot = list_only(dec!(100));
    snapshot.prices.push(price("P1", PriceType::PromoPrice, dec!(80)));
    let sources = common::sources(snapshot).with_converter(Some(Arc::new(CappedConverter { cap: dec!(90) })));
    let engine = PricingEngine::new(sources, EngineConfig::default());

    let result = engine
        .calculate_price(&PriceRequest::new("P1").convert_to("EUR").at(as_of()))
        .await
        .unwrap();

    assert_eq!(result.currency_id, "EUR");
    assert_eq!(result.promo_price, Some(dec!(72.00)));
    assert_eq!(result.price, dec!(100));
    assert_eq!(result.list_price, Some(dec!(100)));

    let failed: Vec<&str> = result
        .notes
        .iter()
        .filter_map(|n| match n {
            PriceNote::ConversionFailed { field, .. } => Some(field.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(failed, vec!["base_price", "price", "list_price"]);
}
