//! Tax inputs and outputs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::order::MonetaryAdjustment;

/// One taxable line: a product line, or a bare shipping/promotion amount
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaxLine {
    pub product_id: Option<String>,
    pub unit_price: Decimal,
    pub quantity: Decimal,
    pub line_amount: Decimal,
    pub shipping_amount: Option<Decimal>,
    pub promotions_amount: Option<Decimal>,
    /// The product price record already contains tax
    pub tax_in_price: bool,
    /// Stored display price including tax, per unit
    pub price_with_tax: Option<Decimal>,
    /// Discount granted on the line, as a positive amount
    pub discount_amount: Option<Decimal>,
}

impl TaxLine {
    /// Product line with `line_amount = unit_price * quantity`
    pub fn product(product_id: impl Into<String>, unit_price: Decimal, quantity: Decimal) -> Self {
        Self {
            product_id: Some(product_id.into()),
            unit_price,
            quantity,
            line_amount: unit_price * quantity,
            ..Default::default()
        }
    }

    /// Line carrying only a shipping amount
    pub fn shipping(amount: Decimal) -> Self {
        Self {
            quantity: Decimal::ONE,
            shipping_amount: Some(amount),
            ..Default::default()
        }
    }

    pub fn with_shipping(mut self, amount: Decimal) -> Self {
        self.shipping_amount = Some(amount);
        self
    }

    pub fn with_promotions(mut self, amount: Decimal) -> Self {
        self.promotions_amount = Some(amount);
        self
    }

    pub fn tax_inclusive(mut self) -> Self {
        self.tax_in_price = true;
        self
    }

    pub fn with_price_with_tax(mut self, price_with_tax: Decimal) -> Self {
        self.price_with_tax = Some(price_with_tax);
        self
    }

    pub fn with_discount(mut self, amount: Decimal) -> Self {
        self.discount_amount = Some(amount);
        self
    }

    pub fn has_shipping(&self) -> bool {
        self.shipping_amount.is_some_and(|a| !a.is_zero())
    }

    pub fn has_promotions(&self) -> bool {
        self.promotions_amount.is_some_and(|a| !a.is_zero())
    }
}

/// Who sells, who pays, where and when
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaxContext {
    pub product_store_id: Option<String>,
    /// Payee organization; keys ledger account overrides
    pub pay_to_party_id: Option<String>,
    /// Billing party; drives exemption lookup
    pub bill_to_party_id: Option<String>,
    pub as_of: Option<i64>,
}

impl TaxContext {
    pub fn store(mut self, product_store_id: impl Into<String>) -> Self {
        self.product_store_id = Some(product_store_id.into());
        self
    }

    pub fn pay_to(mut self, party_id: impl Into<String>) -> Self {
        self.pay_to_party_id = Some(party_id.into());
        self
    }

    pub fn bill_to(mut self, party_id: impl Into<String>) -> Self {
        self.bill_to_party_id = Some(party_id.into());
        self
    }

    pub fn at(mut self, as_of: i64) -> Self {
        self.as_of = Some(as_of);
        self
    }
}

/// Lines of one order plus order-level shipping and promotions
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrderTaxRequest {
    pub lines: Vec<TaxLine>,
    pub shipping_amount: Option<Decimal>,
    pub promotions_amount: Option<Decimal>,
}

/// Tax adjustments of an order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderTax {
    /// One entry per request line, in request order
    pub line_adjustments: Vec<Vec<MonetaryAdjustment>>,
    /// Tax on order-level shipping and promotions
    pub order_adjustments: Vec<MonetaryAdjustment>,
}

impl OrderTax {
    /// Charged tax over all lines and the order level
    pub fn total_charged(&self) -> Decimal {
        self.line_adjustments
            .iter()
            .flatten()
            .chain(&self.order_adjustments)
            .map(|a| a.amount)
            .sum()
    }
}

/// VAT figures for presenting a VAT-inclusive price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxDisplay {
    pub tax_total: Decimal,
    /// Sum of the percentages of the rows that applied
    pub tax_percentage: Decimal,
    pub price_with_tax: Decimal,
}
