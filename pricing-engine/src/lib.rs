//! Pricing Engine - 价格规则与税率计算
//!
//! # 架构概述
//!
//! - **价格规则** (`pricing`): 基础价格解析、条件匹配、规则折叠、数量阶梯价
//! - **税率计算** (`tax`): 税率行选择、VAT 含税拆分、免税继承、订单级分摊
//! - **数据源** (`source`): 只读能力 trait 与内存快照实现
//! - **层级遍历** (`party`): 客户组、分类的有界遍历
//! - **金额** (`money`): 统一的舍入与比例计算
//!
//! # 模块结构
//!
//! ```text
//! pricing-engine/src/
//! ├── core/          # 配置、错误
//! ├── money/         # Decimal 舍入与比例
//! ├── party/         # 客户层级遍历
//! ├── pricing/       # 价格规则引擎
//! ├── source/        # 数据源 trait + MemoryStore
//! ├── tax/           # 税率引擎
//! └── utils/         # 日志
//! ```

pub mod core;
pub mod money;
pub mod party;
pub mod pricing;
pub mod source;
pub mod tax;
pub mod utils;

// Re-export 公共类型
pub use core::{EngineConfig, EngineError, EngineResult};
pub use pricing::{PriceRequest, PricingEngine};
pub use source::{
    CatalogSource, CurrencyConverter, MemoryStore, PartySource, PriceSource, Snapshot, SourceError,
    Sources, TaxSource,
};
pub use tax::{OrderTax, OrderTaxRequest, TaxContext, TaxDisplay, TaxEngine, TaxLine};

// Re-export shared output types
pub use shared::order::{MonetaryAdjustment, PriceResult};

// Re-export logger functions
pub use utils::{init_logger, init_logger_from_config, init_logger_with_file};
