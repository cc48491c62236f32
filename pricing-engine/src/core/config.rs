use shared::models::{PURPOSE_PURCHASE, STORE_GROUP_ANY};

/// 引擎配置 - 定价与税额计算的全部配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | PRICING_DEFAULT_CURRENCY | USD | 请求未指定时的币种 |
/// | PRICING_DEFAULT_PURPOSE | PURCHASE | 价格用途 |
/// | PRICING_DEFAULT_STORE_GROUP | _NA_ | 门店组 |
/// | PRICING_DECIMALS | 2 | 最终价格小数位 |
/// | TAX_CALC_DECIMALS | 4 | 税额中间计算小数位 |
/// | TAX_FINAL_DECIMALS | 2 | 税额展示小数位 |
/// | PRICING_MAX_HIERARCHY_DEPTH | 32 | 层级遍历最大深度 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (未设置) | 滚动日志目录 |
///
/// # 示例
///
/// ```ignore
/// PRICING_DEFAULT_CURRENCY=EUR TAX_CALC_DECIMALS=6 cargo test
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 请求未指定币种时使用
    pub default_currency: String,
    /// 请求未指定价格用途时使用
    pub default_purpose: String,
    /// 请求未指定门店组时使用
    pub default_store_group: String,
    /// 最终价格舍入位数
    pub price_decimals: u32,
    /// 单行税额舍入位数
    pub tax_calc_decimals: u32,
    /// 税额合计与含税展示价舍入位数
    pub tax_final_decimals: u32,
    /// 会员组、分类、税务机关、地理层级的遍历上限
    pub max_hierarchy_depth: usize,
    /// 日志级别: trace | debug | info | warn | error
    pub log_level: String,
    /// 日志目录，未设置时输出到标准输出
    pub log_dir: Option<String>,
}

impl EngineConfig {
    /// 从环境变量加载配置
    ///
    /// 先读取 `.env`（如存在），未设置的项使用默认值
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        Self {
            default_currency: std::env::var("PRICING_DEFAULT_CURRENCY")
                .unwrap_or(defaults.default_currency),
            default_purpose: std::env::var("PRICING_DEFAULT_PURPOSE")
                .unwrap_or(defaults.default_purpose),
            default_store_group: std::env::var("PRICING_DEFAULT_STORE_GROUP")
                .unwrap_or(defaults.default_store_group),
            price_decimals: std::env::var("PRICING_DECIMALS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.price_decimals),
            tax_calc_decimals: std::env::var("TAX_CALC_DECIMALS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.tax_calc_decimals),
            tax_final_decimals: std::env::var("TAX_FINAL_DECIMALS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.tax_final_decimals),
            max_hierarchy_depth: std::env::var("PRICING_MAX_HIERARCHY_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_hierarchy_depth),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: std::env::var("LOG_DIR").ok().or(defaults.log_dir),
        }
    }

    /// 覆盖层级遍历上限
    ///
    /// 常用于测试场景
    pub fn with_max_hierarchy_depth(mut self, depth: usize) -> Self {
        self.max_hierarchy_depth = depth;
        self
    }
}

/// 不读取环境变量的默认配置
impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_currency: "USD".into(),
            default_purpose: PURPOSE_PURCHASE.into(),
            default_store_group: STORE_GROUP_ANY.into(),
            price_decimals: 2,
            tax_calc_decimals: 4,
            tax_final_decimals: 2,
            max_hierarchy_depth: 32,
            log_level: "info".into(),
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.default_currency, "USD");
        assert_eq!(config.default_purpose, "PURCHASE");
        assert_eq!(config.default_store_group, "_NA_");
        assert_eq!(config.price_decimals, 2);
        assert_eq!(config.tax_calc_decimals, 4);
        assert_eq!(config.tax_final_decimals, 2);
        assert_eq!(config.max_hierarchy_depth, 32);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_with_max_hierarchy_depth() {
        let config = EngineConfig::default().with_max_hierarchy_depth(3);
        assert_eq!(config.max_hierarchy_depth, 3);
    }
}
