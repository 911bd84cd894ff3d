use crate::core::catalog::Catalog;
use crate::core::format::{format_currency, format_decimal, format_percent, parse_decimal};
use crate::domain::model::{ProposalRequest, Substitutions};
use chrono::NaiveDate;
use serde::Serialize;

/// 每噸標準運費
pub const FREIGHT_PER_TONNE: f64 = 1150.0;
/// 超過免費距離後每公里加收
pub const EXTRA_FREIGHT_PER_KM: f64 = 5.50;
pub const FREE_DISTANCE_KM: f64 = 200.0;
pub const TURNKEY_MULTIPLIER: f64 = 2.15;
/// 每平方公尺造價（傳統磚造 / 預製）
pub const CUB_MASONRY: f64 = 2900.0;
pub const CUB_PREFAB: f64 = 2150.0;

pub const NOT_INFORMED: &str = "Não informado";

/// 一次提案計算的所有數值
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingSummary {
    pub client_name: String,
    pub kit_code: String,
    pub kit_description: String,
    pub kit_link: String,
    pub quantity: u32,
    pub unit_weight: f64,
    pub unit_price: f64,
    pub total_weight: f64,
    pub cash_value: f64,
    pub standard_freight: f64,
    pub extra_freight: f64,
    pub total_freight: f64,
    pub turnkey_value: f64,
    pub labor_and_extras: f64,
    pub area_m2: f64,
    pub masonry_cost: f64,
    pub prefab_cost: f64,
    pub cost_savings: f64,
    pub distance_km: f64,
    pub discount_percent: f64,
    pub date: NaiveDate,
    /// 至少一筆選擇在資料集中找到
    pub matched: bool,
}

/// 計算提案數值。
///
/// 多筆選擇時，每筆找到的套件都會覆蓋價格、數量、面積與描述，
/// 只有總重量會累加；找不到的描述直接略過。折扣不做範圍檢查。
pub fn calculate(catalog: &Catalog, request: &ProposalRequest, date: NaiveDate) -> PricingSummary {
    let mut total_weight = 0.0;
    let mut unit_weight = 0.0;
    let mut unit_price = 0.0;
    let mut cash_value = 0.0;
    let mut area_m2 = 0.0;
    let mut quantity: u32 = 1;
    let mut kit_code = String::new();
    let mut kit_description = String::new();
    let mut kit_link = String::new();
    let mut matched = false;

    for selection in &request.selections {
        let Some(kit) = catalog.find_by_description(&selection.kit) else {
            tracing::warn!("⚠️ Kit '{}' not found in dataset, skipping", selection.kit);
            continue;
        };
        tracing::debug!("Matched kit '{}' ({})", kit.description, kit.code);
        matched = true;

        unit_weight = kit.unit_weight;
        unit_price = kit.cash_price;
        kit_description = kit.description.clone();
        kit_code = kit.code.clone();
        kit_link = kit.link.clone();
        quantity = selection.quantity;
        area_m2 = parse_decimal(&kit.area);

        let qty = f64::from(quantity);
        total_weight += unit_weight * qty;
        cash_value = unit_price * qty * (1.0 - request.discount_percent / 100.0);
    }

    let standard_freight = (total_weight / 1000.0) * FREIGHT_PER_TONNE;
    let extra_freight = (request.distance_km - FREE_DISTANCE_KM).max(0.0) * EXTRA_FREIGHT_PER_KM;
    let turnkey_value = unit_price * f64::from(quantity) * TURNKEY_MULTIPLIER;
    let masonry_cost = CUB_MASONRY * area_m2;
    let prefab_cost = CUB_PREFAB * area_m2;

    PricingSummary {
        client_name: request.client_name.clone(),
        kit_code,
        kit_description,
        kit_link,
        quantity,
        unit_weight,
        unit_price,
        total_weight,
        cash_value,
        standard_freight,
        extra_freight,
        total_freight: standard_freight + extra_freight,
        turnkey_value,
        labor_and_extras: turnkey_value - cash_value,
        area_m2,
        masonry_cost,
        prefab_cost,
        cost_savings: masonry_cost - prefab_cost,
        distance_km: request.distance_km,
        discount_percent: request.discount_percent,
        date,
        matched,
    }
}

impl PricingSummary {
    pub fn construction_time(&self) -> String {
        if self.area_m2 > 0.0 {
            format!("{} dias", self.area_m2.floor() as i64)
        } else {
            NOT_INFORMED.to_string()
        }
    }

    pub fn list_total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }

    /// 範本 placeholder 對應表；token 名稱是與範本作者之間的約定
    pub fn substitutions(&self) -> Substitutions {
        // 沒有任何套件時，面積與單位重量顯示整數 0
        let (area, unit_weight) = if self.matched {
            (format_decimal(self.area_m2), format_decimal(self.unit_weight))
        } else {
            ("0".to_string(), "0".to_string())
        };

        Substitutions::from_entries([
            ("{{cod_kit}}", self.kit_code.clone()),
            ("{{quant}}", self.quantity.to_string()),
            ("{{nome_cliente}}", self.client_name.clone()),
            ("{{descrição_kit}}", self.kit_description.clone()),
            ("{{preço_normal}}", format_currency(self.unit_price)),
            ("{{valor_total}}", format_currency(self.list_total())),
            ("{{valor_avista}}", format_currency(self.cash_value)),
            ("{{peso_total}}", format!("{:.2} kg", self.total_weight)),
            ("{{link_kit}}", self.kit_link.clone()),
            ("{{distancia_loja}}", format!("{} km", format_decimal(self.distance_km))),
            ("{{frete_normal}}", format_currency(self.standard_freight)),
            ("{{frete_adicional}}", format_currency(self.extra_freight)),
            ("{{frete_total}}", format_currency(self.total_freight)),
            ("{{50%_valor_avista}}", format_currency(self.cash_value / 2.0)),
            ("{{valor_chave_mao1}}", format_currency(self.turnkey_value)),
            ("{{valor_chave_mao}}", format_currency(self.turnkey_value)),
            ("{{valor_kit}}", format_currency(self.cash_value)),
            ("{{valor_mao_obra}}", format_currency(self.labor_and_extras)),
            ("{{tam_kit}}", format!("{} m²", area)),
            ("{{prazo_construcao}}", self.construction_time()),
            ("{{planta_baixa}}", format!("{}planta", self.kit_code)),
            ("{{peso_kit}}", format!("{} kg", unit_weight)),
            ("{{cub_alvenaria}}", format_currency(CUB_MASONRY)),
            ("{{cub_prefab}}", format_currency(CUB_PREFAB)),
            ("{{area_casa}}", area),
            ("{{custo_alvenaria}}", format_currency(self.masonry_cost)),
            ("{{custo_chave_mao}}", format_currency(self.prefab_cost)),
            ("{{economia_cub}}", format_currency(self.cost_savings)),
            ("{{porcentagem_desconto}}", format_percent(self.discount_percent)),
            ("{{data_atual}}", self.date.format("%d/%m/%Y").to_string()),
        ])
    }
}
