use crate::core::format::parse_decimal;
use crate::document::DocxPackage;
use serde::{Deserialize, Deserializer, Serialize};

/// 資料集中的一列套件資料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitRecord {
    #[serde(rename = "CODIGO")]
    pub code: String,
    #[serde(rename = "DESCRICAO")]
    pub description: String,
    #[serde(rename = "PESO UND", deserialize_with = "lenient_number")]
    pub unit_weight: f64,
    #[serde(rename = "A VISTA", deserialize_with = "lenient_number")]
    pub cash_price: f64,
    /// 小數逗號格式，計算時才解析
    #[serde(rename = "AREA")]
    pub area: String,
    #[serde(rename = "LINK_KIT")]
    pub link: String,
}

/// 空白或非數值的儲存格視為 0，不影響其他列
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(parse_decimal(&raw))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub kit: String,
    pub quantity: u32,
}

impl Selection {
    pub fn new(kit: impl Into<String>, quantity: u32) -> Self {
        Self {
            kit: kit.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRequest {
    pub client_name: String,
    pub selections: Vec<Selection>,
    pub distance_km: f64,
    pub discount_percent: f64,
    /// 平面圖路徑，只使用前兩張
    pub plan_images: Vec<String>,
}

/// 依序排列的 placeholder → 值對應表，建立後不可變
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitutions {
    entries: Vec<(String, String)>,
}

impl Substitutions {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(token, value)| (token.into(), value.into()))
                .collect(),
        }
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == token)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(token, value)| (token.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// extract 階段的輸出：資料集、範本與平面圖原始資料
#[derive(Debug, Clone)]
pub struct ProposalInputs {
    pub kits: Vec<KitRecord>,
    pub template: DocxPackage,
    pub plan_images: Vec<PlanImageFile>,
}

#[derive(Debug, Clone)]
pub struct PlanImageFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// transform 階段的輸出
#[derive(Debug, Clone)]
pub struct RenderedProposal {
    pub document: DocxPackage,
    pub substitutions: Substitutions,
    pub paragraphs_rewritten: usize,
    pub images_inserted: usize,
}
