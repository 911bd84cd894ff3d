use crate::domain::model::KitRecord;
use crate::utils::error::{ProposalError, Result};

pub const REQUIRED_COLUMNS: [&str; 6] = ["DESCRICAO", "PESO UND", "A VISTA", "CODIGO", "LINK_KIT", "AREA"];

/// 套件資料集（每次產生提案時重新讀取）
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    kits: Vec<KitRecord>,
}

impl Catalog {
    pub fn new(kits: Vec<KitRecord>) -> Self {
        Self { kits }
    }

    /// 從 CSV 內容解析，缺少必要欄位時直接回傳錯誤
    pub fn from_csv(data: &[u8], delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::Headers)
            .from_reader(data);

        let headers = reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|header| header == column) {
                return Err(ProposalError::MissingColumnError {
                    column: column.to_string(),
                });
            }
        }

        let mut kits = Vec::new();
        for row in reader.deserialize::<KitRecord>() {
            kits.push(row?);
        }

        tracing::debug!("Loaded {} kits from dataset", kits.len());
        Ok(Self { kits })
    }

    pub fn kits(&self) -> &[KitRecord] {
        &self.kits
    }

    pub fn into_kits(self) -> Vec<KitRecord> {
        self.kits
    }

    pub fn len(&self) -> usize {
        self.kits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kits.is_empty()
    }

    /// 依描述完全比對，取第一筆
    pub fn find_by_description(&self, description: &str) -> Option<&KitRecord> {
        self.kits.iter().find(|kit| kit.description == description)
    }

    /// 描述包含查詢字串（不分大小寫）的套件，保持資料集順序
    pub fn search(&self, query: &str) -> Vec<&KitRecord> {
        let needle = query.to_lowercase();
        self.kits
            .iter()
            .filter(|kit| kit.description.to_lowercase().contains(&needle))
            .collect()
    }
}
