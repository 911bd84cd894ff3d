use crate::utils::error::{ProposalError, Result};
use std::io::{Cursor, Read, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::ZipArchive;

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

#[derive(Debug, Clone, PartialEq)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
}

/// `.docx` 容器：所有 zip 項目載入記憶體，寫回時保持原本順序
#[derive(Debug, Clone, PartialEq)]
pub struct DocxPackage {
    entries: Vec<PackageEntry>,
}

impl DocxPackage {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            entries.push(PackageEntry {
                name,
                data: content,
            });
        }

        let package = Self { entries };
        if package.part(DOCUMENT_PART).is_none() {
            return Err(ProposalError::TemplateError {
                message: format!("{} not found, template is not a .docx document", DOCUMENT_PART),
            });
        }

        tracing::debug!("Loaded template package with {} parts", package.entries.len());
        Ok(package)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &self.entries {
            zip.start_file::<_, ()>(entry.name.as_str(), FileOptions::default())?;
            zip.write_all(&entry.data)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.data.as_slice())
    }

    pub fn part_str(&self, name: &str) -> Result<&str> {
        let data = self.part(name).ok_or_else(|| ProposalError::TemplateError {
            message: format!("{} not found in template", name),
        })?;
        std::str::from_utf8(data).map_err(|e| ProposalError::TemplateError {
            message: format!("{} is not valid UTF-8: {}", name, e),
        })
    }

    /// 取代既有項目，不存在時加在最後
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(PackageEntry {
                name: name.to_string(),
                data,
            }),
        }
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn document_xml(&self) -> Result<&str> {
        self.part_str(DOCUMENT_PART)
    }

    pub fn set_document_xml(&mut self, xml: String) {
        self.set_part(DOCUMENT_PART, xml.into_bytes());
    }
}
