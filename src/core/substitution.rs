//! 範本替換引擎。
//!
//! 分兩步：`mark` 先把 placeholder 換成以標記字元包住的值，
//! `segment` 再把結果切成 `(文字, 是否粗體)` 片段。延後判斷粗體，
//! 是因為值本身可能含有其他 token 或金額字樣。

use crate::document::paragraph::{substitution_targets, Paragraph, Run};
use crate::document::DocxPackage;
use crate::domain::model::Substitutions;
use crate::utils::error::Result;
use regex::Regex;
use std::sync::LazyLock;

/// Unicode noncharacter，不會出現在文件文字中
pub const BOLD_OPEN: char = '\u{FDD0}';
pub const BOLD_CLOSE: char = '\u{FDD1}';

static CURRENCY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"R\$ [\d.,]+").expect("currency pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub bold: bool,
}

impl Segment {
    fn new(text: &str, bold: bool) -> Self {
        Self {
            text: text.to_string(),
            bold,
        }
    }
}

/// 依對應表順序替換所有出現處，值以標記字元包住
pub fn mark(text: &str, substitutions: &Substitutions) -> String {
    let mut marked = text.to_string();
    for (token, value) in substitutions.iter() {
        if marked.contains(token) {
            marked = marked.replace(token, &format!("{}{}{}", BOLD_OPEN, value, BOLD_CLOSE));
        }
    }
    marked
}

/// 標記內（任何深度）為粗體；標記外的金額字樣也是粗體；空片段丟棄
pub fn segment(marked: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut buffer = String::new();
    let mut depth = 0usize;

    for ch in marked.chars() {
        match ch {
            BOLD_OPEN | BOLD_CLOSE => {
                flush(&mut segments, &buffer, depth > 0);
                buffer.clear();
                depth = if ch == BOLD_OPEN {
                    depth + 1
                } else {
                    depth.saturating_sub(1)
                };
            }
            _ => buffer.push(ch),
        }
    }
    flush(&mut segments, &buffer, depth > 0);

    segments
}

fn flush(segments: &mut Vec<Segment>, text: &str, bold: bool) {
    if text.is_empty() {
        return;
    }
    if bold {
        segments.push(Segment::new(text, true));
        return;
    }

    let mut last = 0;
    for found in CURRENCY_PATTERN.find_iter(text) {
        if found.start() > last {
            segments.push(Segment::new(&text[last..found.start()], false));
        }
        segments.push(Segment::new(found.as_str(), true));
        last = found.end();
    }
    if last < text.len() {
        segments.push(Segment::new(&text[last..], false));
    }
}

/// 替換單一段落；沒有任何 token 時不動段落並回傳 false
pub fn apply_to_paragraph(paragraph: &mut Paragraph, substitutions: &Substitutions) -> bool {
    let original = paragraph.text();
    let marked = mark(&original, substitutions);
    if marked == original {
        return false;
    }

    let color = paragraph.first_run_color().map(str::to_string);
    paragraph.clear();
    for part in segment(&marked) {
        paragraph.add_run(Run::new(part.text, part.bold, color.clone()));
    }
    true
}

/// 套用到 document.xml 中所有 body 段落與表格儲存格段落，回傳改寫的段落數
pub fn apply_to_document_xml(xml: &str, substitutions: &Substitutions) -> Result<(String, usize)> {
    let mut output = String::with_capacity(xml.len());
    let mut cursor = 0;
    let mut rewritten = 0;

    for range in substitution_targets(xml)? {
        let mut paragraph = Paragraph::parse(&xml[range.clone()])?;
        if !apply_to_paragraph(&mut paragraph, substitutions) {
            continue;
        }
        output.push_str(&xml[cursor..range.start]);
        output.push_str(&paragraph.to_xml());
        cursor = range.end;
        rewritten += 1;
    }
    output.push_str(&xml[cursor..]);

    Ok((output, rewritten))
}

pub fn apply_to_package(package: &mut DocxPackage, substitutions: &Substitutions) -> Result<usize> {
    let (xml, rewritten) = apply_to_document_xml(package.document_xml()?, substitutions)?;
    if rewritten > 0 {
        package.set_document_xml(xml);
    }
    tracing::info!("📝 Rewrote {} template paragraphs", rewritten);
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subs() -> Substitutions {
        Substitutions::from_entries([
            ("{{nome_cliente}}", "Maria Silva"),
            ("{{valor_avista}}", "R$ 47.500,00"),
            ("{{quant}}", "2"),
        ])
    }

    fn bold_texts(segments: &[Segment]) -> Vec<&str> {
        segments
            .iter()
            .filter(|segment| segment.bold)
            .map(|segment| segment.text.as_str())
            .collect()
    }

    #[test]
    fn test_mark_wraps_every_occurrence() {
        let marked = mark("{{quant}} x {{quant}}", &subs());
        assert_eq!(marked, "\u{FDD0}2\u{FDD1} x \u{FDD0}2\u{FDD1}");
    }

    #[test]
    fn test_mark_without_tokens_is_identity() {
        assert_eq!(mark("Sem placeholders aqui", &subs()), "Sem placeholders aqui");
    }

    #[test]
    fn test_segment_marks_substitutions_and_literal_currency_bold() {
        let marked = mark("Cliente {{nome_cliente}}, entrada R$ 1.000,00 e total {{valor_avista}}.", &subs());
        let segments = segment(&marked);

        assert_eq!(
            segments,
            vec![
                Segment::new("Cliente ", false),
                Segment::new("Maria Silva", true),
                Segment::new(", entrada ", false),
                Segment::new("R$ 1.000,00", true),
                Segment::new(" e total ", false),
                Segment::new("R$ 47.500,00", true),
                Segment::new(".", false),
            ]
        );
    }

    #[test]
    fn test_value_containing_token_is_still_bold() {
        let substitutions = Substitutions::from_entries([("{{a}}", "x {{b}} y"), ("{{b}}", "B")]);
        let segments = segment(&mark("[{{a}}]", &substitutions));
        assert_eq!(bold_texts(&segments), vec!["x ", "B", " y"]);
        let text: String = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(text, "[x B y]");
    }

    #[test]
    fn test_paragraph_without_tokens_is_untouched() {
        let xml = r#"<w:p><w:r><w:rPr><w:i/></w:rPr><w:t>Proposta </w:t></w:r><w:r><w:t>comercial R$ 10,00</w:t></w:r></w:p>"#;
        let mut paragraph = Paragraph::parse(xml).unwrap();
        let before = paragraph.clone();

        assert!(!apply_to_paragraph(&mut paragraph, &subs()));
        assert_eq!(paragraph, before);
        assert_eq!(paragraph.to_xml(), xml);
    }

    #[test]
    fn test_token_twice_both_bold_with_original_color() {
        let xml = r#"<w:p><w:r><w:rPr><w:color w:val="2E74B5"/></w:rPr><w:t>{{nome_cliente}} / </w:t></w:r><w:r><w:t>{{nome_cliente}}</w:t></w:r></w:p>"#;
        let mut paragraph = Paragraph::parse(xml).unwrap();

        assert!(apply_to_paragraph(&mut paragraph, &subs()));
        assert_eq!(paragraph.text(), "Maria Silva / Maria Silva");
        let runs = paragraph.runs();
        assert_eq!(runs.len(), 3);
        assert!(runs[0].bold && runs[2].bold && !runs[1].bold);
        assert!(runs.iter().all(|run| run.color.as_deref() == Some("2E74B5")));
    }

    #[test]
    fn test_token_split_across_runs_is_replaced() {
        let xml = r#"<w:p><w:r><w:t>Qtd: {{qu</w:t></w:r><w:r><w:t>ant}}</w:t></w:r></w:p>"#;
        let mut paragraph = Paragraph::parse(xml).unwrap();
        assert!(apply_to_paragraph(&mut paragraph, &subs()));
        assert_eq!(paragraph.text(), "Qtd: 2");
        assert_eq!(paragraph.first_run_color(), None);
    }

    #[test]
    fn test_apply_to_document_xml_counts_rewritten_paragraphs() {
        let xml = concat!(
            r#"<w:document><w:body>"#,
            r#"<w:p><w:r><w:t>Olá {{nome_cliente}}</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Sem token</w:t></w:r></w:p>"#,
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>{{valor_avista}}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
            r#"<w:sectPr/></w:body></w:document>"#
        );
        let (output, rewritten) = apply_to_document_xml(xml, &subs()).unwrap();

        assert_eq!(rewritten, 2);
        assert!(output.contains(r#"<w:p><w:r><w:t>Sem token</w:t></w:r></w:p>"#));
        assert!(output.contains(r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Maria Silva</w:t></w:r>"#));
        assert!(output.contains(r#"<w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">R$ 47.500,00</w:t></w:r></w:p></w:tc>"#));
        assert!(!output.contains("{{"));
    }

    #[test]
    fn test_apply_to_document_xml_without_tokens_returns_input() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>nada</w:t></w:r></w:p></w:body></w:document>"#;
        let (output, rewritten) = apply_to_document_xml(xml, &subs()).unwrap();
        assert_eq!(rewritten, 0);
        assert_eq!(output, xml);
    }
}
