use crate::document::xml::{attribute, escape, matching_close, tokenize, unescape, Token, TokenKind};
use crate::utils::error::{ProposalError, Result};
use std::ops::Range;

/// 段落中的一段文字格式
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub color: Option<String>,
    /// 從範本讀入時的原始 XML；新建的 run 為 None
    raw: Option<String>,
}

impl Run {
    pub fn new(text: impl Into<String>, bold: bool, color: Option<String>) -> Self {
        Self {
            text: text.into(),
            bold,
            color,
            raw: None,
        }
    }

    fn to_xml(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }

        let mut xml = String::from("<w:r>");
        if self.bold || self.color.is_some() {
            xml.push_str("<w:rPr>");
            if self.bold {
                xml.push_str("<w:b/>");
            }
            if let Some(color) = &self.color {
                xml.push_str(&format!("<w:color w:val=\"{}\"/>", escape(color)));
            }
            xml.push_str("</w:rPr>");
        }

        let mut pending = String::new();
        for ch in self.text.chars() {
            match ch {
                '\t' | '\n' => {
                    push_text(&mut xml, &pending);
                    pending.clear();
                    xml.push_str(if ch == '\t' { "<w:tab/>" } else { "<w:br/>" });
                }
                _ => pending.push(ch),
            }
        }
        push_text(&mut xml, &pending);

        xml.push_str("</w:r>");
        xml
    }
}

fn push_text(xml: &mut String, text: &str) {
    if !text.is_empty() {
        xml.push_str("<w:t xml:space=\"preserve\">");
        xml.push_str(&escape(text));
        xml.push_str("</w:t>");
    }
}

/// 一個 `<w:p>` 元素：保留段落屬性，其餘子元素只認得 run
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    open_tag: String,
    properties: Option<String>,
    runs: Vec<Run>,
}

impl Paragraph {
    pub fn parse(xml: &str) -> Result<Self> {
        let tokens = tokenize(xml).map_err(template_error)?;
        let first = tokens
            .first()
            .filter(|token| token.name == "w:p")
            .ok_or_else(|| template_error("paragraph must start with <w:p>".to_string()))?;

        if first.kind == TokenKind::SelfClosing {
            let raw = first.raw(xml);
            return Ok(Self {
                open_tag: format!("{}>", raw.trim_end_matches("/>").trim_end()),
                properties: None,
                runs: Vec::new(),
            });
        }

        let close = matching_close(&tokens, 0)
            .ok_or_else(|| template_error("unclosed <w:p>".to_string()))?;

        let mut paragraph = Self {
            open_tag: first.raw(xml).to_string(),
            properties: None,
            runs: Vec::new(),
        };

        let mut index = 1;
        while index < close {
            let token = &tokens[index];
            if !matches!(token.kind, TokenKind::Open | TokenKind::SelfClosing) {
                index += 1;
                continue;
            }

            let end = matching_close(&tokens, index)
                .ok_or_else(|| template_error(format!("unclosed <{}>", token.name)))?;
            let span = token.span.start..tokens[end].span.end;

            match token.name {
                "w:pPr" => paragraph.properties = Some(xml[span].to_string()),
                "w:r" => paragraph.runs.push(parse_run(xml, &tokens[index..=end], span)),
                _ => {}
            }
            index = end + 1;
        }

        Ok(paragraph)
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn first_run_color(&self) -> Option<&str> {
        self.runs.first().and_then(|run| run.color.as_deref())
    }

    /// 移除所有內容，只保留段落屬性
    pub fn clear(&mut self) {
        self.runs.clear();
    }

    pub fn add_run(&mut self, run: Run) {
        self.runs.push(run);
    }

    pub fn to_xml(&self) -> String {
        let mut xml = self.open_tag.clone();
        if let Some(properties) = &self.properties {
            xml.push_str(properties);
        }
        for run in &self.runs {
            xml.push_str(&run.to_xml());
        }
        xml.push_str("</w:p>");
        xml
    }
}

/// `tokens` 從 `<w:r>` 開始到對應的 `</w:r>`
fn parse_run(xml: &str, tokens: &[Token<'_>], span: Range<usize>) -> Run {
    let mut run = Run {
        text: String::new(),
        bold: false,
        color: None,
        raw: Some(xml[span].to_string()),
    };

    let last = tokens.len().saturating_sub(1);
    let mut index = 1;
    while index < last {
        let token = &tokens[index];
        if !matches!(token.kind, TokenKind::Open | TokenKind::SelfClosing) {
            index += 1;
            continue;
        }
        let end = matching_close(tokens, index).unwrap_or(index);

        match token.name {
            "w:t" => {
                for inner in &tokens[index..end] {
                    if inner.kind == TokenKind::Text {
                        run.text.push_str(&unescape(inner.raw(xml)));
                    }
                }
            }
            "w:tab" => run.text.push('\t'),
            "w:br" | "w:cr" => run.text.push('\n'),
            "w:rPr" => {
                for property in tokens[index..=end].iter().skip(1) {
                    if !matches!(property.kind, TokenKind::Open | TokenKind::SelfClosing) {
                        continue;
                    }
                    let raw = property.raw(xml);
                    match property.name {
                        "w:b" => {
                            run.bold = !matches!(
                                attribute(raw, "w:val").as_deref(),
                                Some("0") | Some("false") | Some("off")
                            )
                        }
                        "w:color" => {
                            run.color = attribute(raw, "w:val").filter(|val| val != "auto")
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        index = end + 1;
    }

    run
}

fn template_error(message: String) -> ProposalError {
    ProposalError::TemplateError { message }
}

/// 需要替換的段落位置：body 的直接子段落，以及 body 直屬表格儲存格中的段落
pub fn substitution_targets(xml: &str) -> Result<Vec<Range<usize>>> {
    let tokens = tokenize(xml).map_err(template_error)?;
    let mut stack: Vec<&str> = Vec::new();
    let mut targets = Vec::new();

    let mut index = 0;
    while index < tokens.len() {
        let token = &tokens[index];
        match token.kind {
            TokenKind::Open | TokenKind::SelfClosing
                if token.name == "w:p" && is_target_parent(&stack) =>
            {
                let end = matching_close(&tokens, index)
                    .ok_or_else(|| template_error("unclosed <w:p>".to_string()))?;
                targets.push(token.span.start..tokens[end].span.end);
                index = end + 1;
                continue;
            }
            TokenKind::Open => stack.push(token.name),
            TokenKind::Close => {
                stack.pop();
            }
            _ => {}
        }
        index += 1;
    }

    Ok(targets)
}

fn is_target_parent(stack: &[&str]) -> bool {
    matches!(stack, [_, "w:body"] | [_, "w:body", "w:tbl", "w:tr", "w:tc"])
}
