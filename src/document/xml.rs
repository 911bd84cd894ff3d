//! WordprocessingML 用的輕量 XML 掃描器。
//!
//! 只切出標籤與文字的位置（byte range），不建立 DOM，
//! 讓未修改的段落可以原封不動寫回。

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Open,
    Close,
    SelfClosing,
    Text,
    /// `<?xml ?>`、註解、CDATA、DOCTYPE
    Markup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub name: &'a str,
    pub span: Range<usize>,
}

impl<'a> Token<'a> {
    pub fn raw<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.clone()]
    }
}

pub fn tokenize(xml: &str) -> Result<Vec<Token<'_>>, String> {
    let bytes = xml.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            let end = xml[pos..].find('<').map_or(bytes.len(), |offset| pos + offset);
            tokens.push(Token {
                kind: TokenKind::Text,
                name: "",
                span: pos..end,
            });
            pos = end;
            continue;
        }

        let rest = &xml[pos..];
        let markup_end = if rest.starts_with("<!--") {
            Some(("-->", 3))
        } else if rest.starts_with("<![CDATA[") {
            Some(("]]>", 3))
        } else if rest.starts_with("<?") {
            Some(("?>", 2))
        } else if rest.starts_with("<!") {
            Some((">", 1))
        } else {
            None
        };

        if let Some((terminator, len)) = markup_end {
            let end = rest
                .find(terminator)
                .map(|offset| pos + offset + len)
                .ok_or_else(|| format!("unterminated markup at byte {}", pos))?;
            tokens.push(Token {
                kind: TokenKind::Markup,
                name: "",
                span: pos..end,
            });
            pos = end;
            continue;
        }

        let end = find_tag_end(bytes, pos).ok_or_else(|| format!("unterminated tag at byte {}", pos))?;
        let inner = &xml[pos + 1..end - 1];
        let (kind, body) = if let Some(body) = inner.strip_prefix('/') {
            (TokenKind::Close, body)
        } else if let Some(body) = inner.strip_suffix('/') {
            (TokenKind::SelfClosing, body)
        } else {
            (TokenKind::Open, inner)
        };
        let name = body
            .split(|c: char| c.is_ascii_whitespace())
            .next()
            .unwrap_or_default();

        tokens.push(Token {
            kind,
            name,
            span: pos..end,
        });
        pos = end;
    }

    Ok(tokens)
}

/// 找到標籤結尾 `>` 之後的位置，略過屬性值中的 `>`
fn find_tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        match (quote, byte) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"') | (None, b'\'') => quote = Some(byte),
            (None, b'>') => return Some(start + offset + 1),
            (None, _) => {}
        }
    }
    None
}

/// 從起始標籤原文取出屬性值（已還原跳脫字元）
pub fn attribute(tag: &str, name: &str) -> Option<String> {
    let mut rest = tag;
    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].trim_end();
        let key = key
            .rsplit(|c: char| c.is_ascii_whitespace())
            .next()
            .unwrap_or_default();
        let after = rest[eq + 1..].trim_start();
        let quote = after.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        let close = after[1..].find(quote)?;
        if key == name {
            return Some(unescape(&after[1..1 + close]));
        }
        rest = &after[close + 2..];
    }
    None
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate.find(';').and_then(|semi| {
            let entity = &candidate[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|ch| (ch, semi + 1))
        });

        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// 找出 `tokens[open]` 對應的結束標籤索引
pub fn matching_close(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    if tokens[open].kind == TokenKind::SelfClosing {
        return Some(open);
    }

    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::Open => depth += 1,
            TokenKind::Close => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}
