use crate::document::package::{DocxPackage, CONTENT_TYPES_PART, DOCUMENT_RELS_PART};
use crate::document::xml::{attribute, escape, tokenize, TokenKind};
use crate::utils::error::{ProposalError, Result};
use std::io::Cursor;

pub const EMU_PER_INCH: i64 = 914_400;

const IMAGE_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const DRAWING_MAIN_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PICTURE_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const EMPTY_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
}

/// 以 `image` 判斷格式並讀出像素尺寸（只解析檔頭，不解碼像素）
pub fn read_image_info(file_name: &str, data: &[u8]) -> Result<ImageInfo> {
    let image_error = |message: String| ProposalError::ImageError {
        path: file_name.to_string(),
        message,
    };

    let reader = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| image_error(e.to_string()))?;
    let format = match reader.format() {
        Some(image::ImageFormat::Png) => ImageFormat::Png,
        Some(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
        other => {
            return Err(image_error(match other {
                Some(format) => format!("unsupported image format {:?}, expected PNG or JPEG", format),
                None => "unrecognized image data, expected PNG or JPEG".to_string(),
            }))
        }
    };

    let (width_px, height_px) = reader
        .into_dimensions()
        .map_err(|e| image_error(e.to_string()))?;
    if width_px == 0 || height_px == 0 {
        return Err(image_error(format!("invalid dimensions {}x{}", width_px, height_px)));
    }

    Ok(ImageInfo {
        format,
        width_px,
        height_px,
    })
}

impl DocxPackage {
    /// 在文件最後（body 的 sectPr 之前）加入一個只含圖片的段落，
    /// 寬度固定，高度依圖片比例計算
    pub fn append_picture(&mut self, file_name: &str, data: &[u8], width_emu: i64) -> Result<()> {
        let info = read_image_info(file_name, data)?;
        let height_emu = width_emu * i64::from(info.height_px) / i64::from(info.width_px);

        let media_target = self.next_media_name(info.format);
        self.set_part(&format!("word/{}", media_target), data.to_vec());
        self.ensure_default_content_type(info.format)?;
        let relationship_id = self.add_image_relationship(&media_target)?;

        let document = self.document_xml()?;
        let document = ensure_namespace(document, "xmlns:wp", WP_NS)?;
        let document = ensure_namespace(&document, "xmlns:r", R_NS)?;
        let shape_id = next_shape_id(&document)?;
        let drawing = picture_paragraph(
            shape_id,
            &escape(file_name),
            &relationship_id,
            width_emu,
            height_emu,
        );
        let insert_at = body_append_position(&document)?;

        let mut updated = String::with_capacity(document.len() + drawing.len());
        updated.push_str(&document[..insert_at]);
        updated.push_str(&drawing);
        updated.push_str(&document[insert_at..]);
        self.set_document_xml(updated);

        tracing::debug!(
            "Inserted picture '{}' as {} ({}x{} px)",
            file_name,
            media_target,
            info.width_px,
            info.height_px
        );
        Ok(())
    }

    fn next_media_name(&self, format: ImageFormat) -> String {
        (1..)
            .map(|n| format!("media/image{}.{}", n, format.extension()))
            .find(|name| !self.has_part(&format!("word/{}", name)))
            .unwrap_or_else(|| format!("media/image.{}", format.extension()))
    }

    fn ensure_default_content_type(&mut self, format: ImageFormat) -> Result<()> {
        let types = self.part_str(CONTENT_TYPES_PART)?;
        let tokens = tokenize(types).map_err(template_error)?;
        let registered = tokens.iter().any(|token| {
            token.name == "Default"
                && attribute(token.raw(types), "Extension")
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(format.extension()))
        });
        if registered {
            return Ok(());
        }

        let close = types
            .rfind("</Types>")
            .ok_or_else(|| template_error(format!("{} has no </Types>", CONTENT_TYPES_PART)))?;
        let updated = format!(
            r#"{}<Default Extension="{}" ContentType="{}"/>{}"#,
            &types[..close],
            format.extension(),
            format.content_type(),
            &types[close..]
        );
        self.set_part(CONTENT_TYPES_PART, updated.into_bytes());
        Ok(())
    }

    fn add_image_relationship(&mut self, target: &str) -> Result<String> {
        let rels = match self.part_str(DOCUMENT_RELS_PART) {
            Ok(rels) => rels.to_string(),
            Err(_) => EMPTY_RELS.to_string(),
        };

        let tokens = tokenize(&rels).map_err(template_error)?;
        let next_id = tokens
            .iter()
            .filter(|token| token.name == "Relationship")
            .filter_map(|token| attribute(token.raw(&rels), "Id"))
            .filter_map(|id| id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
            .max()
            .unwrap_or(0)
            + 1;
        let relationship_id = format!("rId{}", next_id);

        let close = rels
            .rfind("</Relationships>")
            .ok_or_else(|| template_error(format!("{} has no </Relationships>", DOCUMENT_RELS_PART)))?;
        let updated = format!(
            r#"{}<Relationship Id="{}" Type="{}" Target="{}"/>{}"#,
            &rels[..close],
            relationship_id,
            IMAGE_RELATIONSHIP,
            target,
            &rels[close..]
        );
        self.set_part(DOCUMENT_RELS_PART, updated.into_bytes());
        Ok(relationship_id)
    }
}

/// 根元素缺少命名空間宣告時補上
fn ensure_namespace(document: &str, declaration: &str, uri: &str) -> Result<String> {
    let tokens = tokenize(document).map_err(template_error)?;
    let root = tokens
        .iter()
        .find(|token| token.kind == TokenKind::Open)
        .ok_or_else(|| template_error("document has no root element".to_string()))?;

    if attribute(root.raw(document), declaration).is_some() {
        return Ok(document.to_string());
    }

    let insert_at = root.span.start + 1 + root.name.len();
    Ok(format!(
        r#"{} {}="{}"{}"#,
        &document[..insert_at],
        declaration,
        uri,
        &document[insert_at..]
    ))
}

fn next_shape_id(document: &str) -> Result<u32> {
    let tokens = tokenize(document).map_err(template_error)?;
    let max = tokens
        .iter()
        .filter(|token| token.name == "wp:docPr")
        .filter_map(|token| attribute(token.raw(document), "id"))
        .filter_map(|id| id.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    Ok(max + 1)
}

/// body 層級 `w:sectPr` 的起點；沒有時為 `</w:body>` 的位置
fn body_append_position(document: &str) -> Result<usize> {
    let tokens = tokenize(document).map_err(template_error)?;
    let mut depth_in_body: Option<usize> = None;
    let mut depth = 0usize;

    for token in &tokens {
        match token.kind {
            TokenKind::Open | TokenKind::SelfClosing
                if token.name == "w:sectPr" && depth_in_body == Some(depth) =>
            {
                return Ok(token.span.start);
            }
            TokenKind::Open => {
                depth += 1;
                if token.name == "w:body" {
                    depth_in_body = Some(depth);
                }
            }
            TokenKind::Close => {
                if token.name == "w:body" && depth_in_body == Some(depth) {
                    return Ok(token.span.start);
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    Err(template_error("document has no <w:body>".to_string()))
}

fn picture_paragraph(shape_id: u32, name: &str, relationship_id: &str, cx: i64, cy: i64) -> String {
    format!(
        concat!(
            r#"<w:p><w:r><w:drawing>"#,
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="{a}" noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic xmlns:a="{a}"><a:graphicData uri="{pic}">"#,
            r#"<pic:pic xmlns:pic="{pic}">"#,
            r#"<pic:nvPicPr><pic:cNvPr id="0" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline>"#,
            r#"</w:drawing></w:r></w:p>"#
        ),
        cx = cx,
        cy = cy,
        id = shape_id,
        a = DRAWING_MAIN_NS,
        pic = PICTURE_NS,
        name = name,
        rid = relationship_id,
    )
}

fn template_error(message: String) -> ProposalError {
    ProposalError::TemplateError { message }
}
