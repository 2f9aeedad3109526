use crate::canvas::{Command, Document, Page};
use crate::error::ReportError;
use crate::font::FontRegistry;
use crate::types::{Pt, Size};
use std::collections::HashMap;
use std::io::Write;

const BASE14: &[&str] = &[
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
    "Times-Roman",
    "Times-Bold",
    "Times-Italic",
    "Times-BoldItalic",
    "Courier",
    "Courier-Bold",
    "Courier-Oblique",
    "Courier-BoldOblique",
    "Symbol",
    "ZapfDingbats",
];

/// Serializes a composed document to PDF 1.7. Registered fonts are embedded
/// as simple TrueType programs; everything else resolves to a base-14 Type1
/// so a render with no font assets still produces a valid file.
pub fn document_to_pdf(
    doc: &Document,
    registry: Option<&FontRegistry>,
) -> Result<Vec<u8>, ReportError> {
    let mut out = Vec::new();
    write_document(doc, registry, &mut out)?;
    Ok(out)
}

pub fn write_document<W: Write>(
    doc: &Document,
    registry: Option<&FontRegistry>,
    writer: &mut W,
) -> Result<(), ReportError> {
    let bytes = Serializer::new(doc, registry).serialize();
    writer.write_all(&bytes)?;
    Ok(())
}

struct Serializer<'a> {
    doc: &'a Document,
    registry: Option<&'a FontRegistry>,
    objects: Vec<Vec<u8>>,
}

impl<'a> Serializer<'a> {
    fn new(doc: &'a Document, registry: Option<&'a FontRegistry>) -> Self {
        Self {
            doc,
            registry,
            objects: Vec::new(),
        }
    }

    fn add_object(&mut self, body: Vec<u8>) -> usize {
        self.objects.push(body);
        self.objects.len()
    }

    fn reserve_object(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len()
    }

    fn serialize(mut self) -> Vec<u8> {
        let catalog_id = self.reserve_object();
        let pages_id = self.reserve_object();

        // Every font name the pages reference, plus the per-page default.
        let mut font_names: Vec<String> = vec!["Helvetica".to_string()];
        for page in &self.doc.pages {
            for command in &page.commands {
                if let Command::SetFontName(name) = command {
                    if !font_names.iter().any(|n| n == name) {
                        font_names.push(name.clone());
                    }
                }
            }
        }

        let mut font_tags: HashMap<String, String> = HashMap::new();
        let mut font_ids: Vec<(String, usize)> = Vec::new();
        for (index, name) in font_names.iter().enumerate() {
            let tag = format!("F{}", index + 1);
            font_tags.insert(name.clone(), tag.clone());
            let font_id = self.build_font_object(name);
            font_ids.push((tag, font_id));
        }

        let mut resources = String::from("<< /Font << ");
        for (tag, id) in &font_ids {
            resources.push_str(&format!("/{} {} 0 R ", tag, id));
        }
        resources.push_str(">> >>");

        let mut page_ids = Vec::new();
        for page in &self.doc.pages {
            let content = render_page(page, self.doc.page_size, &font_tags);
            let content_id = self.add_object(stream_object(content));
            let page_id = self.add_object(
                format!(
                    "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} /Contents {} 0 R >>",
                    pages_id,
                    fmt_pt(self.doc.page_size.width),
                    fmt_pt(self.doc.page_size.height),
                    resources,
                    content_id
                )
                .into_bytes(),
            );
            page_ids.push(page_id);
        }

        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        self.objects[pages_id - 1] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_ids.len()
        )
        .into_bytes();
        self.objects[catalog_id - 1] =
            format!("<< /Type /Catalog /Pages {} 0 R >>", pages_id).into_bytes();

        self.assemble(catalog_id)
    }

    /// Builds the font object graph for one name and returns the /Font id.
    fn build_font_object(&mut self, name: &str) -> usize {
        if let Some(font) = self.registry.and_then(|r| r.resolve(name)) {
            let metrics = &font.metrics;
            let file_id = self.add_object(stream_object(font.data.clone()));
            let base_name = sanitize_ps_name(&font.name);
            let flags = font_flags(metrics.is_fixed_pitch, metrics.italic_angle);
            let descriptor_id = self.add_object(
                format!(
                    "<< /Type /FontDescriptor /FontName /{} /Flags {} /FontBBox [{} {} {} {}] \
                     /ItalicAngle {} /Ascent {} /Descent {} /CapHeight {} /StemV {} /FontFile2 {} 0 R >>",
                    base_name,
                    flags,
                    metrics.bbox.0,
                    metrics.bbox.1,
                    metrics.bbox.2,
                    metrics.bbox.3,
                    metrics.italic_angle,
                    metrics.ascent,
                    metrics.descent,
                    metrics.cap_height,
                    metrics.stem_v,
                    file_id
                )
                .into_bytes(),
            );
            let widths = metrics
                .widths
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            return self.add_object(
                format!(
                    "<< /Type /Font /Subtype /TrueType /BaseFont /{} /FirstChar {} /LastChar {} \
                     /Widths [{}] /FontDescriptor {} 0 R /Encoding /WinAnsiEncoding >>",
                    base_name, metrics.first_char, metrics.last_char, widths, descriptor_id
                )
                .into_bytes(),
            );
        }

        let base = if BASE14.contains(&name) {
            name
        } else {
            "Helvetica"
        };
        self.add_object(
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                base
            )
            .into_bytes(),
        )
    }

    fn assemble(self, catalog_id: usize) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        out.extend_from_slice(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(self.objects.len());
        for (index, body) in self.objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", self.objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                self.objects.len() + 1,
                catalog_id,
                xref_offset
            )
            .as_bytes(),
        );
        out
    }
}

fn stream_object(data: Vec<u8>) -> Vec<u8> {
    let mut body = format!("<< /Length {} >>\nstream\n", data.len()).into_bytes();
    body.extend_from_slice(&data);
    body.extend_from_slice(b"\nendstream");
    body
}

fn font_flags(is_fixed_pitch: bool, italic_angle: i16) -> u32 {
    let mut flags = 1 << 5; // nonsymbolic
    if is_fixed_pitch {
        flags |= 1;
    }
    if italic_angle != 0 {
        flags |= 1 << 6;
    }
    flags
}

fn sanitize_ps_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '+')
        .collect();
    if cleaned.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        cleaned
    }
}

/// Translates recorded commands to a content stream, flipping the top-left
/// y-down coordinates into PDF's bottom-left y-up space.
fn render_page(page: &Page, page_size: Size, font_tags: &HashMap<String, String>) -> Vec<u8> {
    let height = page_size.height;
    // Byte buffer, not String: WinAnsi text bytes above 0x7F are not UTF-8.
    let mut out: Vec<u8> = Vec::new();
    let mut push = |buf: &mut Vec<u8>, s: String| buf.extend_from_slice(s.as_bytes());
    let mut font_name = "Helvetica".to_string();
    let mut font_size = Pt::from_f32(12.0);

    for command in &page.commands {
        match command {
            Command::SetFillColor(color) => {
                push(
                    &mut out,
                    format!(
                        "{} {} {} rg\n",
                        fmt_component(color.r),
                        fmt_component(color.g),
                        fmt_component(color.b)
                    ),
                );
            }
            Command::SetStrokeColor(color) => {
                push(
                    &mut out,
                    format!(
                        "{} {} {} RG\n",
                        fmt_component(color.r),
                        fmt_component(color.g),
                        fmt_component(color.b)
                    ),
                );
            }
            Command::SetLineWidth(width) => {
                push(&mut out, format!("{} w\n", fmt_pt(*width)));
            }
            Command::SetFontName(name) => {
                font_name = name.clone();
            }
            Command::SetFontSize(size) => {
                font_size = *size;
            }
            Command::MoveTo { x, y } => {
                push(&mut out, format!("{} {} m\n", fmt_pt(*x), fmt_pt(height - *y)));
            }
            Command::LineTo { x, y } => {
                push(&mut out, format!("{} {} l\n", fmt_pt(*x), fmt_pt(height - *y)));
            }
            Command::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                push(
                    &mut out,
                    format!(
                        "{} {} {} {} {} {} c\n",
                        fmt_pt(*x1),
                        fmt_pt(height - *y1),
                        fmt_pt(*x2),
                        fmt_pt(height - *y2),
                        fmt_pt(*x),
                        fmt_pt(height - *y)
                    ),
                );
            }
            Command::ClosePath => out.extend_from_slice(b"h\n"),
            Command::Fill => out.extend_from_slice(b"f\n"),
            Command::Stroke => out.extend_from_slice(b"S\n"),
            Command::FillStroke => out.extend_from_slice(b"B\n"),
            Command::DrawRect {
                x,
                y,
                width,
                height: h,
            } => {
                push(
                    &mut out,
                    format!(
                        "{} {} {} {} re\n",
                        fmt_pt(*x),
                        fmt_pt(height - *y - *h),
                        fmt_pt(*width),
                        fmt_pt(*h)
                    ),
                );
            }
            Command::DrawString { x, y, text } => {
                let tag = font_tags
                    .get(&font_name)
                    .map(|t| t.as_str())
                    .unwrap_or("F1");
                // Recorded y is the top of the text box; the baseline sits
                // one em below it.
                let baseline = height - *y - font_size;
                push(
                    &mut out,
                    format!(
                        "BT /{} {} Tf {} {} Td (",
                        tag,
                        fmt_pt(font_size),
                        fmt_pt(*x),
                        fmt_pt(baseline)
                    ),
                );
                encode_text(text, &mut out);
                out.extend_from_slice(b") Tj ET\n");
            }
            Command::Meta { .. } => {}
        }
    }
    out
}

/// WinAnsi-style byte encoding with escaping for the string delimiters.
/// Characters with no byte representation degrade to '?'.
fn encode_text(text: &str, out: &mut Vec<u8>) {
    for ch in text.chars() {
        let byte = match ch {
            '\u{20AC}' => Some(0x80),
            '\u{2026}' => Some(0x85),
            '\u{2018}' => Some(0x91),
            '\u{2019}' => Some(0x92),
            '\u{201C}' => Some(0x93),
            '\u{201D}' => Some(0x94),
            '\u{2022}' => Some(0x95),
            '\u{2013}' => Some(0x96),
            '\u{2014}' => Some(0x97),
            c if (c as u32) >= 0x20 && (c as u32) <= 0x7E => Some(c as u8),
            c if (c as u32) >= 0xA0 && (c as u32) <= 0xFF => Some(c as u32 as u8),
            _ => None,
        };
        match byte {
            Some(b'(') => out.extend_from_slice(b"\\("),
            Some(b')') => out.extend_from_slice(b"\\)"),
            Some(b'\\') => out.extend_from_slice(b"\\\\"),
            Some(b) => out.push(b),
            None => out.push(b'?'),
        }
    }
}

fn fmt_pt(value: Pt) -> String {
    let milli = value.to_milli_i64();
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let int = abs / 1000;
    let frac = abs % 1000;
    if frac == 0 {
        format!("{}{}", sign, int)
    } else {
        let frac_str = format!("{:03}", frac);
        format!("{}{}.{}", sign, int, frac_str.trim_end_matches('0'))
    }
}

fn fmt_component(value: f32) -> String {
    let clamped = value.clamp(0.0, 1.0);
    let milli = (clamped * 1000.0).round() as i64;
    fmt_pt(Pt::from_milli_i64(milli))
}
