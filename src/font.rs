use crate::error::ReportError;
use crate::types::Pt;
use rustybuzz::{Face as HbFace, UnicodeBuffer};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct TextWidthKey {
    font_index: usize,
    size_milli: i64,
    text: String,
}

#[derive(Debug)]
struct TextWidthCache {
    map: HashMap<TextWidthKey, Pt>,
    order: VecDeque<TextWidthKey>,
    max_entries: usize,
}

impl TextWidthCache {
    fn new(max_entries: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            max_entries,
        }
    }

    fn get(&self, key: &TextWidthKey) -> Option<Pt> {
        self.map.get(key).copied()
    }

    fn insert(&mut self, key: TextWidthKey, value: Pt) {
        if self.map.contains_key(&key) {
            return;
        }
        self.map.insert(key.clone(), value);
        self.order.push_back(key);
        while self.map.len() > self.max_entries {
            if let Some(old) = self.order.pop_front() {
                self.map.remove(&old);
            } else {
                break;
            }
        }
    }
}

/// Registry shared by measurement and painting. Both operations resolve
/// through the same handle, so a card can never be measured with one font and
/// painted with another.
#[derive(Debug)]
pub struct FontRegistry {
    fonts: Vec<RegisteredFont>,
    lookup: HashMap<String, usize>,
    text_width_cache: Mutex<TextWidthCache>,
}

#[derive(Debug)]
pub(crate) struct RegisteredFont {
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
    pub(crate) metrics: FontMetrics,
}

#[derive(Debug)]
pub(crate) struct FontMetrics {
    pub(crate) first_char: u8,
    pub(crate) last_char: u8,
    /// Advance widths in 1/1000 em units, indexed by Latin-1 codepoint
    /// starting at `first_char`.
    pub(crate) widths: Vec<u16>,
    pub(crate) ascent: i16,
    pub(crate) descent: i16,
    pub(crate) line_gap: i16,
    pub(crate) cap_height: i16,
    pub(crate) italic_angle: i16,
    pub(crate) stem_v: i16,
    pub(crate) bbox: (i16, i16, i16, i16),
    pub(crate) missing_width: u16,
    pub(crate) is_fixed_pitch: bool,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        Self {
            fonts: Vec::new(),
            lookup: HashMap::new(),
            text_width_cache: Mutex::new(TextWidthCache::new(20_000)),
        }
    }

    pub fn register_file(&mut self, path: impl AsRef<Path>) -> Result<String, ReportError> {
        let path = path.as_ref();
        let data = fs::read(path)
            .map_err(|err| ReportError::Asset(format!("cannot read font {path:?}: {err}")))?;
        self.register_bytes(data, path.to_str())
    }

    pub fn register_bytes(
        &mut self,
        data: Vec<u8>,
        source_name: Option<&str>,
    ) -> Result<String, ReportError> {
        let source = source_name.unwrap_or("EmbeddedFont");
        let Ok(face) = ttf_parser::Face::parse(&data, 0) else {
            return Err(ReportError::Asset(format!(
                "invalid font data for {source}"
            )));
        };
        if face.tables().glyf.is_none() {
            // The embedder writes FontFile2 (glyf) programs only.
            return Err(ReportError::Asset(format!(
                "{source}: CFF-outline fonts are not supported, use a TrueType font"
            )));
        }

        let (name, aliases) = font_names(&face, Path::new(source));
        let metrics = FontMetrics::from_face(&face);
        let index = self.fonts.len();
        self.fonts.push(RegisteredFont {
            name: name.clone(),
            data,
            metrics,
        });

        let mut all_aliases = vec![name.clone()];
        all_aliases.extend(aliases);
        for alias in all_aliases {
            let key = normalize_name(&alias);
            if key.is_empty() || self.lookup.contains_key(&key) {
                continue;
            }
            self.lookup.insert(key, index);
        }

        Ok(name)
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<&RegisteredFont> {
        let key = normalize_name(name);
        self.lookup
            .get(&key)
            .and_then(|index| self.fonts.get(*index))
    }

    /// Rendered advance width of `text`. Unregistered names fall back to a
    /// deterministic 0.6 em per character, matching the base-14 path used by
    /// the PDF writer.
    pub fn measure_text_width(&self, name: &str, font_size: Pt, text: &str) -> Pt {
        let key = normalize_name(name);
        let Some(index) = self.lookup.get(&key).copied() else {
            return fallback_width(font_size, text);
        };
        let cache_key = TextWidthKey {
            font_index: index,
            size_milli: font_size.to_milli_i64(),
            text: text.to_string(),
        };
        if let Ok(mut cache) = self.text_width_cache.lock() {
            if let Some(value) = cache.get(&cache_key) {
                return value;
            }
        }
        let Some(font) = self.fonts.get(index) else {
            return fallback_width(font_size, text);
        };
        let value = if font.metrics.is_within_table(text) {
            font.metrics.measure_text_width(font_size, text)
        } else {
            measure_text_width_shaped(font, font_size, text)
                .unwrap_or_else(|| font.metrics.measure_text_width(font_size, text))
        };
        if let Ok(mut cache) = self.text_width_cache.lock() {
            cache.insert(cache_key, value);
        }
        value
    }

    pub fn line_height(&self, name: &str, font_size: Pt, fallback: Pt) -> Pt {
        let Some(font) = self.resolve(name) else {
            return fallback;
        };
        font.metrics.line_height(font_size).max(fallback)
    }
}

pub(crate) fn fallback_width(font_size: Pt, text: &str) -> Pt {
    let char_width = (font_size * 0.6).max(Pt::from_f32(1.0));
    char_width * (text.chars().count() as i32)
}

impl FontMetrics {
    fn from_face(face: &ttf_parser::Face<'_>) -> Self {
        let units_per_em = face.units_per_em().max(1);
        let scale = 1000.0 / units_per_em as f32;
        let first_char = 32u8;
        let last_char = 255u8;
        let widths = build_widths(face, scale, first_char, last_char);
        let missing_width = widths
            .get((b' ' - first_char) as usize)
            .copied()
            .unwrap_or(0);

        let ascent = scale_i16(face.ascender(), scale);
        let descent = scale_i16(face.descender(), scale);
        let line_gap = scale_i16(face.line_gap(), scale);
        let cap_height = face
            .capital_height()
            .map(|value| scale_i16(value, scale))
            .unwrap_or(ascent);
        let bbox = face.global_bounding_box();
        let bbox = (
            scale_i16(bbox.x_min, scale),
            scale_i16(bbox.y_min, scale),
            scale_i16(bbox.x_max, scale),
            scale_i16(bbox.y_max, scale),
        );
        let italic_angle = face
            .italic_angle()
            .map(|value| value.round() as i16)
            .unwrap_or(0);

        Self {
            first_char,
            last_char,
            widths,
            ascent,
            descent,
            line_gap,
            cap_height,
            italic_angle,
            stem_v: 80,
            bbox,
            missing_width,
            is_fixed_pitch: face.is_monospaced(),
        }
    }

    fn advance_for_char(&self, ch: char) -> u16 {
        let code = ch as u32;
        let first = self.first_char as u32;
        let last = self.last_char as u32;
        if code < first || code > last {
            return self.missing_width;
        }
        let idx = (code - first) as usize;
        self.widths.get(idx).copied().unwrap_or(self.missing_width)
    }

    fn measure_text_width(&self, font_size: Pt, text: &str) -> Pt {
        let mut total_units: i32 = 0;
        for ch in text.chars() {
            total_units = total_units.saturating_add(self.advance_for_char(ch) as i32);
        }
        if total_units <= 0 {
            return Pt::ZERO;
        }
        font_size.mul_ratio(total_units, 1000)
    }

    fn is_within_table(&self, text: &str) -> bool {
        let first = self.first_char as u32;
        let last = self.last_char as u32;
        text.chars().all(|ch| {
            let code = ch as u32;
            code >= first && code <= last
        })
    }

    fn line_height(&self, font_size: Pt) -> Pt {
        let height_1000 = self.ascent as i32 - self.descent as i32 + self.line_gap as i32;
        if height_1000 <= 0 {
            return Pt::ZERO;
        }
        font_size.mul_ratio(height_1000, 1000)
    }
}

fn build_widths(face: &ttf_parser::Face<'_>, scale: f32, first: u8, last: u8) -> Vec<u16> {
    let mut widths = Vec::with_capacity((last - first + 1) as usize);
    for code in first..=last {
        let width = char::from_u32(code as u32)
            .and_then(|ch| face.glyph_index(ch))
            .and_then(|id| face.glyph_hor_advance(id))
            .unwrap_or(0);
        let scaled = (width as f32 * scale).round() as i32;
        widths.push(scaled.clamp(0, u16::MAX as i32) as u16);
    }
    widths
}

// Shaping path for runs outside the Latin-1 width table.
fn measure_text_width_shaped(font: &RegisteredFont, font_size: Pt, text: &str) -> Option<Pt> {
    let face = HbFace::from_slice(&font.data, 0)?;
    let units_per_em = face.units_per_em().max(1) as i64;

    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(text);
    let output = rustybuzz::shape(&face, &[], buffer);
    let positions = output.glyph_positions();
    if positions.is_empty() {
        return None;
    }
    let mut total_units: i32 = 0;
    for pos in positions {
        let adv = (((pos.x_advance as i64) * 1000 + (units_per_em / 2)) / units_per_em) as i32;
        total_units = total_units.saturating_add(adv);
    }
    if total_units <= 0 {
        return Some(Pt::ZERO);
    }
    Some(font_size.mul_ratio(total_units, 1000))
}

fn scale_i16(value: i16, scale: f32) -> i16 {
    let scaled = (value as f32 * scale).round() as i32;
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn font_names(face: &ttf_parser::Face<'_>, path: &Path) -> (String, Vec<String>) {
    use ttf_parser::name::name_id;

    let mut family = None;
    let mut full = None;
    let mut post = None;

    for entry in face.names() {
        let Some(name) = entry.to_string() else {
            continue;
        };
        match entry.name_id {
            name_id::TYPOGRAPHIC_FAMILY | name_id::FAMILY => {
                if family.is_none() {
                    family = Some(name);
                }
            }
            name_id::FULL_NAME => {
                if full.is_none() {
                    full = Some(name);
                }
            }
            name_id::POST_SCRIPT_NAME => {
                if post.is_none() {
                    post = Some(name);
                }
            }
            _ => {}
        }
    }

    let stem = path
        .file_stem()
        .and_then(|v| v.to_str())
        .map(|v| v.to_string());
    let primary = post
        .clone()
        .or_else(|| full.clone())
        .or_else(|| family.clone())
        .or_else(|| stem.clone())
        .unwrap_or_else(|| "EmbeddedFont".to_string());

    let mut aliases = Vec::new();
    for candidate in [family, full, post, stem].into_iter().flatten() {
        if candidate != primary {
            aliases.push(candidate);
        }
    }

    (primary, aliases)
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_font_uses_deterministic_fallback() {
        let registry = FontRegistry::new();
        let size = Pt::from_f32(10.0);
        let w = registry.measure_text_width("Helvetica", size, "abcd");
        assert_eq!(w.to_milli_i64(), 4 * 6_000);
        // Measurement is a pure function of (font, size, text).
        assert_eq!(registry.measure_text_width("Helvetica", size, "abcd"), w);
    }

    #[test]
    fn line_height_falls_back_when_unresolved() {
        let registry = FontRegistry::new();
        let fallback = Pt::from_f32(12.0);
        assert_eq!(
            registry.line_height("Nope", Pt::from_f32(10.0), fallback),
            fallback
        );
    }

    #[test]
    fn invalid_font_bytes_are_a_fatal_asset_error() {
        let mut registry = FontRegistry::new();
        let err = registry
            .register_bytes(vec![0, 1, 2, 3], Some("broken.ttf"))
            .unwrap_err();
        assert!(matches!(err, ReportError::Asset(_)));
    }
}
