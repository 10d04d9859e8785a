use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Width of `text` at `font_size` in the first resolvable face of
/// `font_family` (a CSS-style family list). None when no face resolves.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

/// Like [`measure_text_width`] but always answers, falling back to a flat
/// per-character estimate when the font stack is unavailable.
pub fn text_width(text: &str, font_size: f32, font_family: &str) -> f32 {
    measure_text_width(text, font_size, font_family)
        .unwrap_or_else(|| text.chars().count() as f32 * font_size * 0.56)
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    cache: HashMap<String, Option<FaceMetrics>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            cache: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let family_key = normalize_family_key(font_family);
        if !self.cache.contains_key(&family_key) {
            let metrics = self.load_metrics(font_family);
            self.cache.insert(family_key.clone(), metrics);
        }
        let metrics = self.cache.get(&family_key)?.as_ref()?;
        let normalized = text.replace('\t', "    ");
        Some(metrics.measure_width(&normalized, font_size))
    }

    fn load_metrics(&mut self, font_family: &str) -> Option<FaceMetrics> {
        let mut names: Vec<String> = Vec::new();
        let mut generics: Vec<Family<'static>> = Vec::new();
        let mut order: Vec<bool> = Vec::new(); // true = named, false = generic
        for part in font_family.split(',') {
            let raw = part.trim().trim_matches('"').trim_matches('\'');
            if raw.is_empty() {
                continue;
            }
            match raw.to_ascii_lowercase().as_str() {
                "serif" => {
                    generics.push(Family::Serif);
                    order.push(false);
                }
                "sans-serif" => {
                    generics.push(Family::SansSerif);
                    order.push(false);
                }
                "monospace" | "ui-monospace" => {
                    generics.push(Family::Monospace);
                    order.push(false);
                }
                "cursive" => {
                    generics.push(Family::Cursive);
                    order.push(false);
                }
                "fantasy" => {
                    generics.push(Family::Fantasy);
                    order.push(false);
                }
                "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    generics.push(Family::SansSerif);
                    order.push(false);
                }
                _ => {
                    names.push(raw.to_string());
                    order.push(true);
                }
            }
        }

        let mut families: Vec<Family<'_>> = Vec::with_capacity(order.len());
        let mut name_iter = names.iter();
        let mut generic_iter = generics.iter();
        for is_named in order {
            if is_named {
                if let Some(name) = name_iter.next() {
                    families.push(Family::Name(name.as_str()));
                }
            } else if let Some(generic) = generic_iter.next() {
                families.push(*generic);
            }
        }
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        let mut loaded: Option<FaceMetrics> = None;
        self.db.with_face_data(id, |data, index| {
            if let Ok(face) = Face::parse(data, index) {
                loaded = Some(FaceMetrics::from_face(&face));
            }
        });
        loaded
    }
}

/// Advance widths extracted once at load time so no parsed face has to be
/// kept alive between calls.
struct FaceMetrics {
    units_per_em: u16,
    ascii_advances: [u16; 128],
    average_advance: f32,
}

impl FaceMetrics {
    fn from_face(face: &Face<'_>) -> Self {
        let units_per_em = face.units_per_em().max(1);
        let mut ascii_advances = [0u16; 128];
        let mut total = 0u32;
        let mut counted = 0u32;
        for byte in 0u8..=127 {
            if let Some(glyph_id) = face.glyph_index(byte as char) {
                let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                ascii_advances[byte as usize] = advance;
                if advance > 0 && byte.is_ascii_graphic() {
                    total += advance as u32;
                    counted += 1;
                }
            }
        }
        let average_advance = if counted > 0 {
            total as f32 / counted as f32
        } else {
            units_per_em as f32 * 0.56
        };
        Self {
            units_per_em,
            ascii_advances,
            average_advance,
        }
    }

    fn measure_width(&self, text: &str, font_size: f32) -> f32 {
        let scale = font_size / self.units_per_em as f32;
        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let advance = if ch.is_ascii() {
                let advance = self.ascii_advances[ch as usize];
                if advance > 0 {
                    advance as f32
                } else {
                    self.average_advance
                }
            } else {
                // Non-ASCII glyphs are approximated; member rows are almost
                // always identifiers.
                self.average_advance
            };
            width += advance * scale;
        }
        width.max(0.0)
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}
