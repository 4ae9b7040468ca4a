use std::{borrow::Cow, collections::HashMap, path::Path, sync::Mutex};

use anyhow::Context as _;

use crate::{
    effects::raster::{GlyphMask, HAlign, TextLayoutRequest, TextRasterizer},
    foundation::error::{MontageError, MontageResult},
};

const FONT_EXTENSIONS: [&str; 4] = ["ttf", "otf", "ttc", "otc"];

/// Shapes text with `parley` and fills the glyph outlines with `vello_cpu`.
///
/// Fonts come from the system collection plus anything registered explicitly. A
/// requested family that does not resolve falls back to the first registered family,
/// then to the generic `sans-serif`.
pub struct FontRasterizer {
    inner: Mutex<Inner>,
}

struct Inner {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    fallback_family: Option<String>,
    outlines: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
}

impl std::fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRasterizer").finish_non_exhaustive()
    }
}

impl Default for FontRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRasterizer {
    /// Rasterizer over the system font collection.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                font_ctx: parley::FontContext::default(),
                layout_ctx: parley::LayoutContext::new(),
                fallback_family: None,
                outlines: HashMap::new(),
            }),
        }
    }

    /// Register raw font data; returns the family names it provides.
    pub fn register_font_bytes(&self, bytes: Vec<u8>) -> MontageResult<Vec<String>> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| MontageError::poisoned("font rasterizer"))?;
        let inner = &mut *guard;

        let families = inner
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes), None);
        let mut names = Vec::with_capacity(families.len());
        for (id, _) in &families {
            if let Some(name) = inner.font_ctx.collection.family_name(*id) {
                names.push(name.to_string());
            }
        }
        if names.is_empty() {
            return Err(MontageError::validation("font data holds no font families"));
        }
        if inner.fallback_family.is_none() {
            inner.fallback_family = names.first().cloned();
        }
        tracing::debug!(families = ?names, "registered fonts");
        Ok(names)
    }

    /// Register every font file directly inside `dir`. Files that are not fonts are
    /// skipped with a warning. Returns the number of files registered.
    pub fn register_font_dir(&self, dir: &Path) -> MontageResult<usize> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("read font dir '{}'", dir.display()))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("read font dir '{}'", dir.display()))?
                .path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if is_font {
                paths.push(path);
            }
        }
        paths.sort();

        let mut registered = 0;
        for path in paths {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("read font '{}'", path.display()))?;
            match self.register_font_bytes(bytes) {
                Ok(_) => registered += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping font"),
            }
        }
        Ok(registered)
    }
}

impl TextRasterizer for FontRasterizer {
    fn rasterize(&self, req: &TextLayoutRequest<'_>) -> MontageResult<GlyphMask> {
        if req.text.is_empty() {
            return Ok(GlyphMask::empty());
        }
        if !req.size_px.is_finite() || req.size_px <= 0.0 {
            return Err(MontageError::effect("text size must be finite and > 0"));
        }
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| MontageError::poisoned("font rasterizer"))?;
        let inner = &mut *guard;

        let stack = font_stack(req.font, inner.fallback_family.as_deref());
        let mut builder = inner
            .layout_ctx
            .ranged_builder(&mut inner.font_ctx, req.text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(stack)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(req.size_px));
        let mut layout: parley::Layout<()> = builder.build(req.text);

        let max_width = req.wrap_width.map(|w| w as f32);
        layout.break_all_lines(max_width);
        layout.align(
            max_width,
            alignment(req.align),
            parley::AlignmentOptions::default(),
        );

        // A wrapped block spans the wrap width so alignment survives placement; an
        // unbreakable word may still overhang it.
        let width = layout.width().max(max_width.unwrap_or(0.0)).ceil();
        let height = layout.height().ceil();
        if width < 1.0 || height < 1.0 {
            return Ok(GlyphMask::empty());
        }
        let (w, h) = (surface_extent(width)?, surface_extent(height)?);

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let source = run.run().font();
                let font = inner
                    .outlines
                    .entry((source.data.id(), source.index))
                    .or_insert_with(|| {
                        vello_cpu::peniko::FontData::new(
                            vello_cpu::peniko::Blob::from(source.data.data().to_vec()),
                            source.index,
                        )
                    })
                    .clone();

                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        // Painted white, so premultiplied alpha is the coverage.
        let coverage = pixmap
            .data_as_u8_slice()
            .chunks_exact(4)
            .map(|px| f32::from(px[3]) / 255.0)
            .collect();
        GlyphMask::new(u32::from(w), u32::from(h), coverage)
    }
}

/// CSS-style family list: the requested family, the registered fallback, `sans-serif`.
fn font_stack(requested: &str, fallback: Option<&str>) -> String {
    let mut families: Vec<String> = [Some(requested), fallback]
        .into_iter()
        .flatten()
        .map(|name| name.trim().replace('"', ""))
        .filter(|name| !name.is_empty())
        .map(|name| format!("\"{name}\""))
        .collect();
    families.dedup();
    families.push("sans-serif".to_string());
    families.join(", ")
}

fn alignment(align: HAlign) -> parley::Alignment {
    match align {
        HAlign::Left => parley::Alignment::Start,
        HAlign::Center => parley::Alignment::Center,
        HAlign::Right => parley::Alignment::End,
    }
}

fn surface_extent(px: f32) -> MontageResult<u16> {
    if px > f32::from(u16::MAX) {
        return Err(MontageError::effect(format!(
            "text block of {px} px exceeds the raster surface limit"
        )));
    }
    Ok(px as u16)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/font.rs"]
mod tests;
