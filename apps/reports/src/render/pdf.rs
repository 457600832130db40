//! Serializes page plans into PDF bytes with `pdf-writer`.
//!
//! TrueType faces are embedded whole as CID fonts (Identity-H, glyph ids as
//! two-byte codes) with a ToUnicode map so text stays searchable. Built-in
//! faces are plain Type1 references in WinAnsiEncoding. Every stream is
//! Flate-compressed.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use miniz_oxide::deflate::compress_to_vec_zlib;
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo, UnicodeCmap};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::layout::font_metrics::encode_winansi;
use crate::render::fonts::{FontFace, FontFamily, FontRole, TrueTypeFont};
use crate::render::images::DecodedImage;
use crate::render::plan::{Op, PagePlan, Paint, Shape, TextOp};

const COMPRESSION_LEVEL: u8 = 6;
/// Bézier control distance for a quarter circle of radius 1.
const KAPPA: f32 = 0.552_284_8;

const IDENTITY_INFO: SystemInfo<'static> = SystemInfo {
    registry: Str(b"Adobe"),
    ordering: Str(b"Identity"),
    supplement: 0,
};

struct RefAlloc(i32);

impl RefAlloc {
    fn bump(&mut self) -> Ref {
        self.0 += 1;
        Ref::new(self.0)
    }
}

/// A font resource used somewhere in the document.
struct FontSlot {
    name: String,
    id: Ref,
    /// Glyph id → (char, advance). Only filled for TrueType faces.
    glyphs: BTreeMap<u16, (char, f32)>,
}

struct Resources {
    fonts: HashMap<FontRole, FontSlot>,
    images: HashMap<PathBuf, (String, Ref)>,
    states: BTreeMap<u32, (String, Ref)>,
}

impl Resources {
    fn font_name(&mut self, role: FontRole, alloc: &mut RefAlloc) -> String {
        let next = self.fonts.len() + 1;
        self.fonts
            .entry(role)
            .or_insert_with(|| FontSlot {
                name: format!("F{next}"),
                id: alloc.bump(),
                glyphs: BTreeMap::new(),
            })
            .name
            .clone()
    }

    /// Name of the graphics state carrying `alpha`, or `None` for opaque drawing.
    fn state_name(&mut self, alpha: f32, alloc: &mut RefAlloc) -> Option<String> {
        if alpha >= 0.999 {
            return None;
        }
        let key = (alpha.clamp(0.0, 1.0) * 1000.0).round() as u32;
        let next = self.states.len() + 1;
        let (name, _) = self
            .states
            .entry(key)
            .or_insert_with(|| (format!("Gs{next}"), alloc.bump()));
        Some(name.clone())
    }
}

/// Writes `pages` (at least one page is always emitted) and returns the file bytes.
pub fn write_pdf(pages: &[PagePlan], fonts: &FontFamily, size: (f32, f32), title: &str) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let mut alloc = RefAlloc(0);
    let catalog_id = alloc.bump();
    let pages_id = alloc.bump();
    let info_id = alloc.bump();

    let mut resources = Resources {
        fonts: HashMap::new(),
        images: HashMap::new(),
        states: BTreeMap::new(),
    };

    let blank = [PagePlan::default()];
    let pages = if pages.is_empty() { &blank[..] } else { pages };

    let mut page_ids = Vec::with_capacity(pages.len());
    let mut content_ids = Vec::with_capacity(pages.len());
    for plan in pages {
        let page_id = alloc.bump();
        let content_id = alloc.bump();
        let mut content = Content::new();
        for op in &plan.ops {
            draw_op(&mut pdf, &mut content, op, fonts, &mut resources, &mut alloc);
        }
        let raw = content.finish();
        let compressed = compress_to_vec_zlib(raw.as_slice(), COMPRESSION_LEVEL);
        pdf.stream(content_id, &compressed).filter(Filter::FlateDecode);
        page_ids.push(page_id);
        content_ids.push(content_id);
    }

    for (role, slot) in &resources.fonts {
        match fonts.face(*role) {
            FontFace::TrueType(font) => write_truetype(&mut pdf, &mut alloc, slot, font),
            FontFace::Builtin(font) => {
                pdf.type1_font(slot.id)
                    .base_font(Name(font.base_name()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
            }
        }
    }

    for (key, (_, id)) in &resources.states {
        let alpha = *key as f32 / 1000.0;
        pdf.ext_graphics(*id)
            .non_stroking_alpha(alpha)
            .stroking_alpha(alpha);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);
    pdf.document_info(info_id)
        .title(TextStr(title))
        .producer(TextStr("arcana-reports"));

    let (width, height) = size;
    for (page_id, content_id) in page_ids.iter().zip(&content_ids) {
        let mut page = pdf.page(*page_id);
        page.media_box(Rect::new(0.0, 0.0, width, height))
            .parent(pages_id)
            .contents(*content_id);
        let mut page_resources = page.resources();
        {
            let mut font_dict = page_resources.fonts();
            for slot in resources.fonts.values() {
                font_dict.pair(Name(slot.name.as_bytes()), slot.id);
            }
        }
        if !resources.images.is_empty() {
            let mut xobjects = page_resources.x_objects();
            for (name, id) in resources.images.values() {
                xobjects.pair(Name(name.as_bytes()), *id);
            }
        }
        if !resources.states.is_empty() {
            let mut states = page_resources.ext_g_states();
            for (name, id) in resources.states.values() {
                states.pair(Name(name.as_bytes()), *id);
            }
        }
    }

    pdf.finish()
}

// ────────────────────────────────────────────────────────────────────────────
// Drawing
// ────────────────────────────────────────────────────────────────────────────

fn draw_op(
    pdf: &mut Pdf,
    content: &mut Content,
    op: &Op,
    fonts: &FontFamily,
    resources: &mut Resources,
    alloc: &mut RefAlloc,
) {
    match op {
        Op::Image {
            path,
            image,
            x,
            y,
            width,
            height,
            alpha,
            ..
        } => {
            let name = match resources.images.get(path) {
                Some((name, _)) => name.clone(),
                None => {
                    let name = format!("Im{}", resources.images.len() + 1);
                    let id = write_image(pdf, alloc, image);
                    resources.images.insert(path.clone(), (name.clone(), id));
                    name
                }
            };
            content.save_state();
            if let Some(state) = resources.state_name(*alpha, alloc) {
                content.set_parameters(Name(state.as_bytes()));
            }
            content.transform([*width, 0.0, 0.0, *height, *x, *y]);
            content.x_object(Name(name.as_bytes()));
            content.restore_state();
        }
        Op::Shape { shape, paint, alpha } => {
            content.save_state();
            if let Some(state) = resources.state_name(*alpha, alloc) {
                content.set_parameters(Name(state.as_bytes()));
            }
            match paint {
                Paint::Fill(color) => {
                    let [r, g, b] = color.unit();
                    content.set_fill_rgb(r, g, b);
                }
                Paint::Stroke { color, width } => {
                    let [r, g, b] = color.unit();
                    content.set_stroke_rgb(r, g, b);
                    content.set_line_width(*width);
                }
            }
            trace_shape(content, shape);
            match paint {
                Paint::Fill(_) => content.fill_nonzero(),
                Paint::Stroke { .. } => content.stroke(),
            };
            content.restore_state();
        }
        Op::Text(text) => draw_text(content, text, fonts, resources, alloc),
    }
}

fn draw_text(
    content: &mut Content,
    text: &TextOp,
    fonts: &FontFamily,
    resources: &mut Resources,
    alloc: &mut RefAlloc,
) {
    if text.text.is_empty() {
        return;
    }
    let name = resources.font_name(text.font, alloc);
    let encoded = match fonts.face(text.font) {
        FontFace::TrueType(font) => {
            let glyphs = font.glyphs(&text.text);
            let mut bytes = Vec::with_capacity(glyphs.len() * 2);
            if let Some(slot) = resources.fonts.get_mut(&text.font) {
                for (c, gid, advance) in glyphs {
                    slot.glyphs.entry(gid).or_insert((c, advance));
                    bytes.extend_from_slice(&gid.to_be_bytes());
                }
            }
            bytes
        }
        FontFace::Builtin(_) => encode_winansi(&text.text),
    };

    content.save_state();
    if let Some(state) = resources.state_name(text.alpha, alloc) {
        content.set_parameters(Name(state.as_bytes()));
    }
    let [r, g, b] = text.color.unit();
    content.set_fill_rgb(r, g, b);
    content.begin_text();
    content.set_font(Name(name.as_bytes()), text.size);
    content.next_line(text.x, text.y);
    content.show(Str(&encoded));
    content.end_text();
    content.restore_state();
}

fn trace_shape(content: &mut Content, shape: &Shape) {
    match *shape {
        Shape::Rect {
            x,
            y,
            width,
            height,
        } => {
            content.rect(x, y, width, height);
        }
        Shape::RoundedRect {
            x,
            y,
            width,
            height,
            radius,
        } => rounded_rect(content, x, y, width, height, radius),
        Shape::Circle { cx, cy, radius } => rounded_rect(
            content,
            cx - radius,
            cy - radius,
            radius * 2.0,
            radius * 2.0,
            radius,
        ),
        Shape::Star {
            cx,
            cy,
            outer,
            inner,
        } => {
            for i in 0..10 {
                let radius = if i % 2 == 0 { outer } else { inner };
                let angle = std::f32::consts::FRAC_PI_2 + i as f32 * std::f32::consts::PI / 5.0;
                let (px, py) = (cx + radius * angle.cos(), cy + radius * angle.sin());
                if i == 0 {
                    content.move_to(px, py);
                } else {
                    content.line_to(px, py);
                }
            }
            content.close_path();
        }
        Shape::Line { x1, y1, x2, y2 } => {
            content.move_to(x1, y1);
            content.line_to(x2, y2);
        }
    }
}

fn rounded_rect(content: &mut Content, x: f32, y: f32, w: f32, h: f32, radius: f32) {
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    let k = r * KAPPA;
    content.move_to(x + r, y);
    content.line_to(x + w - r, y);
    content.cubic_to(x + w - r + k, y, x + w, y + r - k, x + w, y + r);
    content.line_to(x + w, y + h - r);
    content.cubic_to(x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h);
    content.line_to(x + r, y + h);
    content.cubic_to(x + r - k, y + h, x, y + h - r + k, x, y + h - r);
    content.line_to(x, y + r);
    content.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    content.close_path();
}

// ────────────────────────────────────────────────────────────────────────────
// Embedded objects
// ────────────────────────────────────────────────────────────────────────────

fn write_image(pdf: &mut Pdf, alloc: &mut RefAlloc, image: &DecodedImage) -> Ref {
    let id = alloc.bump();
    let mask_id = image.alpha.as_ref().map(|alpha| {
        let mask_id = alloc.bump();
        let compressed = compress_to_vec_zlib(alpha, COMPRESSION_LEVEL);
        let mut mask = pdf.image_xobject(mask_id, &compressed);
        mask.filter(Filter::FlateDecode);
        mask.width(image.width as i32);
        mask.height(image.height as i32);
        mask.color_space().device_gray();
        mask.bits_per_component(8);
        mask_id
    });

    let compressed = compress_to_vec_zlib(&image.rgb, COMPRESSION_LEVEL);
    let mut xobject = pdf.image_xobject(id, &compressed);
    xobject.filter(Filter::FlateDecode);
    xobject.width(image.width as i32);
    xobject.height(image.height as i32);
    xobject.color_space().device_rgb();
    xobject.bits_per_component(8);
    if let Some(mask_id) = mask_id {
        xobject.s_mask(mask_id);
    }
    id
}

fn write_truetype(pdf: &mut Pdf, alloc: &mut RefAlloc, slot: &FontSlot, font: &TrueTypeFont) {
    let cid_id = alloc.bump();
    let descriptor_id = alloc.bump();
    let file_id = alloc.bump();
    let cmap_id = alloc.bump();
    let base_font = Name(font.name.as_bytes());

    pdf.type0_font(slot.id)
        .base_font(base_font)
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_id)
        .to_unicode(cmap_id);

    {
        let mut cid = pdf.cid_font(cid_id);
        cid.subtype(CidFontType::Type2)
        .base_font(base_font)
            .system_info(IDENTITY_INFO)
            .font_descriptor(descriptor_id)
            .default_width(0.0)
            .cid_to_gid_map_predefined(Name(b"Identity"));
        let mut widths = cid.widths();
        for (gid, (_, advance)) in &slot.glyphs {
            widths.consecutive(*gid, [*advance]);
        }
    }

    let [x_min, y_min, x_max, y_max] = font.bbox;
    pdf.font_descriptor(descriptor_id)
        .name(base_font)
        .flags(FontFlags::NON_SYMBOLIC)
        .bbox(Rect::new(x_min, y_min, x_max, y_max))
        .italic_angle(0.0)
        .ascent(font.ascent)
        .descent(font.descent)
        .cap_height(font.cap_height)
        .stem_v(80.0)
        .font_file2(file_id);

    let compressed = compress_to_vec_zlib(font.data(), COMPRESSION_LEVEL);
    {
        let mut file = pdf.stream(file_id, &compressed);
        file.filter(Filter::FlateDecode);
        file.pair(Name(b"Length1"), font.data().len() as i32);
    }

    let mut cmap = UnicodeCmap::new(Name(b"Arcana-UCS"), IDENTITY_INFO);
    for (gid, (c, _)) in &slot.glyphs {
        cmap.pair(*gid, *c);
    }
    pdf.cmap(cmap_id, &cmap.finish());
}
