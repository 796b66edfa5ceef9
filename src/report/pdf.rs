// src/report/pdf.rs
//! Paginated report output.
//!
//! Layout happens first, into pages of absolutely positioned elements, so the
//! running footer can show the final page count. The finished layout is then
//! written out with printpdf's built-in Helvetica faces. Photos and
//! visualizations are embedded when they can be read, otherwise their path is
//! printed instead.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::warn;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfLayerReference,
    Rect, Rgb,
};

use crate::errors::{DesignerError, truncate_chars};
use crate::models::{DesignReport, title_case};
use crate::report::sanitize::sanitize_text;
use crate::report::{
    COLOR_PREVIEW, FURNITURE_PREVIEW, OPPORTUNITY_PREVIEW, PRODUCT_PREVIEW, PROMPT_PREVIEW_CHARS,
    RenderContext, STRENGTH_PREVIEW,
};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const SIDE_MARGIN: f32 = 10.0;
pub const TOP_MARGIN: f32 = 20.0;
pub const BOTTOM_MARGIN: f32 = 15.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * SIDE_MARGIN;
const HEADER_TEXT: &str = "Interior Design AI Report";
/// Rendered widths for room photos and generated visualizations.
pub const PHOTO_WIDTH: f32 = 100.0;
pub const VISUALIZATION_WIDTH: f32 = 150.0;
const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.52;

pub type Rgb8 = (u8, u8, u8);

const BLACK: Rgb8 = (0, 0, 0);
const WHITE: Rgb8 = (255, 255, 255);
const GRAY: Rgb8 = (128, 128, 128);
const DARK_GRAY: Rgb8 = (80, 80, 80);
const SECTION_BLUE: Rgb8 = (0, 51, 102);
const SUBSECTION_GRAY: Rgb8 = (51, 51, 51);

/// Badge colors keyed by priority label; anything unrecognised is gray.
pub fn badge_color(priority: &str) -> Rgb8 {
    match priority {
        "high" => (220, 53, 69),
        "medium" => (255, 193, 7),
        "low" => (40, 167, 69),
        _ => GRAY,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// `y` is the baseline, measured in mm from the top edge.
    Text {
        x: f32,
        y: f32,
        size: f32,
        style: FontStyle,
        color: Rgb8,
        text: String,
    },
    /// `y` is the top edge, measured in mm from the top of the page.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb8,
    },
    /// Image file scaled into the box; `y` is the top edge.
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Estimated rendered width of `text` in mm.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * PT_TO_MM * AVG_GLYPH_EM
}

/// Greedy word wrap to `max_chars` per line; overlong words are split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let word: String = word.into_iter().collect();
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Flowing layout with a cursor that breaks onto new pages.
pub struct Layout {
    pages: Vec<Page>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            y: TOP_MARGIN,
        }
    }

    fn add_page(&mut self) {
        self.pages.push(Page::default());
        self.y = TOP_MARGIN;
    }

    fn current(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn ensure_space(&mut self, height: f32) {
        if self.pages.is_empty() || self.y + height > PAGE_HEIGHT - BOTTOM_MARGIN {
            self.add_page();
        }
    }

    fn ln(&mut self, height: f32) {
        self.y += height;
    }

    /// Every string reaching the page passes through the sanitizer here.
    fn push_text(&mut self, x: f32, line_height: f32, size: f32, style: FontStyle, color: Rgb8, text: &str) {
        let baseline = self.y + line_height * 0.75;
        let text = sanitize_text(text);
        self.current().elements.push(Element::Text {
            x,
            y: baseline,
            size,
            style,
            color,
            text,
        });
    }

    fn push_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb8) {
        self.current().elements.push(Element::Rect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn line(&mut self, x: f32, line_height: f32, size: f32, style: FontStyle, color: Rgb8, text: &str) {
        self.ensure_space(line_height);
        self.push_text(x, line_height, size, style, color, text);
        self.ln(line_height);
    }

    fn centered(&mut self, line_height: f32, size: f32, style: FontStyle, color: Rgb8, text: &str) {
        let width = text_width(&sanitize_text(text), size);
        let x = ((PAGE_WIDTH - width) / 2.0).max(SIDE_MARGIN);
        self.line(x, line_height, size, style, color, text);
    }

    fn paragraph(&mut self, x: f32, line_height: f32, size: f32, style: FontStyle, color: Rgb8, text: &str) {
        let available = PAGE_WIDTH - SIDE_MARGIN - x;
        let max_chars = (available / (size * PT_TO_MM * AVG_GLYPH_EM)) as usize;
        for line in wrap(&sanitize_text(text), max_chars) {
            self.line(x, line_height, size, style, color, &line);
        }
    }

    fn section_header(&mut self, title: &str) {
        self.ln(5.0);
        self.line(SIDE_MARGIN, 10.0, 16.0, FontStyle::Bold, SECTION_BLUE, title);
        let y = self.y;
        self.push_rect(SIDE_MARGIN, y, CONTENT_WIDTH, 0.4, SECTION_BLUE);
        self.ln(5.0);
    }

    fn subsection_header(&mut self, title: &str) {
        self.ln(3.0);
        self.paragraph(SIDE_MARGIN, 8.0, 12.0, FontStyle::Bold, SUBSECTION_GRAY, title);
    }

    fn body_text(&mut self, text: &str) {
        self.paragraph(SIDE_MARGIN, 5.0, 10.0, FontStyle::Regular, BLACK, text);
        self.ln(2.0);
    }

    fn label(&mut self, text: &str) {
        self.line(SIDE_MARGIN, 6.0, 10.0, FontStyle::Bold, BLACK, text);
    }

    /// Bold label with the value continuing in a column to its right.
    fn labelled(&mut self, label: &str, value: &str) {
        const VALUE_X: f32 = SIDE_MARGIN + 40.0;
        self.ensure_space(6.0);
        self.push_text(SIDE_MARGIN, 6.0, 10.0, FontStyle::Bold, BLACK, label);
        self.paragraph(VALUE_X, 6.0, 10.0, FontStyle::Regular, BLACK, value);
    }

    fn bullet(&mut self, text: &str) {
        const BULLET_X: f32 = SIDE_MARGIN + 10.0;
        self.ensure_space(5.0);
        self.push_text(BULLET_X, 5.0, 10.0, FontStyle::Regular, BLACK, "-");
        self.paragraph(BULLET_X + 5.0, 5.0, 10.0, FontStyle::Regular, BLACK, text);
    }

    fn bullets(&mut self, heading: &str, items: &[String], limit: usize) {
        if items.is_empty() {
            return;
        }
        self.ln(3.0);
        self.label(heading);
        for item in items.iter().take(limit) {
            self.bullet(item);
        }
    }

    /// Centered image at `width` mm, scaled down to fit a page. Returns false
    /// when the file is missing or its header cannot be read.
    fn image(&mut self, path: &Path, width: f32) -> bool {
        let Ok((px_width, px_height)) = image::image_dimensions(path) else {
            return false;
        };
        if px_width == 0 || px_height == 0 {
            return false;
        }

        let max_height = PAGE_HEIGHT - TOP_MARGIN - BOTTOM_MARGIN;
        let mut width = width;
        let mut height = width * px_height as f32 / px_width as f32;
        if height > max_height {
            width *= max_height / height;
            height = max_height;
        }

        self.ensure_space(height);
        let y = self.y;
        self.current().elements.push(Element::Image {
            x: (PAGE_WIDTH - width) / 2.0,
            y,
            width,
            height,
            path: path.to_path_buf(),
        });
        self.ln(height + 5.0);
        true
    }

    fn priority_badge(&mut self, priority: &str) {
        const WIDTH: f32 = 20.0;
        const HEIGHT: f32 = 6.0;
        self.ensure_space(HEIGHT);
        let y = self.y;
        self.push_rect(SIDE_MARGIN, y, WIDTH, HEIGHT, badge_color(priority));

        let label = priority.to_uppercase();
        let x = SIDE_MARGIN + (WIDTH - text_width(&label, 8.0)) / 2.0;
        self.push_text(x.max(SIDE_MARGIN), HEIGHT, 8.0, FontStyle::Bold, WHITE, &label);
        self.ln(HEIGHT + 2.0);
    }

    /// Running header and `Page N/Total` footer on every page.
    fn decorate(mut self) -> Vec<Page> {
        let total = self.pages.len();
        for (index, page) in self.pages.iter_mut().enumerate() {
            page.elements.push(Element::Text {
                x: SIDE_MARGIN,
                y: 10.0 + 7.5,
                size: 8.0,
                style: FontStyle::Italic,
                color: GRAY,
                text: HEADER_TEXT.to_string(),
            });

            let footer = format!("Page {}/{}", index + 1, total);
            page.elements.push(Element::Text {
                x: (PAGE_WIDTH - text_width(&footer, 8.0)) / 2.0,
                y: PAGE_HEIGHT - 15.0 + 7.5,
                size: 8.0,
                style: FontStyle::Italic,
                color: GRAY,
                text: footer,
            });
        }
        self.pages
    }
}

/// Lay out the whole report. The result is independent of printpdf.
pub fn layout_report(report: &DesignReport, ctx: &RenderContext) -> Vec<Page> {
    let mut layout = Layout::new();

    // Title page
    layout.add_page();
    layout.ln(60.0);
    layout.centered(20.0, 28.0, FontStyle::Bold, BLACK, "Interior Design Report");
    layout.ln(10.0);
    layout.centered(10.0, 14.0, FontStyle::Regular, DARK_GRAY, &format!("Session: {}", report.session_id));
    layout.centered(10.0, 14.0, FontStyle::Regular, DARK_GRAY, &format!("Generated: {}", ctx.generated_on()));
    layout.ln(40.0);
    layout.centered(10.0, 10.0, FontStyle::Italic, DARK_GRAY, "Powered by Claude AI");

    layout.add_page();
    layout.section_header("Executive Summary");
    layout.body_text(&report.summary);

    if !report.room_analyses.is_empty() {
        layout.add_page();
        layout.section_header("Room Analysis");

        for (i, analysis) in report.room_analyses.iter().enumerate() {
            layout.subsection_header(&format!("Room {}: {}", i + 1, title_case(&analysis.room_type)));
            if let Some(image) = report.original_images.get(i) {
                if !layout.image(image, PHOTO_WIDTH) {
                    layout.labelled("Photo:", &ctx.relative(image).display().to_string());
                }
            }
            layout.labelled("Current Style:", &analysis.current_style);
            if let Some(dimensions) = &analysis.estimated_dimensions {
                layout.labelled("Dimensions:", dimensions);
            }
            layout.labelled("Lighting:", &analysis.lighting_assessment);
            if !analysis.color_palette.is_empty() {
                let colors: Vec<&str> = analysis
                    .color_palette
                    .iter()
                    .take(COLOR_PREVIEW)
                    .map(String::as_str)
                    .collect();
                layout.labelled("Colors:", &colors.join(", "));
            }
            layout.bullets("Existing Furniture:", &analysis.existing_furniture, FURNITURE_PREVIEW);
            layout.bullets("Strengths:", &analysis.strengths, STRENGTH_PREVIEW);
            layout.bullets(
                "Improvement Opportunities:",
                &analysis.improvement_opportunities,
                OPPORTUNITY_PREVIEW,
            );
            layout.ln(10.0);
        }
    }

    if !report.recommendations.is_empty() {
        layout.add_page();
        layout.section_header("Design Recommendations");

        for (i, rec) in report.recommendations.iter().enumerate() {
            layout.subsection_header(&format!("{}. {}", i + 1, title_case(&rec.category)));
            layout.priority_badge(rec.priority.as_str());

            layout.label("Current State:");
            layout.body_text(&rec.current_state);
            layout.label("Recommendation:");
            layout.body_text(&rec.recommendation);

            if let Some(cost) = &rec.estimated_cost {
                layout.labelled("Est. Cost:", cost);
            }
            layout.bullets("Suggested Products:", &rec.product_suggestions, PRODUCT_PREVIEW);
            layout.ln(8.0);
        }
    }

    if !report.generated_images.is_empty() {
        layout.add_page();
        layout.section_header("AI-Generated Visualizations");

        for image in &report.generated_images {
            layout.subsection_header(&image.description);
            if !layout.image(&image.path, VISUALIZATION_WIDTH) {
                layout.labelled("File:", &ctx.relative(&image.path).display().to_string());
            }
            layout.paragraph(
                SIDE_MARGIN,
                4.0,
                8.0,
                FontStyle::Italic,
                (100, 100, 100),
                &format!("Prompt: {}", truncate_chars(&image.prompt_used, PROMPT_PREVIEW_CHARS)),
            );
            layout.ln(10.0);
        }
    }

    layout.decorate()
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

fn pdf_color((r, g, b): Rgb8) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

/// Embed `path` in the box. A file that stopped decoding since layout is
/// skipped with a warning rather than failing the whole document.
fn place_image(layer: &PdfLayerReference, path: &Path, x: f32, y: f32, width: f32, height: f32) {
    let decoded = match image::open(path) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!("Skipping image {} in PDF: {}", path.display(), e);
            return;
        }
    };
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let px_width = rgb.width().max(1) as f32;
    let px_height = rgb.height().max(1) as f32;

    // At this dpi the natural width equals the box width.
    let dpi = px_width * 25.4 / width;
    let natural_height = px_height * 25.4 / dpi;

    Image::from_dynamic_image(&rgb).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(PAGE_HEIGHT - y - height)),
            dpi: Some(dpi),
            scale_y: Some(height / natural_height),
            ..Default::default()
        },
    );
}

fn render_error(e: impl std::fmt::Debug) -> DesignerError {
    DesignerError::Render(format!("{:?}", e))
}

/// Write laid out pages to `path`.
pub fn write_pdf(pages: &[Page], path: &Path) -> Result<(), DesignerError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new("Interior Design Report", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");

    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_error)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(render_error)?,
        italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(render_error)?,
    };

    for (index, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1")
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for element in &page.elements {
            match element {
                Element::Rect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    layer.set_fill_color(pdf_color(*color));
                    layer.add_rect(Rect::new(
                        Mm(*x),
                        Mm(PAGE_HEIGHT - y - height),
                        Mm(x + width),
                        Mm(PAGE_HEIGHT - y),
                    ));
                }
                Element::Text {
                    x,
                    y,
                    size,
                    style,
                    color,
                    text,
                } => {
                    layer.set_fill_color(pdf_color(*color));
                    layer.use_text(text.clone(), *size, Mm(*x), Mm(PAGE_HEIGHT - y), fonts.get(*style));
                }
                Element::Image {
                    x,
                    y,
                    width,
                    height,
                    path,
                } => place_image(&layer, path, *x, *y, *width, *height),
            }
        }
    }

    let file = File::create(path)
        .map_err(|e| DesignerError::Storage(format!("Failed to create {}: {}", path.display(), e)))?;
    doc.save(&mut BufWriter::new(file)).map_err(render_error)
}
