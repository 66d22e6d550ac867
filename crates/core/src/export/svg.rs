//! SVG export: replays a command list into a standalone document.
//!
//! Clip rects are collected up front so every `<clipPath>` lands in one
//! `<defs>` block, then the body references them in order. Groups become
//! real `<g id>` elements and transforms become `<g transform>`, so the
//! exported tree mirrors the semantic structure of the frame. Text
//! metrics are estimated (no font access here); final sizing is the
//! consuming renderer's concern.

use traceviz_protocol::{
    RenderCommand, RenderError, Renderer, TextAlign, Theme, ThemeToken,
};

/// Px-per-character estimate used to truncate inline rect labels.
const CHAR_WIDTH: f32 = 7.0;
const MIN_INLINE_LABEL_WIDTH: f32 = 30.0;

/// A [`Renderer`] that accumulates commands and serializes them on
/// [`SvgRenderer::finish`].
pub struct SvgRenderer {
    width: f32,
    height: f32,
    theme: Theme,
    commands: Vec<RenderCommand>,
}

impl SvgRenderer {
    pub fn new(width: f32, height: f32, theme: Theme) -> Self {
        Self {
            width,
            height,
            theme,
            commands: Vec::new(),
        }
    }

    pub fn finish(self) -> String {
        render_document(&self.commands, self.width, self.height, &self.theme)
    }
}

impl Renderer for SvgRenderer {
    fn submit(&mut self, commands: &[RenderCommand]) -> Result<(), RenderError> {
        self.commands.extend_from_slice(commands);
        Ok(())
    }
}

/// Serialize one frame of commands as a complete SVG document.
pub fn render_document(
    commands: &[RenderCommand],
    width: f32,
    height: f32,
    theme: &Theme,
) -> String {
    let mut svg = String::with_capacity(commands.len() * 160 + 512);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:system-ui,-apple-system,sans-serif">"#
    ));

    // Pass 1: all clip paths into a single defs block.
    let clip_rects: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            RenderCommand::SetClip { rect } => Some(*rect),
            _ => None,
        })
        .collect();
    if !clip_rects.is_empty() {
        svg.push_str("<defs>");
        for (i, rect) in clip_rects.iter().enumerate() {
            svg.push_str(&format!(
                r#"<clipPath id="clip{i}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath>"#,
                rect.x, rect.y, rect.w, rect.h
            ));
        }
        svg.push_str("</defs>");
    }

    svg.push_str(&format!(
        r#"<rect width="{width}" height="{height}" fill="{}"/>"#,
        theme.color(ThemeToken::Background).to_css()
    ));

    // Pass 2: body.
    let mut clip_index = 0usize;
    let mut open_clips = 0u32;
    let mut open_groups = 0u32;
    let mut open_transforms = 0u32;

    for command in commands {
        match command {
            RenderCommand::DrawRect {
                rect,
                fill,
                border,
                label,
                ..
            } => {
                let fill_css = theme.color(*fill).to_css();
                let stroke = match border {
                    Some(token) => format!(
                        r#" stroke="{}" stroke-width="0.5""#,
                        theme.color(*token).to_css()
                    ),
                    None => String::new(),
                };
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill_css}"{stroke} rx="1">"#,
                    rect.x, rect.y, rect.w, rect.h
                ));
                if let Some(label) = label {
                    svg.push_str(&format!("<title>{}</title>", escape_xml(label)));
                }
                svg.push_str("</rect>");

                if let Some(label) = label
                    && rect.w > MIN_INLINE_LABEL_WIDTH
                {
                    let max_chars = (rect.w / CHAR_WIDTH) as usize;
                    let text = if label.chars().count() > max_chars && max_chars > 2 {
                        let truncated: String = label.chars().take(max_chars - 1).collect();
                        format!("{truncated}…")
                    } else {
                        label.to_string()
                    };
                    svg.push_str(&format!(
                        r#"<text x="{}" y="{}" font-size="11" fill="{}" style="pointer-events:none">{}</text>"#,
                        rect.x + 3.0,
                        rect.y + rect.h * 0.75,
                        theme.color(ThemeToken::TextPrimary).to_css(),
                        escape_xml(&text)
                    ));
                }
            }

            RenderCommand::DrawText {
                pos,
                text,
                token,
                font_size,
                align,
            } => {
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" font-size="{font_size}" text-anchor="{anchor}" fill="{}">{}</text>"#,
                    pos.x,
                    pos.y,
                    theme.color(*token).to_css(),
                    escape_xml(text)
                ));
            }

            RenderCommand::DrawLine {
                from,
                to,
                token,
                width: stroke_width,
            } => {
                svg.push_str(&format!(
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{stroke_width}"/>"#,
                    from.x,
                    from.y,
                    to.x,
                    to.y,
                    theme.color(*token).to_css()
                ));
            }

            RenderCommand::SetClip { .. } => {
                svg.push_str(&format!(r#"<g clip-path="url(#clip{clip_index})">"#));
                clip_index += 1;
                open_clips += 1;
            }
            RenderCommand::ClearClip => {
                if open_clips > 0 {
                    svg.push_str("</g>");
                    open_clips -= 1;
                }
            }

            RenderCommand::PushTransform { translate, scale } => {
                svg.push_str(&format!(
                    r#"<g transform="translate({} {}) scale({} {})">"#,
                    translate.x, translate.y, scale.x, scale.y
                ));
                open_transforms += 1;
            }
            RenderCommand::PopTransform => {
                if open_transforms > 0 {
                    svg.push_str("</g>");
                    open_transforms -= 1;
                }
            }

            RenderCommand::BeginGroup { id, .. } => {
                svg.push_str(&format!(r#"<g id="{}">"#, escape_xml(id)));
                open_groups += 1;
            }
            RenderCommand::EndGroup => {
                if open_groups > 0 {
                    svg.push_str("</g>");
                    open_groups -= 1;
                }
            }
        }
    }

    for _ in 0..(open_clips + open_groups + open_transforms) {
        svg.push_str("</g>");
    }
    svg.push_str("</svg>");
    svg
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
