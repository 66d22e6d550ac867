//! Time-order (flame chart) view: X is wall time, Y is stack depth.

use traceviz_protocol::{Rect, RenderCommand, ThemeToken};

use super::{SpanViewCtx, MIN_LABEL_WIDTH, MIN_SPAN_WIDTH, ROW_HEIGHT};
use crate::color::span_token;
use crate::model::Span;

/// Render one thread chronologically, roots at the top.
pub fn render(ctx: &SpanViewCtx<'_>, thread_id: u32) -> Vec<RenderCommand> {
    render_inner(ctx, thread_id, false)
}

/// Y-mirrored time-order: deepest rows at the top, roots at the bottom.
pub fn render_icicle(ctx: &SpanViewCtx<'_>, thread_id: u32) -> Vec<RenderCommand> {
    render_inner(ctx, thread_id, true)
}

fn render_inner(ctx: &SpanViewCtx<'_>, thread_id: u32, inverted: bool) -> Vec<RenderCommand> {
    if ctx.window.is_empty() {
        return Vec::new();
    }
    let max_depth = ctx
        .profile
        .thread(thread_id)
        .map(|t| t.max_depth)
        .unwrap_or(0);

    let mut commands = Vec::new();
    commands.push(RenderCommand::BeginGroup {
        id: if inverted { "icicle" } else { "time-order" }.into(),
        label: None,
    });

    for span in ctx.profile.thread_spans(thread_id) {
        if let Some(cmd) = span_rect(ctx, span, max_depth, inverted) {
            commands.push(cmd);
            // Matches get a translucent highlight on top.
            if ctx.search.is_some_and(|s| s.matches(&span.name))
                && let Some(RenderCommand::DrawRect { rect, .. }) = commands.last().cloned()
            {
                commands.push(RenderCommand::DrawRect {
                    rect,
                    fill: ThemeToken::SearchHighlight,
                    border: None,
                    label: None,
                    frame_id: None,
                });
            }
        }
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

fn span_rect(
    ctx: &SpanViewCtx<'_>,
    span: &Span,
    max_depth: u16,
    inverted: bool,
) -> Option<RenderCommand> {
    // Snap to the device pixel grid so adjacent spans keep crisp edges.
    let x = ctx.x_of(span.start_us).round();
    let w = (span.duration_us() as f64 * ctx.window.ppu(ctx.width)) as f32;
    if w < MIN_SPAN_WIDTH || x + w < 0.0 || x > ctx.width {
        return None;
    }

    let row = if inverted {
        max_depth - span.depth
    } else {
        span.depth
    };
    let y = f32::from(row) * ROW_HEIGHT - ctx.scroll_y;
    if y + ROW_HEIGHT < 0.0 || y > ctx.height {
        return None;
    }

    let searching = ctx.search.is_some_and(|s| s.is_active());
    let is_match = ctx.search.is_some_and(|s| s.matches(&span.name));
    let selected = ctx.selected == Some(span.id);

    // Non-matches dim to neutral and lose their border.
    let (fill, border) = if searching && !is_match {
        (ThemeToken::FlameNeutral, None)
    } else if selected {
        (span_token(span, ctx.color_mode), Some(ThemeToken::SelectionHighlight))
    } else {
        (span_token(span, ctx.color_mode), Some(ThemeToken::Border))
    };

    let label = (w > MIN_LABEL_WIDTH).then(|| span.name.clone());

    Some(RenderCommand::DrawRect {
        rect: Rect::new(x, y, w, ROW_HEIGHT - 1.0),
        fill,
        border,
        label,
        frame_id: Some(span.id),
    })
}
