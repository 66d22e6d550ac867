//! Left-heavy view: same-name siblings merge, merged children sort
//! heaviest-first, X positions become cumulative sums. Original
//! timestamps are discarded.

use std::collections::HashMap;

use traceviz_protocol::{FrameId, Label, Rect, RenderCommand, ThemeToken};

use super::{SpanViewCtx, MIN_LABEL_WIDTH, MIN_SPAN_WIDTH, ROW_HEIGHT};
use crate::color::{token_for, ColorMode};
use crate::model::{Profile, Span};

pub(crate) struct MergedNode {
    pub name: Label,
    pub category: Option<Label>,
    pub total_us: i64,
    /// One representative span, so selection still works on merged rects.
    pub exemplar: FrameId,
    pub children: Vec<MergedNode>,
}

pub fn render(ctx: &SpanViewCtx<'_>, thread_id: u32) -> Vec<RenderCommand> {
    let spans: Vec<&Span> = ctx.profile.thread_spans(thread_id).collect();
    let roots = merge_forest(ctx.profile, spans.iter().filter(|s| s.parent.is_none()).copied());
    let total_us: i64 = roots.iter().map(|n| n.total_us).sum();
    if total_us <= 0 {
        return Vec::new();
    }

    let x_scale = f64::from(ctx.width) / total_us as f64;
    let mut commands = Vec::new();
    commands.push(RenderCommand::BeginGroup {
        id: "left-heavy".into(),
        label: None,
    });
    layout(
        &roots,
        0,
        0.0,
        x_scale,
        ctx,
        &mut commands,
    );
    commands.push(RenderCommand::EndGroup);
    commands
}

/// Merge a set of sibling spans (and, recursively, their subtrees) by
/// name. Children of every merged instance pool together before merging
/// one level down.
pub(crate) fn merge_forest<'a>(
    profile: &'a Profile,
    siblings: impl Iterator<Item = &'a Span>,
) -> Vec<MergedNode> {
    let mut groups: HashMap<&str, (Label, Option<Label>, i64, FrameId, Vec<FrameId>)> =
        HashMap::new();
    for span in siblings {
        let entry = groups.entry(span.name.as_str()).or_insert_with(|| {
            (
                span.name.clone(),
                span.category.clone(),
                0,
                span.id,
                Vec::new(),
            )
        });
        entry.2 += span.duration_us();
        entry.4.push(span.id);
    }

    let mut nodes: Vec<MergedNode> = groups
        .into_values()
        .map(|(name, category, total_us, exemplar, ids)| {
            let pooled_children = ids
                .iter()
                .flat_map(|&id| profile.arena.children(id))
                .collect::<Vec<_>>();
            let children = merge_forest(profile, pooled_children.into_iter());
            MergedNode {
                name,
                category,
                total_us,
                exemplar,
                children,
            }
        })
        .collect();

    nodes.sort_by(|a, b| b.total_us.cmp(&a.total_us).then_with(|| a.name.cmp(&b.name)));
    nodes
}

fn layout(
    nodes: &[MergedNode],
    depth: u16,
    mut x: f64,
    x_scale: f64,
    ctx: &SpanViewCtx<'_>,
    commands: &mut Vec<RenderCommand>,
) {
    let y = f32::from(depth) * ROW_HEIGHT - ctx.scroll_y;
    for node in nodes {
        let w = (node.total_us as f64 * x_scale) as f32;
        if w >= MIN_SPAN_WIDTH && y + ROW_HEIGHT >= 0.0 && y <= ctx.height {
            commands.push(merged_rect(node, x as f32, y, w, depth, ctx.color_mode, ctx));
            if ctx.search.is_some_and(|s| s.matches(&node.name)) {
                commands.push(RenderCommand::DrawRect {
                    rect: Rect::new(x as f32, y, w, ROW_HEIGHT - 1.0),
                    fill: ThemeToken::SearchHighlight,
                    border: None,
                    label: None,
                    frame_id: None,
                });
            }
        }
        layout(&node.children, depth + 1, x, x_scale, ctx, commands);
        x += node.total_us as f64 * x_scale;
    }
}

fn merged_rect(
    node: &MergedNode,
    x: f32,
    y: f32,
    w: f32,
    depth: u16,
    mode: ColorMode,
    ctx: &SpanViewCtx<'_>,
) -> RenderCommand {
    let searching = ctx.search.is_some_and(|s| s.is_active());
    let is_match = ctx.search.is_some_and(|s| s.matches(&node.name));
    let (fill, border) = if searching && !is_match {
        (ThemeToken::FlameNeutral, None)
    } else {
        (
            token_for(
                &node.name,
                depth,
                node.category.as_ref().map(|c| c.as_str()),
                mode,
            ),
            Some(ThemeToken::Border),
        )
    };
    RenderCommand::DrawRect {
        rect: Rect::new(x, y, w, ROW_HEIGHT - 1.0),
        fill,
        border,
        label: (w > MIN_LABEL_WIDTH).then(|| node.name.clone()),
        frame_id: Some(node.exemplar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SourceFormat, SpanFlags};
    use crate::parsers::assemble::ProfileAssembler;
    use crate::views::TimeWindow;

    fn ctx(profile: &Profile) -> SpanViewCtx<'_> {
        SpanViewCtx {
            profile,
            align_us: 0,
            window: TimeWindow {
                t0_us: 0.0,
                t1_us: 100.0,
            },
            width: 800.0,
            height: 600.0,
            scroll_y: 0.0,
            color_mode: ColorMode::ByName,
            selected: None,
            search: None,
        }
    }

    #[test]
    fn identical_roots_merge_into_one_rect() {
        let mut asm = ProfileAssembler::new();
        let t = asm.thread((0, 0), "Main");
        asm.complete(t, 0, 50, "main", None, SpanFlags::NONE);
        asm.complete(t, 50, 100, "main", None, SpanFlags::NONE);
        let profile = asm.finish(SourceFormat::ChromeTrace, None);
        let tid = profile.threads[0].id;

        let commands = render(&ctx(&profile), tid);
        let rects: Vec<_> = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawRect { .. }))
            .collect();
        assert_eq!(rects.len(), 1);
        if let RenderCommand::DrawRect { rect, .. } = rects[0] {
            assert!((rect.w - 800.0).abs() < 0.01, "merged rect spans the lane");
        }
    }

    #[test]
    fn heaviest_child_lays_out_first() {
        let mut asm = ProfileAssembler::new();
        let t = asm.thread((0, 0), "Main");
        asm.complete(t, 0, 100, "root", None, SpanFlags::NONE);
        asm.complete(t, 0, 20, "light", None, SpanFlags::NONE);
        asm.complete(t, 20, 90, "heavy", None, SpanFlags::NONE);
        let profile = asm.finish(SourceFormat::ChromeTrace, None);
        let tid = profile.threads[0].id;

        let commands = render(&ctx(&profile), tid);
        let mut labelled: Vec<(String, f32)> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    label: Some(l),
                    rect,
                    ..
                } => Some((l.to_string(), rect.x)),
                _ => None,
            })
            .collect();
        labelled.sort_by(|a, b| a.1.total_cmp(&b.1));
        // heavy (70µs) sits left of light (20µs) despite starting later.
        let heavy_x = labelled.iter().find(|(n, _)| n == "heavy").unwrap().1;
        let light_x = labelled.iter().find(|(n, _)| n == "light").unwrap().1;
        assert!(heavy_x < light_x);
        assert!((heavy_x - 0.0).abs() < 0.01, "children start at parent's left edge");
    }

    #[test]
    fn empty_thread_renders_nothing() {
        let asm = ProfileAssembler::new();
        let profile = asm.finish(SourceFormat::ChromeTrace, None);
        assert!(render(&ctx(&profile), 0).is_empty());
    }
}
