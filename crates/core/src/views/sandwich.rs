//! Sandwich view: all instances of one symbol, callers aggregated above,
//! callees aggregated below.
//!
//! The upper half is a caller flame growing upward from the focus bar:
//! row 1 above the bar holds direct callers, row 2 their callers, each
//! level merged by name and laid out left-heavy. The lower half mirrors
//! that for callees.

use traceviz_protocol::{Label, Point, Rect, RenderCommand, TextAlign, ThemeToken};

use super::{format_duration_us, SpanViewCtx, ViewError, MIN_LABEL_WIDTH, MIN_SPAN_WIDTH, ROW_HEIGHT};
use crate::model::Span;

const SECTION_GAP: f32 = 4.0;

struct CallNode {
    name: Label,
    weight_us: i64,
    children: Vec<CallNode>,
}

impl CallNode {
    fn new(name: Label) -> Self {
        Self {
            name,
            weight_us: 0,
            children: Vec::new(),
        }
    }

    fn child(&mut self, name: &Label) -> &mut CallNode {
        if let Some(i) = self.children.iter().position(|c| &c.name == name) {
            &mut self.children[i]
        } else {
            self.children.push(CallNode::new(name.clone()));
            self.children.last_mut().expect("just pushed")
        }
    }

    fn sort_heavy_first(&mut self) {
        self.children
            .sort_by(|a, b| b.weight_us.cmp(&a.weight_us).then_with(|| a.name.cmp(&b.name)));
        for child in &mut self.children {
            child.sort_heavy_first();
        }
    }
}

pub fn render(ctx: &SpanViewCtx<'_>) -> Result<Vec<RenderCommand>, ViewError> {
    let focus_id = ctx.selected.ok_or(ViewError::SandwichRequiresSelection)?;
    let focus = ctx
        .profile
        .span(focus_id)
        .ok_or(ViewError::SandwichRequiresSelection)?;
    let focus_name = focus.name.clone();

    let instances: Vec<&Span> = ctx
        .profile
        .spans()
        .filter(|s| s.name == focus_name)
        .collect();

    let total_us: i64 = instances.iter().map(|s| s.duration_us()).sum();
    let self_us: i64 = instances.iter().map(|s| s.self_us).sum();
    if total_us <= 0 {
        return Ok(vec![
            RenderCommand::BeginGroup {
                id: "sandwich".into(),
                label: None,
            },
            RenderCommand::EndGroup,
        ]);
    }

    // Caller tree: nearest caller is the first level above the bar.
    let mut callers = CallNode::new(focus_name.clone());
    for instance in &instances {
        let mut node = &mut callers;
        let mut cursor = instance.parent;
        while let Some(pid) = cursor {
            let Some(parent) = ctx.profile.span(pid) else {
                break;
            };
            node = CallNode::child(node, &parent.name);
            node.weight_us += instance.duration_us();
            cursor = parent.parent;
        }
    }
    callers.sort_heavy_first();

    // Callee tree: pooled descendants of every instance.
    let mut callees = CallNode::new(focus_name.clone());
    for instance in &instances {
        accumulate_callees(ctx, instance, &mut callees);
    }
    callees.sort_heavy_first();

    let x_scale = f64::from(ctx.width) / total_us as f64;
    let caller_depth = tree_depth(&callers);

    let mut commands = Vec::new();
    commands.push(RenderCommand::BeginGroup {
        id: "sandwich".into(),
        label: None,
    });

    // Focus bar sits below the caller flame.
    let bar_y = caller_depth as f32 * ROW_HEIGHT + SECTION_GAP;
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, bar_y, ctx.width, ROW_HEIGHT - 1.0),
        fill: ThemeToken::SelectionHighlight,
        border: Some(ThemeToken::Border),
        label: Some(focus_name.clone()),
        frame_id: Some(focus_id),
    });
    commands.push(RenderCommand::DrawText {
        pos: Point::new(ctx.width - 4.0, bar_y + ROW_HEIGHT - 6.0),
        text: Label::from(format!(
            "{} total · {} self · {} calls",
            format_duration_us(total_us),
            format_duration_us(self_us),
            instances.len()
        )),
        token: ThemeToken::TextSecondary,
        font_size: 10.0,
        align: TextAlign::Right,
    });

    // Callers grow upward from the bar.
    layout_level(
        &callers.children,
        0.0,
        x_scale,
        |depth| bar_y - (depth + 1.0) * ROW_HEIGHT,
        ThemeToken::FlameCold,
        &mut commands,
    );

    // Callees grow downward from the bar.
    let callee_y0 = bar_y + ROW_HEIGHT + SECTION_GAP;
    layout_level(
        &callees.children,
        0.0,
        x_scale,
        |depth| callee_y0 + depth * ROW_HEIGHT,
        ThemeToken::FlameWarm,
        &mut commands,
    );

    commands.push(RenderCommand::EndGroup);
    Ok(commands)
}

fn accumulate_callees(ctx: &SpanViewCtx<'_>, span: &Span, node: &mut CallNode) {
    for child in ctx.profile.arena.children(span.id) {
        let child_node = node.child(&child.name);
        child_node.weight_us += child.duration_us();
        accumulate_callees(ctx, child, child_node);
    }
}

fn tree_depth(node: &CallNode) -> u16 {
    node.children
        .iter()
        .map(|c| 1 + tree_depth(c))
        .max()
        .unwrap_or(0)
}

fn layout_level(
    nodes: &[CallNode],
    mut x: f64,
    x_scale: f64,
    y_of: impl Fn(f32) -> f32 + Copy,
    fill: ThemeToken,
    commands: &mut Vec<RenderCommand>,
) {
    layout_level_at(nodes, &mut x, 0.0, x_scale, y_of, fill, commands);
}

fn layout_level_at(
    nodes: &[CallNode],
    x: &mut f64,
    depth: f32,
    x_scale: f64,
    y_of: impl Fn(f32) -> f32 + Copy,
    fill: ThemeToken,
    commands: &mut Vec<RenderCommand>,
) {
    for node in nodes {
        let w = (node.weight_us as f64 * x_scale) as f32;
        if w >= MIN_SPAN_WIDTH {
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(*x as f32, y_of(depth), w, ROW_HEIGHT - 1.0),
                fill,
                border: Some(ThemeToken::Border),
                label: (w > MIN_LABEL_WIDTH).then(|| node.name.clone()),
                frame_id: None,
            });
        }
        let mut child_x = *x;
        layout_level_at(
            &node.children,
            &mut child_x,
            depth + 1.0,
            x_scale,
            y_of,
            fill,
            commands,
        );
        *x += node.weight_us as f64 * x_scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorMode;
    use crate::model::{Profile, SourceFormat, SpanFlags};
    use crate::parsers::assemble::ProfileAssembler;
    use crate::views::TimeWindow;

    fn three_span_profile() -> Profile {
        let mut asm = ProfileAssembler::new();
        let t = asm.thread((1, 1), "Main");
        asm.complete(t, 0, 1000, "A", None, SpanFlags::NONE);
        asm.complete(t, 100, 400, "B", None, SpanFlags::NONE);
        asm.complete(t, 500, 900, "C", None, SpanFlags::NONE);
        asm.finish(SourceFormat::ChromeTrace, None)
    }

    fn ctx(profile: &Profile, selected: Option<traceviz_protocol::FrameId>) -> SpanViewCtx<'_> {
        SpanViewCtx {
            profile,
            align_us: 0,
            window: TimeWindow {
                t0_us: 0.0,
                t1_us: 1000.0,
            },
            width: 900.0,
            height: 600.0,
            scroll_y: 0.0,
            color_mode: ColorMode::ByName,
            selected,
            search: None,
        }
    }

    #[test]
    fn requires_a_selection() {
        let profile = three_span_profile();
        assert_eq!(
            render(&ctx(&profile, None)).unwrap_err(),
            ViewError::SandwichRequiresSelection
        );
    }

    #[test]
    fn sandwich_of_leaf_shows_caller_only() {
        let profile = three_span_profile();
        let b = profile.spans().find(|s| s.name == "B").unwrap();
        let commands = render(&ctx(&profile, Some(b.id))).unwrap();

        let rects: Vec<(String, f32, f32)> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    label: Some(l),
                    rect,
                    ..
                } => Some((l.to_string(), rect.w, rect.y)),
                _ => None,
            })
            .collect();

        // Focus bar (full width) + caller A; B has no callees.
        let focus = rects.iter().find(|(n, ..)| n == "B").unwrap();
        assert!((focus.1 - 900.0).abs() < 0.01);

        let caller = rects.iter().find(|(n, ..)| n == "A").unwrap();
        // A's width is proportional to B's 300µs of 300µs total.
        assert!((caller.1 - 900.0).abs() < 0.01);
        assert!(caller.2 < focus.2, "callers render above the focus bar");
        assert_eq!(rects.len(), 2, "no callee rects for a leaf");
    }

    #[test]
    fn callees_merge_across_instances() {
        let mut asm = ProfileAssembler::new();
        let t = asm.thread((0, 0), "Main");
        asm.complete(t, 0, 100, "f", None, SpanFlags::NONE);
        asm.complete(t, 0, 40, "g", None, SpanFlags::NONE);
        asm.complete(t, 100, 200, "f", None, SpanFlags::NONE);
        asm.complete(t, 100, 160, "g", None, SpanFlags::NONE);
        let profile = asm.finish(SourceFormat::ChromeTrace, None);
        let f = profile.spans().find(|s| s.name == "f").unwrap();

        let commands = render(&ctx(&profile, Some(f.id))).unwrap();
        let g_rects: Vec<f32> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    label: Some(l),
                    rect,
                    ..
                } if *l == "g" => Some(rect.w),
                _ => None,
            })
            .collect();
        assert_eq!(g_rects.len(), 1, "both g instances merge");
        // g accounts for 100µs of f's 200µs.
        assert!((g_rects[0] - 450.0).abs() < 0.01);
    }

    #[test]
    fn reports_aggregate_times() {
        let profile = three_span_profile();
        let a = profile.spans().find(|s| s.name == "A").unwrap();
        let commands = render(&ctx(&profile, Some(a.id))).unwrap();
        let summary = commands
            .iter()
            .find_map(|c| match c {
                RenderCommand::DrawText { text, .. } => Some(text.to_string()),
                _ => None,
            })
            .unwrap();
        assert!(summary.contains("1.0ms total"));
        assert!(summary.contains("300µs self"));
    }
}
