//! Ranked view: one table row per unique (name, category) pair, bar
//! length encoding aggregate self or total time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use traceviz_protocol::{Label, Point, Rect, RenderCommand, TextAlign, ThemeToken};

use super::{format_duration_us, SpanViewCtx};

const ROW_HEIGHT: f32 = 24.0;
const HEADER_HEIGHT: f32 = 28.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RankedMetric {
    #[default]
    SelfTime,
    TotalTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Descending,
    Ascending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedRow {
    pub name: Label,
    pub category: Option<Label>,
    pub self_us: i64,
    pub total_us: i64,
    pub count: u32,
}

/// Aggregate every span by (name, category).
pub fn rows(ctx: &SpanViewCtx<'_>, metric: RankedMetric, direction: SortDirection) -> Vec<RankedRow> {
    let mut by_key: HashMap<(&str, Option<&str>), RankedRow> = HashMap::new();
    for span in ctx.profile.spans() {
        let key = (span.name.as_str(), span.category.as_ref().map(|c| c.as_str()));
        let entry = by_key.entry(key).or_insert_with(|| RankedRow {
            name: span.name.clone(),
            category: span.category.clone(),
            self_us: 0,
            total_us: 0,
            count: 0,
        });
        entry.self_us += span.self_us;
        entry.total_us += span.duration_us();
        entry.count += 1;
    }

    let mut rows: Vec<RankedRow> = by_key.into_values().collect();
    rows.sort_by(|a, b| {
        let primary = match metric {
            RankedMetric::SelfTime => a.self_us.cmp(&b.self_us),
            RankedMetric::TotalTime => a.total_us.cmp(&b.total_us),
        };
        let ordered = match direction {
            SortDirection::Descending => primary.reverse(),
            SortDirection::Ascending => primary,
        };
        ordered.then_with(|| a.name.cmp(&b.name))
    });
    rows
}

pub fn render(
    ctx: &SpanViewCtx<'_>,
    metric: RankedMetric,
    direction: SortDirection,
) -> Vec<RenderCommand> {
    let rows = rows(ctx, metric, direction);
    let profile_total = ctx.profile.duration_us().max(1);

    let col_self = ctx.width * 0.52;
    let col_total = ctx.width * 0.70;
    let col_count = ctx.width * 0.88;
    let bar_max = ctx.width * 0.16;

    let mut commands = Vec::with_capacity(rows.len() * 6 + 8);
    commands.push(RenderCommand::BeginGroup {
        id: "ranked".into(),
        label: None,
    });

    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, ctx.width, HEADER_HEIGHT),
        fill: ThemeToken::TableHeaderBackground,
        border: Some(ThemeToken::TableBorder),
        label: None,
        frame_id: None,
    });
    let header_y = HEADER_HEIGHT / 2.0 + 4.0;
    for (text, x) in [
        ("Symbol", 8.0),
        ("Self", col_self + 4.0),
        ("Total", col_total + 4.0),
        ("Count", col_count + 4.0),
    ] {
        commands.push(RenderCommand::DrawText {
            pos: Point::new(x, header_y),
            text: text.into(),
            token: ThemeToken::TextPrimary,
            font_size: 12.0,
            align: TextAlign::Left,
        });
    }

    for (i, row) in rows.iter().enumerate() {
        let y = HEADER_HEIGHT + i as f32 * ROW_HEIGHT - ctx.scroll_y;
        if y + ROW_HEIGHT < 0.0 {
            continue;
        }
        if y > ctx.height {
            break;
        }

        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(0.0, y, ctx.width, ROW_HEIGHT),
            fill: if i % 2 == 0 {
                ThemeToken::TableRowEven
            } else {
                ThemeToken::TableRowOdd
            },
            border: None,
            label: None,
            frame_id: None,
        });

        let text_y = y + ROW_HEIGHT / 2.0 + 4.0;
        commands.push(RenderCommand::DrawText {
            pos: Point::new(8.0, text_y),
            text: row.name.clone(),
            token: if ctx.search.is_some_and(|s| s.matches(&row.name)) {
                ThemeToken::MarkerText
            } else {
                ThemeToken::TextPrimary
            },
            font_size: 11.0,
            align: TextAlign::Left,
        });

        for (value, col) in [(row.self_us, col_self), (row.total_us, col_total)] {
            let fraction = (value as f64 / profile_total as f64).min(1.0) as f32;
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(col + 2.0, y + ROW_HEIGHT - 4.0, bar_max * fraction, 2.0),
                fill: ThemeToken::BarFill,
                border: None,
                label: None,
                frame_id: None,
            });
            commands.push(RenderCommand::DrawText {
                pos: Point::new(col + 4.0, text_y),
                text: Label::from(format_duration_us(value)),
                token: ThemeToken::TextSecondary,
                font_size: 11.0,
                align: TextAlign::Left,
            });
        }

        commands.push(RenderCommand::DrawText {
            pos: Point::new(col_count + 4.0, text_y),
            text: Label::from(row.count.to_string()),
            token: ThemeToken::TextMuted,
            font_size: 11.0,
            align: TextAlign::Left,
        });
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorMode;
    use crate::model::{Profile, SourceFormat, SpanFlags};
    use crate::parsers::assemble::ProfileAssembler;
    use crate::views::TimeWindow;

    fn profile() -> Profile {
        let mut asm = ProfileAssembler::new();
        let t = asm.thread((0, 0), "Main");
        asm.complete(t, 0, 50, "foo", None, SpanFlags::NONE);
        asm.complete(t, 10, 40, "bar", None, SpanFlags::NONE);
        asm.complete(t, 50, 80, "foo", None, SpanFlags::NONE);
        asm.finish(SourceFormat::ChromeTrace, None)
    }

    fn ctx(profile: &Profile) -> SpanViewCtx<'_> {
        SpanViewCtx {
            profile,
            align_us: 0,
            window: TimeWindow {
                t0_us: 0.0,
                t1_us: 80.0,
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
    fn aggregates_by_name() {
        let profile = profile();
        let rows = rows(&ctx(&profile), RankedMetric::SelfTime, SortDirection::Descending);
        assert_eq!(rows.len(), 2);
        // foo: self 20 + 30 = 50, total 80, count 2.
        assert_eq!(rows[0].name, "foo");
        assert_eq!(rows[0].self_us, 50);
        assert_eq!(rows[0].total_us, 80);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].name, "bar");
    }

    #[test]
    fn ascending_reverses() {
        let profile = profile();
        let asc = rows(&ctx(&profile), RankedMetric::SelfTime, SortDirection::Ascending);
        assert_eq!(asc[0].name, "bar");
    }

    #[test]
    fn ties_break_lexicographically() {
        let mut asm = ProfileAssembler::new();
        let t = asm.thread((0, 0), "Main");
        asm.complete(t, 0, 10, "zeta", None, SpanFlags::NONE);
        asm.complete(t, 10, 20, "alpha", None, SpanFlags::NONE);
        let profile = asm.finish(SourceFormat::ChromeTrace, None);
        let rows = rows(&ctx(&profile), RankedMetric::TotalTime, SortDirection::Descending);
        assert_eq!(rows[0].name, "alpha");
        assert_eq!(rows[1].name, "zeta");
    }

    #[test]
    fn renders_header_and_rows() {
        let profile = profile();
        let commands = render(&ctx(&profile), RankedMetric::SelfTime, SortDirection::Descending);
        let texts: Vec<String> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawText { text, .. } => Some(text.to_string()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"Symbol".to_string()));
        assert!(texts.contains(&"foo".to_string()));
        assert!(texts.contains(&"bar".to_string()));
    }
}
