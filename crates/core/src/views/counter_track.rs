//! Counter track: a sampled time series drawn as a step-filled area chart.

use traceviz_protocol::{Label, Point, Rect, RenderCommand, TextAlign, ThemeToken};

use super::TimeWindow;
use crate::model::Counter;

const LABEL_PAD: f32 = 4.0;
const FONT_SIZE: f32 = 10.0;

/// Render one counter within the window. `align_us` maps the counter's
/// profile-local timestamps onto the session timeline.
pub fn render(
    counter: &Counter,
    align_us: i64,
    window: TimeWindow,
    width: f32,
    height: f32,
) -> Vec<RenderCommand> {
    if window.is_empty() || counter.samples.is_empty() {
        return Vec::new();
    }
    let ppu = window.ppu(width);

    // Scale Y over the visible range, keeping the sample just outside each
    // edge so the chart stays continuous while panning.
    let visible_lo = window.t0_us as i64 - align_us;
    let visible_hi = window.t1_us as i64 - align_us;
    let mut min_val = f64::INFINITY;
    let mut max_val = f64::NEG_INFINITY;
    for (i, sample) in counter.samples.iter().enumerate() {
        let in_range = sample.ts_us >= visible_lo && sample.ts_us <= visible_hi;
        let straddles_edge = counter
            .samples
            .get(i + 1)
            .is_some_and(|next| sample.ts_us < visible_lo && next.ts_us >= visible_lo)
            || (sample.ts_us > visible_hi
                && counter
                    .samples
                    .get(i.wrapping_sub(1))
                    .is_some_and(|prev| prev.ts_us <= visible_hi));
        if in_range || straddles_edge {
            min_val = min_val.min(sample.value);
            max_val = max_val.max(sample.value);
        }
    }
    if !min_val.is_finite() {
        return Vec::new();
    }
    // Anchor positive-only counters at zero.
    let base = if min_val >= 0.0 { 0.0 } else { min_val };
    let range = (max_val - base).max(f64::MIN_POSITIVE);
    let chart_height = height - FONT_SIZE - LABEL_PAD;
    let y_scale = f64::from(chart_height) / range;

    let mut commands = Vec::with_capacity(counter.samples.len() + 6);
    commands.push(RenderCommand::BeginGroup {
        id: Label::from(format!("counter-{}", counter.name)),
        label: Some(counter.name.clone()),
    });
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, width, height),
        fill: ThemeToken::LaneBackground,
        border: Some(ThemeToken::LaneBorder),
        label: None,
        frame_id: None,
    });

    // Step chart: each sample holds until the next.
    for (i, sample) in counter.samples.iter().enumerate() {
        let next_ts = counter
            .samples
            .get(i + 1)
            .map(|s| s.ts_us)
            .unwrap_or(visible_hi);
        if next_ts < visible_lo || sample.ts_us > visible_hi {
            continue;
        }

        let x0 = (((sample.ts_us.max(visible_lo) + align_us) as f64 - window.t0_us) * ppu) as f32;
        let x1 = (((next_ts.min(visible_hi) + align_us) as f64 - window.t0_us) * ppu) as f32;
        let w = x1 - x0;
        if w < 0.1 {
            continue;
        }
        let bar = ((sample.value - base) * y_scale) as f32;
        let y = height - bar;
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(x0, y, w, bar),
            fill: ThemeToken::CounterFill,
            border: None,
            label: None,
            frame_id: None,
        });
        commands.push(RenderCommand::DrawLine {
            from: Point::new(x0, y),
            to: Point::new(x1, y),
            token: ThemeToken::CounterLine,
            width: 1.0,
        });
    }

    commands.push(RenderCommand::DrawText {
        pos: Point::new(LABEL_PAD, FONT_SIZE + LABEL_PAD),
        text: counter.name.clone(),
        token: ThemeToken::CounterText,
        font_size: FONT_SIZE,
        align: TextAlign::Left,
    });
    let peak = match &counter.unit {
        Some(unit) => format!("{max_val:.0} {unit}"),
        None => format!("{max_val:.0}"),
    };
    commands.push(RenderCommand::DrawText {
        pos: Point::new(width - LABEL_PAD, FONT_SIZE + LABEL_PAD),
        text: Label::from(peak),
        token: ThemeToken::TextMuted,
        font_size: FONT_SIZE,
        align: TextAlign::Right,
    });

    commands.push(RenderCommand::EndGroup);
    commands
}
