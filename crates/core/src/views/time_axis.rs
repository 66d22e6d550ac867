//! Shared time axis: tick ruler across the top of the lane area.

use traceviz_protocol::{Label, Point, Rect, RenderCommand, TextAlign, ThemeToken};

use super::TimeWindow;

pub const AXIS_HEIGHT: f32 = 24.0;
const TICK_HEIGHT: f32 = 8.0;
const FONT_SIZE: f32 = 10.0;
/// Aim for one labelled tick per this many pixels; with the 1/2/5 ladder
/// that lands between six and ten labels across typical widths.
const TARGET_TICK_SPACING: f32 = 110.0;

/// Pick a 1/2/5·10^k interval (µs) producing roughly `width / 110` ticks.
pub fn nice_interval(duration_us: f64, width: f32) -> f64 {
    let target = (width / TARGET_TICK_SPACING).clamp(6.0, 10.0);
    let raw = (duration_us / f64::from(target)).max(f64::MIN_POSITIVE);
    let magnitude = 10f64.powf(raw.log10().floor());
    let residual = raw / magnitude;
    let nice = if residual <= 1.0 {
        1.0
    } else if residual <= 2.0 {
        2.0
    } else if residual <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Format a tick timestamp, sized to the tick interval.
fn tick_label(us: f64, interval_us: f64) -> String {
    if interval_us >= 1_000_000.0 {
        format!("{:.1}s", us / 1_000_000.0)
    } else if interval_us >= 1_000.0 {
        format!("{:.1}ms", us / 1_000.0)
    } else if interval_us >= 1.0 {
        format!("{:.0}µs", us)
    } else {
        format!("{:.0}ns", us * 1_000.0)
    }
}

/// Render the ruler; ticks label time relative to `origin_us` (the session
/// start). `grid_height` extends vertical gridlines below the axis, 0 for
/// none.
pub fn render(
    window: TimeWindow,
    origin_us: i64,
    width: f32,
    grid_height: f32,
) -> Vec<RenderCommand> {
    if window.is_empty() || width <= 0.0 {
        return Vec::new();
    }

    let mut commands = Vec::with_capacity(48);
    commands.push(RenderCommand::BeginGroup {
        id: "time-axis".into(),
        label: None,
    });
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, width, AXIS_HEIGHT),
        fill: ThemeToken::LaneHeaderBackground,
        border: Some(ThemeToken::LaneBorder),
        label: None,
        frame_id: None,
    });

    let interval = nice_interval(window.duration_us(), width);
    let ppu = window.ppu(width);

    // Ticks align to interval multiples relative to the session origin.
    let rel_start = window.t0_us - origin_us as f64;
    let rel_end = window.t1_us - origin_us as f64;
    let mut tick = (rel_start / interval).ceil() * interval;
    while tick <= rel_end {
        let x = ((tick - rel_start) * ppu) as f32;
        if (0.0..=width).contains(&x) {
            commands.push(RenderCommand::DrawLine {
                from: Point::new(x, AXIS_HEIGHT - TICK_HEIGHT),
                to: Point::new(x, AXIS_HEIGHT),
                token: ThemeToken::LaneBorder,
                width: 1.0,
            });
            commands.push(RenderCommand::DrawText {
                pos: Point::new(x + 3.0, AXIS_HEIGHT - 10.0),
                text: Label::from(tick_label(tick, interval)),
                token: ThemeToken::TextSecondary,
                font_size: FONT_SIZE,
                align: TextAlign::Left,
            });
            if grid_height > 0.0 {
                commands.push(RenderCommand::DrawLine {
                    from: Point::new(x, AXIS_HEIGHT),
                    to: Point::new(x, AXIS_HEIGHT + grid_height),
                    token: ThemeToken::LaneBorder,
                    width: 0.5,
                });
            }
        }
        tick += interval;
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_is_1_2_5_ladder() {
        for width in [600.0_f32, 800.0, 1200.0, 1600.0] {
            for duration in [1_000.0, 47_000.0, 1_000_000.0, 90_000_000.0] {
                let interval = nice_interval(duration, width);
                let magnitude = 10f64.powf(interval.log10().floor());
                let mantissa = interval / magnitude;
                assert!(
                    [1.0, 2.0, 5.0, 10.0]
                        .iter()
                        .any(|m| (mantissa - m).abs() < 1e-9),
                    "mantissa {mantissa} for duration {duration} width {width}"
                );
            }
        }
    }

    #[test]
    fn label_count_is_six_to_ten() {
        for duration in [1_000.0_f64, 333_000.0, 2_000_000.0] {
            let interval = nice_interval(duration, 1000.0);
            let labels = (duration / interval).floor();
            assert!(
                (4.0..=11.0).contains(&labels),
                "{labels} labels for {duration}"
            );
        }
    }

    #[test]
    fn emits_ticks_labels_and_gridlines() {
        let window = TimeWindow {
            t0_us: 0.0,
            t1_us: 1_000_000.0,
        };
        let commands = render(window, 0, 800.0, 400.0);
        let lines = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawLine { .. }))
            .count();
        let texts = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawText { .. }))
            .count();
        assert!(texts >= 5);
        assert!(lines >= texts * 2 - 2, "tick mark + gridline per label");
    }

    #[test]
    fn labels_use_natural_units() {
        assert_eq!(tick_label(1_500_000.0, 1_000_000.0), "1.5s");
        assert_eq!(tick_label(2_500.0, 1_000.0), "2.5ms");
        assert_eq!(tick_label(500.0, 100.0), "500µs");
        assert_eq!(tick_label(0.5, 0.1), "500ns");
    }

    #[test]
    fn empty_window_renders_nothing() {
        let window = TimeWindow {
            t0_us: 10.0,
            t1_us: 10.0,
        };
        assert!(render(window, 0, 800.0, 0.0).is_empty());
    }
}
