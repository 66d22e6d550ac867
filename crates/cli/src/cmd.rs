use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use traceviz_core::views::format_duration_us;
use traceviz_core::viewer::Command;
use traceviz_core::Viewer;
use traceviz_protocol::ThemeVariant;

fn load(file: &Path, width: f32, height: f32) -> Result<Viewer> {
    let data = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let mut viewer = Viewer::new(width, height);
    let label = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "profile".into());
    viewer
        .load_profile(&data, &label)
        .with_context(|| format!("parsing {}", file.display()))?;
    Ok(viewer)
}

pub fn inspect(file: &Path, top: usize) -> Result<()> {
    let viewer = load(file, 1280.0, 800.0)?;
    let session = viewer.session();
    let entry = &session.entries()[0];
    let profile = &entry.profile;

    println!(
        "{} {} ({})",
        "profile".bold(),
        entry.label.green(),
        profile.format
    );
    println!(
        "  range     {} .. {} ({})",
        profile.start_us,
        profile.end_us,
        format_duration_us(profile.duration_us()).cyan()
    );
    println!("  spans     {}", profile.span_count());
    println!("  threads   {}", profile.threads.len());
    for thread in &profile.threads {
        println!(
            "    {:<28} {:>7} spans, depth {}",
            thread.name.to_string(),
            thread.span_count,
            thread.max_depth
        );
    }
    if !profile.counters.is_empty() {
        println!("  counters  {}", profile.counters.len());
    }
    if !profile.markers.is_empty() {
        println!("  markers   {}", profile.markers.len());
    }
    if !profile.async_spans.is_empty() {
        println!("  async     {}", profile.async_spans.len());
    }
    if !profile.frames.is_empty() {
        println!("  frames    {}", profile.frames.len());
    }
    if !profile.flows.is_empty() {
        println!("  flows     {}", profile.flows.len());
    }

    if top > 0 {
        // Aggregate self time by symbol, heaviest first.
        let mut totals: std::collections::HashMap<&str, (i64, u32)> =
            std::collections::HashMap::new();
        for span in profile.spans() {
            let entry = totals.entry(span.name.as_str()).or_insert((0, 0));
            entry.0 += span.self_us;
            entry.1 += 1;
        }
        let mut rows: Vec<_> = totals.into_iter().collect();
        rows.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then_with(|| a.0.cmp(b.0)));

        println!("\n  {} (by self time)", "hot symbols".bold());
        for (name, (self_us, count)) in rows.into_iter().take(top) {
            println!(
                "    {:>10}  {:>6}×  {}",
                format_duration_us(self_us).yellow().to_string(),
                count,
                name
            );
        }
    }
    Ok(())
}

pub fn export_svg(
    file: &Path,
    output: &Path,
    width: f32,
    height: f32,
    light: bool,
) -> Result<()> {
    let mut viewer = load(file, width, height)?;
    if light {
        viewer.apply(Command::SetTheme(ThemeVariant::Light));
    }
    let svg = viewer.export_svg().context("rendering SVG")?;
    std::fs::write(output, svg).with_context(|| format!("writing {}", output.display()))?;
    println!("wrote {}", output.display().green());
    Ok(())
}

pub fn export_json(file: &Path, output: &Path) -> Result<()> {
    let viewer = load(file, 1280.0, 800.0)?;
    let json = viewer.export_json().context("serializing profile")?;
    std::fs::write(output, json).with_context(|| format!("writing {}", output.display()))?;
    println!("wrote {}", output.display().green());
    Ok(())
}
