//! V8 CPU profiles (`.cpuprofile`): Node `--cpu-prof`, Chrome DevTools,
//! Deno.
//!
//! The file is a call-node tree plus a sample stream. With samples and
//! time deltas present, the timeline is reconstructed by prefix-merging
//! consecutive sample stacks. Without them (tree-only exports), each leaf
//! gets an equal synthetic share of the capture duration.

use std::collections::HashMap;

use serde::Deserialize;

use super::assemble::{finalize_time_range, ProfileAssembler, StackFrame};
use super::ParseError;
use crate::model::{Profile, SourceFormat, SpanFlags};

#[derive(Debug, Deserialize)]
struct CpuProfile {
    nodes: Vec<CpuNode>,
    #[serde(default, rename = "startTime")]
    start_time: f64,
    #[serde(default, rename = "endTime")]
    end_time: f64,
    #[serde(default)]
    samples: Vec<u64>,
    #[serde(default, rename = "timeDeltas")]
    time_deltas: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct CpuNode {
    id: u64,
    #[serde(rename = "callFrame")]
    call_frame: CallFrame,
    #[serde(default)]
    children: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct CallFrame {
    #[serde(rename = "functionName", default)]
    function_name: String,
    #[serde(default)]
    url: Option<String>,
}

pub fn parse(data: &[u8]) -> Result<Profile, ParseError> {
    let cpu: CpuProfile = serde_json::from_slice(data).map_err(ParseError::from_json)?;
    if cpu.nodes.is_empty() {
        return Err(ParseError::InvalidFormat(
            "cpuprofile has no call nodes".into(),
        ));
    }

    let nodes: HashMap<u64, &CpuNode> = cpu.nodes.iter().map(|n| (n.id, n)).collect();
    let mut parents: HashMap<u64, u64> = HashMap::new();
    for node in &cpu.nodes {
        for &child in &node.children {
            parents.insert(child, node.id);
        }
    }

    let mut asm = ProfileAssembler::new();
    let t = asm.thread((0, 0), "Main");

    if !cpu.samples.is_empty() && !cpu.time_deltas.is_empty() {
        parse_samples(&cpu, &nodes, &parents, &mut asm, t)?;
    } else {
        parse_tree_only(&cpu, &nodes, &parents, &mut asm, t);
    }

    let mut profile = asm.finish(SourceFormat::V8CpuProfile, None);
    finalize_time_range(&mut profile);
    Ok(profile)
}

fn parse_samples(
    cpu: &CpuProfile,
    nodes: &HashMap<u64, &CpuNode>,
    parents: &HashMap<u64, u64>,
    asm: &mut ProfileAssembler,
    t: usize,
) -> Result<(), ParseError> {
    // Deltas accumulate into absolute timestamps.
    let mut timestamps = Vec::with_capacity(cpu.time_deltas.len());
    let mut ts = cpu.start_time;
    for &delta in &cpu.time_deltas {
        ts += delta;
        if delta < 0.0 {
            return Err(ParseError::InconsistentTimestamps {
                format: SourceFormat::V8CpuProfile,
                detail: "negative time delta".into(),
            });
        }
        timestamps.push(ts);
    }

    let count = cpu.samples.len().min(timestamps.len());
    for i in 0..count {
        let node_id = cpu.samples[i];
        let sample_ts = timestamps[i].round() as i64;
        let next_ts = if i + 1 < count {
            timestamps[i + 1].round() as i64
        } else {
            cpu.end_time.max(timestamps[i]).round() as i64
        };

        // Leaf-to-root walk, reversed.
        let mut chain = Vec::new();
        let mut cursor = Some(node_id);
        while let Some(id) = cursor {
            chain.push(id);
            cursor = parents.get(&id).copied();
        }
        chain.reverse();

        let frames: Vec<StackFrame<'_>> = chain
            .iter()
            .filter_map(|id| nodes.get(id).map(|n| (*id, *n)))
            .map(|(id, node)| StackFrame {
                key: id,
                name: &node.call_frame.function_name,
                category: node.call_frame.url.as_deref(),
            })
            .collect();
        asm.sample(t, &frames, sample_ts, next_ts, SpanFlags::NONE);
    }
    Ok(())
}

/// Tree-only fallback: weight every leaf equally and scale onto the
/// capture duration.
fn parse_tree_only(
    cpu: &CpuProfile,
    nodes: &HashMap<u64, &CpuNode>,
    parents: &HashMap<u64, u64>,
    asm: &mut ProfileAssembler,
    t: usize,
) {
    fn leaf_units(id: u64, nodes: &HashMap<u64, &CpuNode>) -> u64 {
        match nodes.get(&id) {
            Some(node) if !node.children.is_empty() => node
                .children
                .iter()
                .map(|&c| leaf_units(c, nodes))
                .sum::<u64>()
                .max(1),
            Some(_) => 1,
            None => 0,
        }
    }

    let roots: Vec<u64> = cpu
        .nodes
        .iter()
        .filter(|n| !parents.contains_key(&n.id))
        .map(|n| n.id)
        .collect();

    let total_units: u64 = roots.iter().map(|&r| leaf_units(r, nodes)).sum();
    if total_units == 0 {
        return;
    }
    let span = (cpu.end_time - cpu.start_time).max(0.0);
    let scale = if span > 0.0 {
        span / total_units as f64
    } else {
        1.0
    };
    let to_ts = |units: u64| -> i64 { (cpu.start_time + units as f64 * scale).round() as i64 };

    fn emit(
        id: u64,
        offset_units: u64,
        nodes: &HashMap<u64, &CpuNode>,
        asm: &mut ProfileAssembler,
        t: usize,
        to_ts: &impl Fn(u64) -> i64,
    ) -> u64 {
        let Some(node) = nodes.get(&id) else {
            return offset_units;
        };
        let units = leaf_units(id, nodes);
        asm.complete(
            t,
            to_ts(offset_units),
            to_ts(offset_units + units),
            &node.call_frame.function_name,
            node.call_frame.url.as_deref(),
            SpanFlags::SAMPLED,
        );
        let mut cursor = offset_units;
        for &child in &node.children {
            cursor = emit(child, cursor, nodes, asm, t, to_ts);
        }
        offset_units + units
    }

    let mut cursor = 0;
    for root in roots {
        cursor = emit(root, cursor, nodes, asm, t, &to_ts);
    }
}
