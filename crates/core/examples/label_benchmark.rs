//! Lightweight parse/lookup/emit benchmark harness for local baselines.
//!
//! Run from repository root:
//! `cargo run -p odl_toolchain_core --example label_benchmark --release`

use std::fs;
use std::time::{Duration, Instant};

use odl_toolchain_core::{
    LabelContext, ObjectQuery, ParamQuery, emit_label, find_parameter, parse_label,
};

fn per_iter_ms(elapsed: Duration, iterations: usize) -> f64 {
    elapsed.as_secs_f64() * 1000.0 / iterations as f64
}

fn run_benchmark(label: &str, input: &str, iterations: usize) -> Result<(), String> {
    let parse_start = Instant::now();
    for _ in 0..iterations {
        let mut ctx = LabelContext::default();
        parse_label(input, &mut ctx).map_err(|e| e.to_string())?;
    }
    let parse_elapsed = parse_start.elapsed();

    let mut ctx = LabelContext::default();
    let parsed = parse_label(input, &mut ctx).map_err(|e| e.to_string())?;
    let root = parsed.tree.root().ok_or("sample has no root object")?;

    // NAME inside the second object in preorder.
    let query = ParamQuery::named("NAME").in_object(ObjectQuery::any().position(2));
    let find_start = Instant::now();
    for _ in 0..iterations {
        let _ = find_parameter(&parsed.tree, &ctx, root, &query);
    }
    let find_elapsed = find_start.elapsed();

    let emit_start = Instant::now();
    for _ in 0..iterations {
        let _ = emit_label(&parsed.tree, &ctx.config.emit);
    }
    let emit_elapsed = emit_start.elapsed();

    println!("Benchmark: {label}");
    println!("  input_bytes: {}", input.len());
    println!("  parameters:  {}", parsed.tree.param_count());
    println!(
        "  parse: total={:?}, per_iter={:.3} ms",
        parse_elapsed,
        per_iter_ms(parse_elapsed, iterations)
    );
    println!(
        "  find:  total={:?}, per_iter={:.3} ms",
        find_elapsed,
        per_iter_ms(find_elapsed, iterations)
    );
    println!(
        "  emit:  total={:?}, per_iter={:.3} ms",
        emit_elapsed,
        per_iter_ms(emit_elapsed, iterations)
    );
    Ok(())
}

fn main() -> Result<(), String> {
    let iterations = std::env::var("ODL_BENCH_ITERS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(500);

    let sample_paths = [("image", "samples/image.lbl"), ("table", "samples/table.lbl")];

    for (label, path) in sample_paths {
        let input = fs::read_to_string(path)
            .map_err(|e| format!("failed to read sample '{}': {e}", path))?;
        run_benchmark(label, &input, iterations)?;
    }

    Ok(())
}
