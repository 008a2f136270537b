//! Batch question runner: JSONL in, JSONL out, one record per question with
//! routing diagnostics and the retrieved grounding documents.

use std::env;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::Instant;

use serde_json::{json, Value};

use lexdb_cli::{build_pipeline, init_tracing, preview};
use lexdb_core::config::Config;

struct BatchArgs {
    in_path: PathBuf,
    out_path: PathBuf,
    limit: usize,
}

fn parse_args() -> BatchArgs {
    let mut in_path = PathBuf::from("tests/questions.jsonl");
    let mut out_path = PathBuf::from("tests/results.jsonl");
    let mut limit = 0usize;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--in" => in_path = PathBuf::from(args.next().unwrap_or_default()),
            "--out" => out_path = PathBuf::from(args.next().unwrap_or_default()),
            "--limit" => limit = args.next().and_then(|v| v.parse().ok()).unwrap_or(0),
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Usage: lexdb-batch [--in questions.jsonl] [--out results.jsonl] [--limit N]");
                std::process::exit(1);
            }
        }
    }
    BatchArgs { in_path, out_path, limit }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = parse_args();
    let config = Config::load()?;
    let pipeline = build_pipeline(&config)?;

    if let Some(parent) = args.out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let input = fs::File::open(&args.in_path)
        .map_err(|e| anyhow::anyhow!("cannot open {}: {e}", args.in_path.display()))?;
    let mut output = fs::OpenOptions::new().create(true).append(true).open(&args.out_path)?;

    let run_id = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut processed = 0usize;

    for line in BufReader::new(input).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item: Value = serde_json::from_str(&line)?;
        let qid = item.get("id").cloned().unwrap_or(Value::Null);
        let Some(query) = item.get("query").and_then(Value::as_str) else {
            continue;
        };

        let started = Instant::now();
        let outcome = pipeline.run(query)?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let routing: Value = if outcome.routed_acts.is_empty() {
            json!("ALL (fallback)")
        } else {
            json!(outcome.routed_acts)
        };
        let docs: Vec<Value> = outcome
            .docs
            .iter()
            .map(|d| {
                let m = &d.chunk.metadata;
                json!({
                    "source": m.source,
                    "act_name": m.act_name,
                    "article": m.article,
                    "paragraph": m.paragraph,
                    "page": m.page,
                    "preview": preview(&d.chunk.content, 500),
                })
            })
            .collect();
        let record = json!({
            "run_id": run_id,
            "id": qid,
            "query": query,
            "routing": routing,
            "stage": format!("{:?}", outcome.stage),
            "grounded": outcome.grounded,
            "elapsed_ms": elapsed_ms,
            "docs": docs,
        });
        writeln!(output, "{}", record)?;

        processed += 1;
        println!("[{processed}] {query} -> {} docs ({elapsed_ms} ms)", outcome.docs.len());
        if args.limit > 0 && processed >= args.limit {
            break;
        }
    }

    println!("Done: {} questions, results appended to {}", processed, args.out_path.display());
    Ok(())
}
