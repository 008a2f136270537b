use std::env;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use lexdb_cli::{build_pipeline, docs_dir, index_dir, init_tracing, print_document, STATUTE_TABLE};
use lexdb_core::config::Config;
use lexdb_core::traits::NullEntityExtractor;
use lexdb_index::{hash_embedder, LanceStatuteWriter};
use lexdb_ingest::loader::ChunkingConfig;
use lexdb_ingest::run_ingest;
use lexdb_pipeline::{PipelineOutcome, StatutePipeline};

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <ingest|query|chat> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn show_outcome(outcome: &PipelineOutcome, query: &str) {
    println!("\n{}", "=".repeat(90));
    println!("ZAPYTANIE : {}", query);
    if outcome.routed_acts.is_empty() {
        println!("ROUTING   : ALL (fallback)");
    } else {
        println!("ROUTING   : {}", outcome.routed_acts.join(", "));
    }
    println!("ETAP      : {:?}", outcome.stage);
    if outcome.reranked {
        println!("RERANK    : tak");
    }
    println!("{}", "=".repeat(90));

    if !outcome.grounded {
        println!("\nBrak podstawy w zaindeksowanych przepisach: pytanie o sankcję");
        println!("nie znajduje pokrycia w tekstach karnych. Odpowiedź nie zostanie udzielona.");
        return;
    }
    if outcome.docs.is_empty() {
        println!("\nBrak wyników.");
        return;
    }
    for (i, doc) in outcome.docs.iter().enumerate() {
        print_document(i + 1, doc, 400);
    }
    println!("\nŹródła:");
    for doc in &outcome.docs {
        println!("- {}, strona {}", doc.chunk.metadata.source, doc.chunk.metadata.page);
    }
}

fn run_query_loop(pipeline: &StatutePipeline) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    loop {
        print!("\nTy: ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if ["wyjdz", "exit", "quit"].contains(&query.to_lowercase().as_str()) {
            println!("Do widzenia!");
            break;
        }
        let outcome = pipeline.run(query)?;
        show_outcome(&outcome, query);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ingest" => {
            let dir = args.first().map(PathBuf::from).unwrap_or_else(|| docs_dir(&config));
            println!("Ingesting from {}", dir.display());
            let index_path = index_dir(&config);
            let writer = tokio::runtime::Runtime::new()?.block_on(async {
                LanceStatuteWriter::new(&index_path, STATUTE_TABLE, hash_embedder()).await
            })?;
            let chunking = ChunkingConfig {
                chunk_size: config.get_or("ingest.chunk_size", 1000usize),
                overlap: config.get_or("ingest.chunk_overlap", 200usize),
            };
            let report = run_ingest(&dir, &writer, &NullEntityExtractor, &chunking)?;
            println!(
                "Ingest complete: {} files in, {} skipped, {} failed, {} chunks indexed",
                report.files_found, report.files_skipped, report.files_failed, report.chunks_indexed
            );
        }
        "query" => {
            let query = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: lexdb query \"<question>\"");
                std::process::exit(1)
            });
            let pipeline = build_pipeline(&config)?;
            let outcome = pipeline.run(&query)?;
            show_outcome(&outcome, &query);
        }
        "chat" => {
            let pipeline = build_pipeline(&config)?;
            run_query_loop(&pipeline)?;
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}
