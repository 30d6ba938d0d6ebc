use anyhow::Context;
use blkfile_scan::{BlockScanner, Frame};
use colored::Colorize;
use serde_json::json;

use crate::cli::{Cli, OutputFormat};

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let file = std::fs::File::open(&cli.file)
        .with_context(|| format!("opening {}", cli.file.display()))?;
    // Read-only map; the scanner only ever borrows the buffer.
    let data = unsafe { memmap2::Mmap::map(&file) }
        .with_context(|| format!("memory-mapping {}", cli.file.display()))?;
    tracing::debug!(bytes = data.len(), file = %cli.file.display(), "mapped block file");

    let scanner = BlockScanner::with_policy(&data, cli.resync.into());
    let limit = cli.limit.unwrap_or(usize::MAX);
    let mut decoded = 0usize;
    let mut failed = 0usize;

    for result in scanner {
        match result {
            Ok(frame) => {
                match cli.format {
                    OutputFormat::Text => print_text(&frame),
                    OutputFormat::Json => print_json(&frame),
                }
                decoded += 1;
                if decoded >= limit {
                    break;
                }
            }
            Err(err) => {
                eprintln!("{} {err}", "error:".red().bold());
                failed += 1;
            }
        }
    }

    eprintln!(
        "{} {} block(s) decoded, {} frame(s) failed",
        "done:".green().bold(),
        decoded,
        failed
    );
    Ok(())
}

fn print_text(frame: &Frame) {
    let block = &frame.block;
    let header = &block.header;
    println!(
        "{} {}",
        format!("[{:>10}]", frame.offset).dimmed(),
        header.hash.to_hex().cyan()
    );
    println!(
        "  time {}  difficulty {:.8}  txs {}",
        header.timestamp,
        header.difficulty,
        block.transactions.len().to_string().bold()
    );
    if let Some(mismatch) = block.size_mismatch() {
        println!(
            "  {} declared {} bytes, decoded {}",
            "size mismatch:".yellow(),
            mismatch.declared,
            mismatch.actual
        );
    }
    for tx in &block.transactions {
        let tag = if tx.is_coinbase() { " coinbase" } else { "" };
        println!(
            "  tx {}  in {} out {}{}",
            tx.txid.to_hex(),
            tx.inputs.len(),
            tx.outputs.len(),
            tag.yellow()
        );
        for output in &tx.outputs {
            println!("    {:>16} sat  {}", output.value, output.shape());
        }
    }
}

fn print_json(frame: &Frame) {
    let block = &frame.block;
    let header = &block.header;
    let value = json!({
        "offset": frame.offset,
        "hash": header.hash.to_hex(),
        "version": header.version,
        "prev_block_hash": header.prev_block_hash.to_hex(),
        "merkle_root": header.merkle_root.to_hex(),
        "timestamp": header.timestamp,
        "bits": header.bits,
        "nonce": header.nonce,
        "difficulty": header.difficulty,
        "declared_size": block.declared_size,
        "consumed": block.consumed,
        "size_mismatch": block.size_mismatch().map(|m| json!({
            "declared": m.declared,
            "actual": m.actual,
        })),
        "transactions": block.transactions.iter().map(|tx| json!({
            "txid": tx.txid.to_hex(),
            "version": tx.version,
            "coinbase": tx.is_coinbase(),
            "lock_time": tx.lock_time,
            "inputs": tx.inputs.iter().map(|input| json!({
                "prev_tx_hash": input.prev_tx_hash.to_hex(),
                "prev_tx_index": input.prev_tx_index,
                "sequence": input.sequence,
                "script_len": input.script.raw().len(),
            })).collect::<Vec<_>>(),
            "outputs": tx.outputs.iter().map(|output| json!({
                "value": output.value,
                "shape": output.shape(),
                "script": hex::encode(output.script.raw()),
            })).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
    });
    println!("{value}");
}
