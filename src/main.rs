//! Compiler entry point: read the fixed sample source, parse it into
//! HIR, dump the HIR, lower to an SB graph, optimize, dump Graphviz,
//! and hand the result to the (stub) Win64 backend.

use anyhow::Context as _;
use bsc_support::ScratchPool;
use std::process::ExitCode;

const SOURCE_PATH: &str = "samples/test.bs";

fn main() -> ExitCode {
    env_logger::init();

    let source = match std::fs::read_to_string(SOURCE_PATH).context("reading source file") {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{err:?}");
            return ExitCode::FAILURE;
        }
    };

    let hir_proc = match bsc_frontend::parse_source(&source) {
        Ok(proc) => proc,
        Err(err) => {
            eprintln!("{}", err.render(SOURCE_PATH, &source));
            return ExitCode::FAILURE;
        }
    };

    print!("{}", bsc_hir::dump(&hir_proc));

    let (mut ctx, proc) = bsc_sb::lower(&hir_proc);
    let proc = bsc_sb::sb_proc(&mut ctx, proc.start, proc.end);
    bsc_sb::opt(&mut ctx, &proc);

    print!("{}", bsc_sb::dump_graphviz(&ctx, &proc));

    let scratch = ScratchPool::new(2);
    bsc_backend::generate_win64(&ctx, &proc, &scratch);

    ExitCode::SUCCESS
}
