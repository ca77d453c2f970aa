//! Win64 code emission. Runs the scheduler over a scratch arena and
//! stops there — instruction selection and register allocation are not
//! implemented.

use bsc_sb::{schedule, Context, Proc};
use bsc_support::ScratchPool;
use log::debug;

pub fn generate(ctx: &Context, proc: &Proc, scratch: &ScratchPool) {
    let handle = scratch.acquire(&[]).expect("win64 backend needs one free scratch slot");

    let sched = schedule(ctx, proc);
    debug!("win64: scheduled {} block(s)", sched.blocks().count());

    handle.release();
}
