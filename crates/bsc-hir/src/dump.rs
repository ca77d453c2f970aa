//! Textual HIR dump: one `bb_<id>:` header per block, one
//! `  %<id> = <mnemonic> [operands]` line per node, operands rendered as
//! `$N` for integer immediates, `%N` for node references, `bb_N` for
//! block references.

use crate::block::{NodeId, Op, Proc};
use std::fmt::Write;

pub fn dump(proc: &Proc) -> String {
    let mut out = String::new();
    for block in proc.blocks() {
        writeln!(out, "{}:", block).unwrap();
        for node in proc.nodes_in(block) {
            writeln!(out, "  {} = {}", node, format_op(proc.node(node).op.clone())).unwrap();
        }
    }
    out
}

fn format_op(op: Op) -> String {
    match op {
        Op::IntConst(v) => format!("int_const ${}", v),
        Op::Add(a, b) => format!("add {}, {}", render(a), render(b)),
        Op::Sub(a, b) => format!("sub {}, {}", render(a), render(b)),
        Op::Mul(a, b) => format!("mul {}, {}", render(a), render(b)),
        Op::Div(a, b) => format!("div {}, {}", render(a), render(b)),
        Op::Load { addr } => format!("load {}", render(addr)),
        Op::Assign { addr, value } => format!("assign {}, {}", render(addr), render(value)),
        Op::Local => "local".to_string(),
        Op::Jump { target } => format!("jump {}", target),
        Op::Branch {
            predicate,
            then_block,
            else_block,
        } => format!(
            "branch {}, {}, {}",
            render(predicate),
            then_block,
            else_block
        ),
        Op::Ret { value } => match value {
            Some(v) => format!("ret {}", render(v)),
            None => "ret".to_string(),
        },
    }
}

fn render(id: NodeId) -> String {
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::HirBuilder;
    use crate::token::{Token, TokenKind};

    fn tok() -> Token {
        Token {
            kind: TokenKind::IntLiteral,
            start: 0,
            length: 1,
            line: 1,
        }
    }

    #[test]
    fn dumps_block_header_and_node_lines() {
        let mut b = HirBuilder::new();
        b.new_block();
        let n0 = b.push_node(Op::IntConst(7), tok());
        b.push_node(Op::Ret { value: Some(n0) }, tok());
        let proc = b.finish();
        let text = dump(&proc);
        assert!(text.starts_with("bb_0:\n"));
        assert!(text.contains("= int_const $7"));
        assert!(text.contains(&format!("= ret {}", n0)));
    }
}
