//! Recursive-descent parser building HIR directly: there is no separate
//! AST. Each production appends nodes onto whatever block is currently
//! open and creates new blocks when control flow demands one,
//! construct-now and back-patch the jump target once it's known.

use crate::error::{CompileError, ParseError, SemanticError};
use crate::lexer::Lexer;
use crate::scope::Scope;
use bsc_hir::{BlockId, HirBuilder, NodeId, Op, Proc, Token, TokenKind};
use bsc_support::EntityRef;

type PResult<T> = Result<T, CompileError>;

pub fn parse_source(source: &str) -> PResult<Proc> {
    let mut p = Parser {
        lexer: Lexer::new(source),
        builder: HirBuilder::new(),
        last_rbrace: Token::synthetic(),
    };

    let control_flow_head = p.builder.new_block();

    let scope = Scope::root();
    let stmt = p.parse_block(&scope)?;

    if let Some(expr) = stmt {
        let token = p.builder.node_token(expr);
        p.builder
            .push_node(Op::Ret { value: Some(expr) }, token);
    }

    let proc = p.builder.finish();
    debug_assert_eq!(proc.control_flow_head, control_flow_head);
    Ok(proc)
}

struct Parser<'s> {
    lexer: Lexer<'s>,
    builder: HirBuilder,
    last_rbrace: Token,
}

impl<'s> Parser<'s> {
    fn peek(&mut self) -> Token {
        self.lexer.peek()
    }

    fn lex(&mut self) -> Token {
        self.lexer.lex()
    }

    fn error(&self, token: Token, message: impl Into<String>) -> CompileError {
        ParseError {
            token,
            message: message.into(),
        }
        .into()
    }

    fn semantic_error(&self, token: Token, message: impl Into<String>) -> CompileError {
        SemanticError {
            token,
            message: message.into(),
        }
        .into()
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> PResult<Token> {
        let tok = self.peek();
        if tok.kind != kind {
            return Err(self.error(tok, message));
        }
        Ok(self.lex())
    }

    fn expect_punct(&mut self, byte: u8, message: &str) -> PResult<Token> {
        self.expect(TokenKind::Punct(byte), message)
    }

    fn at_punct(&mut self, byte: u8) -> bool {
        self.peek().kind == TokenKind::Punct(byte)
    }

    fn until_rbrace(&mut self) -> bool {
        let kind = self.peek().kind;
        kind != TokenKind::Punct(b'}') && kind != TokenKind::Eof
    }

    // ---- expressions ----

    fn parse_primary(&mut self, scope: &Scope) -> PResult<NodeId> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::IntLiteral => {
                self.lex();
                let mut value: i128 = 0;
                for byte in tok.text(self.source()).bytes() {
                    value = value * 10 + (byte - b'0') as i128;
                }
                Ok(self.builder.push_node(Op::IntConst(value), tok))
            }
            TokenKind::Punct(b'{') => self.parse_expr(scope),
            TokenKind::Ident => {
                self.lex();
                let name = tok.text(self.source());
                let symbol = scope
                    .find(name)
                    .ok_or_else(|| self.semantic_error(tok, "symbol doesn't exist in this scope"))?;
                Ok(self.builder.push_node(Op::Load { addr: symbol }, tok))
            }
            _ => Err(self.error(tok, "unexpected token here")),
        }
    }

    fn source(&self) -> &str {
        self.lexer.source_text()
    }

    fn binary_prec(op: Token) -> i32 {
        match op.kind {
            TokenKind::Punct(b'*') | TokenKind::Punct(b'/') => 20,
            TokenKind::Punct(b'+') | TokenKind::Punct(b'-') => 10,
            _ => 0,
        }
    }

    fn make_binary(&mut self, op: Token, lhs: NodeId, rhs: NodeId) -> PResult<NodeId> {
        let ctor: fn(NodeId, NodeId) -> Op = match op.kind {
            TokenKind::Punct(b'+') => Op::Add,
            TokenKind::Punct(b'-') => Op::Sub,
            TokenKind::Punct(b'*') => Op::Mul,
            TokenKind::Punct(b'/') => Op::Div,
            _ => return Err(self.error(op, "not a binary operator")),
        };
        Ok(self.builder.push_node(ctor(lhs, rhs), op))
    }

    fn parse_binary(&mut self, scope: &Scope, caller_prec: i32) -> PResult<NodeId> {
        let mut left = self.parse_primary(scope)?;

        while Self::binary_prec(self.peek()) > caller_prec {
            let op = self.lex();
            let right = self.parse_binary(scope, Self::binary_prec(op))?;
            left = self.make_binary(op, left, right)?;
        }

        Ok(left)
    }

    /// The address a value came from, needed on the left of `=`. Only a
    /// `load` yields one — loading is how a name turns into a value, so
    /// undoing a load recovers the local it read from.
    fn address_of(&mut self, node: NodeId) -> PResult<NodeId> {
        match *self.builder.node_op(node) {
            Op::Load { addr } => Ok(addr),
            _ => {
                let token = self.builder.node_token(node);
                Err(self.semantic_error(token, "cannot assign this expression"))
            }
        }
    }

    fn parse_assign(&mut self, scope: &Scope) -> PResult<NodeId> {
        let left = self.parse_binary(scope, 0)?;

        if self.at_punct(b'=') {
            let eq = self.lex();
            let right = self.parse_assign(scope)?;
            let addr = self.address_of(left)?;
            self.builder
                .push_node(Op::Assign { addr, value: right }, eq);
            return Ok(right);
        }

        Ok(left)
    }

    fn parse_natural_expr(&mut self, scope: &Scope) -> PResult<NodeId> {
        self.parse_assign(scope)
    }

    fn parse_expr(&mut self, scope: &Scope) -> PResult<NodeId> {
        let tok = self.peek();
        if tok.kind == TokenKind::Punct(b'{') {
            let stmt = self.parse_block(scope)?;
            stmt.ok_or_else(|| self.semantic_error(tok, "block does not produce a value"))
        } else {
            self.parse_natural_expr(scope)
        }
    }

    // ---- statements ----

    fn parse_block(&mut self, surrounding: &Scope) -> PResult<Option<NodeId>> {
        self.expect_punct(b'{', "expected a {} block here")?;

        let mut scope = surrounding.child();
        let mut block_expr = None;

        while self.until_rbrace() {
            let tok = self.peek();
            match tok.kind {
                TokenKind::Punct(b'{') => {
                    let stmt = self.parse_block(&scope)?;
                    if stmt.is_some() && self.at_punct(b'}') {
                        block_expr = stmt;
                    }
                }
                TokenKind::KwIf => {
                    self.parse_if(&scope)?;
                }
                TokenKind::KwWhile => {
                    self.parse_while(&scope)?;
                }
                TokenKind::KwReturn => {
                    self.parse_return(&scope)?;
                }
                TokenKind::KwLet => {
                    self.parse_let(&mut scope)?;
                }
                _ => {
                    let expr = self.parse_natural_expr(&scope)?;
                    match self.peek().kind {
                        TokenKind::Punct(b';') => {
                            self.lex();
                        }
                        TokenKind::Punct(b'}') => {
                            block_expr = Some(expr);
                        }
                        _ => {
                            let here = self.peek();
                            return Err(self.error(here, "ill-formed expression"));
                        }
                    }
                }
            }
        }

        self.last_rbrace = self.peek();
        self.expect_punct(b'}', "missing a closing } here")?;

        Ok(block_expr)
    }

    fn parse_if(&mut self, scope: &Scope) -> PResult<()> {
        let if_tok = self.peek();
        self.expect(TokenKind::KwIf, "expecting an if statement here")?;

        let predicate = self.parse_expr(scope)?;
        let branch = self.builder.push_node(
            Op::Branch {
                predicate,
                then_block: BlockId::new(0),
                else_block: BlockId::new(0),
            },
            if_tok,
        );

        let loc_then = self.builder.new_block();
        self.parse_block(scope)?;
        let jump_then = self.builder.push_node(
            Op::Jump {
                target: BlockId::new(0),
            },
            self.last_rbrace,
        );

        let loc_else = self.builder.new_block();
        let mut loc_end = loc_else;

        if self.peek().kind == TokenKind::KwElse {
            self.lex();
            self.parse_block(scope)?;
            let jump_else = self.builder.push_node(
                Op::Jump {
                    target: BlockId::new(0),
                },
                self.last_rbrace,
            );
            loc_end = self.builder.new_block();
            self.patch_jump(jump_else, loc_end);
        }

        self.patch_branch(branch, predicate, loc_then, loc_else);
        self.patch_jump(jump_then, loc_end);

        Ok(())
    }

    fn parse_while(&mut self, scope: &Scope) -> PResult<()> {
        let while_tok = self.peek();
        self.expect(TokenKind::KwWhile, "expecting a while loop here")?;

        let init_jump = self.builder.push_node(
            Op::Jump {
                target: BlockId::new(0),
            },
            while_tok,
        );
        let start = self.builder.new_block();

        let predicate = self.parse_expr(scope)?;
        let branch = self.builder.push_node(
            Op::Branch {
                predicate,
                then_block: BlockId::new(0),
                else_block: BlockId::new(0),
            },
            while_tok,
        );

        let loc_then = self.builder.new_block();
        self.parse_block(scope)?;
        let loop_jump = self.builder.push_node(
            Op::Jump {
                target: BlockId::new(0),
            },
            self.last_rbrace,
        );

        let end = self.builder.new_block();

        self.patch_jump(init_jump, start);
        self.patch_branch(branch, predicate, loc_then, end);
        self.patch_jump(loop_jump, start);

        Ok(())
    }

    fn parse_return(&mut self, scope: &Scope) -> PResult<()> {
        let return_tok = self.peek();
        self.expect(TokenKind::KwReturn, "expected a return statement here")?;

        let value = if self.at_punct(b';') {
            None
        } else {
            Some(self.parse_expr(scope)?)
        };

        self.expect_punct(b';', "ill-formed return statement")?;

        self.builder.push_node(Op::Ret { value }, return_tok);
        self.builder.new_block();

        Ok(())
    }

    fn parse_let(&mut self, scope: &mut Scope) -> PResult<()> {
        self.expect(TokenKind::KwLet, "expected a local variable declaration")?;

        let name_tok = self.peek();
        self.expect(TokenKind::Ident, "this is not a valid variable name")?;
        self.expect_punct(b';', "expected ';'")?;

        let name = name_tok.text(self.source()).to_string();
        if scope.find(&name).is_some() {
            return Err(self.semantic_error(name_tok, "symbol clashes with an existing name"));
        }

        let local = self.builder.push_node(Op::Local, name_tok);
        scope.insert(name, local);

        Ok(())
    }

    // ---- back-patching ----

    fn patch_jump(&mut self, jump: NodeId, target: BlockId) {
        if let Op::Jump { target: slot } = self.builder.node_op_mut(jump) {
            *slot = target;
        } else {
            unreachable!("patch_jump called on a non-jump node");
        }
    }

    fn patch_branch(
        &mut self,
        branch: NodeId,
        predicate: NodeId,
        then_block: BlockId,
        else_block: BlockId,
    ) {
        if let Op::Branch {
            predicate: p,
            then_block: t,
            else_block: e,
        } = self.builder.node_op_mut(branch)
        {
            *p = predicate;
            *t = then_block;
            *e = else_block;
        } else {
            unreachable!("patch_branch called on a non-branch node");
        }
    }
}
