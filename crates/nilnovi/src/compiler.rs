//! Recursive-descent parser and code generator for NilNovi.
//!
//! Each grammar production is one method on [`Compiler`]. Parsing and code
//! generation are fused: as a production is recognized, instructions are
//! appended to the [`Program`] and declarations are recorded in the
//! [`IdentifierTable`]. Branches are emitted with a placeholder target of 0
//! and patched in place once the target address is known, so no construct
//! needs to predict how later emission will shift addresses.
//!
//! Callable bodies are compiled where they are declared; a `tra` emitted
//! ahead of each declaration group (and patched once the group ends) makes
//! control skip the bodies at run time. A callable's recorded entry address
//! is one short of its first instruction's address, and call sites
//! compensate by targeting `address + 1`.

use tracing::debug;

use crate::bytecode::{Op, Program};
use crate::error::{Error, Result};
use crate::lexer::{Lexer, TokenStream};
use crate::table::{CallableKind, Entry, EntryId, IdentifierTable, Type};
use crate::token::{Keyword, Symbol, TokenKind};

/// The result of compiling one NNP source text.
pub struct Compilation {
    pub program: Program,
    pub identifiers: IdentifierTable,
}

/// Compile NNP source text into an instruction stream.
///
/// This is the main entry point. The first error aborts compilation; there
/// is no recovery.
pub fn compile(source: &str) -> Result<Compilation> {
    let tokens = Lexer::tokenize(source)?;
    Compiler::new(TokenStream::new(tokens)).run()
}

pub struct Compiler {
    tokens: TokenStream,
    program: Program,
    table: IdentifierTable,
    /// The innermost callable currently being compiled.
    scope: Option<EntryId>,
    /// Identifiers of a declaration list, waiting for the type that follows
    /// them (`a, b, c : integer`), with their source positions.
    pending: Vec<(String, usize, usize)>,
}

impl Compiler {
    pub fn new(tokens: TokenStream) -> Self {
        Self {
            tokens,
            program: Program::new(),
            table: IdentifierTable::new(),
            scope: None,
            pending: Vec::new(),
        }
    }

    pub fn run(mut self) -> Result<Compilation> {
        self.parse_program()?;
        Ok(Compilation {
            program: self.program,
            identifiers: self.table,
        })
    }

    // -----------------------------------------------------------------------
    // Emission helpers
    // -----------------------------------------------------------------------

    /// 1-based address of the next instruction to be emitted.
    fn next_address(&self) -> usize {
        self.program.len() + 1
    }

    /// Emit a branch with a placeholder target. Returns the index of the
    /// emitted instruction so it can be patched later.
    fn emit_jump(&mut self, make_op: fn(usize) -> Op) -> usize {
        let idx = self.program.len();
        self.program.emit(make_op(0));
        idx
    }

    /// Patch a previously emitted branch to point at `target`.
    fn patch_jump(&mut self, idx: usize, target: usize) {
        match self.program.op_mut(idx) {
            Op::Tra(t) | Op::Tze(t) => *t = target,
            _ => panic!("patch_jump called on a non-branch instruction"),
        }
    }

    // -----------------------------------------------------------------------
    // Table helpers
    // -----------------------------------------------------------------------

    fn lookup(&self, name: &str, line: usize, column: usize) -> Result<Entry> {
        match self.table.get_by_name(name) {
            Some((_, entry)) => Ok(entry.clone()),
            None => Err(Error::Name {
                line,
                column,
                message: format!("'{name}' is not declared"),
            }),
        }
    }

    fn leave_scope(&mut self) {
        self.scope = self.scope.and_then(|id| self.table.callable(id).scope);
    }

    /// Drain the pending declaration queue into the current scope, assigning
    /// consecutive frame addresses.
    fn declare_pending(&mut self, ty: Type, is_in: bool, is_out: bool) -> Result<()> {
        let scope = self
            .scope
            .expect("declarations always occur inside a callable scope");
        for (name, line, column) in std::mem::take(&mut self.pending) {
            let address = self.table.callable(scope).variables.len();
            self.table
                .add_variable(name.clone(), ty, scope, is_in, is_out, address)
                .map_err(|_| Error::Name {
                    line,
                    column,
                    message: format!("variable '{name}' is already declared in this scope"),
                })?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Program structure
    // -----------------------------------------------------------------------

    /// `program := { declaOp ";" } "procedure" IDENT "is" corpsProgPrinc`
    ///
    /// Callable declarations may precede the program header; `procedure X (`
    /// is a declaration (the formal part is mandatory there), `procedure X
    /// is` the header.
    fn parse_program(&mut self) -> Result<()> {
        self.program.emit(Op::DebutProg);

        if self.at_leading_callable() {
            let skip = self.emit_jump(Op::Tra);
            while self.at_leading_callable() {
                self.callable_decl()?;
                self.tokens.accept_character(';')?;
            }
            self.patch_jump(skip, self.next_address());
        }

        self.tokens.accept_keyword(Keyword::Procedure)?;
        let (name, _, _) = self.tokens.accept_identifier()?;
        debug!(program = %name, "parsing program header");
        let main = self
            .table
            .add_callable(name, CallableKind::Procedure, None, 0);
        self.scope = Some(main);
        self.tokens.accept_keyword(Keyword::Is)?;
        self.main_body()
    }

    fn at_leading_callable(&self) -> bool {
        if self.tokens.is_keyword(Keyword::Function) {
            return true;
        }
        self.tokens.is_keyword(Keyword::Procedure)
            && matches!(self.tokens.peek_kind(2), Some(TokenKind::Character('(')))
    }

    /// `corpsProgPrinc := [partieDecla] "begin" [suiteInstr] "end" EOF`
    fn main_body(&mut self) -> Result<()> {
        if !self.tokens.is_keyword(Keyword::Begin) {
            debug!("parsing declarations");
            self.declarations()?;
        }
        self.tokens.accept_keyword(Keyword::Begin)?;
        if !self.tokens.is_keyword(Keyword::End) {
            self.statement_list()?;
        }
        self.tokens.accept_keyword(Keyword::End)?;
        self.tokens.accept_eof()?;
        self.program.emit(Op::FinProg);
        Ok(())
    }

    /// `partieDecla := listeDeclaOp listeDeclaVar? | listeDeclaVar`
    ///
    /// When the section declares callables, a `tra` is emitted before their
    /// bodies and patched to the first instruction after the last of them.
    fn declarations(&mut self) -> Result<()> {
        if self.tokens.is_keyword(Keyword::Procedure) || self.tokens.is_keyword(Keyword::Function) {
            let skip = self.emit_jump(Op::Tra);
            loop {
                self.callable_decl()?;
                self.tokens.accept_character(';')?;
                if !self.tokens.is_keyword(Keyword::Procedure)
                    && !self.tokens.is_keyword(Keyword::Function)
                {
                    break;
                }
            }
            self.patch_jump(skip, self.next_address());
            if !self.tokens.is_keyword(Keyword::Begin) {
                self.var_decl_list()?;
            }
        } else {
            self.var_decl_list()?;
        }
        Ok(())
    }

    fn callable_decl(&mut self) -> Result<()> {
        if self.tokens.is_keyword(Keyword::Procedure) {
            self.procedure_decl()
        } else {
            self.function_decl()
        }
    }

    /// `procedure := "procedure" IDENT partieFormelle "is" corpsProc`
    fn procedure_decl(&mut self) -> Result<()> {
        self.tokens.accept_keyword(Keyword::Procedure)?;
        let (name, _, _) = self.tokens.accept_identifier()?;
        debug!(procedure = %name, "parsing procedure declaration");
        // The skip-jump of the declaration group is already in the stream,
        // so `len()` here is one less than the body's first address — the
        // off-by-one every call site compensates for with `address + 1`.
        let entry = self.table.add_callable(
            name,
            CallableKind::Procedure,
            self.scope,
            self.program.len(),
        );
        self.scope = Some(entry);
        self.formal_part()?;
        self.tokens.accept_keyword(Keyword::Is)?;

        if !self.tokens.is_keyword(Keyword::Begin) {
            self.var_decl_list()?;
        }
        self.tokens.accept_keyword(Keyword::Begin)?;
        if !self.tokens.is_keyword(Keyword::End) {
            self.statement_list()?;
        }
        self.tokens.accept_keyword(Keyword::End)?;
        self.program.emit(Op::RetourProc);
        self.leave_scope();
        Ok(())
    }

    /// `fonction := "function" IDENT partieFormelle "return" type "is" corpsFonct`
    ///
    /// The body's `return` statements emit `retourFonct`; there is no
    /// implicit epilogue, so a function body must not be empty.
    fn function_decl(&mut self) -> Result<()> {
        self.tokens.accept_keyword(Keyword::Function)?;
        let (name, _, _) = self.tokens.accept_identifier()?;
        debug!(function = %name, "parsing function declaration");
        let entry = self.table.add_callable(
            name,
            CallableKind::Function,
            self.scope,
            self.program.len(),
        );
        self.scope = Some(entry);
        self.formal_part()?;
        self.tokens.accept_keyword(Keyword::Return)?;
        let return_type = self.parse_type()?;
        self.table.callable_mut(entry).return_type = Some(return_type);
        self.tokens.accept_keyword(Keyword::Is)?;

        if !self.tokens.is_keyword(Keyword::Begin) {
            self.var_decl_list()?;
        }
        self.tokens.accept_keyword(Keyword::Begin)?;
        self.statement_list()?;
        self.tokens.accept_keyword(Keyword::End)?;
        self.leave_scope();
        Ok(())
    }

    /// `partieFormelle := "(" [listeSpecifFormelles] ")"`
    fn formal_part(&mut self) -> Result<()> {
        self.tokens.accept_character('(')?;
        if !self.tokens.is_character(')') {
            loop {
                self.formal_spec()?;
                if self.tokens.is_character(')') {
                    break;
                }
                self.tokens.accept_character(';')?;
            }
        }
        self.tokens.accept_character(')')
    }

    /// `specif := listeIdent ":" [mode] type`
    ///
    /// Every formal is a parameter (`inStatus` true); the `out` half of the
    /// mode marks it passed by reference.
    fn formal_spec(&mut self) -> Result<()> {
        self.ident_list()?;
        self.tokens.accept_character(':')?;
        let mut is_out = false;
        if self.tokens.is_keyword(Keyword::In) {
            self.tokens.accept_keyword(Keyword::In)?;
            if self.tokens.is_keyword(Keyword::Out) {
                self.tokens.accept_keyword(Keyword::Out)?;
                is_out = true;
            }
        }
        let ty = self.parse_type()?;
        self.declare_pending(ty, true, is_out)
    }

    /// `type := "integer" | "boolean"`
    fn parse_type(&mut self) -> Result<Type> {
        if self.tokens.is_keyword(Keyword::Integer) {
            self.tokens.accept_keyword(Keyword::Integer)?;
            Ok(Type::Integer)
        } else if self.tokens.is_keyword(Keyword::Boolean) {
            self.tokens.accept_keyword(Keyword::Boolean)?;
            Ok(Type::Boolean)
        } else {
            let (line, column) = self.tokens.here();
            Err(Error::Semantic {
                line,
                column,
                message: format!("unknown type '{}'", self.tokens.current_value()),
            })
        }
    }

    /// `listeDeclaVar := declaVar+`
    fn var_decl_list(&mut self) -> Result<()> {
        self.var_decl()?;
        while self.tokens.is_identifier() {
            self.var_decl()?;
        }
        Ok(())
    }

    /// `declaVar := listeIdent ":" type ";"` — reserves one stack slot per
    /// declared name.
    fn var_decl(&mut self) -> Result<()> {
        let count = self.ident_list()?;
        self.tokens.accept_character(':')?;
        self.program.emit(Op::Reserver(count));
        let ty = self.parse_type()?;
        self.declare_pending(ty, false, false)?;
        self.tokens.accept_character(';')
    }

    /// `listeIdent := IDENT ("," listeIdent)?` — queues the names for the
    /// type that follows, returning how many were queued.
    fn ident_list(&mut self) -> Result<usize> {
        let mut count = 1;
        let ident = self.tokens.accept_identifier()?;
        debug!(identifier = %ident.0, "identifier found");
        self.pending.push(ident);
        while self.tokens.is_character(',') {
            self.tokens.accept_character(',')?;
            self.pending.push(self.tokens.accept_identifier()?);
            count += 1;
        }
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn at_statement_start(&self) -> bool {
        self.tokens.is_keyword(Keyword::While)
            || self.tokens.is_keyword(Keyword::If)
            || self.tokens.is_keyword(Keyword::Get)
            || self.tokens.is_keyword(Keyword::Put)
            || self.tokens.is_keyword(Keyword::Return)
            || self.tokens.is_identifier()
    }

    /// `suiteInstrNonVide := instr (";" suiteInstrNonVide)?`
    ///
    /// A `;` after the last instruction is tolerated: the list continues
    /// only if the next token can begin an instruction.
    fn statement_list(&mut self) -> Result<()> {
        self.statement()?;
        while self.tokens.is_character(';') {
            self.tokens.accept_character(';')?;
            if !self.at_statement_start() {
                break;
            }
            self.statement()?;
        }
        Ok(())
    }

    fn statement(&mut self) -> Result<()> {
        if self.tokens.is_keyword(Keyword::While) {
            self.while_loop()
        } else if self.tokens.is_keyword(Keyword::If) {
            self.conditional()
        } else if self.tokens.is_keyword(Keyword::Get) || self.tokens.is_keyword(Keyword::Put) {
            self.io_statement()
        } else if self.tokens.is_keyword(Keyword::Return) {
            self.return_statement()
        } else if self.tokens.is_identifier() {
            self.assign_or_call()
        } else {
            Err(self.tokens.parse_error("an instruction"))
        }
    }

    /// `boucle := "while" expression "loop" suiteInstr "end"`
    ///
    /// Layout: condition, `tze` past the loop, body, `tra` back to the
    /// condition.
    fn while_loop(&mut self) -> Result<()> {
        debug!("parsing while loop");
        self.tokens.accept_keyword(Keyword::While)?;
        let loop_start = self.next_address();
        self.expression()?;
        self.tokens.accept_keyword(Keyword::Loop)?;
        let exit_jump = self.emit_jump(Op::Tze);

        if !self.tokens.is_keyword(Keyword::End) {
            self.statement_list()?;
        }
        self.program.emit(Op::Tra(loop_start));
        self.patch_jump(exit_jump, self.next_address());
        self.tokens.accept_keyword(Keyword::End)
    }

    /// `altern := "if" expression "then" suiteInstr ["else" suiteInstr] "end"`
    fn conditional(&mut self) -> Result<()> {
        debug!("parsing if");
        self.tokens.accept_keyword(Keyword::If)?;
        self.expression()?;
        self.tokens.accept_keyword(Keyword::Then)?;
        let else_jump = self.emit_jump(Op::Tze);

        if !self.tokens.is_keyword(Keyword::End) && !self.tokens.is_keyword(Keyword::Else) {
            self.statement_list()?;
        }

        if self.tokens.is_keyword(Keyword::Else) {
            self.tokens.accept_keyword(Keyword::Else)?;
            let end_jump = self.emit_jump(Op::Tra);
            self.patch_jump(else_jump, self.next_address());
            if !self.tokens.is_keyword(Keyword::End) {
                self.statement_list()?;
            }
            self.patch_jump(end_jump, self.next_address());
        } else {
            self.patch_jump(else_jump, self.next_address());
        }
        self.tokens.accept_keyword(Keyword::End)
    }

    /// `es := "get" "(" IDENT ")" | "put" "(" expression ")"`
    fn io_statement(&mut self) -> Result<()> {
        if self.tokens.is_keyword(Keyword::Get) {
            self.tokens.accept_keyword(Keyword::Get)?;
            self.tokens.accept_character('(')?;
            let (name, line, column) = self.tokens.accept_identifier()?;
            self.tokens.accept_character(')')?;
            match self.lookup(&name, line, column)? {
                Entry::Variable(var) => {
                    self.program.emit(Op::EmpilerAd(var.address));
                    self.program.emit(Op::Get);
                    Ok(())
                }
                Entry::Callable(_) => Err(Error::Semantic {
                    line,
                    column,
                    message: format!("'{name}' is not a variable and cannot be read into"),
                }),
            }
        } else {
            self.tokens.accept_keyword(Keyword::Put)?;
            self.tokens.accept_character('(')?;
            self.expression()?;
            self.tokens.accept_character(')')?;
            self.program.emit(Op::Put);
            Ok(())
        }
    }

    /// `retour := "return" expression` — only meaningful inside a function.
    fn return_statement(&mut self) -> Result<()> {
        let (line, column) = self.tokens.here();
        self.tokens.accept_keyword(Keyword::Return)?;
        let in_function = self
            .scope
            .map(|id| self.table.callable(id).kind == CallableKind::Function)
            .unwrap_or(false);
        if !in_function {
            return Err(Error::Semantic {
                line,
                column,
                message: "'return' outside of a function".to_string(),
            });
        }
        self.expression()?;
        self.program.emit(Op::RetourFonct);
        Ok(())
    }

    /// Statement starting with an identifier: assignment or call.
    fn assign_or_call(&mut self) -> Result<()> {
        let (name, line, column) = self.tokens.accept_identifier()?;
        let entry = self.lookup(&name, line, column)?;

        if self.tokens.is_symbol(Symbol::Assign) {
            let var = match entry {
                Entry::Variable(var) => var,
                Entry::Callable(c) => {
                    return Err(Error::Semantic {
                        line,
                        column,
                        message: format!("cannot assign to {} '{name}'", c.kind),
                    });
                }
            };
            if var.is_parameter() {
                if var.out_status {
                    // The slot holds the caller's address; assigning writes
                    // through it.
                    self.program.emit(Op::EmpilerParam(var.address));
                } else {
                    return Err(Error::Semantic {
                        line,
                        column,
                        message: format!("parameter '{name}' is not 'out' and cannot be assigned"),
                    });
                }
            } else {
                self.program.emit(Op::EmpilerAd(var.address));
            }
            self.tokens.accept_symbol(Symbol::Assign)?;
            self.expression()?;
            self.program.emit(Op::Affectation);
            Ok(())
        } else if self.tokens.is_character('(') {
            self.call(&name, entry, line, column)
        } else {
            Err(self.tokens.parse_error("':=' or a call"))
        }
    }

    /// Compile a call, as a statement or as a value. Emits `reserverBloc`,
    /// the actual arguments left to right, then `traStat`; a function's
    /// result is whatever its `retourFonct` leaves on the stack.
    fn call(&mut self, name: &str, entry: Entry, line: usize, column: usize) -> Result<()> {
        let callable = match entry {
            Entry::Callable(c) => c,
            Entry::Variable(_) => {
                return Err(Error::Semantic {
                    line,
                    column,
                    message: format!("'{name}' is not a procedure or function"),
                });
            }
        };
        let expected = callable.parameters.len();
        let by_ref: Vec<bool> = callable
            .parameters
            .iter()
            .map(|&id| match self.table.entry(id) {
                Entry::Variable(v) => v.out_status,
                Entry::Callable(_) => false,
            })
            .collect();

        self.tokens.accept_character('(')?;
        self.program.emit(Op::ReserverBloc);
        let mut argc = 0;
        if !self.tokens.is_character(')') {
            loop {
                self.argument(by_ref.get(argc).copied().unwrap_or(false))?;
                argc += 1;
                if !self.tokens.is_character(',') {
                    break;
                }
                self.tokens.accept_character(',')?;
            }
        }
        if argc != expected {
            return Err(Error::Semantic {
                line,
                column,
                message: format!("'{name}' expects {expected} parameter(s), but {argc} were passed"),
            });
        }
        self.program.emit(Op::TraStat(callable.address + 1, argc));
        self.tokens.accept_character(')')?;
        debug!(callable = %name, arguments = argc, "parsed call");
        Ok(())
    }

    /// Compile one actual argument.
    ///
    /// An `in out` formal takes its actual by reference, which requires a
    /// bare variable name: its address is pushed undereferenced
    /// (`empilerAd`), or forwarded from the slot when the actual is itself
    /// an in-out parameter (`empilerParam`). Everything else compiles as a
    /// value.
    fn argument(&mut self, by_ref: bool) -> Result<()> {
        let bare_identifier = self.tokens.is_identifier()
            && matches!(
                self.tokens.peek_kind(1),
                Some(TokenKind::Character(',' | ')'))
            );
        if by_ref && bare_identifier {
            let (name, line, column) = self.tokens.accept_identifier()?;
            match self.lookup(&name, line, column)? {
                Entry::Variable(var) => {
                    if var.is_parameter() && var.out_status {
                        self.program.emit(Op::EmpilerParam(var.address));
                    } else {
                        self.program.emit(Op::EmpilerAd(var.address));
                    }
                    Ok(())
                }
                Entry::Callable(_) => Err(Error::Semantic {
                    line,
                    column,
                    message: format!("an 'in out' argument must be a variable, found '{name}'"),
                }),
            }
        } else {
            self.expression()
        }
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------
    //
    // Post-order emission throughout: operands first, then the opcode, so
    // the operator levels below need no explicit stack handling.

    /// `expression := exp1 ("or" exp1)*`
    fn expression(&mut self) -> Result<()> {
        self.and_expr()?;
        while self.tokens.is_keyword(Keyword::Or) {
            self.tokens.accept_keyword(Keyword::Or)?;
            self.and_expr()?;
            self.program.emit(Op::Ou);
        }
        Ok(())
    }

    /// `exp1 := exp2 ("and" exp2)*`
    fn and_expr(&mut self) -> Result<()> {
        self.rel_expr()?;
        while self.tokens.is_keyword(Keyword::And) {
            self.tokens.accept_keyword(Keyword::And)?;
            self.rel_expr()?;
            self.program.emit(Op::Et);
        }
        Ok(())
    }

    /// `exp2 := exp3 [relop exp3]` — comparisons do not chain.
    fn rel_expr(&mut self) -> Result<()> {
        self.add_expr()?;
        let op = if self.tokens.is_symbol(Symbol::Lt) {
            Some((Symbol::Lt, Op::Inf))
        } else if self.tokens.is_symbol(Symbol::Le) {
            Some((Symbol::Le, Op::Infeg))
        } else if self.tokens.is_symbol(Symbol::Gt) {
            Some((Symbol::Gt, Op::Sup))
        } else if self.tokens.is_symbol(Symbol::Ge) {
            Some((Symbol::Ge, Op::Supeg))
        } else if self.tokens.is_symbol(Symbol::Eq) {
            Some((Symbol::Eq, Op::Egal))
        } else if self.tokens.is_symbol(Symbol::Ne) {
            Some((Symbol::Ne, Op::Diff))
        } else {
            None
        };
        if let Some((symbol, op)) = op {
            self.tokens.accept_symbol(symbol)?;
            self.add_expr()?;
            self.program.emit(op);
        }
        Ok(())
    }

    /// `exp3 := exp4 (("+"|"-") exp4)*`
    fn add_expr(&mut self) -> Result<()> {
        self.mul_expr()?;
        loop {
            let op = if self.tokens.is_character('+') {
                Op::Add
            } else if self.tokens.is_character('-') {
                Op::Sous
            } else {
                break;
            };
            self.tokens
                .accept_character(if op == Op::Add { '+' } else { '-' })?;
            self.mul_expr()?;
            self.program.emit(op);
        }
        Ok(())
    }

    /// `exp4 := prim (("*"|"/") prim)*`
    fn mul_expr(&mut self) -> Result<()> {
        self.unary_expr()?;
        loop {
            let op = if self.tokens.is_character('*') {
                Op::Mult
            } else if self.tokens.is_character('/') {
                Op::Div
            } else {
                break;
            };
            self.tokens
                .accept_character(if op == Op::Mult { '*' } else { '/' })?;
            self.unary_expr()?;
            self.program.emit(op);
        }
        Ok(())
    }

    /// `prim := [unaryop] elemPrim` — unary `+` emits nothing.
    fn unary_expr(&mut self) -> Result<()> {
        let op = if self.tokens.is_character('+') {
            self.tokens.accept_character('+')?;
            None
        } else if self.tokens.is_character('-') {
            self.tokens.accept_character('-')?;
            Some(Op::Moins)
        } else if self.tokens.is_keyword(Keyword::Not) {
            self.tokens.accept_keyword(Keyword::Not)?;
            Some(Op::Non)
        } else {
            None
        };
        self.primary()?;
        if let Some(op) = op {
            self.program.emit(op);
        }
        Ok(())
    }

    /// `elemPrim := "(" expression ")" | INT | "true" | "false"
    ///            | IDENT [actuals]`
    fn primary(&mut self) -> Result<()> {
        if self.tokens.is_character('(') {
            self.tokens.accept_character('(')?;
            self.expression()?;
            self.tokens.accept_character(')')
        } else if self.tokens.is_integer() {
            let value = self.tokens.accept_integer()?;
            self.program.emit(Op::Empiler(value));
            Ok(())
        } else if self.tokens.is_keyword(Keyword::True) {
            self.tokens.accept_keyword(Keyword::True)?;
            self.program.emit(Op::Empiler(1));
            Ok(())
        } else if self.tokens.is_keyword(Keyword::False) {
            self.tokens.accept_keyword(Keyword::False)?;
            self.program.emit(Op::Empiler(0));
            Ok(())
        } else if self.tokens.is_identifier() {
            let (name, line, column) = self.tokens.accept_identifier()?;
            let entry = self.lookup(&name, line, column)?;
            if self.tokens.is_character('(') {
                return self.call(&name, entry, line, column);
            }
            match entry {
                Entry::Variable(var) => {
                    if var.is_parameter() && var.out_status {
                        self.program.emit(Op::EmpilerParam(var.address));
                    } else {
                        self.program.emit(Op::EmpilerAd(var.address));
                    }
                    self.program.emit(Op::ValeurPile);
                    Ok(())
                }
                Entry::Callable(c) => Err(Error::Semantic {
                    line,
                    column,
                    message: format!("'{name}' is a {}; call it with parentheses", c.kind),
                }),
            }
        } else {
            Err(self.tokens.parse_error("a value"))
        }
    }
}
