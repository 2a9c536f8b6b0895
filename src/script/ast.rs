//! Block AST for the script control-flow interpreter.
//!
//! Deliberately flat: six variants plus a catch-all `CommandStmt` —
//! `If | For | While | Until | Case | Function | CommandStmt`. The teacher's
//! `CompoundCommandNode` additionally carries C-style `for`, `select`,
//! subshells, groups, and arithmetic/`[[ ]]` compound commands as their own
//! AST nodes; krusty folds the ones it doesn't support as distinct nodes
//! (arithmetic/conditional commands) into `CommandStmt`'s condition
//! evaluation instead of inventing new Block variants.

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    If(If),
    For(For),
    While(While),
    Until(Until),
    Case(Case),
    Function(Function),
    CommandStmt(CommandStmt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub clauses: Vec<IfClause>,
    pub else_body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfClause {
    pub condition: CommandStmt,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub variable: String,
    /// `None` means iterate over `"$@"`.
    pub words: Option<Vec<String>>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub condition: CommandStmt,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Until {
    pub condition: CommandStmt,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub word: String,
    pub items: Vec<CaseItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseItem {
    pub patterns: Vec<String>,
    pub body: Vec<Statement>,
    pub terminator: CaseTerminator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTerminator {
    /// `;;`
    Stop,
    /// `;&` — fall through to next body unconditionally.
    FallThrough,
    /// `;;&` — fall through to next pattern test.
    FallTest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Vec<Statement>,
}

/// A raw, unparsed shell command line (possibly a pipeline/chain), or a
/// `[ expr ]`/`[[ expr ]]` test expression. This is the leaf of the Block
/// AST and also what `If`/`While`/`Until` conditions carry.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandStmt {
    pub line: String,
    /// Negate exit status with a leading `!`.
    pub negated: bool,
}

/// Outcome of executing a single `Statement`, used to unwind loops/functions.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal(i32),
    Break(u32),
    Continue(u32),
    Return(i32),
}
