//! Executable BNF grammars: productions are composed as expression nodes
//! and run directly against byte input by a backtracking top-down
//! interpreter, with two-level whitespace handling and reducer callbacks
//! for semantic output.

mod context;
mod eval;
mod grammar;
mod interface;
pub mod report;
mod status;

pub use crate::context::{Context, DefaultHooks, Hooks};
pub use crate::grammar::{
  ByteClass, Grammar, GrammarError, GrammarErrorKind, NodeId, CLASS_SIZE, MAX_LEXEME_REPEAT,
  MAX_REPEAT,
};
pub use crate::interface::{bypass, Interface, Predicate, Reducer};
pub use crate::status::Status;

/// Result of one `analyze` call: the combined parse and tail status, the
/// position of the first unconsumed byte, and the root semantic value.
#[derive(Debug)]
pub struct Outcome<'a, D> {
  pub status: Status,
  pub stop: usize,
  pub value: Option<Interface<'a, D>>,
}

impl<'a, D> Outcome<'a, D> {
  pub fn ok(&self) -> bool {
    self.status.ok() && !self.status.fatal()
  }
}

/// Fast path: runs the grammar without semantic collection. Predicates
/// fire, reducers do not, `value` stays empty.
pub fn analyze<'a, D>(grammar: &'a Grammar<D>, root: NodeId, input: &'a [u8]) -> Outcome<'a, D>
where
  D: Clone + Default,
{
  let mut ctx = Context::scan(input);
  let status = ctx.run(grammar, root);
  outcome(status, &ctx)
}

/// Full path: reducers fire and the final top-level value is returned.
pub fn analyze_value<'a, D>(
  grammar: &'a Grammar<D>,
  root: NodeId,
  input: &'a [u8],
) -> Outcome<'a, D>
where
  D: Clone + Default,
{
  let mut ctx = Context::new(input);
  let status = ctx.run(grammar, root);
  outcome(status, &ctx)
}

/// Full path with host hooks for whitespace skipping and error catching.
/// Pass `&mut hooks` to keep ownership of stateful hooks.
pub fn analyze_with<'a, D, H>(
  grammar: &'a Grammar<D>,
  root: NodeId,
  input: &'a [u8],
  hooks: H,
) -> Outcome<'a, D>
where
  D: Clone + Default,
  H: Hooks,
{
  let mut ctx = Context::with_hooks(input, hooks);
  let status = ctx.run(grammar, root);
  outcome(status, &ctx)
}

fn outcome<'a, D, H>(status: Status, ctx: &Context<'a, D, H>) -> Outcome<'a, D>
where
  D: Clone + Default,
  H: Hooks,
{
  let (tail, stop) = ctx.tail();
  Outcome {
    status: status | tail,
    stop,
    value: ctx.value(),
  }
}
