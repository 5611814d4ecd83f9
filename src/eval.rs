//! Recursive interpreter over the grammar node graph.

use crate::context::{Context, Hooks};
use crate::grammar::{ByteClass, Grammar, NodeId, NodeKind};
use crate::interface::{Predicate, Reducer};
use crate::status::Status;

pub(crate) fn eval<'a, D, H>(
  grammar: &'a Grammar<D>,
  id: NodeId,
  ctx: &mut Context<'a, D, H>,
) -> Status
where
  D: Clone + Default,
  H: Hooks,
{
  let node = match grammar.get(id) {
    Some(node) => node,
    None => return Status::ERROR | Status::BAD_RULE,
  };

  match &node.kind {
    NodeKind::Token(class) => eval_token(class, node.name.as_str(), ctx),
    NodeKind::Predicate(f) => eval_predicate(*f, ctx),
    NodeKind::Seq(children) => eval_seq(grammar, children, ctx),
    NodeKind::Alt(children) => eval_alt(grammar, children, ctx),
    NodeKind::Repeat {
      body,
      min,
      max,
      over,
    } => eval_repeat(grammar, *body, *min, *max, *over, ctx),
    NodeKind::Ctrl(flags) => *flags,
    NodeKind::Lexeme(body) => eval_lexeme(grammar, *body, node.name.as_str(), ctx),
    NodeKind::Rule { body, reducer } => {
      eval_rule(grammar, *body, *reducer, node.name.as_str(), ctx)
    }
  }
}

/// One byte of input against a membership class. Whitespace is skipped
/// first in syntactic mode, and a span pair plus a semantic stub are
/// recorded there; lexical mode advances the bare cursor.
fn eval_token<'a, D, H>(class: &ByteClass, name: &'a str, ctx: &mut Context<'a, D, H>) -> Status
where
  D: Clone + Default,
  H: Hooks,
{
  let mut pos = ctx.top();
  if ctx.level > 0 {
    pos = ctx.skip(pos);
  }
  match ctx.input.get(pos) {
    Some(&b) if class.contains(b) => {
      if ctx.level > 0 {
        ctx.stub(pos, pos + 1, name);
        ctx.push(pos);
      }
      ctx.push(pos + 1);
      if pos + 1 >= ctx.input.len() {
        Status::OK | Status::EOF
      } else {
        Status::OK
      }
    }
    _ => Status::NONE,
  }
}

/// Host check over the most recently matched span. No cursor movement.
fn eval_predicate<'a, D, H>(f: Predicate, ctx: &mut Context<'a, D, H>) -> Status
where
  H: Hooks,
{
  let end = ctx.top();
  let start = ctx.under_top();
  let span = ctx.input.get(start..end).unwrap_or(&[]);
  if f(span) {
    Status::OK
  } else {
    Status::NONE
  }
}

fn eval_seq<'a, D, H>(
  grammar: &'a Grammar<D>,
  children: &[NodeId],
  ctx: &mut Context<'a, D, H>,
) -> Status
where
  D: Clone + Default,
  H: Hooks,
{
  if children.is_empty() {
    return Status::ERROR | Status::BAD_RULE;
  }

  let size = ctx.cursor_len();
  let mut acc = Status::NONE;
  let mut save: Option<usize> = None;

  for &child in children {
    acc |= eval(grammar, child, ctx);

    if acc.ok() && !acc.fatal() {
      if let Some(mark) = save.take() {
        // the lookahead span is retracted once it has served its check
        ctx.truncate_cursors(mark);
      }
      if acc.contains(Status::SKIP) {
        save = Some(ctx.cursor_len());
      } else if acc.contains(Status::RET) {
        // promote the partial match through the enclosing alternation
        return (acc & !(Status::TRY | Status::SKIP)) | Status::OK | Status::RET;
      }
    } else {
      if ctx.level > 0 && acc.contains(Status::TRY) && !acc.fatal() && save.is_none() {
        acc |= ctx.catch_hook();
      }
      ctx.erase(size);
      let fatal = if acc.intersects(Status::EOF | Status::OVER) {
        Status::ERROR
      } else {
        Status::NONE
      };
      return fatal | (acc & !(Status::TRY | Status::SKIP | Status::OK));
    }

    acc &= !(Status::SKIP | Status::RET | Status::OK);
  }

  let promote = if acc.contains(Status::TRY) {
    Status::RET
  } else {
    Status::NONE
  };
  promote | Status::OK | (acc & !(Status::TRY | Status::SKIP))
}

/// Accept-best selection: every child starts from the same origin and the
/// greatest advance wins, first occurrence breaking ties. A sticky `First`
/// switches to accept-first; `Ret` and fatal statuses short-circuit.
fn eval_alt<'a, D, H>(
  grammar: &'a Grammar<D>,
  children: &[NodeId],
  ctx: &mut Context<'a, D, H>,
) -> Status
where
  D: Clone + Default,
  H: Hooks,
{
  if children.is_empty() {
    return Status::ERROR | Status::BAD_RULE;
  }

  let size = ctx.cursor_len();
  let org = ctx.top();
  let mut acc = Status::NONE;
  let mut best = 0usize;
  let mut matched = false;

  for &child in children {
    let msize = ctx.cursor_len();
    if msize > size {
      // a previous child won so far; re-anchor this attempt at the origin
      ctx.push(org);
    }

    let st = eval(grammar, child, ctx);
    acc |= st;

    if st.fatal() {
      // drop this attempt's entries, including the re-anchor at msize
      if ctx.cursor_len() > msize {
        ctx.erase(msize);
      }
      return acc & !(Status::FIRST | Status::RET);
    }

    if acc.ok() {
      matched = true;
      let advance = ctx.top().saturating_sub(org);
      if advance > best || (advance > 0 && acc.intersects(Status::RET | Status::FIRST)) {
        best = advance;
        if msize > size {
          ctx.erase_range(size, msize + 1);
        }
        if acc.intersects(Status::RET | Status::FIRST) {
          break;
        }
        acc &= !(Status::OK | Status::RET);
        continue;
      }
    }

    if ctx.cursor_len() > msize {
      ctx.erase(msize);
    }
    acc &= !(Status::OK | Status::RET);
  }

  let out = if matched {
    acc | Status::OK
  } else {
    acc & !Status::OK
  };
  out & !(Status::FIRST | Status::RET)
}

fn eval_repeat<'a, D, H>(
  grammar: &'a Grammar<D>,
  body: NodeId,
  min: u32,
  max: u32,
  over: bool,
  ctx: &mut Context<'a, D, H>,
) -> Status
where
  D: Clone + Default,
  H: Hooks,
{
  let mut acc = Status::NONE;
  let mut count = 0;

  while count < max {
    let st = eval(grammar, body, ctx);
    acc |= st;

    if st.fatal() {
      return acc & !Status::OK;
    }
    if !acc.ok() {
      return if count < min {
        acc & !Status::OK
      } else {
        acc | Status::OK
      };
    }

    acc &= !(Status::FIRST | Status::TRY | Status::SKIP | Status::RET | Status::OK);
    count += 1;
  }

  if over {
    acc |= Status::OVER;
  }
  acc | Status::OK
}

/// Lexical production: whitespace is skipped at the boundary, the body is
/// parsed at level 0, and a successful match collapses to one span pair
/// plus a stub for the whole lexeme.
fn eval_lexeme<'a, D, H>(
  grammar: &'a Grammar<D>,
  body: Option<NodeId>,
  name: &'a str,
  ctx: &mut Context<'a, D, H>,
) -> Status
where
  D: Clone + Default,
  H: Hooks,
{
  let body = match body {
    Some(body) => body,
    None => return Status::ERROR | Status::BAD_LEXEME,
  };
  if ctx.level == 0 || is_predicate(grammar, body) {
    return eval(grammar, body, ctx);
  }

  let size = ctx.cursor_len();
  let org = ctx.skip(ctx.top());
  ctx.push(org);
  ctx.level -= 1;
  let stat = eval(grammar, body, ctx);
  ctx.level += 1;

  if stat.ok() && ctx.cursor_len() > size + 1 {
    let end = ctx.top();
    ctx.stub(org, end, name);
    ctx.truncate_cursors(size + 1);
    ctx.push(end);
  } else {
    ctx.truncate_cursors(size);
  }

  stat & !(Status::RET | Status::FIRST | Status::SKIP | Status::TRY)
}

/// Syntactic production: frames the body parse, dispatches the reducer on
/// success and collapses the matched span to one pair.
fn eval_rule<'a, D, H>(
  grammar: &'a Grammar<D>,
  body: Option<NodeId>,
  reducer: Option<Reducer<D>>,
  name: &'a str,
  ctx: &mut Context<'a, D, H>,
) -> Status
where
  D: Clone + Default,
  H: Hooks,
{
  let body = match body {
    Some(body) => body,
    None => return Status::ERROR | Status::BAD_RULE,
  };
  if ctx.level == 0 {
    return Status::ERROR | Status::BAD_RULE;
  }
  if is_predicate(grammar, body) {
    return eval(grammar, body, ctx);
  }

  let size = ctx.cursor_len();
  let mut saved = ctx.begin_frame(reducer.is_some());
  let stat = eval(grammar, body, ctx);

  if stat.ok() && ctx.cursor_len() > size + 1 {
    let start = ctx.cursor_at(size);
    let end = ctx.top();
    ctx.reduce_into(&mut saved, reducer, start, end, name);
    ctx.truncate_cursors(size);
    ctx.push(start);
    ctx.push(end);
  } else {
    ctx.truncate_cursors(size);
  }

  ctx.end_frame(saved);
  stat & !(Status::RET | Status::FIRST | Status::SKIP | Status::TRY)
}

fn is_predicate<D>(grammar: &Grammar<D>, id: NodeId) -> bool {
  match grammar.get(id).map(|node| &node.kind) {
    Some(NodeKind::Predicate(_)) => true,
    _ => false,
  }
}
