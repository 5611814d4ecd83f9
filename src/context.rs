use crate::eval::eval;
use crate::grammar::{Grammar, NodeId};
use crate::interface::{Interface, Reducer};
use crate::status::Status;

/// Host seam of one parse run. `skip` is consulted before every terminal
/// in syntactic mode and at lexical-production boundaries; `catch` fires
/// when a sequence fails past an armed `attempt` marker.
pub trait Hooks {
  fn skip(&self, input: &[u8], pos: usize) -> usize {
    let mut pos = pos;
    while let Some(&b) = input.get(pos) {
      match b {
        b' ' | b'\t' | b'\n' | b'\r' => pos += 1,
        _ => break,
      }
    }
    pos
  }

  fn catch(&mut self) -> Status {
    Status::NONE
  }
}

/// Whitespace skipping only, no error catching.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl Hooks for DefaultHooks {}

impl<'h, H: Hooks> Hooks for &'h mut H {
  fn skip(&self, input: &[u8], pos: usize) -> usize {
    (**self).skip(input, pos)
  }

  fn catch(&mut self) -> Status {
    (**self).catch()
  }
}

pub(crate) struct Frame<'a, D> {
  children: Vec<Interface<'a, D>>,
  mark: usize,
}

/// Mutable state of one parse run: the cursor stack, the mode level and
/// the semantic frame stack. Reusable across `run` calls.
pub struct Context<'a, D, H = DefaultHooks> {
  pub(crate) input: &'a [u8],
  cursors: Vec<usize>,
  pub(crate) level: u32,
  frame: Option<Frame<'a, D>>,
  collecting: bool,
  hooks: H,
}

impl<'a, D> Context<'a, D, DefaultHooks> {
  /// full-path context: reducers fire and the root value is collected
  pub fn new(input: &'a [u8]) -> Context<'a, D, DefaultHooks> {
    Context::with_hooks(input, DefaultHooks)
  }

  /// fast-path context: only predicates fire, no semantic output
  pub(crate) fn scan(input: &'a [u8]) -> Context<'a, D, DefaultHooks> {
    let mut ctx = Context::new(input);
    ctx.collecting = false;
    ctx
  }
}

impl<'a, D, H: Hooks> Context<'a, D, H> {
  pub fn with_hooks(input: &'a [u8], hooks: H) -> Context<'a, D, H> {
    Context {
      input,
      cursors: vec![],
      level: 1,
      frame: None,
      collecting: true,
      hooks,
    }
  }

  /// reports whether unconsumed input remains past the stop position
  pub fn tail(&self) -> (Status, usize) {
    let pos = self.top();
    let stop = self.hooks.skip(self.input, pos);
    if stop < self.input.len() {
      (Status::ERROR | Status::REST, stop)
    } else {
      (Status::NONE, stop)
    }
  }

  pub(crate) fn top(&self) -> usize {
    self.cursors.last().copied().unwrap_or(0)
  }

  /// start of the most recently matched span
  pub(crate) fn under_top(&self) -> usize {
    match self.cursors.len() {
      0 | 1 => 0,
      len => self.cursors[len - 2],
    }
  }

  pub(crate) fn cursor_at(&self, ix: usize) -> usize {
    self.cursors.get(ix).copied().unwrap_or(0)
  }

  pub(crate) fn cursor_len(&self) -> usize {
    self.cursors.len()
  }

  pub(crate) fn push(&mut self, pos: usize) {
    self.cursors.push(pos);
  }

  /// cursor-only rollback, leaves the semantic stack alone
  pub(crate) fn truncate_cursors(&mut self, len: usize) {
    self.cursors.truncate(len);
  }

  pub(crate) fn skip(&self, pos: usize) -> usize {
    self.hooks.skip(self.input, pos)
  }

  pub(crate) fn catch_hook(&mut self) -> Status {
    self.hooks.catch()
  }

  /// drops cursors from `low` on, and the semantic records built from them
  pub(crate) fn erase(&mut self, low: usize) {
    if low >= self.cursors.len() {
      return;
    }
    self.cursors.truncate(low);
    if self.level > 0 {
      if let Some(frame) = self.frame.as_mut() {
        let keep = low.saturating_sub(frame.mark) / 2;
        frame.children.truncate(keep);
      }
    }
  }

  /// drops the cursor range `low..up` and the matching semantic records
  pub(crate) fn erase_range(&mut self, low: usize, up: usize) {
    let up = up.min(self.cursors.len());
    if low >= up {
      return;
    }
    self.cursors.drain(low..up);
    if self.level > 0 {
      if let Some(frame) = self.frame.as_mut() {
        let from = low.saturating_sub(frame.mark) / 2;
        let to = (up.saturating_sub(frame.mark) / 2).min(frame.children.len());
        if from < to {
          frame.children.drain(from..to);
        }
      }
    }
  }
}

impl<'a, D: Clone + Default, H: Hooks> Context<'a, D, H> {
  /// runs the interpreter from `root`; the tail is not folded in
  pub fn run(&mut self, grammar: &'a Grammar<D>, root: NodeId) -> Status {
    self.cursors.clear();
    self.cursors.push(0);
    self.cursors.push(0);
    self.level = 1;
    self.frame = if self.collecting {
      Some(Frame {
        children: vec![],
        mark: self.cursors.len(),
      })
    } else {
      None
    };
    eval(grammar, root, self)
  }

  /// the root semantic value, if any production delivered one
  pub fn value(&self) -> Option<Interface<'a, D>> {
    self.frame.as_ref().and_then(|f| f.children.first().cloned())
  }

  /// records a structural stub for a matched span in the active frame
  pub(crate) fn stub(&mut self, start: usize, end: usize, name: &'a str) {
    if let Some(frame) = self.frame.as_mut() {
      frame
        .children
        .push(Interface::stub(self.input, start, end - start, name));
    }
  }

  /// enters a production: a fresh frame when it will reduce, collection
  /// disabled otherwise
  pub(crate) fn begin_frame(&mut self, reduces: bool) -> Option<Frame<'a, D>> {
    let saved = self.frame.take();
    if reduces && self.collecting {
      self.frame = Some(Frame {
        children: vec![],
        mark: self.cursors.len(),
      });
    }
    saved
  }

  pub(crate) fn end_frame(&mut self, saved: Option<Frame<'a, D>>) {
    self.frame = saved;
  }

  /// delivers a production's result to the parent frame: the reducer's
  /// payload re-wrapped with the production span, or a pass-through stub
  pub(crate) fn reduce_into(
    &mut self,
    parent: &mut Option<Frame<'a, D>>,
    reducer: Option<Reducer<D>>,
    start: usize,
    end: usize,
    name: &'a str,
  ) {
    if !self.collecting {
      return;
    }
    match reducer {
      Some(f) => {
        let children = self
          .frame
          .take()
          .map(|frame| frame.children)
          .unwrap_or_default();
        let out = f(&children);
        if let Some(parent) = parent.as_mut() {
          parent
            .children
            .push(Interface::carry(&out, self.input, start, end - start, name));
        }
      }
      None => {
        if let Some(parent) = parent.as_mut() {
          parent
            .children
            .push(Interface::stub(self.input, start, end - start, name));
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_skip_stops_at_content() {
    let hooks = DefaultHooks;
    assert_eq!(hooks.skip(b"  \t\r\n x", 0), 6);
    assert_eq!(hooks.skip(b"x  ", 0), 0);
    assert_eq!(hooks.skip(b"   ", 0), 3);
  }

  #[test]
  fn tail_reports_rest() {
    let mut ctx: Context<bool> = Context::new(b"ab  ");
    ctx.push(0);
    ctx.push(2);
    let (status, stop) = ctx.tail();
    assert_eq!(status, Status::NONE);
    assert_eq!(stop, 4);

    let mut ctx: Context<bool> = Context::new(b"ab cd");
    ctx.push(0);
    ctx.push(2);
    let (status, stop) = ctx.tail();
    assert_eq!(status, Status::ERROR | Status::REST);
    assert_eq!(stop, 3);
  }

  #[test]
  fn erase_keeps_frame_in_step() {
    let mut ctx: Context<bool> = Context::new(b"abcd");
    ctx.push(0);
    ctx.push(0);
    let saved = ctx.begin_frame(true);
    assert!(saved.is_none());

    ctx.push(0);
    ctx.push(1);
    ctx.stub(0, 1, "A");
    ctx.push(1);
    ctx.push(2);
    ctx.stub(1, 2, "B");
    ctx.erase(4);

    let children = ctx.frame.take().unwrap().children;
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "A");
  }
}
