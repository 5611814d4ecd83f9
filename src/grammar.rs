use std::fmt::{self, Debug};
use bimap::BiHashMap;
use crate::interface::{Predicate, Reducer};
use crate::status::Status;

mod class;
pub use class::{ByteClass, CLASS_SIZE};

/// Overflow cap for repetitions over syntactic productions.
pub const MAX_REPEAT: u32 = 0x4000;
/// Overflow cap for repetitions over tokens and lexical productions.
pub const MAX_LEXEME_REPEAT: u32 = 1024;

/// Stable handle into a grammar's node arena. Cycles are expressed by
/// storing a production's own id inside its body.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct NodeId(u32);

impl NodeId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

pub(crate) struct Node<D> {
  pub name: String,
  pub kind: NodeKind<D>,
}

pub(crate) enum NodeKind<D> {
  Token(ByteClass),
  Predicate(Predicate),
  Seq(Vec<NodeId>),
  Alt(Vec<NodeId>),
  Repeat {
    body: NodeId,
    min: u32,
    max: u32,
    over: bool,
  },
  Ctrl(Status),
  Lexeme(Option<NodeId>),
  Rule {
    body: Option<NodeId>,
    reducer: Option<Reducer<D>>,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarError {
  pub kind: GrammarErrorKind,
  pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarErrorKind {
  UnboundRule,
  UnboundLexeme,
  EmptyGroup,
  NotAProduction,
  NotARule,
}

/// An executable grammar: an arena of expression nodes plus a registry of
/// named productions. `D` is the semantic payload carried through reducers.
pub struct Grammar<D = bool> {
  nodes: Vec<Node<D>>,
  productions: BiHashMap<NodeId, String>,
}

impl<D> Default for Grammar<D> {
  fn default() -> Grammar<D> {
    Grammar::new()
  }
}

impl<D> Grammar<D> {
  pub fn new() -> Grammar<D> {
    Grammar {
      nodes: vec![],
      productions: BiHashMap::new(),
    }
  }

  fn push(&mut self, name: String, kind: NodeKind<D>) -> NodeId {
    let id = NodeId(self.nodes.len() as u32);
    self.nodes.push(Node { name, kind });
    id
  }

  pub(crate) fn get(&self, id: NodeId) -> Option<&Node<D>> {
    self.nodes.get(id.index())
  }

  /// token matching a single byte
  pub fn byte(&mut self, b: u8) -> NodeId {
    self.push(byte_name(b), NodeKind::Token(ByteClass::byte(b)))
  }

  /// token matching any byte in `lo..=hi`
  pub fn byte_range(&mut self, lo: u8, hi: u8) -> NodeId {
    let name = format!("{}-{}", byte_name(lo), byte_name(hi));
    self.push(name, NodeKind::Token(ByteClass::range(lo, hi)))
  }

  /// token matching any byte of `sample`
  pub fn one_of(&mut self, sample: &[u8]) -> NodeId {
    let name = String::from_utf8_lossy(sample).into_owned();
    self.push(name, NodeKind::Token(ByteClass::sample(sample)))
  }

  /// token matching an explicit byte class
  pub fn token(&mut self, class: ByteClass) -> NodeId {
    self.push("token".to_string(), NodeKind::Token(class))
  }

  /// the byte class of a token node, for post-construction edits
  pub fn class_mut(&mut self, id: NodeId) -> Option<&mut ByteClass> {
    match self.nodes.get_mut(id.index()) {
      Some(Node {
        kind: NodeKind::Token(class),
        ..
      }) => Some(class),
      _ => None,
    }
  }

  /// a multi-byte literal: one token per byte, chained in sequence
  pub fn literal(&mut self, text: &str) -> NodeId {
    let bytes = text.as_bytes();
    match bytes.len() {
      0 => self.null(),
      1 => self.byte(bytes[0]),
      _ => {
        let children = bytes.iter().map(|&b| self.byte(b)).collect::<Vec<_>>();
        self.push(text.to_string(), NodeKind::Seq(children))
      }
    }
  }

  /// inline boolean check over the most recently matched span
  pub fn predicate(&mut self, f: Predicate) -> NodeId {
    self.push("()".to_string(), NodeKind::Predicate(f))
  }

  /// ordered conjunction
  pub fn seq(&mut self, children: &[NodeId]) -> NodeId {
    let name = self.join_names(children, "+");
    self.push(name, NodeKind::Seq(children.to_vec()))
  }

  /// ordered disjunction, accept-best by default
  pub fn alt(&mut self, children: &[NodeId]) -> NodeId {
    let name = self.join_names(children, "|");
    self.push(name, NodeKind::Alt(children.to_vec()))
  }

  /// `min..=max` repetitions of `body`; `Over` is reported when `max`
  /// reaches `limit`
  pub fn repeat_limited(&mut self, min: u32, max: u32, limit: u32, body: NodeId) -> NodeId {
    self.push(
      "iterate".to_string(),
      NodeKind::Repeat {
        body,
        min,
        max,
        over: max >= limit,
      },
    )
  }

  pub fn repeat(&mut self, min: u32, max: u32, body: NodeId) -> NodeId {
    self.repeat_limited(min, max, MAX_REPEAT, body)
  }

  /// zero or more repetitions, capped at the default limit for the body kind
  pub fn many(&mut self, body: NodeId) -> NodeId {
    let cap = self.default_cap(body);
    self.repeat_limited(0, cap, cap, body)
  }

  /// one or more repetitions, capped at the default limit for the body kind
  pub fn many1(&mut self, body: NodeId) -> NodeId {
    let cap = self.default_cap(body);
    self.repeat_limited(1, cap, cap, body)
  }

  /// zero or one occurrence
  pub fn opt(&mut self, body: NodeId) -> NodeId {
    self.repeat_limited(0, 1, MAX_REPEAT, body)
  }

  /// exactly `n` occurrences
  pub fn exactly(&mut self, n: u32, body: NodeId) -> NodeId {
    self.repeat_limited(n, n, MAX_REPEAT, body)
  }

  fn default_cap(&self, body: NodeId) -> u32 {
    match self.get(body).map(|node| &node.kind) {
      Some(NodeKind::Token(_)) | Some(NodeKind::Lexeme(_)) => MAX_LEXEME_REPEAT,
      _ => MAX_REPEAT,
    }
  }

  /// epsilon placeholder, always matches without consuming
  pub fn null(&mut self) -> NodeId {
    self.push("N".to_string(), NodeKind::Ctrl(Status::OK))
  }

  /// forces the enclosing sequence to return early with a match
  pub fn ret(&mut self) -> NodeId {
    self.push("R".to_string(), NodeKind::Ctrl(Status::OK | Status::RET))
  }

  /// switches the enclosing alternation to accept-first selection
  pub fn accept_first(&mut self) -> NodeId {
    self.push("1".to_string(), NodeKind::Ctrl(Status::FIRST))
  }

  /// marks the next element of the enclosing sequence as pure lookahead
  pub fn skip(&mut self) -> NodeId {
    self.push("S".to_string(), NodeKind::Ctrl(Status::OK | Status::SKIP))
  }

  /// arms the catch hook for the enclosing sequence
  pub fn attempt(&mut self) -> NodeId {
    self.push("T".to_string(), NodeKind::Ctrl(Status::OK | Status::TRY))
  }

  /// declares a lexical production; the body may be bound later
  pub fn lexeme(&mut self, name: &str) -> NodeId {
    let id = self.push(name.to_string(), NodeKind::Lexeme(None));
    self.productions.insert(id, name.to_string());
    id
  }

  /// declares and binds a lexical production in one step
  pub fn lexical(&mut self, name: &str, body: NodeId) -> NodeId {
    let id = self.push(name.to_string(), NodeKind::Lexeme(Some(body)));
    self.productions.insert(id, name.to_string());
    id
  }

  /// declares a syntactic production; the body may be bound later
  pub fn rule(&mut self, name: &str) -> NodeId {
    let id = self.push(
      name.to_string(),
      NodeKind::Rule {
        body: None,
        reducer: None,
      },
    );
    self.productions.insert(id, name.to_string());
    id
  }

  /// declares and binds a syntactic production in one step
  pub fn syntactic(&mut self, name: &str, body: NodeId) -> NodeId {
    let id = self.push(
      name.to_string(),
      NodeKind::Rule {
        body: Some(body),
        reducer: None,
      },
    );
    self.productions.insert(id, name.to_string());
    id
  }

  /// binds or replaces the body of a named production
  pub fn define(&mut self, prod: NodeId, new_body: NodeId) -> Result<(), GrammarError> {
    if new_body.index() >= self.nodes.len() {
      return Err(self.error(GrammarErrorKind::NotAProduction, prod, "unknown body node"));
    }
    match self.nodes.get_mut(prod.index()) {
      Some(Node {
        kind: NodeKind::Lexeme(body),
        ..
      }) => {
        *body = Some(new_body);
        Ok(())
      }
      Some(Node {
        kind: NodeKind::Rule { body, .. },
        ..
      }) => {
        *body = Some(new_body);
        Ok(())
      }
      _ => Err(self.error(
        GrammarErrorKind::NotAProduction,
        prod,
        "only lexical and syntactic productions take a body",
      )),
    }
  }

  /// attaches a reducer to a syntactic production
  pub fn bind(&mut self, rule: NodeId, f: Reducer<D>) -> Result<(), GrammarError> {
    match self.nodes.get_mut(rule.index()) {
      Some(Node {
        kind: NodeKind::Rule { reducer, .. },
        ..
      }) => {
        *reducer = Some(f);
        Ok(())
      }
      _ => Err(self.error(
        GrammarErrorKind::NotARule,
        rule,
        "reducers attach to syntactic productions only",
      )),
    }
  }

  /// looks a named production up by name
  pub fn production(&self, name: &str) -> Option<NodeId> {
    self.productions.get_by_right(name).copied()
  }

  pub fn name(&self, id: NodeId) -> &str {
    self.get(id).map(|node| node.name.as_str()).unwrap_or("")
  }

  pub fn set_name(&mut self, id: NodeId, name: &str) {
    if let Some(node) = self.nodes.get_mut(id.index()) {
      node.name = name.to_string();
      if self.productions.contains_left(&id) {
        self.productions.insert(id, name.to_string());
      }
    }
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// validates the graph before parsing: unbound productions and empty
  /// groups are reported with the offending node's name
  pub fn check(&self) -> Result<(), GrammarError> {
    for (ix, node) in self.nodes.iter().enumerate() {
      let id = NodeId(ix as u32);
      match &node.kind {
        NodeKind::Lexeme(None) => {
          return Err(self.error(GrammarErrorKind::UnboundLexeme, id, "lexeme has no body"));
        }
        NodeKind::Rule { body: None, .. } => {
          return Err(self.error(GrammarErrorKind::UnboundRule, id, "rule has no body"));
        }
        NodeKind::Seq(children) | NodeKind::Alt(children) if children.is_empty() => {
          return Err(self.error(GrammarErrorKind::EmptyGroup, id, "group has no children"));
        }
        _ => {}
      }
    }
    Ok(())
  }

  fn error(&self, kind: GrammarErrorKind, id: NodeId, what: &str) -> GrammarError {
    GrammarError {
      kind,
      message: format!("{}: {}", self.name(id), what),
    }
  }

  fn join_names(&self, children: &[NodeId], sep: &str) -> String {
    children
      .iter()
      .map(|&id| self.name(id))
      .collect::<Vec<_>>()
      .join(sep)
  }
}

fn byte_name(b: u8) -> String {
  if b.is_ascii_graphic() {
    (b as char).to_string()
  } else {
    format!("{:#04x}", b)
  }
}

impl<D> Debug for Node<D> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?} {:?}", self.name, self.kind)
  }
}

impl<D> Debug for NodeKind<D> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      NodeKind::Token(class) => f.debug_tuple("Token").field(class).finish(),
      NodeKind::Predicate(_) => write!(f, "Predicate"),
      NodeKind::Seq(children) => f.debug_tuple("Seq").field(children).finish(),
      NodeKind::Alt(children) => f.debug_tuple("Alt").field(children).finish(),
      NodeKind::Repeat {
        body,
        min,
        max,
        over,
      } => f
        .debug_struct("Repeat")
        .field("body", body)
        .field("min", min)
        .field("max", max)
        .field("over", over)
        .finish(),
      NodeKind::Ctrl(flags) => f.debug_tuple("Ctrl").field(flags).finish(),
      NodeKind::Lexeme(body) => f.debug_tuple("Lexeme").field(body).finish(),
      NodeKind::Rule { body, reducer } => f
        .debug_struct("Rule")
        .field("body", body)
        .field("reducer", &reducer.is_some())
        .finish(),
    }
  }
}

impl<D> Debug for Grammar<D> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut map = f.debug_map();
    for (ix, node) in self.nodes.iter().enumerate() {
      map.entry(&ix, node);
    }
    map.finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::interface::bypass;

  #[test]
  fn auto_names() {
    let mut g: Grammar = Grammar::new();
    let a = g.byte(b'a');
    let digits = g.byte_range(b'0', b'9');
    let both = g.alt(&[a, digits]);
    assert_eq!(g.name(a), "a");
    assert_eq!(g.name(digits), "0-9");
    assert_eq!(g.name(both), "a|0-9");

    let nl = g.byte(b'\n');
    assert_eq!(g.name(nl), "0x0a");
  }

  #[test]
  fn literal_chains_tokens() {
    let mut g: Grammar = Grammar::new();
    let lit = g.literal("ab");
    assert_eq!(g.name(lit), "ab");
    match &g.get(lit).unwrap().kind {
      NodeKind::Seq(children) => assert_eq!(children.len(), 2),
      kind => panic!("expected a sequence, got {:?}", kind),
    }

    let single = g.literal("x");
    match &g.get(single).unwrap().kind {
      NodeKind::Token(class) => assert!(class.contains(b'x')),
      kind => panic!("expected a token, got {:?}", kind),
    }
  }

  #[test]
  fn forward_declared_production() {
    let mut g: Grammar = Grammar::new();
    let p = g.rule("P");
    assert_eq!(g.check().unwrap_err().kind, GrammarErrorKind::UnboundRule);

    let body = g.null();
    g.define(p, body).unwrap();
    assert!(g.check().is_ok());
    assert_eq!(g.production("P"), Some(p));
  }

  #[test]
  fn bind_rejects_non_rules() {
    let mut g: Grammar = Grammar::new();
    let tok = g.byte(b'x');
    let err = g.bind(tok, bypass).unwrap_err();
    assert_eq!(err.kind, GrammarErrorKind::NotARule);

    let lex = g.lexical("L", tok);
    let err = g.bind(lex, bypass).unwrap_err();
    assert_eq!(err.kind, GrammarErrorKind::NotARule);
  }

  #[test]
  fn class_edits() {
    let mut g: Grammar = Grammar::new();
    let name = g.one_of(b"_");
    g.class_mut(name).unwrap().add_range(b'0', b'9');
    g.class_mut(name).unwrap().remove(b'5');
    let class = g.class_mut(name).unwrap();
    assert!(class.contains(b'_'));
    assert!(class.contains(b'0'));
    assert!(!class.contains(b'5'));

    let rep = g.many(name);
    assert!(g.class_mut(rep).is_none());
  }

  #[test]
  fn default_caps_follow_body_kind() {
    let mut g: Grammar = Grammar::new();
    let tok = g.byte(b'a');
    let rep = g.many(tok);
    match g.get(rep).unwrap().kind {
      NodeKind::Repeat { max, over, .. } => {
        assert_eq!(max, MAX_LEXEME_REPEAT);
        assert!(over);
      }
      _ => unreachable!(),
    }

    let rule = g.syntactic("R", tok);
    let rep = g.many(rule);
    match g.get(rep).unwrap().kind {
      NodeKind::Repeat { max, .. } => assert_eq!(max, MAX_REPEAT),
      _ => unreachable!(),
    }
  }
}
