/// Per-production semantic record: the host payload, the matched span and
/// the name of the production that produced it. Reducers receive the child
/// records of a production body and return one record for the whole match.
#[derive(Debug, Clone, Default)]
pub struct Interface<'a, D> {
  pub data: D,
  input: &'a [u8],
  pub start: usize,
  pub len: usize,
  pub name: &'a str,
}

/// Reducer attached to a syntactic production. The returned record's
/// payload is re-wrapped with the production's own span and name.
pub type Reducer<D> = for<'a> fn(&[Interface<'a, D>]) -> Interface<'a, D>;

/// Inline boolean check over the most recently matched span.
pub type Predicate = fn(&[u8]) -> bool;

impl<'a, D> Interface<'a, D> {
  /// the matched input slice
  pub fn text(&self) -> &'a [u8] {
    self
      .input
      .get(self.start..self.start + self.len)
      .unwrap_or(&[])
  }

  /// the matched slice as UTF-8, empty on invalid data
  pub fn as_str(&self) -> &'a str {
    std::str::from_utf8(self.text()).unwrap_or("")
  }

  pub fn end(&self) -> usize {
    self.start + self.len
  }
}

impl<'a, D: Clone> Interface<'a, D> {
  /// carries a child payload under a new span and production name
  pub fn carry(
    from: &Interface<'a, D>,
    input: &'a [u8],
    start: usize,
    len: usize,
    name: &'a str,
  ) -> Interface<'a, D> {
    Interface {
      data: from.data.clone(),
      input,
      start,
      len,
      name,
    }
  }
}

impl<'a, D: Default> Interface<'a, D> {
  /// structural record for a match without a payload
  pub fn stub(input: &'a [u8], start: usize, len: usize, name: &'a str) -> Interface<'a, D> {
    Interface {
      data: D::default(),
      input,
      start,
      len,
      name,
    }
  }

  /// reducer result: a payload spanning all of `children`
  pub fn reduced(data: D, children: &[Interface<'a, D>], name: &'a str) -> Interface<'a, D> {
    match (children.first(), children.last()) {
      (Some(front), Some(back)) => Interface {
        data,
        input: front.input,
        start: front.start,
        len: back.end().saturating_sub(front.start),
        name,
      },
      _ => Interface {
        data,
        name,
        ..Interface::default()
      },
    }
  }

  /// reducer result spanning from `front` to `back`
  pub fn concat(
    front: &Interface<'a, D>,
    back: &Interface<'a, D>,
    name: &'a str,
  ) -> Interface<'a, D> {
    Interface {
      data: D::default(),
      input: front.input,
      start: front.start,
      len: back.end().saturating_sub(front.start),
      name,
    }
  }
}

/// Standard pass-through reducer, forwards the first child record.
pub fn bypass<'a, D: Clone + Default>(children: &[Interface<'a, D>]) -> Interface<'a, D> {
  children.first().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stub_spans_input() {
    let input = b"key=value";
    let stub = Interface::<bool>::stub(input, 4, 5, "Value");
    assert_eq!(stub.text(), b"value");
    assert_eq!(stub.as_str(), "value");
    assert_eq!(stub.end(), 9);
  }

  #[test]
  fn reduced_covers_children() {
    let input = b"a=b";
    let children = vec![
      Interface::<u32>::stub(input, 0, 1, "Name"),
      Interface::<u32>::stub(input, 1, 1, "Equal"),
      Interface::<u32>::stub(input, 2, 1, "Value"),
    ];
    let whole = Interface::reduced(7, &children, "Item");
    assert_eq!(whole.data, 7);
    assert_eq!(whole.text(), b"a=b");
    assert_eq!(whole.name, "Item");
  }

  #[test]
  fn bypass_forwards_first() {
    let input = b"xy";
    let children = vec![
      Interface::<u32>::stub(input, 0, 1, "X"),
      Interface::<u32>::stub(input, 1, 1, "Y"),
    ];
    assert_eq!(bypass(&children).name, "X");
    assert_eq!(bypass::<u32>(&[]).len, 0);
  }

  #[test]
  fn concat_spans_front_to_back() {
    let input = b"[section]";
    let front = Interface::<bool>::stub(input, 0, 1, "Left");
    let back = Interface::<bool>::stub(input, 8, 1, "Right");
    let whole = Interface::concat(&front, &back, "Section");
    assert_eq!(whole.text(), b"[section]");
  }
}
