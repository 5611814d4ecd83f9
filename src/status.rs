use std::fmt::{self, Debug};
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Result channel of the interpreter: match outcome, control markers and
/// error kinds multiplexed on one word, combinable with `|`.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Status(u32);

impl Status {
  pub const NONE: Status = Status(0);
  /// the node matched
  pub const OK: Status = Status(0x1);
  /// early-return marker, promotes a partial match through an alternation
  pub const RET: Status = Status(0x8);
  /// switch the enclosing alternation to accept-first
  pub const FIRST: Status = Status(0x10);
  /// check but do not consume the next element of a sequence
  pub const SKIP: Status = Status(0x20);
  /// arm the catch hook for the enclosing sequence
  pub const TRY: Status = Status(0x80);
  /// input remains after the root parse
  pub const REST: Status = Status(0x100);
  /// a repetition hit its overflow cap
  pub const OVER: Status = Status(0x400);
  /// the cursor reached end of input during a match
  pub const EOF: Status = Status(0x800);
  /// a syntactic production was invoked with no body
  pub const BAD_RULE: Status = Status(0x1000);
  /// a lexical production was invoked with no body
  pub const BAD_LEXEME: Status = Status(0x2000);
  /// reserved for host-level catch hooks
  pub const SYNTAX: Status = Status(0x4000);
  /// top-bit fatal marker, always combined with a kind
  pub const ERROR: Status = Status(0x8000_0000);

  pub fn is_empty(self) -> bool {
    self.0 == 0
  }

  /// true when every bit of `other` is set in `self`
  pub fn contains(self, other: Status) -> bool {
    self.0 & other.0 == other.0
  }

  /// true when any bit of `other` is set in `self`
  pub fn intersects(self, other: Status) -> bool {
    self.0 & other.0 != 0
  }

  pub fn ok(self) -> bool {
    self.contains(Status::OK)
  }

  pub fn fatal(self) -> bool {
    self.intersects(Status::ERROR)
  }

  pub fn bits(self) -> u32 {
    self.0
  }
}

impl BitOr for Status {
  type Output = Status;
  fn bitor(self, rhs: Status) -> Status {
    Status(self.0 | rhs.0)
  }
}

impl BitOrAssign for Status {
  fn bitor_assign(&mut self, rhs: Status) {
    self.0 |= rhs.0;
  }
}

impl BitAnd for Status {
  type Output = Status;
  fn bitand(self, rhs: Status) -> Status {
    Status(self.0 & rhs.0)
  }
}

impl BitAndAssign for Status {
  fn bitand_assign(&mut self, rhs: Status) {
    self.0 &= rhs.0;
  }
}

impl Not for Status {
  type Output = Status;
  fn not(self) -> Status {
    Status(!self.0)
  }
}

impl Debug for Status {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    const NAMES: [(Status, &str); 12] = [
      (Status::OK, "Ok"),
      (Status::RET, "Ret"),
      (Status::FIRST, "First"),
      (Status::SKIP, "Skip"),
      (Status::TRY, "Try"),
      (Status::REST, "Rest"),
      (Status::OVER, "Over"),
      (Status::EOF, "Eof"),
      (Status::BAD_RULE, "BadRule"),
      (Status::BAD_LEXEME, "BadLexem"),
      (Status::SYNTAX, "Syntax"),
      (Status::ERROR, "Error"),
    ];

    if self.is_empty() {
      return write!(f, "None");
    }

    let mut rest = self.0;
    let mut sep = "";
    for &(bit, name) in NAMES.iter() {
      if rest & bit.0 != 0 {
        write!(f, "{}{}", sep, name)?;
        sep = "|";
        rest &= !bit.0;
      }
    }
    if rest != 0 {
      write!(f, "{}{:#x}", sep, rest)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bit_algebra() {
    let st = Status::OK | Status::EOF;
    assert!(st.ok());
    assert!(st.contains(Status::EOF));
    assert!(!st.contains(Status::OK | Status::OVER));
    assert!(st.intersects(Status::OK | Status::OVER));
    assert!(!st.fatal());

    let st = st & !Status::OK;
    assert!(!st.ok());
    assert_eq!(st, Status::EOF);
  }

  #[test]
  fn fatal_is_top_bit() {
    assert!((Status::ERROR | Status::BAD_RULE).fatal());
    assert!(!(Status::BAD_RULE).fatal());
    assert!((Status::OK | Status::ERROR | Status::REST).fatal());
  }

  #[test]
  fn debug_lists_flags() {
    assert_eq!(format!("{:?}", Status::NONE), "None");
    assert_eq!(format!("{:?}", Status::OK | Status::EOF), "Ok|Eof");
    assert_eq!(
      format!("{:?}", Status::ERROR | Status::BAD_LEXEME),
      "BadLexem|Error"
    );
  }
}
