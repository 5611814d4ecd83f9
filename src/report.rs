use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use crate::status::Status;

/// One-line summary of a parse status, fatal kinds first.
pub fn headline(status: Status) -> &'static str {
  if status.contains(Status::BAD_RULE) {
    "a syntactic production has no body"
  } else if status.contains(Status::BAD_LEXEME) {
    "a lexical production has no body"
  } else if status.fatal() && status.contains(Status::EOF) {
    "unexpected end of input"
  } else if status.fatal() && status.contains(Status::OVER) {
    "repetition overflow"
  } else if status.contains(Status::SYNTAX) {
    "syntax error"
  } else if status.fatal() && status.contains(Status::REST) {
    "unparsed input remains"
  } else if status.ok() {
    "parse succeeded"
  } else {
    "no match"
  }
}

/// Renders a parse failure against its input with a label at the stop
/// position, to stderr.
pub fn report(name: &str, input: &str, status: Status, stop: usize) {
  let writer = StandardStream::stderr(ColorChoice::Always);
  let config = term::Config::default();
  let files = SimpleFile::new(name, input);

  let end = (stop + 1).min(input.len());
  let diagnostic = Diagnostic::error()
    .with_message(headline(status))
    .with_labels(vec![Label::primary((), stop..end.max(stop))
      .with_message(format!("parsing stopped here, status {:?}", status))]);

  term::emit(&mut writer.lock(), &config, &files, &diagnostic).unwrap();
}
