use super::*;

#[test]
fn line_and_offset_from_span() {
  let src = "Using bot\nBool b = 5\n";
  // span of `5`
  let error = Error::new(ErrorKind::Type, "mismatch", 19..20);
  assert_eq!(error.line(src), 2);
  assert_eq!(error.offset(src), 9);
}

#[test]
fn report_points_at_offending_column() {
  let src = "Int x = True\n";
  let error = Error::new(
    ErrorKind::Type,
    "unexpected type of expression: variable=Int, expression=Bool",
    8..12,
  );
  assert_eq!(
    error.report("bot.nil", src),
    "Int x = True\n\
     --------^---\n\
     bot.nil:1:8: unexpected type of expression: variable=Int, expression=Bool"
  );
}

#[test]
fn report_on_later_line() {
  let src = "Using bot\nBool b = 5\n";
  let error = Error::new(ErrorKind::Type, "mismatch", 19..20);
  assert_eq!(
    error.report("bot.nil", src),
    "Bool b = 5\n\
     ---------^\n\
     bot.nil:2:9: mismatch"
  );
}

#[test]
fn report_with_span_past_line_end_keeps_pointer_in_bounds() {
  let src = "Int x = 5";
  let error = Error::new(ErrorKind::Parse, "expected end of line, got number", 9..9);
  let report = error.report("bot.nil", src);
  assert_eq!(report.lines().nth(1), Some("---------"));
}
