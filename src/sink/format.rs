/// Renders one CSV row terminated by `\n`, quoting fields that need it.
#[must_use]
pub(crate) fn format_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = String::with_capacity(160);
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            line.push(',');
        }
        push_field(&mut line, field.as_ref());
    }
    line.push('\n');
    line
}

fn push_field(line: &mut String, field: &str) {
    if !field.contains([',', '"', '\n', '\r']) {
        line.push_str(field);
        return;
    }
    line.push('"');
    for ch in field.chars() {
        if ch == '"' {
            line.push('"');
        }
        line.push(ch);
    }
    line.push('"');
}

/// Human readable count of rows, used in the shutdown summary.
#[must_use]
pub fn describe_rows(rows: u64, failed: u64) -> String {
    if failed == 0 {
        format!("{} rows written", rows)
    } else {
        format!("{} rows written, {} rows failed", rows, failed)
    }
}
