//! Bordered text tables for terminal output.
//!
//! Cells are optional; a missing cell renders as blank padding so callers can
//! pass record fields straight through without inventing sentinel strings.

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Style {
    /// Unicode box drawing with a double rule under the header.
    Fancy,
    /// Plain ASCII grid with `=` under the header.
    Grid,
}

struct Rule {
    left: char,
    fill: char,
    join: char,
    right: char,
}

struct Borders {
    top: Rule,
    header: Rule,
    row: Rule,
    bottom: Rule,
    vertical: char,
}

impl Style {
    fn borders(self) -> Borders {
        match self {
            Style::Fancy => Borders {
                top: Rule { left: '╒', fill: '═', join: '╤', right: '╕' },
                header: Rule { left: '╞', fill: '═', join: '╪', right: '╡' },
                row: Rule { left: '├', fill: '─', join: '┼', right: '┤' },
                bottom: Rule { left: '╘', fill: '═', join: '╧', right: '╛' },
                vertical: '│',
            },
            Style::Grid => Borders {
                top: Rule { left: '+', fill: '-', join: '+', right: '+' },
                header: Rule { left: '+', fill: '=', join: '+', right: '+' },
                row: Rule { left: '+', fill: '-', join: '+', right: '+' },
                bottom: Rule { left: '+', fill: '-', join: '+', right: '+' },
                vertical: '|',
            },
        }
    }
}

/// Render `rows` under `headers`. Rows shorter than the header are padded with
/// blank cells; extra cells are ignored.
pub fn render<S: AsRef<str>>(headers: &[&str], rows: &[Vec<Option<S>>], style: Style) -> String {
    let cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().take(cols).enumerate() {
            if let Some(c) = cell {
                widths[i] = widths[i].max(c.as_ref().chars().count());
            }
        }
    }

    let b = style.borders();
    let mut out = String::new();
    push_rule(&mut out, &b.top, &widths);
    push_line(&mut out, b.vertical, &widths, |i| Some(headers[i]));
    if rows.is_empty() {
        push_rule(&mut out, &b.bottom, &widths);
        return out;
    }
    push_rule(&mut out, &b.header, &widths);
    for (n, row) in rows.iter().enumerate() {
        push_line(&mut out, b.vertical, &widths, |i| {
            row.get(i).and_then(|c| c.as_ref()).map(|c| c.as_ref())
        });
        let rule = if n + 1 == rows.len() { &b.bottom } else { &b.row };
        push_rule(&mut out, rule, &widths);
    }
    out
}

fn push_rule(out: &mut String, rule: &Rule, widths: &[usize]) {
    out.push(rule.left);
    for (i, w) in widths.iter().enumerate() {
        if i > 0 {
            out.push(rule.join);
        }
        out.extend(std::iter::repeat(rule.fill).take(w + 2));
    }
    out.push(rule.right);
    out.push('\n');
}

fn push_line<'a, F>(out: &mut String, vertical: char, widths: &[usize], cell: F)
where
    F: Fn(usize) -> Option<&'a str>,
{
    out.push(vertical);
    for (i, w) in widths.iter().enumerate() {
        let text = cell(i).unwrap_or("");
        let pad = w - text.chars().count();
        out.push(' ');
        out.push_str(text);
        out.extend(std::iter::repeat(' ').take(pad + 1));
        out.push(vertical);
    }
    out.push('\n');
}
