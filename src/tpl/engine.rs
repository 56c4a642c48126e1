use crate::error::DbError;
use crate::tpl::{Segment, cache};
use crate::udbc::value::{Arg, ArgMap, Value};

/// Marks where a batch insert's row groups go, e.g.
/// `INSERT INTO t (a, b) VALUES {rows}`.
pub const BATCH_ROWS_MARKER: &str = "{rows}";

const ROW_ARG_PREFIX: &str = "__row";

/// A template resolved against its arguments, still using `?` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub sql: String,
    pub args: Vec<Value>,
    /// Byte offset of each `?` emitted, in argument order.
    marks: Vec<usize>,
}

impl BoundQuery {
    /// The statement with every placeholder replaced by its literal argument.
    /// Only for display; never executed.
    pub fn render_literal(&self) -> String {
        let mut out = String::with_capacity(self.sql.len() + self.args.len() * 8 + 1);
        let mut last = 0;
        for (mark, arg) in self.marks.iter().zip(&self.args) {
            out.push_str(&self.sql[last..*mark]);
            out.push_str(&arg.to_string());
            last = mark + 1;
        }
        out.push_str(&self.sql[last..]);
        out.push(';');
        out
    }
}

/// Resolves `:name` placeholders against `args`.
///
/// Scalars become a single `?`; collections expand to `?, ?, ?` so that
/// `id IN (:ids)` binds every element.
pub fn bind_named(template: &str, args: &ArgMap) -> Result<BoundQuery, DbError> {
    let segments = cache::get_segments(template);

    let mut sql = String::with_capacity(template.len() + 16);
    let mut values = Vec::with_capacity(segments.len());
    let mut marks = Vec::with_capacity(segments.len());

    for segment in segments.iter() {
        match segment {
            Segment::Text(text) => sql.push_str(text),
            Segment::Param(name) => match args.get(name) {
                None => {
                    return Err(DbError::Binding(format!(
                        "could not find name `{}` in argument map",
                        name
                    )));
                }
                Some(Arg::Scalar(v)) => {
                    marks.push(sql.len());
                    sql.push('?');
                    values.push(v.clone());
                }
                Some(Arg::List(items)) => {
                    if items.is_empty() {
                        return Err(DbError::Binding(format!(
                            "empty collection bound to `{}`",
                            name
                        )));
                    }
                    for (i, v) in items.iter().enumerate() {
                        if i > 0 {
                            sql.push_str(", ");
                        }
                        marks.push(sql.len());
                        sql.push('?');
                        values.push(v.clone());
                    }
                }
            },
        }
    }

    Ok(BoundQuery {
        sql,
        args: values,
        marks,
    })
}

/// Replaces the single [`BATCH_ROWS_MARKER`] in `template` with one `(...)` group
/// per row and adds each row to `args` as a collection argument.
pub fn expand_batch(
    template: &str,
    rows: &[Vec<Value>],
    args: &mut ArgMap,
) -> Result<String, DbError> {
    let width = match rows.first() {
        Some(first) if !first.is_empty() => first.len(),
        Some(_) => return Err(DbError::Parameter("batch rows have no columns".into())),
        None => return Err(DbError::Parameter("batch insert needs at least one row".into())),
    };
    if let Some(i) = rows.iter().position(|r| r.len() != width) {
        return Err(DbError::Parameter(format!(
            "batch row {} has {} values, expected {}",
            i,
            rows[i].len(),
            width
        )));
    }

    match template.matches(BATCH_ROWS_MARKER).count() {
        1 => {}
        0 => {
            return Err(DbError::Binding(format!(
                "batch template has no `{}` marker",
                BATCH_ROWS_MARKER
            )));
        }
        n => {
            return Err(DbError::Binding(format!(
                "batch template has {} `{}` markers, expected one",
                n, BATCH_ROWS_MARKER
            )));
        }
    }

    if let Some(name) = args.keys().find(|k| k.starts_with(ROW_ARG_PREFIX)) {
        return Err(DbError::Binding(format!(
            "argument name `{}` is reserved for batch rows",
            name
        )));
    }

    let mut groups = String::with_capacity(rows.len() * 12);
    for (i, row) in rows.iter().enumerate() {
        let name = format!("{}{}", ROW_ARG_PREFIX, i);
        if i > 0 {
            groups.push(',');
        }
        groups.push_str("(:");
        groups.push_str(&name);
        groups.push(')');
        args.insert(name, Arg::List(row.clone()));
    }

    Ok(template.replacen(BATCH_ROWS_MARKER, &groups, 1))
}
