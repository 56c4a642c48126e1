use crate::tpl::Segment;

#[derive(Clone, Copy)]
enum State {
    Normal,
    Quoted(char),
    LineComment,
    BlockComment,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Splits a template into text and `:name` parameters.
///
/// Quoted literals (`'..'`, `".."`, backticks) and comments (`--`, `#`,
/// `/* */`) are copied verbatim, `::` is kept as text so casts survive, and a
/// lone `:` is plain text.
pub fn parse_template(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text = String::with_capacity(template.len());
    let mut state = State::Normal;
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match state {
            State::Quoted(q) => {
                text.push(c);
                if c == '\\' && q != '`' {
                    if let Some((_, escaped)) = chars.next() {
                        text.push(escaped);
                    }
                } else if c == q {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                text.push(c);
                if c == '\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                text.push(c);
                if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                    text.push('/');
                    chars.next();
                    state = State::Normal;
                }
            }
            State::Normal => match c {
                '\'' | '"' | '`' => {
                    state = State::Quoted(c);
                    text.push(c);
                }
                '#' => {
                    state = State::LineComment;
                    text.push(c);
                }
                '-' if template[pos..].starts_with("--") => {
                    state = State::LineComment;
                    text.push(c);
                }
                '/' if template[pos..].starts_with("/*") => {
                    state = State::BlockComment;
                    text.push_str("/*");
                    chars.next();
                }
                ':' => match chars.peek().map(|&(_, next)| next) {
                    Some(':') => {
                        text.push_str("::");
                        chars.next();
                    }
                    Some(next) if is_name_char(next) => {
                        let start = pos + 1;
                        let mut end = start;
                        while let Some(&(i, n)) = chars.peek() {
                            if !is_name_char(n) {
                                break;
                            }
                            end = i + n.len_utf8();
                            chars.next();
                        }
                        if !text.is_empty() {
                            segments.push(Segment::Text(std::mem::take(&mut text)));
                        }
                        segments.push(Segment::Param(template[start..end].to_string()));
                    }
                    _ => text.push(c),
                },
                _ => text.push(c),
            },
        }
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    segments
}
