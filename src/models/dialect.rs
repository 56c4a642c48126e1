/// Positional placeholder style understood by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `?` (MySQL, SQLite)
    #[default]
    Question,
    /// `$1`, `$2` (PostgreSQL)
    Dollar,
    /// `@p1`, `@p2` (SQL Server)
    At,
    /// `:arg1`, `:arg2` (Oracle)
    Named,
}

impl Dialect {
    /// Rewrites every `?` outside quoted text and `--`/`/* */` comments into
    /// this dialect's numbered placeholder.
    pub fn rebind(&self, query: &str) -> String {
        let prefix = match self {
            Dialect::Question => return query.to_string(),
            Dialect::Dollar => "$",
            Dialect::At => "@p",
            Dialect::Named => ":arg",
        };

        let mut out = String::with_capacity(query.len() + 8);
        let mut seq = 0usize;
        let mut chars = query.chars().peekable();
        let mut state = Scan::Normal;

        while let Some(c) = chars.next() {
            out.push(c);
            match state {
                Scan::Quoted(q) => {
                    if c == '\\' && q != '`' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if c == q {
                        state = Scan::Normal;
                    }
                }
                Scan::LineComment => {
                    if c == '\n' {
                        state = Scan::Normal;
                    }
                }
                Scan::BlockComment => {
                    if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        out.push('/');
                        state = Scan::Normal;
                    }
                }
                Scan::Normal => match c {
                    '\'' | '"' | '`' => state = Scan::Quoted(c),
                    '-' if chars.peek() == Some(&'-') => {
                        chars.next();
                        out.push('-');
                        state = Scan::LineComment;
                    }
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        out.push('*');
                        state = Scan::BlockComment;
                    }
                    '?' => {
                        out.pop();
                        seq += 1;
                        out.push_str(prefix);
                        out.push_str(&seq.to_string());
                    }
                    _ => {}
                },
            }
        }
        out
    }
}

#[derive(Clone, Copy)]
enum Scan {
    Normal,
    Quoted(char),
    LineComment,
    BlockComment,
}
