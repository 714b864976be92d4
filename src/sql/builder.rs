//! Builds parameterized filtered/sorted/paginated SELECTs. Identifiers are `&'static str`
//! so only code can name columns; every request value is bound as a parameter.

use super::params::PgBindValue;

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse `asc`/`desc` (any case). Anything else yields None so callers can fall back.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum CmpOp {
    Eq,
    Gte,
    Lte,
}

impl CmpOp {
    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Gte => ">=",
            CmpOp::Lte => "<=",
        }
    }
}

/// Escape LIKE metacharacters and wrap in `%...%` for a substring match.
pub fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// SELECT with accumulated WHERE conditions, an ORDER BY, and LIMIT/OFFSET.
pub struct ListQuery {
    columns: &'static str,
    from: &'static str,
    where_parts: Vec<String>,
    params: Vec<PgBindValue>,
    order: Vec<String>,
}

impl ListQuery {
    /// `from` includes the base table alias and any joins the columns or filters need.
    pub fn new(columns: &'static str, from: &'static str) -> Self {
        ListQuery {
            columns,
            from,
            where_parts: Vec::new(),
            params: Vec::new(),
            order: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }

    pub fn filter(&mut self, column: &'static str, op: CmpOp, value: impl Into<PgBindValue>) -> &mut Self {
        let n = self.push_param(value.into());
        self.where_parts.push(format!("{} {} ${}", column, op.symbol(), n));
        self
    }

    pub fn filter_eq(&mut self, column: &'static str, value: impl Into<PgBindValue>) -> &mut Self {
        self.filter(column, CmpOp::Eq, value)
    }

    /// Case-insensitive substring match against any of `columns`, sharing one parameter.
    pub fn filter_contains_any(&mut self, columns: &[&'static str], term: &str) -> &mut Self {
        if columns.is_empty() {
            return self;
        }
        let n = self.push_param(PgBindValue::Text(like_pattern(term)));
        let ors: Vec<String> = columns.iter().map(|c| format!("{} ILIKE ${}", c, n)).collect();
        self.where_parts.push(format!("({})", ors.join(" OR ")));
        self
    }

    /// Raw condition without parameters (code-only, e.g. `c.ends_at > NOW()`).
    pub fn filter_raw(&mut self, condition: &'static str) -> &mut Self {
        self.where_parts.push(condition.to_string());
        self
    }

    pub fn order_by(&mut self, expr: &'static str, dir: SortDirection) -> &mut Self {
        self.order.push(format!("{} {}", expr, dir.keyword()));
        self
    }

    /// Rank rows whose `rank_column` contains `term` ahead of the rest. Call before other `order_by`s.
    pub fn order_by_match_first(&mut self, rank_column: &'static str, term: &str) -> &mut Self {
        let n = self.push_param(PgBindValue::Text(like_pattern(term)));
        self.order.push(format!("CASE WHEN {} ILIKE ${} THEN 0 ELSE 1 END", rank_column, n));
        self
    }

    fn where_clause(&self) -> String {
        if self.where_parts.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.where_parts.join(" AND "))
        }
    }

    /// Parameters referenced only by ORDER BY are not part of the count query; they are
    /// always pushed after filters, so the count keeps the prefix its WHERE uses.
    fn where_param_count(&self) -> usize {
        self.where_parts
            .iter()
            .flat_map(|p| p.split('$').skip(1))
            .filter_map(|s| s.chars().take_while(char::is_ascii_digit).collect::<String>().parse::<usize>().ok())
            .max()
            .unwrap_or(0)
    }

    pub fn build_page(&self, limit: u32, offset: u64) -> QueryBuf {
        let mut q = QueryBuf::new();
        let order_clause = if self.order.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {}", self.order.join(", "))
        };
        q.sql = format!(
            "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
            self.columns,
            self.from,
            self.where_clause(),
            order_clause,
            limit,
            offset
        );
        q.params = self.params.clone();
        q
    }

    pub fn build_count(&self) -> QueryBuf {
        let mut q = QueryBuf::new();
        q.sql = format!("SELECT COUNT(*) FROM {}{}", self.from, self.where_clause());
        q.params = self.params[..self.where_param_count()].to_vec();
        q
    }
}
