use std::sync::LazyLock;
use regex::Regex;
use tracing::debug;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{unquote, Value};
use crate::query::ast::{
    Assignment, Condition, CreateTable, Delete, Insert, Operator, OrderBy, Predicate, Select,
    SortOrder, Statement, Update,
};
use crate::query::scanner::{
    find_unquoted, find_unquoted_ignore_case, mask_quoted, split_keyword, split_tokens,
    split_top_level,
};
use crate::schema::schema::{ColumnDefinition, ColumnType, Schema};

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("statement pattern must compile")
}

static CREATE_TABLE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)^\s*CREATE\s+TABLE\s+(\w+)\s*\((.*)\)"));
static INSERT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?is)^\s*INSERT\s+INTO\s+(\w+)(?:\s*\(([^)]*)\))?\s+VALUES\s*\((.*)\)")
});
static FROM: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\bFROM\s+(\w+)"));
static WHERE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\bWHERE\b"));
static CLAUSE_END: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\s(?:ORDER\s+BY|LIMIT)\b"));
static ORDER_KEYWORD: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\bORDER\s+BY\b"));
static ORDER_BY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\bORDER\s+BY\s+(\w+)(?:\s+(ASC|DESC)\b)?"));
static LIMIT_KEYWORD: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\bLIMIT\b"));
static LIMIT: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\bLIMIT\s+(\d+)\b"));
static UPDATE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)^\s*UPDATE\s+(\w+)\s+SET\s+(.+?)\s+WHERE\s+(.+)$"));
static DELETE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)^\s*DELETE\s+FROM\s+(\w+)\s+WHERE\s+(.+)$"));
static DROP_TABLE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^\s*DROP\s+TABLE\s+(\w+)\s*$"));
static RENAME_TABLE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^\s*RENAME\s+TABLE\s+(\w+)\s+TO\s+(\w+)\s*$"));
static SHOW_TABLE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^\s*SHOW\s+TABLE\s+(\w+)\s*$"));
static DESCRIBE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^\s*(?:DESC|DESCRIBE)\s+(\w+)\s*$"));
static CREATE_INDEX: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^\s*CREATE\s+INDEX\s+ON\s+(\w+)\s*\(\s*(\w+)\s*\)\s*$"));

/// Run `re` over the quote-masked text and slice the groups out of the
/// original, so literals never satisfy a keyword or delimiter.
fn captures<'t>(re: &Regex, text: &'t str) -> Option<Vec<Option<&'t str>>> {
    let masked = mask_quoted(text);
    let caps = re.captures(&masked)?;
    Some(caps.iter().map(|m| m.map(|m| &text[m.range()])).collect())
}

fn group<'t>(groups: &[Option<&'t str>], index: usize) -> &'t str {
    groups.get(index).copied().flatten().unwrap_or("")
}

/// SQL statement parser.
///
/// Each statement shape has its own routine; `parse` dispatches on the
/// leading keywords. A routine either returns a complete statement or a
/// `Parse` error, never a partial one.
#[derive(Debug, Clone, Default)]
pub struct SqlParser;

impl SqlParser {
    pub fn new() -> Self {
        SqlParser
    }

    pub fn parse(&self, query: &str) -> Result<Statement> {
        let query = query.trim();
        let query = query.strip_suffix(';').unwrap_or(query).trim_end();
        let upper = query.to_ascii_uppercase();
        debug!(query, "parsing statement");

        if upper.starts_with("CREATE TABLE") {
            self.parse_create_table(query)
        } else if upper.starts_with("DROP TABLE") {
            self.parse_drop_table(query)
        } else if upper.starts_with("RENAME TABLE") {
            self.parse_rename_table(query)
        } else if upper.starts_with("INSERT INTO") {
            self.parse_insert(query)
        } else if upper.starts_with("SELECT") {
            self.parse_select(query)
        } else if upper.starts_with("UPDATE") {
            self.parse_update(query)
        } else if upper.starts_with("DELETE FROM") {
            self.parse_delete(query)
        } else if upper.starts_with("DESC ") || upper.starts_with("DESCRIBE ") {
            self.parse_describe(query)
        } else if upper == "SHOW TABLES" {
            Ok(Statement::ShowTables)
        } else if upper.starts_with("SHOW TABLE ") {
            self.parse_show_table(query)
        } else if upper.starts_with("CREATE INDEX") {
            self.parse_create_index(query)
        } else {
            Err(Error::new(ErrorKind::UnsupportedQuery, "Unsupported SQL command"))
        }
    }

    /// `CREATE TABLE name (col type constraints, ...)`
    pub fn parse_create_table(&self, query: &str) -> Result<Statement> {
        let groups = captures(&CREATE_TABLE, query)
            .ok_or_else(|| Error::parse("Invalid CREATE TABLE syntax"))?;
        let table = group(&groups, 1).to_string();

        let mut schema = Schema::new();
        for column_text in split_top_level(group(&groups, 2), ',') {
            if column_text.is_empty() {
                continue;
            }
            let column = parse_column_definition(column_text)?;
            let name = column.name.clone();
            if !schema.add_column(column) {
                return Err(Error::parse(format!("Duplicate column '{}' in table '{}'", name, table)));
            }
        }

        Ok(Statement::CreateTable(CreateTable { table, schema }))
    }

    /// `INSERT INTO table [(c1, c2)] VALUES (v1, v2)`
    pub fn parse_insert(&self, query: &str) -> Result<Statement> {
        let groups = captures(&INSERT, query).ok_or_else(|| Error::parse("Invalid INSERT syntax"))?;
        let table = group(&groups, 1).to_string();

        let columns = match groups.get(2).copied().flatten() {
            Some(list) => {
                let names = split_top_level(list, ',');
                if names.is_empty() || names.iter().any(|n| !is_identifier(n)) {
                    return Err(Error::parse(format!("Invalid column list '({})'", list.trim())));
                }
                Some(names.into_iter().map(String::from).collect())
            }
            None => None,
        };

        let raw_values = split_top_level(group(&groups, 3), ',');
        if raw_values.is_empty() {
            return Err(Error::parse("INSERT requires at least one value"));
        }
        let mut values = Vec::with_capacity(raw_values.len());
        for raw in raw_values {
            if raw.is_empty() {
                return Err(Error::parse("Empty value in VALUES list"));
            }
            let masked = mask_quoted(raw);
            if masked.contains('(') || masked.contains(')') {
                return Err(Error::parse(format!("Unexpected parenthesis in value '{}'", raw)));
            }
            values.push(Value::coerce_literal(raw));
        }

        Ok(Statement::Insert(Insert { table, columns, values }))
    }

    /// `SELECT ... FROM table [WHERE ...] [ORDER BY col [ASC|DESC]] [LIMIT n]`
    pub fn parse_select(&self, query: &str) -> Result<Statement> {
        let masked = mask_quoted(query);

        let table = captures(&FROM, query)
            .map(|groups| group(&groups, 1).to_string())
            .ok_or_else(|| Error::parse("Invalid SELECT syntax: Missing FROM clause"))?;

        let filter = match WHERE.find(&masked) {
            Some(keyword) => {
                let rest = &masked[keyword.end()..];
                let end = CLAUSE_END
                    .find(rest)
                    .map(|m| keyword.end() + m.start())
                    .unwrap_or(masked.len());
                Some(parse_where(&query[keyword.end()..end])?)
            }
            None => None,
        };

        let order_by = if ORDER_KEYWORD.is_match(&masked) {
            let groups = captures(&ORDER_BY, query)
                .ok_or_else(|| Error::parse("Invalid ORDER BY clause: expected ORDER BY column [ASC|DESC]"))?;
            let order = match groups.get(2).copied().flatten() {
                Some(direction) if direction.eq_ignore_ascii_case("DESC") => SortOrder::Desc,
                _ => SortOrder::Asc,
            };
            Some(OrderBy { column: group(&groups, 1).to_string(), order })
        } else {
            None
        };

        let limit = if LIMIT_KEYWORD.is_match(&masked) {
            let groups = captures(&LIMIT, query)
                .ok_or_else(|| Error::parse("LIMIT requires a non-negative integer"))?;
            let n = group(&groups, 1)
                .parse::<usize>()
                .map_err(|_| Error::parse("LIMIT value is too large"))?;
            Some(n)
        } else {
            None
        };

        Ok(Statement::Select(Select { table, filter, order_by, limit }))
    }

    /// `UPDATE table SET c1=v1, c2=v2 WHERE ...`
    pub fn parse_update(&self, query: &str) -> Result<Statement> {
        let groups = captures(&UPDATE, query).ok_or_else(|| Error::parse("Invalid UPDATE syntax"))?;
        let table = group(&groups, 1).to_string();

        let mut assignments = Vec::new();
        for pair in split_top_level(group(&groups, 2), ',') {
            let at = find_unquoted(pair, "=")
                .ok_or_else(|| Error::parse(format!("Invalid SET clause '{}'", pair)))?;
            let column = pair[..at].trim();
            let raw = pair[at + 1..].trim();
            if !is_identifier(column) {
                return Err(Error::parse(format!("Invalid SET clause '{}'", pair)));
            }
            if raw.is_empty() {
                return Err(Error::parse(format!("Missing value for column '{}'", column)));
            }
            assignments.push(Assignment {
                column: column.to_string(),
                value: Value::coerce_literal(raw),
            });
        }
        if assignments.is_empty() {
            return Err(Error::parse("UPDATE requires at least one assignment"));
        }

        let filter = parse_where(group(&groups, 3))?;
        Ok(Statement::Update(Update { table, assignments, filter }))
    }

    /// `DELETE FROM table WHERE ...`
    pub fn parse_delete(&self, query: &str) -> Result<Statement> {
        let groups = captures(&DELETE, query).ok_or_else(|| Error::parse("Invalid DELETE syntax"))?;
        let table = group(&groups, 1).to_string();
        let filter = parse_where(group(&groups, 2))?;
        Ok(Statement::Delete(Delete { table, filter }))
    }

    pub fn parse_drop_table(&self, query: &str) -> Result<Statement> {
        let groups = captures(&DROP_TABLE, query)
            .ok_or_else(|| Error::parse("Invalid DROP TABLE syntax. Use: DROP TABLE table_name"))?;
        Ok(Statement::DropTable { table: group(&groups, 1).to_string() })
    }

    pub fn parse_rename_table(&self, query: &str) -> Result<Statement> {
        let groups = captures(&RENAME_TABLE, query).ok_or_else(|| {
            Error::parse("Invalid RENAME syntax. Use: RENAME TABLE old_name TO new_name")
        })?;
        Ok(Statement::RenameTable {
            from: group(&groups, 1).to_string(),
            to: group(&groups, 2).to_string(),
        })
    }

    pub fn parse_show_table(&self, query: &str) -> Result<Statement> {
        let groups = captures(&SHOW_TABLE, query)
            .ok_or_else(|| Error::parse("Invalid SHOW TABLE syntax. Use: SHOW TABLE table_name"))?;
        Ok(Statement::ShowTable { table: group(&groups, 1).to_string() })
    }

    pub fn parse_describe(&self, query: &str) -> Result<Statement> {
        let groups = captures(&DESCRIBE, query)
            .ok_or_else(|| Error::parse("Invalid DESCRIBE syntax. Use: DESC table_name"))?;
        Ok(Statement::Describe { table: group(&groups, 1).to_string() })
    }

    pub fn parse_create_index(&self, query: &str) -> Result<Statement> {
        let groups = captures(&CREATE_INDEX, query).ok_or_else(|| {
            Error::parse("Invalid CREATE INDEX syntax. Use: CREATE INDEX ON table_name(column_name)")
        })?;
        Ok(Statement::CreateIndex {
            table: group(&groups, 1).to_string(),
            column: group(&groups, 2).to_string(),
        })
    }
}

/// One column of a CREATE TABLE body.
///
/// Tokens after the name are scanned left to right; a later type keyword
/// overrides an earlier one and no type keyword means TEXT.
fn parse_column_definition(text: &str) -> Result<ColumnDefinition> {
    let tokens = split_tokens(text);
    let name = tokens
        .first()
        .ok_or_else(|| Error::parse("Empty column definition"))?;
    let mut column = ColumnDefinition::new(name, ColumnType::Text);

    let keyword_at = |i: usize| -> String {
        tokens
            .get(i)
            .map(|t| t.split('(').next().unwrap_or("").to_ascii_uppercase())
            .unwrap_or_default()
    };

    let mut i = 1;
    while i < tokens.len() {
        let word = keyword_at(i);
        if let Some(column_type) = ColumnType::from_keyword(&word) {
            column.column_type = column_type;
        } else if word == "PRIMARY" && keyword_at(i + 1) == "KEY" {
            column.primary_key = true;
        } else if word == "NOT" && keyword_at(i + 1) == "NULL" {
            column.not_null = true;
        } else if word == "UNIQUE" {
            column.unique = true;
        } else if word == "DEFAULT" && i + 1 < tokens.len() {
            column.default = Some(Value::coerce_literal(tokens[i + 1]));
            i += 1;
        }
        i += 1;
    }

    if let Some(default) = &column.default {
        if default.validate_against(&column).is_err() {
            return Err(Error::parse(format!(
                "Invalid DEFAULT '{}' for column '{}': must be {}",
                default, column.name, column.column_type
            )));
        }
    }

    Ok(column)
}

/// WHERE body -> predicate tree: OR of ANDs of comparisons
pub fn parse_where(clause: &str) -> Result<Predicate> {
    let clause = clause.trim();
    if clause.is_empty() {
        return Err(Error::parse("WHERE clause is empty"));
    }

    let mut any_of = Vec::new();
    for disjunct in split_keyword(clause, "OR") {
        let mut all_of = Vec::new();
        for fragment in split_keyword(disjunct, "AND") {
            all_of.push(Predicate::Compare(parse_condition(fragment)?));
        }
        any_of.push(collapse(all_of, Predicate::And));
    }

    Ok(collapse(any_of, Predicate::Or))
}

fn collapse(mut children: Vec<Predicate>, combine: fn(Vec<Predicate>) -> Predicate) -> Predicate {
    if children.len() == 1 {
        children.remove(0)
    } else {
        combine(children)
    }
}

/// `column op literal`, taking the first operator in candidate order
pub fn parse_condition(fragment: &str) -> Result<Condition> {
    let fragment = fragment.trim();

    for (symbol, operator) in Operator::CANDIDATES {
        let found = match operator {
            Operator::Like => find_unquoted_ignore_case(fragment, symbol),
            _ => find_unquoted(fragment, symbol),
        };
        let Some(at) = found else { continue };

        let column = fragment[..at].trim();
        let literal = fragment[at + symbol.len()..].trim();
        if column.is_empty() {
            return Err(Error::parse(format!("Missing column in condition '{}'", fragment)));
        }
        if literal.is_empty() {
            return Err(Error::parse(format!("Missing value in condition '{}'", fragment)));
        }
        return Ok(Condition::new(column, operator, unquote(literal)));
    }

    Err(Error::parse(format!("Invalid condition '{}': no comparison operator", fragment)))
}

fn is_identifier(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_candidates_prefer_two_char() {
        let c = parse_condition("age >= 30").unwrap();
        assert_eq!((c.column.as_str(), c.operator, c.value.as_str()), ("age", Operator::Gte, "30"));
        let c = parse_condition("age<30").unwrap();
        assert_eq!(c.operator, Operator::Lt);
        let c = parse_condition("name != 'Bob'").unwrap();
        assert_eq!((c.operator, c.value.as_str()), (Operator::Ne, "Bob"));
    }

    #[test]
    fn test_condition_operator_inside_literal_is_ignored() {
        let c = parse_condition("note = 'x>=y'").unwrap();
        assert_eq!((c.column.as_str(), c.operator, c.value.as_str()), ("note", Operator::Eq, "x>=y"));
    }

    #[test]
    fn test_like_is_case_insensitive_keyword() {
        let c = parse_condition("name like 'A%'").unwrap();
        assert_eq!((c.column.as_str(), c.operator, c.value.as_str()), ("name", Operator::Like, "A%"));
    }

    #[test]
    fn test_condition_without_operator_fails() {
        let err = parse_condition("age 30").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(parse_condition("= 3").is_err());
        assert!(parse_condition("a =").is_err());
    }

    #[test]
    fn test_where_and_binds_tighter_than_or() {
        let predicate = parse_where("a = 1 AND b = 2 OR c = 3").unwrap();
        match predicate {
            Predicate::Or(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(&children[0], Predicate::And(inner) if inner.len() == 2));
                assert!(matches!(&children[1], Predicate::Compare(c) if c.column == "c"));
            }
            other => panic!("expected OR, got {:?}", other),
        }
    }

    #[test]
    fn test_column_definition_keywords() {
        let column = parse_column_definition("id INTEGER PRIMARY KEY NOT NULL UNIQUE").unwrap();
        assert_eq!(column.column_type, ColumnType::Int);
        assert!(column.primary_key && column.not_null && column.unique);

        let column = parse_column_definition("score INT FLOAT").unwrap();
        assert_eq!(column.column_type, ColumnType::Float);

        let column = parse_column_definition("price DECIMAL(10, 2) DEFAULT 0").unwrap();
        assert_eq!(column.column_type, ColumnType::Float);
        assert_eq!(column.default, Some(Value::Integer(0)));

        let column = parse_column_definition("label VARCHAR(20) DEFAULT 'n/a'").unwrap();
        assert_eq!(column.column_type, ColumnType::Text);
        assert_eq!(column.default, Some(Value::text("n/a")));
    }

    #[test]
    fn test_default_must_fit_column_type() {
        let err = parse_column_definition("age INT DEFAULT abc").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert_eq!(err.message(), "Invalid DEFAULT 'abc' for column 'age': must be INT");

        assert!(parse_column_definition("active BOOLEAN DEFAULT maybe").is_err());
        assert!(parse_column_definition("ratio DEFAULT 1.5 FLOAT").is_ok());
    }
}
