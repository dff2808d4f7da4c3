use std::fmt;
use serde::{Deserialize, Serialize};
use crate::core::types::Value;
use crate::schema::schema::Schema;

/// Parsed statement, one variant per supported statement shape
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTable),
    DropTable { table: String },
    RenameTable { from: String, to: String },
    Insert(Insert),
    Select(Select),
    Update(Update),
    Delete(Delete),
    Describe { table: String },
    ShowTables,
    ShowTable { table: String },
    CreateIndex { table: String, column: String },
}

impl Statement {
    /// Statements that change the catalog and trigger a flush
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Statement::CreateTable(_)
                | Statement::DropTable { .. }
                | Statement::RenameTable { .. }
                | Statement::Insert(_)
                | Statement::Update(_)
                | Statement::Delete(_)
                | Statement::CreateIndex { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub table: String,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Option<Vec<String>>, // None: bind positionally
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub filter: Option<Predicate>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub filter: Predicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub filter: Predicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Value,
}

/// Comparison operator of a WHERE condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Gte,
    Lte,
    Ne,
    Eq,
    Gt,
    Lt,
    Like,
}

impl Operator {
    /// Search order when splitting a condition. Two-character operators
    /// come before their one-character prefixes.
    pub const CANDIDATES: [(&'static str, Operator); 7] = [
        (">=", Operator::Gte),
        ("<=", Operator::Lte),
        ("!=", Operator::Ne),
        ("=", Operator::Eq),
        (">", Operator::Gt),
        ("<", Operator::Lt),
        (" LIKE ", Operator::Like),
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Ne => "!=",
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Like => "LIKE",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Single `column op literal` predicate. The literal is kept as text with
/// surrounding quotes removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    pub value: String,
}

impl Condition {
    pub fn new(column: &str, operator: Operator, value: &str) -> Self {
        Condition {
            column: column.to_string(),
            operator,
            value: value.to_string(),
        }
    }
}

/// Boolean expression over conditions. AND binds tighter than OR.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare(Condition),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Leaf conditions in source order
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            Predicate::Compare(condition) => out.push(condition),
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.collect_conditions(out);
                }
            }
        }
    }
}

impl From<Condition> for Predicate {
    fn from(condition: Condition) -> Self {
        Predicate::Compare(condition)
    }
}

/// Sort order for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,   // Ascending: 0 → 9, A → Z
    Desc,  // Descending: 9 → 0, Z → A
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub order: SortOrder,
}
