use tabula::core::error::ErrorKind;
use tabula::core::types::Value;
use tabula::query::ast::{Operator, OrderBy, Predicate, SortOrder, Statement};
use tabula::query::parser::SqlParser;
use tabula::schema::schema::ColumnType;

fn parse(query: &str) -> Statement {
    SqlParser::new().parse(query).unwrap()
}

fn parse_err(query: &str) -> ErrorKind {
    SqlParser::new().parse(query).unwrap_err().kind
}

#[test]
fn test_create_table_columns_and_constraints() {
    let statement = parse(
        "create table products (
            id INT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            price DECIMAL(10, 2) DEFAULT 0.0,
            in_stock BOOLEAN DEFAULT TRUE,
            added DATE,
            notes
        );",
    );
    let Statement::CreateTable(create) = statement else { panic!("expected CREATE TABLE") };

    assert_eq!(create.table, "products");
    assert_eq!(
        create.schema.column_names(),
        vec!["id", "name", "price", "in_stock", "added", "notes"]
    );

    let id = create.schema.column("id").unwrap();
    assert_eq!(id.column_type, ColumnType::Int);
    assert!(id.primary_key);

    let name = create.schema.column("name").unwrap();
    assert!(name.not_null && name.unique && !name.primary_key);

    let price = create.schema.column("price").unwrap();
    assert_eq!(price.column_type, ColumnType::Float);
    assert_eq!(price.default, Some(Value::Float(0.0)));

    assert_eq!(create.schema.column("in_stock").unwrap().default, Some(Value::Boolean(true)));
    assert_eq!(create.schema.column("added").unwrap().column_type, ColumnType::Date);
    assert_eq!(create.schema.column("notes").unwrap().column_type, ColumnType::Text);
    assert_eq!(create.schema.primary_key().unwrap().name, "id");
}

#[test]
fn test_create_table_rejects_duplicate_column() {
    assert_eq!(parse_err("CREATE TABLE t (a INT, a TEXT)"), ErrorKind::Parse);
    assert_eq!(parse_err("CREATE TABLE t"), ErrorKind::Parse);
    assert_eq!(parse_err("CREATE TABLE t (id INT PRIMARY KEY, age INT DEFAULT abc)"), ErrorKind::Parse);
}

#[test]
fn test_insert_values_keep_quoted_commas() {
    let Statement::Insert(insert) =
        parse("INSERT INTO users VALUES (1, 'Smith, John', \"a 'quoted' word\", 2.5, false)")
    else {
        panic!("expected INSERT")
    };

    assert_eq!(insert.table, "users");
    assert_eq!(insert.columns, None);
    assert_eq!(
        insert.values,
        vec![
            Value::Integer(1),
            Value::text("Smith, John"),
            Value::text("a 'quoted' word"),
            Value::Float(2.5),
            Value::Boolean(false),
        ]
    );
}

#[test]
fn test_insert_with_column_list() {
    let Statement::Insert(insert) = parse("INSERT INTO users (id, name) VALUES (7, 'Grace')") else {
        panic!("expected INSERT")
    };
    assert_eq!(insert.columns, Some(vec!["id".to_string(), "name".to_string()]));
    assert_eq!(insert.values, vec![Value::Integer(7), Value::text("Grace")]);
}

#[test]
fn test_insert_malformed() {
    assert_eq!(parse_err("INSERT INTO users (1, 2)"), ErrorKind::Parse);
    assert_eq!(parse_err("INSERT INTO users VALUES ()"), ErrorKind::Parse);
    assert_eq!(parse_err("INSERT INTO users VALUES (1,,2)"), ErrorKind::Parse);
}

#[test]
fn test_select_with_every_clause() {
    let Statement::Select(select) = parse(
        "SELECT * FROM users WHERE age > 30 AND city = 'Portland' OR name LIKE 'a%' ORDER BY age DESC LIMIT 5",
    ) else {
        panic!("expected SELECT")
    };

    assert_eq!(select.table, "users");
    assert_eq!(
        select.order_by,
        Some(OrderBy { column: "age".to_string(), order: SortOrder::Desc })
    );
    assert_eq!(select.limit, Some(5));

    let filter = select.filter.unwrap();
    assert!(matches!(filter, Predicate::Or(ref children) if children.len() == 2));
    let conditions = filter.conditions();
    assert_eq!(conditions.len(), 3);
    assert_eq!(conditions[0].operator, Operator::Gt);
    assert_eq!(conditions[1].value, "Portland");
    assert_eq!(conditions[2].operator, Operator::Like);
    assert_eq!(conditions[2].value, "a%");
}

#[test]
fn test_select_order_by_defaults_to_ascending() {
    let Statement::Select(select) = parse("select * from users order by name") else {
        panic!("expected SELECT")
    };
    assert_eq!(select.filter, None);
    assert_eq!(select.order_by.unwrap().order, SortOrder::Asc);
    assert_eq!(select.limit, None);
}

#[test]
fn test_select_keywords_inside_literals_are_ignored() {
    let Statement::Select(select) =
        parse("SELECT * FROM notes WHERE body = 'see ORDER BY and LIMIT 3 or more'")
    else {
        panic!("expected SELECT")
    };
    assert_eq!(select.order_by, None);
    assert_eq!(select.limit, None);
    let filter = select.filter.unwrap();
    let conditions = filter.conditions();
    assert_eq!(conditions.len(), 1);
    assert_eq!(conditions[0].value, "see ORDER BY and LIMIT 3 or more");
}

#[test]
fn test_select_errors() {
    assert_eq!(parse_err("SELECT *"), ErrorKind::Parse);
    assert_eq!(parse_err("SELECT * FROM users LIMIT -1"), ErrorKind::Parse);
    assert_eq!(parse_err("SELECT * FROM users LIMIT many"), ErrorKind::Parse);
    assert_eq!(parse_err("SELECT * FROM users WHERE age"), ErrorKind::Parse);
    assert_eq!(parse_err("SELECT * FROM users ORDER BY"), ErrorKind::Parse);
}

#[test]
fn test_update_assignments_and_where() {
    let Statement::Update(update) =
        parse("UPDATE users SET name = 'O''Neil, Jr', age = 31 WHERE id = 3")
    else {
        panic!("expected UPDATE")
    };
    assert_eq!(update.table, "users");
    assert_eq!(update.assignments.len(), 2);
    assert_eq!(update.assignments[1].column, "age");
    assert_eq!(update.assignments[1].value, Value::Integer(31));
    assert_eq!(update.filter.conditions()[0].column, "id");
}

#[test]
fn test_update_and_delete_require_where() {
    assert_eq!(parse_err("UPDATE users SET age = 1"), ErrorKind::Parse);
    assert_eq!(parse_err("DELETE FROM users"), ErrorKind::Parse);

    let Statement::Delete(delete) = parse("DELETE FROM users WHERE age < 18 OR age > 90") else {
        panic!("expected DELETE")
    };
    assert!(matches!(delete.filter, Predicate::Or(_)));
}

#[test]
fn test_auxiliary_statements() {
    assert_eq!(parse("DROP TABLE users"), Statement::DropTable { table: "users".to_string() });
    assert_eq!(
        parse("RENAME TABLE users TO people"),
        Statement::RenameTable { from: "users".to_string(), to: "people".to_string() }
    );
    assert_eq!(parse("DESC users"), Statement::Describe { table: "users".to_string() });
    assert_eq!(parse("describe users;"), Statement::Describe { table: "users".to_string() });
    assert_eq!(parse("SHOW TABLES"), Statement::ShowTables);
    assert_eq!(parse("show table users"), Statement::ShowTable { table: "users".to_string() });
    assert_eq!(
        parse("CREATE INDEX ON users(name)"),
        Statement::CreateIndex { table: "users".to_string(), column: "name".to_string() }
    );
}

#[test]
fn test_auxiliary_syntax_errors() {
    assert_eq!(parse_err("DROP TABLE"), ErrorKind::Parse);
    assert_eq!(parse_err("RENAME TABLE users people"), ErrorKind::Parse);
    assert_eq!(parse_err("CREATE INDEX ON users"), ErrorKind::Parse);
}

#[test]
fn test_unsupported_statement() {
    let err = SqlParser::new().parse("GRANT ALL ON users").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnsupportedQuery);
    assert_eq!(err.message(), "Unsupported SQL command");
    assert_eq!(parse_err("SHOW DATABASES"), ErrorKind::UnsupportedQuery);
    assert_eq!(parse_err(""), ErrorKind::UnsupportedQuery);
}
