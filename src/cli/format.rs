use crate::core::database::ResultEnvelope;
use crate::core::types::Record;
use crate::schema::schema::Schema;

/// Text shown for one statement result
pub fn render(envelope: &ResultEnvelope) -> String {
    match envelope {
        ResultEnvelope::Message { message } => message.clone(),
        ResultEnvelope::Error { error } => format!("Error: {}", error),
        ResultEnvelope::Rows { result, message } => {
            if result.is_empty() {
                message.clone()
            } else {
                format!("{}\n{}", rows_grid(result), message)
            }
        }
        ResultEnvelope::Schema { schema, message } => {
            format!("{}\n{}", message, schema_grid(schema))
        }
    }
}

/// Rows as a grid; columns in order of first appearance
pub fn rows_grid(rows: &[Record]) -> String {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.to_string());
            }
        }
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|h| row.get(h).map(|v| v.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();

    grid(&headers, &cells)
}

pub fn schema_grid(schema: &Schema) -> String {
    let headers = vec!["Column".to_string(), "Type".to_string(), "Constraints".to_string()];
    let cells: Vec<Vec<String>> = schema
        .columns()
        .map(|column| {
            vec![
                column.name.clone(),
                column.column_type.to_string(),
                column.constraints().join(", "),
            ]
        })
        .collect();

    grid(&headers, &cells)
}

fn grid(headers: &[String], cells: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let border = {
        let mut line = String::from("+");
        for width in &widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    };

    let mut out = Vec::with_capacity(cells.len() + 4);
    out.push(border.clone());
    out.push(line(headers, &widths));
    out.push(border.clone());
    for row in cells {
        out.push(line(row, &widths));
    }
    out.push(border);
    out.join("\n")
}

fn line(cells: &[String], widths: &[usize]) -> String {
    let mut out = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        let pad = width - cell.chars().count();
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(pad + 1));
        out.push('|');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Value;
    use crate::schema::schema::{ColumnDefinition, ColumnType};

    #[test]
    fn test_rows_grid_pads_columns() {
        let rows: Vec<Record> = vec![
            [("id", Value::Integer(1)), ("name", Value::text("Alice"))].into_iter().collect(),
            [("id", Value::Integer(22)), ("name", Value::text("Bo"))].into_iter().collect(),
        ];
        let expected = "\
+----+-------+
| id | name  |
+----+-------+
| 1  | Alice |
| 22 | Bo    |
+----+-------+";
        assert_eq!(rows_grid(&rows), expected);
    }

    #[test]
    fn test_render_schema_lists_constraints() {
        let schema = Schema::new()
            .with_column(ColumnDefinition::new("id", ColumnType::Int).primary_key())
            .with_column(ColumnDefinition::new("name", ColumnType::Text).not_null());
        let text = render(&ResultEnvelope::Schema {
            schema,
            message: "Schema for table 'users'".to_string(),
        });
        assert!(text.starts_with("Schema for table 'users'\n+"));
        assert!(text.contains("| id     | INT  | PRIMARY KEY |"));
        assert!(text.contains("| name   | TEXT | NOT NULL    |"));
    }

    #[test]
    fn test_render_error_and_empty_rows() {
        let error = ResultEnvelope::Error { error: "Table 'x' does not exist".to_string() };
        assert_eq!(render(&error), "Error: Table 'x' does not exist");

        let empty = ResultEnvelope::Rows { result: vec![], message: "Found 0 records in 'x'".to_string() };
        assert_eq!(render(&empty), "Found 0 records in 'x'");
    }
}
