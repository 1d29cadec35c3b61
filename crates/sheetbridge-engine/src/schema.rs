//! SQL schema generation from table blocks

use sheetbridge_lang::table::Table;

/// The CREATE TABLE statement for a table's block
///
/// Key columns aggregate into one PRIMARY KEY clause and unique columns
/// into one UNIQUE constraint, following the qualifiers on the columns.
pub fn create_table_sql(table: &Table) -> String {
    let mut sql = format!("CREATE TABLE {} (", table.name);

    let columns: Vec<String> = table
        .block
        .columns
        .iter()
        .map(|column| {
            let data_type = column
                .data_type
                .map(|t| t.sql_name())
                .unwrap_or("text");
            format!("{} {}", column.name, data_type)
        })
        .collect();
    sql.push_str(&columns.join(", "));

    let keys: Vec<&str> = table.block.keys().map(|c| c.name.as_str()).collect();
    if !keys.is_empty() {
        sql.push_str(&format!(", PRIMARY KEY ({})", keys.join(", ")));
    }

    let uniques: Vec<&str> = table.block.uniques().map(|c| c.name.as_str()).collect();
    if !uniques.is_empty() {
        sql.push_str(&format!(", UNIQUE ({})", uniques.join(", ")));
    }

    sql.push_str(");");
    sql
}

/// The CREATE INDEX statement for a table's indexed columns, if any
pub fn create_index_sql(table: &Table) -> Option<String> {
    let indexes: Vec<&str> = table.block.indexes().map(|c| c.name.as_str()).collect();
    if indexes.is_empty() {
        return None;
    }
    Some(format!(
        "CREATE INDEX {}_index ON {} ({});",
        table.name,
        table.name,
        indexes.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetbridge_lang::parse_table_spec;

    #[test]
    fn test_create_table_with_keys_and_uniques() {
        let db = parse_table_spec(
            "people { id $A2:$A9 integer Error key; \
                      name $B2:$B9 text key; \
                      mail $C2:$C9 text unique; \
                      age $D2:$D9 integer; }",
        )
        .unwrap();
        let table = db.tables().next().unwrap();

        assert_eq!(
            create_table_sql(table),
            "CREATE TABLE people (id integer, name text, mail text, age integer, \
             PRIMARY KEY (id, name), UNIQUE (mail));"
        );
        assert_eq!(create_index_sql(table), None);
    }

    #[test]
    fn test_create_index() {
        let db =
            parse_table_spec("t { a $A1:$A9 integer index; b $B1:$B9 text index; }").unwrap();
        let table = db.tables().next().unwrap();
        assert_eq!(
            create_index_sql(table).unwrap(),
            "CREATE INDEX t_index ON t (a, b);"
        );
    }
}
