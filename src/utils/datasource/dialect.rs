use super::base::ColumnInfo;
use super::object::{ObjectName, RowCount};

/// SQL flavour spoken by a connector. Builds the three preview statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    SqlServer,
    Sqlite,
}

impl Dialect {
    pub fn quote_ident(self, ident: &str) -> String {
        match self {
            Dialect::SqlServer => format!("[{}]", ident.replace(']', "]]")),
            Dialect::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    pub fn qualify(self, object: &ObjectName) -> String {
        match &object.schema {
            Some(schema) => format!("{}.{}", self.quote_ident(schema), self.quote_ident(&object.name)),
            None => self.quote_ident(&object.name),
        }
    }

    pub fn top_sql(self, object: &ObjectName, n: RowCount) -> String {
        match self {
            Dialect::SqlServer => format!("SELECT TOP ({}) * FROM {}", n, self.qualify(object)),
            Dialect::Sqlite => format!("SELECT * FROM {} LIMIT {}", self.qualify(object), n),
        }
    }

    pub fn sample_sql(self, object: &ObjectName, n: RowCount) -> String {
        match self {
            Dialect::SqlServer => format!(
                "SELECT TOP ({}) * FROM {} ORDER BY NEWID()",
                n,
                self.qualify(object)
            ),
            Dialect::Sqlite => format!(
                "SELECT * FROM {} ORDER BY RANDOM() LIMIT {}",
                self.qualify(object),
                n
            ),
        }
    }

    /// Column expression fit for `COUNT(DISTINCT ..)` and `COUNT(..)`. SQL Server
    /// refuses both on the legacy LOB types and cannot compare xml or the
    /// spatial types, so those are converted first.
    pub fn aggregate_expr(self, column: &ColumnInfo) -> String {
        let quoted = self.quote_ident(&column.name);
        match self {
            Dialect::SqlServer => match column.data_type.to_ascii_lowercase().as_str() {
                "text" | "ntext" | "xml" => format!("CONVERT(nvarchar(max), {})", quoted),
                "image" | "geography" | "geometry" => format!("CONVERT(varbinary(max), {})", quoted),
                _ => quoted,
            },
            Dialect::Sqlite => quoted,
        }
    }

    /// One aggregate scan: the total row count followed by a
    /// (distinct, non-null) pair per column, in column order.
    pub fn summary_sql(self, object: &ObjectName, columns: &[ColumnInfo]) -> String {
        let count = match self {
            Dialect::SqlServer => "COUNT_BIG",
            Dialect::Sqlite => "COUNT",
        };

        let mut select = vec![format!("{}(*) AS {}", count, self.quote_ident("__total"))];
        for (idx, column) in columns.iter().enumerate() {
            let expr = self.aggregate_expr(column);
            select.push(format!(
                "{}(DISTINCT {}) AS {}",
                count,
                expr,
                self.quote_ident(&format!("__d{}", idx))
            ));
            select.push(format!(
                "{}({}) AS {}",
                count,
                expr,
                self.quote_ident(&format!("__n{}", idx))
            ));
        }

        format!("SELECT {} FROM {}", select.join(", "), self.qualify(object))
    }
}
