use serde::Serialize;

/// A stored coordinate file. `path` is relative to the media root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Upload {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub size: i64,
    pub created: i64,
}

/// An upload about to be recorded.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub name: String,
    pub path: String,
    pub size: i64,
}

impl From<&tokio_postgres::Row> for Upload {
    fn from(row: &tokio_postgres::Row) -> Self {
        Self {
            id: row.get(0),
            name: row.get(1),
            path: row.get(2),
            size: row.get(3),
            created: row.get(4),
        }
    }
}
