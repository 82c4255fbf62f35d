/// One row of the plateau monitor table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateauMonitorRecord {
    pub plateau_number: i64,
    pub duration_seconds: f64,
}

impl PlateauMonitorRecord {
    /// Parameterized insert for the given (already quoted) table
    pub fn insert_sql(quoted_table: &str) -> String {
        format!(
            "INSERT INTO {} (plateau_number, duration_seconds) VALUES (?, ?)",
            quoted_table
        )
    }
}
