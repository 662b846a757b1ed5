use sqlx::PgPool;

/// Executes the SQL query objects defined under [`crate::entities`].
///
/// Each query is a plain struct with a `kanau::processor::Processor` impl on
/// this type, so call sites read as `processor.process(Query { .. })`.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

impl DatabaseProcessor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
