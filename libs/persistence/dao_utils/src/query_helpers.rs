// Type aliases for PostgreSQL parameter types
pub type PgParam = dyn tokio_postgres::types::ToSql + Sync;
pub type PgSendParam = dyn tokio_postgres::types::ToSql + Sync + Send;
pub type PgParamBox = Box<PgSendParam>;
pub type PgParamVec = Vec<PgParamBox>;

/// Accumulates `WHERE` conditions and their numbered parameters.
///
/// Each condition is a template where `{}` stands for the placeholder of
/// the parameter pushed with it, e.g. `"category = {}"`.
#[derive(Default)]
pub struct WhereBuilder {
    clauses: Vec<String>,
    params: PgParamVec,
}

impl WhereBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn push<P>(&mut self, template: &str, param: P) -> &mut Self
    where
        P: tokio_postgres::types::ToSql + Sync + Send + 'static,
    {
        self.params.push(Box::new(param));
        let placeholder = format!("${}", self.params.len());
        self.clauses.push(template.replace("{}", &placeholder));
        self
    }

    /// ` WHERE a AND b`, or an empty string without conditions
    pub fn clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        }
        else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> Vec<&PgParam> {
        self.params
            .iter()
            .map(|p| p.as_ref() as &PgParam)
            .collect()
    }
}

/// `%term%` for `ILIKE`, with the wildcard characters in `term` escaped
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
